//! The 256-byte boot overlay mapped over 0x0000-0x00FF until the first write
//! to 0xFF50.
//!
//! The factory DMG image is not distributable, so this is a stand-in that
//! performs the same observable hand-off: enable the LCD, disable the
//! overlay, then jump to the cartridge entry point. Register init is handled
//! by the power-up values in [`crate::cpu::CpuRegisters`].

pub const BOOT_ROM_LEN: usize = 256;

pub const BOOT_ROM: [u8; BOOT_ROM_LEN] = boot_stub();

const fn boot_stub() -> [u8; BOOT_ROM_LEN] {
    let mut rom = [0x00; BOOT_ROM_LEN];

    // LD A, 0x91
    rom[0x00] = 0x3E;
    rom[0x01] = 0x91;
    // LDH (0x40), A
    rom[0x02] = 0xE0;
    rom[0x03] = 0x40;
    // LD A, 0x01
    rom[0x04] = 0x3E;
    rom[0x05] = 0x01;
    // LDH (0x50), A
    rom[0x06] = 0xE0;
    rom[0x07] = 0x50;
    // JP 0x0100
    rom[0x08] = 0xC3;
    rom[0x09] = 0x00;
    rom[0x0A] = 0x01;

    rom
}
