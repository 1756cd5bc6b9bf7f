use super::program_rom;
use crate::cpu::Cpu;
use crate::memory::{AddressSpace, Cartridge};

// Runs the program starting directly at 0x0150 and returns the total machine
// cycles consumed, excluding the boot hand-off.
fn run_and_count(program_hex: &str) -> u32 {
    let rom = program_rom(program_hex);
    let rom_len = rom.len() as u16;

    let mut address_space =
        AddressSpace::new(Cartridge::new(rom).expect("synthesized test ROM should be valid"));
    address_space.write_address_u8(0xFF50, 0x01);

    let mut cpu = Cpu::new();
    cpu.registers_mut().pc = 0x0150;

    let mut cycles = 0;
    while cpu.registers().pc < rom_len {
        cycles += cpu.execute(&mut address_space);
    }

    cycles
}

#[test]
fn single_byte_instructions() {
    // NOP
    assert_eq!(1, run_and_count("00"));
    // ADD B
    assert_eq!(1, run_and_count("80"));
    // XOR A
    assert_eq!(1, run_and_count("AF"));
    // LD B, C
    assert_eq!(1, run_and_count("41"));
}

#[test]
fn immediate_loads() {
    // LD B, 0x12
    assert_eq!(2, run_and_count("0612"));
    // LD BC, 0x5821
    assert_eq!(3, run_and_count("012158"));
    // LD (nn), SP
    assert_eq!(5, run_and_count("0800C0"));
}

#[test]
fn indirect_hl_accesses() {
    // LD HL, 0xC000 (3); LD (HL), 0x12 (3); INC (HL) (3); ADD (HL) (2)
    assert_eq!(11, run_and_count("2100C036123486"));
}

#[test]
fn absolute_jump() {
    // JP to the end of the program
    assert_eq!(4, run_and_count("C35301"));
}

#[test]
fn relative_jump_taken_vs_not_taken() {
    // XOR A (1); JR Z, +2 taken (3)
    assert_eq!(4, run_and_count("AF2802"));
    // XOR A (1); JR NZ, +2 not taken (2); NOP (1); NOP (1)
    assert_eq!(5, run_and_count("AF20020000"));
}

#[test]
fn call_and_return() {
    // 0x0150: CALL 0x0155 (6)
    // 0x0153: JR +1 (3, to 0x0156, end of program)
    // 0x0155: RET (4)
    assert_eq!(13, run_and_count(concat!("CD5501", "1801", "C9")));
}

#[test]
fn conditional_return() {
    // 0x0150: XOR A (1)
    // 0x0151: CALL 0x0157 (6)
    // 0x0154: JP 0xFFFF (4)
    // 0x0157: RET NZ (2, not taken)
    // 0x0158: RET (4)
    assert_eq!(17, run_and_count(concat!("AF", "CD5701", "C3FFFF", "C0", "C9")));
}

#[test]
fn stack_operations() {
    // PUSH BC (4); POP BC (3)
    assert_eq!(7, run_and_count("C5C1"));
}

#[test]
fn cb_prefixed() {
    // SWAP A (2); RL C (2)
    assert_eq!(4, run_and_count("CB37CB11"));
    // LD HL, 0xC000 (3); BIT 0, (HL) (3); SET 0, (HL) (4)
    assert_eq!(10, run_and_count("2100C0CB46CBC6"));
}

#[test]
fn sixteen_bit_arithmetic() {
    // ADD HL, BC (2); INC DE (2); DEC SP (2); ADD SP, e (4)
    assert_eq!(10, run_and_count("09133BE801"));
}
