use crate::memory::address;

const ROM_BANK_SIZE: u32 = 1 << 14;
const RAM_BANK_SIZE: u32 = 1 << 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RamMapResult {
    // Relative address into the full external RAM array
    RamAddress(u32),
    // The RAM address is invalid or RAM access is disabled
    None,
}

/// Cartridge bank-switching state. New controller types slot in as additional
/// variants.
#[derive(Debug, Clone)]
pub(crate) enum Mapper {
    None,
    Banked {
        rom_bank_bit_mask: u8,
        ram_bank_bit_mask: u8,
        ram_enable: u8,
        rom_bank_number: u8,
        ram_bank_number: u8,
    },
}

impl Mapper {
    pub(crate) fn new(mapper_byte: u8, rom_size: u32, ram_size: u32) -> Self {
        let rom_bank_bit_mask = if rom_size >= ROM_BANK_SIZE {
            ((rom_size >> 14) - 1) as u8
        } else {
            0
        };
        let ram_bank_bit_mask = if ram_size >= RAM_BANK_SIZE {
            ((ram_size >> 13) - 1) as u8
        } else {
            0
        };

        log::debug!("setting ROM bit mask to {rom_bank_bit_mask:02X} for size {rom_size}");
        log::debug!("setting RAM bit mask to {ram_bank_bit_mask:02X} for size {ram_size}");

        match mapper_byte {
            0x00 => Self::None,
            0x01..=0x03 => Self::banked(rom_bank_bit_mask, ram_bank_bit_mask),
            _ => {
                log::warn!(
                    "unsupported cartridge type byte {mapper_byte:02X}, treating as banked"
                );
                Self::banked(rom_bank_bit_mask, ram_bank_bit_mask)
            }
        }
    }

    fn banked(rom_bank_bit_mask: u8, ram_bank_bit_mask: u8) -> Self {
        Self::Banked {
            rom_bank_bit_mask,
            ram_bank_bit_mask,
            ram_enable: 0x00,
            rom_bank_number: 0x01,
            ram_bank_number: 0x00,
        }
    }

    /// Current ROM bank mapped into 0x4000-0x7FFF. Bank 0 is never selectable
    /// through the bank-number register.
    pub(crate) fn rom_bank_number(&self) -> u8 {
        match *self {
            Self::None => 0x01,
            Self::Banked {
                rom_bank_number, ..
            } => {
                if rom_bank_number == 0x00 {
                    0x01
                } else {
                    rom_bank_number
                }
            }
        }
    }

    pub(crate) fn map_rom_address(&self, address: u16) -> u32 {
        match address {
            address @ address::ROM_START..=address::ROM_BANK_0_END => u32::from(address),
            address @ address::ROM_BANK_N_START..=address::ROM_END => match *self {
                Self::None => u32::from(address),
                Self::Banked {
                    rom_bank_bit_mask, ..
                } => {
                    let bank_number = self.rom_bank_number() & rom_bank_bit_mask;
                    u32::from(address - address::ROM_BANK_N_START)
                        + (u32::from(bank_number) << 14)
                }
            },
            _ => panic!("mapper called for address outside of cartridge address range: {address:04X}"),
        }
    }

    // ROM writes don't actually modify the ROM (it is read-only after all) but
    // they do modify cartridge registers
    pub(crate) fn write_rom_address(&mut self, address: u16, value: u8) {
        let Self::Banked {
            ram_enable,
            rom_bank_number,
            ram_bank_number,
            ..
        } = self
        else {
            return;
        };

        match address {
            _address @ 0x0000..=0x1FFF => {
                log::trace!("ram_enable changed to {value:02X}");
                *ram_enable = value & 0x0F;
            }
            _address @ 0x2000..=0x3FFF => {
                log::trace!("rom_bank_number changed to {value:02X}");
                *rom_bank_number = value & 0x1F;
            }
            _address @ 0x4000..=0x5FFF => {
                log::trace!("ram_bank_number changed to {value:02X}");
                *ram_bank_number = value & 0x03;
            }
            _address @ 0x6000..=0x7FFF => {}
            _ => panic!("invalid ROM write address in mapper: {address:04X}"),
        }
    }

    pub(crate) fn map_ram_address(&self, address: u16) -> RamMapResult {
        let relative_address = address - address::EXTERNAL_RAM_START;

        match *self {
            Self::None => RamMapResult::RamAddress(u32::from(relative_address)),
            Self::Banked {
                ram_bank_bit_mask,
                ram_enable,
                ram_bank_number,
                ..
            } => {
                if ram_enable == 0x0A {
                    let bank_number = ram_bank_number & ram_bank_bit_mask;
                    RamMapResult::RamAddress(
                        u32::from(relative_address) + (u32::from(bank_number) << 13),
                    )
                } else {
                    RamMapResult::None
                }
            }
        }
    }
}

/// Map the cartridge header's RAM size byte (0x0149) to the number of 8 KB
/// external RAM banks. Unrecognized values get no RAM.
pub(crate) fn ram_banks_from_header(ram_size_byte: u8) -> u32 {
    match ram_size_byte {
        0x02 => 1,
        0x03 => 4,
        0x04 => 16,
        0x05 => 8,
        _ => 0,
    }
}
