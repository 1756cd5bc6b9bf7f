pub(crate) mod address;
mod bootrom;
mod mapper;

use crate::memory::mapper::{Mapper, RamMapResult};
use std::path::Path;
use std::{fs, io};
use thiserror::Error;

pub use bootrom::{BOOT_ROM, BOOT_ROM_LEN};

const VRAM_SIZE: usize = 8 * 1024;
const WORKING_RAM_SIZE: usize = 8 * 1024;
const OAM_SIZE: usize = 160;
const IO_REGISTERS_SIZE: usize = 128;
const HRAM_SIZE: usize = 127;

const RAM_BANK_SIZE: usize = 8 * 1024;

#[derive(Error, Debug)]
pub enum CartridgeLoadError {
    #[error("error reading cartridge image from {file_path}: {source}")]
    FileRead {
        file_path: String,
        #[source]
        source: io::Error,
    },
    #[error("cartridge image is too small to hold a header: {rom_len} bytes")]
    HeaderTooShort { rom_len: usize },
}

/// A cartridge image plus the bank-switching state that decides which parts of
/// it are visible through the bus.
pub struct Cartridge {
    rom: Vec<u8>,
    ram: Vec<u8>,
    mapper: Mapper,
}

impl Cartridge {
    pub fn new(rom: Vec<u8>) -> Result<Self, CartridgeLoadError> {
        if rom.len() <= usize::from(address::RAM_SIZE) {
            return Err(CartridgeLoadError::HeaderTooShort { rom_len: rom.len() });
        }

        let mapper_byte = rom[usize::from(address::MAPPER)];
        let ram_banks = mapper::ram_banks_from_header(rom[usize::from(address::RAM_SIZE)]);
        let ram_size = ram_banks * RAM_BANK_SIZE as u32;

        log::info!(
            "loaded cartridge: {} bytes of ROM, mapper byte {mapper_byte:02X}, {ram_banks} RAM bank(s)",
            rom.len()
        );

        let mapper = Mapper::new(mapper_byte, rom.len() as u32, ram_size);

        Ok(Self {
            rom,
            ram: vec![0x00; ram_size as usize],
            mapper,
        })
    }

    pub fn from_file<P: AsRef<Path>>(file_path: P) -> Result<Self, CartridgeLoadError> {
        let file_path = file_path.as_ref();
        let rom = fs::read(file_path).map_err(|source| CartridgeLoadError::FileRead {
            file_path: file_path.display().to_string(),
            source,
        })?;

        Self::new(rom)
    }

    fn read_rom_address(&self, address: u16) -> u8 {
        let mapped = self.mapper.map_rom_address(address) as usize;
        self.rom.get(mapped).copied().unwrap_or(0xFF)
    }

    fn read_ram_address(&self, address: u16) -> u8 {
        match self.mapper.map_ram_address(address) {
            RamMapResult::RamAddress(mapped) => {
                self.ram.get(mapped as usize).copied().unwrap_or(0xFF)
            }
            RamMapResult::None => 0xFF,
        }
    }

    fn write_ram_address(&mut self, address: u16, value: u8) {
        if let RamMapResult::RamAddress(mapped) = self.mapper.map_ram_address(address) {
            if let Some(cell) = self.ram.get_mut(mapped as usize) {
                *cell = value;
            }
        }
    }
}

/// The full 0x0000-0xFFFF address space. Reads and writes are total: every
/// address resolves to a backing region, an ignored write, or 0xFF.
pub struct AddressSpace {
    cartridge: Cartridge,
    vram: [u8; VRAM_SIZE],
    working_ram: [u8; WORKING_RAM_SIZE],
    oam: [u8; OAM_SIZE],
    io_registers: [u8; IO_REGISTERS_SIZE],
    hram: [u8; HRAM_SIZE],
    ie_register: u8,
    boot_rom_mapped: bool,
}

impl AddressSpace {
    pub fn new(cartridge: Cartridge) -> Self {
        Self {
            cartridge,
            vram: [0x00; VRAM_SIZE],
            working_ram: [0x00; WORKING_RAM_SIZE],
            oam: [0x00; OAM_SIZE],
            io_registers: [0x00; IO_REGISTERS_SIZE],
            hram: [0x00; HRAM_SIZE],
            ie_register: 0x00,
            boot_rom_mapped: true,
        }
    }

    pub fn read_address_u8(&self, address: u16) -> u8 {
        match address {
            address @ address::ROM_START..=address::ROM_END => {
                if self.boot_rom_mapped && address < BOOT_ROM_LEN as u16 {
                    BOOT_ROM[usize::from(address)]
                } else {
                    self.cartridge.read_rom_address(address)
                }
            }
            address @ address::VRAM_START..=address::VRAM_END => {
                self.vram[usize::from(address - address::VRAM_START)]
            }
            address @ address::EXTERNAL_RAM_START..=address::EXTERNAL_RAM_END => {
                self.cartridge.read_ram_address(address)
            }
            address @ address::WORKING_RAM_START..=address::WORKING_RAM_END => {
                self.working_ram[usize::from(address - address::WORKING_RAM_START)]
            }
            address @ address::ECHO_RAM_START..=address::ECHO_RAM_END => {
                self.working_ram[usize::from(address - address::ECHO_RAM_START)]
            }
            address @ address::OAM_START..=address::OAM_END => {
                self.oam[usize::from(address - address::OAM_START)]
            }
            _address @ address::UNUSABLE_START..=address::UNUSABLE_END => 0xFF,
            address @ address::IO_REGISTERS_START..=address::IO_REGISTERS_END => {
                self.io_registers[usize::from(address - address::IO_REGISTERS_START)]
            }
            address @ address::HRAM_START..=address::HRAM_END => {
                self.hram[usize::from(address - address::HRAM_START)]
            }
            address::IE_REGISTER => self.ie_register,
        }
    }

    pub fn write_address_u8(&mut self, address: u16, value: u8) {
        match address {
            address @ address::ROM_START..=address::ROM_END => {
                self.cartridge.mapper.write_rom_address(address, value);
            }
            address @ address::VRAM_START..=address::VRAM_END => {
                self.vram[usize::from(address - address::VRAM_START)] = value;
            }
            address @ address::EXTERNAL_RAM_START..=address::EXTERNAL_RAM_END => {
                self.cartridge.write_ram_address(address, value);
            }
            address @ address::WORKING_RAM_START..=address::WORKING_RAM_END => {
                self.working_ram[usize::from(address - address::WORKING_RAM_START)] = value;
            }
            address @ address::ECHO_RAM_START..=address::ECHO_RAM_END => {
                self.working_ram[usize::from(address - address::ECHO_RAM_START)] = value;
            }
            address @ address::OAM_START..=address::OAM_END => {
                self.oam[usize::from(address - address::OAM_START)] = value;
            }
            _address @ address::UNUSABLE_START..=address::UNUSABLE_END => {}
            address @ address::IO_REGISTERS_START..=address::IO_REGISTERS_END => {
                if address == address::BOOT_DISABLE_REGISTER && self.boot_rom_mapped {
                    // One-way transition; the overlay never comes back
                    log::debug!("boot ROM unmapped by write of {value:02X} to FF50");
                    self.boot_rom_mapped = false;
                }
                self.io_registers[usize::from(address - address::IO_REGISTERS_START)] = value;
            }
            address @ address::HRAM_START..=address::HRAM_END => {
                self.hram[usize::from(address - address::HRAM_START)] = value;
            }
            address::IE_REGISTER => {
                self.ie_register = value;
            }
        }
    }

    /// Read a little-endian u16 (used for stack accesses and 16-bit operands).
    pub fn read_address_u16(&self, address: u16) -> u16 {
        let lsb = self.read_address_u8(address);
        let msb = self.read_address_u8(address.wrapping_add(1));
        u16::from_le_bytes([lsb, msb])
    }

    pub fn write_address_u16(&mut self, address: u16, value: u16) {
        let [lsb, msb] = value.to_le_bytes();
        self.write_address_u8(address, lsb);
        self.write_address_u8(address.wrapping_add(1), msb);
    }
}
