mod cpu;
mod memory;
mod ppu;

pub use cpu::{Cpu, CpuRegister, CpuRegisterPair, CpuRegisters};
pub use memory::{AddressSpace, Cartridge, CartridgeLoadError};
pub use ppu::{FrameBuffer, PpuMode, PpuState, SCREEN_HEIGHT, SCREEN_WIDTH};

// 4 dots per machine cycle
const DOTS_PER_M_CYCLE: u32 = 4;

/// The assembled machine: CPU, PPU, and the bus connecting them.
pub struct Emulator {
    cpu: Cpu,
    ppu: PpuState,
    address_space: AddressSpace,
}

impl Emulator {
    pub fn new(cartridge: Cartridge) -> Self {
        Self {
            cpu: Cpu::new(),
            ppu: PpuState::new(),
            address_space: AddressSpace::new(cartridge),
        }
    }

    /// Execute one CPU instruction and advance the PPU by the matching number
    /// of dots. Returns the machine cycles the instruction took.
    pub fn step(&mut self) -> u32 {
        let cycles = self.cpu.execute(&mut self.address_space);
        self.ppu.tick(cycles * DOTS_PER_M_CYCLE, &mut self.address_space);
        cycles
    }

    /// Step until the PPU finishes the current frame.
    pub fn run_frame(&mut self) {
        self.ppu.clear_frame_complete();
        while !self.ppu.frame_complete() {
            self.step();
        }
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        self.ppu.frame_buffer()
    }

    pub fn cpu_registers(&self) -> &CpuRegisters {
        self.cpu.registers()
    }

    pub fn address_space(&self) -> &AddressSpace {
        &self.address_space
    }
}
