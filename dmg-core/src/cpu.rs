mod instructions;
mod registers;

#[cfg(test)]
mod tests;

use crate::memory::AddressSpace;
use instructions::parse_next_instruction;

pub use registers::{CpuRegister, CpuRegisterPair, CpuRegisters};

/// The SM83 core. Holds only the register file; all other state lives behind
/// the bus.
pub struct Cpu {
    registers: CpuRegisters,
}

impl Cpu {
    pub fn new() -> Self {
        Self { registers: CpuRegisters::new() }
    }

    pub fn registers(&self) -> &CpuRegisters {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut CpuRegisters {
        &mut self.registers
    }

    /// Fetch, decode, and execute the instruction at the current PC. Returns
    /// the number of machine cycles the instruction consumed.
    ///
    /// An unrecognized opcode is logged and skipped at zero cost so that a
    /// runaway program counter cannot wedge the core.
    pub fn execute(&mut self, address_space: &mut AddressSpace) -> u32 {
        let (instruction, new_pc) =
            match parse_next_instruction(address_space, self.registers.pc) {
                Ok(parsed) => parsed,
                Err(err) => {
                    log::error!("{err}");
                    self.registers.pc = self.registers.pc.wrapping_add(1);
                    return 0;
                }
            };

        log::trace!(
            "executing {instruction:?} at {pc:04X}",
            pc = self.registers.pc
        );

        // Conditional cycle counts depend on the flags as they are before the
        // instruction runs
        let cycles = instruction.cycles_required(&self.registers);

        self.registers.pc = new_pc;
        instruction.execute(address_space, &mut self.registers);

        cycles
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
