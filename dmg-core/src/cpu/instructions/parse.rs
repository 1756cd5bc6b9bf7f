use crate::cpu::instructions::{Instruction, JumpCondition};
use crate::cpu::registers::{CpuRegister, CpuRegisterPair};
use crate::memory::AddressSpace;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("unrecognized opcode {opcode:02X} at address {address:04X}")]
    UnrecognizedOpcode { opcode: u8, address: u16 },
}

/// Decode the instruction at `pc`. Returns the decoded instruction and the
/// address of the following instruction.
pub(crate) fn parse_next_instruction(
    address_space: &AddressSpace,
    pc: u16,
) -> Result<(Instruction, u16), ParseError> {
    let opcode = address_space.read_address_u8(pc);

    match opcode {
        0x00 => Ok((Instruction::NoOp, pc.wrapping_add(1))),
        0x01 | 0x11 | 0x21 | 0x31 => {
            let rr = register_pair_for_other_ops(opcode);
            let nn = address_space.read_address_u16(pc.wrapping_add(1));
            Ok((Instruction::LoadRegisterPairImmediate(rr, nn), pc.wrapping_add(3)))
        }
        0x02 => Ok((Instruction::LoadIndirectBCAccumulator, pc.wrapping_add(1))),
        0x03 | 0x13 | 0x23 | 0x33 => {
            let rr = register_pair_for_other_ops(opcode);
            Ok((Instruction::IncRegisterPair(rr), pc.wrapping_add(1)))
        }
        0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
            let instruction = CpuRegister::from_mid_opcode_bits(opcode)
                .map_or(Instruction::IncIndirectHL, Instruction::IncRegister);
            Ok((instruction, pc.wrapping_add(1)))
        }
        0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
            let instruction = CpuRegister::from_mid_opcode_bits(opcode)
                .map_or(Instruction::DecIndirectHL, Instruction::DecRegister);
            Ok((instruction, pc.wrapping_add(1)))
        }
        0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
            let n = address_space.read_address_u8(pc.wrapping_add(1));
            let instruction = CpuRegister::from_mid_opcode_bits(opcode).map_or(
                Instruction::LoadIndirectHLImmediate(n),
                |r| Instruction::LoadRegisterImmediate(r, n),
            );
            Ok((instruction, pc.wrapping_add(2)))
        }
        0x07 => Ok((Instruction::RotateLeftAccumulator, pc.wrapping_add(1))),
        0x08 => {
            let nn = address_space.read_address_u16(pc.wrapping_add(1));
            Ok((Instruction::LoadDirectStackPointer(nn), pc.wrapping_add(3)))
        }
        0x09 | 0x19 | 0x29 | 0x39 => {
            let rr = register_pair_for_other_ops(opcode);
            Ok((Instruction::AddHLRegister(rr), pc.wrapping_add(1)))
        }
        0x0A => Ok((Instruction::LoadAccumulatorIndirectBC, pc.wrapping_add(1))),
        0x0B | 0x1B | 0x2B | 0x3B => {
            let rr = register_pair_for_other_ops(opcode);
            Ok((Instruction::DecRegisterPair(rr), pc.wrapping_add(1)))
        }
        0x0F => Ok((Instruction::RotateRightAccumulator, pc.wrapping_add(1))),
        // STOP is encoded as two bytes
        0x10 => Ok((Instruction::StopClocks, pc.wrapping_add(2))),
        0x12 => Ok((Instruction::LoadIndirectDEAccumulator, pc.wrapping_add(1))),
        0x17 => Ok((Instruction::RotateLeftAccumulatorThruCarry, pc.wrapping_add(1))),
        0x18 => {
            let e = address_space.read_address_u8(pc.wrapping_add(1)) as i8;
            Ok((Instruction::RelativeJump(e), pc.wrapping_add(2)))
        }
        0x1A => Ok((Instruction::LoadAccumulatorIndirectDE, pc.wrapping_add(1))),
        0x1F => Ok((Instruction::RotateRightAccumulatorThruCarry, pc.wrapping_add(1))),
        0x20 | 0x28 | 0x30 | 0x38 => {
            let cc = parse_jump_condition(opcode);
            let e = address_space.read_address_u8(pc.wrapping_add(1)) as i8;
            Ok((Instruction::RelativeJumpCond(cc, e), pc.wrapping_add(2)))
        }
        0x22 => Ok((Instruction::LoadIndirectHLIncAccumulator, pc.wrapping_add(1))),
        0x27 => Ok((Instruction::DecimalAdjustAccumulator, pc.wrapping_add(1))),
        0x2A => Ok((Instruction::LoadAccumulatorIndirectHLInc, pc.wrapping_add(1))),
        0x2F => Ok((Instruction::ComplementAccumulator, pc.wrapping_add(1))),
        0x32 => Ok((Instruction::LoadIndirectHLDecAccumulator, pc.wrapping_add(1))),
        0x37 => Ok((Instruction::SetCarryFlag, pc.wrapping_add(1))),
        0x3A => Ok((Instruction::LoadAccumulatorIndirectHLDec, pc.wrapping_add(1))),
        0x3F => Ok((Instruction::ComplementCarryFlag, pc.wrapping_add(1))),
        opcode @ 0x40..=0x7F => {
            if opcode == 0x76 {
                Ok((Instruction::HaltClock, pc.wrapping_add(1)))
            } else {
                let instruction = match (
                    CpuRegister::from_mid_opcode_bits(opcode),
                    CpuRegister::from_low_opcode_bits(opcode),
                ) {
                    (Some(r), Some(r_p)) => Instruction::LoadRegisterRegister(r, r_p),
                    (Some(r), None) => Instruction::LoadRegisterIndirectHL(r),
                    (None, Some(r)) => Instruction::LoadIndirectHLRegister(r),
                    (None, None) => unreachable!("0x76 is handled above"),
                };
                Ok((instruction, pc.wrapping_add(1)))
            }
        }
        opcode @ 0x80..=0x87 => {
            let instruction = CpuRegister::from_low_opcode_bits(opcode)
                .map_or(Instruction::AddIndirectHL, Instruction::AddRegister);
            Ok((instruction, pc.wrapping_add(1)))
        }
        opcode @ 0x88..=0x8F => {
            let instruction = CpuRegister::from_low_opcode_bits(opcode)
                .map_or(Instruction::AddCarryIndirectHL, Instruction::AddCarryRegister);
            Ok((instruction, pc.wrapping_add(1)))
        }
        opcode @ 0x90..=0x97 => {
            let instruction = CpuRegister::from_low_opcode_bits(opcode)
                .map_or(Instruction::SubtractIndirectHL, Instruction::SubtractRegister);
            Ok((instruction, pc.wrapping_add(1)))
        }
        opcode @ 0x98..=0x9F => {
            let instruction = CpuRegister::from_low_opcode_bits(opcode).map_or(
                Instruction::SubtractCarryIndirectHL,
                Instruction::SubtractCarryRegister,
            );
            Ok((instruction, pc.wrapping_add(1)))
        }
        opcode @ 0xA0..=0xA7 => {
            let instruction = CpuRegister::from_low_opcode_bits(opcode)
                .map_or(Instruction::AndIndirectHL, Instruction::AndRegister);
            Ok((instruction, pc.wrapping_add(1)))
        }
        opcode @ 0xA8..=0xAF => {
            let instruction = CpuRegister::from_low_opcode_bits(opcode)
                .map_or(Instruction::XorIndirectHL, Instruction::XorRegister);
            Ok((instruction, pc.wrapping_add(1)))
        }
        opcode @ 0xB0..=0xB7 => {
            let instruction = CpuRegister::from_low_opcode_bits(opcode)
                .map_or(Instruction::OrIndirectHL, Instruction::OrRegister);
            Ok((instruction, pc.wrapping_add(1)))
        }
        opcode @ 0xB8..=0xBF => {
            let instruction = CpuRegister::from_low_opcode_bits(opcode)
                .map_or(Instruction::CompareIndirectHL, Instruction::CompareRegister);
            Ok((instruction, pc.wrapping_add(1)))
        }
        0xC0 | 0xC8 | 0xD0 | 0xD8 => {
            let cc = parse_jump_condition(opcode);
            Ok((Instruction::ReturnCond(cc), pc.wrapping_add(1)))
        }
        0xC1 | 0xD1 | 0xE1 | 0xF1 => {
            let rr = register_pair_for_push_pop(opcode);
            Ok((Instruction::PopStack(rr), pc.wrapping_add(1)))
        }
        0xC2 | 0xCA | 0xD2 | 0xDA => {
            let cc = parse_jump_condition(opcode);
            let nn = address_space.read_address_u16(pc.wrapping_add(1));
            Ok((Instruction::JumpCond(cc, nn), pc.wrapping_add(3)))
        }
        0xC3 => {
            let nn = address_space.read_address_u16(pc.wrapping_add(1));
            Ok((Instruction::Jump(nn), pc.wrapping_add(3)))
        }
        0xC4 | 0xCC | 0xD4 | 0xDC => {
            let cc = parse_jump_condition(opcode);
            let nn = address_space.read_address_u16(pc.wrapping_add(1));
            Ok((Instruction::CallCond(cc, nn), pc.wrapping_add(3)))
        }
        0xC5 | 0xD5 | 0xE5 | 0xF5 => {
            let rr = register_pair_for_push_pop(opcode);
            Ok((Instruction::PushStack(rr), pc.wrapping_add(1)))
        }
        0xC6 => {
            let n = address_space.read_address_u8(pc.wrapping_add(1));
            Ok((Instruction::AddImmediate(n), pc.wrapping_add(2)))
        }
        0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
            let rst_address = opcode & 0x38;
            Ok((Instruction::RestartCall(rst_address), pc.wrapping_add(1)))
        }
        0xC9 => Ok((Instruction::Return, pc.wrapping_add(1))),
        0xCB => Ok(parse_cb_prefixed_opcode(address_space, pc)),
        0xCD => {
            let nn = address_space.read_address_u16(pc.wrapping_add(1));
            Ok((Instruction::Call(nn), pc.wrapping_add(3)))
        }
        0xCE => {
            let n = address_space.read_address_u8(pc.wrapping_add(1));
            Ok((Instruction::AddCarryImmediate(n), pc.wrapping_add(2)))
        }
        0xD6 => {
            let n = address_space.read_address_u8(pc.wrapping_add(1));
            Ok((Instruction::SubtractImmediate(n), pc.wrapping_add(2)))
        }
        0xD9 => Ok((Instruction::ReturnFromInterruptHandler, pc.wrapping_add(1))),
        0xDE => {
            let n = address_space.read_address_u8(pc.wrapping_add(1));
            Ok((Instruction::SubtractCarryImmediate(n), pc.wrapping_add(2)))
        }
        0xE0 => {
            let n = address_space.read_address_u8(pc.wrapping_add(1));
            Ok((Instruction::LoadDirect8Accumulator(n), pc.wrapping_add(2)))
        }
        0xE2 => Ok((Instruction::LoadIndirectCAccumulator, pc.wrapping_add(1))),
        0xE6 => {
            let n = address_space.read_address_u8(pc.wrapping_add(1));
            Ok((Instruction::AndImmediate(n), pc.wrapping_add(2)))
        }
        0xE8 => {
            let e = address_space.read_address_u8(pc.wrapping_add(1)) as i8;
            Ok((Instruction::AddSPImmediate(e), pc.wrapping_add(2)))
        }
        0xE9 => Ok((Instruction::JumpHL, pc.wrapping_add(1))),
        0xEA => {
            let nn = address_space.read_address_u16(pc.wrapping_add(1));
            Ok((Instruction::LoadDirect16Accumulator(nn), pc.wrapping_add(3)))
        }
        0xEE => {
            let n = address_space.read_address_u8(pc.wrapping_add(1));
            Ok((Instruction::XorImmediate(n), pc.wrapping_add(2)))
        }
        0xF0 => {
            let n = address_space.read_address_u8(pc.wrapping_add(1));
            Ok((Instruction::LoadAccumulatorDirect8(n), pc.wrapping_add(2)))
        }
        0xF2 => Ok((Instruction::LoadAccumulatorIndirectC, pc.wrapping_add(1))),
        0xF3 => Ok((Instruction::DisableInterrupts, pc.wrapping_add(1))),
        0xF6 => {
            let n = address_space.read_address_u8(pc.wrapping_add(1));
            Ok((Instruction::OrImmediate(n), pc.wrapping_add(2)))
        }
        0xF8 => {
            let e = address_space.read_address_u8(pc.wrapping_add(1)) as i8;
            Ok((Instruction::LoadHLStackPointerOffset(e), pc.wrapping_add(2)))
        }
        0xF9 => Ok((Instruction::LoadStackPointerHL, pc.wrapping_add(1))),
        0xFA => {
            let nn = address_space.read_address_u16(pc.wrapping_add(1));
            Ok((Instruction::LoadAccumulatorDirect16(nn), pc.wrapping_add(3)))
        }
        0xFB => Ok((Instruction::EnableInterrupts, pc.wrapping_add(1))),
        0xFE => {
            let n = address_space.read_address_u8(pc.wrapping_add(1));
            Ok((Instruction::CompareImmediate(n), pc.wrapping_add(2)))
        }
        _ => Err(ParseError::UnrecognizedOpcode { opcode, address: pc }),
    }
}

// Every CB-prefixed opcode is valid, so this cannot fail
fn parse_cb_prefixed_opcode(address_space: &AddressSpace, pc: u16) -> (Instruction, u16) {
    let opcode = address_space.read_address_u8(pc.wrapping_add(1));
    let register = CpuRegister::from_low_opcode_bits(opcode);
    let new_pc = pc.wrapping_add(2);

    let instruction = match opcode {
        0x00..=0x07 => {
            register.map_or(Instruction::RotateLeftIndirectHL, Instruction::RotateLeft)
        }
        0x08..=0x0F => {
            register.map_or(Instruction::RotateRightIndirectHL, Instruction::RotateRight)
        }
        0x10..=0x17 => register.map_or(
            Instruction::RotateLeftIndirectHLThruCarry,
            Instruction::RotateLeftThruCarry,
        ),
        0x18..=0x1F => register.map_or(
            Instruction::RotateRightIndirectHLThruCarry,
            Instruction::RotateRightThruCarry,
        ),
        0x20..=0x27 => {
            register.map_or(Instruction::ShiftLeftIndirectHL, Instruction::ShiftLeft)
        }
        0x28..=0x2F => {
            register.map_or(Instruction::ShiftRightIndirectHL, Instruction::ShiftRight)
        }
        0x30..=0x37 => register.map_or(Instruction::SwapIndirectHL, Instruction::Swap),
        0x38..=0x3F => register.map_or(
            Instruction::ShiftRightLogicalIndirectHL,
            Instruction::ShiftRightLogical,
        ),
        opcode @ 0x40..=0x7F => {
            let bit = (opcode & 0x38) >> 3;
            register.map_or(Instruction::TestBitIndirectHL(bit), |r| {
                Instruction::TestBit(bit, r)
            })
        }
        opcode @ 0x80..=0xBF => {
            let bit = (opcode & 0x38) >> 3;
            register.map_or(Instruction::ResetBitIndirectHL(bit), |r| {
                Instruction::ResetBit(bit, r)
            })
        }
        opcode @ 0xC0..=0xFF => {
            let bit = (opcode & 0x38) >> 3;
            register.map_or(Instruction::SetBitIndirectHL(bit), |r| {
                Instruction::SetBit(bit, r)
            })
        }
    };

    (instruction, new_pc)
}

fn register_pair_for_other_ops(opcode: u8) -> CpuRegisterPair {
    match opcode & 0x30 {
        0x00 => CpuRegisterPair::BC,
        0x10 => CpuRegisterPair::DE,
        0x20 => CpuRegisterPair::HL,
        0x30 => CpuRegisterPair::SP,
        _ => unreachable!("value & 0x30 always produces 0x00/0x10/0x20/0x30"),
    }
}

fn register_pair_for_push_pop(opcode: u8) -> CpuRegisterPair {
    match opcode & 0x30 {
        0x00 => CpuRegisterPair::BC,
        0x10 => CpuRegisterPair::DE,
        0x20 => CpuRegisterPair::HL,
        0x30 => CpuRegisterPair::AF,
        _ => unreachable!("value & 0x30 always produces 0x00/0x10/0x20/0x30"),
    }
}

fn parse_jump_condition(opcode: u8) -> JumpCondition {
    JumpCondition::from_opcode_bits((opcode & 0x18) >> 3)
}
