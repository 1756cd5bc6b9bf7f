mod parse;

pub(crate) use parse::parse_next_instruction;

use crate::cpu::registers::{CpuRegister, CpuRegisterPair, CpuRegisters};
use crate::memory::AddressSpace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JumpCondition {
    NZ,
    Z,
    NC,
    C,
}

impl JumpCondition {
    fn from_opcode_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0x00 => Self::NZ,
            0x01 => Self::Z,
            0x02 => Self::NC,
            0x03 => Self::C,
            _ => unreachable!("value & 0x03 is always in [0x00, 0x03]"),
        }
    }

    fn check(self, cpu_registers: &CpuRegisters) -> bool {
        match self {
            Self::NZ => !cpu_registers.zero_flag(),
            Self::Z => cpu_registers.zero_flag(),
            Self::NC => !cpu_registers.carry_flag(),
            Self::C => cpu_registers.carry_flag(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Instruction {
    // LD r, r'
    LoadRegisterRegister(CpuRegister, CpuRegister),
    // LD r, n
    LoadRegisterImmediate(CpuRegister, u8),
    // LD r, (HL)
    LoadRegisterIndirectHL(CpuRegister),
    // LD (HL), r
    LoadIndirectHLRegister(CpuRegister),
    // LD (HL), n
    LoadIndirectHLImmediate(u8),
    // LD A, (BC)
    LoadAccumulatorIndirectBC,
    // LD A, (DE)
    LoadAccumulatorIndirectDE,
    // LD (BC), A
    LoadIndirectBCAccumulator,
    // LD (DE), A
    LoadIndirectDEAccumulator,
    // LD A, (nn)
    LoadAccumulatorDirect16(u16),
    // LD (nn), A
    LoadDirect16Accumulator(u16),
    // LDH A, (C)
    LoadAccumulatorIndirectC,
    // LDH (C), A
    LoadIndirectCAccumulator,
    // LDH A, (n)
    LoadAccumulatorDirect8(u8),
    // LDH (n), A
    LoadDirect8Accumulator(u8),
    // LD A, (HL-)
    LoadAccumulatorIndirectHLDec,
    // LD (HL-), A
    LoadIndirectHLDecAccumulator,
    // LD A, (HL+)
    LoadAccumulatorIndirectHLInc,
    // LD (HL+), A
    LoadIndirectHLIncAccumulator,
    // LD rr, nn
    LoadRegisterPairImmediate(CpuRegisterPair, u16),
    // LD (nn), SP
    LoadDirectStackPointer(u16),
    // LD SP, HL
    LoadStackPointerHL,
    // LDHL SP, e
    LoadHLStackPointerOffset(i8),
    // PUSH rr
    PushStack(CpuRegisterPair),
    // POP rr
    PopStack(CpuRegisterPair),
    // ADD r
    AddRegister(CpuRegister),
    // ADD (HL)
    AddIndirectHL,
    // ADD n
    AddImmediate(u8),
    // ADC r
    AddCarryRegister(CpuRegister),
    // ADC (HL)
    AddCarryIndirectHL,
    // ADC n
    AddCarryImmediate(u8),
    // SUB r
    SubtractRegister(CpuRegister),
    // SUB (HL)
    SubtractIndirectHL,
    // SUB n
    SubtractImmediate(u8),
    // SBC r
    SubtractCarryRegister(CpuRegister),
    // SBC (HL)
    SubtractCarryIndirectHL,
    // SBC n
    SubtractCarryImmediate(u8),
    // CP r
    CompareRegister(CpuRegister),
    // CP (HL)
    CompareIndirectHL,
    // CP n
    CompareImmediate(u8),
    // INC r
    IncRegister(CpuRegister),
    // INC (HL)
    IncIndirectHL,
    // DEC r
    DecRegister(CpuRegister),
    // DEC (HL)
    DecIndirectHL,
    // AND r
    AndRegister(CpuRegister),
    // AND (HL)
    AndIndirectHL,
    // AND n
    AndImmediate(u8),
    // OR r
    OrRegister(CpuRegister),
    // OR (HL)
    OrIndirectHL,
    // OR n
    OrImmediate(u8),
    // XOR r
    XorRegister(CpuRegister),
    // XOR (HL)
    XorIndirectHL,
    // XOR n
    XorImmediate(u8),
    // ADD HL, rr
    AddHLRegister(CpuRegisterPair),
    // INC rr
    IncRegisterPair(CpuRegisterPair),
    // DEC rr
    DecRegisterPair(CpuRegisterPair),
    // ADD SP, e
    AddSPImmediate(i8),
    // RLCA
    RotateLeftAccumulator,
    // RLA
    RotateLeftAccumulatorThruCarry,
    // RRCA
    RotateRightAccumulator,
    // RRA
    RotateRightAccumulatorThruCarry,
    // RLC r
    RotateLeft(CpuRegister),
    // RLC (HL)
    RotateLeftIndirectHL,
    // RL r
    RotateLeftThruCarry(CpuRegister),
    // RL (HL)
    RotateLeftIndirectHLThruCarry,
    // RRC r
    RotateRight(CpuRegister),
    // RRC (HL)
    RotateRightIndirectHL,
    // RR r
    RotateRightThruCarry(CpuRegister),
    // RR (HL)
    RotateRightIndirectHLThruCarry,
    // SLA r
    ShiftLeft(CpuRegister),
    // SLA (HL)
    ShiftLeftIndirectHL,
    // SWAP r
    Swap(CpuRegister),
    // SWAP (HL)
    SwapIndirectHL,
    // SRA r
    ShiftRight(CpuRegister),
    // SRA (HL)
    ShiftRightIndirectHL,
    // SRL r
    ShiftRightLogical(CpuRegister),
    // SRL (HL)
    ShiftRightLogicalIndirectHL,
    // BIT n, r
    TestBit(u8, CpuRegister),
    // BIT n, (HL)
    TestBitIndirectHL(u8),
    // SET n, r
    SetBit(u8, CpuRegister),
    // SET n, (HL)
    SetBitIndirectHL(u8),
    // RES n, r
    ResetBit(u8, CpuRegister),
    // RES n, (HL)
    ResetBitIndirectHL(u8),
    // CCF
    ComplementCarryFlag,
    // SCF
    SetCarryFlag,
    // DAA
    DecimalAdjustAccumulator,
    // CPL
    ComplementAccumulator,
    // JP nn
    Jump(u16),
    // JP HL
    JumpHL,
    // JP cc, nn
    JumpCond(JumpCondition, u16),
    // JR e
    RelativeJump(i8),
    // JR cc, e
    RelativeJumpCond(JumpCondition, i8),
    // CALL nn
    Call(u16),
    // CALL cc, nn
    CallCond(JumpCondition, u16),
    // RET
    Return,
    // RET cc
    ReturnCond(JumpCondition),
    // RETI
    ReturnFromInterruptHandler,
    // RST n
    RestartCall(u8),
    // HALT
    HaltClock,
    // STOP
    StopClocks,
    // DI
    DisableInterrupts,
    // EI
    EnableInterrupts,
    // NOP
    NoOp,
}

impl Instruction {
    /// The machine cycle cost of this instruction. Conditional control flow
    /// reads the current flags, so this must be evaluated before `execute`
    /// mutates the register file.
    pub(crate) fn cycles_required(self, cpu_registers: &CpuRegisters) -> u32 {
        match self {
            Self::LoadRegisterRegister(..)
            | Self::LoadStackPointerHL
            | Self::AddRegister(..)
            | Self::AddCarryRegister(..)
            | Self::SubtractRegister(..)
            | Self::SubtractCarryRegister(..)
            | Self::CompareRegister(..)
            | Self::IncRegister(..)
            | Self::DecRegister(..)
            | Self::AndRegister(..)
            | Self::OrRegister(..)
            | Self::XorRegister(..)
            | Self::RotateLeftAccumulator
            | Self::RotateLeftAccumulatorThruCarry
            | Self::RotateRightAccumulator
            | Self::RotateRightAccumulatorThruCarry
            | Self::ComplementCarryFlag
            | Self::SetCarryFlag
            | Self::DecimalAdjustAccumulator
            | Self::ComplementAccumulator
            | Self::JumpHL
            | Self::HaltClock
            | Self::StopClocks
            | Self::DisableInterrupts
            | Self::EnableInterrupts
            | Self::NoOp => 1,
            Self::LoadRegisterImmediate(..)
            | Self::LoadRegisterIndirectHL(..)
            | Self::LoadIndirectHLRegister(..)
            | Self::LoadAccumulatorIndirectBC
            | Self::LoadAccumulatorIndirectDE
            | Self::LoadIndirectBCAccumulator
            | Self::LoadIndirectDEAccumulator
            | Self::LoadAccumulatorIndirectC
            | Self::LoadIndirectCAccumulator
            | Self::LoadAccumulatorIndirectHLDec
            | Self::LoadIndirectHLDecAccumulator
            | Self::LoadAccumulatorIndirectHLInc
            | Self::LoadIndirectHLIncAccumulator
            | Self::AddIndirectHL
            | Self::AddImmediate(..)
            | Self::AddCarryIndirectHL
            | Self::AddCarryImmediate(..)
            | Self::SubtractIndirectHL
            | Self::SubtractImmediate(..)
            | Self::SubtractCarryIndirectHL
            | Self::SubtractCarryImmediate(..)
            | Self::CompareIndirectHL
            | Self::CompareImmediate(..)
            | Self::AndIndirectHL
            | Self::AndImmediate(..)
            | Self::OrIndirectHL
            | Self::OrImmediate(..)
            | Self::XorIndirectHL
            | Self::XorImmediate(..)
            | Self::AddHLRegister(..)
            | Self::IncRegisterPair(..)
            | Self::DecRegisterPair(..)
            | Self::RotateLeft(..)
            | Self::RotateLeftThruCarry(..)
            | Self::RotateRight(..)
            | Self::RotateRightThruCarry(..)
            | Self::ShiftLeft(..)
            | Self::Swap(..)
            | Self::ShiftRight(..)
            | Self::ShiftRightLogical(..)
            | Self::TestBit(..)
            | Self::SetBit(..)
            | Self::ResetBit(..) => 2,
            Self::LoadIndirectHLImmediate(..)
            | Self::LoadAccumulatorDirect8(..)
            | Self::LoadDirect8Accumulator(..)
            | Self::LoadRegisterPairImmediate(..)
            | Self::LoadHLStackPointerOffset(..)
            | Self::PopStack(..)
            | Self::IncIndirectHL
            | Self::DecIndirectHL
            | Self::TestBitIndirectHL(..) => 3,
            Self::LoadAccumulatorDirect16(..)
            | Self::LoadDirect16Accumulator(..)
            | Self::PushStack(..)
            | Self::AddSPImmediate(..)
            | Self::RotateLeftIndirectHL
            | Self::RotateLeftIndirectHLThruCarry
            | Self::RotateRightIndirectHL
            | Self::RotateRightIndirectHLThruCarry
            | Self::ShiftLeftIndirectHL
            | Self::SwapIndirectHL
            | Self::ShiftRightIndirectHL
            | Self::ShiftRightLogicalIndirectHL
            | Self::SetBitIndirectHL(..)
            | Self::ResetBitIndirectHL(..)
            | Self::Jump(..)
            | Self::Return
            | Self::ReturnFromInterruptHandler
            | Self::RestartCall(..) => 4,
            Self::LoadDirectStackPointer(..) => 5,
            Self::Call(..) => 6,
            Self::JumpCond(cc, ..) => {
                if cc.check(cpu_registers) {
                    4
                } else {
                    3
                }
            }
            Self::RelativeJump(..) => 3,
            Self::RelativeJumpCond(cc, ..) => {
                if cc.check(cpu_registers) {
                    3
                } else {
                    2
                }
            }
            Self::CallCond(cc, ..) => {
                if cc.check(cpu_registers) {
                    6
                } else {
                    3
                }
            }
            Self::ReturnCond(cc) => {
                if cc.check(cpu_registers) {
                    5
                } else {
                    2
                }
            }
        }
    }

    pub(crate) fn execute(
        self,
        address_space: &mut AddressSpace,
        cpu_registers: &mut CpuRegisters,
    ) {
        match self {
            Self::LoadRegisterRegister(r, r_p) => {
                cpu_registers.set_register(r, cpu_registers.read_register(r_p));
            }
            Self::LoadRegisterImmediate(r, n) => {
                cpu_registers.set_register(r, n);
            }
            Self::LoadRegisterIndirectHL(r) => {
                let value = address_space.read_address_u8(cpu_registers.hl());
                cpu_registers.set_register(r, value);
            }
            Self::LoadIndirectHLRegister(r) => {
                let value = cpu_registers.read_register(r);
                address_space.write_address_u8(cpu_registers.hl(), value);
            }
            Self::LoadIndirectHLImmediate(n) => {
                address_space.write_address_u8(cpu_registers.hl(), n);
            }
            Self::LoadAccumulatorIndirectBC => {
                cpu_registers.accumulator = address_space.read_address_u8(cpu_registers.bc());
            }
            Self::LoadAccumulatorIndirectDE => {
                cpu_registers.accumulator = address_space.read_address_u8(cpu_registers.de());
            }
            Self::LoadIndirectBCAccumulator => {
                address_space.write_address_u8(cpu_registers.bc(), cpu_registers.accumulator);
            }
            Self::LoadIndirectDEAccumulator => {
                address_space.write_address_u8(cpu_registers.de(), cpu_registers.accumulator);
            }
            Self::LoadAccumulatorDirect16(nn) => {
                cpu_registers.accumulator = address_space.read_address_u8(nn);
            }
            Self::LoadDirect16Accumulator(nn) => {
                address_space.write_address_u8(nn, cpu_registers.accumulator);
            }
            Self::LoadAccumulatorIndirectC => {
                let address = u16::from_be_bytes([0xFF, cpu_registers.c]);
                cpu_registers.accumulator = address_space.read_address_u8(address);
            }
            Self::LoadIndirectCAccumulator => {
                let address = u16::from_be_bytes([0xFF, cpu_registers.c]);
                address_space.write_address_u8(address, cpu_registers.accumulator);
            }
            Self::LoadAccumulatorDirect8(n) => {
                let address = u16::from_be_bytes([0xFF, n]);
                cpu_registers.accumulator = address_space.read_address_u8(address);
            }
            Self::LoadDirect8Accumulator(n) => {
                let address = u16::from_be_bytes([0xFF, n]);
                address_space.write_address_u8(address, cpu_registers.accumulator);
            }
            Self::LoadAccumulatorIndirectHLDec => {
                let hl = cpu_registers.hl();
                cpu_registers.accumulator = address_space.read_address_u8(hl);
                cpu_registers.set_register_pair(CpuRegisterPair::HL, hl.wrapping_sub(1));
            }
            Self::LoadIndirectHLDecAccumulator => {
                let hl = cpu_registers.hl();
                address_space.write_address_u8(hl, cpu_registers.accumulator);
                cpu_registers.set_register_pair(CpuRegisterPair::HL, hl.wrapping_sub(1));
            }
            Self::LoadAccumulatorIndirectHLInc => {
                let hl = cpu_registers.hl();
                cpu_registers.accumulator = address_space.read_address_u8(hl);
                cpu_registers.set_register_pair(CpuRegisterPair::HL, hl.wrapping_add(1));
            }
            Self::LoadIndirectHLIncAccumulator => {
                let hl = cpu_registers.hl();
                address_space.write_address_u8(hl, cpu_registers.accumulator);
                cpu_registers.set_register_pair(CpuRegisterPair::HL, hl.wrapping_add(1));
            }
            Self::LoadRegisterPairImmediate(rr, nn) => {
                cpu_registers.set_register_pair(rr, nn);
            }
            Self::LoadDirectStackPointer(nn) => {
                address_space.write_address_u16(nn, cpu_registers.sp);
            }
            Self::LoadStackPointerHL => {
                cpu_registers.sp = cpu_registers.hl();
            }
            Self::PushStack(rr) => {
                cpu_registers.sp = cpu_registers.sp.wrapping_sub(2);
                address_space
                    .write_address_u16(cpu_registers.sp, cpu_registers.read_register_pair(rr));
            }
            Self::PopStack(rr) => {
                cpu_registers
                    .set_register_pair(rr, address_space.read_address_u16(cpu_registers.sp));
                cpu_registers.sp = cpu_registers.sp.wrapping_add(2);
            }
            Self::AddRegister(r) => {
                let (sum, carry, h_flag) =
                    add(cpu_registers.accumulator, cpu_registers.read_register(r), false);
                cpu_registers.accumulator = sum;
                cpu_registers.set_flags(sum == 0, false, h_flag, carry);
            }
            Self::AddIndirectHL => {
                let value = address_space.read_address_u8(cpu_registers.hl());
                let (sum, carry, h_flag) = add(cpu_registers.accumulator, value, false);
                cpu_registers.accumulator = sum;
                cpu_registers.set_flags(sum == 0, false, h_flag, carry);
            }
            Self::AddImmediate(n) => {
                let (sum, carry, h_flag) = add(cpu_registers.accumulator, n, false);
                cpu_registers.accumulator = sum;
                cpu_registers.set_flags(sum == 0, false, h_flag, carry);
            }
            Self::AddCarryRegister(r) => {
                let (sum, carry, h_flag) = add(
                    cpu_registers.accumulator,
                    cpu_registers.read_register(r),
                    cpu_registers.carry_flag(),
                );
                cpu_registers.accumulator = sum;
                cpu_registers.set_flags(sum == 0, false, h_flag, carry);
            }
            Self::AddCarryIndirectHL => {
                let value = address_space.read_address_u8(cpu_registers.hl());
                let (sum, carry, h_flag) =
                    add(cpu_registers.accumulator, value, cpu_registers.carry_flag());
                cpu_registers.accumulator = sum;
                cpu_registers.set_flags(sum == 0, false, h_flag, carry);
            }
            Self::AddCarryImmediate(n) => {
                let (sum, carry, h_flag) =
                    add(cpu_registers.accumulator, n, cpu_registers.carry_flag());
                cpu_registers.accumulator = sum;
                cpu_registers.set_flags(sum == 0, false, h_flag, carry);
            }
            Self::SubtractRegister(r) => {
                let (difference, carry, h_flag) =
                    sub(cpu_registers.accumulator, cpu_registers.read_register(r), false);
                cpu_registers.accumulator = difference;
                cpu_registers.set_flags(difference == 0, true, h_flag, carry);
            }
            Self::SubtractIndirectHL => {
                let value = address_space.read_address_u8(cpu_registers.hl());
                let (difference, carry, h_flag) = sub(cpu_registers.accumulator, value, false);
                cpu_registers.accumulator = difference;
                cpu_registers.set_flags(difference == 0, true, h_flag, carry);
            }
            Self::SubtractImmediate(n) => {
                let (difference, carry, h_flag) = sub(cpu_registers.accumulator, n, false);
                cpu_registers.accumulator = difference;
                cpu_registers.set_flags(difference == 0, true, h_flag, carry);
            }
            Self::SubtractCarryRegister(r) => {
                let (difference, carry, h_flag) = sub(
                    cpu_registers.accumulator,
                    cpu_registers.read_register(r),
                    cpu_registers.carry_flag(),
                );
                cpu_registers.accumulator = difference;
                cpu_registers.set_flags(difference == 0, true, h_flag, carry);
            }
            Self::SubtractCarryIndirectHL => {
                let value = address_space.read_address_u8(cpu_registers.hl());
                let (difference, carry, h_flag) =
                    sub(cpu_registers.accumulator, value, cpu_registers.carry_flag());
                cpu_registers.accumulator = difference;
                cpu_registers.set_flags(difference == 0, true, h_flag, carry);
            }
            Self::SubtractCarryImmediate(n) => {
                let (difference, carry, h_flag) =
                    sub(cpu_registers.accumulator, n, cpu_registers.carry_flag());
                cpu_registers.accumulator = difference;
                cpu_registers.set_flags(difference == 0, true, h_flag, carry);
            }
            Self::CompareRegister(r) => {
                let (difference, carry, h_flag) =
                    sub(cpu_registers.accumulator, cpu_registers.read_register(r), false);
                cpu_registers.set_flags(difference == 0, true, h_flag, carry);
            }
            Self::CompareIndirectHL => {
                let value = address_space.read_address_u8(cpu_registers.hl());
                let (difference, carry, h_flag) = sub(cpu_registers.accumulator, value, false);
                cpu_registers.set_flags(difference == 0, true, h_flag, carry);
            }
            Self::CompareImmediate(n) => {
                let (difference, carry, h_flag) = sub(cpu_registers.accumulator, n, false);
                cpu_registers.set_flags(difference == 0, true, h_flag, carry);
            }
            Self::IncRegister(r) => {
                let (sum, _, h_flag) = add(cpu_registers.read_register(r), 1, false);
                cpu_registers.set_register(r, sum);
                cpu_registers.set_some_flags(Some(sum == 0), Some(false), Some(h_flag), None);
            }
            Self::IncIndirectHL => {
                let address = cpu_registers.hl();
                let (sum, _, h_flag) = add(address_space.read_address_u8(address), 1, false);
                address_space.write_address_u8(address, sum);
                cpu_registers.set_some_flags(Some(sum == 0), Some(false), Some(h_flag), None);
            }
            Self::DecRegister(r) => {
                let (difference, _, h_flag) = sub(cpu_registers.read_register(r), 1, false);
                cpu_registers.set_register(r, difference);
                cpu_registers.set_some_flags(
                    Some(difference == 0),
                    Some(true),
                    Some(h_flag),
                    None,
                );
            }
            Self::DecIndirectHL => {
                let address = cpu_registers.hl();
                let (difference, _, h_flag) =
                    sub(address_space.read_address_u8(address), 1, false);
                address_space.write_address_u8(address, difference);
                cpu_registers.set_some_flags(
                    Some(difference == 0),
                    Some(true),
                    Some(h_flag),
                    None,
                );
            }
            Self::AndRegister(r) => {
                let value = cpu_registers.accumulator & cpu_registers.read_register(r);
                cpu_registers.accumulator = value;
                cpu_registers.set_flags(value == 0, false, true, false);
            }
            Self::AndIndirectHL => {
                let value =
                    cpu_registers.accumulator & address_space.read_address_u8(cpu_registers.hl());
                cpu_registers.accumulator = value;
                cpu_registers.set_flags(value == 0, false, true, false);
            }
            Self::AndImmediate(n) => {
                let value = cpu_registers.accumulator & n;
                cpu_registers.accumulator = value;
                cpu_registers.set_flags(value == 0, false, true, false);
            }
            Self::OrRegister(r) => {
                let value = cpu_registers.accumulator | cpu_registers.read_register(r);
                cpu_registers.accumulator = value;
                cpu_registers.set_flags(value == 0, false, false, false);
            }
            Self::OrIndirectHL => {
                let value =
                    cpu_registers.accumulator | address_space.read_address_u8(cpu_registers.hl());
                cpu_registers.accumulator = value;
                cpu_registers.set_flags(value == 0, false, false, false);
            }
            Self::OrImmediate(n) => {
                let value = cpu_registers.accumulator | n;
                cpu_registers.accumulator = value;
                cpu_registers.set_flags(value == 0, false, false, false);
            }
            Self::XorRegister(r) => {
                let value = cpu_registers.accumulator ^ cpu_registers.read_register(r);
                cpu_registers.accumulator = value;
                cpu_registers.set_flags(value == 0, false, false, false);
            }
            Self::XorIndirectHL => {
                let value =
                    cpu_registers.accumulator ^ address_space.read_address_u8(cpu_registers.hl());
                cpu_registers.accumulator = value;
                cpu_registers.set_flags(value == 0, false, false, false);
            }
            Self::XorImmediate(n) => {
                let value = cpu_registers.accumulator ^ n;
                cpu_registers.accumulator = value;
                cpu_registers.set_flags(value == 0, false, false, false);
            }
            Self::AddHLRegister(rr) => {
                let (sum, carry, h_flag) =
                    add_u16(cpu_registers.hl(), cpu_registers.read_register_pair(rr));
                cpu_registers.set_register_pair(CpuRegisterPair::HL, sum);
                cpu_registers.set_some_flags(None, Some(false), Some(h_flag), Some(carry));
            }
            Self::IncRegisterPair(rr) => {
                cpu_registers
                    .set_register_pair(rr, cpu_registers.read_register_pair(rr).wrapping_add(1));
            }
            Self::DecRegisterPair(rr) => {
                cpu_registers
                    .set_register_pair(rr, cpu_registers.read_register_pair(rr).wrapping_sub(1));
            }
            Self::AddSPImmediate(e) => {
                let (sp, carry, h_flag) = add_sp_offset(cpu_registers.sp, e);
                cpu_registers.sp = sp;
                cpu_registers.set_flags(false, false, h_flag, carry);
            }
            Self::LoadHLStackPointerOffset(e) => {
                let (hl, carry, h_flag) = add_sp_offset(cpu_registers.sp, e);
                cpu_registers.set_register_pair(CpuRegisterPair::HL, hl);
                cpu_registers.set_flags(false, false, h_flag, carry);
            }
            Self::RotateLeftAccumulator => {
                let (value, carry_flag) = rotate_left(cpu_registers.accumulator);
                cpu_registers.accumulator = value;
                cpu_registers.set_flags(false, false, false, carry_flag);
            }
            Self::RotateLeftAccumulatorThruCarry => {
                let (value, carry_flag) =
                    rotate_left_thru_carry(cpu_registers.accumulator, cpu_registers.carry_flag());
                cpu_registers.accumulator = value;
                cpu_registers.set_flags(false, false, false, carry_flag);
            }
            Self::RotateRightAccumulator => {
                let (value, carry_flag) = rotate_right(cpu_registers.accumulator);
                cpu_registers.accumulator = value;
                cpu_registers.set_flags(false, false, false, carry_flag);
            }
            Self::RotateRightAccumulatorThruCarry => {
                let (value, carry_flag) =
                    rotate_right_thru_carry(cpu_registers.accumulator, cpu_registers.carry_flag());
                cpu_registers.accumulator = value;
                cpu_registers.set_flags(false, false, false, carry_flag);
            }
            Self::RotateLeft(r) => {
                let (value, carry_flag) = rotate_left(cpu_registers.read_register(r));
                cpu_registers.set_register(r, value);
                cpu_registers.set_flags(value == 0, false, false, carry_flag);
            }
            Self::RotateLeftIndirectHL => {
                let address = cpu_registers.hl();
                let (value, carry_flag) = rotate_left(address_space.read_address_u8(address));
                address_space.write_address_u8(address, value);
                cpu_registers.set_flags(value == 0, false, false, carry_flag);
            }
            Self::RotateLeftThruCarry(r) => {
                let (value, carry_flag) = rotate_left_thru_carry(
                    cpu_registers.read_register(r),
                    cpu_registers.carry_flag(),
                );
                cpu_registers.set_register(r, value);
                cpu_registers.set_flags(value == 0, false, false, carry_flag);
            }
            Self::RotateLeftIndirectHLThruCarry => {
                let address = cpu_registers.hl();
                let (value, carry_flag) = rotate_left_thru_carry(
                    address_space.read_address_u8(address),
                    cpu_registers.carry_flag(),
                );
                address_space.write_address_u8(address, value);
                cpu_registers.set_flags(value == 0, false, false, carry_flag);
            }
            Self::RotateRight(r) => {
                let (value, carry_flag) = rotate_right(cpu_registers.read_register(r));
                cpu_registers.set_register(r, value);
                cpu_registers.set_flags(value == 0, false, false, carry_flag);
            }
            Self::RotateRightIndirectHL => {
                let address = cpu_registers.hl();
                let (value, carry_flag) = rotate_right(address_space.read_address_u8(address));
                address_space.write_address_u8(address, value);
                cpu_registers.set_flags(value == 0, false, false, carry_flag);
            }
            Self::RotateRightThruCarry(r) => {
                let (value, carry_flag) = rotate_right_thru_carry(
                    cpu_registers.read_register(r),
                    cpu_registers.carry_flag(),
                );
                cpu_registers.set_register(r, value);
                cpu_registers.set_flags(value == 0, false, false, carry_flag);
            }
            Self::RotateRightIndirectHLThruCarry => {
                let address = cpu_registers.hl();
                let (value, carry_flag) = rotate_right_thru_carry(
                    address_space.read_address_u8(address),
                    cpu_registers.carry_flag(),
                );
                address_space.write_address_u8(address, value);
                cpu_registers.set_flags(value == 0, false, false, carry_flag);
            }
            Self::ShiftLeft(r) => {
                let (value, carry_flag) = shift_left(cpu_registers.read_register(r));
                cpu_registers.set_register(r, value);
                cpu_registers.set_flags(value == 0, false, false, carry_flag);
            }
            Self::ShiftLeftIndirectHL => {
                let address = cpu_registers.hl();
                let (value, carry_flag) = shift_left(address_space.read_address_u8(address));
                address_space.write_address_u8(address, value);
                cpu_registers.set_flags(value == 0, false, false, carry_flag);
            }
            Self::Swap(r) => {
                let value = cpu_registers.read_register(r).rotate_left(4);
                cpu_registers.set_register(r, value);
                cpu_registers.set_flags(value == 0, false, false, false);
            }
            Self::SwapIndirectHL => {
                let address = cpu_registers.hl();
                let value = address_space.read_address_u8(address).rotate_left(4);
                address_space.write_address_u8(address, value);
                cpu_registers.set_flags(value == 0, false, false, false);
            }
            Self::ShiftRight(r) => {
                let (value, carry_flag) = shift_right_arithmetic(cpu_registers.read_register(r));
                cpu_registers.set_register(r, value);
                cpu_registers.set_flags(value == 0, false, false, carry_flag);
            }
            Self::ShiftRightIndirectHL => {
                let address = cpu_registers.hl();
                let (value, carry_flag) =
                    shift_right_arithmetic(address_space.read_address_u8(address));
                address_space.write_address_u8(address, value);
                cpu_registers.set_flags(value == 0, false, false, carry_flag);
            }
            Self::ShiftRightLogical(r) => {
                let (value, carry_flag) = shift_right_logical(cpu_registers.read_register(r));
                cpu_registers.set_register(r, value);
                cpu_registers.set_flags(value == 0, false, false, carry_flag);
            }
            Self::ShiftRightLogicalIndirectHL => {
                let address = cpu_registers.hl();
                let (value, carry_flag) =
                    shift_right_logical(address_space.read_address_u8(address));
                address_space.write_address_u8(address, value);
                cpu_registers.set_flags(value == 0, false, false, carry_flag);
            }
            Self::TestBit(n, r) => {
                let zero = cpu_registers.read_register(r) & (1 << n) == 0;
                cpu_registers.set_some_flags(Some(zero), Some(false), Some(true), None);
            }
            Self::TestBitIndirectHL(n) => {
                let zero = address_space.read_address_u8(cpu_registers.hl()) & (1 << n) == 0;
                cpu_registers.set_some_flags(Some(zero), Some(false), Some(true), None);
            }
            Self::SetBit(n, r) => {
                cpu_registers.set_register(r, cpu_registers.read_register(r) | (1 << n));
            }
            Self::SetBitIndirectHL(n) => {
                let address = cpu_registers.hl();
                let value = address_space.read_address_u8(address) | (1 << n);
                address_space.write_address_u8(address, value);
            }
            Self::ResetBit(n, r) => {
                cpu_registers.set_register(r, cpu_registers.read_register(r) & !(1 << n));
            }
            Self::ResetBitIndirectHL(n) => {
                let address = cpu_registers.hl();
                let value = address_space.read_address_u8(address) & !(1 << n);
                address_space.write_address_u8(address, value);
            }
            Self::ComplementCarryFlag => {
                cpu_registers.set_some_flags(
                    None,
                    Some(false),
                    Some(false),
                    Some(!cpu_registers.carry_flag()),
                );
            }
            Self::SetCarryFlag => {
                cpu_registers.set_some_flags(None, Some(false), Some(false), Some(true));
            }
            Self::DecimalAdjustAccumulator => {
                decimal_adjust_accumulator(cpu_registers);
            }
            Self::ComplementAccumulator => {
                cpu_registers.accumulator = !cpu_registers.accumulator;
                cpu_registers.set_some_flags(None, Some(true), Some(true), None);
            }
            Self::Jump(nn) => {
                cpu_registers.pc = nn;
            }
            Self::JumpHL => {
                cpu_registers.pc = cpu_registers.hl();
            }
            Self::JumpCond(cc, nn) => {
                if cc.check(cpu_registers) {
                    cpu_registers.pc = nn;
                }
            }
            Self::RelativeJump(e) => {
                cpu_registers.pc = cpu_registers.pc.wrapping_add(e as u16);
            }
            Self::RelativeJumpCond(cc, e) => {
                if cc.check(cpu_registers) {
                    cpu_registers.pc = cpu_registers.pc.wrapping_add(e as u16);
                }
            }
            Self::Call(nn) => {
                cpu_registers.sp = cpu_registers.sp.wrapping_sub(2);
                address_space.write_address_u16(cpu_registers.sp, cpu_registers.pc);
                cpu_registers.pc = nn;
            }
            Self::CallCond(cc, nn) => {
                if cc.check(cpu_registers) {
                    cpu_registers.sp = cpu_registers.sp.wrapping_sub(2);
                    address_space.write_address_u16(cpu_registers.sp, cpu_registers.pc);
                    cpu_registers.pc = nn;
                }
            }
            Self::Return => {
                cpu_registers.pc = address_space.read_address_u16(cpu_registers.sp);
                cpu_registers.sp = cpu_registers.sp.wrapping_add(2);
            }
            Self::ReturnCond(cc) => {
                if cc.check(cpu_registers) {
                    cpu_registers.pc = address_space.read_address_u16(cpu_registers.sp);
                    cpu_registers.sp = cpu_registers.sp.wrapping_add(2);
                }
            }
            Self::ReturnFromInterruptHandler => {
                cpu_registers.pc = address_space.read_address_u16(cpu_registers.sp);
                cpu_registers.sp = cpu_registers.sp.wrapping_add(2);
                cpu_registers.ime = true;
            }
            Self::RestartCall(rst_address) => {
                cpu_registers.sp = cpu_registers.sp.wrapping_sub(2);
                address_space.write_address_u16(cpu_registers.sp, cpu_registers.pc);
                cpu_registers.pc = u16::from(rst_address);
            }
            Self::HaltClock | Self::StopClocks => {
                // Clock halting is not modeled; both behave as no-ops
            }
            Self::DisableInterrupts => {
                cpu_registers.ime = false;
            }
            Self::EnableInterrupts => {
                cpu_registers.ime = true;
            }
            Self::NoOp => {}
        }
    }
}

// Widening through u16 so that sum + carry cannot overflow
fn add(l_value: u8, r_value: u8, carry: bool) -> (u8, bool, bool) {
    let carry = u16::from(carry);
    let sum = u16::from(l_value) + u16::from(r_value) + carry;
    let h_flag = (l_value & 0x0F) as u16 + (r_value & 0x0F) as u16 + carry >= 0x10;

    (sum as u8, sum > 0xFF, h_flag)
}

fn add_u16(l_value: u16, r_value: u16) -> (u16, bool, bool) {
    let (sum, carry_flag) = l_value.overflowing_add(r_value);
    let h_flag = (l_value & 0x0FFF) + (r_value & 0x0FFF) >= 0x1000;

    (sum, carry_flag, h_flag)
}

fn sub(l_value: u8, r_value: u8, carry: bool) -> (u8, bool, bool) {
    let carry = u16::from(carry);
    let difference = u16::from(l_value)
        .wrapping_sub(u16::from(r_value))
        .wrapping_sub(carry);
    let carry_flag = u16::from(l_value) < u16::from(r_value) + carry;
    let h_flag = u16::from(l_value & 0x0F) < u16::from(r_value & 0x0F) + carry;

    (difference as u8, carry_flag, h_flag)
}

// ADD SP, e and LDHL SP, e compute H and C from the low byte only
fn add_sp_offset(sp: u16, offset: i8) -> (u16, bool, bool) {
    let result = sp.wrapping_add(offset as u16);
    let carry_flag = (sp & 0x00FF) + (offset as u16 & 0x00FF) >= 0x0100;
    let h_flag = (sp & 0x000F) + (offset as u16 & 0x000F) >= 0x0010;

    (result, carry_flag, h_flag)
}

fn rotate_left(value: u8) -> (u8, bool) {
    let leftmost_set = value & 0x80 != 0;
    let new_value = (value << 1) | u8::from(leftmost_set);

    (new_value, leftmost_set)
}

fn rotate_left_thru_carry(value: u8, carry: bool) -> (u8, bool) {
    let leftmost_set = value & 0x80 != 0;
    let new_value = (value << 1) | u8::from(carry);

    (new_value, leftmost_set)
}

fn rotate_right(value: u8) -> (u8, bool) {
    let rightmost_set = value & 0x01 != 0;
    let new_value = (value >> 1) | (u8::from(rightmost_set) << 7);

    (new_value, rightmost_set)
}

fn rotate_right_thru_carry(value: u8, carry: bool) -> (u8, bool) {
    let rightmost_set = value & 0x01 != 0;
    let new_value = (value >> 1) | (u8::from(carry) << 7);

    (new_value, rightmost_set)
}

fn shift_left(value: u8) -> (u8, bool) {
    (value << 1, value & 0x80 != 0)
}

// SRA preserves the sign bit
fn shift_right_arithmetic(value: u8) -> (u8, bool) {
    ((value >> 1) | (value & 0x80), value & 0x01 != 0)
}

fn shift_right_logical(value: u8) -> (u8, bool) {
    (value >> 1, value & 0x01 != 0)
}

fn decimal_adjust_accumulator(cpu_registers: &mut CpuRegisters) {
    if cpu_registers.subtract_flag() {
        // Post-subtraction adjustment
        let mut value = cpu_registers.accumulator;
        if cpu_registers.carry_flag() {
            value = value.wrapping_sub(0x60);
        }
        if cpu_registers.half_carry_flag() {
            value = value.wrapping_sub(0x06);
        }

        cpu_registers.accumulator = value;
        cpu_registers.set_some_flags(Some(value == 0), None, Some(false), None);
    } else {
        // Post-addition adjustment
        let mut value = cpu_registers.accumulator;
        let mut carry = cpu_registers.carry_flag();
        if carry || value > 0x99 {
            value = value.wrapping_add(0x60);
            carry = true;
        }
        if cpu_registers.half_carry_flag() || cpu_registers.accumulator & 0x0F > 0x09 {
            value = value.wrapping_add(0x06);
        }

        cpu_registers.accumulator = value;
        cpu_registers.set_some_flags(Some(value == 0), None, Some(false), Some(carry));
    }
}
