mod cyclecount;

use crate::cpu::registers::{CpuRegister, CpuRegisterPair};
use crate::cpu::Cpu;
use crate::memory::{AddressSpace, Cartridge};
use std::collections::HashMap;

struct ExpectedState {
    a: Option<u8>,
    f: Option<u8>,
    b: Option<u8>,
    c: Option<u8>,
    d: Option<u8>,
    e: Option<u8>,
    h: Option<u8>,
    l: Option<u8>,
    sp: Option<u16>,
    memory: HashMap<u16, u8>,
}

macro_rules! compare_bytes {
    // (expected: Option<T>, actual: T) where T: Eq
    ($([$name:literal, $expected:expr, $actual:expr]),+$(,)?) => {
        {
            let mut match_fails = Vec::new();
            $(
                if let Some(expected) = $expected {
                    let actual = $actual;
                    if expected != actual {
                        match_fails.push(format!("{} mismatch: expected 0x{:02x}, actual 0x{:02x}", $name, expected, actual));
                    }
                }
            )*
            match_fails
        }
    };
}

impl ExpectedState {
    fn empty() -> Self {
        Self {
            a: None,
            f: None,
            b: None,
            c: None,
            d: None,
            e: None,
            h: None,
            l: None,
            sp: None,
            memory: HashMap::new(),
        }
    }

    fn assert_matches(&self, cpu: &Cpu, address_space: &AddressSpace) {
        let registers = cpu.registers();
        let mut match_fails = compare_bytes!(
            ["A", self.a, registers.accumulator],
            ["F", self.f, registers.flags],
            ["B", self.b, registers.b],
            ["C", self.c, registers.c],
            ["D", self.d, registers.d],
            ["E", self.e, registers.e],
            ["H", self.h, registers.h],
            ["L", self.l, registers.l],
            ["SP", self.sp, registers.sp],
        );

        for (&address, &expected) in &self.memory {
            let actual = address_space.read_address_u8(address);
            if expected != actual {
                match_fails.push(format!("Mismatch at memory address 0x{address:04x}: expected = {expected:02x}, actual = {actual:02x}"));
            }
        }

        if !match_fails.is_empty() {
            let error_msgs: Vec<_> = match_fails.into_iter().map(|s| format!("[{s}]")).collect();
            let error_msg = error_msgs.join(", ");
            panic!("Expected state does not match actual state: {error_msg}");
        }
    }
}

// Synthesized cartridge: the boot stub hands off to a JP at the entry point,
// which jumps to the test program at 0x0150.
fn program_rom(program_hex: &str) -> Vec<u8> {
    assert!(
        program_hex.len() % 2 == 0,
        "program length is {}, must be a multiple of 2",
        program_hex.len()
    );
    assert!(
        program_hex.chars().all(|c| c.is_ascii_hexdigit()),
        "program contains non-hexadecimal characters: '{program_hex}'"
    );

    let mut rom = vec![0x00; 0x150];
    // JP 0x0150
    rom[0x100..0x104].copy_from_slice(&[0x00, 0xC3, 0x50, 0x01]);

    for i in (0..program_hex.len()).step_by(2) {
        let byte = u8::from_str_radix(&program_hex[i..i + 2], 16)
            .expect("program should only contain valid hexadecimal digits");
        rom.push(byte);
    }

    rom
}

fn run_test(program_hex: &str, expected_state: &ExpectedState) {
    let rom = program_rom(program_hex);
    let rom_len = rom.len() as u16;

    let mut address_space =
        AddressSpace::new(Cartridge::new(rom).expect("synthesized test ROM should be valid"));
    let mut cpu = Cpu::new();

    while cpu.registers().pc < rom_len {
        cpu.execute(&mut address_space);
    }

    expected_state.assert_matches(&cpu, &address_space);
}

macro_rules! hash_map {
    ($($key:literal: $value:expr),+$(,)?) => {
        {
            let mut map = HashMap::new();
            $(
                map.insert($key, $value);
            )*
            map
        }
    }
}

pub(crate) use hash_map;

const ALL_REGISTERS: [CpuRegister; 7] = [
    CpuRegister::A,
    CpuRegister::B,
    CpuRegister::C,
    CpuRegister::D,
    CpuRegister::E,
    CpuRegister::H,
    CpuRegister::L,
];

fn set_in_state(state: &mut ExpectedState, register: CpuRegister, value: u8) {
    let var_ref = match register {
        CpuRegister::A => &mut state.a,
        CpuRegister::B => &mut state.b,
        CpuRegister::C => &mut state.c,
        CpuRegister::D => &mut state.d,
        CpuRegister::E => &mut state.e,
        CpuRegister::H => &mut state.h,
        CpuRegister::L => &mut state.l,
    };

    *var_ref = Some(value);
}

#[test]
fn load_register_immediate() {
    for r in ALL_REGISTERS {
        let opcode = 0x06 | (r.to_opcode_bits() << 3);

        let mut expected_state = ExpectedState::empty();
        set_in_state(&mut expected_state, r, 0x7C);

        // LD <R>, 0x7C
        run_test(&format!("{opcode:02x}7C"), &expected_state);
    }
}

#[test]
fn load_register_register() {
    for r1 in ALL_REGISTERS {
        let ldri = 0x06 | (r1.to_opcode_bits() << 3);
        // LD <R1>, 0x45
        let ldri = format!("{ldri:02x}45");

        for r2 in ALL_REGISTERS {
            let opcode = 0x40 | (r2.to_opcode_bits() << 3) | r1.to_opcode_bits();

            // LD <R2>, <R1>
            let program_hex = format!("{ldri}{opcode:02x}");

            let mut expected_state = ExpectedState::empty();
            set_in_state(&mut expected_state, r2, 0x45);

            run_test(&program_hex, &expected_state);
        }
    }
}

#[test]
fn load_register_pair_immediate() {
    run_test(
        // LD BC, 0x5821
        "012158",
        &ExpectedState {
            b: Some(0x58),
            c: Some(0x21),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD DE, 0x5821
        "112158",
        &ExpectedState {
            d: Some(0x58),
            e: Some(0x21),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD HL, 0x5821
        "212158",
        &ExpectedState {
            h: Some(0x58),
            l: Some(0x21),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD SP, 0x5821
        "312158",
        &ExpectedState {
            sp: Some(0x5821),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_register_indirect_hl() {
    for r in ALL_REGISTERS {
        let opcode = 0x46 | (r.to_opcode_bits() << 3);

        // LD HL, 0xC340; LD (HL), 0x8E; LD <R>, (HL)
        let program_hex = format!("2140C3368E{opcode:02x}");
        let mut expected_state = ExpectedState::empty();
        set_in_state(&mut expected_state, r, 0x8E);
        // LD H/L, (HL) clobbers the pointer itself
        match r {
            CpuRegister::H => expected_state.l = Some(0x40),
            CpuRegister::L => expected_state.h = Some(0xC3),
            _ => {
                expected_state.h = Some(0xC3);
                expected_state.l = Some(0x40);
            }
        }

        run_test(&program_hex, &expected_state);
    }
}

#[test]
fn load_indirect_hl_register() {
    for r in ALL_REGISTERS {
        let preload_opcode = 0x06 | (r.to_opcode_bits() << 3);
        let store_opcode = 0x70 | r.to_opcode_bits();

        // LD <R>, 0x5D; LD HL, 0xD811; LD (HL), <R>
        let program_hex = format!("{preload_opcode:02x}5D2111D8{store_opcode:02x}");
        let expected_value = match r {
            CpuRegister::H => 0xD8,
            CpuRegister::L => 0x11,
            _ => 0x5D,
        };

        run_test(
            &program_hex,
            &ExpectedState {
                memory: hash_map! { 0xD811: expected_value },
                ..ExpectedState::empty()
            },
        );
    }
}

#[test]
fn load_indirect_hl_immediate() {
    run_test(
        // LD HL, 0xC611; LD (HL), 0xA9
        "2111C636A9",
        &ExpectedState {
            memory: hash_map! { 0xC611: 0xA9 },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_accumulator_indirect_bc_de() {
    run_test(
        // LD HL, 0xC77A; LD (HL), 0x3C; LD BC, 0xC77A; LD A, (BC)
        "217AC7363C017AC70A",
        &ExpectedState {
            a: Some(0x3C),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD HL, 0xC77A; LD (HL), 0x81; LD DE, 0xC77A; LD A, (DE)
        "217AC73681117AC71A",
        &ExpectedState {
            a: Some(0x81),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_indirect_bc_de_accumulator() {
    run_test(
        // LD A, 0x6E; LD BC, 0xCB02; LD (BC), A
        "3E6E0102CB02",
        &ExpectedState {
            memory: hash_map! { 0xCB02: 0x6E },
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD A, 0xD4; LD DE, 0xCB03; LD (DE), A
        "3ED41103CB12",
        &ExpectedState {
            memory: hash_map! { 0xCB03: 0xD4 },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_accumulator_direct_16() {
    run_test(
        // LD HL, 0xDA19; LD (HL), 0x6F; LD A, (0xDA19)
        "2119DA366FFA19DA",
        &ExpectedState {
            a: Some(0x6F),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD A, 0xB3; LD (0xD21C), A
        "3EB3EA1CD2",
        &ExpectedState {
            memory: hash_map! { 0xD21C: 0xB3 },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn ldh_variants() {
    run_test(
        // LD A, 0x4F; LDH (0x85), A
        "3E4FE085",
        &ExpectedState {
            memory: hash_map! { 0xFF85: 0x4F },
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD A, 0x23; LDH (0x85), A; LD A, 0x00; LDH A, (0x85)
        "3E23E0853E00F085",
        &ExpectedState {
            a: Some(0x23),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD A, 0x77; LD C, 0x86; LDH (C), A
        "3E770E86E2",
        &ExpectedState {
            memory: hash_map! { 0xFF86: 0x77 },
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD A, 0x19; LDH (0x87), A; LD C, 0x87; LDH A, (C)
        "3E19E0870E87F2",
        &ExpectedState {
            a: Some(0x19),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_accumulator_indirect_hl_inc_dec() {
    run_test(
        // LD HL, 0xCE24; LD (HL), 0x95; LD A, (HL+)
        "2124CE36952A",
        &ExpectedState {
            a: Some(0x95),
            h: Some(0xCE),
            l: Some(0x25),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD HL, 0xCFFF; LD (HL), 0x31; LD A, (HL+)
        "21FFCF36312A",
        &ExpectedState {
            a: Some(0x31),
            h: Some(0xD0),
            l: Some(0x00),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD HL, 0xD000; LD (HL), 0x42; LD A, (HL-)
        "2100D036423A",
        &ExpectedState {
            a: Some(0x42),
            h: Some(0xCF),
            l: Some(0xFF),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_indirect_hl_inc_dec_accumulator() {
    run_test(
        // LD A, 0x58; LD HL, 0xC9B0; LD (HL+), A
        "3E5821B0C922",
        &ExpectedState {
            h: Some(0xC9),
            l: Some(0xB1),
            memory: hash_map! { 0xC9B0: 0x58 },
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD A, 0x2D; LD HL, 0xC9B0; LD (HL-), A
        "3E2D21B0C932",
        &ExpectedState {
            h: Some(0xC9),
            l: Some(0xAF),
            memory: hash_map! { 0xC9B0: 0x2D },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_stack_pointer() {
    run_test(
        // LD HL, 0xCFD2; LD SP, HL
        "21D2CFF9",
        &ExpectedState {
            sp: Some(0xCFD2),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD SP, 0xD1FE; LD (0xC802), SP
        "31FED10802C8",
        &ExpectedState {
            memory: hash_map! {
                0xC802: 0xFE,
                0xC803: 0xD1,
            },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_hl_stack_pointer_offset() {
    run_test(
        // LD SP, 0xD002; LDHL SP, -0x04
        "3102D0F8FC",
        &ExpectedState {
            h: Some(0xCF),
            l: Some(0xFE),
            sp: Some(0xD002),
            f: Some(0x00),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD SP, 0xD0FF; LDHL SP, +0x01
        "31FFD0F801",
        &ExpectedState {
            h: Some(0xD1),
            l: Some(0x00),
            f: Some(0x30),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn push_pop_round_trip() {
    // BC, DE, HL
    for rr_bits in [0x00_u8, 0x10, 0x20] {
        let preload_opcode = 0x01 | rr_bits;
        let push_opcode = 0xC5 | rr_bits;

        run_test(
            // LD <rr>, 0x3A7F; PUSH <rr>; PUSH <rr>
            &format!("{preload_opcode:02x}7F3A{push_opcode:02x}{push_opcode:02x}"),
            &ExpectedState {
                sp: Some(0xFFFA),
                memory: hash_map! {
                    0xFFFA: 0x7F,
                    0xFFFB: 0x3A,
                    0xFFFC: 0x7F,
                    0xFFFD: 0x3A,
                },
                ..ExpectedState::empty()
            },
        );
    }

    run_test(
        // LD BC, 0x3A7F; PUSH BC; POP DE
        "017F3AC5D1",
        &ExpectedState {
            d: Some(0x3A),
            e: Some(0x7F),
            sp: Some(0xFFFE),
            ..ExpectedState::empty()
        },
    );

    // The low nibble of F does not exist; popping AF masks it off
    run_test(
        // LD BC, 0x12FF; PUSH BC; POP AF
        "01FF12C5F1",
        &ExpectedState {
            a: Some(0x12),
            f: Some(0xF0),
            sp: Some(0xFFFE),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn pop_stack_from_memory() {
    for (rr, rr_bits) in [
        (CpuRegisterPair::BC, 0x00_u8),
        (CpuRegisterPair::DE, 0x10),
        (CpuRegisterPair::HL, 0x20),
    ] {
        let opcode = 0xC1 | rr_bits;

        let mut expected_state = ExpectedState::empty();
        let (high_ref, low_ref) = match rr {
            CpuRegisterPair::BC => (&mut expected_state.b, &mut expected_state.c),
            CpuRegisterPair::DE => (&mut expected_state.d, &mut expected_state.e),
            CpuRegisterPair::HL => (&mut expected_state.h, &mut expected_state.l),
            _ => unreachable!("only BC/DE/HL are tested here"),
        };
        *high_ref = Some(0x6B);
        *low_ref = Some(0x57);
        expected_state.sp = Some(0xFFFC);

        run_test(
            // LD A, 0x57
            // LDH (0xFA), A
            // LD A, 0x6B
            // LDH (0xFB), A
            // LD SP, 0xFFFA
            // POP <rr>
            &format!("3E57E0FA3E6BE0FB31FAFF{opcode:02x}"),
            &expected_state,
        );
    }
}
