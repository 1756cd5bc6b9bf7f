#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuRegister {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
}

impl CpuRegister {
    /// Map the low 3 bits of an opcode to a register, as used by the LD r,r'
    /// block and the ALU blocks. 0b110 is the (HL) slot and has no register.
    pub(crate) fn from_low_opcode_bits(bits: u8) -> Option<Self> {
        match bits & 0x07 {
            0x00 => Some(Self::B),
            0x01 => Some(Self::C),
            0x02 => Some(Self::D),
            0x03 => Some(Self::E),
            0x04 => Some(Self::H),
            0x05 => Some(Self::L),
            0x07 => Some(Self::A),
            _ => None,
        }
    }

    /// Map bits 3-5 of an opcode to a register.
    pub(crate) fn from_mid_opcode_bits(bits: u8) -> Option<Self> {
        Self::from_low_opcode_bits(bits >> 3)
    }

    #[cfg(test)]
    pub(crate) fn to_opcode_bits(self) -> u8 {
        match self {
            Self::B => 0x00,
            Self::C => 0x01,
            Self::D => 0x02,
            Self::E => 0x03,
            Self::H => 0x04,
            Self::L => 0x05,
            Self::A => 0x07,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuRegisterPair {
    BC,
    DE,
    HL,
    SP,
    AF,
}

#[derive(Debug, Clone)]
pub struct CpuRegisters {
    pub accumulator: u8,
    pub flags: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,
    pub ime: bool,
}

impl CpuRegisters {
    /// Post-boot register values for the original DMG model.
    pub fn new() -> Self {
        Self {
            accumulator: 0x01,
            flags: 0xB0,
            b: 0x00,
            c: 0x13,
            d: 0x00,
            e: 0xD8,
            h: 0x01,
            l: 0x4D,
            sp: 0xFFFE,
            pc: 0x0000,
            ime: false,
        }
    }

    pub fn af(&self) -> u16 {
        u16::from_be_bytes([self.accumulator, self.flags])
    }

    pub fn bc(&self) -> u16 {
        u16::from_be_bytes([self.b, self.c])
    }

    pub fn de(&self) -> u16 {
        u16::from_be_bytes([self.d, self.e])
    }

    pub fn hl(&self) -> u16 {
        u16::from_be_bytes([self.h, self.l])
    }

    pub fn read_register(&self, register: CpuRegister) -> u8 {
        match register {
            CpuRegister::A => self.accumulator,
            CpuRegister::B => self.b,
            CpuRegister::C => self.c,
            CpuRegister::D => self.d,
            CpuRegister::E => self.e,
            CpuRegister::H => self.h,
            CpuRegister::L => self.l,
        }
    }

    pub fn set_register(&mut self, register: CpuRegister, value: u8) {
        match register {
            CpuRegister::A => {
                self.accumulator = value;
            }
            CpuRegister::B => {
                self.b = value;
            }
            CpuRegister::C => {
                self.c = value;
            }
            CpuRegister::D => {
                self.d = value;
            }
            CpuRegister::E => {
                self.e = value;
            }
            CpuRegister::H => {
                self.h = value;
            }
            CpuRegister::L => {
                self.l = value;
            }
        }
    }

    pub fn read_register_pair(&self, register_pair: CpuRegisterPair) -> u16 {
        match register_pair {
            CpuRegisterPair::BC => self.bc(),
            CpuRegisterPair::DE => self.de(),
            CpuRegisterPair::HL => self.hl(),
            CpuRegisterPair::SP => self.sp,
            CpuRegisterPair::AF => self.af(),
        }
    }

    pub fn set_register_pair(&mut self, register_pair: CpuRegisterPair, value: u16) {
        let [msb, lsb] = value.to_be_bytes();
        match register_pair {
            CpuRegisterPair::BC => {
                self.b = msb;
                self.c = lsb;
            }
            CpuRegisterPair::DE => {
                self.d = msb;
                self.e = lsb;
            }
            CpuRegisterPair::HL => {
                self.h = msb;
                self.l = lsb;
            }
            CpuRegisterPair::SP => {
                self.sp = value;
            }
            CpuRegisterPair::AF => {
                self.accumulator = msb;
                // The low nibble of F does not physically exist
                self.flags = lsb & 0xF0;
            }
        }
    }

    pub fn set_flags(&mut self, zero: bool, subtract: bool, half_carry: bool, carry: bool) {
        self.flags = (u8::from(zero) << 7)
            | (u8::from(subtract) << 6)
            | (u8::from(half_carry) << 5)
            | (u8::from(carry) << 4);
    }

    /// Update only the flags for which a value is given; `None` leaves the
    /// existing flag bit untouched.
    pub fn set_some_flags(
        &mut self,
        zero: Option<bool>,
        subtract: Option<bool>,
        half_carry: Option<bool>,
        carry: Option<bool>,
    ) {
        self.set_flags(
            zero.unwrap_or_else(|| self.zero_flag()),
            subtract.unwrap_or_else(|| self.subtract_flag()),
            half_carry.unwrap_or_else(|| self.half_carry_flag()),
            carry.unwrap_or_else(|| self.carry_flag()),
        );
    }

    pub fn zero_flag(&self) -> bool {
        self.flags & 0x80 != 0
    }

    pub fn subtract_flag(&self) -> bool {
        self.flags & 0x40 != 0
    }

    pub fn half_carry_flag(&self) -> bool {
        self.flags & 0x20 != 0
    }

    pub fn carry_flag(&self) -> bool {
        self.flags & 0x10 != 0
    }
}

impl Default for CpuRegisters {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn register_pair_round_trips() {
        let mut rng = rand::thread_rng();
        let mut registers = CpuRegisters::new();

        for _ in 0..100 {
            let value: u16 = rng.gen();

            for register_pair in
                [CpuRegisterPair::BC, CpuRegisterPair::DE, CpuRegisterPair::HL, CpuRegisterPair::SP]
            {
                registers.set_register_pair(register_pair, value);
                assert_eq!(value, registers.read_register_pair(register_pair));
            }

            // AF masks the low nibble
            registers.set_register_pair(CpuRegisterPair::AF, value);
            assert_eq!(value & 0xFFF0, registers.read_register_pair(CpuRegisterPair::AF));
        }
    }

    #[test]
    fn pair_accessors_are_big_endian() {
        let mut registers = CpuRegisters::new();
        registers.set_register_pair(CpuRegisterPair::HL, 0x8123);

        assert_eq!(0x81, registers.h);
        assert_eq!(0x23, registers.l);
    }

    #[test]
    fn power_up_state() {
        let registers = CpuRegisters::new();

        assert_eq!(0x01B0, registers.af());
        assert_eq!(0x0013, registers.bc());
        assert_eq!(0x00D8, registers.de());
        assert_eq!(0x014D, registers.hl());
        assert_eq!(0xFFFE, registers.sp);
        assert_eq!(0x0000, registers.pc);
        assert!(!registers.ime);
    }

    #[test]
    fn flag_setters() {
        let mut registers = CpuRegisters::new();

        registers.set_flags(true, false, true, false);
        assert_eq!(0xA0, registers.flags);
        assert!(registers.zero_flag());
        assert!(!registers.subtract_flag());
        assert!(registers.half_carry_flag());
        assert!(!registers.carry_flag());

        registers.set_some_flags(None, Some(true), None, Some(true));
        assert_eq!(0xF0, registers.flags);
    }
}
