//! 8-bit arithmetic, 16-bit adds, and the rotate/shift group.

use super::registers::{FLAG_C, FLAG_H, FLAG_N, FLAG_Z, Registers};

/// ALU operation index as encoded in bits 3-5 of 0x80-0xBF and 0xC6-0xFE.
pub(crate) mod op {
    pub const ADD: u8 = 0;
    pub const ADC: u8 = 1;
    pub const SUB: u8 = 2;
    pub const SBC: u8 = 3;
    pub const AND: u8 = 4;
    pub const XOR: u8 = 5;
    pub const OR: u8 = 6;
    pub const CP: u8 = 7;
}

/// Rotate/shift index as encoded in bits 3-5 of CB 0x00-0x3F.
pub(crate) mod shift {
    pub const RLC: u8 = 0;
    pub const RRC: u8 = 1;
    pub const RL: u8 = 2;
    pub const RR: u8 = 3;
    pub const SLA: u8 = 4;
    pub const SRA: u8 = 5;
    pub const SWAP: u8 = 6;
    pub const SRL: u8 = 7;
}

impl Registers {
    /// Apply ALU operation `operation` to A and `value`.
    pub(crate) fn alu(&mut self, operation: u8, value: u8) {
        let a = self.a;
        let carry_in = self.flag(FLAG_C) as u8;
        match operation {
            op::ADD | op::ADC => {
                let c = if operation == op::ADC { carry_in } else { 0 };
                let wide = a as u16 + value as u16 + c as u16;
                let result = wide as u8;
                let half = (a & 0x0F) + (value & 0x0F) + c > 0x0F;
                self.set_flags(result == 0, false, half, wide > 0xFF);
                self.a = result;
            }
            op::SUB | op::SBC | op::CP => {
                let c = if operation == op::SBC { carry_in } else { 0 };
                let result = a.wrapping_sub(value).wrapping_sub(c);
                let half = (a & 0x0F) < (value & 0x0F) + c;
                let borrow = (a as u16) < value as u16 + c as u16;
                self.set_flags(result == 0, true, half, borrow);
                if operation != op::CP {
                    self.a = result;
                }
            }
            op::AND => {
                self.a &= value;
                self.set_flags(self.a == 0, false, true, false);
            }
            op::XOR => {
                self.a ^= value;
                self.set_flags(self.a == 0, false, false, false);
            }
            _ => {
                self.a |= value;
                self.set_flags(self.a == 0, false, false, false);
            }
        }
    }

    /// INC r: carry untouched.
    #[inline]
    pub(crate) fn inc(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.set_flag(FLAG_Z, result == 0);
        self.set_flag(FLAG_N, false);
        self.set_flag(FLAG_H, value & 0x0F == 0x0F);
        result
    }

    /// DEC r: carry untouched.
    #[inline]
    pub(crate) fn dec(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.set_flag(FLAG_Z, result == 0);
        self.set_flag(FLAG_N, true);
        self.set_flag(FLAG_H, value & 0x0F == 0);
        result
    }

    /// ADD HL, rr: zero untouched, half-carry out of bit 11.
    #[inline]
    pub(crate) fn add_hl(&mut self, value: u16) {
        let hl = self.hl();
        let (result, carry) = hl.overflowing_add(value);
        self.set_flag(FLAG_N, false);
        self.set_flag(FLAG_H, (hl & 0x0FFF) + (value & 0x0FFF) > 0x0FFF);
        self.set_flag(FLAG_C, carry);
        self.set_hl(result);
    }

    /// SP plus a signed byte, as used by ADD SP,e and LD HL,SP+e. Flags
    /// come from the unsigned low-byte addition.
    #[inline]
    pub(crate) fn sp_offset(&mut self, offset: u8) -> u16 {
        let sp = self.sp;
        let e = offset as i8 as i16 as u16;
        let half = (sp & 0x000F) + (e & 0x000F) > 0x000F;
        let carry = (sp & 0x00FF) + (e & 0x00FF) > 0x00FF;
        self.set_flags(false, false, half, carry);
        sp.wrapping_add(e)
    }

    pub(crate) fn daa(&mut self) {
        let mut adjust = 0u8;
        let mut carry = self.flag(FLAG_C);
        if self.flag(FLAG_N) {
            if carry {
                adjust |= 0x60;
            }
            if self.flag(FLAG_H) {
                adjust |= 0x06;
            }
            self.a = self.a.wrapping_sub(adjust);
        } else {
            if carry || self.a > 0x99 {
                adjust |= 0x60;
                carry = true;
            }
            if self.flag(FLAG_H) || self.a & 0x0F > 0x09 {
                adjust |= 0x06;
            }
            self.a = self.a.wrapping_add(adjust);
        }
        let n = self.flag(FLAG_N);
        self.set_flags(self.a == 0, n, false, carry);
    }

    /// Rotate/shift `value` by CB operation `operation`, setting all four flags.
    pub(crate) fn shift(&mut self, operation: u8, value: u8) -> u8 {
        let carry_in = self.flag(FLAG_C) as u8;
        let (result, carry_out) = match operation {
            shift::RLC => (value.rotate_left(1), value & 0x80 != 0),
            shift::RRC => (value.rotate_right(1), value & 0x01 != 0),
            shift::RL => (value << 1 | carry_in, value & 0x80 != 0),
            shift::RR => (value >> 1 | carry_in << 7, value & 0x01 != 0),
            shift::SLA => (value << 1, value & 0x80 != 0),
            shift::SRA => (value >> 1 | value & 0x80, value & 0x01 != 0),
            shift::SWAP => (value.rotate_left(4), false),
            _ => (value >> 1, value & 0x01 != 0),
        };
        self.set_flags(result == 0, false, false, carry_out);
        result
    }

    /// RLCA/RRCA/RLA/RRA: the accumulator forms always clear Z.
    #[inline]
    pub(crate) fn rotate_a(&mut self, operation: u8) {
        self.a = self.shift(operation, self.a);
        self.set_flag(FLAG_Z, false);
    }
}
