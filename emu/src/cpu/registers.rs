//! Register file, operand fetch and stack primitives.

use crate::bus::MemoryBus;

// Flag bit positions in F
pub const FLAG_Z: u8 = 7;
pub const FLAG_N: u8 = 6;
pub const FLAG_H: u8 = 5;
pub const FLAG_C: u8 = 4;

/// 8-bit operand index as encoded in opcodes: B C D E H L (HL) A.
pub(crate) const REG_HL_INDIRECT: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    pub f: u8, // Z N H C 0 0 0 0
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,

    pub ime: bool,
    /// Set by EI; IME turns on after the following instruction.
    pub ime_pending: bool,
    pub halted: bool,
}

impl Registers {
    /// State left behind by the DMG boot ROM.
    pub fn new() -> Self {
        Registers {
            a: 0x01,
            f: 0xB0,
            b: 0x00,
            c: 0x13,
            d: 0x00,
            e: 0xD8,
            h: 0x01,
            l: 0x4D,
            sp: 0xFFFE,
            pc: 0x0100,
            ime: false,
            ime_pending: false,
            halted: false,
        }
    }

    #[inline]
    pub fn af(&self) -> u16 {
        u16::from_be_bytes([self.a, self.f])
    }

    #[inline]
    pub fn bc(&self) -> u16 {
        u16::from_be_bytes([self.b, self.c])
    }

    #[inline]
    pub fn de(&self) -> u16 {
        u16::from_be_bytes([self.d, self.e])
    }

    #[inline]
    pub fn hl(&self) -> u16 {
        u16::from_be_bytes([self.h, self.l])
    }

    /// The low nibble of F does not exist and always reads zero.
    #[inline]
    pub fn set_af(&mut self, value: u16) {
        let [a, f] = value.to_be_bytes();
        self.a = a;
        self.f = f & 0xF0;
    }

    #[inline]
    pub fn set_bc(&mut self, value: u16) {
        [self.b, self.c] = value.to_be_bytes();
    }

    #[inline]
    pub fn set_de(&mut self, value: u16) {
        [self.d, self.e] = value.to_be_bytes();
    }

    #[inline]
    pub fn set_hl(&mut self, value: u16) {
        [self.h, self.l] = value.to_be_bytes();
    }

    #[inline]
    pub fn flag(&self, bit: u8) -> bool {
        (self.f >> bit) & 1 == 1
    }

    #[inline]
    pub fn set_flag(&mut self, bit: u8, value: bool) {
        if value {
            self.f |= 1 << bit;
        } else {
            self.f &= !(1 << bit);
        }
    }

    /// Overwrite all four flags at once.
    #[inline]
    pub(crate) fn set_flags(&mut self, z: bool, n: bool, h: bool, c: bool) {
        self.f = (z as u8) << FLAG_Z | (n as u8) << FLAG_N | (h as u8) << FLAG_H | (c as u8) << FLAG_C;
    }

    /// Read the byte at PC and advance PC.
    #[inline]
    pub fn fetch(&mut self, bus: &MemoryBus) -> u8 {
        let byte = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        byte
    }

    /// Two fetches, first byte low.
    #[inline]
    pub fn fetch_word(&mut self, bus: &MemoryBus) -> u16 {
        let low = self.fetch(bus);
        let high = self.fetch(bus);
        u16::from_le_bytes([low, high])
    }

    #[inline]
    pub(crate) fn push_word(&mut self, bus: &mut MemoryBus, value: u16) {
        let [high, low] = value.to_be_bytes();
        self.sp = self.sp.wrapping_sub(1);
        bus.write(self.sp, high);
        self.sp = self.sp.wrapping_sub(1);
        bus.write(self.sp, low);
    }

    #[inline]
    pub(crate) fn pop_word(&mut self, bus: &MemoryBus) -> u16 {
        let low = bus.read(self.sp);
        self.sp = self.sp.wrapping_add(1);
        let high = bus.read(self.sp);
        self.sp = self.sp.wrapping_add(1);
        u16::from_le_bytes([low, high])
    }

    /// 8-bit operand by opcode index; 6 reads memory at HL.
    #[inline]
    pub(crate) fn reg(&self, index: u8, bus: &MemoryBus) -> u8 {
        match index {
            0 => self.b,
            1 => self.c,
            2 => self.d,
            3 => self.e,
            4 => self.h,
            5 => self.l,
            REG_HL_INDIRECT => bus.read(self.hl()),
            _ => self.a,
        }
    }

    #[inline]
    pub(crate) fn set_reg(&mut self, index: u8, value: u8, bus: &mut MemoryBus) {
        match index {
            0 => self.b = value,
            1 => self.c = value,
            2 => self.d = value,
            3 => self.e = value,
            4 => self.h = value,
            5 => self.l = value,
            REG_HL_INDIRECT => bus.write(self.hl(), value),
            _ => self.a = value,
        }
    }

    /// 16-bit operand by opcode index: BC DE HL SP.
    #[inline]
    pub(crate) fn pair(&self, index: u8) -> u16 {
        match index {
            0 => self.bc(),
            1 => self.de(),
            2 => self.hl(),
            _ => self.sp,
        }
    }

    #[inline]
    pub(crate) fn set_pair(&mut self, index: u8, value: u16) {
        match index {
            0 => self.set_bc(value),
            1 => self.set_de(value),
            2 => self.set_hl(value),
            _ => self.sp = value,
        }
    }

    /// PUSH/POP operand by opcode index: BC DE HL AF.
    #[inline]
    pub(crate) fn stack_pair(&self, index: u8) -> u16 {
        match index {
            3 => self.af(),
            _ => self.pair(index),
        }
    }

    #[inline]
    pub(crate) fn set_stack_pair(&mut self, index: u8, value: u16) {
        match index {
            3 => self.set_af(value),
            _ => self.set_pair(index, value),
        }
    }

    /// Branch condition by opcode index: NZ Z NC C.
    #[inline]
    pub(crate) fn condition(&self, index: u8) -> bool {
        match index {
            0 => !self.flag(FLAG_Z),
            1 => self.flag(FLAG_Z),
            2 => !self.flag(FLAG_C),
            _ => self.flag(FLAG_C),
        }
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
