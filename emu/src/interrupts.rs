//! Interrupt controller for the five DMG interrupt sources.
//!
//! Requests latch into IF (0xFF0F) and are masked by IE (0xFFFF). Priority
//! order (highest first): VBlank, LCD STAT, Timer, Serial, Joypad.

/// Interrupt sources, ordered by hardware priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Interrupt {
    VBlank = 0,
    LcdStat = 1,
    Timer = 2,
    Serial = 3,
    Joypad = 4,
}

impl Interrupt {
    const PRIORITY: [Interrupt; 5] = [
        Interrupt::VBlank,
        Interrupt::LcdStat,
        Interrupt::Timer,
        Interrupt::Serial,
        Interrupt::Joypad,
    ];

    #[inline]
    pub fn mask(self) -> u8 {
        1 << self as u8
    }

    /// Address the CPU jumps to when servicing this interrupt.
    #[inline]
    pub fn vector(self) -> u16 {
        0x0040 + 8 * self as u16
    }
}

/// Owns the IF and IE registers.
pub struct InterruptController {
    flags: u8,
    enable: u8,
}

impl InterruptController {
    pub fn new() -> Self {
        InterruptController {
            flags: 0x01,
            enable: 0x00,
        }
    }

    #[inline]
    pub fn request(&mut self, interrupt: Interrupt) {
        self.flags |= interrupt.mask();
    }

    /// Latch every source present in a raw request mask.
    #[inline]
    pub fn request_mask(&mut self, mask: u8) {
        self.flags |= mask & 0x1F;
    }

    #[inline]
    pub fn clear(&mut self, interrupt: Interrupt) {
        self.flags &= !interrupt.mask();
    }

    /// Whether any enabled interrupt is requested, regardless of IME.
    #[inline]
    pub fn any_pending(&self) -> bool {
        self.flags & self.enable & 0x1F != 0
    }

    /// Highest-priority enabled and requested interrupt.
    pub fn highest_pending(&self) -> Option<Interrupt> {
        let pending = self.flags & self.enable & 0x1F;
        Interrupt::PRIORITY
            .into_iter()
            .find(|i| pending & i.mask() != 0)
    }

    #[inline]
    pub fn read_flags(&self) -> u8 {
        self.flags | 0xE0
    }

    #[inline]
    pub fn write_flags(&mut self, value: u8) {
        self.flags = value & 0x1F;
    }

    #[inline]
    pub fn read_enable(&self) -> u8 {
        self.enable
    }

    #[inline]
    pub fn write_enable(&mut self, value: u8) {
        self.enable = value;
    }
}

impl Default for InterruptController {
    fn default() -> Self {
        Self::new()
    }
}
