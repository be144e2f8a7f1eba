//! DMG timer (DIV, TIMA, TMA, TAC registers).
//!
//! TIMA increments at a frequency selected by TAC. On overflow it reloads
//! from TMA and a Timer interrupt is reported to the caller. DIV is the upper
//! byte of a free-running 16-bit counter advanced once per dot.

pub struct Timer {
    div_counter: u16,    // DIV is the upper 8 bits
    tima: u8,            // 0xFF05
    tma: u8,             // 0xFF06
    tac: u8,             // 0xFF07
    overflow_cycles: u8, // Dots until TIMA reload after overflow
}

impl Timer {
    pub fn new() -> Self {
        Timer {
            div_counter: 0xABCC,
            tima: 0,
            tma: 0,
            tac: 0xF8,
            overflow_cycles: 0,
        }
    }

    /// Advance by `dots` clock ticks. Returns true if a Timer interrupt fired.
    pub fn tick(&mut self, dots: u32) -> bool {
        let mut fired = false;
        for _ in 0..dots {
            fired |= self.tick_once();
        }
        fired
    }

    #[inline]
    fn tick_once(&mut self) -> bool {
        let mut fired = false;
        if self.overflow_cycles > 0 {
            self.overflow_cycles -= 1;
            if self.overflow_cycles == 0 {
                self.tima = self.tma;
                fired = true;
            }
        }

        let old_div = self.div_counter;
        self.div_counter = self.div_counter.wrapping_add(1);

        if self.tac & 0x04 == 0 {
            return fired;
        }

        let bit = match self.tac & 0x03 {
            0 => 9, // 4096 Hz
            1 => 3, // 262144 Hz
            2 => 5, // 65536 Hz
            _ => 7, // 16384 Hz
        };

        // Falling edge of the selected divider bit
        let old_bit = (old_div >> bit) & 1;
        let new_bit = (self.div_counter >> bit) & 1;

        if old_bit == 1 && new_bit == 0 {
            self.tima = self.tima.wrapping_add(1);
            if self.tima == 0 {
                self.overflow_cycles = 4;
            }
        }
        fired
    }

    /// Read timer registers (0xFF04-0xFF07).
    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            0xFF04 => (self.div_counter >> 8) as u8,
            0xFF05 => self.tima,
            0xFF06 => self.tma,
            0xFF07 => self.tac | 0xF8,
            _ => 0xFF,
        }
    }

    /// Write timer registers (0xFF04-0xFF07).
    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0xFF04 => self.div_counter = 0,
            0xFF05 => {
                // A write during the reload delay cancels the pending reload
                self.overflow_cycles = 0;
                self.tima = value;
            }
            0xFF06 => self.tma = value,
            0xFF07 => self.tac = value,
            _ => {}
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
