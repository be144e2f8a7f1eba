//! Construction-time options for the core.

/// RGBA colours for the four DMG shades, lightest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shades(pub [[u8; 4]; 4]);

impl Shades {
    pub const GRAYSCALE: Shades = Shades([
        [0xFF, 0xFF, 0xFF, 0xFF],
        [0xAA, 0xAA, 0xAA, 0xFF],
        [0x55, 0x55, 0x55, 0xFF],
        [0x00, 0x00, 0x00, 0xFF],
    ]);

    #[inline]
    pub fn color(&self, shade: u8) -> [u8; 4] {
        self.0[(shade & 0x03) as usize]
    }
}

impl Default for Shades {
    fn default() -> Self {
        Shades::GRAYSCALE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreConfig {
    pub shades: Shades,
    /// How many leading instructions are traced through the logger.
    pub trace_instructions: u64,
}

impl CoreConfig {
    pub fn with_shades(mut self, shades: Shades) -> Self {
        self.shades = shades;
        self
    }

    pub fn with_trace_instructions(mut self, count: u64) -> Self {
        self.trace_instructions = count;
        self
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        CoreConfig {
            shades: Shades::default(),
            trace_instructions: 20,
        }
    }
}
