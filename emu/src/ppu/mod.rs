//! Picture unit (PPU).
//!
//! Owns VRAM (tile data and both tile maps), object attribute memory and the
//! LCD register block (0xFF40-0xFF4B, except the DMA trigger at 0xFF46).
//!
//! Two independent duties:
//! - [`Ppu::tick`] advances the per-scanline mode sequence (OAM search,
//!   pixel transfer, H-blank, V-blank) by a number of dots and reports the
//!   interrupts it raises as a bit mask.
//! - [`Ppu::render`] produces a full 160x144 frame from the current register
//!   and VRAM state (see [`render`]).

mod render;
mod tiles;

use std::fmt;

pub use render::{FRAME_BYTES, Frame, SCREEN_HEIGHT, SCREEN_WIDTH};
pub use tiles::{Tile, TileMapArea, TileSet, Vram};

use crate::config::Shades;
use crate::interrupts::Interrupt;
use crate::log::LogCategory;
use crate::log_info;

/// LCD register addresses.
pub(crate) mod reg {
    pub const LCDC: u16 = 0xFF40;
    pub const STAT: u16 = 0xFF41;
    pub const SCY: u16 = 0xFF42;
    pub const SCX: u16 = 0xFF43;
    pub const LY: u16 = 0xFF44;
    pub const LYC: u16 = 0xFF45;
    pub const BGP: u16 = 0xFF47;
    pub const OBP0: u16 = 0xFF48;
    pub const OBP1: u16 = 0xFF49;
    pub const WY: u16 = 0xFF4A;
    pub const WX: u16 = 0xFF4B;
}

pub const OAM_SIZE: usize = 0xA0;
const VBLANK_START: u8 = 144;
const LAST_LINE: u8 = 153;

// Mode durations in dots
const OAM_SCAN_DOTS: u32 = 80;
const DRAWING_DOTS: u32 = 172;
const HBLANK_DOTS: u32 = 204;
const SCANLINE_DOTS: u32 = 456;

// STAT interrupt select bits
const STAT_HBLANK: u8 = 0x08;
const STAT_VBLANK: u8 = 0x10;
const STAT_OAM: u8 = 0x20;
const STAT_LYC: u8 = 0x40;

/// PPU operating modes, numbered as reported in STAT bits 0-1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PpuMode {
    HBlank = 0,
    VBlank = 1,
    OamScan = 2,
    Drawing = 3,
}

impl PpuMode {
    fn name(self) -> &'static str {
        match self {
            PpuMode::HBlank => "HBLANK",
            PpuMode::VBlank => "VBLANK",
            PpuMode::OamScan => "OAM",
            PpuMode::Drawing => "DRAW",
        }
    }

    fn duration(self) -> u32 {
        match self {
            PpuMode::OamScan => OAM_SCAN_DOTS,
            PpuMode::Drawing => DRAWING_DOTS,
            PpuMode::HBlank => HBLANK_DOTS,
            PpuMode::VBlank => SCANLINE_DOTS,
        }
    }
}

/// Debug state for PPU inspection.
pub struct PpuDebugState {
    pub mode: u8,
    pub mode_name: &'static str,
    pub line: u8,
    pub dots: u32,
    pub lcdc: u8,
    pub scroll: (u8, u8),
    pub window: (u8, u8),
}

impl fmt::Display for PpuDebugState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mode={}({}) line={} dots={} LCDC={:02X} SCX={} SCY={} WX={} WY={}",
            self.mode,
            self.mode_name,
            self.line,
            self.dots,
            self.lcdc,
            self.scroll.0,
            self.scroll.1,
            self.window.0,
            self.window.1
        )
    }
}

pub struct Ppu {
    vram: Vram,
    oam: [u8; OAM_SIZE],

    lcdc: u8,
    stat_select: u8, // STAT bits 3-6
    scy: u8,
    scx: u8,
    ly: u8,
    lyc: u8,
    bgp: u8,
    obp0: u8,
    obp1: u8,
    wy: u8,
    wx: u8,

    mode: PpuMode,
    dots: u32,
    /// Requests raised by register writes, reported on the next tick.
    pending: u8,
    frame_ready: bool,
    shades: Shades,
}

impl Ppu {
    /// Power-on state as left by the boot ROM: LCD on, background on,
    /// unsigned tile set, low tile map.
    pub fn new(shades: Shades) -> Self {
        Ppu {
            vram: Vram::new(),
            oam: [0; OAM_SIZE],
            lcdc: 0x91,
            stat_select: 0x00,
            scy: 0,
            scx: 0,
            ly: 0,
            lyc: 0,
            bgp: 0xFC,
            obp0: 0xFF,
            obp1: 0xFF,
            wy: 0,
            wx: 0,
            mode: PpuMode::OamScan,
            dots: 0,
            pending: 0,
            frame_ready: false,
            shades,
        }
    }

    #[inline]
    pub fn read_vram(&self, addr: u16) -> u8 {
        self.vram.read(addr - 0x8000)
    }

    #[inline]
    pub fn write_vram(&mut self, addr: u16, value: u8) {
        self.vram.write(addr - 0x8000, value);
    }

    #[inline]
    pub fn read_oam(&self, addr: u16) -> u8 {
        self.oam[(addr - 0xFE00) as usize % OAM_SIZE]
    }

    #[inline]
    pub fn write_oam(&mut self, addr: u16, value: u8) {
        self.oam[(addr - 0xFE00) as usize % OAM_SIZE] = value;
    }

    pub fn read_register(&self, addr: u16) -> u8 {
        match addr {
            reg::LCDC => self.lcdc,
            reg::STAT => {
                let coincidence = if self.ly == self.lyc { 0x04 } else { 0 };
                0x80 | self.stat_select | coincidence | self.mode as u8
            }
            reg::SCY => self.scy,
            reg::SCX => self.scx,
            reg::LY => self.ly,
            reg::LYC => self.lyc,
            reg::BGP => self.bgp,
            reg::OBP0 => self.obp0,
            reg::OBP1 => self.obp1,
            reg::WY => self.wy,
            reg::WX => self.wx,
            _ => 0xFF,
        }
    }

    pub fn write_register(&mut self, addr: u16, value: u8) {
        match addr {
            reg::LCDC => self.write_lcdc(value),
            reg::STAT => self.stat_select = value & 0x78,
            reg::SCY => self.scy = value,
            reg::SCX => self.scx = value,
            reg::LY => {} // read-only
            reg::LYC => {
                self.lyc = value;
                if self.lcd_enabled() {
                    self.pending |= self.compare_line();
                }
            }
            reg::BGP => self.bgp = value,
            reg::OBP0 => self.obp0 = value,
            reg::OBP1 => self.obp1 = value,
            reg::WY => self.wy = value,
            reg::WX => self.wx = value,
            _ => {}
        }
    }

    fn write_lcdc(&mut self, value: u8) {
        let was_on = self.lcd_enabled();
        self.lcdc = value;
        match (was_on, self.lcd_enabled()) {
            (true, false) => {
                log_info!(LogCategory::Ppu, "LCD off at LY={}", self.ly);
                self.mode = PpuMode::HBlank;
                self.ly = 0;
                self.dots = 0;
                self.pending = 0;
            }
            (false, true) => {
                log_info!(LogCategory::Ppu, "LCD on");
                self.mode = PpuMode::OamScan;
                self.ly = 0;
                self.dots = 0;
            }
            _ => {}
        }
    }

    #[inline]
    pub fn lcd_enabled(&self) -> bool {
        self.lcdc & 0x80 != 0
    }

    #[inline]
    fn background_enabled(&self) -> bool {
        self.lcdc & 0x01 != 0
    }

    #[inline]
    fn objects_enabled(&self) -> bool {
        self.lcdc & 0x02 != 0
    }

    #[inline]
    fn tall_objects(&self) -> bool {
        self.lcdc & 0x04 != 0
    }

    #[inline]
    fn window_enabled(&self) -> bool {
        self.lcdc & 0x20 != 0
    }

    /// Tile set shared by background and window (LCDC bit 4).
    #[inline]
    pub fn tile_set(&self) -> TileSet {
        if self.lcdc & 0x10 != 0 {
            TileSet::Low
        } else {
            TileSet::High
        }
    }

    /// Tile map read by the background (LCDC bit 3).
    #[inline]
    pub fn background_map(&self) -> TileMapArea {
        if self.lcdc & 0x08 != 0 {
            TileMapArea::High
        } else {
            TileMapArea::Low
        }
    }

    /// Tile map read by the window (LCDC bit 6).
    #[inline]
    pub fn window_map(&self) -> TileMapArea {
        if self.lcdc & 0x40 != 0 {
            TileMapArea::High
        } else {
            TileMapArea::Low
        }
    }

    /// Background viewport origin (SCX, SCY).
    #[inline]
    pub fn viewport(&self) -> (u8, u8) {
        (self.scx, self.scy)
    }

    /// Window origin in screen pixels: (WX - 7, WY), clamped at zero.
    /// With WX < 7 the first `7 - WX` window columns fall off the left edge.
    #[inline]
    pub fn window_origin(&self) -> (u8, u8) {
        (self.wx.saturating_sub(7), self.wy)
    }

    #[inline]
    pub fn mode(&self) -> PpuMode {
        self.mode
    }

    #[inline]
    pub fn line(&self) -> u8 {
        self.ly
    }

    /// Advance the mode sequence by `dots`. Returns the interrupt request mask.
    pub fn tick(&mut self, dots: u32) -> u8 {
        let mut requests = std::mem::take(&mut self.pending);
        if !self.lcd_enabled() {
            return requests;
        }

        self.dots += dots;
        while self.dots >= self.mode.duration() {
            self.dots -= self.mode.duration();
            requests |= self.advance();
        }
        requests
    }

    /// Leave the current mode. Returns interrupts raised by the transition.
    fn advance(&mut self) -> u8 {
        let mut requests = 0;
        match self.mode {
            PpuMode::OamScan => self.mode = PpuMode::Drawing,
            PpuMode::Drawing => {
                self.mode = PpuMode::HBlank;
                requests |= self.stat_request(STAT_HBLANK);
            }
            PpuMode::HBlank => {
                self.ly += 1;
                requests |= self.compare_line();
                if self.ly == VBLANK_START {
                    self.mode = PpuMode::VBlank;
                    self.frame_ready = true;
                    requests |= Interrupt::VBlank.mask();
                    requests |= self.stat_request(STAT_VBLANK);
                } else {
                    self.mode = PpuMode::OamScan;
                    requests |= self.stat_request(STAT_OAM);
                }
            }
            PpuMode::VBlank => {
                if self.ly == LAST_LINE {
                    self.ly = 0;
                    self.mode = PpuMode::OamScan;
                    requests |= self.stat_request(STAT_OAM);
                } else {
                    self.ly += 1;
                }
                requests |= self.compare_line();
            }
        }
        requests
    }

    #[inline]
    fn stat_request(&self, select: u8) -> u8 {
        if self.stat_select & select != 0 {
            Interrupt::LcdStat.mask()
        } else {
            0
        }
    }

    #[inline]
    fn compare_line(&self) -> u8 {
        if self.ly == self.lyc {
            self.stat_request(STAT_LYC)
        } else {
            0
        }
    }

    /// Returns true once per completed frame (entry into V-blank).
    pub fn take_frame_ready(&mut self) -> bool {
        std::mem::take(&mut self.frame_ready)
    }

    pub fn get_debug_state(&self) -> PpuDebugState {
        PpuDebugState {
            mode: self.mode as u8,
            mode_name: self.mode.name(),
            line: self.ly,
            dots: self.dots,
            lcdc: self.lcdc,
            scroll: (self.scx, self.scy),
            window: (self.wx, self.wy),
        }
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new(Shades::default())
    }
}
