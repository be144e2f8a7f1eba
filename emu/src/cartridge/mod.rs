//! Cartridge store: the program image plus its bank controller.
//!
//! [`Cartridge`] starts empty, accepts exactly one image per session and then
//! answers every access in the ROM window (0x0000-0x7FFF) and the external
//! RAM window (0xA000-0xBFFF). Banking state lives in the [`Mbc`]
//! implementation chosen from the header type byte.
//!
//! Accesses past the end of the held image are masked: ROM offsets wrap
//! modulo the image length and RAM offsets modulo the RAM length.

mod mbc1;
mod mbc5;
mod none;

use std::fmt;

pub use mbc1::Mbc1;
pub use mbc5::Mbc5;
pub use none::NoMbc;

use crate::error::LoadError;
use crate::log::{LogCategory, RateLimiter};
use crate::{log_info, log_info_limited, log_warn};

pub const ROM_BANK_SIZE: usize = 0x4000;
pub const RAM_BANK_SIZE: usize = 0x2000;
pub const HEADER_END: usize = 0x150;

/// Bank controller identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MbcKind {
    None,
    Mbc1,
    Mbc5,
}

/// Bank controller hardware: owns ROM, RAM and all banking state.
pub trait Mbc {
    /// Read from the ROM window (0x0000-0x7FFF).
    fn read_rom(&self, addr: u16) -> u8;
    /// Write a control register inside the ROM window. Never modifies ROM.
    fn write_rom(&mut self, addr: u16, value: u8);
    /// Read from external RAM (0xA000-0xBFFF).
    fn read_ram(&self, addr: u16) -> u8;
    /// Write to external RAM (0xA000-0xBFFF).
    fn write_ram(&mut self, addr: u16, value: u8);
    fn ram_data(&self) -> &[u8];
    fn load_ram(&mut self, data: &[u8]);
    fn kind(&self) -> MbcKind;
    /// Bank currently visible at 0x4000-0x7FFF.
    fn current_rom_bank(&self) -> u16 {
        1
    }
    fn current_ram_bank(&self) -> u8 {
        0
    }
    fn is_ram_enabled(&self) -> bool {
        false
    }
}

/// Byte at `offset`, wrapping modulo the slice length. Empty slices read 0xFF.
#[inline]
pub(crate) fn masked_read(data: &[u8], offset: usize) -> u8 {
    if data.is_empty() {
        0xFF
    } else {
        data[offset % data.len()]
    }
}

/// Store `value` at `offset`, wrapping modulo the slice length.
#[inline]
pub(crate) fn masked_write(data: &mut [u8], offset: usize, value: u8) {
    if !data.is_empty() {
        let len = data.len();
        data[offset % len] = value;
    }
}

/// Fields decoded from the cartridge header (0x0134-0x014F).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartridgeHeader {
    pub title: String,
    pub cartridge_type: u8,
    pub rom_size_code: u8,
    pub ram_size_code: u8,
}

impl CartridgeHeader {
    pub fn parse(data: &[u8]) -> Result<Self, LoadError> {
        if data.is_empty() {
            return Err(LoadError::Empty);
        }
        if data.len() < HEADER_END {
            return Err(LoadError::TooSmall { len: data.len() });
        }
        let title = data[0x134..0x144]
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| b as char)
            .collect();
        Ok(CartridgeHeader {
            title,
            cartridge_type: data[0x147],
            rom_size_code: data[0x148],
            ram_size_code: data[0x149],
        })
    }

    /// External RAM size in bytes, from header byte 0x149.
    pub fn ram_size(&self) -> Result<usize, LoadError> {
        match self.ram_size_code {
            0x00 => Ok(0),
            0x01 => Ok(2 * 1024),
            0x02 => Ok(8 * 1024),
            0x03 => Ok(32 * 1024),
            0x04 => Ok(128 * 1024),
            0x05 => Ok(64 * 1024),
            code => Err(LoadError::InvalidRamSize(code)),
        }
    }

    /// ROM size in bytes declared by header byte 0x148, if the code is known.
    pub fn declared_rom_size(&self) -> Option<usize> {
        (self.rom_size_code <= 0x08).then(|| 0x8000 << self.rom_size_code)
    }
}

/// Build the controller named by the header.
fn make_mbc(header: &CartridgeHeader, rom: Vec<u8>) -> Result<Box<dyn Mbc>, LoadError> {
    let ram_size = header.ram_size()?;
    match header.cartridge_type {
        0x00 | 0x08 | 0x09 => Ok(Box::new(NoMbc::new(rom, ram_size))),
        0x01..=0x03 => Ok(Box::new(Mbc1::new(rom, ram_size))),
        0x19..=0x1E => Ok(Box::new(Mbc5::new(rom, ram_size))),
        other => Err(LoadError::UnsupportedCartridge(other)),
    }
}

/// Debug view of the banking state.
pub struct CartridgeDebugState {
    pub kind: Option<MbcKind>,
    pub rom_bank: u16,
    pub ram_bank: u8,
    pub ram_enabled: bool,
}

impl fmt::Display for CartridgeDebugState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Some(kind) => write!(
                f,
                "MBC={:?} ROM_bank={} RAM_bank={} RAM_enabled={}",
                kind, self.rom_bank, self.ram_bank, self.ram_enabled
            ),
            None => write!(f, "MBC=<empty>"),
        }
    }
}

pub struct Cartridge {
    mbc: Option<Box<dyn Mbc>>,
    header: Option<CartridgeHeader>,
}

impl Cartridge {
    /// An empty slot. Every read returns 0xFF until an image is loaded.
    pub fn new() -> Self {
        Cartridge {
            mbc: None,
            header: None,
        }
    }

    /// Accept the program image. Only one image may be loaded per session.
    pub fn load(&mut self, data: &[u8]) -> Result<(), LoadError> {
        if self.mbc.is_some() {
            return Err(LoadError::AlreadyLoaded);
        }
        let header = CartridgeHeader::parse(data)?;
        let mbc = make_mbc(&header, data.to_vec())?;

        log_info!(
            LogCategory::Cartridge,
            "Loaded '{}': {} bytes, type=0x{:02X} ({:?}), ram={} bytes",
            header.title,
            data.len(),
            header.cartridge_type,
            mbc.kind(),
            mbc.ram_data().len()
        );
        if header.declared_rom_size() != Some(data.len()) {
            log_warn!(
                LogCategory::Cartridge,
                "Header ROM size code 0x{:02X} disagrees with image length {}",
                header.rom_size_code,
                data.len()
            );
        }

        self.mbc = Some(mbc);
        self.header = Some(header);
        Ok(())
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.mbc.is_some()
    }

    pub fn header(&self) -> Option<&CartridgeHeader> {
        self.header.as_ref()
    }

    #[inline]
    pub fn read(&self, addr: u16) -> u8 {
        let Some(mbc) = self.mbc.as_ref() else {
            return 0xFF;
        };
        match addr {
            0x0000..=0x7FFF => mbc.read_rom(addr),
            0xA000..=0xBFFF => mbc.read_ram(addr),
            _ => 0xFF,
        }
    }

    #[inline]
    pub fn write(&mut self, addr: u16, value: u8) {
        let Some(mbc) = self.mbc.as_mut() else {
            static EMPTY_WRITE_LIMITER: RateLimiter = RateLimiter::new(8);
            log_info_limited!(
                LogCategory::Cartridge,
                &EMPTY_WRITE_LIMITER,
                "Write 0x{:02X} to 0x{:04X} with no cartridge loaded",
                value,
                addr
            );
            return;
        };
        match addr {
            0x0000..=0x7FFF => mbc.write_rom(addr, value),
            0xA000..=0xBFFF => mbc.write_ram(addr, value),
            _ => {}
        }
    }

    /// External RAM contents, for battery save export.
    pub fn ram(&self) -> &[u8] {
        self.mbc.as_ref().map(|m| m.ram_data()).unwrap_or(&[])
    }

    /// Restore external RAM from a save. Extra bytes are ignored.
    pub fn load_ram(&mut self, data: &[u8]) {
        if let Some(mbc) = self.mbc.as_mut() {
            mbc.load_ram(data);
        }
    }

    pub fn debug_state(&self) -> CartridgeDebugState {
        match self.mbc.as_ref() {
            Some(mbc) => CartridgeDebugState {
                kind: Some(mbc.kind()),
                rom_bank: mbc.current_rom_bank(),
                ram_bank: mbc.current_ram_bank(),
                ram_enabled: mbc.is_ram_enabled(),
            },
            None => CartridgeDebugState {
                kind: None,
                rom_bank: 0,
                ram_bank: 0,
                ram_enabled: false,
            },
        }
    }
}

impl Default for Cartridge {
    fn default() -> Self {
        Self::new()
    }
}
