//! Controller-less cartridge: 32 KiB of ROM, optionally 8 KiB of RAM.

use super::{Mbc, MbcKind, masked_read, masked_write};
use crate::log::{LogCategory, RateLimiter};
use crate::log_info_limited;

pub struct NoMbc {
    rom: Vec<u8>,
    ram: Vec<u8>,
}

impl NoMbc {
    pub fn new(rom: Vec<u8>, ram_size: usize) -> Self {
        NoMbc {
            rom,
            ram: vec![0; ram_size],
        }
    }
}

impl Mbc for NoMbc {
    fn read_rom(&self, addr: u16) -> u8 {
        masked_read(&self.rom, addr as usize)
    }

    fn write_rom(&mut self, addr: u16, value: u8) {
        static ROM_WRITE_LIMITER: RateLimiter = RateLimiter::new(16);
        log_info_limited!(
            LogCategory::Cartridge,
            &ROM_WRITE_LIMITER,
            "Ignored ROM write 0x{:02X} -> 0x{:04X} (no bank controller)",
            value,
            addr
        );
    }

    fn read_ram(&self, addr: u16) -> u8 {
        masked_read(&self.ram, (addr - 0xA000) as usize)
    }

    fn write_ram(&mut self, addr: u16, value: u8) {
        masked_write(&mut self.ram, (addr - 0xA000) as usize, value);
    }

    fn ram_data(&self) -> &[u8] {
        &self.ram
    }

    fn load_ram(&mut self, data: &[u8]) {
        let len = data.len().min(self.ram.len());
        self.ram[..len].copy_from_slice(&data[..len]);
    }

    fn kind(&self) -> MbcKind {
        MbcKind::None
    }

    fn is_ram_enabled(&self) -> bool {
        !self.ram.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rom_is_read_only() {
        let mut rom = vec![0u8; 0x8000];
        rom[0x1234] = 0x56;
        let mut cart = NoMbc::new(rom, 0);
        cart.write_rom(0x1234, 0xFF);
        assert_eq!(cart.read_rom(0x1234), 0x56);
    }

    #[test]
    fn test_small_image_wraps() {
        let mut rom = vec![0u8; 0x4000];
        rom[0x0010] = 0xAB;
        let cart = NoMbc::new(rom, 0);
        // 0x4010 is past the image end and wraps to 0x0010
        assert_eq!(cart.read_rom(0x4010), 0xAB);
    }

    #[test]
    fn test_optional_ram() {
        let mut with_ram = NoMbc::new(vec![0; 0x8000], 0x2000);
        with_ram.write_ram(0xA001, 0x42);
        assert_eq!(with_ram.read_ram(0xA001), 0x42);

        let mut without = NoMbc::new(vec![0; 0x8000], 0);
        without.write_ram(0xA001, 0x42);
        assert_eq!(without.read_ram(0xA001), 0xFF);
    }
}
