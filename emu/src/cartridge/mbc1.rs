//! MBC1: up to 2 MiB ROM (128 banks) and 32 KiB RAM (4 banks).
//!
//! A 5-bit low bank register and a 2-bit high register. In mode 0 the high
//! bits extend the switchable ROM bank; in mode 1 they also select the RAM
//! bank and the bank mapped at 0x0000-0x3FFF.

use super::{Mbc, MbcKind, RAM_BANK_SIZE, ROM_BANK_SIZE, masked_read, masked_write};

pub struct Mbc1 {
    rom: Vec<u8>,
    ram: Vec<u8>,
    bank_low: u8,  // 0x2000-0x3FFF, 5 bits, 0 reads as 1
    bank_high: u8, // 0x4000-0x5FFF, 2 bits
    ram_enabled: bool,
    mode: bool,
}

impl Mbc1 {
    pub fn new(rom: Vec<u8>, ram_size: usize) -> Self {
        Mbc1 {
            rom,
            ram: vec![0; ram_size],
            bank_low: 1,
            bank_high: 0,
            ram_enabled: false,
            mode: false,
        }
    }

    fn lower_bank(&self) -> usize {
        if self.mode {
            (self.bank_high as usize) << 5
        } else {
            0
        }
    }

    fn upper_bank(&self) -> usize {
        ((self.bank_high as usize) << 5) | self.bank_low as usize
    }

    fn ram_offset(&self, addr: u16) -> usize {
        let bank = if self.mode { self.bank_high as usize } else { 0 };
        bank * RAM_BANK_SIZE + (addr - 0xA000) as usize
    }
}

impl Mbc for Mbc1 {
    fn read_rom(&self, addr: u16) -> u8 {
        let (bank, offset) = match addr {
            0x0000..=0x3FFF => (self.lower_bank(), addr as usize),
            _ => (self.upper_bank(), (addr as usize) - 0x4000),
        };
        masked_read(&self.rom, bank * ROM_BANK_SIZE + offset)
    }

    fn write_rom(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram_enabled = (value & 0x0F) == 0x0A,
            0x2000..=0x3FFF => {
                let bank = value & 0x1F;
                self.bank_low = if bank == 0 { 1 } else { bank };
            }
            0x4000..=0x5FFF => self.bank_high = value & 0x03,
            0x6000..=0x7FFF => self.mode = (value & 0x01) != 0,
            _ => {}
        }
    }

    fn read_ram(&self, addr: u16) -> u8 {
        if !self.ram_enabled {
            return 0xFF;
        }
        masked_read(&self.ram, self.ram_offset(addr))
    }

    fn write_ram(&mut self, addr: u16, value: u8) {
        if !self.ram_enabled {
            return;
        }
        let offset = self.ram_offset(addr);
        masked_write(&mut self.ram, offset, value);
    }

    fn ram_data(&self) -> &[u8] {
        &self.ram
    }

    fn load_ram(&mut self, data: &[u8]) {
        let len = data.len().min(self.ram.len());
        self.ram[..len].copy_from_slice(&data[..len]);
    }

    fn kind(&self) -> MbcKind {
        MbcKind::Mbc1
    }

    fn current_rom_bank(&self) -> u16 {
        self.upper_bank() as u16
    }

    fn current_ram_bank(&self) -> u8 {
        if self.mode { self.bank_high } else { 0 }
    }

    fn is_ram_enabled(&self) -> bool {
        self.ram_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::tests::banked_rom;

    #[test]
    fn test_rom_bank_select() {
        let mut cart = Mbc1::new(banked_rom(0x01, 4, 0), 0);

        assert_eq!(cart.read_rom(0x0000), 0x00);
        assert_eq!(cart.read_rom(0x4000), 0x01);

        cart.write_rom(0x2000, 0x02);
        assert_eq!(cart.read_rom(0x4000), 0x02);

        cart.write_rom(0x2000, 0x03);
        assert_eq!(cart.read_rom(0x4000), 0x03);

        // Bank 0 is not selectable for the switchable window
        cart.write_rom(0x2000, 0x00);
        assert_eq!(cart.read_rom(0x4000), 0x01);
    }

    #[test]
    fn test_bank_number_masked_to_image() {
        let mut cart = Mbc1::new(banked_rom(0x01, 4, 0), 0);
        // Bank 6 of a 4-bank image wraps to bank 2
        cart.write_rom(0x2000, 0x06);
        assert_eq!(cart.read_rom(0x4000), 0x02);
        assert_eq!(cart.current_rom_bank(), 6);
    }

    #[test]
    fn test_high_bits_extend_rom_bank() {
        let mut cart = Mbc1::new(banked_rom(0x01, 64, 0), 0);
        cart.write_rom(0x2000, 0x01);
        cart.write_rom(0x4000, 0x01);
        assert_eq!(cart.read_rom(0x4000), 0x21);
        // Mode 0 keeps bank 0 fixed at the bottom
        assert_eq!(cart.read_rom(0x0000), 0x00);
        // Mode 1 maps bank 0x20 at the bottom
        cart.write_rom(0x6000, 0x01);
        assert_eq!(cart.read_rom(0x0000), 0x20);
    }

    #[test]
    fn test_external_ram_enable() {
        let mut cart = Mbc1::new(banked_rom(0x03, 4, 0x02), 0x2000);
        assert_eq!(cart.read_ram(0xA000), 0xFF);

        cart.write_rom(0x0000, 0x0A);
        cart.write_ram(0xA000, 0x42);
        assert_eq!(cart.read_ram(0xA000), 0x42);

        cart.write_rom(0x0000, 0x00);
        assert_eq!(cart.read_ram(0xA000), 0xFF);
        cart.write_ram(0xA000, 0x99);

        cart.write_rom(0x0000, 0x0A);
        assert_eq!(cart.read_ram(0xA000), 0x42);
    }

    #[test]
    fn test_ram_banking_in_mode_one() {
        let mut cart = Mbc1::new(banked_rom(0x03, 4, 0x03), 0x8000);
        cart.write_rom(0x0000, 0x0A);
        cart.write_rom(0x6000, 0x01);
        cart.write_rom(0x4000, 0x02);
        cart.write_ram(0xA000, 0x77);
        assert_eq!(cart.ram_data()[2 * RAM_BANK_SIZE], 0x77);
        assert_eq!(cart.current_ram_bank(), 2);
    }

    #[test]
    fn test_ram_persistence() {
        let mut cart = Mbc1::new(banked_rom(0x03, 4, 0x02), 0x2000);
        cart.write_rom(0x0000, 0x0A);
        cart.write_ram(0xA000, 0x42);
        cart.write_ram(0xA001, 0x43);
        let saved = cart.ram_data().to_vec();

        let mut restored = Mbc1::new(banked_rom(0x03, 4, 0x02), 0x2000);
        restored.load_ram(&saved);
        restored.write_rom(0x0000, 0x0A);
        assert_eq!(restored.read_ram(0xA000), 0x42);
        assert_eq!(restored.read_ram(0xA001), 0x43);
    }
}
