//! MBC5: up to 8 MiB ROM (9-bit bank number) and 128 KiB RAM (16 banks).

use super::{Mbc, MbcKind, RAM_BANK_SIZE, ROM_BANK_SIZE, masked_read, masked_write};

pub struct Mbc5 {
    rom: Vec<u8>,
    ram: Vec<u8>,
    rom_bank: u16, // low 8 bits at 0x2000-0x2FFF, bit 8 at 0x3000-0x3FFF
    ram_bank: u8,
    ram_enabled: bool,
}

impl Mbc5 {
    pub fn new(rom: Vec<u8>, ram_size: usize) -> Self {
        Mbc5 {
            rom,
            ram: vec![0; ram_size],
            rom_bank: 1,
            ram_bank: 0,
            ram_enabled: false,
        }
    }

    fn ram_offset(&self, addr: u16) -> usize {
        self.ram_bank as usize * RAM_BANK_SIZE + (addr - 0xA000) as usize
    }
}

impl Mbc for Mbc5 {
    fn read_rom(&self, addr: u16) -> u8 {
        let offset = match addr {
            0x0000..=0x3FFF => addr as usize,
            // Unlike MBC1, bank 0 may be mapped here
            _ => self.rom_bank as usize * ROM_BANK_SIZE + (addr as usize - 0x4000),
        };
        masked_read(&self.rom, offset)
    }

    fn write_rom(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram_enabled = (value & 0x0F) == 0x0A,
            0x2000..=0x2FFF => self.rom_bank = (self.rom_bank & 0x100) | value as u16,
            0x3000..=0x3FFF => {
                self.rom_bank = (self.rom_bank & 0xFF) | ((value as u16 & 1) << 8);
            }
            0x4000..=0x5FFF => self.ram_bank = value & 0x0F,
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
        MbcKind::Mbc5
    }

    fn current_rom_bank(&self) -> u16 {
        self.rom_bank
    }

    fn current_ram_bank(&self) -> u8 {
        self.ram_bank
    }

    fn is_ram_enabled(&self) -> bool {
        self.ram_enabled
    }
}
