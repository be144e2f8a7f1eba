//! Memory router for the 16-bit address space.
//!
//! Every address decodes to exactly one [`Region`], and every region has
//! exactly one [`Owner`]. Cartridge and picture-unit regions are forwarded on
//! every access; the router only stores bytes for the regions it owns
//! (work RAM, high RAM and the I/O block).

use crate::cartridge::Cartridge;
use crate::config::Shades;
use crate::error::LoadError;
use crate::interrupts::{Interrupt, InterruptController};
use crate::joypad::Joypad;
use crate::log::{LogCategory, RateLimiter};
use crate::log_info_limited;
use crate::ppu::{OAM_SIZE, Ppu};
use crate::timer::Timer;

const WRAM_SIZE: usize = 0x2000;
const HRAM_SIZE: usize = 0x7F;
const IO_SIZE: usize = 0x80;

pub const DOTS_PER_M_CYCLE: u32 = 4;

mod io {
    pub const P1: u16 = 0xFF00;
    pub const SB: u16 = 0xFF01;
    pub const SC: u16 = 0xFF02;
    pub const IF: u16 = 0xFF0F;
    pub const DMA: u16 = 0xFF46;
}

/// Fixed, non-overlapping regions of the address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// 0x0000-0x7FFF
    Rom,
    /// 0x8000-0x9FFF
    Vram,
    /// 0xA000-0xBFFF
    ExternalRam,
    /// 0xC000-0xDFFF
    WorkRam,
    /// 0xE000-0xFDFF, mirrors work RAM
    Echo,
    /// 0xFE00-0xFE9F
    Oam,
    /// 0xFEA0-0xFEFF
    Unusable,
    /// 0xFF00-0xFF7F minus the LCD block
    Io,
    /// 0xFF40-0xFF4B except 0xFF46
    LcdRegisters,
    /// 0xFF80-0xFFFE
    HighRam,
    /// 0xFFFF
    InterruptEnable,
}

/// The component that answers accesses to a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Cartridge,
    PictureUnit,
    WorkingMemory,
}

impl Region {
    pub const fn owner(self) -> Owner {
        match self {
            Region::Rom | Region::ExternalRam => Owner::Cartridge,
            Region::Vram | Region::Oam | Region::LcdRegisters => Owner::PictureUnit,
            Region::WorkRam
            | Region::Echo
            | Region::Unusable
            | Region::Io
            | Region::HighRam
            | Region::InterruptEnable => Owner::WorkingMemory,
        }
    }
}

static SERIAL_LIMITER: RateLimiter = RateLimiter::new(64);
static DMA_LIMITER: RateLimiter = RateLimiter::new(8);

pub struct MemoryBus {
    cartridge: Cartridge,
    ppu: Ppu,
    wram: [u8; WRAM_SIZE],
    hram: [u8; HRAM_SIZE],
    io: [u8; IO_SIZE],
    timer: Timer,
    joypad: Joypad,
    interrupts: InterruptController,
    serial_output: Vec<u8>,
}

impl MemoryBus {
    pub fn new(shades: Shades) -> Self {
        MemoryBus {
            cartridge: Cartridge::new(),
            ppu: Ppu::new(shades),
            wram: [0; WRAM_SIZE],
            hram: [0; HRAM_SIZE],
            io: [0; IO_SIZE],
            timer: Timer::new(),
            joypad: Joypad::new(),
            interrupts: InterruptController::new(),
            serial_output: Vec::new(),
        }
    }

    /// Region an address belongs to. Total over the address space.
    pub const fn decode(addr: u16) -> Region {
        match addr {
            0x0000..=0x7FFF => Region::Rom,
            0x8000..=0x9FFF => Region::Vram,
            0xA000..=0xBFFF => Region::ExternalRam,
            0xC000..=0xDFFF => Region::WorkRam,
            0xE000..=0xFDFF => Region::Echo,
            0xFE00..=0xFE9F => Region::Oam,
            0xFEA0..=0xFEFF => Region::Unusable,
            io::DMA => Region::Io,
            0xFF40..=0xFF4B => Region::LcdRegisters,
            0xFF00..=0xFF7F => Region::Io,
            0xFF80..=0xFFFE => Region::HighRam,
            0xFFFF => Region::InterruptEnable,
        }
    }

    pub fn load_cartridge(&mut self, data: &[u8]) -> Result<(), LoadError> {
        self.cartridge.load(data)
    }

    pub fn read(&self, addr: u16) -> u8 {
        match Self::decode(addr) {
            Region::Rom | Region::ExternalRam => self.cartridge.read(addr),
            Region::Vram => self.ppu.read_vram(addr),
            Region::WorkRam => self.wram[(addr - 0xC000) as usize],
            Region::Echo => self.wram[(addr - 0xE000) as usize],
            Region::Oam => self.ppu.read_oam(addr),
            Region::Unusable => 0xFF,
            Region::Io => self.read_io(addr),
            Region::LcdRegisters => self.ppu.read_register(addr),
            Region::HighRam => self.hram[(addr - 0xFF80) as usize],
            Region::InterruptEnable => self.interrupts.read_enable(),
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match Self::decode(addr) {
            Region::Rom | Region::ExternalRam => self.cartridge.write(addr, value),
            Region::Vram => self.ppu.write_vram(addr, value),
            Region::WorkRam => self.wram[(addr - 0xC000) as usize] = value,
            Region::Echo => self.wram[(addr - 0xE000) as usize] = value,
            Region::Oam => self.ppu.write_oam(addr, value),
            Region::Unusable => {}
            Region::Io => self.write_io(addr, value),
            Region::LcdRegisters => self.ppu.write_register(addr, value),
            Region::HighRam => self.hram[(addr - 0xFF80) as usize] = value,
            Region::InterruptEnable => self.interrupts.write_enable(value),
        }
    }

    fn read_io(&self, addr: u16) -> u8 {
        match addr {
            io::P1 => self.joypad.read(),
            io::SC => self.io[0x02] | 0x7E,
            0xFF04..=0xFF07 => self.timer.read(addr),
            io::IF => self.interrupts.read_flags(),
            _ => self.io[(addr - 0xFF00) as usize],
        }
    }

    fn write_io(&mut self, addr: u16, value: u8) {
        match addr {
            io::P1 => self.joypad.write(value),
            io::SC => {
                self.io[0x02] = value;
                if value & 0x80 != 0 {
                    // No link partner: the transfer completes at once
                    let byte = self.io[(io::SB - 0xFF00) as usize];
                    self.serial_output.push(byte);
                    self.io[0x02] &= 0x7F;
                    self.interrupts.request(Interrupt::Serial);
                    log_info_limited!(LogCategory::Bus, &SERIAL_LIMITER, "serial out {:02X}", byte);
                }
            }
            0xFF04..=0xFF07 => self.timer.write(addr, value),
            io::IF => self.interrupts.write_flags(value),
            io::DMA => {
                self.io[(io::DMA - 0xFF00) as usize] = value;
                self.oam_dma(value);
            }
            _ => self.io[(addr - 0xFF00) as usize] = value,
        }
    }

    /// Copy 160 bytes from `page << 8` into OAM through the ordinary read path.
    fn oam_dma(&mut self, page: u8) {
        let source = (page as u16) << 8;
        log_info_limited!(LogCategory::Bus, &DMA_LIMITER, "OAM DMA from {:04X}", source);
        for i in 0..OAM_SIZE as u16 {
            let value = self.read(source.wrapping_add(i));
            self.ppu.write_oam(0xFE00 + i, value);
        }
    }

    /// Advance the peripherals by `m_cycles` machine cycles and latch any
    /// interrupts they raise.
    pub fn tick(&mut self, m_cycles: u32) {
        let dots = m_cycles * DOTS_PER_M_CYCLE;
        if self.timer.tick(dots) {
            self.interrupts.request(Interrupt::Timer);
        }
        let requests = self.ppu.tick(dots);
        self.interrupts.request_mask(requests);
    }

    #[inline]
    pub fn cartridge(&self) -> &Cartridge {
        &self.cartridge
    }

    #[inline]
    pub fn cartridge_mut(&mut self) -> &mut Cartridge {
        &mut self.cartridge
    }

    #[inline]
    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    #[inline]
    pub fn ppu_mut(&mut self) -> &mut Ppu {
        &mut self.ppu
    }

    #[inline]
    pub fn interrupts(&self) -> &InterruptController {
        &self.interrupts
    }

    #[inline]
    pub fn interrupts_mut(&mut self) -> &mut InterruptController {
        &mut self.interrupts
    }

    #[inline]
    pub fn joypad_mut(&mut self) -> &mut Joypad {
        &mut self.joypad
    }

    /// Bytes sent over the serial port so far.
    pub fn serial_output(&self) -> &[u8] {
        &self.serial_output
    }

    pub fn take_serial_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.serial_output)
    }
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new(Shades::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::tests::banked_rom;
    use proptest::prelude::*;

    fn loaded_bus() -> MemoryBus {
        let mut bus = MemoryBus::default();
        let mut rom = banked_rom(0x00, 2, 0x00);
        rom[0x0200] = 0x42;
        bus.load_cartridge(&rom).expect("load");
        bus
    }

    /// Inclusive address bounds per region, in ascending order.
    const LAYOUT: [(u16, u16, Region); 13] = [
        (0x0000, 0x7FFF, Region::Rom),
        (0x8000, 0x9FFF, Region::Vram),
        (0xA000, 0xBFFF, Region::ExternalRam),
        (0xC000, 0xDFFF, Region::WorkRam),
        (0xE000, 0xFDFF, Region::Echo),
        (0xFE00, 0xFE9F, Region::Oam),
        (0xFEA0, 0xFEFF, Region::Unusable),
        (0xFF00, 0xFF3F, Region::Io),
        (0xFF40, 0xFF45, Region::LcdRegisters),
        (0xFF46, 0xFF46, Region::Io),
        (0xFF47, 0xFF4B, Region::LcdRegisters),
        (0xFF4C, 0xFF7F, Region::Io),
        (0xFF80, 0xFFFE, Region::HighRam),
    ];

    fn expected_region(addr: u16) -> Region {
        LAYOUT
            .iter()
            .find(|(lo, hi, _)| (*lo..=*hi).contains(&addr))
            .map(|&(_, _, region)| region)
            .unwrap_or(Region::InterruptEnable)
    }

    #[test]
    fn test_every_address_has_one_region() {
        for addr in 0..=u16::MAX {
            let matches = LAYOUT
                .iter()
                .filter(|(lo, hi, _)| (*lo..=*hi).contains(&addr))
                .count()
                + usize::from(addr == 0xFFFF);
            assert_eq!(matches, 1, "address {addr:04X}");
            assert_eq!(MemoryBus::decode(addr), expected_region(addr));
        }
    }

    proptest! {
        #[test]
        fn decode_selects_single_owner(addr in any::<u16>()) {
            let owner = MemoryBus::decode(addr).owner();
            let expected = match addr {
                0x0000..=0x7FFF | 0xA000..=0xBFFF => Owner::Cartridge,
                0x8000..=0x9FFF | 0xFE00..=0xFE9F => Owner::PictureUnit,
                0xFF40..=0xFF4B if addr != 0xFF46 => Owner::PictureUnit,
                _ => Owner::WorkingMemory,
            };
            prop_assert_eq!(owner, expected);
        }

        #[test]
        fn work_ram_and_echo_share_storage(offset in 0u16..0x1E00, value: u8) {
            let mut bus = MemoryBus::default();
            bus.write(0xC000 + offset, value);
            prop_assert_eq!(bus.read(0xE000 + offset), value);
        }
    }

    #[test]
    fn test_rom_reads_forward_to_cartridge() {
        let mut bus = loaded_bus();
        assert_eq!(bus.read(0x0200), 0x42);
        bus.write(0x0200, 0x99); // ignored by a controller-less cartridge
        assert_eq!(bus.read(0x0200), 0x42);
    }

    #[test]
    fn test_empty_cartridge_reads_open_bus() {
        let bus = MemoryBus::default();
        assert_eq!(bus.read(0x0100), 0xFF);
        assert_eq!(bus.read(0xA000), 0xFF);
    }

    #[test]
    fn test_vram_writes_land_in_picture_unit() {
        let mut bus = MemoryBus::default();
        bus.write(0x8010, 0xAA);
        bus.write(0x9FFF, 0xBB);
        assert_eq!(bus.ppu().read_vram(0x8010), 0xAA);
        assert_eq!(bus.read(0x9FFF), 0xBB);
    }

    #[test]
    fn test_oam_and_lcd_registers_forward() {
        let mut bus = MemoryBus::default();
        bus.write(0xFE9F, 0x20);
        assert_eq!(bus.ppu().read_oam(0xFE9F), 0x20);

        bus.write(0xFF43, 0x37);
        assert_eq!(bus.ppu().viewport().0, 0x37);
        assert_eq!(bus.read(0xFF43), 0x37);
    }

    #[test]
    fn test_unusable_region() {
        let mut bus = MemoryBus::default();
        bus.write(0xFEA0, 0x12);
        assert_eq!(bus.read(0xFEA0), 0xFF);
        assert_eq!(bus.read(0xFEFF), 0xFF);
    }

    #[test]
    fn test_high_ram_and_ie() {
        let mut bus = MemoryBus::default();
        bus.write(0xFF80, 0x12);
        bus.write(0xFFFE, 0x34);
        bus.write(0xFFFF, 0x1F);
        assert_eq!(bus.read(0xFF80), 0x12);
        assert_eq!(bus.read(0xFFFE), 0x34);
        assert_eq!(bus.read(0xFFFF), 0x1F);
        assert_eq!(bus.interrupts().read_enable(), 0x1F);
    }

    #[test]
    fn test_interrupt_flag_upper_bits() {
        let mut bus = MemoryBus::default();
        bus.write(0xFF0F, 0x04);
        assert_eq!(bus.read(0xFF0F), 0xE4);
    }

    #[test]
    fn test_oam_dma() {
        let mut bus = MemoryBus::default();
        for i in 0..0xA0u16 {
            bus.write(0xC000 + i, i as u8);
        }
        bus.write(0xFF46, 0xC0);
        assert_eq!(bus.read(0xFE00), 0x00);
        assert_eq!(bus.read(0xFE50), 0x50);
        assert_eq!(bus.read(0xFE9F), 0x9F);
        assert_eq!(bus.read(0xFF46), 0xC0);
    }

    #[test]
    fn test_serial_capture() {
        let mut bus = MemoryBus::default();
        bus.write(0xFF0F, 0x00);
        for &b in b"ok" {
            bus.write(0xFF01, b);
            bus.write(0xFF02, 0x81);
        }
        assert_eq!(bus.serial_output(), b"ok");
        assert_eq!(bus.read(0xFF02) & 0x80, 0);
        assert_eq!(bus.read(0xFF0F) & Interrupt::Serial.mask(), Interrupt::Serial.mask());
        assert_eq!(bus.take_serial_output(), b"ok".to_vec());
        assert!(bus.serial_output().is_empty());
    }

    #[test]
    fn test_joypad_routed() {
        let mut bus = MemoryBus::default();
        bus.joypad_mut().set_button(crate::joypad::Button::A, true);
        bus.write(0xFF00, 0x10);
        assert_eq!(bus.read(0xFF00) & 0x01, 0x00);
    }

    #[test]
    fn test_tick_latches_vblank() {
        let mut bus = MemoryBus::default();
        bus.write(0xFF0F, 0x00);
        // 144 lines of 456 dots = 16416 machine cycles
        bus.tick(16415);
        assert_eq!(bus.read(0xFF0F) & 0x01, 0);
        bus.tick(1);
        assert_eq!(bus.read(0xFF0F) & 0x01, 0x01);
        assert!(bus.ppu_mut().take_frame_ready());
    }

    #[test]
    fn test_tick_latches_timer() {
        let mut bus = MemoryBus::default();
        bus.write(0xFF0F, 0x00);
        bus.write(0xFF04, 0x00);
        bus.write(0xFF05, 0xFF);
        bus.write(0xFF07, 0x05); // every 16 dots
        bus.tick(5); // 20 dots: overflow at 16, reload at 20
        assert_eq!(bus.read(0xFF0F) & 0x04, 0x04);
    }
}
