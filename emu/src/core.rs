//! Shared emulator core.
//!
//! [`GameBoyCore`] wraps the processor (which owns the bus and every
//! component behind it) and provides the `step_frame` loop, ROM loading,
//! button input and the latest rendered frame. The wasm and C bindings are
//! thin layers over it.

use crate::bus::DOTS_PER_M_CYCLE;
use crate::config::CoreConfig;
use crate::cpu::Cpu;
use crate::error::{LoadError, StepError};
use crate::interrupts::Interrupt;
use crate::joypad::Button;
use crate::log::LogCategory;
use crate::ppu::Frame;
use crate::{log_info, log_warn};

/// Dots in one full frame: 154 lines of 456 dots.
pub const DOTS_PER_FRAME: u32 = 70224;
const CYCLES_PER_FRAME: u32 = DOTS_PER_FRAME / DOTS_PER_M_CYCLE;

pub struct GameBoyCore {
    cpu: Cpu,
    frame: Frame,
    frame_count: u32,
    total_cycles: u64,
}

impl GameBoyCore {
    pub fn new() -> Self {
        Self::with_config(&CoreConfig::default())
    }

    pub fn with_config(config: &CoreConfig) -> Self {
        let cpu = Cpu::with_config(config);
        let frame = cpu.bus().ppu().render();
        GameBoyCore {
            cpu,
            frame,
            frame_count: 0,
            total_cycles: 0,
        }
    }

    pub fn load_rom(&mut self, rom_data: &[u8]) -> Result<(), LoadError> {
        log_info!(LogCategory::General, "load_rom: {} bytes", rom_data.len());
        self.cpu.load(rom_data)?;
        log_info!(
            LogCategory::General,
            "{}",
            self.cpu.bus().cartridge().debug_state()
        );
        log_info!(LogCategory::Cpu, "{}", self.cpu.get_debug_state());
        Ok(())
    }

    /// Execute one instruction; returns its machine cycles.
    pub fn step(&mut self) -> Result<u32, StepError> {
        let cycles = self.cpu.step()?;
        self.total_cycles += u64::from(cycles);
        Ok(cycles)
    }

    /// Run until the picture unit finishes a frame or one frame's worth of
    /// cycles has passed, then render. Returns the instructions executed.
    pub fn step_frame(&mut self) -> Result<u32, StepError> {
        let mut cycles_elapsed: u32 = 0;
        let mut instructions: u32 = 0;

        while cycles_elapsed < CYCLES_PER_FRAME {
            cycles_elapsed += self.step()?;
            instructions += 1;
            if self.cpu.bus_mut().ppu_mut().take_frame_ready() {
                break;
            }
        }

        self.frame_count += 1;
        if self.frame_count % 60 == 1 {
            self.log_frame_debug(instructions);
        }

        self.frame = self.render();
        Ok(instructions)
    }

    /// Compose the current video memory into a fresh frame.
    pub fn render(&self) -> Frame {
        self.cpu.bus().ppu().render()
    }

    /// The frame produced by the last `step_frame`.
    #[inline]
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Update a button by host index (see [`Button`]). A press requests
    /// the joypad interrupt. Unknown indices are ignored.
    pub fn set_button(&mut self, button: u8, pressed: bool) {
        let Some(button) = Button::from_u8(button) else {
            return;
        };
        let bus = self.cpu.bus_mut();
        if bus.joypad_mut().set_button(button, pressed) {
            bus.interrupts_mut().request(Interrupt::Joypad);
        }
    }

    #[inline]
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Battery-backed cartridge RAM.
    pub fn cartridge_ram(&self) -> &[u8] {
        self.cpu.bus().cartridge().ram()
    }

    pub fn load_cartridge_ram(&mut self, data: &[u8]) {
        self.cpu.bus_mut().cartridge_mut().load_ram(data);
    }

    /// Drain bytes written out over the serial port.
    pub fn take_serial_output(&mut self) -> Vec<u8> {
        self.cpu.bus_mut().take_serial_output()
    }

    #[inline]
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    #[inline]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    #[inline]
    pub fn instruction_count(&self) -> u64 {
        self.cpu.instruction_count()
    }

    fn log_frame_debug(&self, instructions_this_frame: u32) {
        log_info!(
            LogCategory::General,
            "=== Frame {} | cycles: {} | instrs: {} (frame: {}) ===",
            self.frame_count,
            self.total_cycles,
            self.instruction_count(),
            instructions_this_frame
        );
        log_info!(LogCategory::Cpu, "{}", self.cpu.get_debug_state());
        log_info!(LogCategory::Ppu, "{}", self.cpu.bus().ppu().get_debug_state());
        if !self.cpu.bus().ppu().lcd_enabled() {
            log_warn!(LogCategory::General, "LCD is disabled (LCDC bit 7 = 0)");
        }
    }
}

impl Default for GameBoyCore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ppu::PpuMode;

    fn core_with_program(program: &[u8]) -> GameBoyCore {
        let mut rom = vec![0u8; 0x8000];
        rom[0x100..0x100 + program.len()].copy_from_slice(program);
        let mut core = GameBoyCore::new();
        core.load_rom(&rom).expect("load");
        core
    }

    // JR -2
    const SPIN: [u8; 2] = [0x18, 0xFE];

    #[test]
    fn test_step_without_rom() {
        let mut core = GameBoyCore::new();
        assert_eq!(core.step(), Err(StepError::NoCartridge));
        assert_eq!(core.step_frame(), Err(StepError::NoCartridge));
        assert_eq!(core.frame_count(), 0);
    }

    #[test]
    fn test_step_frame_stops_at_vblank() {
        let mut core = core_with_program(&SPIN);
        let instructions = core.step_frame().expect("frame");
        assert!(instructions > 0);
        assert_eq!(core.frame_count(), 1);

        let ppu = core.cpu().bus().ppu();
        assert_eq!(ppu.line(), 144);
        assert_eq!(ppu.mode(), PpuMode::VBlank);
        assert!(core.total_cycles() < u64::from(CYCLES_PER_FRAME));
    }

    #[test]
    fn test_consecutive_frames_are_one_frame_apart() {
        let mut core = core_with_program(&SPIN);
        core.step_frame().expect("frame");
        let first = core.total_cycles();
        core.step_frame().expect("frame");
        let elapsed = core.total_cycles() - first;
        // JR costs 3 cycles, so the boundary is hit within one instruction.
        let frame = u64::from(CYCLES_PER_FRAME);
        assert!(elapsed + 3 >= frame && elapsed <= frame + 3, "{elapsed}");
        assert_eq!(core.cpu().bus().ppu().line(), 144);
    }

    #[test]
    fn test_step_frame_with_lcd_off_runs_full_budget() {
        // LD A,0 ; LDH (0x40),A ; JR -2
        let mut core = core_with_program(&[0x3E, 0x00, 0xE0, 0x40, 0x18, 0xFE]);
        core.step_frame().expect("frame");
        assert!(core.total_cycles() >= u64::from(CYCLES_PER_FRAME));
        assert!(!core.cpu().bus().ppu().lcd_enabled());
        assert_eq!(core.frame().pixel(0, 0), Some([0xFF, 0xFF, 0xFF, 0xFF]));
    }

    #[test]
    fn test_step_frame_reports_fault() {
        let mut core = core_with_program(&[0x00, 0xD3]);
        assert_eq!(
            core.step_frame(),
            Err(StepError::UnimplementedOpcode {
                opcode: 0xD3,
                address: 0x0101
            })
        );
        assert_eq!(core.frame_count(), 0);
        assert!(core.step().is_err());
    }

    #[test]
    fn test_button_press_requests_joypad_interrupt() {
        let mut core = core_with_program(&SPIN);
        let joypad = Interrupt::Joypad.mask();
        assert_eq!(core.cpu().bus().interrupts().read_flags() & joypad, 0);

        core.set_button(Button::Start as u8, false);
        assert_eq!(core.cpu().bus().interrupts().read_flags() & joypad, 0);

        core.set_button(Button::Start as u8, true);
        assert_ne!(core.cpu().bus().interrupts().read_flags() & joypad, 0);

        // Out-of-range index is ignored.
        core.set_button(8, true);
    }

    #[test]
    fn test_render_matches_frame_after_step() {
        let mut core = core_with_program(&SPIN);
        core.step_frame().expect("frame");
        assert_eq!(core.render(), *core.frame());
    }

    #[test]
    fn test_step_counts_cycles() {
        let mut core = core_with_program(&[0x00, 0x00]);
        assert_eq!(core.step(), Ok(1));
        assert_eq!(core.step(), Ok(1));
        assert_eq!(core.total_cycles(), 2);
        assert_eq!(core.instruction_count(), 2);
    }
}
