//! WASM bindings for the web front end.

use wasm_bindgen::prelude::*;

use crate::core::GameBoyCore;
use crate::log::LogCategory;
use crate::log_info;

/// Initialize panic hook for better error messages in WASM.
/// This is called once when the WASM module is instantiated.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

#[wasm_bindgen]
pub struct GameBoy {
    core: GameBoyCore,
}

#[wasm_bindgen]
impl GameBoy {
    #[wasm_bindgen(constructor)]
    pub fn new() -> GameBoy {
        log_info!(LogCategory::General, "GameBoy::new() - Creating emulator instance");
        GameBoy {
            core: GameBoyCore::new(),
        }
    }

    pub fn load_rom(&mut self, rom_data: &[u8]) -> Result<(), JsValue> {
        self.core
            .load_rom(rom_data)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Run one frame. A fault is reported to JS once and on every later call.
    pub fn step_frame(&mut self) -> Result<u32, JsValue> {
        self.core
            .step_frame()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn frame_buffer_ptr(&self) -> *const u8 {
        self.core.frame().as_bytes().as_ptr()
    }

    pub fn frame_buffer_len(&self) -> usize {
        self.core.frame().as_bytes().len()
    }

    /// Button values: 0=A, 1=B, 2=Select, 3=Start, 4=Right, 5=Left, 6=Up, 7=Down
    pub fn set_button(&mut self, button: u8, pressed: bool) {
        self.core.set_button(button, pressed);
    }

    pub fn get_cartridge_ram(&self) -> Vec<u8> {
        self.core.cartridge_ram().to_vec()
    }

    pub fn load_cartridge_ram(&mut self, data: &[u8]) {
        self.core.load_cartridge_ram(data);
    }

    /// Drain serial output as text (test ROMs print through the link port).
    pub fn take_serial_output(&mut self) -> String {
        String::from_utf8_lossy(&self.core.take_serial_output()).into_owned()
    }

    pub fn get_debug_info(&self) -> String {
        let cpu = self.core.cpu();
        let info = format!(
            "{} | {} | {}",
            cpu.get_debug_state(),
            cpu.bus().ppu().get_debug_state(),
            cpu.bus().cartridge().debug_state()
        );
        log_info!(LogCategory::General, "{}", info);
        info
    }

    pub fn get_frame_count(&self) -> u32 {
        self.core.frame_count()
    }

    pub fn get_instruction_count(&self) -> u64 {
        self.core.instruction_count()
    }
}

impl Default for GameBoy {
    fn default() -> Self {
        Self::new()
    }
}
