//! C-compatible FFI layer for iOS integration.
//!
//! Every function takes the opaque pointer returned by `gb_create` and
//! tolerates NULL. The header is generated by `build.rs`.

use std::ffi::c_void;
use std::ptr;
use std::slice;

use crate::core::GameBoyCore;
use crate::ppu::{FRAME_BYTES, SCREEN_HEIGHT, SCREEN_WIDTH};

/// Borrow the core behind a handle.
///
/// # Safety
/// `handle` must be NULL or a live pointer from `gb_create`.
unsafe fn core_ref<'a>(handle: *const c_void) -> Option<&'a GameBoyCore> {
    unsafe { (handle as *const GameBoyCore).as_ref() }
}

/// # Safety
/// As [`core_ref`], with no other reference to the core alive.
unsafe fn core_mut<'a>(handle: *mut c_void) -> Option<&'a mut GameBoyCore> {
    unsafe { (handle as *mut GameBoyCore).as_mut() }
}

/// Create a new emulator instance.
/// Returns an opaque pointer that must be freed with `gb_destroy`.
#[unsafe(no_mangle)]
pub extern "C" fn gb_create() -> *mut c_void {
    Box::into_raw(Box::new(GameBoyCore::new())) as *mut c_void
}

/// Destroy an emulator instance created by `gb_create`.
#[unsafe(no_mangle)]
pub extern "C" fn gb_destroy(handle: *mut c_void) {
    if !handle.is_null() {
        unsafe {
            drop(Box::from_raw(handle as *mut GameBoyCore));
        }
    }
}

/// Load a ROM. Returns false if the image is rejected or one is already loaded.
#[unsafe(no_mangle)]
pub extern "C" fn gb_load_rom(handle: *mut c_void, data: *const u8, len: usize) -> bool {
    if data.is_null() || len == 0 {
        return false;
    }
    let Some(gb) = (unsafe { core_mut(handle) }) else {
        return false;
    };
    let rom = unsafe { slice::from_raw_parts(data, len) };
    gb.load_rom(rom).is_ok()
}

/// Execute one instruction. Returns its machine cycles, or 0 on a fault.
#[unsafe(no_mangle)]
pub extern "C" fn gb_step(handle: *mut c_void) -> u32 {
    unsafe { core_mut(handle) }
        .and_then(|gb| gb.step().ok())
        .unwrap_or(0)
}

/// Run one frame. Returns false once the core has faulted.
#[unsafe(no_mangle)]
pub extern "C" fn gb_step_frame(handle: *mut c_void) -> bool {
    unsafe { core_mut(handle) }.is_some_and(|gb| gb.step_frame().is_ok())
}

/// Pointer to the last frame (160x144 RGBA), valid until the next
/// `gb_step_frame` or `gb_destroy`. NULL if handle is invalid.
#[unsafe(no_mangle)]
pub extern "C" fn gb_get_frame_buffer(handle: *const c_void) -> *const u8 {
    match unsafe { core_ref(handle) } {
        Some(gb) => gb.frame().as_bytes().as_ptr(),
        None => ptr::null(),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn gb_get_frame_buffer_size() -> usize {
    FRAME_BYTES
}

#[unsafe(no_mangle)]
pub extern "C" fn gb_get_screen_width() -> u32 {
    SCREEN_WIDTH as u32
}

#[unsafe(no_mangle)]
pub extern "C" fn gb_get_screen_height() -> u32 {
    SCREEN_HEIGHT as u32
}

/// Button values: 0=A, 1=B, 2=Select, 3=Start, 4=Right, 5=Left, 6=Up, 7=Down
#[unsafe(no_mangle)]
pub extern "C" fn gb_set_button(handle: *mut c_void, button: u8, pressed: bool) {
    if let Some(gb) = unsafe { core_mut(handle) } {
        gb.set_button(button, pressed);
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn gb_get_frame_count(handle: *const c_void) -> u32 {
    unsafe { core_ref(handle) }.map_or(0, GameBoyCore::frame_count)
}

/// Cartridge RAM (save data) size in bytes.
#[unsafe(no_mangle)]
pub extern "C" fn gb_get_save_size(handle: *const c_void) -> usize {
    unsafe { core_ref(handle) }.map_or(0, |gb| gb.cartridge_ram().len())
}

/// Copy cartridge RAM into `buffer`. Returns the number of bytes copied.
#[unsafe(no_mangle)]
pub extern "C" fn gb_get_save_data(handle: *const c_void, buffer: *mut u8, buffer_len: usize) -> usize {
    if buffer.is_null() {
        return 0;
    }
    let Some(gb) = (unsafe { core_ref(handle) }) else {
        return 0;
    };
    let ram = gb.cartridge_ram();
    let copy_len = ram.len().min(buffer_len);
    if copy_len > 0 {
        unsafe { ptr::copy_nonoverlapping(ram.as_ptr(), buffer, copy_len) };
    }
    copy_len
}

/// Restore cartridge RAM from `data`. Returns true on success.
#[unsafe(no_mangle)]
pub extern "C" fn gb_load_save_data(handle: *mut c_void, data: *const u8, len: usize) -> bool {
    if data.is_null() || len == 0 {
        return false;
    }
    let Some(gb) = (unsafe { core_mut(handle) }) else {
        return false;
    };
    let save = unsafe { slice::from_raw_parts(data, len) };
    gb.load_cartridge_ram(save);
    true
}

// Button constants for Swift
pub const GB_BUTTON_A: u8 = 0;
pub const GB_BUTTON_B: u8 = 1;
pub const GB_BUTTON_SELECT: u8 = 2;
pub const GB_BUTTON_START: u8 = 3;
pub const GB_BUTTON_RIGHT: u8 = 4;
pub const GB_BUTTON_LEFT: u8 = 5;
pub const GB_BUTTON_UP: u8 = 6;
pub const GB_BUTTON_DOWN: u8 = 7;
