//! Monochrome Game Boy core.
//!
//! [`cpu::Cpu`] owns a [`bus::MemoryBus`], which routes every address to
//! exactly one of the cartridge, the picture unit or its own working memory.
//! [`GameBoyCore`] drives frames for hosts; `wasm` and `ffi` expose it.

pub mod bus;
pub mod cartridge;
pub mod config;
pub mod core;
pub mod cpu;
pub mod error;
pub mod interrupts;
pub mod joypad;
pub mod log;
pub mod ppu;
pub mod timer;

// FFI module for iOS/native builds
#[cfg(feature = "ios")]
pub mod ffi;

// WASM module for web builds
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::*;

pub use config::{CoreConfig, Shades};
pub use crate::core::GameBoyCore;
pub use error::{LoadError, StepError};
pub use ppu::Frame;
