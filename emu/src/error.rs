//! Error types surfaced by program loading and instruction stepping.

use thiserror::Error;

/// Failure to accept a program image. A failed load leaves the session as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("program image is empty")]
    Empty,
    #[error("program image is {len} bytes, shorter than the 0x150-byte cartridge header")]
    TooSmall { len: usize },
    #[error("unsupported cartridge type 0x{0:02X}")]
    UnsupportedCartridge(u8),
    #[error("invalid external RAM size code 0x{0:02X}")]
    InvalidRamSize(u8),
    #[error("a program image is already loaded for this session")]
    AlreadyLoaded,
}

/// Failure of a single `step`. Unimplemented opcodes are fatal for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StepError {
    #[error("unimplemented opcode 0x{opcode:02X} at 0x{address:04X}")]
    UnimplementedOpcode { opcode: u8, address: u16 },
    #[error("unimplemented extended opcode 0xCB 0x{opcode:02X} at 0x{address:04X}")]
    UnimplementedExtended { opcode: u8, address: u16 },
    #[error("no program image loaded")]
    NoCartridge,
}

impl StepError {
    /// True for faults caused by an incomplete instruction set rather than host misuse.
    pub fn is_unimplemented(&self) -> bool {
        matches!(
            self,
            StepError::UnimplementedOpcode { .. } | StepError::UnimplementedExtended { .. }
        )
    }
}
