use std::io;

use thiserror::Error;

/// Fatal emulation errors surfaced to the frontend.
#[derive(Debug, Error)]
pub enum EmuError {
    /// The CPU fetched an opcode with no defined instruction. The eleven
    /// holes in the base opcode space lock up real hardware, so execution
    /// cannot meaningfully continue past one.
    #[error("unrecognized opcode {opcode:#04x}")]
    UnknownOpcode { opcode: u8 },

    /// A cartridge image could not be read from disk.
    #[error("failed to load cartridge: {0}")]
    Cartridge(#[from] io::Error),
}
