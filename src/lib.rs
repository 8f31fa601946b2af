//! Cycle-accurate DMG Game Boy emulation core.
//!
//! The crate models the machine at machine-cycle (CPU) and dot (PPU)
//! granularity. Frontends drive it through the [`gameboy`] facade; the
//! bundled binary is a headless runner for test ROMs.

/// Pure arithmetic/logic operations with explicit flag effects.
pub mod alu;

/// Address decoding and routing between the CPU and the hardware blocks.
pub mod bus;

/// ROM image loading and header parsing.
pub mod cartridge;

/// LR35902 CPU core: fetch/decode/execute and interrupt delivery.
pub mod cpu;

/// Opcode decoding into cached instruction descriptors.
pub mod decoder;

/// Error type shared across the crate.
pub mod error;

/// Pixel FIFO ring buffers used by the PPU.
pub mod fifo;

/// High-level facade that wires the CPU and bus into a single machine.
pub mod gameboy;

/// Instruction descriptors, operands and execution results.
pub mod instruction;

/// Joypad input register and edge-triggered interrupt behavior.
pub mod joypad;

/// Pixel Processing Unit (PPU) emulation.
pub mod ppu;

/// CPU register file and flag helpers.
pub mod registers;

/// Serial transfer register pair.
pub mod serial;

/// Divider/timer unit.
pub mod timer;

pub use error::EmuError;
pub use gameboy::GameBoy;
