//! High-level facade wiring the CPU and bus into a single machine.

use crate::{bus::Bus, cartridge::Cartridge, cpu::Cpu, error::EmuError};

/// One machine cycle is four dots.
pub const DOTS_PER_CYCLE: u32 = 4;

/// Dots in one complete frame (154 lines of 456 dots).
pub const DOTS_PER_FRAME: u32 = 70224;

pub struct GameBoy {
    pub cpu: Cpu,
    pub bus: Bus,
}

impl GameBoy {
    /// A machine in the post-boot-ROM state, ready to run from 0x0100.
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            bus: Bus::new(),
        }
    }

    pub fn load_cartridge(&mut self, cart: Cartridge) {
        self.bus.load_cart(cart);
    }

    /// Reset to the post-boot state, keeping the loaded cartridge.
    pub fn reset(&mut self) {
        let cart = self.bus.cart.take();
        self.cpu = Cpu::new();
        self.bus = Bus::new();
        if let Some(c) = cart {
            self.bus.load_cart(c);
        }
    }

    /// Run one CPU step and bring every peripheral forward by the dots it
    /// consumed. The order is fixed: CPU, timer, PPU, DMA countdown,
    /// serial. Returns the machine cycles spent.
    pub fn step(&mut self) -> Result<u32, EmuError> {
        let result = self.cpu.step(&mut self.bus)?;
        let dots = result.cycles * DOTS_PER_CYCLE;
        self.bus.timer.tick(dots, &mut self.bus.if_reg);
        self.bus.ppu.tick(dots, &mut self.bus.if_reg);
        self.bus.dma_tick(dots);
        self.bus.serial.tick(dots, &mut self.bus.if_reg);
        Ok(result.cycles)
    }

    /// Step until the PPU finishes a frame, or until a frame's worth of
    /// dots has elapsed. The dot bound keeps callers moving while the LCD
    /// is disabled, since a parked PPU never completes a frame.
    pub fn step_frame(&mut self) -> Result<(), EmuError> {
        let mut budget = DOTS_PER_FRAME;
        while !self.bus.ppu.frame_ready() {
            let cycles = self.step()?;
            budget = budget.saturating_sub(cycles * DOTS_PER_CYCLE);
            if budget == 0 {
                break;
            }
        }
        self.bus.ppu.clear_frame_flag();
        Ok(())
    }

    /// The last completed frame: one 2-bit shade per pixel, row-major.
    pub fn framebuffer(&self) -> &[u8] {
        self.bus.ppu.framebuffer()
    }
}

impl Default for GameBoy {
    fn default() -> Self {
        Self::new()
    }
}
