//! Memory bus.
//!
//! Every CPU access goes through a fixed table of non-overlapping address
//! ranges that routes it to the owning hardware block. The last resolved
//! range is memoized, which short-circuits the common case of consecutive
//! accesses hitting the same region. Reads from unmapped or locked
//! addresses return the open-bus value; writes there are dropped.

use log::debug;

use crate::{cartridge::Cartridge, joypad::Joypad, ppu::Ppu, serial::Serial, timer::Timer};

/// Value returned for reads the bus cannot satisfy.
pub const OPEN_BUS: u8 = 0xFF;

/// An OAM DMA transfer occupies 160 machine cycles, during which the CPU
/// sees OAM as locked.
const DMA_DOTS: u32 = 640;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Rom,
    Vram,
    ExtRam,
    Wram,
    Echo,
    Oam,
    Unusable,
    Io,
    Hram,
    IntEnable,
}

struct Range {
    start: u16,
    end: u16,
    target: Target,
}

const RANGES: [Range; 11] = [
    Range { start: 0x0000, end: 0x3FFF, target: Target::Rom },
    Range { start: 0x4000, end: 0x7FFF, target: Target::Rom },
    Range { start: 0x8000, end: 0x9FFF, target: Target::Vram },
    Range { start: 0xA000, end: 0xBFFF, target: Target::ExtRam },
    Range { start: 0xC000, end: 0xDFFF, target: Target::Wram },
    Range { start: 0xE000, end: 0xFDFF, target: Target::Echo },
    Range { start: 0xFE00, end: 0xFE9F, target: Target::Oam },
    Range { start: 0xFEA0, end: 0xFEFF, target: Target::Unusable },
    Range { start: 0xFF00, end: 0xFF7F, target: Target::Io },
    Range { start: 0xFF80, end: 0xFFFE, target: Target::Hram },
    Range { start: 0xFFFF, end: 0xFFFF, target: Target::IntEnable },
];

pub struct Bus {
    rom: Box<[u8; 0x8000]>,
    ext_ram: Box<[u8; 0x2000]>,
    wram: Box<[u8; 0x2000]>,
    hram: [u8; 0x7F],
    /// Pending interrupt requests (low five bits).
    pub if_reg: u8,
    /// Interrupt enable mask.
    pub ie_reg: u8,
    pub ppu: Ppu,
    pub timer: Timer,
    pub joypad: Joypad,
    pub serial: Serial,
    pub cart: Option<Cartridge>,
    /// Dots left on the in-flight OAM DMA, zero when idle.
    dma_dots: u32,
    last_range: Option<usize>,
}

impl Bus {
    pub fn new() -> Self {
        Self {
            rom: Box::new([OPEN_BUS; 0x8000]),
            ext_ram: Box::new([0; 0x2000]),
            wram: Box::new([0; 0x2000]),
            hram: [0; 0x7F],
            if_reg: 0x01,
            ie_reg: 0,
            ppu: Ppu::new(),
            timer: Timer::new(),
            joypad: Joypad::new(),
            serial: Serial::new(),
            cart: None,
            dma_dots: 0,
            last_range: None,
        }
    }

    /// Copy a cartridge's ROM image onto the bus and keep the cartridge
    /// around for resets.
    pub fn load_cart(&mut self, cart: Cartridge) {
        let len = cart.rom.len().min(self.rom.len());
        self.rom[..len].copy_from_slice(&cart.rom[..len]);
        self.cart = Some(cart);
    }

    fn resolve(&mut self, addr: u16) -> Target {
        if let Some(idx) = self.last_range {
            let range = &RANGES[idx];
            if addr >= range.start && addr <= range.end {
                return range.target;
            }
        }
        // The table covers the full address space.
        let idx = RANGES
            .iter()
            .position(|r| addr >= r.start && addr <= r.end)
            .unwrap_or(0);
        self.last_range = Some(idx);
        RANGES[idx].target
    }

    pub fn get(&mut self, addr: u16) -> u8 {
        self.read(addr, false)
    }

    /// `bypass` lets the DMA engine read through the PPU access locks.
    fn read(&mut self, addr: u16, bypass: bool) -> u8 {
        match self.resolve(addr) {
            Target::Rom => self.rom[addr as usize],
            Target::Vram => {
                if bypass || self.ppu.vram_accessible {
                    self.ppu.vram[(addr - 0x8000) as usize]
                } else {
                    OPEN_BUS
                }
            }
            Target::ExtRam => self.ext_ram[(addr - 0xA000) as usize],
            Target::Wram => self.wram[(addr - 0xC000) as usize],
            Target::Echo => self.wram[(addr - 0xE000) as usize],
            Target::Oam => {
                if bypass || (self.dma_dots == 0 && self.ppu.oam_accessible) {
                    self.ppu.oam[(addr - 0xFE00) as usize]
                } else {
                    OPEN_BUS
                }
            }
            Target::Unusable => OPEN_BUS,
            Target::Io => self.read_io(addr),
            Target::Hram => self.hram[(addr - 0xFF80) as usize],
            Target::IntEnable => self.ie_reg,
        }
    }

    pub fn set(&mut self, addr: u16, val: u8) {
        match self.resolve(addr) {
            Target::Rom => {
                debug!("dropped write of {val:#04x} to ROM at {addr:#06x}");
            }
            Target::Vram => {
                if self.ppu.vram_accessible {
                    self.ppu.vram[(addr - 0x8000) as usize] = val;
                }
            }
            Target::ExtRam => self.ext_ram[(addr - 0xA000) as usize] = val,
            Target::Wram => self.wram[(addr - 0xC000) as usize] = val,
            Target::Echo => self.wram[(addr - 0xE000) as usize] = val,
            Target::Oam => {
                if self.dma_dots == 0 && self.ppu.oam_accessible {
                    self.ppu.oam[(addr - 0xFE00) as usize] = val;
                }
            }
            Target::Unusable => {}
            Target::Io => self.write_io(addr, val),
            Target::Hram => self.hram[(addr - 0xFF80) as usize] = val,
            Target::IntEnable => self.ie_reg = val,
        }
    }

    /// Little-endian 16-bit read.
    pub fn get16(&mut self, addr: u16) -> u16 {
        let lo = self.get(addr);
        let hi = self.get(addr.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    /// Little-endian 16-bit write.
    pub fn set16(&mut self, addr: u16, val: u16) {
        let [lo, hi] = val.to_le_bytes();
        self.set(addr, lo);
        self.set(addr.wrapping_add(1), hi);
    }

    /// Write a buffer to consecutive addresses through the normal routing.
    pub fn copy(&mut self, addr: u16, data: &[u8]) {
        for (i, byte) in data.iter().enumerate() {
            self.set(addr.wrapping_add(i as u16), *byte);
        }
    }

    fn read_io(&mut self, addr: u16) -> u8 {
        match addr {
            0xFF00 => self.joypad.read(),
            0xFF01 | 0xFF02 => self.serial.read(addr),
            0xFF04..=0xFF07 => self.timer.read(addr),
            0xFF0F => self.if_reg | 0xE0,
            0xFF40..=0xFF4B => self.ppu.read_reg(addr),
            _ => OPEN_BUS,
        }
    }

    fn write_io(&mut self, addr: u16, val: u8) {
        match addr {
            0xFF00 => self.joypad.write(val),
            0xFF01 | 0xFF02 => self.serial.write(addr, val),
            0xFF04..=0xFF07 => self.timer.write(addr, val, &mut self.if_reg),
            0xFF0F => self.if_reg = val & 0x1F,
            0xFF46 => self.start_dma(val),
            0xFF40..=0xFF4B => self.ppu.write_reg(addr, val, &mut self.if_reg),
            _ => {}
        }
    }

    /// Kick off an OAM DMA from `val << 8`. The copy happens up front;
    /// the countdown only models how long OAM stays locked to the CPU.
    fn start_dma(&mut self, val: u8) {
        self.ppu.dma = val;
        let src = (val as u16) << 8;
        for i in 0..0xA0u16 {
            let byte = self.read(src.wrapping_add(i), true);
            self.ppu.oam[i as usize] = byte;
        }
        self.dma_dots = DMA_DOTS;
    }

    /// Wind down an in-flight OAM DMA.
    pub fn dma_tick(&mut self, dots: u32) {
        self.dma_dots = self.dma_dots.saturating_sub(dots);
    }

    pub fn dma_active(&self) -> bool {
        self.dma_dots > 0
    }

    /// Requests that are both pending and enabled.
    pub fn pending_interrupts(&self) -> u8 {
        self.if_reg & self.ie_reg & 0x1F
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}
