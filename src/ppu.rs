//! Pixel Processing Unit.
//!
//! The PPU is driven one dot at a time (4 dots per machine cycle). Each
//! scanline is 456 dots: an 80-dot OAM scan, a variable-length draw phase
//! that streams pixels through the background and sprite FIFOs, and an
//! H-blank that soaks up whatever remains of the line. After 144 visible
//! lines the machine idles through 10 lines of V-blank, giving the fixed
//! 70224-dot frame.
//!
//! Fixed-length phases are modelled with a countdown: entering a phase
//! performs its work up front and charges its duration in dots; the state
//! function only runs again on the phase's final dot to transition.

use crate::fifo::PixelFifo;

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;

/// Dots per scanline, all modes included.
pub const LINE_DOTS: u32 = 456;
/// Fixed length of the OAM scan phase.
pub const OAM_SCAN_DOTS: u32 = 80;
/// Last V-blank line number.
const LAST_LINE: u8 = 153;

const LCDC_BG_ENABLE: u8 = 0x01;
const LCDC_OBJ_ENABLE: u8 = 0x02;
const LCDC_OBJ_SIZE: u8 = 0x04;
const LCDC_BG_MAP: u8 = 0x08;
const LCDC_TILE_DATA: u8 = 0x10;
const LCDC_WIN_ENABLE: u8 = 0x20;
const LCDC_WIN_MAP: u8 = 0x40;
const LCDC_ENABLE: u8 = 0x80;

const OAM_PALETTE: u8 = 0x10;
const OAM_X_FLIP: u8 = 0x20;
const OAM_Y_FLIP: u8 = 0x40;
const OAM_PRIORITY: u8 = 0x80;

/// Background FIFO pixels carry the palette-resolved shade in the low two
/// bits plus a marker for source color zero (sprites draw over it even
/// when flagged as behind the background).
const PX_BG_ZERO: u8 = 0x04;
/// Sprite FIFO markers: transparent slot, and "behind non-zero background".
const OBJ_TRANSPARENT: u8 = 0x80;
const OBJ_BEHIND_BG: u8 = 0x40;

/// PPU mode, numbered as reported in the STAT low bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    HBlank = 0,
    VBlank = 1,
    OamScan = 2,
    Draw = 3,
}

#[derive(Debug, Clone, Copy, Default)]
struct Sprite {
    /// Leftmost screen column (OAM X minus 8); negative when the sprite
    /// hangs off the left edge.
    x: i16,
    /// Top screen line (OAM Y minus 16).
    y: i16,
    tile: u8,
    flags: u8,
    fetched: bool,
}

pub struct Ppu {
    pub vram: [u8; 0x2000],
    pub oam: [u8; 0xA0],

    lcdc: u8,
    /// STAT interrupt-enable bits only; mode and coincidence are live.
    stat: u8,
    scy: u8,
    scx: u8,
    ly: u8,
    lyc: u8,
    pub dma: u8,
    bgp: u8,
    obp0: u8,
    obp1: u8,
    wy: u8,
    wx: u8,

    pub mode: Mode,
    /// Dots left before the current fixed-length phase ends.
    wait_dots: u32,
    /// Dots elapsed on the current scanline.
    line_dots: u32,
    /// Output column within the draw phase.
    lx: u8,
    /// Leading pixels to drop for sub-tile horizontal scroll.
    discard: u8,
    /// Tiles fetched so far on this line (or since the window switch).
    fetcher_x: u8,
    window_active: bool,
    /// The window's own line counter; only advances on lines it drew.
    win_line: u8,

    bg_fifo: PixelFifo,
    obj_fifo: PixelFifo,
    sprites: [Sprite; 40],
    sprite_count: usize,

    /// 2-bit shades, one byte per pixel, row-major.
    framebuffer: [u8; SCREEN_WIDTH * SCREEN_HEIGHT],
    frame_ready: bool,
    frames: u64,

    /// Previous level of the STAT interrupt line; IRQs fire on rising edge.
    stat_irq_line: bool,
    lyc_eq_ly: bool,

    /// CPU access windows, toggled on mode transitions.
    pub vram_accessible: bool,
    pub oam_accessible: bool,
}

impl Ppu {
    pub fn new() -> Self {
        let mut ppu = Self {
            vram: [0; 0x2000],
            oam: [0; 0xA0],
            lcdc: 0x91,
            stat: 0,
            scy: 0,
            scx: 0,
            ly: 0,
            lyc: 0,
            dma: 0xFF,
            bgp: 0xFC,
            obp0: 0,
            obp1: 0,
            wy: 0,
            wx: 0,
            mode: Mode::OamScan,
            wait_dots: 0,
            line_dots: 0,
            lx: 0,
            discard: 0,
            fetcher_x: 0,
            window_active: false,
            win_line: 0,
            bg_fifo: PixelFifo::new(),
            obj_fifo: PixelFifo::new(),
            sprites: [Sprite::default(); 40],
            sprite_count: 0,
            framebuffer: [0; SCREEN_WIDTH * SCREEN_HEIGHT],
            frame_ready: false,
            frames: 0,
            stat_irq_line: false,
            lyc_eq_ly: false,
            vram_accessible: true,
            oam_accessible: true,
        };
        ppu.enter_oam_scan();
        ppu
    }

    /// Advance the PPU by `dots` dots, raising V-blank/STAT requests in
    /// `if_reg` as they occur.
    pub fn tick(&mut self, dots: u32, if_reg: &mut u8) {
        for _ in 0..dots {
            self.tick_dot(if_reg);
        }
    }

    fn tick_dot(&mut self, if_reg: &mut u8) {
        if self.lcdc & LCDC_ENABLE == 0 {
            return;
        }
        self.line_dots += 1;
        if self.wait_dots > 0 {
            self.wait_dots -= 1;
        } else {
            match self.mode {
                Mode::OamScan => {
                    self.enter_draw();
                    self.draw_dot();
                }
                Mode::Draw => self.draw_dot(),
                Mode::HBlank => self.end_line(if_reg),
                Mode::VBlank => self.vblank_line(),
            }
        }
        self.refresh_stat(if_reg);
    }

    // ---- phase transitions ----

    fn enter_oam_scan(&mut self) {
        self.mode = Mode::OamScan;
        self.line_dots = 0;
        self.wait_dots = OAM_SCAN_DOTS;
        self.vram_accessible = true;
        self.oam_accessible = false;
        self.window_active = false;
        self.scan_oam();
    }

    fn enter_draw(&mut self) {
        self.mode = Mode::Draw;
        self.wait_dots = 0;
        self.vram_accessible = false;
        self.oam_accessible = false;
        self.lx = 0;
        self.fetcher_x = 0;
        self.discard = self.scx & 7;
        self.bg_fifo.clear();
        self.obj_fifo.clear();
    }

    fn enter_hblank(&mut self) {
        self.mode = Mode::HBlank;
        self.vram_accessible = true;
        self.oam_accessible = true;
        // Whatever the draw phase did not spend of the line is H-blank.
        self.wait_dots = (LINE_DOTS - 1).saturating_sub(self.line_dots);
    }

    fn end_line(&mut self, if_reg: &mut u8) {
        if self.window_active {
            self.win_line = self.win_line.wrapping_add(1);
        }
        self.ly += 1;
        if self.ly as usize == SCREEN_HEIGHT {
            self.enter_vblank(if_reg);
        } else {
            self.enter_oam_scan();
        }
    }

    fn enter_vblank(&mut self, if_reg: &mut u8) {
        self.mode = Mode::VBlank;
        self.line_dots = 0;
        self.wait_dots = LINE_DOTS - 1;
        self.vram_accessible = true;
        self.oam_accessible = true;
        *if_reg |= 0x01;
        self.frame_ready = true;
        self.frames += 1;
    }

    fn vblank_line(&mut self) {
        self.ly += 1;
        self.line_dots = 0;
        if self.ly > LAST_LINE {
            self.ly = 0;
            self.win_line = 0;
            self.enter_oam_scan();
        } else {
            self.wait_dots = LINE_DOTS - 1;
        }
    }

    /// Collect every sprite whose vertical extent crosses the current line,
    /// in OAM order.
    fn scan_oam(&mut self) {
        self.sprite_count = 0;
        let height: i16 = if self.lcdc & LCDC_OBJ_SIZE != 0 { 16 } else { 8 };
        let line = self.ly as i16;
        for entry in 0..40 {
            let base = entry * 4;
            let y = self.oam[base] as i16 - 16;
            if line < y || line >= y + height {
                continue;
            }
            self.sprites[self.sprite_count] = Sprite {
                x: self.oam[base + 1] as i16 - 8,
                y,
                tile: self.oam[base + 2],
                flags: self.oam[base + 3],
                fetched: false,
            };
            self.sprite_count += 1;
        }
    }

    // ---- draw phase ----

    fn draw_dot(&mut self) {
        self.maybe_activate_window();
        if self.bg_fifo.can_push() {
            self.fetch_tile_row();
        }
        if !self.bg_fifo.can_pop() {
            return;
        }
        if self.discard > 0 {
            self.bg_fifo.pop();
            self.discard -= 1;
            return;
        }
        if self.lcdc & LCDC_OBJ_ENABLE != 0 {
            self.fetch_pending_sprites();
        }
        let bg = self.bg_fifo.pop();
        let obj = self.obj_fifo.pop_any();
        let shade = self.composite(bg, obj);
        self.framebuffer[self.ly as usize * SCREEN_WIDTH + self.lx as usize] = shade;
        self.lx += 1;
        if self.lx as usize == SCREEN_WIDTH {
            self.enter_hblank();
        }
    }

    /// Switch to window fetching the first time the output column enters
    /// the window's area on a line at or below its top. The background
    /// FIFO restarts from the window's own tile map.
    fn maybe_activate_window(&mut self) {
        if self.window_active || self.lcdc & LCDC_WIN_ENABLE == 0 {
            return;
        }
        if self.ly < self.wy || (self.lx as i16) < self.wx as i16 - 7 {
            return;
        }
        self.window_active = true;
        self.bg_fifo.clear();
        self.discard = 0;
        self.fetcher_x = 0;
    }

    /// Decode one 8-pixel tile row into the background FIFO.
    fn fetch_tile_row(&mut self) {
        let (map_base, map_x, map_y, tile_y) = if self.window_active {
            let base: usize = if self.lcdc & LCDC_WIN_MAP != 0 { 0x1C00 } else { 0x1800 };
            (
                base,
                self.fetcher_x & 31,
                (self.win_line / 8) as usize,
                self.win_line & 7,
            )
        } else {
            let base: usize = if self.lcdc & LCDC_BG_MAP != 0 { 0x1C00 } else { 0x1800 };
            let y = self.ly.wrapping_add(self.scy);
            (
                base,
                (self.scx / 8).wrapping_add(self.fetcher_x) & 31,
                (y / 8) as usize,
                y & 7,
            )
        };
        let tile_id = self.vram[map_base + map_y * 32 + map_x as usize];
        let row = self.tile_row_addr(tile_id) + tile_y as usize * 2;
        let lo = self.vram[row];
        let hi = self.vram[row + 1];
        for bit in (0..8).rev() {
            let id = ((hi >> bit) & 1) << 1 | ((lo >> bit) & 1);
            let mut pixel = (self.bgp >> (id * 2)) & 0x03;
            if id == 0 {
                pixel |= PX_BG_ZERO;
            }
            self.bg_fifo.push(pixel);
        }
        self.fetcher_x = self.fetcher_x.wrapping_add(1);
    }

    /// Tile bitmap base for the background/window, honoring the LCDC
    /// addressing mode: unsigned from block 0, or signed around block 2.
    fn tile_row_addr(&self, id: u8) -> usize {
        if self.lcdc & LCDC_TILE_DATA != 0 {
            id as usize * 16
        } else {
            (0x1000 + (id as i8 as i32) * 16) as usize
        }
    }

    /// Fetch every collected sprite whose left edge has been reached,
    /// merging its row into the sprite FIFO. Earlier arrivals keep their
    /// opaque pixels, so the leftmost sprite wins overlaps.
    fn fetch_pending_sprites(&mut self) {
        for i in 0..self.sprite_count {
            if self.sprites[i].fetched || self.sprites[i].x > self.lx as i16 {
                continue;
            }
            self.sprites[i].fetched = true;
            let sprite = self.sprites[i];
            self.fetch_sprite_row(&sprite);
        }
    }

    fn fetch_sprite_row(&mut self, sprite: &Sprite) {
        let height: u8 = if self.lcdc & LCDC_OBJ_SIZE != 0 { 16 } else { 8 };
        let mut row = (self.ly as i16 - sprite.y) as u8;
        if sprite.flags & OAM_Y_FLIP != 0 {
            row = height - 1 - row;
        }
        let mut tile = sprite.tile;
        if height == 16 {
            // Tall sprites ignore the tile index low bit; rows 8-15 run
            // into the next tile.
            tile &= 0xFE;
        }
        let addr = tile as usize * 16 + row as usize * 2;
        let lo = self.vram[addr];
        let hi = self.vram[addr + 1];
        let palette = if sprite.flags & OAM_PALETTE != 0 {
            self.obp1
        } else {
            self.obp0
        };
        // Columns already behind the output position are dropped (sprites
        // clipped by the left screen edge).
        let skip = (self.lx as i16 - sprite.x) as usize;
        for px in skip..8 {
            let bit = if sprite.flags & OAM_X_FLIP != 0 { px } else { 7 - px };
            let id = ((hi >> bit) & 1) << 1 | ((lo >> bit) & 1);
            let pixel = if id == 0 {
                OBJ_TRANSPARENT
            } else {
                let mut p = (palette >> (id * 2)) & 0x03;
                if sprite.flags & OAM_PRIORITY != 0 {
                    p |= OBJ_BEHIND_BG;
                }
                p
            };
            let slot = px - skip;
            if slot < self.obj_fifo.len() {
                if self.obj_fifo.get(slot) & OBJ_TRANSPARENT != 0 {
                    self.obj_fifo.set(slot, pixel);
                }
            } else {
                self.obj_fifo.push(pixel);
            }
        }
    }

    fn composite(&self, bg: u8, obj: Option<u8>) -> u8 {
        let (bg_shade, bg_zero) = if self.lcdc & LCDC_BG_ENABLE != 0 {
            (bg & 0x03, bg & PX_BG_ZERO != 0)
        } else {
            // Background disabled draws as transparent white.
            (0, true)
        };
        if self.lcdc & LCDC_OBJ_ENABLE != 0
            && let Some(o) = obj
            && o & OBJ_TRANSPARENT == 0
            && (o & OBJ_BEHIND_BG == 0 || bg_zero)
        {
            return o & 0x03;
        }
        bg_shade
    }

    // ---- STAT interrupt line ----

    /// Recompute the STAT interrupt line. The line is the OR of the
    /// enabled mode conditions and the LY=LYC coincidence; a request is
    /// raised only on its rising edge.
    fn refresh_stat(&mut self, if_reg: &mut u8) {
        self.lyc_eq_ly = self.ly == self.lyc;
        let mode_irq = match self.mode {
            Mode::HBlank => self.stat & 0x08 != 0,
            Mode::VBlank => self.stat & 0x10 != 0,
            Mode::OamScan => self.stat & 0x20 != 0,
            Mode::Draw => false,
        };
        let line = mode_irq || (self.lyc_eq_ly && self.stat & 0x40 != 0);
        if line && !self.stat_irq_line {
            *if_reg |= 0x02;
        }
        self.stat_irq_line = line;
    }

    // ---- register file ----

    pub fn read_reg(&self, addr: u16) -> u8 {
        match addr {
            0xFF40 => self.lcdc,
            0xFF41 => 0x80 | self.stat | (self.lyc_eq_ly as u8) << 2 | self.mode as u8,
            0xFF42 => self.scy,
            0xFF43 => self.scx,
            0xFF44 => self.ly,
            0xFF45 => self.lyc,
            0xFF46 => self.dma,
            0xFF47 => self.bgp,
            0xFF48 => self.obp0,
            0xFF49 => self.obp1,
            0xFF4A => self.wy,
            0xFF4B => self.wx,
            _ => 0xFF,
        }
    }

    pub fn write_reg(&mut self, addr: u16, val: u8, if_reg: &mut u8) {
        match addr {
            0xFF40 => {
                let was_on = self.lcdc & LCDC_ENABLE != 0;
                self.lcdc = val;
                let now_on = self.lcdc & LCDC_ENABLE != 0;
                if was_on && !now_on {
                    // Turning the LCD off parks the PPU at line 0, H-blank,
                    // with both memories open.
                    self.ly = 0;
                    self.win_line = 0;
                    self.mode = Mode::HBlank;
                    self.line_dots = 0;
                    self.wait_dots = 0;
                    self.window_active = false;
                    self.vram_accessible = true;
                    self.oam_accessible = true;
                } else if !was_on && now_on {
                    self.enter_oam_scan();
                }
                self.refresh_stat(if_reg);
            }
            0xFF41 => {
                self.stat = val & 0x78;
                self.refresh_stat(if_reg);
            }
            0xFF42 => self.scy = val,
            0xFF43 => self.scx = val,
            // LY is read-only.
            0xFF44 => {}
            0xFF45 => {
                self.lyc = val;
                self.refresh_stat(if_reg);
            }
            // The transfer itself is carried out by the bus.
            0xFF46 => self.dma = val,
            0xFF47 => self.bgp = val,
            0xFF48 => self.obp0 = val,
            0xFF49 => self.obp1 = val,
            0xFF4A => self.wy = val,
            0xFF4B => self.wx = val,
            _ => {}
        }
    }

    // ---- frontend access ----

    pub fn framebuffer(&self) -> &[u8] {
        &self.framebuffer
    }

    pub fn frame_ready(&self) -> bool {
        self.frame_ready
    }

    pub fn clear_frame_flag(&mut self) {
        self.frame_ready = false;
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn ly(&self) -> u8 {
        self.ly
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}
