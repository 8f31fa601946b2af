use dotmatrix::bus::{Bus, OPEN_BUS};
use dotmatrix::ppu::{LINE_DOTS, Mode, OAM_SCAN_DOTS, Ppu, SCREEN_WIDTH};

/// Fill one tile's bitmap with the same bitplane pair on every row.
fn solid_tile(ppu: &mut Ppu, index: usize, lo: u8, hi: u8) {
    for row in 0..8 {
        ppu.vram[index * 16 + row * 2] = lo;
        ppu.vram[index * 16 + row * 2 + 1] = hi;
    }
}

#[test]
fn a_frame_is_70224_dots() {
    let mut ppu = Ppu::new();
    let mut if_reg = 0;
    ppu.tick(70224, &mut if_reg);
    assert_eq!(ppu.frames(), 1);
    assert_eq!(ppu.ly(), 0);
    assert_eq!(ppu.mode, Mode::OamScan);
    // Exactly one V-blank request, no STAT sources enabled.
    assert_eq!(if_reg, 0x01);
    assert!(ppu.frame_ready());
}

#[test]
fn scanline_walks_through_the_modes() {
    let mut ppu = Ppu::new();
    let mut if_reg = 0;

    ppu.tick(OAM_SCAN_DOTS, &mut if_reg);
    assert_eq!(ppu.mode, Mode::OamScan);
    ppu.tick(1, &mut if_reg);
    assert_eq!(ppu.mode, Mode::Draw);

    // One priming dot, then a pixel per dot with no scroll.
    ppu.tick(SCREEN_WIDTH as u32, &mut if_reg);
    assert_eq!(ppu.mode, Mode::HBlank);

    let spent = OAM_SCAN_DOTS + 1 + SCREEN_WIDTH as u32;
    ppu.tick(LINE_DOTS - spent, &mut if_reg);
    assert_eq!(ppu.ly(), 1);
    assert_eq!(ppu.mode, Mode::OamScan);
}

#[test]
fn vblank_spans_ten_lines() {
    let mut ppu = Ppu::new();
    let mut if_reg = 0;
    ppu.tick(LINE_DOTS * 144, &mut if_reg);
    assert_eq!(ppu.mode, Mode::VBlank);
    assert_eq!(ppu.ly(), 144);
    ppu.tick(LINE_DOTS * 9, &mut if_reg);
    assert_eq!(ppu.mode, Mode::VBlank);
    assert_eq!(ppu.ly(), 153);
    ppu.tick(LINE_DOTS, &mut if_reg);
    assert_eq!(ppu.mode, Mode::OamScan);
    assert_eq!(ppu.ly(), 0);
}

#[test]
fn oam_and_vram_lock_with_the_mode() {
    let mut bus = Bus::new();
    let mut if_reg = 0;

    // Fresh PPU is in OAM scan: OAM locked, VRAM open.
    assert_eq!(bus.get(0xFE00), OPEN_BUS);
    bus.set(0xFE00, 0x12);
    assert_eq!(bus.ppu.oam[0], 0);
    bus.set(0x8000, 0x34);
    assert_eq!(bus.ppu.vram[0], 0x34);

    // Draw phase locks VRAM too.
    bus.ppu.tick(81, &mut if_reg);
    assert_eq!(bus.ppu.mode, Mode::Draw);
    assert_eq!(bus.get(0x8000), OPEN_BUS);
    bus.set(0x8000, 0x56);
    assert_eq!(bus.ppu.vram[0], 0x34);

    // H-blank opens everything back up.
    bus.ppu.tick(160 + 10, &mut if_reg);
    assert_eq!(bus.ppu.mode, Mode::HBlank);
    assert_eq!(bus.get(0x8000), 0x34);
    bus.set(0xFE00, 0x12);
    assert_eq!(bus.get(0xFE00), 0x12);
}

#[test]
fn lyc_coincidence_raises_stat() {
    let mut ppu = Ppu::new();
    let mut if_reg = 0;
    ppu.write_reg(0xFF45, 5, &mut if_reg);
    ppu.write_reg(0xFF41, 0x40, &mut if_reg);
    assert_eq!(if_reg, 0);

    ppu.tick(LINE_DOTS * 5, &mut if_reg);
    assert_eq!(ppu.ly(), 5);
    assert_eq!(if_reg & 0x02, 0x02);
    // Coincidence bit reads back in STAT.
    assert_eq!(ppu.read_reg(0xFF41) & 0x04, 0x04);
}

#[test]
fn stat_requests_only_on_rising_edges() {
    let mut ppu = Ppu::new();
    let mut if_reg = 0;
    ppu.write_reg(0xFF45, 5, &mut if_reg);
    ppu.write_reg(0xFF41, 0x40, &mut if_reg);
    ppu.tick(LINE_DOTS * 5, &mut if_reg);
    assert_eq!(if_reg & 0x02, 0x02);

    // The line stays high for the rest of the scanline; no new request.
    if_reg = 0;
    ppu.tick(LINE_DOTS - 1, &mut if_reg);
    assert_eq!(if_reg & 0x02, 0);
}

#[test]
fn background_tiles_render_through_the_palette() {
    let mut ppu = Ppu::new();
    let mut if_reg = 0;
    // Default LCDC: background on, unsigned tile data, map at 0x9800.
    ppu.write_reg(0xFF47, 0xE4, &mut if_reg);
    solid_tile(&mut ppu, 1, 0xFF, 0xFF); // color 3 everywhere
    ppu.vram[0x1800] = 1; // top-left map cell

    ppu.tick(70224, &mut if_reg);
    let fb = ppu.framebuffer();
    assert_eq!(&fb[0..8], &[3; 8]);
    assert_eq!(fb[8], 0);
    // The tile is 8 lines tall.
    assert_eq!(fb[7 * SCREEN_WIDTH], 3);
    assert_eq!(fb[8 * SCREEN_WIDTH], 0);
}

#[test]
fn scx_discards_leading_pixels() {
    let mut ppu = Ppu::new();
    let mut if_reg = 0;
    ppu.write_reg(0xFF47, 0xE4, &mut if_reg);
    solid_tile(&mut ppu, 1, 0xFF, 0xFF);
    ppu.vram[0x1800] = 1;
    ppu.write_reg(0xFF43, 3, &mut if_reg); // SCX = 3

    ppu.tick(70224, &mut if_reg);
    let fb = ppu.framebuffer();
    // The first 3 columns of the tile scrolled off; 5 remain.
    assert_eq!(&fb[0..5], &[3; 5]);
    assert_eq!(fb[5], 0);
}

#[test]
fn sprites_composite_over_the_background() {
    let mut ppu = Ppu::new();
    let mut if_reg = 0;
    ppu.write_reg(0xFF40, 0x13, &mut if_reg); // LCD off while we set up
    solid_tile(&mut ppu, 2, 0x00, 0xFF); // color 2 everywhere
    ppu.oam[0] = 16; // line 0
    ppu.oam[1] = 8; // column 0
    ppu.oam[2] = 2;
    ppu.oam[3] = 0;
    ppu.write_reg(0xFF47, 0xE4, &mut if_reg);
    ppu.write_reg(0xFF48, 0xE4, &mut if_reg);
    ppu.write_reg(0xFF40, 0x93, &mut if_reg); // on: bg + sprites

    ppu.tick(70224, &mut if_reg);
    let fb = ppu.framebuffer();
    assert_eq!(&fb[0..8], &[2; 8]);
    assert_eq!(fb[8], 0);
    assert_eq!(fb[7 * SCREEN_WIDTH], 2);
    // An 8-pixel sprite ends at line 7.
    assert_eq!(fb[8 * SCREEN_WIDTH], 0);
}

#[test]
fn behind_background_sprites_lose_to_nonzero_background() {
    let mut ppu = Ppu::new();
    let mut if_reg = 0;
    ppu.write_reg(0xFF40, 0x13, &mut if_reg);
    solid_tile(&mut ppu, 1, 0xFF, 0xFF); // bg color 3
    solid_tile(&mut ppu, 2, 0x00, 0xFF); // sprite color 2
    ppu.vram[0x1800] = 1; // nonzero bg under the first sprite only
    // Sprite over nonzero background, priority flag set.
    ppu.oam[0] = 16;
    ppu.oam[1] = 8;
    ppu.oam[2] = 2;
    ppu.oam[3] = 0x80;
    // Same sprite over background color 0.
    ppu.oam[4] = 16;
    ppu.oam[5] = 24;
    ppu.oam[6] = 2;
    ppu.oam[7] = 0x80;
    ppu.write_reg(0xFF47, 0xE4, &mut if_reg);
    ppu.write_reg(0xFF48, 0xE4, &mut if_reg);
    ppu.write_reg(0xFF40, 0x93, &mut if_reg);

    ppu.tick(70224, &mut if_reg);
    let fb = ppu.framebuffer();
    assert_eq!(fb[0], 3); // background wins
    assert_eq!(fb[16], 2); // transparent-under: sprite shows
}

#[test]
fn window_overrides_the_background_and_keeps_its_own_line() {
    let mut ppu = Ppu::new();
    let mut if_reg = 0;
    // Window on, window map at 0x9C00, unsigned data, bg on.
    ppu.write_reg(0xFF40, 0xF1, &mut if_reg);
    ppu.write_reg(0xFF47, 0xE4, &mut if_reg);
    ppu.write_reg(0xFF4A, 0, &mut if_reg); // WY
    ppu.write_reg(0xFF4B, 7, &mut if_reg); // WX: left edge
    solid_tile(&mut ppu, 1, 0xFF, 0xFF);
    for x in 0..20 {
        ppu.vram[0x1C00 + x] = 1; // first window map row only
    }

    ppu.tick(70224, &mut if_reg);
    let fb = ppu.framebuffer();
    assert_eq!(fb[0], 3);
    assert_eq!(fb[159], 3);
    assert_eq!(fb[7 * SCREEN_WIDTH + 80], 3);
    // Window line 8 comes from the second (empty) map row, which shows
    // the counter advanced once per drawn line.
    assert_eq!(fb[8 * SCREEN_WIDTH], 0);
}

#[test]
fn disabling_the_lcd_parks_the_ppu() {
    let mut ppu = Ppu::new();
    let mut if_reg = 0;
    ppu.tick(LINE_DOTS * 3, &mut if_reg);
    assert_eq!(ppu.ly(), 3);

    ppu.write_reg(0xFF40, 0x11, &mut if_reg);
    assert_eq!(ppu.ly(), 0);
    assert_eq!(ppu.mode, Mode::HBlank);
    let frames = ppu.frames();
    ppu.tick(100_000, &mut if_reg);
    assert_eq!(ppu.ly(), 0);
    assert_eq!(ppu.frames(), frames);

    // Re-enabling restarts from an OAM scan of line 0.
    ppu.write_reg(0xFF40, 0x91, &mut if_reg);
    assert_eq!(ppu.mode, Mode::OamScan);
}

#[test]
fn background_disable_draws_white_shade() {
    let mut ppu = Ppu::new();
    let mut if_reg = 0;
    ppu.write_reg(0xFF47, 0xE4, &mut if_reg);
    solid_tile(&mut ppu, 1, 0xFF, 0xFF);
    ppu.vram[0x1800] = 1;
    ppu.write_reg(0xFF40, 0x90, &mut if_reg); // bg enable off

    ppu.tick(70224, &mut if_reg);
    assert_eq!(ppu.framebuffer()[0], 0);
}
