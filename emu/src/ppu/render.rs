//! Full-frame rendering from the current register and VRAM state.
//!
//! Layers are composed per pixel: background (wrapping viewport), then the
//! window (opaque, no wraparound), then objects. Background and window
//! colour indices are kept until objects are drawn so the behind-background
//! flag can be honoured.

use super::Ppu;
use super::tiles::{MAP_WIDTH, TILE_SIZE, TileMapArea};

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;
pub const FRAME_BYTES: usize = SCREEN_WIDTH * SCREEN_HEIGHT * 4;

/// Background layer extent in pixels, both axes.
const LAYER_SIZE: usize = MAP_WIDTH * TILE_SIZE;

const OBJECT_COUNT: usize = 40;
const OBJECTS_PER_LINE: usize = 10;

/// A rendered 160x144 RGBA frame.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    pixels: Box<[u8]>,
}

impl Frame {
    fn filled(color: [u8; 4]) -> Self {
        let mut pixels = vec![0; FRAME_BYTES].into_boxed_slice();
        for chunk in pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
        Frame { pixels }
    }

    /// RGBA value at (`x`, `y`), or `None` off screen.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= SCREEN_WIDTH || y >= SCREEN_HEIGHT {
            return None;
        }
        let o = (y * SCREEN_WIDTH + x) * 4;
        Some([
            self.pixels[o],
            self.pixels[o + 1],
            self.pixels[o + 2],
            self.pixels[o + 3],
        ])
    }

    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, color: [u8; 4]) {
        let o = (y * SCREEN_WIDTH + x) * 4;
        self.pixels[o..o + 4].copy_from_slice(&color);
    }

    /// Row-major RGBA bytes, `FRAME_BYTES` long.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_bytes(self) -> Box<[u8]> {
        self.pixels
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Frame({}x{})", SCREEN_WIDTH, SCREEN_HEIGHT)
    }
}

/// Shade a colour index maps to under a DMG palette register.
#[inline]
fn palette_shade(palette: u8, index: u8) -> u8 {
    (palette >> (index * 2)) & 0x03
}

/// One decoded OAM entry.
#[derive(Clone, Copy)]
struct Object {
    y: i16,
    x: i16,
    tile: u8,
    flags: u8,
}

impl Object {
    fn from_oam(bytes: &[u8]) -> Self {
        Object {
            y: bytes[0] as i16 - 16,
            x: bytes[1] as i16 - 8,
            tile: bytes[2],
            flags: bytes[3],
        }
    }

    #[inline]
    fn behind_background(&self) -> bool {
        self.flags & 0x80 != 0
    }

    #[inline]
    fn flip_y(&self) -> bool {
        self.flags & 0x40 != 0
    }

    #[inline]
    fn flip_x(&self) -> bool {
        self.flags & 0x20 != 0
    }

    #[inline]
    fn uses_obp1(&self) -> bool {
        self.flags & 0x10 != 0
    }
}

impl Ppu {
    /// Produce a complete frame. Never mutates PPU state.
    pub fn render(&self) -> Frame {
        let mut frame = Frame::filled(self.shades.color(0));
        if !self.lcd_enabled() {
            return frame;
        }

        // Background/window colour index per pixel, 0 where blanked
        let mut indices = vec![0u8; SCREEN_WIDTH * SCREEN_HEIGHT];
        if self.background_enabled() {
            self.draw_background(&mut indices);
            if self.window_enabled() {
                self.draw_window(&mut indices);
            }
            for (i, &index) in indices.iter().enumerate() {
                let color = self.shades.color(palette_shade(self.bgp, index));
                frame.set_pixel(i % SCREEN_WIDTH, i / SCREEN_WIDTH, color);
            }
        }

        if self.objects_enabled() {
            for line in 0..SCREEN_HEIGHT {
                let row = &indices[line * SCREEN_WIDTH..(line + 1) * SCREEN_WIDTH];
                self.draw_objects(&mut frame, row, line);
            }
        }
        frame
    }

    /// Background-layer coordinate shown at screen pixel (`px`, `py`).
    #[inline]
    pub fn background_coordinate(&self, px: usize, py: usize) -> (usize, usize) {
        (
            (px + self.scx as usize) % LAYER_SIZE,
            (py + self.scy as usize) % LAYER_SIZE,
        )
    }

    /// Colour index at layer coordinate (`x`, `y`) through `map` and the
    /// active tile set.
    fn layer_color_index(&self, map: TileMapArea, x: usize, y: usize) -> u8 {
        let index = self.vram.map_entry(map, x / TILE_SIZE, y / TILE_SIZE);
        let tile = self.vram.tile(self.tile_set().resolve(index));
        tile.color_index(y % TILE_SIZE, x % TILE_SIZE)
    }

    fn draw_background(&self, indices: &mut [u8]) {
        let map = self.background_map();
        for py in 0..SCREEN_HEIGHT {
            for px in 0..SCREEN_WIDTH {
                let (bx, by) = self.background_coordinate(px, py);
                indices[py * SCREEN_WIDTH + px] = self.layer_color_index(map, bx, by);
            }
        }
    }

    fn draw_window(&self, indices: &mut [u8]) {
        let (wx, wy) = self.window_origin();
        let (wx, wy) = (wx as usize, wy as usize);
        if wx >= SCREEN_WIDTH || wy >= SCREEN_HEIGHT {
            return;
        }

        // Columns left of the screen edge when WX < 7
        let clipped = 7usize.saturating_sub(self.wx as usize);
        let map = self.window_map();
        for py in wy..SCREEN_HEIGHT {
            for px in wx..SCREEN_WIDTH {
                let lx = px - wx + clipped;
                indices[py * SCREEN_WIDTH + px] = self.layer_color_index(map, lx, py - wy);
            }
        }
    }

    fn draw_objects(&self, frame: &mut Frame, background: &[u8], line: usize) {
        let height: i16 = if self.tall_objects() { 16 } else { 8 };
        let line = line as i16;

        let mut visible = [None::<Object>; OBJECTS_PER_LINE];
        let mut count = 0;
        for entry in self.oam.chunks_exact(4).take(OBJECT_COUNT) {
            let object = Object::from_oam(entry);
            if line >= object.y && line < object.y + height {
                visible[count] = Some(object);
                count += 1;
                if count == OBJECTS_PER_LINE {
                    break;
                }
            }
        }

        let mut visible: Vec<Object> = visible.iter().flatten().copied().collect();
        // Stable: equal X keeps OAM order
        visible.sort_by_key(|o| o.x);

        // The first opaque object pixel claims the column, even when the
        // background then hides it.
        let mut claimed = [false; SCREEN_WIDTH];
        for object in &visible {
            let mut row = line - object.y;
            if object.flip_y() {
                row = height - 1 - row;
            }
            let mut tile = object.tile;
            if height == 16 {
                tile &= 0xFE;
                if row >= 8 {
                    tile += 1;
                    row -= 8;
                }
            }
            let tile = self.vram.tile(tile as usize);
            let palette = if object.uses_obp1() { self.obp1 } else { self.obp0 };

            for col in 0..8i16 {
                let x = object.x + col;
                if !(0..SCREEN_WIDTH as i16).contains(&x) {
                    continue;
                }
                let x = x as usize;
                if claimed[x] {
                    continue;
                }
                let tile_col = if object.flip_x() { 7 - col } else { col };
                let index = tile.color_index(row as usize, tile_col as usize);
                if index == 0 {
                    continue;
                }
                claimed[x] = true;
                if object.behind_background() && background[x] != 0 {
                    continue;
                }
                let color = self.shades.color(palette_shade(palette, index));
                frame.set_pixel(x, line as usize, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::reg;
    use super::*;

    const WHITE: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];
    const DARK: [u8; 4] = [0x55, 0x55, 0x55, 0xFF];
    const BLACK: [u8; 4] = [0x00, 0x00, 0x00, 0xFF];

    /// Fill tile `n` (0x8000 addressing) with colour index 3.
    fn solid_tile(ppu: &mut Ppu, n: u16) {
        for i in 0..16 {
            ppu.write_vram(0x8000 + n * 16 + i, 0xFF);
        }
    }

    fn ppu_with_identity_palette() -> Ppu {
        let mut ppu = Ppu::default();
        ppu.write_register(reg::BGP, 0xE4);
        ppu
    }

    #[test]
    fn test_background_wraps_horizontally() {
        let mut ppu = ppu_with_identity_palette();
        solid_tile(&mut ppu, 1);
        ppu.write_vram(0x9800, 1); // map column 0 covers layer x 0-7
        ppu.write_register(reg::SCX, 250);

        assert_eq!(ppu.background_coordinate(10, 0), (4, 0));

        let frame = ppu.render();
        assert_eq!(frame.pixel(10, 0), Some(BLACK));
        assert_eq!(frame.pixel(5, 0), Some(WHITE)); // layer x 255
        assert_eq!(frame.pixel(14, 0), Some(WHITE)); // layer x 8
    }

    #[test]
    fn test_background_wraps_vertically() {
        let mut ppu = ppu_with_identity_palette();
        ppu.write_register(reg::SCY, 200);
        assert_eq!(ppu.background_coordinate(0, 100), (0, 44));
    }

    #[test]
    fn test_window_offscreen_origin_draws_nothing() {
        let mut ppu = ppu_with_identity_palette();
        solid_tile(&mut ppu, 1);
        for i in 0..0x400 {
            ppu.write_vram(0x9C00 + i, 1);
        }
        // Window reads map 1, background reads the blank map 0
        ppu.write_register(reg::LCDC, 0x91 | 0x40);
        let without_window = ppu.render();

        ppu.write_register(reg::LCDC, 0x91 | 0x40 | 0x20);
        ppu.write_register(reg::WX, 168); // origin x 161
        ppu.write_register(reg::WY, 0);
        assert_eq!(ppu.window_origin(), (161, 0));
        assert!(ppu.render() == without_window);

        ppu.write_register(reg::WX, 7);
        ppu.write_register(reg::WY, 144);
        assert!(ppu.render() == without_window);
    }

    #[test]
    fn test_window_covers_from_origin() {
        let mut ppu = ppu_with_identity_palette();
        solid_tile(&mut ppu, 1);
        for i in 0..0x400 {
            ppu.write_vram(0x9C00 + i, 1);
        }
        ppu.write_register(reg::LCDC, 0x91 | 0x40 | 0x20);
        ppu.write_register(reg::WX, 7 + 80);
        ppu.write_register(reg::WY, 72);

        let frame = ppu.render();
        assert_eq!(frame.pixel(79, 72), Some(WHITE));
        assert_eq!(frame.pixel(80, 71), Some(WHITE));
        assert_eq!(frame.pixel(80, 72), Some(BLACK));
        assert_eq!(frame.pixel(159, 143), Some(BLACK));
    }

    #[test]
    fn test_signed_tile_set_render() {
        let mut ppu = ppu_with_identity_palette();
        solid_tile(&mut ppu, 256); // 0x9000, index 0 under the signed set
        ppu.write_register(reg::LCDC, 0x81);
        assert_eq!(ppu.render().pixel(0, 0), Some(BLACK));

        ppu.write_register(reg::LCDC, 0x91);
        assert_eq!(ppu.render().pixel(0, 0), Some(WHITE));
    }

    #[test]
    fn test_palette_applies_to_background() {
        let mut ppu = Ppu::default();
        ppu.write_register(reg::BGP, 0x03); // index 0 -> shade 3
        let frame = ppu.render();
        assert_eq!(frame.pixel(0, 0), Some(BLACK));
    }

    #[test]
    fn test_lcd_off_renders_blank() {
        let mut ppu = Ppu::default();
        ppu.write_register(reg::BGP, 0xFF);
        ppu.write_register(reg::LCDC, 0x00);
        let frame = ppu.render();
        assert!(frame.as_bytes().chunks_exact(4).all(|p| p == WHITE));
        assert_eq!(frame.as_bytes().len(), FRAME_BYTES);
    }

    #[test]
    fn test_background_disabled_blanks() {
        let mut ppu = Ppu::default();
        ppu.write_register(reg::BGP, 0xFF);
        ppu.write_register(reg::LCDC, 0x90);
        assert_eq!(ppu.render().pixel(42, 42), Some(WHITE));
    }

    #[test]
    fn test_object_drawn_with_transparency() {
        let mut ppu = ppu_with_identity_palette();
        solid_tile(&mut ppu, 2);
        ppu.write_register(reg::OBP0, 0xE4);
        ppu.write_register(reg::LCDC, 0x93);
        // Object at screen (10, 20)
        ppu.write_oam(0xFE00, 20 + 16);
        ppu.write_oam(0xFE01, 10 + 8);
        ppu.write_oam(0xFE02, 2);
        ppu.write_oam(0xFE03, 0);

        let frame = ppu.render();
        assert_eq!(frame.pixel(10, 20), Some(BLACK));
        assert_eq!(frame.pixel(17, 27), Some(BLACK));
        assert_eq!(frame.pixel(18, 20), Some(WHITE));
        assert_eq!(frame.pixel(10, 28), Some(WHITE));
    }

    #[test]
    fn test_object_behind_background() {
        let mut ppu = ppu_with_identity_palette();
        solid_tile(&mut ppu, 1);
        solid_tile(&mut ppu, 2);
        ppu.write_vram(0x9800, 1); // background tile at (0, 0)
        ppu.write_register(reg::OBP0, 0x80); // index 3 -> shade 2
        ppu.write_register(reg::LCDC, 0x93);
        ppu.write_oam(0xFE00, 16);
        ppu.write_oam(0xFE01, 8 + 4); // straddles background tile edge
        ppu.write_oam(0xFE02, 2);
        ppu.write_oam(0xFE03, 0x80);

        let frame = ppu.render();
        assert_eq!(frame.pixel(4, 0), Some(BLACK)); // background wins
        assert_eq!(frame.pixel(8, 0), Some(DARK)); // over colour 0
    }

    #[test]
    fn test_hidden_object_still_wins_overlap() {
        let mut ppu = ppu_with_identity_palette();
        solid_tile(&mut ppu, 1);
        solid_tile(&mut ppu, 2);
        ppu.write_vram(0x9800, 1);
        ppu.write_vram(0x9801, 1); // background colour 3 over x 0-15
        ppu.write_register(reg::OBP1, 0x80); // index 3 -> shade 2
        ppu.write_register(reg::LCDC, 0x93);
        // Lower X, behind background
        ppu.write_oam(0xFE00, 16);
        ppu.write_oam(0xFE01, 8);
        ppu.write_oam(0xFE02, 2);
        ppu.write_oam(0xFE03, 0x80);
        // Overlapping at x 4-11, above background, OBP1
        ppu.write_oam(0xFE04, 16);
        ppu.write_oam(0xFE05, 8 + 4);
        ppu.write_oam(0xFE06, 2);
        ppu.write_oam(0xFE07, 0x10);

        let frame = ppu.render();
        assert_eq!(frame.pixel(5, 0), Some(BLACK));
        assert_eq!(frame.pixel(7, 0), Some(BLACK));
        assert_eq!(frame.pixel(8, 0), Some(DARK));
        assert_eq!(frame.pixel(11, 0), Some(DARK));
    }

    #[test]
    fn test_lower_x_object_drawn_on_top() {
        let mut ppu = ppu_with_identity_palette();
        solid_tile(&mut ppu, 2);
        ppu.write_register(reg::OBP0, 0xE4); // shade 3
        ppu.write_register(reg::OBP1, 0x80); // shade 2
        ppu.write_register(reg::LCDC, 0x93);
        // Later in OAM but further left
        ppu.write_oam(0xFE00, 16);
        ppu.write_oam(0xFE01, 8 + 4);
        ppu.write_oam(0xFE02, 2);
        ppu.write_oam(0xFE03, 0x10);
        ppu.write_oam(0xFE04, 16);
        ppu.write_oam(0xFE05, 8);
        ppu.write_oam(0xFE06, 2);

        let frame = ppu.render();
        assert_eq!(frame.pixel(6, 0), Some(BLACK));
        assert_eq!(frame.pixel(9, 0), Some(DARK));
    }

    #[test]
    fn test_window_left_columns_clipped() {
        let mut ppu = ppu_with_identity_palette();
        solid_tile(&mut ppu, 1);
        ppu.write_vram(0x9C00, 1); // window map column 0 only
        ppu.write_register(reg::LCDC, 0x91 | 0x40 | 0x20);
        ppu.write_register(reg::WX, 3);
        ppu.write_register(reg::WY, 0);
        assert_eq!(ppu.window_origin(), (0, 0));

        // Window x 4-7 lands on screen x 0-3
        let frame = ppu.render();
        assert_eq!(frame.pixel(0, 0), Some(BLACK));
        assert_eq!(frame.pixel(3, 0), Some(BLACK));
        assert_eq!(frame.pixel(4, 0), Some(WHITE));
    }

    #[test]
    fn test_ten_objects_per_line() {
        let mut ppu = ppu_with_identity_palette();
        solid_tile(&mut ppu, 2);
        ppu.write_register(reg::OBP0, 0xE4);
        ppu.write_register(reg::LCDC, 0x93);
        for i in 0..11u16 {
            let base = 0xFE00 + i * 4;
            ppu.write_oam(base, 16);
            ppu.write_oam(base + 1, 8 + (i as u8) * 8);
            ppu.write_oam(base + 2, 2);
        }
        let frame = ppu.render();
        assert_eq!(frame.pixel(72, 0), Some(BLACK)); // tenth object
        assert_eq!(frame.pixel(80, 0), Some(WHITE)); // eleventh dropped
    }

    #[test]
    fn test_render_is_repeatable() {
        let mut ppu = ppu_with_identity_palette();
        solid_tile(&mut ppu, 0);
        assert!(ppu.render() == ppu.render());
    }
}
