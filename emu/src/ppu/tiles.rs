//! Tile data and the two tile maps held in VRAM (0x8000-0x9FFF).
//!
//! 0x8000-0x97FF holds 384 tiles of 16 bytes each. 0x9800-0x9BFF and
//! 0x9C00-0x9FFF are two 32x32 maps of tile indices. Bytes are kept in their
//! packed 2bpp form so reads always return exactly what was written.

pub const TILE_COUNT: usize = 384;
pub const TILE_BYTES: usize = 16;
pub const TILE_SIZE: usize = 8;
pub const MAP_WIDTH: usize = 32;
const MAP_BYTES: usize = MAP_WIDTH * MAP_WIDTH;
const TILE_DATA_END: usize = TILE_COUNT * TILE_BYTES; // 0x1800

/// One 8x8 tile: eight rows of (low plane, high plane) byte pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile([u8; TILE_BYTES]);

impl Tile {
    pub const BLANK: Tile = Tile([0; TILE_BYTES]);

    /// 2-bit colour index at (`row`, `col`), column 0 being the leftmost pixel.
    #[inline]
    pub fn color_index(&self, row: usize, col: usize) -> u8 {
        let low = self.0[row * 2];
        let high = self.0[row * 2 + 1];
        let bit = 7 - col;
        ((high >> bit) & 1) << 1 | ((low >> bit) & 1)
    }
}

/// Which half of the tile store the background and window index into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileSet {
    /// LCDC bit 4 set: unsigned indices from 0x8000 (tiles 0-255).
    Low,
    /// LCDC bit 4 clear: signed indices around 0x9000 (tiles 128-383).
    High,
}

impl TileSet {
    /// Physical tile number for a map index under this tile set.
    #[inline]
    pub fn resolve(self, index: u8) -> usize {
        match self {
            TileSet::Low => index as usize,
            TileSet::High => (256 + index as i8 as i16) as usize,
        }
    }
}

/// Which of the two tile maps a layer reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileMapArea {
    /// 0x9800-0x9BFF
    Low = 0,
    /// 0x9C00-0x9FFF
    High = 1,
}

pub struct Vram {
    tiles: Box<[Tile; TILE_COUNT]>,
    maps: Box<[[u8; MAP_BYTES]; 2]>,
}

impl Vram {
    pub fn new() -> Self {
        Vram {
            tiles: Box::new([Tile::BLANK; TILE_COUNT]),
            maps: Box::new([[0; MAP_BYTES]; 2]),
        }
    }

    /// Read a byte at `offset` from 0x8000.
    #[inline]
    pub fn read(&self, offset: u16) -> u8 {
        let offset = offset as usize & 0x1FFF;
        if offset < TILE_DATA_END {
            self.tiles[offset / TILE_BYTES].0[offset % TILE_BYTES]
        } else {
            let map = offset - TILE_DATA_END;
            self.maps[map / MAP_BYTES][map % MAP_BYTES]
        }
    }

    /// Write a byte at `offset` from 0x8000.
    #[inline]
    pub fn write(&mut self, offset: u16, value: u8) {
        let offset = offset as usize & 0x1FFF;
        if offset < TILE_DATA_END {
            self.tiles[offset / TILE_BYTES].0[offset % TILE_BYTES] = value;
        } else {
            let map = offset - TILE_DATA_END;
            self.maps[map / MAP_BYTES][map % MAP_BYTES] = value;
        }
    }

    #[inline]
    pub fn tile(&self, number: usize) -> &Tile {
        &self.tiles[number % TILE_COUNT]
    }

    /// Tile index stored at (`col`, `row`) of a 32x32 map.
    #[inline]
    pub fn map_entry(&self, area: TileMapArea, col: usize, row: usize) -> u8 {
        self.maps[area as usize][row * MAP_WIDTH + col]
    }
}

impl Default for Vram {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsigned_zero_is_first_tile() {
        assert_eq!(TileSet::Low.resolve(0x00), 0);
    }

    #[test]
    fn test_tile_sets_agree_on_shared_half() {
        assert_eq!(TileSet::High.resolve(0x80), TileSet::Low.resolve(0x80));
        assert_eq!(TileSet::High.resolve(0xFF), TileSet::Low.resolve(0xFF));
        assert_eq!(TileSet::High.resolve(0x80), 128);
    }

    #[test]
    fn test_signed_zero_differs() {
        assert_ne!(TileSet::High.resolve(0x00), TileSet::Low.resolve(0x00));
        assert_eq!(TileSet::High.resolve(0x00), 256);
        assert_eq!(TileSet::High.resolve(0x7F), 383);
    }

    #[test]
    fn test_byte_offset_maps_to_tile() {
        let mut vram = Vram::new();
        vram.write(0x0011, 0xAB); // tile 1, byte 1
        assert_eq!(vram.tile(1).0[1], 0xAB);
        assert_eq!(vram.read(0x0011), 0xAB);

        vram.write(0x17FF, 0xCD); // last byte of tile 383
        assert_eq!(vram.tile(383).0[15], 0xCD);
    }

    #[test]
    fn test_maps_are_independent() {
        let mut vram = Vram::new();
        vram.write(0x1800 + 33, 0x11); // map 0, (1, 1)
        vram.write(0x1C00 + 33, 0x22); // map 1, (1, 1)
        assert_eq!(vram.map_entry(TileMapArea::Low, 1, 1), 0x11);
        assert_eq!(vram.map_entry(TileMapArea::High, 1, 1), 0x22);
        assert_eq!(vram.read(0x1FFF), 0x00);
    }

    #[test]
    fn test_color_index_planes() {
        let mut vram = Vram::new();
        // Row 0: low plane 0b1010_0000, high plane 0b1100_0000
        vram.write(0x0000, 0xA0);
        vram.write(0x0001, 0xC0);
        let tile = vram.tile(0);
        assert_eq!(tile.color_index(0, 0), 3);
        assert_eq!(tile.color_index(0, 1), 2);
        assert_eq!(tile.color_index(0, 2), 1);
        assert_eq!(tile.color_index(0, 3), 0);
    }
}
