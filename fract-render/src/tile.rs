/// Default tile edge in pixels. Big enough to amortise a hand-off, small
/// enough that a resize never waits long on the last in-flight tile.
pub const TILE_SIZE: u32 = 64;

/// A rectangular tile within the render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// Pixel x of the top-left corner.
    pub x: u32,
    /// Pixel y of the top-left corner.
    pub y: u32,
    /// Tile width in pixels (may be smaller at the right edge).
    pub width: u32,
    /// Tile height in pixels (may be smaller at the bottom edge).
    pub height: u32,
}

impl Tile {
    /// Number of pixels in this tile.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Lazy row-major generator of the tiles covering a `width × height` target.
///
/// Tiles are produced top-to-bottom, left-to-right, with the last row and
/// column clipped to the remaining pixels.
#[derive(Debug, Clone)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tile_size: u32,
    x: u32,
    y: u32,
}

impl TileGrid {
    /// `tile_size` of zero is treated as one.
    pub fn new(width: u32, height: u32, tile_size: u32) -> Self {
        Self {
            width,
            height,
            tile_size: tile_size.max(1),
            x: 0,
            y: 0,
        }
    }

    /// Total number of tiles the grid yields from the start.
    pub fn tile_count(&self) -> usize {
        let cols = self.width.div_ceil(self.tile_size) as usize;
        let rows = self.height.div_ceil(self.tile_size) as usize;
        cols * rows
    }
}

impl Iterator for TileGrid {
    type Item = Tile;

    fn next(&mut self) -> Option<Tile> {
        if self.width == 0 || self.y >= self.height {
            return None;
        }
        let tile = Tile {
            x: self.x,
            y: self.y,
            width: self.tile_size.min(self.width - self.x),
            height: self.tile_size.min(self.height - self.y),
        };
        self.x += tile.width;
        if self.x >= self.width {
            self.x = 0;
            self.y += tile.height;
        }
        Some(tile)
    }
}

/// Build the full grid of tiles for the given target dimensions.
pub fn build_tile_grid(width: u32, height: u32, tile_size: u32) -> Vec<Tile> {
    TileGrid::new(width, height, tile_size).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_exact_cover(width: u32, height: u32, tile_size: u32) {
        let tiles = build_tile_grid(width, height, tile_size);
        let mut covered = vec![false; width as usize * height as usize];
        for tile in &tiles {
            assert!(tile.x + tile.width <= width && tile.y + tile.height <= height);
            for py in tile.y..tile.y + tile.height {
                for px in tile.x..tile.x + tile.width {
                    let idx = py as usize * width as usize + px as usize;
                    assert!(!covered[idx], "pixel ({px}, {py}) covered twice");
                    covered[idx] = true;
                }
            }
        }
        assert!(covered.iter().all(|&c| c), "all pixels must be covered");
    }

    #[test]
    fn tile_grid_covers_target_exactly() {
        for &(w, h, t) in &[
            (200, 150, 64),
            (64, 64, 64),
            (1, 1, 64),
            (65, 129, 64),
            (37, 23, 5),
            (10, 10, 1),
            (7, 300, 16),
        ] {
            assert_exact_cover(w, h, t);
        }
    }

    #[test]
    fn edge_tiles_are_clipped() {
        let tiles = build_tile_grid(100, 70, 64);
        assert_eq!(tiles.len(), 4);
        assert_eq!(tiles[1], Tile { x: 64, y: 0, width: 36, height: 64 });
        assert_eq!(tiles[2], Tile { x: 0, y: 64, width: 64, height: 6 });
        assert_eq!(tiles[3], Tile { x: 64, y: 64, width: 36, height: 6 });
    }

    #[test]
    fn tiles_are_row_major() {
        let tiles = build_tile_grid(256, 192, 64);
        let origins: Vec<(u32, u32)> = tiles.iter().map(|t| (t.y, t.x)).collect();
        let mut sorted = origins.clone();
        sorted.sort_unstable();
        assert_eq!(origins, sorted);
    }

    #[test]
    fn tile_count_matches_iteration() {
        for &(w, h, t) in &[(200, 150, 64), (0, 10, 64), (10, 0, 64), (640, 480, 64)] {
            let grid = TileGrid::new(w, h, t);
            assert_eq!(grid.tile_count(), grid.clone().count());
        }
    }

    #[test]
    fn empty_target_has_no_tiles() {
        assert!(build_tile_grid(0, 0, 64).is_empty());
        assert!(build_tile_grid(0, 50, 64).is_empty());
        assert!(build_tile_grid(50, 0, 64).is_empty());
    }

    #[test]
    fn zero_tile_size_is_clamped() {
        assert_eq!(build_tile_grid(3, 2, 0).len(), 6);
    }
}
