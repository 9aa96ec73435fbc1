// Copyright 2026 the Tilevg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-point scheme and the packed records shared with the tile evaluator.
//!
//! Everything in this module is wire format. The downstream evaluator (an
//! instanced GPU draw, or [`crate::fine`] on the CPU) decodes these exact
//! byte layouts, so the constants and packing here must not change.

/// Subpixel precision: 16 subpixels per device pixel.
pub const PIXEL_LOG2: u32 = 4;
pub const PIXEL_SIZE: i32 = 1 << PIXEL_LOG2;

/// Tile precision: 128 subpixels, so tiles are 8x8 device pixels.
pub const TILE_LOG2: u32 = 7;
pub const TILE_SIZE: i32 = 1 << TILE_LOG2;
pub const TILE_MASK: i32 = TILE_SIZE - 1;

/// Tile side length in device pixels.
pub const TILE_DIMS: i32 = TILE_SIZE / PIXEL_SIZE;

/// Stored edge coordinate precision: 8 bits per component.
pub const EDGE_LOG2: u32 = 8;
pub const EDGE_SIZE: i32 = 1 << EDGE_LOG2;
pub const EDGE_MASK: i32 = EDGE_SIZE - 1;

/// Margin around the tile in the 8-bit edge range, letting stored edges
/// overhang a tile by up to 64 subpixels (4 px) on each side.
pub const EDGE_BORDER: i32 = (EDGE_SIZE - TILE_SIZE) / 2;

/// Maximum grid cells per axis.
pub const GRID_SIZE: i32 = 1024;

/// A line segment local to one tile, in biased 8-bit subpixel coordinates.
///
/// Components are tile-relative subpixels plus [`EDGE_BORDER`], truncated to
/// a byte. Orientation is meaningful: the segment runs a to b, and the
/// evaluator derives winding direction from it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Edge {
    pub x0: u8,
    pub y0: u8,
    pub x1: u8,
    pub y1: u8,
}

impl Edge {
    /// Bias a subpixel segment into the coordinate space of tile `(ix, iy)`.
    ///
    /// Truncation to u8 is deliberate; callers guarantee the segment lies
    /// within the bordered range of its tile.
    pub(crate) fn localize(ix: i32, iy: i32, ax: i32, ay: i32, bx: i32, by: i32) -> Edge {
        let ox = (ix << TILE_LOG2) - EDGE_BORDER;
        let oy = (iy << TILE_LOG2) - EDGE_BORDER;
        Edge {
            x0: (ax - ox) as u8,
            y0: (ay - oy) as u8,
            x1: (bx - ox) as u8,
            y1: (by - oy) as u8,
        }
    }

    pub(crate) fn reversed(self) -> Edge {
        Edge {
            x0: self.x1,
            y0: self.y1,
            x1: self.x0,
            y1: self.y0,
        }
    }

    /// Little-endian packing, one edge per u32 data word.
    pub fn packed(self) -> u32 {
        u32::from_le_bytes([self.x0, self.y0, self.x1, self.y1])
    }

    pub fn unpack(word: u32) -> Edge {
        let [x0, y0, x1, y1] = word.to_le_bytes();
        Edge { x0, y0, x1, y1 }
    }
}

/// One emitted tile instance.
///
/// `data` and `edges` are word offsets into the frame's data buffer, stored
/// as f32 because the GPU reads them from float vertex attributes. `data`
/// points at the draw's fill descriptor; `edges` at this tile's contiguous
/// edge run of `count` words.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tile {
    pub sign: i16,
    pub count: u16,
    pub data: f32,
    pub edges: f32,
    pub coord: u32,
}

impl Tile {
    pub(crate) fn new(x: i32, y: i32, sign: i32, count: usize, data: usize, edges: usize) -> Tile {
        Tile {
            sign: sign as i16,
            count: count as u16,
            data: data as f32,
            edges: edges as f32,
            coord: (x as u32 & 0xFFFF) | ((y as u32) << 16),
        }
    }

    /// Tile x coordinate in screen tile units.
    pub fn x(&self) -> i32 {
        (self.coord & 0xFFFF) as i32
    }

    pub fn y(&self) -> i32 {
        (self.coord >> 16) as i32
    }

    /// The four u32 words uploaded per instance.
    pub fn words(&self) -> [u32; 4] {
        let args = (self.sign as u16 as u32) | ((self.count as u32) << 16);
        [args, self.data.to_bits(), self.edges.to_bits(), self.coord]
    }
}
