// Copyright 2026 the Tilevg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The tile rasterizer.
//!
//! Flattened segments are walked across the tile grid with an integer DDA.
//! Each grid cell collects the clipped pieces of segments passing through it
//! in an index-linked list over a per-draw edge arena, and a byte-sized sign
//! accumulator per cell tracks crossings of horizontal tile boundaries.
//! Emission scans the touched bounding box row-major, carrying a running
//! sign, and appends tile records plus contiguous edge runs to the frame.
//!
//! Geometry is shifted right by one tile on entry so grid column 0 is an
//! off-screen gutter; segments entirely left of the viewport collapse to
//! sign-span updates in that column. Emission un-shifts the coordinates.

use crate::fill::{FillDescriptor, FILL_WORDS};
use crate::geom::Point;
use crate::render::{Backend, Frame, Stats};
use crate::tile::{
    Edge, Tile, EDGE_LOG2, GRID_SIZE, PIXEL_SIZE, TILE_DIMS, TILE_LOG2, TILE_MASK,
};

/// Default edge arena capacity per draw.
pub(crate) const DEFAULT_EDGES: usize = 1 << 18;

/// Grid bounding box of the cells a draw has touched, in cell units.
#[derive(Clone, Copy, Debug)]
struct Bounds {
    minx: i32,
    miny: i32,
    maxx: i32,
    maxy: i32,
}

impl Bounds {
    fn add(&mut self, x: i32, y: i32) {
        self.minx = self.minx.min(x);
        self.miny = self.miny.min(y);
        self.maxx = self.maxx.max(x);
        self.maxy = self.maxy.max(y);
    }

    fn clamp(&mut self, maxx: i32, maxy: i32) {
        self.minx = self.minx.max(0);
        self.miny = self.miny.max(0);
        self.maxx = self.maxx.min(maxx);
        self.maxy = self.maxy.min(maxy);
    }
}

pub struct TileRasterizer {
    /// Per-cell sign accumulator, zeroed lazily by the emission scan.
    sign: Vec<i8>,
    /// Per-cell head of the edge free-list (0 = empty).
    head: Vec<u32>,
    /// Edge arena for the current draw. Slot 0 is the list terminator.
    edges: Vec<Edge>,
    links: Vec<u32>,
    edge_limit: usize,
    grid_w: i32,
    grid_h: i32,
    bounds: Bounds,
    /// No current subpath; the next segment starts one.
    reset: bool,
    start: Point,
    point: Point,
    winding: i32,
    /// Edges pushed this frame, for statistics.
    edge_stat: u32,
}

impl Default for TileRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TileRasterizer {
    pub fn new() -> Self {
        TileRasterizer {
            sign: Vec::new(),
            head: Vec::new(),
            edges: Vec::new(),
            links: Vec::new(),
            edge_limit: DEFAULT_EDGES,
            grid_w: 0,
            grid_h: 0,
            bounds: Bounds {
                minx: 0,
                miny: 0,
                maxx: 0,
                maxy: 0,
            },
            reset: true,
            start: Point::ZERO,
            point: Point::ZERO,
            winding: 1,
            edge_stat: 0,
        }
    }

    pub(crate) fn set_edge_limit(&mut self, limit: usize) {
        self.edge_limit = limit;
    }

    /// Size the grid for a viewport and zero both accumulator planes.
    /// Called once per frame.
    pub(crate) fn prime(&mut self, width: f32, height: f32) {
        self.grid_w = ((width / TILE_DIMS as f32).ceil() as i32 + 2).min(GRID_SIZE);
        self.grid_h = ((height / TILE_DIMS as f32).ceil() as i32 + 2).min(GRID_SIZE);
        let cells = (self.grid_w * self.grid_h) as usize;
        self.sign.clear();
        self.sign.resize(cells, 0);
        self.head.clear();
        self.head.resize(cells, 0);
        self.edge_stat = 0;
    }

    /// Reset the per-draw edge arena and touched bounds.
    pub(crate) fn begin(&mut self, winding: i32) {
        self.edges.clear();
        self.edges.push(Edge::default());
        self.links.clear();
        self.links.push(0);
        self.winding = winding;
        self.reset = true;
        self.bounds = Bounds {
            minx: self.grid_w,
            miny: self.grid_h,
            maxx: 0,
            maxy: 0,
        };
    }

    pub(crate) fn set_winding(&mut self, winding: i32) {
        self.winding = winding;
    }

    /// Edges in the current draw's arena (excluding the terminator slot).
    pub(crate) fn edge_count(&self) -> usize {
        self.edges.len() - 1
    }

    pub(crate) fn edges_this_frame(&self) -> u32 {
        self.edge_stat
    }

    /// Start a subpath at `p` (viewport coordinates).
    pub(crate) fn move_to(&mut self, p: Point) {
        self.move_to_raw(Point::new(p.x + TILE_DIMS as f32, p.y));
    }

    /// Extend the current subpath to `p` (viewport coordinates).
    pub(crate) fn line_to(&mut self, p: Point) {
        self.line_to_raw(Point::new(p.x + TILE_DIMS as f32, p.y));
    }

    /// Close the current subpath back to its start, if it is open.
    pub(crate) fn close(&mut self) {
        if !self.reset && self.point != self.start {
            let start = self.start;
            self.line_to_raw(start);
        }
        self.reset = true;
    }

    fn move_to_raw(&mut self, p: Point) {
        self.reset = false;
        self.start = p;
        self.point = p;
        self.push_bounds(p);
    }

    fn push_bounds(&mut self, p: Point) {
        let ix = (p.x / TILE_DIMS as f32) as i32;
        let iy = (p.y / TILE_DIMS as f32) as i32;
        self.bounds.add(ix, iy);
    }

    fn line_to_raw(&mut self, p: Point) {
        if self.reset {
            self.move_to_raw(p);
            return;
        }

        let x0 = (self.point.x * PIXEL_SIZE as f32) as i32;
        let y0 = (self.point.y * PIXEL_SIZE as f32) as i32;
        let x1 = (p.x * PIXEL_SIZE as f32) as i32;
        let y1 = (p.y * PIXEL_SIZE as f32) as i32;

        // Subpixel-identical endpoints leave the current point untouched.
        if x0 == x1 && y0 == y1 {
            return;
        }

        let mut ix0 = x0 >> TILE_LOG2;
        let mut iy0 = y0 >> TILE_LOG2;
        let mut ix1 = x1 >> TILE_LOG2;
        let mut iy1 = y1 >> TILE_LOG2;

        let mut walk = true;

        if (iy0 < 0 && iy1 < 0)
            || (ix0 > self.grid_w && ix1 > self.grid_w)
            || (iy0 > self.grid_h && iy1 > self.grid_h)
        {
            walk = false;
        } else if x0 < 0 && x1 < 0 {
            // Entirely left of the grid: only the gutter signs matter.
            self.push_sign_span(iy0, iy1);
            walk = false;
        }

        if walk {
            let dx = (x1 - x0).abs();
            let dy = (y1 - y0).abs();

            // Long segments bisect so the DDA increments stay in range.
            if dx >= 64 << TILE_LOG2 || dy >= 64 << TILE_LOG2 {
                let mid = (self.point + p) * 0.5;
                self.line_to_raw(mid);
                self.line_to_raw(p);
                return;
            }

            let ni = (ix1 - ix0).abs() + (iy1 - iy0).abs();

            let sx: i32 = if x1 >= x0 { 1 } else { -1 };
            let sy: i32 = if y1 >= y0 { 1 } else { -1 };
            let lx: i64 = if dy > 0 {
                ((dx as i64) << (EDGE_LOG2 + TILE_LOG2)) / dy as i64 * sx as i64
            } else {
                0
            };
            let ly: i64 = if dx > 0 {
                ((dy as i64) << (EDGE_LOG2 + TILE_LOG2)) / dx as i64 * sy as i64
            } else {
                0
            };
            let fx = (if sx > 0 { TILE_MASK - x0 } else { x0 }) & TILE_MASK;
            let fy = (if sy > 0 { TILE_MASK - y0 } else { y0 }) & TILE_MASK;
            let mut tx = (lx * ((fy as i64) << (EDGE_LOG2 - TILE_LOG2))) >> EDGE_LOG2;
            let mut ty = (ly * ((fx as i64) << (EDGE_LOG2 - TILE_LOG2))) >> EDGE_LOG2;

            let mut tx0;
            let mut ty0;
            let mut tx1 = x0;
            let mut ty1 = y0;
            ix1 = ix0;
            iy1 = iy0;

            let ex = -(dy << TILE_LOG2);
            let ey = dx << TILE_LOG2;
            let mut er = dx * (fy + 1) - dy * (fx + 1);

            for step in 0..=ni {
                tx0 = tx1;
                ty0 = ty1;
                ix0 = ix1;
                iy0 = iy1;

                if step == ni {
                    tx1 = x1;
                    ty1 = y1;
                } else if er > 0 {
                    // Crossing a vertical grid line.
                    tx1 = (ix0 + i32::from(sx > 0)) << TILE_LOG2;
                    ty1 = y0 + (ty >> EDGE_LOG2) as i32;

                    er += ex;
                    ty += ly;
                    ix1 += sx;

                    // A short vertical helper edge just inside the entered
                    // tile keeps its coverage consistent with the neighbor.
                    if sx > 0 {
                        self.push_edge(ix1, iy1, tx1 - 32, iy1 << TILE_LOG2, tx1 - 32, ty1);
                    } else {
                        self.push_edge(ix0, iy0, tx1 - 32, ty1, tx1 - 32, iy0 << TILE_LOG2);
                    }
                } else {
                    // Crossing a horizontal grid line.
                    tx1 = x0 + (tx >> EDGE_LOG2) as i32;
                    ty1 = (iy0 + i32::from(sy > 0)) << TILE_LOG2;

                    er += ey;
                    tx += lx;
                    iy1 += sy;

                    if sy > 0 {
                        self.push_sign(ix0, iy0, 1);
                    } else {
                        self.push_sign(ix1, iy1, -1);
                    }
                }

                self.push_edge(ix0, iy0, tx0, ty0, tx1, ty1);
            }
        }

        self.point = p;
        self.push_bounds(p);
    }

    /// Append a clipped edge to cell `(ix, iy)`.
    ///
    /// Silently dropped when the arena is full, the segment is degenerate,
    /// or the cell is off-grid.
    fn push_edge(&mut self, ix: i32, iy: i32, ax: i32, ay: i32, bx: i32, by: i32) {
        if self.edges.len() >= self.edge_limit
            || (ax == bx && ay == by)
            || ix < 0
            || ix >= self.grid_w
            || iy < 0
            || iy >= self.grid_h
        {
            return;
        }

        self.edge_stat += 1;

        let index = (ix + iy * self.grid_w) as usize;
        let edge = Edge::localize(ix, iy, ax, ay, bx, by);
        let edge = if self.winding > 0 { edge } else { edge.reversed() };

        let id = self.edges.len() as u32;
        self.edges.push(edge);
        self.links.push(self.head[index]);
        self.head[index] = id;
    }

    fn push_sign(&mut self, ix: i32, iy: i32, sign: i32) {
        if iy >= self.grid_h || iy < 0 || ix >= self.grid_w {
            return;
        }
        let ix = ix.max(0);
        let index = (ix + iy * self.grid_w) as usize;
        self.sign[index] = self.sign[index].wrapping_sub((sign * self.winding) as i8);
    }

    /// Apply a vertical run of sign updates in the gutter column for a
    /// segment entirely left of the grid.
    fn push_sign_span(&mut self, iy0: i32, iy1: i32) {
        let iy0 = iy0.clamp(0, self.grid_h - 1);
        let iy1 = iy1.clamp(0, self.grid_h - 1);

        let (row, count, value) = match iy1 - iy0 {
            dy if dy > 0 => (iy0, dy, -self.winding),
            dy if dy < 0 => (iy1, -dy, self.winding),
            _ => return,
        };

        for y in row..row + count {
            let index = (y * self.grid_w) as usize;
            self.sign[index] = self.sign[index].wrapping_add(value as i8);
        }
    }

    /// Scan the touched region and append tile records plus edge runs to
    /// the frame, consuming (zeroing) the scanned cells.
    ///
    /// If the frame cannot hold the worst-case output, it is flushed to the
    /// backend once, synchronously, before emission.
    pub(crate) fn emit<B: Backend>(
        &mut self,
        fill: &FillDescriptor,
        frame: &mut Frame,
        backend: &mut B,
        stats: &mut Stats,
    ) {
        let mut rect = self.bounds;
        if rect.minx > rect.maxx {
            return;
        }

        rect.minx -= 1;
        rect.maxx += 1;
        rect.maxy += 1;
        rect.clamp(self.grid_w - 1, self.grid_h - 1);

        let sizex = rect.maxx - rect.minx - 1;
        let sizey = rect.maxy - rect.miny;
        if sizex <= 0 || sizey <= 0 {
            return;
        }

        let max_tiles = (sizex * sizey) as usize;
        let max_words = FILL_WORDS + self.edge_count();
        if frame.tile_count() + max_tiles > frame.limits().tiles
            || frame.data_len() + max_words > frame.limits().data_words
        {
            frame.flush(backend, stats, self.edge_count());
        }

        let data_base = frame.push_fill(fill);

        for y in 0..sizey {
            let mut sign: i32 = 0;
            let mut index = (rect.minx + (rect.miny + y) * self.grid_w) as usize;
            for x in 0..=sizex {
                if x > 0 {
                    let run = frame.data_len();
                    let mut link = self.head[index];
                    while link != 0 {
                        frame.push_edge_word(self.edges[link as usize].packed());
                        link = self.links[link as usize];
                    }
                    let count = frame.data_len() - run;
                    if sign != 0 || count > 0 {
                        frame.push_tile(Tile::new(
                            rect.minx + x - 1,
                            rect.miny + y,
                            sign,
                            count,
                            data_base,
                            run,
                        ));
                    }
                }
                sign += self.sign[index] as i32;
                self.sign[index] = 0;
                self.head[index] = 0;
                index += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TileRasterizer;
    use crate::fill::FillStyle;
    use crate::fill::NO_CLIP;
    use crate::geom::Point;
    use crate::render::{Backend, Frame, Limits, Stats};
    use crate::tile::Tile;
    use crate::FillRule;
    use peniko::color::AlphaColor;
    use peniko::kurbo::Affine;

    struct Sink;

    impl Backend for Sink {
        fn clear(&mut self, _color: crate::fill::Color) {}
        fn flush(&mut self, _frame: &Frame) {}
    }

    fn descriptor() -> crate::fill::FillDescriptor {
        FillStyle::Flat {
            color: AlphaColor::new([1.0, 1.0, 1.0, 1.0]),
        }
        .descriptor(FillRule::NonZero, Affine::IDENTITY, NO_CLIP, 0.0, 1.0)
    }

    fn rect_tiles(x0: f32, y0: f32, x1: f32, y1: f32) -> Vec<Tile> {
        let mut raster = TileRasterizer::new();
        raster.prime(64.0, 64.0);
        raster.begin(1);
        raster.move_to(Point::new(x0, y0));
        raster.line_to(Point::new(x1, y0));
        raster.line_to(Point::new(x1, y1));
        raster.line_to(Point::new(x0, y1));
        raster.close();

        let mut frame = Frame::new(Limits::default());
        let mut stats = Stats::default();
        raster.emit(&descriptor(), &mut frame, &mut Sink, &mut stats);
        frame.tiles().to_vec()
    }

    #[test]
    fn tile_aligned_rect_emits_boundary_and_interior() {
        // 16..48 covers tiles 2..6 on both axes. The bottom boundary lies
        // exactly on the row 5/6 tile line, so its edges land in row 6,
        // where they contribute zero coverage.
        let tiles = rect_tiles(16.0, 16.0, 48.0, 48.0);
        assert!(!tiles.is_empty());
        for t in &tiles {
            assert!((1..=6).contains(&t.x()), "x = {}", t.x());
            assert!((2..=6).contains(&t.y()), "y = {}", t.y());
        }
        // An interior tile is pure sign, no edges.
        let interior = tiles
            .iter()
            .find(|t| t.x() == 3 && t.y() == 3)
            .expect("interior tile emitted");
        assert_eq!(interior.count, 0);
        assert_eq!(interior.sign, 1);
        // A tile on the left boundary carries edges.
        let left = tiles
            .iter()
            .find(|t| t.x() == 2 && t.y() == 3)
            .expect("boundary tile emitted");
        assert!(left.count > 0);
    }

    #[test]
    fn unaligned_rect_tiles_carry_edges() {
        let tiles = rect_tiles(10.0, 10.0, 30.0, 30.0);
        // Tile (1, 1) holds the top-left corner geometry.
        let corner = tiles
            .iter()
            .find(|t| t.x() == 1 && t.y() == 1)
            .expect("corner tile");
        assert!(corner.count >= 2);
    }

    #[test]
    fn fully_left_geometry_updates_gutter_signs_only() {
        let mut raster = TileRasterizer::new();
        raster.prime(64.0, 64.0);
        raster.begin(1);
        // A rect far left of the viewport; its right side still crosses
        // rows 1..3 in the gutter.
        raster.move_to(Point::new(-100.0, 10.0));
        raster.line_to(Point::new(-60.0, 10.0));
        raster.line_to(Point::new(-60.0, 26.0));
        raster.line_to(Point::new(-100.0, 26.0));
        raster.close();
        assert_eq!(raster.edge_count(), 0);

        let mut frame = Frame::new(Limits::default());
        let mut stats = Stats::default();
        raster.emit(&descriptor(), &mut frame, &mut Sink, &mut stats);
        // Net winding cancels right of the shape, so nothing on screen.
        assert!(frame.tiles().iter().all(|t| t.count == 0 && t.sign == 0));
    }

    #[test]
    fn open_subpath_is_closed_before_emit() {
        let mut raster = TileRasterizer::new();
        raster.prime(64.0, 64.0);
        raster.begin(1);
        raster.move_to(Point::new(8.0, 8.0));
        raster.line_to(Point::new(40.0, 8.0));
        raster.line_to(Point::new(40.0, 40.0));
        raster.line_to(Point::new(8.0, 40.0));
        // No explicit return to the start.
        raster.close();

        let mut frame = Frame::new(Limits::default());
        let mut stats = Stats::default();
        raster.emit(&descriptor(), &mut frame, &mut Sink, &mut stats);
        // The closing segment produced left-boundary edges, so the interior
        // is covered.
        let interior = frame.tiles().iter().find(|t| t.x() == 3 && t.y() == 3);
        assert!(matches!(interior, Some(t) if t.sign != 0 || t.count > 0));
    }

    #[test]
    fn full_arena_drops_edges_silently() {
        let mut raster = TileRasterizer::new();
        raster.prime(64.0, 64.0);
        raster.set_edge_limit(4);
        raster.begin(1);
        raster.move_to(Point::new(2.0, 2.0));
        for i in 0..32 {
            raster.line_to(Point::new(2.0 + i as f32, 30.0));
            raster.line_to(Point::new(2.0 + i as f32, 2.0));
        }
        raster.close();
        assert!(raster.edge_count() <= 3);
    }

    #[test]
    fn long_segment_bisects_without_overflow() {
        let mut raster = TileRasterizer::new();
        raster.prime(1024.0, 1024.0);
        raster.begin(1);
        raster.move_to(Point::new(0.0, 0.0));
        raster.line_to(Point::new(1000.0, 900.0));
        raster.line_to(Point::new(0.0, 900.0));
        raster.close();
        assert!(raster.edge_count() > 0);
    }

    #[test]
    fn negative_winding_reverses_stored_edges() {
        let collect = |winding: i32| -> Vec<u32> {
            let mut raster = TileRasterizer::new();
            raster.prime(64.0, 64.0);
            raster.begin(winding);
            raster.move_to(Point::new(4.0, 4.0));
            raster.line_to(Point::new(20.0, 12.0));
            raster.close();
            let mut frame = Frame::new(Limits::default());
            let mut stats = Stats::default();
            raster.emit(&descriptor(), &mut frame, &mut Sink, &mut stats);
            frame
                .tiles()
                .iter()
                .flat_map(|t| {
                    let start = t.edges as usize;
                    frame.data()[start..start + t.count as usize].to_vec()
                })
                .collect()
        };
        let pos = collect(1);
        let neg = collect(-1);
        assert_eq!(pos.len(), neg.len());
        for (p, n) in pos.iter().zip(&neg) {
            let pe = crate::tile::Edge::unpack(*p);
            let ne = crate::tile::Edge::unpack(*n);
            assert_eq!(pe, ne.reversed());
        }
    }
}
