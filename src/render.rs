// Copyright 2026 the Tilevg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The render context and frame plumbing.
//!
//! [`RenderContext`] owns every arena a frame needs: the path buffer, the
//! tile rasterizer, the frame's data and tile buffers, the draw state and
//! its stack. Draw calls rasterize immediately into the frame buffers;
//! [`RenderContext::flush`] hands the accumulated buffers to the backend.
//! A draw that would overflow the frame triggers one implicit flush first,
//! so a frame of any complexity completes in bounded memory.

use peniko::kurbo::Affine;

use crate::fill::{Color, FillDescriptor, FillStyle, NO_CLIP};
use crate::geom::{encode_affine, AffineExt, Point};
use crate::path::PathBuffer;
use crate::raster::{TileRasterizer, DEFAULT_EDGES};
use crate::tile::Tile;
use crate::{stroke, Error, FillRule, Winding};

/// Default path point arena capacity.
const DEFAULT_PATH_POINTS: usize = 1 << 20;

/// Receives finished frame buffers.
///
/// Implementations upload `frame.data()` and `frame.tiles()` and issue the
/// instanced draw; the context clears both buffers after the call returns.
pub trait Backend {
    fn clear(&mut self, color: Color);
    fn flush(&mut self, frame: &Frame);
}

/// A backend that discards everything. Useful for benchmarks.
#[derive(Default)]
pub struct NullBackend;

impl Backend for NullBackend {
    fn clear(&mut self, _color: Color) {}
    fn flush(&mut self, _frame: &Frame) {}
}

/// Soft capacities of the frame buffers.
///
/// These are flush thresholds, not hard caps: a single draw larger than a
/// whole frame still completes, it just flushes first and then grows the
/// buffers as needed.
#[derive(Clone, Copy, Debug)]
pub struct Limits {
    /// u32 words of descriptor + edge data per flush.
    pub data_words: usize,
    /// Tile records per flush.
    pub tiles: usize,
    /// Edge arena entries per draw; edges beyond this are dropped.
    pub edges: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            data_words: 1 << 22,
            tiles: 1 << 18,
            edges: DEFAULT_EDGES,
        }
    }
}

/// Per-frame counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// Edges stored by the rasterizer.
    pub edges: u32,
    /// Tile records handed to the backend.
    pub tiles: u32,
    /// Backend flushes.
    pub draws: u32,
    /// Approximate bytes uploaded.
    pub upload: u64,
}

/// The linear output buffers of a frame in progress.
pub struct Frame {
    data: Vec<u32>,
    tiles: Vec<Tile>,
    limits: Limits,
}

impl Frame {
    pub(crate) fn new(limits: Limits) -> Frame {
        Frame {
            data: Vec::new(),
            tiles: Vec::new(),
            limits,
        }
    }

    /// Descriptor and edge words, indexed by the offsets in tile records.
    pub fn data(&self) -> &[u32] {
        &self.data
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub(crate) fn limits(&self) -> &Limits {
        &self.limits
    }

    pub(crate) fn data_len(&self) -> usize {
        self.data.len()
    }

    pub(crate) fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Append a fill descriptor, returning its word offset.
    pub(crate) fn push_fill(&mut self, fill: &FillDescriptor) -> usize {
        let base = self.data.len();
        self.data.extend_from_slice(fill.words());
        base
    }

    pub(crate) fn push_edge_word(&mut self, word: u32) {
        self.data.push(word);
    }

    pub(crate) fn push_tile(&mut self, tile: Tile) {
        self.tiles.push(tile);
    }

    /// Hand the buffers to the backend and reset them.
    ///
    /// `edges` is the current draw's edge arena occupancy, counted into the
    /// upload estimate.
    pub(crate) fn flush<B: Backend>(&mut self, backend: &mut B, stats: &mut Stats, edges: usize) {
        if !self.tiles.is_empty() {
            backend.flush(self);
        }
        stats.draws += 1;
        stats.tiles += self.tiles.len() as u32;
        stats.upload += (16 * self.tiles.len() + 4 * edges) as u64;
        self.tiles.clear();
        self.data.clear();
    }

    /// Discard buffered output without involving the backend.
    pub(crate) fn reset(&mut self) {
        self.tiles.clear();
        self.data.clear();
    }
}

/// Draw state saved and restored by [`RenderContext::push`]/[`pop`].
///
/// [`pop`]: RenderContext::pop
#[derive(Clone, Copy)]
struct State {
    rule: FillRule,
    winding: Winding,
    spaa: f32,
    alpha: f32,
    transform: Affine,
    clip: [f32; 6],
}

pub struct RenderContext<B: Backend> {
    backend: B,
    width: f32,
    height: f32,
    state: State,
    stack: Vec<State>,
    path: PathBuffer,
    raster: TileRasterizer,
    frame: Frame,
    stats: Stats,
    normals: Vec<Point>,
}

impl<B: Backend> RenderContext<B> {
    pub fn new(width: u32, height: u32, backend: B) -> Self {
        Self::with_limits(width, height, backend, Limits::default())
    }

    pub fn with_limits(width: u32, height: u32, backend: B, limits: Limits) -> Self {
        let mut raster = TileRasterizer::new();
        raster.set_edge_limit(limits.edges);
        let mut ctx = RenderContext {
            backend,
            width: width as f32,
            height: height as f32,
            state: State {
                rule: FillRule::NonZero,
                winding: Winding::Positive,
                spaa: 0.0,
                alpha: 1.0,
                transform: Affine::IDENTITY,
                clip: NO_CLIP,
            },
            stack: Vec::new(),
            path: PathBuffer::new(DEFAULT_PATH_POINTS),
            raster,
            frame: Frame::new(limits),
            stats: Stats::default(),
            normals: Vec::new(),
        };
        ctx.begin();
        ctx
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Start a frame: reset statistics, paths, state and output buffers.
    /// Anything buffered but not flushed is discarded.
    pub fn begin(&mut self) {
        self.stats = Stats::default();
        self.path.clear();
        self.stack.clear();
        self.reset();
        self.raster.prime(self.width, self.height);
        self.frame.reset();
    }

    /// Finish the frame, flushing buffered draws to the backend.
    pub fn end(&mut self) {
        self.flush();
    }

    /// Force buffered output to the backend now. Draws batched into one
    /// flush blend in descriptor order only per tile, so callers needing
    /// strict painter's order between overlapping draws flush between them.
    pub fn flush(&mut self) {
        self.stats.edges = self.raster.edges_this_frame();
        self.frame
            .flush(&mut self.backend, &mut self.stats, self.raster.edge_count());
    }

    pub fn clear(&mut self, color: Color) {
        self.backend.clear(color);
    }

    pub fn stats(&self) -> Stats {
        let mut stats = self.stats;
        stats.edges = self.raster.edges_this_frame();
        stats
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    // State.

    /// Restore the default draw state. The supersampling strength is
    /// deliberately kept; it is a quality setting, not a draw state.
    pub fn reset(&mut self) {
        self.state.rule = FillRule::NonZero;
        self.state.winding = Winding::Positive;
        self.state.alpha = 1.0;
        self.state.transform = Affine::IDENTITY;
        self.state.clip = NO_CLIP;
    }

    pub fn push(&mut self) {
        self.stack.push(self.state);
    }

    pub fn pop(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    pub fn set_fill_rule(&mut self, rule: FillRule) {
        self.state.rule = rule;
    }

    pub fn set_winding(&mut self, winding: Winding) {
        self.state.winding = winding;
    }

    /// Set the staggered supersampling strength, 0 (off) to 1.
    pub fn set_aa_strength(&mut self, spaa: f32) {
        self.state.spaa = spaa;
    }

    /// Multiply the global alpha by `alpha` (clamped to 0..=1).
    pub fn mul_alpha(&mut self, alpha: f32) {
        self.state.alpha *= alpha.clamp(0.0, 1.0);
    }

    pub fn transform(&self) -> Affine {
        self.state.transform
    }

    pub fn set_transform(&mut self, transform: Affine) {
        self.state.transform = transform;
    }

    pub fn identity(&mut self) {
        self.state.transform = Affine::IDENTITY;
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        self.state.transform = self.state.transform * Affine::translate((x as f64, y as f64));
    }

    /// Rotate by `angle` radians.
    pub fn rotate(&mut self, angle: f32) {
        self.state.transform = self.state.transform * Affine::rotate(angle as f64);
    }

    pub fn scale(&mut self, x: f32, y: f32) {
        self.state.transform =
            self.state.transform * Affine::scale_non_uniform(x as f64, y as f64);
    }

    /// Object space to device space under the current transform.
    pub fn project(&self, x: f32, y: f32) -> (f32, f32) {
        let p = self.state.transform.project(Point::new(x, y));
        (p.x, p.y)
    }

    /// Device space back to object space.
    pub fn unproject(&self, x: f32, y: f32) -> (f32, f32) {
        let p = self
            .state
            .transform
            .safe_inverse()
            .project(Point::new(x, y));
        (p.x, p.y)
    }

    /// Clip subsequent draws to the given rect in the current transform's
    /// object space. The evaluator feathers the boundary by one pixel, hence
    /// the half-pixel inset here.
    pub fn set_clip(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let x = x + 0.5;
        let y = y + 0.5;
        let iw = 1.0 / (w - 1.0);
        let ih = 1.0 / (h - 1.0);
        let m = encode_affine(self.state.transform.safe_inverse());
        self.state.clip = [
            m[0] * iw,
            m[1] * iw,
            m[2] * iw - x * iw,
            m[3] * ih,
            m[4] * ih,
            m[5] * ih - y * ih,
        ];
    }

    pub fn reset_clip(&mut self) {
        self.state.clip = NO_CLIP;
    }

    // Path building.

    /// Discard all stored paths and start fresh.
    pub fn begin_path(&mut self) {
        self.path.clear();
    }

    /// Start a new subpath at `(x, y)`.
    pub fn move_to(&mut self, x: f32, y: f32) -> Result<(), Error> {
        self.path.seal();
        let p = self.state.transform.project(Point::new(x, y));
        self.path.push(p, self.positive())
    }

    pub fn line_to(&mut self, x: f32, y: f32) -> Result<(), Error> {
        let p = self.state.transform.project(Point::new(x, y));
        self.path.push(p, self.positive())
    }

    /// Quadratic Bezier through control point `(ax, ay)` to `(x, y)`.
    pub fn quad_to(&mut self, ax: f32, ay: f32, x: f32, y: f32) -> Result<(), Error> {
        let a = self.state.transform.project(Point::new(ax, ay));
        let p = self.state.transform.project(Point::new(x, y));
        let positive = self.positive();
        let viewport = self.viewport();
        crate::flatten::quad(&mut self.path, positive, viewport, a, p)
    }

    /// Cubic Bezier through `(ax, ay)` and `(bx, by)` to `(x, y)`.
    pub fn cubic_to(
        &mut self,
        ax: f32,
        ay: f32,
        bx: f32,
        by: f32,
        x: f32,
        y: f32,
    ) -> Result<(), Error> {
        let a = self.state.transform.project(Point::new(ax, ay));
        let b = self.state.transform.project(Point::new(bx, by));
        let p = self.state.transform.project(Point::new(x, y));
        let positive = self.positive();
        let viewport = self.viewport();
        crate::flatten::cubic(&mut self.path, positive, viewport, a, b, p)
    }

    /// Close the current subpath back to its start.
    pub fn close_path(&mut self) -> Result<(), Error> {
        self.path.close()
    }

    fn positive(&self) -> bool {
        self.state.winding == Winding::Positive
    }

    fn viewport(&self) -> Point {
        Point::new(self.width, self.height)
    }

    // Draws.

    /// Fill the stored paths with the given style under the current state.
    ///
    /// The paths stay available for further draws until new geometry is
    /// pushed, so a fill followed by a stroke reuses them.
    pub fn fill(&mut self, style: &FillStyle) {
        let fill = style.descriptor(
            self.state.rule,
            self.state.transform,
            self.state.clip,
            self.state.spaa,
            self.state.alpha,
        );
        self.path.seal();
        self.path.mark_stale();
        self.raster.begin(self.state.winding.sign());
        for (sub, pts) in self.path.subpaths() {
            self.raster.set_winding(if sub.positive { 1 } else { -1 });
            let mut pts = pts.iter();
            if let Some(first) = pts.next() {
                self.raster.move_to(*first);
            }
            for p in pts {
                self.raster.line_to(*p);
            }
            self.raster.close();
        }
        self.raster
            .emit(&fill, &mut self.frame, &mut self.backend, &mut self.stats);
    }

    /// Stroke the stored paths with a flat color of the given width.
    ///
    /// Strokes are self-overlapping ribbons and always rasterize under the
    /// nonzero rule, independent of the context fill rule.
    pub fn stroke(&mut self, color: Color, width: f32) {
        let fill = FillStyle::Flat { color }.descriptor(
            FillRule::NonZero,
            self.state.transform,
            self.state.clip,
            self.state.spaa,
            self.state.alpha,
        );
        self.path.seal();
        self.path.mark_stale();
        self.raster.begin(self.state.winding.sign());
        stroke::expand(
            &mut self.raster,
            &self.path,
            self.state.transform,
            width,
            &mut self.normals,
        );
        self.raster
            .emit(&fill, &mut self.frame, &mut self.backend, &mut self.stats);
    }
}

#[cfg(test)]
mod tests {
    use super::{NullBackend, RenderContext};
    use crate::fill::FillStyle;
    use crate::{FillRule, Winding};
    use peniko::color::AlphaColor;

    fn ctx() -> RenderContext<NullBackend> {
        RenderContext::new(256, 256, NullBackend)
    }

    #[test]
    fn state_stack_round_trip() {
        let mut ctx = ctx();
        ctx.set_fill_rule(FillRule::EvenOdd);
        ctx.translate(10.0, 0.0);
        ctx.push();
        ctx.set_fill_rule(FillRule::Negative);
        ctx.set_winding(Winding::Negative);
        ctx.scale(2.0, 2.0);
        ctx.pop();
        assert_eq!(ctx.project(0.0, 0.0), (10.0, 0.0));
        // Pop on an empty stack is ignored.
        ctx.pop();
        assert_eq!(ctx.project(0.0, 0.0), (10.0, 0.0));
    }

    #[test]
    fn alpha_accumulates_and_clamps() {
        let mut ctx = ctx();
        ctx.mul_alpha(0.5);
        // Values above 1 clamp, leaving alpha unchanged.
        ctx.mul_alpha(2.0);
        assert_eq!(ctx.state.alpha, 0.5);
        ctx.mul_alpha(0.5);
        assert_eq!(ctx.state.alpha, 0.25);
    }

    #[test]
    fn reset_keeps_aa_strength() {
        let mut ctx = ctx();
        ctx.set_aa_strength(1.0);
        ctx.set_fill_rule(FillRule::EvenOdd);
        ctx.mul_alpha(0.5);
        ctx.reset();
        ctx.move_to(10.0, 10.0).unwrap();
        ctx.line_to(50.0, 10.0).unwrap();
        ctx.line_to(50.0, 50.0).unwrap();
        ctx.fill(&FillStyle::Flat {
            color: AlphaColor::new([0.0, 0.0, 0.0, 1.0]),
        });
        let word0 = ctx.frame.data()[0];
        // Rule and alpha went back to their defaults.
        assert_eq!(word0 & 0xFF, 2);
        assert_eq!(ctx.frame.data()[1] >> 24, 255);
        // The supersampling strength survived the reset.
        assert_eq!((word0 >> 16) & 0xFF, 255);
    }

    #[test]
    fn project_unproject_inverse() {
        let mut ctx = ctx();
        ctx.translate(30.0, 40.0);
        ctx.rotate(std::f32::consts::FRAC_PI_3);
        ctx.scale(2.0, 3.0);
        let (dx, dy) = ctx.project(7.0, -2.0);
        let (x, y) = ctx.unproject(dx, dy);
        assert!((x - 7.0).abs() < 1e-3);
        assert!((y + 2.0).abs() < 1e-3);
    }

    #[test]
    fn clip_matrix_maps_rect_to_unit_box() {
        let mut ctx = ctx();
        ctx.set_clip(20.0, 30.0, 101.0, 51.0);
        // The screen center of the clip rect maps to (0.5, 0.5).
        let c = ctx.state.clip;
        let (cx, cy) = (70.5, 55.5);
        let u = c[0] * cx + c[1] * cy + c[2];
        let v = c[3] * cx + c[4] * cy + c[5];
        assert!((u - 0.5).abs() < 1e-4, "u = {u}");
        assert!((v - 0.5).abs() < 1e-4, "v = {v}");
    }

    #[test]
    fn stats_count_draw_flushes() {
        let mut ctx = ctx();
        ctx.begin();
        ctx.move_to(10.0, 10.0).unwrap();
        ctx.line_to(50.0, 10.0).unwrap();
        ctx.line_to(50.0, 50.0).unwrap();
        ctx.fill(&FillStyle::Flat {
            color: AlphaColor::new([1.0, 0.0, 0.0, 1.0]),
        });
        ctx.end();
        let stats = ctx.stats();
        assert_eq!(stats.draws, 1);
        assert!(stats.tiles > 0);
        assert!(stats.edges > 0);
        assert!(stats.upload > 0);
    }

    #[test]
    fn path_survives_for_second_draw() {
        let mut ctx = ctx();
        ctx.begin();
        ctx.move_to(10.0, 10.0).unwrap();
        ctx.line_to(50.0, 10.0).unwrap();
        ctx.line_to(50.0, 50.0).unwrap();
        ctx.fill(&FillStyle::Flat {
            color: AlphaColor::new([1.0, 0.0, 0.0, 1.0]),
        });
        let after_fill = ctx.stats().edges;
        ctx.stroke(AlphaColor::new([0.0, 0.0, 0.0, 1.0]), 2.0);
        assert!(ctx.stats().edges > after_fill);
    }
}
