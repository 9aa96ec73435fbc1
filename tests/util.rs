// Copyright 2026 the Tilevg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use tilevg::fill::Color;
use tilevg::render::{Backend, Frame, RenderContext};
use tilevg::tile::Tile;

/// Backend that keeps the most recent flush for inspection.
#[derive(Default)]
pub struct RecordingBackend {
    pub data: Vec<u32>,
    pub tiles: Vec<Tile>,
    pub flushes: usize,
    pub cleared: Option<Color>,
}

impl Backend for RecordingBackend {
    fn clear(&mut self, color: Color) {
        self.cleared = Some(color);
    }

    fn flush(&mut self, frame: &Frame) {
        self.flushes += 1;
        self.data = frame.data().to_vec();
        self.tiles = frame.tiles().to_vec();
    }
}

pub fn ctx(size: u32) -> RenderContext<RecordingBackend> {
    RenderContext::new(size, size, RecordingBackend::default())
}

/// Coverage canvas of the last flushed frame.
pub fn alpha_canvas(ctx: &RenderContext<RecordingBackend>, size: usize) -> Vec<f32> {
    let backend = ctx.backend();
    tilevg::fine::render_alpha(&backend.data, &backend.tiles, size, size)
}

/// A full circle out of four cubic arcs.
pub fn circle(
    ctx: &mut RenderContext<RecordingBackend>,
    cx: f32,
    cy: f32,
    r: f32,
) -> Result<(), tilevg::Error> {
    let k = 0.552_284_8 * r;
    ctx.move_to(cx + r, cy)?;
    ctx.cubic_to(cx + r, cy + k, cx + k, cy + r, cx, cy + r)?;
    ctx.cubic_to(cx - k, cy + r, cx - r, cy + k, cx - r, cy)?;
    ctx.cubic_to(cx - r, cy - k, cx - k, cy - r, cx, cy - r)?;
    ctx.cubic_to(cx + k, cy - r, cx + r, cy - k, cx + r, cy)?;
    ctx.close_path()
}

/// An axis-aligned rectangle subpath.
pub fn rect(
    ctx: &mut RenderContext<RecordingBackend>,
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
) -> Result<(), tilevg::Error> {
    ctx.move_to(x0, y0)?;
    ctx.line_to(x1, y0)?;
    ctx.line_to(x1, y1)?;
    ctx.line_to(x0, y1)?;
    ctx.close_path()
}
