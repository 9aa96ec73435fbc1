// Copyright 2026 the Tilevg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CPU reference evaluation of the tile coverage contract.
//!
//! This mirrors, operation for operation, what the GPU fragment shader does
//! with the frame buffers: decode a tile's edges into pixel-local
//! coordinates, clip each to the pixel's unit row, accumulate signed
//! trapezoid areas against the pixel window on top of the tile's sign base,
//! then map the total through the draw's winding policy. With staggered
//! supersampling enabled, three sub-row windows are evaluated and blended.
//!
//! Color evaluation is out of scope; this module produces coverage masks,
//! which is what the tests assert against. The clip matrix is honored as a
//! hard boundary (the GPU feathers it by one pixel).

use crate::geom::Point;
use crate::tile::{Edge, Tile, EDGE_BORDER, PIXEL_SIZE, TILE_DIMS};
use crate::FillRule;

/// GLSL `sign()`: zero maps to zero, unlike `f32::signum`.
fn glsl_sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn rule_from_mode(mode: i8) -> FillRule {
    match mode {
        -1 => FillRule::Negative,
        2 => FillRule::NonZero,
        3 => FillRule::EvenOdd,
        4 => FillRule::Intersection,
        _ => FillRule::Positive,
    }
}

/// Signed area between an edge and the right side of `window`, after the
/// edge has been clipped to the pixel's unit row. `l` carries the edge's
/// inverse slopes `(dx/dy, dy/dx)`.
fn eval_area(mut a: Point, mut b: Point, l: Point, window: (f32, f32)) -> f32 {
    let (wx, wy) = window;
    let mut area = 0.0;

    // Clip against the right side.
    if glsl_sign(a.x - wy) != glsl_sign(b.x - wy) {
        if a.x < b.x {
            b.y -= (b.x - wy) * l.y;
            b.x = wy;
        } else {
            a.y -= (a.x - wy) * l.y;
            a.x = wy;
        }
    } else if a.x > wy {
        return 0.0;
    }

    // An edge straddling the left side splits into a full-width rectangle
    // and the remaining trapezoid.
    if glsl_sign(a.x - wx) != glsl_sign(b.x - wx) {
        let th;
        if a.x < b.x {
            let ty = a.y - (a.x - wx) * l.y;
            th = ty - a.y;
            a.y = ty;
            a.x = wx;
        } else {
            let ty = b.y - (b.x - wx) * l.y;
            th = b.y - ty;
            b.y = ty;
            b.x = wx;
        }
        area -= th;
    }

    let th = (b.y - a.y).clamp(-1.0, 1.0);
    let ta = (wy - a.x).clamp(0.0, wy - wx) / (wy - wx);
    let tb = (wy - b.x).clamp(0.0, wy - wx) / (wy - wx);
    area -= (ta + tb) * 0.5 * th;

    area
}

/// Coverage alpha for each pixel of one emitted tile.
///
/// `data` is the frame's data buffer the tile's offsets index into.
pub fn tile_alpha(data: &[u32], tile: &Tile) -> [[f32; 8]; 8] {
    let base = tile.data as usize;
    let args = data[base];
    let rule = rule_from_mode((args & 0xFF) as u8 as i8);
    let spaa = ((args >> 16) & 0xFF) as f32 / 255.0;

    let start = tile.edges as usize;
    let end = start + tile.count as usize;

    let mut out = [[0.0f32; 8]; 8];
    for (py, row) in out.iter_mut().enumerate() {
        for (px, alpha) in row.iter_mut().enumerate() {
            let mut area = [f32::from(tile.sign); 3];

            for word in &data[start..end] {
                let e = Edge::unpack(*word);
                let decode = |v: u8| (f32::from(v) - EDGE_BORDER as f32) / PIXEL_SIZE as f32;
                let mut a = Point::new(decode(e.x0) - px as f32, decode(e.y0) - py as f32);
                let mut b = Point::new(decode(e.x1) - px as f32, decode(e.y1) - py as f32);
                let d = b - a;
                let l = Point::new(d.x / d.y, d.y / d.x);

                // Clip to the pixel's row, top then bottom.
                if glsl_sign(a.y) != glsl_sign(b.y) {
                    if d.y > 0.0 {
                        a.x -= a.y * l.x;
                        a.y = 0.0;
                    } else {
                        b.x -= b.y * l.x;
                        b.y = 0.0;
                    }
                } else if a.y < 0.0 {
                    continue;
                }
                if glsl_sign(a.y - 1.0) != glsl_sign(b.y - 1.0) {
                    if d.y > 0.0 {
                        b.x -= (b.y - 1.0) * l.x;
                        b.y = 1.0;
                    } else {
                        a.x -= (a.y - 1.0) * l.x;
                        a.y = 1.0;
                    }
                } else if a.y > 1.0 {
                    continue;
                }

                if spaa > 0.0 {
                    area[0] += eval_area(a, b, l, (0.0, 1.0 / 3.0));
                    area[1] += eval_area(a, b, l, (1.0 / 3.0, 2.0 / 3.0));
                    area[2] += eval_area(a, b, l, (2.0 / 3.0, 1.0));
                } else {
                    let v = eval_area(a, b, l, (0.0, 1.0));
                    area[0] += v;
                    area[1] += v;
                    area[2] += v;
                }
            }

            if spaa > 0.0 && spaa < 1.0 {
                let avg = (area[0] + area[1] + area[2]) / 3.0;
                for c in &mut area {
                    *c = avg + (*c - avg) * spaa;
                }
            }

            let masked: f32 = area.iter().map(|&c| rule.alpha(c)).sum();
            *alpha = masked / 3.0;
        }
    }
    out
}

/// Composite every tile's coverage into a width x height alpha canvas,
/// honoring each draw's clip matrix as a hard boundary.
pub fn render_alpha(data: &[u32], tiles: &[Tile], width: usize, height: usize) -> Vec<f32> {
    let mut canvas = vec![0.0f32; width * height];
    for tile in tiles {
        let mask = tile_alpha(data, tile);
        let base = tile.data as usize;
        let clip: Vec<f32> = (0..6).map(|i| f32::from_bits(data[base + 3 + i])).collect();
        for (py, row) in mask.iter().enumerate() {
            for (px, &alpha) in row.iter().enumerate() {
                let x = tile.x() * TILE_DIMS + px as i32;
                let y = tile.y() * TILE_DIMS + py as i32;
                if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
                    continue;
                }
                let (sx, sy) = (x as f32 + 0.5, y as f32 + 0.5);
                let u = clip[0] * sx + clip[1] * sy + clip[2];
                let v = clip[3] * sx + clip[4] * sy + clip[5];
                let rx = (u - 0.5).abs() - 0.5;
                let ry = (v - 0.5).abs() - 0.5;
                let dist = (rx.max(0.0).hypot(ry.max(0.0))) + rx.max(ry).min(0.0);
                if dist > 0.0 {
                    continue;
                }
                let dst = &mut canvas[y as usize * width + x as usize];
                *dst = alpha + *dst * (1.0 - alpha);
            }
        }
    }
    canvas
}
