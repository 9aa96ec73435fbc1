// Copyright 2026 the Tilevg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stroke outline expansion.
//!
//! Each subpath becomes one self-closing ribbon: a forward pass offset by
//! the per-segment half-width normal, then a reverse pass offset the other
//! way. Closed subpaths close the ribbon between the passes, producing two
//! concentric rings. Ribbons always rasterize under the nonzero rule.
//!
//! Normals are computed in device space but normalized in object space, so
//! a scaled or rotated transform keeps the stroke width visually uniform.
//! There is no join or cap geometry; adjacent segments overlap at their
//! shared vertex, which the nonzero rule absorbs.

use peniko::kurbo::Affine;

use crate::geom::{AffineExt, Point};
use crate::path::PathBuffer;
use crate::raster::TileRasterizer;

/// Feed the stroke outlines of every stored subpath into the rasterizer.
///
/// `normals` is caller-owned scratch, one entry per path point: the scaled
/// normal of the segment starting there. The last point of each subpath has
/// no outgoing segment and keeps a zero normal.
pub(crate) fn expand(
    raster: &mut TileRasterizer,
    path: &PathBuffer,
    transform: Affine,
    width: f32,
    normals: &mut Vec<Point>,
) {
    let r = width / 2.0;
    let inverse = transform.safe_inverse();

    normals.clear();
    normals.resize(path.point_count(), Point::ZERO);

    for (sub, pts) in path.subpaths() {
        let base = sub.start as usize;
        for (k, pair) in pts.windows(2).enumerate() {
            let d = pair[1] - pair[0];
            // Device-space normal, renormalized in object space.
            let mut n = inverse.project_vec(Point::new(d.y, -d.x));
            if n.normalize().is_none() {
                continue;
            }
            normals[base + k] = transform.project_vec(n) * r;
        }
    }

    for (sub, pts) in path.subpaths() {
        if pts.is_empty() {
            continue;
        }
        let base = sub.start as usize;
        raster.set_winding(if sub.positive { 1 } else { -1 });

        let mut p0 = pts[0];
        let mut n0 = normals[base];
        for j in 1..pts.len() {
            let p1 = pts[j];
            raster.line_to(p0 + n0);
            raster.line_to(p1 + n0);
            p0 = p1;
            n0 = normals[base + j];
        }

        // A closed input strokes as two rings; close the outer one here so
        // the reverse pass starts a fresh inner ring.
        if sub.closed {
            raster.close();
        }

        let last = if sub.closed {
            pts.len() as i32 - 2
        } else {
            pts.len() as i32 - 1
        };
        for j in (0..=last).rev() {
            let pj = pts[j as usize];
            let nj = normals[base + j as usize];
            raster.line_to(p0 - nj);
            raster.line_to(pj - nj);
            p0 = pj;
        }

        raster.close();
    }
}
