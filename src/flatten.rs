// Copyright 2026 the Tilevg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adaptive flattening of quadratic and cubic Beziers into line segments.
//!
//! Recursive midpoint subdivision with a squared-deviation flatness test.
//! Input points are already in device space; the emitted points land in the
//! caller's [`PathBuffer`] and the curve's start point is assumed to be the
//! buffer's current point.

use crate::geom::Point;
use crate::path::PathBuffer;
use crate::Error;

/// Flatness tolerance in squared-deviation units.
const TOLERANCE: f32 = 0.125;

/// Subdivision stops once a chord fits inside half a device pixel per axis.
const MIN_CHORD: f32 = 0.5;

const MAX_DEPTH: u32 = 10;

/// Flatten a quadratic from the buffer's current point through `a` to `p`.
///
/// Curves entirely outside the device viewport on one side are not
/// subdivided; the control and end points are pushed as straight segments,
/// which preserves winding while skipping the recursion.
pub(crate) fn quad(
    buf: &mut PathBuffer,
    positive: bool,
    viewport: Point,
    a: Point,
    p: Point,
) -> Result<(), Error> {
    let s = match buf.current() {
        Some(s) => s,
        // No open subpath: degrade to a move to the endpoint.
        None => return buf.push(p, positive),
    };
    if rejected(viewport, &[s, a, p]) {
        buf.push(a, positive)?;
        return buf.push(p, positive);
    }
    quad_rec(buf, positive, s, a, p, 0)
}

/// Flatten a cubic from the buffer's current point through `a`, `b` to `p`.
pub(crate) fn cubic(
    buf: &mut PathBuffer,
    positive: bool,
    viewport: Point,
    a: Point,
    b: Point,
    p: Point,
) -> Result<(), Error> {
    let s = match buf.current() {
        Some(s) => s,
        None => return buf.push(p, positive),
    };
    if rejected(viewport, &[s, a, b, p]) {
        buf.push(a, positive)?;
        buf.push(b, positive)?;
        return buf.push(p, positive);
    }
    cubic_rec(buf, positive, s, a, b, p, 0)
}

/// All points beyond the same viewport side.
fn rejected(viewport: Point, pts: &[Point]) -> bool {
    pts.iter().all(|p| p.x < 0.0)
        || pts.iter().all(|p| p.x > viewport.x)
        || pts.iter().all(|p| p.y < 0.0)
        || pts.iter().all(|p| p.y > viewport.y)
}

fn quad_rec(
    buf: &mut PathBuffer,
    positive: bool,
    p1: Point,
    p2: Point,
    p3: Point,
    level: u32,
) -> Result<(), Error> {
    if level > MAX_DEPTH {
        return buf.push(p3, positive);
    }

    let d = p3 - p1;
    // Deviation of the control point from the chord, times chord length.
    let d2 = (p2.x - p3.x) * d.y - (p2.y - p3.y) * d.x;

    if d.x.abs() < MIN_CHORD && d.y.abs() < MIN_CHORD {
        return buf.push(p3, positive);
    }
    if d2 * d2 < TOLERANCE * (d.x * d.x + d.y * d.y) {
        return buf.push(p3, positive);
    }

    let p12 = (p1 + p2) * 0.5;
    let p23 = (p2 + p3) * 0.5;
    let p123 = (p12 + p23) * 0.5;

    quad_rec(buf, positive, p1, p12, p123, level + 1)?;
    quad_rec(buf, positive, p123, p23, p3, level + 1)
}

fn cubic_rec(
    buf: &mut PathBuffer,
    positive: bool,
    p1: Point,
    p2: Point,
    p3: Point,
    p4: Point,
    level: u32,
) -> Result<(), Error> {
    if level > MAX_DEPTH {
        return buf.push(p4, positive);
    }

    let d = p4 - p1;
    let d2 = ((p2.x - p4.x) * d.y - (p2.y - p4.y) * d.x).abs();
    let d3 = ((p3.x - p4.x) * d.y - (p3.y - p4.y) * d.x).abs();

    if d.x.abs() < MIN_CHORD && d.y.abs() < MIN_CHORD {
        return buf.push(p4, positive);
    }
    if (d2 + d3) * (d2 + d3) < TOLERANCE * (d.x * d.x + d.y * d.y) {
        return buf.push(p4, positive);
    }

    let p12 = (p1 + p2) * 0.5;
    let p23 = (p2 + p3) * 0.5;
    let p34 = (p3 + p4) * 0.5;
    let p123 = (p12 + p23) * 0.5;
    let p234 = (p23 + p34) * 0.5;
    let p1234 = (p123 + p234) * 0.5;

    cubic_rec(buf, positive, p1, p12, p123, p1234, level + 1)?;
    cubic_rec(buf, positive, p1234, p234, p34, p4, level + 1)
}
