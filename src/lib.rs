// Copyright 2026 the Tilevg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A tile-based deferred rasterizer for 2D vector paths.
//!
//! Paths are flattened into line segments, walked across a uniform grid of
//! 8x8-pixel tiles, and encoded as compact per-tile edge lists plus a signed
//! winding accumulator per tile. The output of a frame is a pair of linear
//! buffers (packed fill descriptors + edges, and fixed-size tile records)
//! that a downstream evaluator (typically an instanced GPU draw) reduces
//! to antialiased coverage and color. [`fine`] contains a CPU reference
//! implementation of that evaluation contract.
//!
//! The entry point is [`render::RenderContext`], which owns all per-frame
//! arenas and hands finished buffers to a [`render::Backend`].

#![forbid(unsafe_code)]

pub mod fill;
pub mod fine;
pub mod flatten;
pub mod geom;
pub mod path;
pub mod raster;
pub mod render;
pub mod stroke;
pub mod tile;

pub use peniko::color;
pub use peniko::kurbo;

/// Rule mapping an accumulated signed coverage number to alpha.
///
/// The discriminant values are part of the descriptor byte contract with the
/// downstream evaluator and must not change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillRule {
    /// Coverage clamped from below at zero; only negative-winding areas drop out.
    Negative,
    /// Coverage clamped from above at zero mirrored; only positive winding fills.
    Positive,
    /// Any nonzero winding fills.
    NonZero,
    /// Alternating parity fills.
    EvenOdd,
    /// Filled only where at least two windings overlap.
    Intersection,
}

impl FillRule {
    /// Encoded `mode` byte of the fill descriptor.
    pub fn mode(self) -> i8 {
        match self {
            FillRule::Negative => -1,
            FillRule::Positive => 1,
            FillRule::NonZero => 2,
            FillRule::EvenOdd => 3,
            FillRule::Intersection => 4,
        }
    }

    /// Convert a signed per-pixel coverage number to alpha under this rule.
    ///
    /// This is the reference definition of the winding policies shared with
    /// the external evaluator.
    pub fn alpha(self, coverage: f32) -> f32 {
        match self {
            FillRule::Negative => (-coverage).clamp(0.0, 1.0),
            FillRule::Positive => coverage.clamp(0.0, 1.0),
            FillRule::NonZero => coverage.clamp(-1.0, 1.0).abs(),
            FillRule::EvenOdd => ((coverage + 1.0).rem_euclid(2.0) - 1.0).abs(),
            FillRule::Intersection => (coverage.abs() - 1.0).clamp(0.0, 1.0),
        }
    }
}

/// Orientation assigned to subpaths as they are begun.
///
/// The winding direction scales every sign-accumulator update and decides
/// the stored orientation of tile edges, so flipping it turns a subpath
/// into a hole under the nonzero rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Winding {
    Positive,
    Negative,
}

impl Winding {
    pub(crate) fn sign(self) -> i32 {
        match self {
            Winding::Positive => 1,
            Winding::Negative => -1,
        }
    }
}

/// Errors reported by the drawing API.
///
/// Arena overflows inside a frame are resolved by an implicit flush and never
/// surface here; only the path arena, which cannot be flushed mid-path,
/// reports its capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// The path point arena is full.
    PathCapacity,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::PathCapacity => write!(f, "path point arena capacity exceeded"),
        }
    }
}

impl std::error::Error for Error {}
