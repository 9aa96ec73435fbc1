// Copyright 2026 the Tilevg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The path point arena.
//!
//! All subpaths of one path-construction session live in a single bounded
//! arena of device-space points, with a parallel list of subpath records.
//! The arena is reset lazily: a draw call marks it stale, and the next point
//! pushed after a draw starts a fresh session, so the same path set can be
//! filled and then stroked without rebuilding it.

use crate::geom::Point;
use crate::Error;

/// One subpath inside a [`PathBuffer`].
#[derive(Clone, Copy, Debug)]
pub struct Subpath {
    /// Index of the first point.
    pub start: u32,
    /// One past the last point. Monotonically increasing across the buffer.
    pub end: u32,
    /// Whether the last stored point exactly equals the first.
    pub closed: bool,
    /// Orientation recorded from the winding-direction state at subpath begin.
    pub positive: bool,
}

/// Bounded arena of flattened path points for one construction session.
pub struct PathBuffer {
    points: Vec<Point>,
    subpaths: Vec<Subpath>,
    capacity: usize,
    /// A subpath is open (begun but not yet sealed).
    open: bool,
    /// Next push begins a new session.
    stale: bool,
    start: Point,
    point: Point,
}

impl PathBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: Vec::new(),
            subpaths: Vec::new(),
            capacity,
            open: false,
            stale: false,
            start: Point::ZERO,
            point: Point::ZERO,
        }
    }

    /// Drop all stored paths and begin a new session.
    pub fn clear(&mut self) {
        self.points.clear();
        self.subpaths.clear();
        self.open = false;
        self.stale = false;
    }

    /// Mark the buffer for lazy reset on the next push. Used after a draw
    /// call so the finished path set stays readable until new geometry
    /// arrives.
    pub(crate) fn mark_stale(&mut self) {
        self.stale = true;
    }

    /// Append a point, beginning a new subpath if none is open.
    ///
    /// `positive` is the winding-direction state at the time of the push; it
    /// is only consulted when a subpath actually begins here.
    pub fn push(&mut self, p: Point, positive: bool) -> Result<(), Error> {
        if self.stale {
            self.clear();
        }
        if self.points.len() >= self.capacity {
            return Err(Error::PathCapacity);
        }
        if !self.open {
            self.open = true;
            self.start = p;
            self.subpaths.push(Subpath {
                start: self.points.len() as u32,
                end: 0,
                closed: false,
                positive,
            });
        }
        self.point = p;
        self.points.push(p);
        Ok(())
    }

    /// Seal the open subpath, fixing its end index and closed flag.
    ///
    /// Closedness is exact float equality of the first and last stored
    /// point, not a tolerance test.
    pub fn seal(&mut self) {
        if !self.open {
            return;
        }
        if let Some(sub) = self.subpaths.last_mut() {
            sub.end = self.points.len() as u32;
            sub.closed = self.point == self.start;
        }
        self.open = false;
    }

    /// Append the closing segment back to the subpath start, if the current
    /// point is not already there.
    pub fn close(&mut self) -> Result<(), Error> {
        if self.open && self.point != self.start {
            let start = self.start;
            // Reuse the orientation already recorded at subpath begin.
            let positive = self.subpaths.last().map(|s| s.positive).unwrap_or(true);
            self.push(start, positive)?;
        }
        Ok(())
    }

    /// Last pushed point of the open subpath, if any.
    pub fn current(&self) -> Option<Point> {
        self.open.then_some(self.point)
    }

    /// Start point of the open subpath, if any.
    pub fn subpath_start(&self) -> Option<Point> {
        self.open.then_some(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.subpaths.is_empty()
    }

    /// Iterate sealed subpaths with their point runs.
    pub fn subpaths(&self) -> impl Iterator<Item = (&Subpath, &[Point])> {
        self.subpaths
            .iter()
            .map(|sub| (sub, &self.points[sub.start as usize..sub.end as usize]))
    }

    pub(crate) fn point_count(&self) -> usize {
        self.points.len()
    }
}
