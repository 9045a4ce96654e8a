//! 2D vector math for crop handle interaction.
//!
//! The crop overlay moves its handles by projecting touch points onto the
//! edges of the image bounds, snapping them against those edges and
//! intersecting edge lines. Everything here is a pure function on `f32`
//! values; nothing allocates and nothing is stateful.
//!
//! Operations that can hit a division by zero (degenerate lines, parallel
//! lines, zero-length projection axes) return `None` instead of producing
//! `inf`/`NaN`, so callers can tell "no result" apart from a genuine
//! `(0, 0)` vector.
//!
//! # Coordinate System
//!
//! - Screen coordinates, origin top-left, y grows downward
//! - Lines are infinite lines through two points unless stated otherwise

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A 2D vector (or point) with `f32` components.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

/// Points and vectors share one representation.
pub type Point2 = Vec2;

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean norm, see [`length`].
    #[inline]
    pub fn length(self) -> f32 {
        length(self)
    }

    /// True when both components are exactly zero.
    #[inline]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// A line through two points.
///
/// Degenerate when `start == end`; such a line has no direction and every
/// operation that needs one returns `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Line {
    pub start: Point2,
    pub end: Point2,
}

impl Line {
    pub const fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }

    /// Build a line from raw endpoint coordinates `(x1, y1)` and `(x2, y2)`.
    pub const fn from_coords(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            start: Vec2::new(x1, y1),
            end: Vec2::new(x2, y2),
        }
    }

    /// Direction vector `end - start`.
    #[inline]
    pub fn direction(&self) -> Vec2 {
        self.end - self.start
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.direction().is_zero()
    }
}

/// Bound `value` to `[low, high]`.
///
/// Evaluated literally as `max(min(value, high), low)`, so `low` wins when
/// the caller passes `low > high`.
#[inline]
pub fn clamp(value: f32, low: f32, high: f32) -> f32 {
    value.min(high).max(low)
}

/// Euclidean length of `v`.
///
/// Uses `hypot` so large components do not overflow when squared.
#[inline]
pub fn length(v: Vec2) -> f32 {
    v.x.hypot(v.y)
}

/// Shortest vector from `point` to the infinite line through `line`.
///
/// The foot of the perpendicular is found with the parametric form
/// `u = ((p - p1) · d) / (d · d)`, `d = p2 - p1`, and the returned vector
/// points from `point` to that foot.
///
/// # Returns
///
/// `None` if the line is degenerate (both endpoints coincide).
pub fn shortest_vector_to_line(point: Point2, line: &Line) -> Option<Vec2> {
    let d = line.direction();
    if d.is_zero() {
        return None;
    }

    let p1 = line.start;
    let u = ((point.x - p1.x) * d.x + (point.y - p1.y) * d.y) / (d.x * d.x + d.y * d.y);
    let foot = Vec2::new(p1.x + u * d.x, p1.y + u * d.y);

    Some(foot - point)
}

/// Scale `v` to unit length.
///
/// `v` must not be the zero vector; the result is `NaN` in that case.
#[inline]
pub fn normalize(v: Vec2) -> Vec2 {
    let len = length(v);
    Vec2::new(v.x / len, v.y / len)
}

/// Dot product `a · b`.
#[inline]
pub fn dot(a: Vec2, b: Vec2) -> f32 {
    a.x * b.x + a.y * b.y
}

/// Scalar projection of `a` onto `b`, i.e. `(a · b) / |b|`.
///
/// Returns `None` when `b` is the zero vector.
pub fn scalar_projection(a: Vec2, b: Vec2) -> Option<f32> {
    let len = length(b);
    if len == 0.0 {
        return None;
    }
    Some(dot(a, b) / len)
}

/// Intersection point of the infinite lines through `line1` and `line2`.
///
/// Solved with the 2x2 determinant of the two direction vectors. The
/// parallel test is an exact comparison against zero: nearly parallel lines
/// still intersect, possibly very far away.
///
/// # Returns
///
/// `None` for parallel or coincident lines.
pub fn line_intersect(line1: &Line, line2: &Line) -> Option<Point2> {
    let (a, b) = (line1.start, line1.end);
    let (c, d) = (line2.start, line2.end);

    let t0 = a.x - b.x;
    let t1 = a.y - b.y;
    let t2 = b.x - d.x;
    let t3 = d.y - b.y;
    let t4 = c.x - d.x;
    let t5 = c.y - d.y;

    let denom = t1 * t4 - t0 * t5;
    if denom == 0.0 {
        return None;
    }

    let u = (t3 * t4 + t5 * t2) / denom;
    Some(Vec2::new(b.x + u * t0, b.y + u * t1))
}


// ============================================================================
// Property-Based Tests
// ============================================================================
