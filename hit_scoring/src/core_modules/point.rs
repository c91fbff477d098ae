// THEORY:
// Both the target locator and the hit resolver reduce a cloud of sampled pixel
// coordinates to a single location by taking its arithmetic mean. `Point` is the
// integer pixel coordinate both of them collect, and `centroid` is the shared
// reduction.

use serde::{Deserialize, Serialize};

/// An integer pixel coordinate, `0 <= x < width`, `0 <= y < height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Arithmetic mean of a set of points, or `None` for an empty set.
pub fn centroid(points: &[Point]) -> Option<(f64, f64)> {
    if points.is_empty() {
        return None;
    }
    let (sum_x, sum_y) = points
        .iter()
        .fold((0u64, 0u64), |(sx, sy), p| (sx + p.x as u64, sy + p.y as u64));
    let count = points.len() as f64;
    Some((sum_x as f64 / count, sum_y as f64 / count))
}
