// THEORY:
// The `hit_resolver` is the decision layer. It looks at this frame's motion cloud
// through the lens of the scoring grid and the time of the last accepted hit, and
// decides whether a single scoring event happened.
//
// Decision order (first failing check wins):
// 1.  **Cooldown**: a hit accepted less than the debounce window ago means any
//     motion now is the trail of that same impact. Nothing else is inspected.
// 2.  **Motion present**: an empty motion set cannot be a hit.
// 3.  **Location**: the motion centroid is mapped into grid coordinates. A centroid
//     outside the 3x3 grid scores nothing, even when it is close to the target.
// 4.  **Mass**: the motion set must be larger than the minimum cluster size, which
//     rejects flicker and sensor noise.
//
// The resolver never looks backwards to recover a missed hit, and it never writes
// to the scoring state. Committing an accepted hit is the pipeline's job.

use crate::core_modules::grid_geometry::{GridArea, GridCell};
use crate::core_modules::motion_detector::MotionPixelSet;
use crate::core_modules::scoring_state::ScoringState;
use crate::pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Minimum interval between two accepted hits, in milliseconds.
pub const DEBOUNCE_MILLIS: u64 = 500;
/// A hit needs strictly more motion pixels than this.
pub const MIN_MOTION_PIXELS: usize = 50;

/// A single accepted scoring decision for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitEvent {
    pub cell: GridCell,
    pub points: u32,
    pub centroid_x: f64,
    pub centroid_y: f64,
    pub motion_pixel_count: usize,
}

/// Outcome of hit resolution for one frame. Everything except `Hit` is a normal,
/// silent "no hit".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitDecision {
    /// No target was located, so there was no usable grid to resolve against.
    NoTarget,
    /// Within the cooldown of the previous accepted hit.
    Debounced,
    NoMotion,
    /// The motion centroid mapped outside the 3x3 grid.
    OutsideGrid { row: i64, col: i64 },
    /// The centroid landed in the grid but the motion set was too small.
    InsufficientMotion { count: usize },
    Hit(HitEvent),
}

impl HitDecision {
    pub fn hit(&self) -> Option<&HitEvent> {
        match self {
            HitDecision::Hit(event) => Some(event),
            _ => None,
        }
    }
}

pub fn is_debounced(scoring: &ScoringState, now: Instant, window: Duration) -> bool {
    scoring
        .last_hit()
        .is_some_and(|last| now.saturating_duration_since(last) < window)
}

pub fn resolve_hit(
    grid: &GridArea,
    motion: &MotionPixelSet,
    scoring: &ScoringState,
    now: Instant,
    config: &PipelineConfig,
) -> HitDecision {
    if is_debounced(scoring, now, config.debounce()) {
        return HitDecision::Debounced;
    }

    let Some((centroid_x, centroid_y)) = motion.centroid() else {
        return HitDecision::NoMotion;
    };

    // A zero-radius target has no usable grid.
    let Some((row, col)) = grid.grid_coordinates(centroid_x, centroid_y) else {
        return HitDecision::NoTarget;
    };
    let Some(cell) = grid.cell_at(centroid_x, centroid_y) else {
        return HitDecision::OutsideGrid { row, col };
    };

    if motion.len() <= config.min_motion_pixels {
        return HitDecision::InsufficientMotion { count: motion.len() };
    }

    HitDecision::Hit(HitEvent {
        cell,
        points: cell.points(),
        centroid_x,
        centroid_y,
        motion_pixel_count: motion.len(),
    })
}
