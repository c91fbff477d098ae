// THEORY:
// The `pipeline` module is the top-level API for the scoring engine. It wires the
// stateless analysis stages together and owns the only two values that survive a
// frame cycle: the previous frame and the `ScoringState`.
//
// One call to `process_frame_at` is one complete cycle:
//   target locator + motion detector -> grid geometry -> hit resolver
//   -> scoring commit -> annotations (debug only) -> previous-frame swap.
// Nothing inside a cycle fails. Missing targets, missing motion and debounced
// motion all come back as ordinary `HitDecision`s.

use crate::core_modules::annotation::{Annotation, emit_annotations};
use crate::core_modules::frame::frame::Frame;
use crate::core_modules::grid_geometry::{GRID_SCALE, GridArea};
use crate::core_modules::hit_resolver::{DEBOUNCE_MILLIS, MIN_MOTION_PIXELS, resolve_hit};
use crate::core_modules::motion_detector::{MOTION_THRESHOLD, detect_motion};
use crate::core_modules::pixel::pixel::TargetColorRule;
use crate::core_modules::scoring_state::ScoringState;
use crate::core_modules::target_locator::{MIN_TARGET_PIXELS, SAMPLE_STRIDE, locate_target};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

// Re-export key data structures for the public API.
pub use crate::core_modules::grid_geometry::{GridCell, POINT_VALUES};
pub use crate::core_modules::hit_resolver::{HitDecision, HitEvent};
pub use crate::core_modules::target_locator::Target;

const HIT_MARKER_RADIUS: f64 = 15.0;

/// Configuration for the ScoringPipeline. Defaults reproduce the tuned constants;
/// `sample_stride`, `min_target_pixels` and `min_motion_pixels` were tuned together
/// and should be changed together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub sample_stride: u32,
    pub target_rule: TargetColorRule,
    /// A target needs strictly more classified samples than this.
    pub min_target_pixels: usize,
    /// Grid half-extent in target radii.
    pub grid_scale: f64,
    /// Summed RGB difference a sample must strictly exceed to count as motion.
    pub motion_threshold: u16,
    /// A hit needs strictly more motion samples than this.
    pub min_motion_pixels: usize,
    pub debounce_millis: u64,
    pub hit_marker_radius: f64,
    /// Whether the annotation emitter runs. Never affects scoring.
    pub debug: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_stride: SAMPLE_STRIDE,
            target_rule: TargetColorRule::default(),
            min_target_pixels: MIN_TARGET_PIXELS,
            grid_scale: GRID_SCALE,
            motion_threshold: MOTION_THRESHOLD,
            min_motion_pixels: MIN_MOTION_PIXELS,
            debounce_millis: DEBOUNCE_MILLIS,
            hit_marker_radius: HIT_MARKER_RADIUS,
            debug: false,
        }
    }
}

impl PipelineConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_millis)
    }
}

/// The primary scoring output of the pipeline for a single frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    NoHit,
    Hit(HitEvent),
}

/// Everything one frame cycle produced. A snapshot: owns all of its data.
#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    pub target: Option<Target>,
    pub grid: Option<GridArea>,
    pub motion_pixel_count: usize,
    pub decision: HitDecision,
    /// Running total after this cycle's commit.
    pub total_score: u32,
    /// Empty unless debug mode is on.
    pub annotations: Vec<Annotation>,
}

impl FrameAnalysis {
    pub fn report(&self) -> Report {
        match self.decision.hit() {
            Some(hit) => Report::Hit(*hit),
            None => Report::NoHit,
        }
    }
}

/// The main, top-level struct for the scoring engine.
pub struct ScoringPipeline {
    config: PipelineConfig,
    previous_frame: Option<Frame>,
    scoring: ScoringState,
    debug: bool,
}

impl ScoringPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            debug: config.debug,
            config,
            previous_frame: None,
            scoring: ScoringState::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs one cycle stamped with the current monotonic time.
    pub fn process_frame(&mut self, frame: Frame) -> FrameAnalysis {
        self.process_frame_at(frame, Instant::now())
    }

    /// Runs one cycle. `now` must not go backwards within a session; offline drivers
    /// pass presentation time so the cooldown follows the video, not the wall clock.
    pub fn process_frame_at(&mut self, frame: Frame, now: Instant) -> FrameAnalysis {
        // Stage 1: Spatial and temporal analysis, independent of each other.
        let target = locate_target(&frame, &self.config);
        let motion = detect_motion(&frame, self.previous_frame.as_ref(), &self.config);

        // Stage 2: Grid geometry.
        let grid = target.map(|t| GridArea::from_target(&t, self.config.grid_scale));

        // Stage 3: Hit resolution.
        let decision = match &grid {
            Some(grid) => resolve_hit(grid, &motion, &self.scoring, now, &self.config),
            None => HitDecision::NoTarget,
        };

        // Stage 4: Commit. The only write to scoring state.
        match decision.hit() {
            Some(hit) => {
                self.scoring.add_points(hit.points);
                self.scoring.record_hit(now);
                debug!(
                    "hit in cell ({}, {}) for {} points from {} motion pixels, total {}",
                    hit.cell.row,
                    hit.cell.col,
                    hit.points,
                    hit.motion_pixel_count,
                    self.scoring.total()
                );
            }
            None => trace!("no hit: {:?}", decision),
        }

        // Stage 5: Debug overlay.
        let annotations = if self.debug {
            emit_annotations(
                target.as_ref().zip(grid.as_ref()),
                &motion,
                decision.hit(),
                self.config.hit_marker_radius,
            )
        } else {
            Vec::new()
        };

        self.previous_frame = Some(frame);

        FrameAnalysis {
            target,
            grid,
            motion_pixel_count: motion.len(),
            decision,
            total_score: self.scoring.total(),
            annotations,
        }
    }

    /// Starts a fresh session for a new frame source: zero score, no cooldown, and
    /// no previous frame.
    pub fn reset(&mut self) {
        self.scoring.reset();
        self.previous_frame = None;
    }

    pub fn set_debug(&mut self, enabled: bool) {
        self.debug = enabled;
    }

    pub fn toggle_debug(&mut self) -> bool {
        self.debug = !self.debug;
        self.debug
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn total_score(&self) -> u32 {
        self.scoring.total()
    }

    pub fn scoring_state(&self) -> &ScoringState {
        &self.scoring
    }

    pub fn has_previous_frame(&self) -> bool {
        self.previous_frame.is_some()
    }
}
