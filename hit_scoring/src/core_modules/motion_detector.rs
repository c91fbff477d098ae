// THEORY:
// The `motion_detector` is the temporal half of the pipeline. It compares the
// current frame with the one frame the pipeline retained from the previous cycle
// and reports every sampled coordinate whose colour jumped by more than a fixed
// amount. A projectile strike shows up as a compact cluster of such coordinates.
//
// Key architectural principles:
// 1.  **Stateless**: the detector owns no history. The previous frame is held by
//     the pipeline and passed in; the resulting set is rebuilt from scratch every
//     frame and nothing in it identifies a pixel across frames.
// 2.  **Cheap metric**: change is the summed absolute RGB difference, not a
//     Euclidean distance.
// 3.  **Graceful degradation**: no previous frame, or a previous frame of a
//     different size, simply produces an empty set. It is never an error.

use crate::core_modules::frame::frame::Frame;
use crate::core_modules::point::{Point, centroid};
use crate::pipeline::PipelineConfig;
use log::warn;

/// Summed channel difference a sampled pixel must strictly exceed to count as motion.
pub const MOTION_THRESHOLD: u16 = 100;

/// Sampled coordinates that changed beyond the motion threshold this frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MotionPixelSet {
    points: Vec<Point>,
}

impl MotionPixelSet {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn centroid(&self) -> Option<(f64, f64)> {
        centroid(&self.points)
    }
}

pub fn detect_motion(
    current: &Frame,
    previous: Option<&Frame>,
    config: &PipelineConfig,
) -> MotionPixelSet {
    let Some(previous) = previous else {
        return MotionPixelSet::default();
    };
    if !current.same_dimensions(previous) {
        warn!(
            "frame size changed from {}x{} to {}x{}, skipping motion detection",
            previous.width(),
            previous.height(),
            current.width(),
            current.height()
        );
        return MotionPixelSet::default();
    }

    let points = current
        .sampled_points(config.sample_stride)
        .filter(|p| {
            let delta = current.pixel(p.x, p.y).channel_difference(&previous.pixel(p.x, p.y));
            delta > config.motion_threshold
        })
        .collect();
    MotionPixelSet::new(points)
}
