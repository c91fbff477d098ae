// THEORY:
// The `target_locator` finds the circular marker the scoring grid is anchored to.
// It is a stateless utility: one frame in, at most one `Target` out, no memory of
// where the target was last frame.
//
// Algorithm:
// 1.  **Colour segmentation**: walk the shared sampling grid and keep every sampled
//     coordinate whose pixel passes the `TargetColorRule`.
// 2.  **Noise gate**: too few classified samples means the centroid cannot be
//     trusted, so the frame reports no target at all.
// 3.  **Moments, not shape fitting**: the centre is the mean of the classified
//     coordinates and the radius is that of a circle whose area equals the sample
//     count, `sqrt(count / PI)`. The count is in *samples*, so the radius is in
//     sample units and shrinks with the stride; the noise gate is tuned for the
//     default stride and the two must change together.

use crate::core_modules::frame::frame::Frame;
use crate::core_modules::point::{Point, centroid};
use crate::pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Stride of the sampling grid shared by the target locator and the motion detector.
pub const SAMPLE_STRIDE: u32 = 2;
/// A target needs strictly more classified samples than this.
pub const MIN_TARGET_PIXELS: usize = 100;

/// The located marker for a single frame. Never carried across frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub center_x: f64,
    pub center_y: f64,
    /// Area-equivalent radius derived from `pixel_count`. Always non-negative.
    pub radius: f64,
    /// Number of sampled pixels classified as target-coloured.
    pub pixel_count: usize,
}

/// Radius of a circle whose area is `pixel_count`.
pub fn area_equivalent_radius(pixel_count: usize) -> f64 {
    (pixel_count as f64 / PI).sqrt()
}

/// Collects every sampled coordinate classified as target-coloured.
pub fn classify_target_pixels(frame: &Frame, config: &PipelineConfig) -> Vec<Point> {
    frame
        .sampled_points(config.sample_stride)
        .filter(|p| frame.pixel(p.x, p.y).is_target_colored(&config.target_rule))
        .collect()
}

pub fn locate_target(frame: &Frame, config: &PipelineConfig) -> Option<Target> {
    let target_pixels = classify_target_pixels(frame, config);
    let pixel_count = target_pixels.len();
    if pixel_count <= config.min_target_pixels {
        return None;
    }

    let (center_x, center_y) = centroid(&target_pixels)?;
    Some(Target {
        center_x,
        center_y,
        radius: area_equivalent_radius(pixel_count),
        pixel_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::test_support::*;

    #[test]
    fn blank_frame_has_no_target() {
        let frame = blank_frame(64, 64);
        assert_eq!(locate_target(&frame, &PipelineConfig::default()), None);
    }

    #[test]
    fn exactly_one_hundred_samples_is_not_enough() {
        let mut frame = blank_frame(100, 100);
        // 20x20 block starting on the sampling grid holds 10x10 samples.
        paint_rect(&mut frame, 10, 10, 20, 20, TARGET_RED);
        let config = PipelineConfig::default();
        assert_eq!(classify_target_pixels(&frame, &config).len(), 100);
        assert_eq!(locate_target(&frame, &config), None);
    }

    #[test]
    fn one_hundred_and_one_samples_yield_a_target() {
        let mut frame = blank_frame(100, 100);
        paint_rect(&mut frame, 10, 10, 20, 20, TARGET_RED);
        paint_rect(&mut frame, 60, 60, 1, 1, TARGET_RED);
        let target = locate_target(&frame, &PipelineConfig::default()).expect("target");
        assert_eq!(target.pixel_count, 101);
        assert!((target.radius - (101.0 / PI).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn centre_is_mean_of_sampled_coordinates() {
        let mut frame = blank_frame(200, 200);
        paint_rect(&mut frame, 80, 80, 40, 40, TARGET_RED);
        let target = locate_target(&frame, &PipelineConfig::default()).expect("target");
        // Sampled xs and ys are 80, 82, .., 118.
        assert_eq!(target.pixel_count, 400);
        assert!((target.center_x - 99.0).abs() < 1e-9);
        assert!((target.center_y - 99.0).abs() < 1e-9);
        assert!((target.radius - (400.0 / PI).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn off_grid_pixels_are_never_sampled() {
        let mut frame = blank_frame(100, 100);
        // Odd rows only: invisible to a stride-2 walk from the origin.
        for y in (1..99).step_by(2) {
            paint_rect(&mut frame, 0, y, 100, 1, TARGET_RED);
        }
        assert_eq!(locate_target(&frame, &PipelineConfig::default()), None);
    }

    #[test]
    fn radius_grows_sub_linearly() {
        for k in [101usize, 400, 1257, 10_000] {
            let r1 = area_equivalent_radius(k);
            let r2 = area_equivalent_radius(2 * k);
            assert!(r2 <= 2.0 * r1);
            assert!(r2 > r1);
        }
    }
}
