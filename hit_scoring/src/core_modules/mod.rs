pub mod annotation;
pub mod frame;
pub mod grid_geometry;
pub mod hit_resolver;
pub mod motion_detector;
pub mod pixel;
pub mod point;
pub mod scoring_state;
pub mod target_locator;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;
