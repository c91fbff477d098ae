// THEORY:
// This file is the main entry point for the `hit_scoring` library crate.
//
// The public surface is the `ScoringPipeline` (one synchronous call per frame)
// and the `Session` scheduler that drives it from an asynchronous frame source.
// The analysis stages themselves live in `core_modules`, one stateless module per
// stage, so each can be tested against synthetic frames on its own.

pub mod core_modules;
pub mod frame_source;
pub mod pipeline;
pub mod session;

pub use core_modules::frame::frame::{Frame, FrameError, PixelFormat};
pub use pipeline::{FrameAnalysis, PipelineConfig, Report, ScoringPipeline};
pub use session::{FrameStream, Session, SessionCommand, SessionHandle, TimedFrame};
