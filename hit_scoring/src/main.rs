// Command-line runner: scores a directory of still frames played back at a fixed
// frame rate. Useful for replaying exported footage without OpenCV.

use anyhow::Context;
use clap::Parser;
use hit_scoring::core_modules::utils::image_helper::image_helper::load_frame;
use hit_scoring::frame_source::{ImageSequence, frame_interval, presentation_offset};
use hit_scoring::pipeline::{PipelineConfig, Report, ScoringPipeline};
use log::{info, warn};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "hit_scoring", about = "Score impacts on a red target in a frame sequence")]
struct Args {
    /// Directory of frames, played in file-name order.
    frames_dir: PathBuf,
    /// Playback rate used to timestamp frames for the hit cooldown.
    #[arg(long, default_value_t = 30.0)]
    fps: f64,
    /// JSON file overriding pipeline settings.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write per-frame debug annotations as JSON lines to this file.
    #[arg(long)]
    annotations: Option<PathBuf>,
}

#[derive(Serialize)]
struct AnnotatedFrame<'a> {
    frame: usize,
    total_score: u32,
    annotations: &'a [hit_scoring::core_modules::annotation::Annotation],
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<PipelineConfig> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {:?}", path))?;
            serde_json::from_str(&text).with_context(|| format!("Invalid config: {:?}", path))
        }
        None => Ok(PipelineConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let frame_interval = frame_interval(args.fps)?;

    let config = load_config(args.config.as_ref())?;
    let sequence = ImageSequence::from_dir(&args.frames_dir)?;
    let mut pipeline = ScoringPipeline::new(config);
    pipeline.set_debug(args.annotations.is_some());

    let mut annotation_out = match &args.annotations {
        Some(path) => Some(std::io::BufWriter::new(
            std::fs::File::create(path).with_context(|| format!("Failed to create {:?}", path))?,
        )),
        None => None,
    };

    let start = Instant::now();

    for (index, path) in sequence.paths().iter().enumerate() {
        let frame = match load_frame(path) {
            Ok(frame) => frame,
            Err(err) => {
                warn!("skipping unreadable frame {:?}: {}", path, err);
                continue;
            }
        };
        let timestamp = start
            .checked_add(presentation_offset(frame_interval, index))
            .context("frame timestamp is beyond the monotonic clock")?;
        let analysis = pipeline.process_frame_at(frame, timestamp);

        if let Report::Hit(hit) = analysis.report() {
            info!(
                "frame {}: +{} in cell ({}, {}), total {}",
                index, hit.points, hit.cell.row, hit.cell.col, analysis.total_score
            );
        }

        if let Some(out) = annotation_out.as_mut() {
            let line = AnnotatedFrame {
                frame: index,
                total_score: analysis.total_score,
                annotations: &analysis.annotations,
            };
            serde_json::to_writer(&mut *out, &line)?;
            out.write_all(b"\n")?;
        }
    }

    if let Some(mut out) = annotation_out {
        out.flush()?;
    }

    println!("Final score: {}", pipeline.total_score());
    Ok(())
}
