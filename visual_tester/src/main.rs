use anyhow::{Context, bail};
use clap::Parser;
use hit_scoring::core_modules::annotation::{Annotation, ColorToken, paint_layers};
use hit_scoring::frame_source::{frame_interval, presentation_offset};
use hit_scoring::pipeline::{PipelineConfig, Report, ScoringPipeline};
use hit_scoring::{Frame, PixelFormat};
use log::{error, info};
use opencv::{
    core::{self, Mat, Scalar},
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture, VideoWriter},
};
use std::path::PathBuf;
use std::time::Instant;

const FALLBACK_FPS: f64 = 30.0;
const OVERLAY_ALPHA: f64 = 0.5;

#[derive(Parser, Debug)]
#[command(name = "visual_tester", about = "Score a video and write an annotated copy")]
struct Args {
    input_video_path: PathBuf,
    output_video_path: PathBuf,
    /// Skip the debug overlay and only report the score.
    #[arg(long)]
    no_overlay: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    // --- 1. Video I/O Initialization ---
    let input = args.input_video_path.to_string_lossy();
    let mut cap = VideoCapture::from_file(&input, videoio::CAP_ANY)?;
    if !cap.is_opened()? {
        bail!("Error opening video file {}", input);
    }

    let frame_width = cap.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
    let frame_height = cap.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
    let fps = match cap.get(videoio::CAP_PROP_FPS)? {
        fps if fps > 0.0 => fps,
        _ => FALLBACK_FPS,
    };
    let frame_interval = frame_interval(fps)?;

    let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v')?;
    let mut writer = VideoWriter::new(
        &args.output_video_path.to_string_lossy(),
        fourcc,
        fps,
        core::Size::new(frame_width as i32, frame_height as i32),
        true,
    )?;

    // --- 2. Scoring Pipeline Initialization ---
    let mut pipeline = ScoringPipeline::new(PipelineConfig {
        debug: !args.no_overlay,
        ..PipelineConfig::default()
    });
    let start = Instant::now();

    // --- 3. Main Processing Loop ---
    let mut frame = Mat::default();
    let mut frame_index: usize = 0;
    loop {
        match cap.read(&mut frame) {
            Ok(true) => {
                if frame.empty() {
                    break;
                }

                // Presentation time, so the hit cooldown follows the video.
                let timestamp = start
                    .checked_add(presentation_offset(frame_interval, frame_index))
                    .context("frame timestamp is beyond the monotonic clock")?;
                frame_index += 1;

                let mut rgba_frame = Mat::default();
                imgproc::cvt_color(&frame, &mut rgba_frame, imgproc::COLOR_BGR2RGBA, 0)?;
                let scoring_frame = Frame::new(
                    frame_width,
                    frame_height,
                    PixelFormat::Rgba8,
                    rgba_frame.data_bytes()?.to_vec(),
                )
                .context("decoded frame does not match the reported video size")?;

                let analysis = pipeline.process_frame_at(scoring_frame, timestamp);
                if let Report::Hit(hit) = analysis.report() {
                    info!(
                        "frame {}: +{} in cell ({}, {}), total {}",
                        frame_index, hit.points, hit.cell.row, hit.cell.col, analysis.total_score
                    );
                }

                let mut output_frame = render_annotations(&frame, &analysis.annotations)?;
                draw_score(&mut output_frame, analysis.total_score)?;
                writer.write(&output_frame)?;
            }
            Ok(false) => break,
            Err(e) => {
                error!("Error reading frame: {:?}", e);
                break;
            }
        }
    }

    info!("Processed {} frames", frame_index);
    println!(
        "Final score: {}. Output saved to {}",
        pipeline.total_score(),
        args.output_video_path.display()
    );
    Ok(())
}

/// OpenCV wants BGR.
fn scalar(color: ColorToken) -> Scalar {
    let [r, g, b, _] = color.rgba();
    Scalar::new(b as f64, g as f64, r as f64, 0.0)
}

fn point(x: f64, y: f64) -> core::Point {
    core::Point::new(x.round() as i32, y.round() as i32)
}

/// Paints primitives in emission order. Each run of translucent primitives is drawn
/// on its own overlay and blended before the next run, so later primitives still
/// cover earlier ones.
fn render_annotations(frame: &Mat, annotations: &[Annotation]) -> opencv::Result<Mat> {
    let mut output = frame.clone();
    for layer in paint_layers(annotations) {
        if layer.translucent {
            let mut overlay = output.clone();
            for annotation in layer.annotations {
                draw(&mut overlay, annotation)?;
            }
            let mut blended = Mat::default();
            core::add_weighted(&overlay, OVERLAY_ALPHA, &output, 1.0 - OVERLAY_ALPHA, 0.0, &mut blended, -1)?;
            output = blended;
        } else {
            for annotation in layer.annotations {
                draw(&mut output, annotation)?;
            }
        }
    }
    Ok(output)
}

fn draw(image: &mut Mat, annotation: &Annotation) -> opencv::Result<()> {
    match annotation {
        Annotation::Line { x1, y1, x2, y2, color } => {
            imgproc::line(image, point(*x1, *y1), point(*x2, *y2), scalar(*color), 2, imgproc::LINE_8, 0)
        }
        Annotation::Circle { x, y, radius, color, filled } => {
            let thickness = if *filled { imgproc::FILLED } else { 2 };
            imgproc::circle(
                image,
                point(*x, *y),
                radius.round().max(1.0) as i32,
                scalar(*color),
                thickness,
                imgproc::LINE_8,
                0,
            )
        }
        Annotation::Text { x, y, text, color } => imgproc::put_text(
            image,
            text,
            point(*x, *y),
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.7,
            scalar(*color),
            2,
            imgproc::LINE_8,
            false,
        ),
    }
}

fn draw_score(image: &mut Mat, total: u32) -> opencv::Result<()> {
    imgproc::put_text(
        image,
        &format!("Score: {}", total),
        core::Point::new(20, 40),
        imgproc::FONT_HERSHEY_SIMPLEX,
        1.0,
        Scalar::new(255.0, 255.0, 255.0, 0.0),
        2,
        imgproc::LINE_8,
        false,
    )
}
