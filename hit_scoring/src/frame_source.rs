// THEORY:
// Frame sources live outside the analysis core. This module provides the one the
// crate can offer without native video libraries: a directory of still images
// played back in file-name order. Video containers are handled by the
// `visual_tester` driver instead.

use crate::core_modules::frame::frame::Frame;
use crate::core_modules::utils::image_helper::image_helper::load_frame;
use crate::session::{FrameStream, TimedFrame};
use anyhow::{Context, bail};
use futures::StreamExt;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Time between consecutive frames at `fps`. Rejects rates that are not positive
/// or too small to give a representable interval.
pub fn frame_interval(fps: f64) -> anyhow::Result<Duration> {
    if fps.is_nan() || fps <= 0.0 {
        bail!("fps must be positive, got {}", fps);
    }
    Duration::try_from_secs_f64(1.0 / fps).with_context(|| format!("fps {} gives no usable frame interval", fps))
}

/// Presentation offset of frame `index`, saturating at `Duration::MAX`.
pub fn presentation_offset(frame_interval: Duration, index: usize) -> Duration {
    u32::try_from(index)
        .ok()
        .and_then(|index| frame_interval.checked_mul(index))
        .unwrap_or(Duration::MAX)
}

/// Stamps in-memory frames with their presentation offsets.
pub fn timed_stream<I>(frames: I, frame_interval: Duration) -> FrameStream
where
    I: IntoIterator<Item = Frame>,
    I::IntoIter: Send + 'static,
{
    futures::stream::iter(frames.into_iter().enumerate().map(move |(index, frame)| TimedFrame {
        frame,
        offset: presentation_offset(frame_interval, index),
    }))
    .boxed()
}

/// An ordered list of still-image frames on disk.
#[derive(Debug, Clone)]
pub struct ImageSequence {
    paths: Vec<PathBuf>,
}

impl ImageSequence {
    /// Collects every supported image in `dir`, sorted by file name.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> anyhow::Result<Self> {
        let dir = dir.as_ref();
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read frame directory: {:?}", dir))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_supported_image(path))
            .collect();
        if paths.is_empty() {
            bail!("no image frames found in {:?}", dir);
        }
        paths.sort();
        info!("found {} frames in {:?}", paths.len(), dir);
        Ok(Self { paths })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Loads every frame eagerly.
    pub fn load_all(&self) -> anyhow::Result<Vec<Frame>> {
        self.paths
            .iter()
            .map(|path| load_frame(path).with_context(|| format!("Failed to load frame: {:?}", path)))
            .collect()
    }

    /// Lazily decodes frames as the session pulls them, stamped with their position
    /// in the sequence. Unreadable files are logged and skipped without shifting
    /// the timestamps of later frames.
    pub fn into_stream(self, frame_interval: Duration) -> FrameStream {
        futures::stream::iter(self.paths.into_iter().enumerate())
            .filter_map(move |(index, path)| async move {
                match load_frame(&path) {
                    Ok(frame) => Some(TimedFrame {
                        frame,
                        offset: presentation_offset(frame_interval, index),
                    }),
                    Err(err) => {
                        warn!("skipping unreadable frame {:?}: {}", path, err);
                        None
                    }
                }
            })
            .boxed()
    }
}

fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::test_support::*;
    use crate::core_modules::utils::image_helper::image_helper::save_frame;

    #[test]
    fn sorts_frames_and_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        save_frame(&blank_frame(8, 8), dir.path().join("frame_002.png")).unwrap();
        let mut red = blank_frame(8, 8);
        paint_rect(&mut red, 0, 0, 8, 8, TARGET_RED);
        save_frame(&red, dir.path().join("frame_001.png")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();

        let sequence = ImageSequence::from_dir(dir.path()).unwrap();
        assert_eq!(sequence.len(), 2);
        let frames = sequence.load_all().unwrap();
        assert_eq!(frames[0].pixel(0, 0), TARGET_RED);
        assert_eq!(frames[1].pixel(0, 0), BACKGROUND);
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ImageSequence::from_dir(dir.path()).is_err());
    }

    #[tokio::test]
    async fn stream_skips_unreadable_frames() {
        let dir = tempfile::tempdir().unwrap();
        save_frame(&blank_frame(4, 4), dir.path().join("a.png")).unwrap();
        std::fs::write(dir.path().join("b.png"), b"garbage").unwrap();
        save_frame(&blank_frame(4, 4), dir.path().join("c.png")).unwrap();

        let frames: Vec<TimedFrame> = ImageSequence::from_dir(dir.path())
            .unwrap()
            .into_stream(Duration::from_millis(40))
            .collect()
            .await;
        assert_eq!(frames.len(), 2);
        // c.png keeps its slot in the sequence.
        assert_eq!(frames[0].offset, Duration::ZERO);
        assert_eq!(frames[1].offset, Duration::from_millis(80));
    }

    #[test]
    fn frame_interval_rejects_unusable_rates() {
        assert_eq!(frame_interval(25.0).unwrap(), Duration::from_millis(40));
        assert!(frame_interval(0.0).is_err());
        assert!(frame_interval(-30.0).is_err());
        assert!(frame_interval(f64::NAN).is_err());
        // 1 / 1e-320 is infinite.
        assert!(frame_interval(1e-320).is_err());
    }

    #[test]
    fn presentation_offset_saturates() {
        let interval = Duration::from_millis(40);
        assert_eq!(presentation_offset(interval, 3), Duration::from_millis(120));
        assert_eq!(presentation_offset(Duration::MAX, 2), Duration::MAX);
        assert_eq!(presentation_offset(interval, usize::MAX), Duration::MAX);
    }
}
