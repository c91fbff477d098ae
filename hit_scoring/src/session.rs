// THEORY:
// The `session` module is the scheduler around a `ScoringPipeline`. It turns the
// "wait for a frame, run a cycle, repeat" loop into a tokio task driven by a small
// command vocabulary (load, play, pause, toggle debug, shutdown).
//
// Key architectural principles:
// 1.  **Single owner**: the task owns the pipeline outright. Cycles never overlap
//     and nothing outside the task can touch the previous frame or the score.
// 2.  **Suspension only between cycles**: the only `.await` in the loop is the wait
//     for the next frame (or command). A cycle itself is synchronous, so the score
//     update and the previous-frame swap commit together.
// 3.  **Cancellation by dropping the wait**: pausing drops the in-flight
//     `next()` future. Nothing has been committed at that point, so resuming picks
//     up from the last committed previous frame as if nothing happened.
// 4.  **Snapshots out**: the score is published on a `watch` channel and every
//     cycle's `FrameAnalysis` is broadcast by value.
// 5.  **Video time**: frames carry their presentation offset. A cycle is stamped
//     with the instant the source was loaded plus that offset, so the hit cooldown
//     follows the footage no matter how fast frames are decoded or how long the
//     session sat paused.

use crate::core_modules::frame::frame::Frame;
use crate::pipeline::{FrameAnalysis, PipelineConfig, ScoringPipeline};
use anyhow::anyhow;
use futures::StreamExt;
use futures::stream::BoxStream;
use log::{debug, info, warn};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

const ANALYSIS_CHANNEL_CAPACITY: usize = 16;

/// A frame and its presentation time, measured from the start of its source.
/// Offsets must not decrease within one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedFrame {
    pub frame: Frame,
    pub offset: Duration,
}

/// A pull-based frame source. Every frame of one source must share dimensions.
pub type FrameStream = BoxStream<'static, TimedFrame>;

pub enum SessionCommand {
    /// Replace the frame source. Resets the score and the previous frame, and pauses.
    Load(FrameStream),
    Play,
    Pause,
    ToggleDebug,
    Shutdown,
}

impl fmt::Debug for SessionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionCommand::Load(_) => f.write_str("Load(..)"),
            SessionCommand::Play => f.write_str("Play"),
            SessionCommand::Pause => f.write_str("Pause"),
            SessionCommand::ToggleDebug => f.write_str("ToggleDebug"),
            SessionCommand::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Control surface and observables of a running session.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    score: watch::Receiver<u32>,
    analyses: broadcast::Sender<FrameAnalysis>,
}

impl SessionHandle {
    pub fn send(&self, command: SessionCommand) -> anyhow::Result<()> {
        self.commands
            .send(command)
            .map_err(|_| anyhow!("scoring session has shut down"))
    }

    pub fn load(&self, source: FrameStream) -> anyhow::Result<()> {
        self.send(SessionCommand::Load(source))
    }

    pub fn play(&self) -> anyhow::Result<()> {
        self.send(SessionCommand::Play)
    }

    pub fn pause(&self) -> anyhow::Result<()> {
        self.send(SessionCommand::Pause)
    }

    pub fn toggle_debug(&self) -> anyhow::Result<()> {
        self.send(SessionCommand::ToggleDebug)
    }

    pub fn shutdown(&self) -> anyhow::Result<()> {
        self.send(SessionCommand::Shutdown)
    }

    /// Read-only view of the running total.
    pub fn score(&self) -> watch::Receiver<u32> {
        self.score.clone()
    }

    /// Per-cycle analyses from now on. This is a lossy snapshot feed: a receiver
    /// that falls more than a few cycles behind gets `RecvError::Lagged` and resumes
    /// at the oldest analysis still buffered. Use `score()` for the running total.
    pub fn subscribe(&self) -> broadcast::Receiver<FrameAnalysis> {
        self.analyses.subscribe()
    }
}

pub struct Session {
    pipeline: ScoringPipeline,
    playing: bool,
    source_origin: Instant,
    score_tx: watch::Sender<u32>,
    analysis_tx: broadcast::Sender<FrameAnalysis>,
}

impl Session {
    /// Spawns the session task. The join handle yields the final score.
    pub fn spawn(config: PipelineConfig) -> (SessionHandle, JoinHandle<u32>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (score_tx, score_rx) = watch::channel(0);
        let (analysis_tx, _) = broadcast::channel(ANALYSIS_CHANNEL_CAPACITY);

        let session = Self {
            pipeline: ScoringPipeline::new(config),
            playing: false,
            source_origin: Instant::now(),
            score_tx,
            analysis_tx: analysis_tx.clone(),
        };
        let task = tokio::spawn(session.run(command_rx));

        let handle = SessionHandle {
            commands: command_tx,
            score: score_rx,
            analyses: analysis_tx,
        };
        (handle, task)
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<SessionCommand>) -> u32 {
        let mut source: Option<FrameStream> = None;

        loop {
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => self.apply(command, &mut source),
                },
                frame = next_frame(&mut source), if self.playing => match frame {
                    Some(frame) => self.run_cycle(frame),
                    None => {
                        info!("frame source exhausted, pausing");
                        self.playing = false;
                        source = None;
                    }
                },
            }
        }

        let total = self.pipeline.total_score();
        info!("scoring session finished with {} points", total);
        total
    }

    fn apply(&mut self, command: SessionCommand, source: &mut Option<FrameStream>) {
        debug!("session command {:?}", command);
        match command {
            SessionCommand::Load(stream) => {
                self.pipeline.reset();
                self.playing = false;
                self.source_origin = Instant::now();
                *source = Some(stream);
                self.score_tx.send_replace(0);
                info!("new frame source loaded, score reset");
            }
            SessionCommand::Play => {
                if source.is_none() {
                    warn!("play requested with no frame source loaded");
                }
                self.playing = true;
            }
            SessionCommand::Pause => self.playing = false,
            SessionCommand::ToggleDebug => {
                let enabled = self.pipeline.toggle_debug();
                debug!("debug annotations {}", if enabled { "on" } else { "off" });
            }
            // Handled by the run loop.
            SessionCommand::Shutdown => {}
        }
    }

    fn run_cycle(&mut self, timed: TimedFrame) {
        let Some(timestamp) = self.source_origin.checked_add(timed.offset) else {
            warn!("dropping frame at offset {:?}: beyond the monotonic clock", timed.offset);
            return;
        };
        let analysis = self.pipeline.process_frame_at(timed.frame, timestamp);
        if analysis.decision.hit().is_some() {
            self.score_tx.send_replace(analysis.total_score);
        }
        // No subscribers is fine.
        let _ = self.analysis_tx.send(analysis);
    }
}

async fn next_frame(source: &mut Option<FrameStream>) -> Option<TimedFrame> {
    match source {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::test_support::*;
    use crate::frame_source::timed_stream;
    use crate::pipeline::HitDecision;
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    const FRAME_INTERVAL: Duration = Duration::from_millis(33);

    fn target_frame() -> Frame {
        let mut frame = blank_frame(200, 200);
        paint_rect(&mut frame, 80, 80, 40, 40, TARGET_RED);
        frame
    }

    /// Flash in the bottom-right cell (9 points).
    fn impact_frame() -> Frame {
        let mut frame = target_frame();
        paint_rect(&mut frame, 126, 126, 16, 16, FLASH);
        frame
    }

    /// Flash in the top-left cell (1 point).
    fn top_left_impact_frame() -> Frame {
        let mut frame = target_frame();
        paint_rect(&mut frame, 58, 58, 16, 16, FLASH);
        frame
    }

    /// Bottom-right hit at frame 1, top-left hit at frame 25 (792 ms later).
    fn two_impacts() -> Vec<Frame> {
        let mut frames = vec![target_frame(), impact_frame()];
        frames.extend(std::iter::repeat_with(target_frame).take(23));
        frames.push(top_left_impact_frame());
        frames
    }

    async fn next_analysis(rx: &mut broadcast::Receiver<FrameAnalysis>) -> FrameAnalysis {
        let recv = async {
            loop {
                match rx.recv().await {
                    Ok(analysis) => return analysis,
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => panic!("session dropped its analysis channel"),
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(5), recv)
            .await
            .expect("analysis in time")
    }

    #[tokio::test]
    async fn plays_a_source_and_publishes_the_score() {
        let _ = env_logger::builder().is_test(true).try_init();
        let (handle, task) = Session::spawn(PipelineConfig::default());
        let mut analyses = handle.subscribe();
        let mut score = handle.score();

        handle
            .load(timed_stream(vec![target_frame(), impact_frame()], FRAME_INTERVAL))
            .unwrap();
        handle.play().unwrap();

        let first = next_analysis(&mut analyses).await;
        assert_eq!(first.decision, HitDecision::NoMotion);
        let second = next_analysis(&mut analyses).await;
        assert_eq!(second.decision.hit().map(|h| h.points), Some(9));

        tokio::time::timeout(Duration::from_secs(5), score.wait_for(|s| *s == 9))
            .await
            .expect("score in time")
            .unwrap();

        handle.shutdown().unwrap();
        assert_eq!(task.await.unwrap(), 9);
    }

    #[tokio::test]
    async fn cooldown_follows_presentation_time_not_decode_speed() {
        let frames = two_impacts();
        let (handle, task) = Session::spawn(PipelineConfig::default());
        let mut score = handle.score();

        handle.load(timed_stream(frames.clone(), FRAME_INTERVAL)).unwrap();
        handle.play().unwrap();
        tokio::time::timeout(Duration::from_secs(5), score.wait_for(|s| *s == 10))
            .await
            .expect("both hits scored")
            .unwrap();
        handle.shutdown().unwrap();
        assert_eq!(task.await.unwrap(), 10);

        // Same total as stepping the pipeline by hand on the video clock.
        let mut pipeline = ScoringPipeline::new(PipelineConfig::default());
        let t0 = Instant::now();
        for (index, frame) in frames.into_iter().enumerate() {
            pipeline.process_frame_at(frame, t0 + FRAME_INTERVAL * index as u32);
        }
        assert_eq!(pipeline.total_score(), 10);
    }

    #[tokio::test]
    async fn slow_subscriber_lags_but_keeps_the_latest_analyses() {
        let (handle, task) = Session::spawn(PipelineConfig::default());
        let mut analyses = handle.subscribe();
        let mut score = handle.score();

        handle.load(timed_stream(two_impacts(), FRAME_INTERVAL)).unwrap();
        handle.play().unwrap();
        tokio::time::timeout(Duration::from_secs(5), score.wait_for(|s| *s == 10))
            .await
            .expect("score in time")
            .unwrap();
        handle.shutdown().unwrap();
        assert_eq!(task.await.unwrap(), 10);

        // 26 cycles into a buffer of 16.
        assert_eq!(analyses.try_recv().unwrap_err(), TryRecvError::Lagged(10));
        let mut kept = Vec::new();
        while let Ok(analysis) = analyses.try_recv() {
            kept.push(analysis);
        }
        assert_eq!(kept.len(), ANALYSIS_CHANNEL_CAPACITY);
        assert_eq!(kept.last().map(|a| a.total_score), Some(10));
    }

    #[tokio::test]
    async fn pause_abandons_the_wait_and_resume_continues() {
        let (handle, task) = Session::spawn(PipelineConfig::default());
        let mut analyses = handle.subscribe();
        let (frame_tx, frame_rx) = futures::channel::mpsc::unbounded::<TimedFrame>();

        handle.load(frame_rx.boxed()).unwrap();
        handle.play().unwrap();
        frame_tx
            .unbounded_send(TimedFrame {
                frame: target_frame(),
                offset: Duration::ZERO,
            })
            .unwrap();
        assert!(next_analysis(&mut analyses).await.target.is_some());

        handle.pause().unwrap();
        // Let the pause land before queueing the next frame.
        tokio::time::sleep(Duration::from_millis(20)).await;
        frame_tx
            .unbounded_send(TimedFrame {
                frame: impact_frame(),
                offset: FRAME_INTERVAL,
            })
            .unwrap();
        assert!(
            tokio::time::timeout(Duration::from_millis(100), analyses.recv())
                .await
                .is_err()
        );

        handle.play().unwrap();
        let resumed = next_analysis(&mut analyses).await;
        assert_eq!(resumed.motion_pixel_count, 64);
        assert_eq!(resumed.total_score, 9);

        handle.shutdown().unwrap();
        assert_eq!(task.await.unwrap(), 9);
    }

    #[tokio::test]
    async fn loading_a_new_source_resets_the_score() {
        let (handle, task) = Session::spawn(PipelineConfig::default());
        let mut analyses = handle.subscribe();
        let score = handle.score();

        handle
            .load(timed_stream(vec![target_frame(), impact_frame()], FRAME_INTERVAL))
            .unwrap();
        handle.play().unwrap();
        next_analysis(&mut analyses).await;
        assert_eq!(next_analysis(&mut analyses).await.total_score, 9);
        assert_eq!(*score.borrow(), 9);

        handle.load(timed_stream(vec![impact_frame()], FRAME_INTERVAL)).unwrap();
        handle.toggle_debug().unwrap();
        handle.play().unwrap();
        let fresh = next_analysis(&mut analyses).await;
        assert_eq!(fresh.total_score, 0);
        assert_eq!(fresh.decision, HitDecision::NoMotion);
        assert!(!fresh.annotations.is_empty());
        assert_eq!(*score.borrow(), 0);

        handle.shutdown().unwrap();
        assert_eq!(task.await.unwrap(), 0);
    }
}
