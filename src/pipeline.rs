use crate::capture::CaptureSource;
use crate::controls::{self, Command};
use crate::error::SegError;
use crate::output::OutputSink;
use crate::segmentation::SegmentationEngine;
use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

const STATS_INTERVAL: u64 = 30;

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// A frame went through the engine and out to the sink.
    Processed,
    /// Nothing was written this tick (no frame, or the engine rejected it).
    Skipped,
    /// The loop is not running.
    Stopped,
}

/// Lets another thread ask a running loop to finish after the current tick.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
struct Stats {
    frames: u64,
    skipped: u64,
    capture: Duration,
    segment: Duration,
    output: Duration,
}

impl Stats {
    fn log(&self) {
        let per_frame = |d: Duration| d.as_secs_f64() * 1000.0 / self.frames as f64;
        let (capture_ms, segment_ms, output_ms) =
            (per_frame(self.capture), per_frame(self.segment), per_frame(self.output));
        let total_ms = capture_ms + segment_ms + output_ms;

        tracing::info!(
            "Frame {}: capture={:.1}ms, segment={:.1}ms, output={:.1}ms, total={:.1}ms, fps={:.1}, skipped={}",
            self.frames,
            capture_ms,
            segment_ms,
            output_ms,
            total_ms,
            1000.0 / total_ms,
            self.skipped
        );
    }
}

/// Capture -> segment -> display, one frame per tick.
///
/// A slow frame only delays the next tick; nothing is dropped or
/// interleaved. Control commands are applied between frames.
pub struct FrameLoop<C: CaptureSource, O: OutputSink> {
    capture: Option<C>,
    output: O,
    engine: SegmentationEngine,
    commands: Option<Receiver<Command>>,
    frame_duration: Duration,
    running: Arc<AtomicBool>,
    frame_size: (u32, u32),
    stats: Stats,
}

impl<C: CaptureSource, O: OutputSink> FrameLoop<C, O> {
    pub fn new(capture: C, output: O, engine: SegmentationEngine, target_fps: u32) -> Self {
        let frame_size = capture.resolution();
        Self {
            capture: Some(capture),
            output,
            engine,
            commands: None,
            frame_duration: Duration::from_secs_f64(1.0 / target_fps.max(1) as f64),
            running: Arc::new(AtomicBool::new(false)),
            frame_size,
            stats: Stats::default(),
        }
    }

    /// Receive control commands from another thread.
    pub fn with_commands(mut self, commands: Receiver<Command>) -> Self {
        self.commands = Some(commands);
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.running))
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Begin accepting ticks. Fails if the capture source was already released.
    pub fn start(&mut self) -> Result<(), SegError> {
        if self.capture.is_none() {
            return Err(SegError::DeviceUnavailable(
                "capture source already released".into(),
            ));
        }
        if !self.running.swap(true, Ordering::SeqCst) {
            tracing::info!("Starting frame loop");
        }
        Ok(())
    }

    /// Stop ticking and release the capture source. Safe to repeat, and safe
    /// before `start`.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(mut capture) = self.capture.take() {
            capture.release();
            tracing::info!(
                "Frame loop stopped after {} frames ({} skipped ticks)",
                self.stats.frames,
                self.stats.skipped
            );
        }
    }

    /// Apply pending commands, then process at most one frame.
    pub fn tick(&mut self) -> Result<Tick> {
        self.drain_commands();
        if !self.is_running() {
            return Ok(Tick::Stopped);
        }
        let Some(capture) = self.capture.as_mut() else {
            return Ok(Tick::Stopped);
        };

        let capture_start = Instant::now();
        let frame = capture
            .try_read_frame()
            .context("Failed to capture frame")?;
        let capture_time = capture_start.elapsed();

        let Some(frame) = frame else {
            self.stats.skipped += 1;
            return Ok(Tick::Skipped);
        };
        if frame.dimensions() != self.frame_size {
            tracing::info!(
                "Frame size changed from {:?} to {:?}",
                self.frame_size,
                frame.dimensions()
            );
            self.frame_size = frame.dimensions();
            self.engine.reset();
        }

        let segment_start = Instant::now();
        let processed = match self.engine.process(frame) {
            Ok(processed) => processed,
            Err(e) => {
                tracing::warn!("Frame rejected: {}", e);
                self.stats.skipped += 1;
                return Ok(Tick::Skipped);
            }
        };
        let segment_time = segment_start.elapsed();

        let output_start = Instant::now();
        self.output
            .present(&processed)
            .context("Failed to write frame")?;
        let output_time = output_start.elapsed();

        self.stats.frames += 1;
        self.stats.capture += capture_time;
        self.stats.segment += segment_time;
        self.stats.output += output_time;
        if self.stats.frames % STATS_INTERVAL == 0 {
            self.stats.log();
        }

        Ok(Tick::Processed)
    }

    /// Tick at the target rate until stopped, then release the capture.
    pub fn run(&mut self) -> Result<()> {
        self.start()?;
        tracing::info!("Type `quit` or press Ctrl+C to stop");

        let result = loop {
            let loop_start = Instant::now();
            match self.tick() {
                Ok(Tick::Stopped) => break Ok(()),
                Ok(_) => {}
                Err(e) => break Err(e),
            }

            let elapsed = loop_start.elapsed();
            if elapsed < self.frame_duration {
                std::thread::sleep(self.frame_duration - elapsed);
            }
        };

        self.stop();
        result
    }

    fn drain_commands(&mut self) {
        let Some(commands) = self.commands.as_ref() else {
            return;
        };
        loop {
            match commands.try_recv() {
                Ok(command) => {
                    if !controls::apply(&mut self.engine, command, self.frame_size) {
                        self.running.store(false, Ordering::SeqCst);
                    }
                }
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    self.commands = None;
                    return;
                }
            }
        }
    }

    pub fn engine(&self) -> &SegmentationEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut SegmentationEngine {
        &mut self.engine
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn frames_processed(&self) -> u64 {
        self.stats.frames
    }
}

impl<C: CaptureSource, O: OutputSink> Drop for FrameLoop<C, O> {
    fn drop(&mut self) {
        self.stop();
    }
}
