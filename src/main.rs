use anyhow::{Context, Result};
use clap::Parser;
use segcam::capture::WebcamCapture;
use segcam::config::Args;
use segcam::controls;
use segcam::output::V4L2Output;
use segcam::pipeline::FrameLoop;
use segcam::segmentation::SegmentationEngine;
use std::sync::mpsc;

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("segcam starting");
    tracing::info!("Capture: {}x{}", args.capture_width, args.capture_height);
    tracing::info!("Target FPS: {}", args.fps);

    let config = args.engine_config();
    tracing::info!(
        "Mode: {:?}, background: {:?}, edge operator: {:?}",
        config.mode,
        config.variant,
        config.edge_operator
    );

    // Initialize capture
    let capture = WebcamCapture::new(
        args.input_device,
        args.capture_width,
        args.capture_height,
        args.fps,
    )
    .context("Failed to initialize webcam capture")?;

    // Output follows whatever size the camera settled on
    let (width, height) = segcam::capture::CaptureSource::resolution(&capture);
    let output = V4L2Output::new(&args.output_device, width, height)
        .context("Failed to initialize v4l2loopback output")?;

    let engine = SegmentationEngine::new(config);
    let mut frame_loop = FrameLoop::new(capture, output, engine, args.fps);

    if !args.no_controls {
        let (tx, rx) = mpsc::channel();
        controls::spawn_stdin_reader(tx).context("Failed to start control reader")?;
        frame_loop = frame_loop.with_commands(rx);
        tracing::info!(
            "Controls: edge|background [on|off], off, variant <hue|diff|seed>, operator <canny|sobel>, \
             threshold <n>, inverse on|off, seed <x> <y>, mask on|off, reset, quit"
        );
    }

    frame_loop.run()?;

    tracing::info!("segcam stopped");
    Ok(())
}
