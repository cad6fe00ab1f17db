mod v4l_capture;

pub use v4l_capture::WebcamCapture;

use anyhow::Result;
use image::RgbImage;

/// Trait for camera capture sources
pub trait CaptureSource {
    /// Read the next frame if one is ready
    ///
    /// `Ok(None)` means this tick produced nothing usable; callers skip the
    /// tick and keep all state.
    fn try_read_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Get the resolution of captured frames
    fn resolution(&self) -> (u32, u32);

    /// Give the device back. Must tolerate being called more than once.
    fn release(&mut self) {}
}
