use super::CaptureSource;
use crate::error::SegError;
use anyhow::Result;
use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::Camera;

pub struct WebcamCapture {
    camera: Camera,
    width: u32,
    height: u32,
    streaming: bool,
}

impl WebcamCapture {
    /// Open `device_index` and start streaming as close as possible to the
    /// requested size and rate.
    pub fn new(device_index: u32, width: u32, height: u32, fps: u32) -> Result<Self, SegError> {
        tracing::info!(
            "Initializing webcam {} at {}x{}@{}",
            device_index,
            width,
            height,
            fps
        );

        let index = CameraIndex::Index(device_index);
        let format = CameraFormat::new(Resolution::new(width, height), FrameFormat::YUYV, fps);
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(format));

        let mut camera = Camera::new(index, requested).map_err(|e| {
            SegError::DeviceUnavailable(format!("camera {device_index}: {e}"))
        })?;

        camera.open_stream().map_err(|e| {
            SegError::DeviceUnavailable(format!("camera {device_index} stream: {e}"))
        })?;

        // The driver may settle on a different size than requested
        let actual = camera.resolution();
        tracing::info!(
            "Webcam streaming at {}x{}",
            actual.width(),
            actual.height()
        );

        Ok(Self {
            camera,
            width: actual.width(),
            height: actual.height(),
            streaming: true,
        })
    }
}

impl CaptureSource for WebcamCapture {
    fn try_read_frame(&mut self) -> Result<Option<RgbImage>> {
        if !self.streaming {
            return Ok(None);
        }

        let frame = match self.camera.frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Dropped capture tick: {}", e);
                return Ok(None);
            }
        };

        match frame.decode_image::<RgbFormat>() {
            Ok(decoded) if decoded.width() > 0 && decoded.height() > 0 => Ok(Some(decoded)),
            Ok(_) => Ok(None),
            Err(e) => {
                tracing::warn!("Failed to decode frame: {}", e);
                Ok(None)
            }
        }
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn release(&mut self) {
        if !self.streaming {
            return;
        }
        self.streaming = false;
        match self.camera.stop_stream() {
            Ok(()) => tracing::info!("Webcam released"),
            Err(e) => tracing::warn!("Error while releasing webcam: {}", e),
        }
    }
}

impl Drop for WebcamCapture {
    fn drop(&mut self) {
        self.release();
    }
}
