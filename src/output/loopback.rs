use super::OutputSink;
use crate::error::SegError;
use crate::segmentation::frame::luminance;
use anyhow::Result;
use image::RgbImage;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use v4l::video::Output;
use v4l::{Device, FourCC};

/// Displays processed frames by feeding a v4l2loopback device as YUYV.
pub struct V4L2Output {
    _device: Device,
    file: File,
    width: u32,
    height: u32,
}

impl V4L2Output {
    pub fn new<P: AsRef<Path>>(device_path: P, width: u32, height: u32) -> Result<Self, SegError> {
        let path = device_path.as_ref();
        tracing::info!(
            "Opening v4l2loopback device at {} ({}x{})",
            path.display(),
            width,
            height
        );

        let unavailable =
            |e: std::io::Error| SegError::DeviceUnavailable(format!("{}: {e}", path.display()));

        let device = Device::with_path(path).map_err(unavailable)?;
        let mut format = Output::format(&device).map_err(unavailable)?;
        format.width = width;
        format.height = height;
        format.fourcc = FourCC::new(b"YUYV");
        let format = Output::set_format(&device, &format).map_err(unavailable)?;
        tracing::debug!("Loopback format negotiated: {}", format);

        let file = File::options()
            .write(true)
            .open(path)
            .map_err(unavailable)?;

        Ok(Self {
            _device: device,
            file,
            width: format.width,
            height: format.height,
        })
    }
}

/// Pack an RGB frame as YUYV, sharing chroma across each horizontal pair.
pub fn rgb_to_yuyv(frame: &RgbImage) -> Vec<u8> {
    let (width, height) = frame.dimensions();
    let mut yuyv = Vec::with_capacity((width as usize + 1) / 2 * 4 * height as usize);

    for y in 0..height {
        for x in (0..width).step_by(2) {
            let left = frame.get_pixel(x, y);
            let right = if x + 1 < width {
                frame.get_pixel(x + 1, y)
            } else {
                left
            };

            let (u1, v1) = chroma(left[0], left[1], left[2]);
            let (u2, v2) = chroma(right[0], right[1], right[2]);

            yuyv.push(luminance(left[0], left[1], left[2]));
            yuyv.push(((u1 as u16 + u2 as u16) / 2) as u8);
            yuyv.push(luminance(right[0], right[1], right[2]));
            yuyv.push(((v1 as u16 + v2 as u16) / 2) as u8);
        }
    }

    yuyv
}

/// Write one frame as packed YUYV.
pub fn write_yuyv<W: Write>(writer: &mut W, frame: &RgbImage) -> Result<(), SegError> {
    writer
        .write_all(&rgb_to_yuyv(frame))
        .map_err(SegError::Output)
}

fn chroma(r: u8, g: u8, b: u8) -> (u8, u8) {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let u = (-0.147 * r - 0.289 * g + 0.436 * b + 128.0).clamp(0.0, 255.0) as u8;
    let v = (0.615 * r - 0.515 * g - 0.100 * b + 128.0).clamp(0.0, 255.0) as u8;
    (u, v)
}

impl OutputSink for V4L2Output {
    fn present(&mut self, frame: &RgbImage) -> Result<()> {
        let resized;
        let frame = if frame.dimensions() != (self.width, self.height) {
            resized = image::imageops::resize(
                frame,
                self.width,
                self.height,
                image::imageops::FilterType::Triangle,
            );
            &resized
        } else {
            frame
        };

        write_yuyv(&mut self.file, frame)?;
        Ok(())
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_yuyv_gray_has_neutral_chroma() {
        let frame = RgbImage::from_pixel(4, 2, Rgb([128, 128, 128]));
        let packed = rgb_to_yuyv(&frame);
        assert_eq!(packed.len(), 4 * 2 * 2);
        for quad in packed.chunks(4) {
            assert_eq!(quad[0], 128);
            assert_eq!(quad[2], 128);
            assert!((127..=129).contains(&quad[1]));
            assert!((127..=129).contains(&quad[3]));
        }
    }

    #[test]
    fn test_yuyv_odd_width_repeats_last_pixel() {
        let frame = RgbImage::from_pixel(3, 1, Rgb([255, 255, 255]));
        let packed = rgb_to_yuyv(&frame);
        assert_eq!(packed.len(), 8);
        assert_eq!(packed[6], 255);
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_output_error() {
        let frame = RgbImage::from_pixel(2, 2, Rgb([10, 20, 30]));
        let err = write_yuyv(&mut ClosedPipe, &frame).unwrap_err();
        assert!(matches!(
            err,
            SegError::Output(ref e) if e.kind() == std::io::ErrorKind::BrokenPipe
        ));

        let mut sink = Vec::new();
        write_yuyv(&mut sink, &frame).unwrap();
        assert_eq!(sink, rgb_to_yuyv(&frame));
    }
}
