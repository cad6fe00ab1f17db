use crate::error::{Result, SegError};
use image::{GrayImage, Luma, Rgb, RgbImage};

/// A captured colour frame. Every strategy consumes and produces one of these.
pub type Frame = RgbImage;

/// Single-channel selector. Any non-zero value counts as "set" when compositing.
pub type Mask = GrayImage;

/// Value written into a mask for selected pixels.
pub const MASK_ON: u8 = 255;

/// Fill used where an edge/motion mask is unset (zero-initialised canvas).
pub const EMPTY_FILL: Rgb<u8> = Rgb([0, 0, 0]);

/// Fill used by the hue strategy's canvas and the seed-fill colour.
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Reject frames with no pixels before any strategy touches them.
pub fn ensure_non_empty(frame: &Frame) -> Result<()> {
    if frame.width() == 0 || frame.height() == 0 {
        return Err(SegError::PreconditionViolation(
            "frame has zero width or height".into(),
        ));
    }
    Ok(())
}

/// Fixed-point luma with weights 0.299/0.587/0.114 (scaled by 2^14).
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let y = r as u32 * 4899 + g as u32 * 9617 + b as u32 * 1868;
    ((y + (1 << 13)) >> 14) as u8
}

/// Collapse a colour frame into a grayscale plane.
pub fn to_gray(frame: &Frame) -> GrayImage {
    GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
        let p = frame.get_pixel(x, y);
        Luma([luminance(p[0], p[1], p[2])])
    })
}

/// 8-bit quantised hue in `[0, 179]` (degrees halved).
///
/// Achromatic pixels (max == min) have hue 0.
pub fn hue(r: u8, g: u8, b: u8) -> u8 {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    if delta == 0.0 {
        return 0;
    }

    let mut degrees = if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if degrees < 0.0 {
        degrees += 360.0;
    }

    // 359.x degrees rounds up to 180, which is the same angle as 0
    ((degrees / 2.0).round() as u32 % 180) as u8
}

/// Extract the hue plane of a frame.
pub fn hue_plane(frame: &Frame) -> GrayImage {
    GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
        let p = frame.get_pixel(x, y);
        Luma([hue(p[0], p[1], p[2])])
    })
}

/// Per-channel absolute difference of two equally sized frames.
pub fn abs_diff(current: &Frame, previous: &Frame) -> Result<Frame> {
    ensure_same_size(current.dimensions(), previous.dimensions(), "abs_diff")?;
    Ok(RgbImage::from_fn(current.width(), current.height(), |x, y| {
        let a = current.get_pixel(x, y);
        let b = previous.get_pixel(x, y);
        Rgb([a[0].abs_diff(b[0]), a[1].abs_diff(b[1]), a[2].abs_diff(b[2])])
    }))
}

/// Copy `frame` pixels wherever `mask` is non-zero, `fill` everywhere else.
pub fn composite(frame: &Frame, mask: &Mask, fill: Rgb<u8>) -> Result<Frame> {
    ensure_same_size(frame.dimensions(), mask.dimensions(), "composite")?;
    Ok(RgbImage::from_fn(frame.width(), frame.height(), |x, y| {
        if mask.get_pixel(x, y)[0] != 0 {
            *frame.get_pixel(x, y)
        } else {
            fill
        }
    }))
}

/// Render a mask as a gray frame for previewing.
pub fn mask_to_rgb(mask: &Mask) -> Frame {
    RgbImage::from_fn(mask.width(), mask.height(), |x, y| {
        let v = mask.get_pixel(x, y)[0];
        Rgb([v, v, v])
    })
}

pub(crate) fn ensure_same_size(a: (u32, u32), b: (u32, u32), op: &str) -> Result<()> {
    if a != b {
        return Err(SegError::PreconditionViolation(format!(
            "{op}: {}x{} does not match {}x{}",
            a.0, a.1, b.0, b.1
        )));
    }
    Ok(())
}
