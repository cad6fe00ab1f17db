use super::frame::{self, Frame, Mask, EMPTY_FILL, MASK_ON};
use super::morphology;
use super::types::{EdgeOperator, Separation};
use crate::error::Result;
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::filter::separable_filter_equal;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use std::collections::VecDeque;

/// Upper end of the edge threshold slider.
pub const MAX_EDGE_THRESHOLD: f32 = 100.0;

/// High threshold = low threshold * ratio.
pub const DEFAULT_EDGE_RATIO: f32 = 3.0;

// tan(22.5deg) in Q15
const TAN_22_5_Q15: i64 = 13573;

type Gradient = ImageBuffer<Luma<i16>, Vec<i16>>;

/// Stateless edge extraction.
#[derive(Debug, Clone)]
pub struct EdgeDetector {
    operator: EdgeOperator,
    ratio: f32,
}

impl Default for EdgeDetector {
    fn default() -> Self {
        Self::new(EdgeOperator::Canny, DEFAULT_EDGE_RATIO)
    }
}

impl EdgeDetector {
    pub fn new(operator: EdgeOperator, ratio: f32) -> Self {
        Self { operator, ratio }
    }

    pub fn operator(&self) -> EdgeOperator {
        self.operator
    }

    pub fn set_operator(&mut self, operator: EdgeOperator) {
        self.operator = operator;
    }

    /// Run the configured operator.
    ///
    /// Canny: grayscale, 3x3 box blur, hysteresis with `low = threshold` and
    /// `high = ratio * threshold`, then the original pixels are copied through
    /// the edge mask onto an empty canvas.
    ///
    /// Sobel: the gradient magnitude itself is the output (rendered gray) and
    /// `threshold` is unused.
    pub fn detect(&self, frame: &Frame, threshold: f32) -> Result<Separation> {
        let _span = tracing::debug_span!("edge_detect", operator = ?self.operator).entered();
        frame::ensure_non_empty(frame)?;

        match self.operator {
            EdgeOperator::Canny => {
                let low = threshold.clamp(0.0, MAX_EDGE_THRESHOLD);
                let gray = frame::to_gray(frame);
                let blurred = morphology::box_blur(&gray, 3);
                let mask = canny(&blurred, low, low * self.ratio);
                let output = frame::composite(frame, &mask, EMPTY_FILL)?;
                Ok(Separation { output, mask })
            }
            EdgeOperator::Sobel => {
                let magnitude = sobel_magnitude(frame);
                Ok(Separation {
                    output: frame::mask_to_rgb(&magnitude),
                    mask: magnitude,
                })
            }
        }
    }
}

/// Two-threshold hysteresis edge mask over an already smoothed plane.
///
/// Magnitudes are L1 (`|gx| + |gy|`). Pixels that survive non-maximum
/// suppression above `high` seed the edges; they grow into 8-connected
/// survivors above `low`.
pub fn canny(plane: &GrayImage, low: f32, high: f32) -> Mask {
    let (w, h) = plane.dimensions();
    let gx = horizontal_sobel(plane);
    let gy = vertical_sobel(plane);

    let magnitude: Vec<i32> = gx
        .pixels()
        .zip(gy.pixels())
        .map(|(a, b)| (a[0] as i32).abs() + (b[0] as i32).abs())
        .collect();

    let low = low.floor() as i32;
    let high = high.floor().max(low as f32) as i32;

    let mag_at = |x: i64, y: i64| -> i32 {
        if x < 0 || y < 0 || x >= w as i64 || y >= h as i64 {
            0
        } else {
            magnitude[y as usize * w as usize + x as usize]
        }
    };

    // 0 = rejected, 1 = weak candidate, 2 = strong
    let mut class = vec![0u8; magnitude.len()];
    let mut queue = VecDeque::new();

    for y in 0..h as i64 {
        for x in 0..w as i64 {
            let idx = y as usize * w as usize + x as usize;
            let m = magnitude[idx];
            if m <= low {
                continue;
            }
            if !is_local_max(&gx, &gy, x, y, m, &mag_at) {
                continue;
            }
            if m > high {
                class[idx] = 2;
                queue.push_back((x, y));
            } else {
                class[idx] = 1;
            }
        }
    }

    while let Some((x, y)) = queue.pop_front() {
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                    continue;
                }
                let idx = ny as usize * w as usize + nx as usize;
                if class[idx] == 1 {
                    class[idx] = 2;
                    queue.push_back((nx, ny));
                }
            }
        }
    }

    GrayImage::from_fn(w, h, |x, y| {
        let strong = class[y as usize * w as usize + x as usize] == 2;
        Luma([if strong { MASK_ON } else { 0 }])
    })
}

fn is_local_max(
    gx: &Gradient,
    gy: &Gradient,
    x: i64,
    y: i64,
    m: i32,
    mag_at: &impl Fn(i64, i64) -> i32,
) -> bool {
    let sx = gx.get_pixel(x as u32, y as u32)[0] as i64;
    let sy = gy.get_pixel(x as u32, y as u32)[0] as i64;
    let ax = sx.abs();
    let ay = sy.abs() << 15;

    let tg22 = ax * TAN_22_5_Q15;
    if ay < tg22 {
        // gradient mostly horizontal
        return m > mag_at(x - 1, y) && m >= mag_at(x + 1, y);
    }

    let tg67 = tg22 + (ax << 16);
    if ay > tg67 {
        // gradient mostly vertical
        return m > mag_at(x, y - 1) && m >= mag_at(x, y + 1);
    }

    let s = if (sx ^ sy) < 0 { -1 } else { 1 };
    m > mag_at(x - s, y - 1) && m > mag_at(x + s, y + 1)
}

// 3-tap binomial, i.e. a 3x3 Gaussian when applied both ways
const SMOOTH_3: [f32; 3] = [0.25, 0.5, 0.25];

/// `0.5 * |dx| + 0.5 * |dy|` of the grayscale frame after 3x3 Gaussian
/// smoothing of the colour frame, each derivative saturated to 8 bits first.
pub fn sobel_magnitude(frame: &Frame) -> GrayImage {
    let smoothed = separable_filter_equal(frame, &SMOOTH_3);
    let gray = frame::to_gray(&smoothed);
    let gx = horizontal_sobel(&gray);
    let gy = vertical_sobel(&gray);

    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let ax = (gx.get_pixel(x, y)[0] as i32).unsigned_abs().min(255);
        let ay = (gy.get_pixel(x, y)[0] as i32).unsigned_abs().min(255);
        Luma([((ax + ay + 1) / 2) as u8])
    })
}
