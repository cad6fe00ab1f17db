use crate::error::Result;
use crate::segmentation::frame::{self, Frame, WHITE};
use crate::segmentation::histogram::HueHistogram;
use crate::segmentation::morphology::{self, ThresholdKind};
use crate::segmentation::types::Separation;

/// Selected value in hue masks (top of the 8-bit hue scale).
pub const HUE_MASK_MAX: u8 = 179;

const BLUR_KSIZE: u32 = 5;
const DILATE_ITERATIONS: u32 = 1;
const ERODE_ITERATIONS: u32 = 3;

/// Separates a roughly uniform background by thresholding hue around the
/// frame's mean hue.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdaptiveHue;

impl AdaptiveHue {
    pub fn new() -> Self {
        Self
    }

    /// By default pixels whose hue is above the mean are dropped; `inverse`
    /// keeps them instead. The final re-binarisation after smoothing never
    /// inverts. Dropped pixels come out white.
    pub fn separate(&self, frame: &Frame, inverse: bool) -> Result<Separation> {
        let _span = tracing::debug_span!("adaptive_hue", inverse).entered();
        frame::ensure_non_empty(frame)?;

        let hue = frame::hue_plane(frame);
        let mean_hue = HueHistogram::mean_of(&hue);
        tracing::trace!(mean_hue, "hue threshold");

        let kind = if inverse {
            ThresholdKind::Binary
        } else {
            ThresholdKind::BinaryInv
        };
        let mask = morphology::threshold(&hue, mean_hue, HUE_MASK_MAX, kind);

        // dilate to fill gaps, erode harder to drop speckle
        let mask = morphology::box_blur(&mask, BLUR_KSIZE);
        let mask = morphology::dilate(&mask, DILATE_ITERATIONS);
        let mask = morphology::erode(&mask, ERODE_ITERATIONS);

        let mask = morphology::threshold(&mask, mean_hue, HUE_MASK_MAX, ThresholdKind::Binary);

        let output = frame::composite(frame, &mask, WHITE)?;
        Ok(Separation { output, mask })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    // green (hue 60) square on a red (hue 0) field
    fn green_on_red() -> RgbImage {
        RgbImage::from_fn(24, 24, |x, y| {
            if (6..18).contains(&x) && (6..18).contains(&y) {
                Rgb([0, 200, 0])
            } else {
                Rgb([200, 0, 0])
            }
        })
    }

    #[test]
    fn test_mask_is_strictly_binary() {
        let result = AdaptiveHue::new().separate(&green_on_red(), false).unwrap();
        assert!(result
            .mask
            .pixels()
            .all(|p| p[0] == 0 || p[0] == HUE_MASK_MAX));
    }

    #[test]
    fn test_inverse_keeps_high_hue_region() {
        let frame = green_on_red();
        let result = AdaptiveHue::new().separate(&frame, true).unwrap();

        // centre of the green square survives smoothing
        assert_eq!(result.output.get_pixel(12, 12), frame.get_pixel(12, 12));
        // red field sits below the mean hue and turns white
        assert_eq!(*result.output.get_pixel(1, 1), WHITE);
    }

    #[test]
    fn test_default_drops_high_hue_region() {
        let frame = green_on_red();
        let result = AdaptiveHue::new().separate(&frame, false).unwrap();
        assert_eq!(*result.output.get_pixel(12, 12), WHITE);
    }

    #[test]
    fn test_output_is_original_or_white() {
        let frame = green_on_red();
        let result = AdaptiveHue::new().separate(&frame, true).unwrap();
        for (x, y, p) in result.output.enumerate_pixels() {
            assert!(*p == WHITE || p == frame.get_pixel(x, y));
        }
    }
}
