use crate::error::Result;
use crate::segmentation::frame::{self, Frame, EMPTY_FILL, MASK_ON};
use crate::segmentation::morphology::{self, ThresholdKind};
use crate::segmentation::types::Separation;

/// Gray-level difference above which a pixel counts as changed.
pub const DEFAULT_DIFF_THRESHOLD: u8 = 10;

/// Compares each frame against the one before it.
///
/// Frames must arrive in capture order with nothing skipped: the stored
/// frame is always the last one successfully processed.
#[derive(Debug, Clone)]
pub struct FrameDiff {
    previous: Option<Frame>,
    threshold: u8,
}

impl Default for FrameDiff {
    fn default() -> Self {
        Self::new(DEFAULT_DIFF_THRESHOLD)
    }
}

impl FrameDiff {
    pub fn new(threshold: u8) -> Self {
        Self {
            previous: None,
            threshold,
        }
    }

    /// By default pixels that stayed within the threshold are kept (static
    /// scene); `inverse` keeps the pixels that changed instead. Everything
    /// else is left empty.
    ///
    /// The first call compares the frame with itself, so nothing changed.
    /// A size mismatch with the stored frame aborts the call and keeps the
    /// stored frame.
    pub fn separate(&mut self, frame: Frame, inverse: bool) -> Result<Separation> {
        let _span = tracing::debug_span!("frame_diff", inverse).entered();
        frame::ensure_non_empty(&frame)?;

        let previous = self.previous.as_ref().unwrap_or(&frame);
        let diff = frame::abs_diff(&frame, previous)?;
        let gray = frame::to_gray(&diff);

        let kind = if inverse {
            ThresholdKind::Binary
        } else {
            ThresholdKind::BinaryInv
        };
        let mask = morphology::threshold(&gray, self.threshold as f64, MASK_ON, kind);
        let output = frame::composite(&frame, &mask, EMPTY_FILL)?;

        self.previous = Some(frame);
        Ok(Separation { output, mask })
    }

    pub fn previous(&self) -> Option<&Frame> {
        self.previous.as_ref()
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Forget the stored frame; the next call behaves like a first call.
    pub fn reset(&mut self) {
        self.previous = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SegError;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_first_call_sees_no_motion() {
        let frame = RgbImage::from_fn(6, 4, |x, y| Rgb([x as u8 * 40, y as u8 * 60, 9]));
        let mut diff = FrameDiff::default();
        assert!(diff.previous().is_none());

        let result = diff.separate(frame.clone(), true).unwrap();
        assert!(result.mask.pixels().all(|p| p[0] == 0));
        assert_eq!(diff.previous(), Some(&frame));
    }

    #[test]
    fn test_default_keeps_static_pixels() {
        let frame = RgbImage::from_pixel(3, 3, Rgb([70, 80, 90]));
        let mut diff = FrameDiff::default();

        let result = diff.separate(frame.clone(), false).unwrap();
        assert_eq!(result.output, frame);
    }

    #[test]
    fn test_changed_pixel_selected() {
        let base = RgbImage::from_pixel(4, 4, Rgb([100, 100, 100]));
        let mut moved = base.clone();
        moved.put_pixel(2, 1, Rgb([160, 160, 160]));

        let mut diff = FrameDiff::default();
        diff.separate(base, true).unwrap();
        let result = diff.separate(moved.clone(), true).unwrap();

        assert_eq!(result.mask.get_pixel(2, 1)[0], MASK_ON);
        assert_eq!(result.output.get_pixel(2, 1), moved.get_pixel(2, 1));
        assert_eq!(result.mask.pixels().filter(|p| p[0] == MASK_ON).count(), 1);
        assert_eq!(*result.output.get_pixel(0, 0), EMPTY_FILL);
    }

    #[test]
    fn test_difference_at_threshold_is_ignored() {
        let base = RgbImage::from_pixel(2, 2, Rgb([50, 50, 50]));
        let nudged = RgbImage::from_pixel(2, 2, Rgb([60, 60, 60]));

        let mut diff = FrameDiff::default();
        diff.separate(base, true).unwrap();
        let result = diff.separate(nudged, true).unwrap();
        assert!(result.mask.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_size_mismatch_keeps_previous() {
        let first = RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]));
        let mut diff = FrameDiff::default();
        diff.separate(first.clone(), false).unwrap();

        let err = diff.separate(RgbImage::new(5, 4), false).unwrap_err();
        assert!(matches!(err, SegError::PreconditionViolation(_)));
        assert_eq!(diff.previous(), Some(&first));
    }

    #[test]
    fn test_reset_restarts_sequence() {
        let mut diff = FrameDiff::default();
        diff.separate(RgbImage::from_pixel(2, 2, Rgb([0, 0, 0])), true)
            .unwrap();
        diff.reset();
        assert!(diff.previous().is_none());

        let result = diff
            .separate(RgbImage::from_pixel(2, 2, Rgb([255, 255, 255])), true)
            .unwrap();
        assert!(result.mask.pixels().all(|p| p[0] == 0));
    }
}
