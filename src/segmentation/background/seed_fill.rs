use crate::error::{Result, SegError};
use crate::segmentation::frame::{self, Frame, MASK_ON, WHITE};
use crate::segmentation::types::{SeedPoint, Separation};
use image::{GrayImage, Luma, Rgb};
use std::collections::VecDeque;

/// Per-channel distance from the seed colour still accepted into the region.
pub const DEFAULT_FILL_TOLERANCE: u8 = 50;

/// Fixed-range flood fill from a user-picked seed.
///
/// Every candidate is compared against the colour of the seed pixel itself,
/// not against the neighbour it was reached from, so slow gradients do not
/// leak the region across the frame.
#[derive(Debug, Clone)]
pub struct SeedFill {
    lower: u8,
    upper: u8,
    fill: Rgb<u8>,
}

impl Default for SeedFill {
    fn default() -> Self {
        Self::new(DEFAULT_FILL_TOLERANCE, DEFAULT_FILL_TOLERANCE, WHITE)
    }
}

impl SeedFill {
    pub fn new(lower: u8, upper: u8, fill: Rgb<u8>) -> Self {
        Self { lower, upper, fill }
    }

    /// Paint the 4-connected region around `seed` with the fill colour.
    /// The mask marks the painted pixels.
    pub fn separate(&self, frame: Frame, seed: SeedPoint) -> Result<Separation> {
        let _span = tracing::debug_span!("seed_fill", x = seed.x, y = seed.y).entered();
        frame::ensure_non_empty(&frame)?;

        let (w, h) = frame.dimensions();
        if !seed.is_inside(w, h) {
            return Err(SegError::PreconditionViolation(format!(
                "seed ({}, {}) outside {}x{} frame",
                seed.x, seed.y, w, h
            )));
        }

        let origin = *frame.get_pixel(seed.x, seed.y);
        let ranges: [(u8, u8); 3] = std::array::from_fn(|c| {
            (
                origin[c].saturating_sub(self.lower),
                origin[c].saturating_add(self.upper),
            )
        });
        let accepts = |p: &Rgb<u8>| (0..3).all(|c| (ranges[c].0..=ranges[c].1).contains(&p[c]));

        let mut mask = GrayImage::new(w, h);
        let mut queue = VecDeque::from([(seed.x, seed.y)]);
        mask.put_pixel(seed.x, seed.y, Luma([MASK_ON]));

        while let Some((x, y)) = queue.pop_front() {
            let neighbours = [
                (x.checked_sub(1), Some(y)),
                (x.checked_add(1).filter(|&nx| nx < w), Some(y)),
                (Some(x), y.checked_sub(1)),
                (Some(x), y.checked_add(1).filter(|&ny| ny < h)),
            ];
            for (nx, ny) in neighbours {
                let (Some(nx), Some(ny)) = (nx, ny) else {
                    continue;
                };
                if mask.get_pixel(nx, ny)[0] != 0 || !accepts(frame.get_pixel(nx, ny)) {
                    continue;
                }
                mask.put_pixel(nx, ny, Luma([MASK_ON]));
                queue.push_back((nx, ny));
            }
        }

        let mut output = frame;
        for (x, y, m) in mask.enumerate_pixels() {
            if m[0] != 0 {
                output.put_pixel(x, y, self.fill);
            }
        }

        Ok(Separation { output, mask })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_fills_connected_uniform_region_only() {
        // left half blue-ish, right half far away in colour
        let frame = RgbImage::from_fn(10, 6, |x, _| {
            if x < 5 {
                Rgb([20, 40, 200])
            } else {
                Rgb([200, 180, 10])
            }
        });
        let result = SeedFill::default()
            .separate(frame.clone(), SeedPoint::new(1, 1))
            .unwrap();

        for (x, y, p) in result.output.enumerate_pixels() {
            if x < 5 {
                assert_eq!(*p, WHITE);
            } else {
                assert_eq!(p, frame.get_pixel(x, y));
            }
        }
    }

    #[test]
    fn test_fixed_range_stops_gradient() {
        // brightness climbs 20 per column; only columns within 50 of the seed fill
        let frame = RgbImage::from_fn(8, 2, |x, _| {
            let v = 20 * x as u8;
            Rgb([v, v, v])
        });
        let result = SeedFill::default()
            .separate(frame, SeedPoint::new(0, 0))
            .unwrap();

        let filled: Vec<u32> = (0..8)
            .filter(|&x| result.mask.get_pixel(x, 0)[0] == MASK_ON)
            .collect();
        assert_eq!(filled, vec![0, 1, 2]);
    }

    #[test]
    fn test_region_is_four_connected() {
        let mut frame = RgbImage::from_pixel(3, 3, Rgb([0, 0, 0]));
        frame.put_pixel(1, 1, Rgb([250, 250, 250]));
        frame.put_pixel(0, 1, Rgb([250, 250, 250]));
        frame.put_pixel(1, 0, Rgb([250, 250, 250]));
        frame.put_pixel(2, 1, Rgb([250, 250, 250]));
        frame.put_pixel(1, 2, Rgb([250, 250, 250]));
        // corners stay dark; seed in one corner cannot reach the others
        let result = SeedFill::default()
            .separate(frame, SeedPoint::new(0, 0))
            .unwrap();
        assert_eq!(result.mask.pixels().filter(|p| p[0] == MASK_ON).count(), 1);
    }

    #[test]
    fn test_seed_outside_frame_rejected() {
        let frame = RgbImage::new(4, 4);
        let err = SeedFill::default()
            .separate(frame, SeedPoint::new(4, 0))
            .unwrap_err();
        assert!(matches!(err, SegError::PreconditionViolation(_)));
    }
}
