use image::{GrayImage, Luma};
use imageproc::integral_image::{integral_image, sum_image_pixels};
use imageproc::morphology::{grayscale_dilate, grayscale_erode, Mask};

/// How a threshold maps pixels above the cut-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdKind {
    /// above -> `max_value`, otherwise 0
    Binary,
    /// above -> 0, otherwise `max_value`
    BinaryInv,
}

/// Binary threshold. A fractional cut-off is floored first, so a pixel `v`
/// counts as "above" when `v > floor(thresh)`.
pub fn threshold(plane: &GrayImage, thresh: f64, max_value: u8, kind: ThresholdKind) -> GrayImage {
    let cut = thresh.floor();
    let mut out = plane.clone();
    for p in out.pixels_mut() {
        let above = p[0] as f64 > cut;
        p[0] = match (kind, above) {
            (ThresholdKind::Binary, true) | (ThresholdKind::BinaryInv, false) => max_value,
            _ => 0,
        };
    }
    out
}

/// Normalised `ksize x ksize` box blur. `ksize` should be odd.
///
/// Each output is the rounded mean of the window clipped to the plane, so a
/// uniform plane is left unchanged up to the border.
pub fn box_blur(plane: &GrayImage, ksize: u32) -> GrayImage {
    let radius = ksize / 2;
    let (w, h) = plane.dimensions();
    if radius == 0 || w == 0 || h == 0 {
        return plane.clone();
    }

    let integral = integral_image::<_, u32>(plane);
    GrayImage::from_fn(w, h, |x, y| {
        let (left, top) = (x.saturating_sub(radius), y.saturating_sub(radius));
        let (right, bottom) = ((x + radius).min(w - 1), (y + radius).min(h - 1));
        let area = (right - left + 1) * (bottom - top + 1);
        let sum = sum_image_pixels(&integral, left, top, right, bottom)[0];
        Luma([((sum + area / 2) / area) as u8])
    })
}

/// Grayscale dilation with a 3x3 square, applied `iterations` times.
/// Neighbours outside the plane do not take part.
pub fn dilate(plane: &GrayImage, iterations: u32) -> GrayImage {
    let square = Mask::square(1);
    (0..iterations).fold(plane.clone(), |acc, _| grayscale_dilate(&acc, &square))
}

/// Grayscale erosion with a 3x3 square, applied `iterations` times.
pub fn erode(plane: &GrayImage, iterations: u32) -> GrayImage {
    let square = Mask::square(1);
    (0..iterations).fold(plane.clone(), |acc, _| grayscale_erode(&acc, &square))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(size: u32, value: u8) -> GrayImage {
        let mut plane = GrayImage::new(size, size);
        plane.put_pixel(size / 2, size / 2, Luma([value]));
        plane
    }

    #[test]
    fn test_threshold_floors_fractional_cut() {
        let plane = GrayImage::from_fn(4, 1, |x, _| Luma([9 + x as u8])); // 9,10,11,12
        let out = threshold(&plane, 10.7, 255, ThresholdKind::Binary);
        let values: Vec<u8> = out.pixels().map(|p| p[0]).collect();
        assert_eq!(values, vec![0, 0, 255, 255]);
    }

    #[test]
    fn test_threshold_inverse_is_complement() {
        let plane = GrayImage::from_fn(4, 1, |x, _| Luma([x as u8 * 60]));
        let bin = threshold(&plane, 100.0, 179, ThresholdKind::Binary);
        let inv = threshold(&plane, 100.0, 179, ThresholdKind::BinaryInv);
        for (a, b) in bin.pixels().zip(inv.pixels()) {
            assert_eq!(a[0] as u16 + b[0] as u16, 179);
        }
    }

    #[test]
    fn test_dilate_grows_single_pixel() {
        let out = dilate(&dot(5, 200), 1);
        let on = out.pixels().filter(|p| p[0] == 200).count();
        assert_eq!(on, 9);
    }

    #[test]
    fn test_erode_removes_single_pixel() {
        let out = erode(&dot(5, 200), 1);
        assert!(out.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_erode_keeps_full_plane_at_border() {
        let plane = GrayImage::from_pixel(4, 3, Luma([179]));
        assert_eq!(erode(&plane, 3), plane);
    }

    #[test]
    fn test_box_blur_keeps_uniform_plane() {
        let plane = GrayImage::from_pixel(6, 6, Luma([120]));
        assert_eq!(box_blur(&plane, 5), plane);
        assert_eq!(box_blur(&plane, 1), plane);
    }

    #[test]
    fn test_box_blur_rounds_window_mean() {
        // 13 of 25 window pixels at 179: mean 93.08
        let checker =
            GrayImage::from_fn(5, 5, |x, y| Luma([if (x + y) % 2 == 0 { 179 } else { 0 }]));
        assert_eq!(box_blur(&checker, 5).get_pixel(2, 2)[0], 93);

        // one row of 5 at 179: mean 35.8
        let row = GrayImage::from_fn(5, 5, |_, y| Luma([if y == 0 { 179 } else { 0 }]));
        assert_eq!(box_blur(&row, 5).get_pixel(2, 2)[0], 36);
    }

    #[test]
    fn test_box_blur_clips_window_at_border() {
        let mut plane = GrayImage::new(5, 5);
        plane.put_pixel(0, 0, Luma([90]));
        // corner window of a 3x3 kernel covers 4 pixels
        assert_eq!(box_blur(&plane, 3).get_pixel(0, 0)[0], 23);
    }

    #[test]
    fn test_dilate_ignores_outside_at_corner() {
        let plane = GrayImage::from_fn(3, 3, |x, y| Luma([(x + 3 * y) as u8]));
        let out = dilate(&plane, 1);
        assert_eq!(out.get_pixel(0, 0)[0], 4);
        assert_eq!(erode(&plane, 1).get_pixel(2, 2)[0], 4);
    }
}
