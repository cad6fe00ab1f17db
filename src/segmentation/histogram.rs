use image::GrayImage;

/// Number of 8-bit hue levels (`0..=179`).
pub const HUE_BINS: usize = 180;

/// Distribution of hue values over a single-channel plane.
#[derive(Debug, Clone)]
pub struct HueHistogram {
    bins: [u64; HUE_BINS],
    pixels: u64,
}

impl HueHistogram {
    /// Count every pixel of `plane` into its hue bin.
    ///
    /// Values above 179 are not valid hues; they are counted towards the
    /// pixel total but land in no bin.
    pub fn from_plane(plane: &GrayImage) -> Self {
        let mut bins = [0u64; HUE_BINS];
        for p in plane.pixels() {
            if let Some(bin) = bins.get_mut(p[0] as usize) {
                *bin += 1;
            }
        }

        Self {
            bins,
            pixels: plane.width() as u64 * plane.height() as u64,
        }
    }

    /// Bin-weighted mean: `sum(bin[h] * h) / (width * height)`.
    pub fn mean(&self) -> f64 {
        if self.pixels == 0 {
            return 0.0;
        }
        let weighted: u64 = self
            .bins
            .iter()
            .enumerate()
            .map(|(h, &count)| count * h as u64)
            .sum();
        weighted as f64 / self.pixels as f64
    }

    pub fn bin(&self, hue: u8) -> u64 {
        self.bins.get(hue as usize).copied().unwrap_or(0)
    }

    pub fn pixel_count(&self) -> u64 {
        self.pixels
    }

    /// Shorthand for `HueHistogram::from_plane(plane).mean()`.
    pub fn mean_of(plane: &GrayImage) -> f64 {
        Self::from_plane(plane).mean()
    }
}
