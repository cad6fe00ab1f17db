mod loopback;

pub use loopback::{rgb_to_yuyv, write_yuyv, V4L2Output};

use anyhow::Result;
use image::RgbImage;

/// Where finished frames are displayed
pub trait OutputSink {
    /// Hand over a processed frame; the sink owns any conversion or scaling
    fn present(&mut self, frame: &RgbImage) -> Result<()>;

    /// Size the sink renders at
    fn resolution(&self) -> (u32, u32);
}
