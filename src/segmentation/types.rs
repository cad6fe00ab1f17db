use super::frame::{Frame, Mask};
use clap::ValueEnum;

/// Which algorithm family handles incoming frames.
///
/// Mirrors a pair of mutually exclusive checkboxes: `PassThrough` is
/// "neither selected", `Edge` and `Background` are the two exclusive states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Mode {
    #[default]
    #[value(alias = "off")]
    PassThrough,
    Edge,
    #[value(alias = "bg")]
    Background,
}

/// Foreground/background separation strategy used in `Mode::Background`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BackgroundVariant {
    #[default]
    #[value(alias = "hue")]
    AdaptiveHue,
    #[value(alias = "diff")]
    FrameDiff,
    #[value(alias = "seed")]
    SeedFill,
}

/// Edge operator used in `Mode::Edge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum EdgeOperator {
    #[default]
    Canny,
    Sobel,
}

/// Pixel coordinate picked by the user as the seed-fill origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedPoint {
    pub x: u32,
    pub y: u32,
}

impl SeedPoint {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Pull the point inside a `width x height` frame.
    pub fn clamped(self, width: u32, height: u32) -> Self {
        Self {
            x: self.x.min(width.saturating_sub(1)),
            y: self.y.min(height.saturating_sub(1)),
        }
    }

    pub fn is_inside(&self, width: u32, height: u32) -> bool {
        self.x < width && self.y < height
    }
}

/// Result of one strategy run: the composited frame and the mask behind it.
#[derive(Debug, Clone)]
pub struct Separation {
    pub output: Frame,
    pub mask: Mask,
}
