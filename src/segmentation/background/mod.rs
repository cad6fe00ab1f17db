//! Foreground/background separation strategies.
//!
//! Each strategy builds a selection mask and composites the original frame
//! through it. Only [`FrameDiff`] carries state between frames.

mod adaptive_hue;
mod frame_diff;
mod seed_fill;

pub use adaptive_hue::{AdaptiveHue, HUE_MASK_MAX};
pub use frame_diff::{FrameDiff, DEFAULT_DIFF_THRESHOLD};
pub use seed_fill::{SeedFill, DEFAULT_FILL_TOLERANCE};
