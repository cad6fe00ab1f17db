pub mod background;
pub mod edges;
mod engine;
pub mod frame;
pub mod histogram;
pub mod morphology;
pub mod types;

pub use background::{AdaptiveHue, FrameDiff, SeedFill};
pub use edges::EdgeDetector;
pub use engine::{EngineConfig, SegmentationEngine};
pub use frame::{Frame, Mask};
pub use histogram::HueHistogram;
pub use types::{BackgroundVariant, EdgeOperator, Mode, SeedPoint, Separation};
