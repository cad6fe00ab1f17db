use super::background::{
    AdaptiveHue, FrameDiff, SeedFill, DEFAULT_DIFF_THRESHOLD, DEFAULT_FILL_TOLERANCE,
};
use super::edges::{EdgeDetector, DEFAULT_EDGE_RATIO, MAX_EDGE_THRESHOLD};
use super::frame::{self, Frame, WHITE};
use super::types::{BackgroundVariant, EdgeOperator, Mode, SeedPoint, Separation};
use crate::error::Result;

/// Start-up parameters for a [`SegmentationEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub mode: Mode,
    pub variant: BackgroundVariant,
    pub edge_operator: EdgeOperator,
    pub edge_threshold: f32,
    pub edge_ratio: f32,
    pub inverse: bool,
    pub seed: SeedPoint,
    pub show_mask: bool,
    pub diff_threshold: u8,
    pub fill_tolerance: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: Mode::PassThrough,
            variant: BackgroundVariant::AdaptiveHue,
            edge_operator: EdgeOperator::Canny,
            edge_threshold: 0.0,
            edge_ratio: DEFAULT_EDGE_RATIO,
            inverse: false,
            seed: SeedPoint::default(),
            show_mask: false,
            diff_threshold: DEFAULT_DIFF_THRESHOLD,
            fill_tolerance: DEFAULT_FILL_TOLERANCE,
        }
    }
}

/// Routes every frame to the selected algorithm.
///
/// Configuration only changes through the setters below; the algorithms
/// never touch mode or variant. The only cross-frame state is the previous
/// frame held by the frame-differencing strategy.
#[derive(Debug, Clone)]
pub struct SegmentationEngine {
    mode: Mode,
    variant: BackgroundVariant,
    edge_threshold: f32,
    inverse: bool,
    seed: SeedPoint,
    show_mask: bool,
    edges: EdgeDetector,
    adaptive_hue: AdaptiveHue,
    frame_diff: FrameDiff,
    seed_fill: SeedFill,
}

impl Default for SegmentationEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl SegmentationEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            mode: config.mode,
            variant: config.variant,
            edge_threshold: clamp_threshold(config.edge_threshold),
            inverse: config.inverse,
            seed: config.seed,
            show_mask: config.show_mask,
            edges: EdgeDetector::new(config.edge_operator, config.edge_ratio),
            adaptive_hue: AdaptiveHue::new(),
            frame_diff: FrameDiff::new(config.diff_threshold),
            seed_fill: SeedFill::new(config.fill_tolerance, config.fill_tolerance, WHITE),
        }
    }

    /// Process one captured frame.
    ///
    /// Pass-through hands the frame back untouched. Errors only come from
    /// broken preconditions; the call is then abandoned with state intact.
    pub fn process(&mut self, frame: Frame) -> Result<Frame> {
        let separation = match self.mode {
            Mode::PassThrough => return Ok(frame),
            Mode::Edge => self.edges.detect(&frame, self.edge_threshold)?,
            Mode::Background => match self.variant {
                BackgroundVariant::AdaptiveHue => {
                    self.adaptive_hue.separate(&frame, self.inverse)?
                }
                BackgroundVariant::FrameDiff => self.frame_diff.separate(frame, self.inverse)?,
                BackgroundVariant::SeedFill => self.seed_fill.separate(frame, self.seed)?,
            },
        };
        Ok(self.emit(separation))
    }

    fn emit(&self, separation: Separation) -> Frame {
        if self.show_mask {
            frame::mask_to_rgb(&separation.mask)
        } else {
            separation.output
        }
    }

    /// Edge checkbox. Checking it clears the background selection.
    pub fn select_edge(&mut self, selected: bool) {
        let next = match (selected, self.mode) {
            (true, _) => Mode::Edge,
            (false, Mode::Edge) => Mode::PassThrough,
            (false, other) => other,
        };
        self.transition(next);
    }

    /// Background checkbox. Checking it clears the edge selection.
    pub fn select_background(&mut self, selected: bool) {
        let next = match (selected, self.mode) {
            (true, _) => Mode::Background,
            (false, Mode::Background) => Mode::PassThrough,
            (false, other) => other,
        };
        self.transition(next);
    }

    /// Jump straight to a mode; exclusivity holds because `Mode` has one value.
    pub fn set_mode(&mut self, mode: Mode) {
        self.transition(mode);
    }

    fn transition(&mut self, next: Mode) {
        if next != self.mode {
            tracing::info!(from = ?self.mode, to = ?next, "mode changed");
            self.mode = next;
        }
    }

    /// Switching away from frame differencing drops its stored frame.
    pub fn set_variant(&mut self, variant: BackgroundVariant) {
        if variant == self.variant {
            return;
        }
        if self.variant == BackgroundVariant::FrameDiff {
            self.frame_diff.reset();
        }
        tracing::info!(?variant, "background variant changed");
        self.variant = variant;
    }

    pub fn set_edge_operator(&mut self, operator: EdgeOperator) {
        self.edges.set_operator(operator);
    }

    /// Low hysteresis threshold, clamped to `[0, MAX_EDGE_THRESHOLD]`.
    pub fn set_edge_threshold(&mut self, threshold: f32) {
        self.edge_threshold = clamp_threshold(threshold);
    }

    pub fn set_inverse(&mut self, inverse: bool) {
        self.inverse = inverse;
    }

    pub fn set_seed(&mut self, seed: SeedPoint) {
        self.seed = seed;
    }

    pub fn set_show_mask(&mut self, show_mask: bool) {
        self.show_mask = show_mask;
    }

    /// Drop cross-frame state, e.g. after the camera changed.
    pub fn reset(&mut self) {
        tracing::info!("resetting segmentation state");
        self.frame_diff.reset();
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn variant(&self) -> BackgroundVariant {
        self.variant
    }

    pub fn edge_operator(&self) -> EdgeOperator {
        self.edges.operator()
    }

    pub fn edge_threshold(&self) -> f32 {
        self.edge_threshold
    }

    pub fn inverse(&self) -> bool {
        self.inverse
    }

    pub fn seed(&self) -> SeedPoint {
        self.seed
    }

    pub fn show_mask(&self) -> bool {
        self.show_mask
    }

    pub fn previous_frame(&self) -> Option<&Frame> {
        self.frame_diff.previous()
    }
}

fn clamp_threshold(threshold: f32) -> f32 {
    if threshold.is_nan() {
        0.0
    } else {
        threshold.clamp(0.0, MAX_EDGE_THRESHOLD)
    }
}
