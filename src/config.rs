use crate::segmentation::background::{DEFAULT_DIFF_THRESHOLD, DEFAULT_FILL_TOLERANCE};
use crate::segmentation::edges::DEFAULT_EDGE_RATIO;
use crate::segmentation::{BackgroundVariant, EdgeOperator, EngineConfig, Mode, SeedPoint};
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Live webcam edge detection and background removal", long_about = None)]
pub struct Args {
    /// Input webcam device index
    #[arg(short, long, default_value_t = 0)]
    pub input_device: u32,

    /// Output v4l2loopback device path
    #[arg(short, long, default_value = "/dev/video10")]
    pub output_device: String,

    /// Capture resolution width
    #[arg(long, default_value_t = 640)]
    pub capture_width: u32,

    /// Capture resolution height
    #[arg(long, default_value_t = 480)]
    pub capture_height: u32,

    /// Target frames per second
    #[arg(long, default_value_t = 30)]
    pub fps: u32,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Initial processing mode
    #[arg(long, value_enum, default_value_t = Mode::PassThrough)]
    pub mode: Mode,

    /// Background removal strategy
    #[arg(long, value_enum, default_value_t = BackgroundVariant::AdaptiveHue)]
    pub background: BackgroundVariant,

    /// Edge operator
    #[arg(long, value_enum, default_value_t = EdgeOperator::Canny)]
    pub edge_operator: EdgeOperator,

    /// Low edge threshold (high = 3x), 0..=100
    #[arg(long, default_value_t = 0.0)]
    pub threshold: f32,

    /// Invert the background threshold
    #[arg(long)]
    pub inverse: bool,

    /// Seed-fill origin, x
    #[arg(long, default_value_t = 0)]
    pub seed_x: u32,

    /// Seed-fill origin, y
    #[arg(long, default_value_t = 0)]
    pub seed_y: u32,

    /// Output the selection mask instead of the composited frame
    #[arg(long)]
    pub show_mask: bool,

    /// Gray-level change that counts as motion for frame differencing
    #[arg(long, default_value_t = DEFAULT_DIFF_THRESHOLD)]
    pub diff_threshold: u8,

    /// Per-channel colour tolerance for seed fill
    #[arg(long, default_value_t = DEFAULT_FILL_TOLERANCE)]
    pub fill_tolerance: u8,

    /// Do not read control commands from stdin
    #[arg(long)]
    pub no_controls: bool,
}

impl Args {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            mode: self.mode,
            variant: self.background,
            edge_operator: self.edge_operator,
            edge_threshold: self.threshold,
            edge_ratio: DEFAULT_EDGE_RATIO,
            inverse: self.inverse,
            seed: SeedPoint::new(self.seed_x, self.seed_y),
            show_mask: self.show_mask,
            diff_threshold: self.diff_threshold,
            fill_tolerance: self.fill_tolerance,
        }
    }
}
