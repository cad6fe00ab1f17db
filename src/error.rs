use thiserror::Error;

/// Failures surfaced by the segmentation core and its device collaborators.
///
/// An empty capture tick is not represented here: capture sources report it
/// as `Ok(None)` and the frame loop simply skips the tick.
#[derive(Debug, Error)]
pub enum SegError {
    /// The capture or output device could not be opened. Nothing is started.
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    /// A caller broke an input contract (mismatched frame sizes, seed outside
    /// the frame, empty frame). The current call is aborted, state untouched.
    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    /// A processed frame could not be handed to the display device.
    #[error("failed to present frame: {0}")]
    Output(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SegError>;
