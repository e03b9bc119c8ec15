//! Error types for the scanning engine.
//!
//! Fatal scan errors map one-to-one onto the terminal event a scan reports, so a
//! caller that only looks at the `Result` and a caller that only listens to events
//! see the same outcome.

use thiserror::Error;

use crate::scan::ScanEvent;

/// Result type alias using `ScanError`.
pub type Result<T> = std::result::Result<T, ScanError>;

#[derive(Debug, Error)]
pub enum ScanError {
    /// Star or level bounds are inverted or out of range.
    #[error("invalid scan parameters: {0}")]
    InvalidParameters(String),

    /// A scan is already active in this scanner.
    #[error("a scan is already running")]
    AlreadyRunning,

    /// The game window could not be found, activated or driven.
    #[error("failed to address the game window: {0:#}")]
    SwitchSurfaceFailed(anyhow::Error),

    /// No stored layout matches the window resolution or aspect ratio.
    #[error("no layout definition matches {width}x{height}")]
    NoMatchingLayout { width: u32, height: u32 },

    /// The item count indicator did not decode to a number.
    #[error("could not read the artifact count from {text:?}")]
    ArtifactCountUnreadable { text: String },

    /// The scan worker thread panicked or poisoned the shared context.
    #[error("scan worker panicked")]
    WorkerPanicked,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScanError {
    /// The fatal event this error is reported as, if it is one of the scan codes.
    pub fn as_event(&self) -> Option<ScanEvent> {
        match self {
            Self::InvalidParameters(_) => Some(ScanEvent::InvalidParameters),
            Self::SwitchSurfaceFailed(_) => Some(ScanEvent::SwitchSurfaceFailed),
            Self::NoMatchingLayout { .. } => Some(ScanEvent::NoMatchingLayout),
            Self::ArtifactCountUnreadable { .. } => Some(ScanEvent::ArtifactCountUnreadable),
            Self::AlreadyRunning | Self::WorkerPanicked | Self::Io(_) => None,
        }
    }
}
