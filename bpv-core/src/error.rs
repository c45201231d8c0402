/// Error taxonomy for the blueprint viewer
use thiserror::Error;

use crate::viewer::LifecycleState;

/// Failure fetching or decoding blueprint metadata. Always recovered by the viewer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("not authorized (status {0})")]
    Unauthorized(u16),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("malformed blueprint payload: {0}")]
    Malformed(String),
}

impl FetchError {
    /// Classify an HTTP status that was not a success.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 | 422 => FetchError::Unauthorized(status),
            other => FetchError::Status(other),
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Malformed(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("invalid hex color {0:?}")]
    InvalidHex(String),
}

/// No drawable target could be created or attached. Fatal for one viewer instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceAcquisitionError {
    #[error("no drawable surface available: {0}")]
    NoSurface(String),
    #[error("failed to attach surface to display: {0}")]
    Attach(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelAttachmentError {
    #[error("label font unavailable: {0}")]
    FontUnavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("unknown view {0:?}, expected one of top, front, right, left")]
    UnknownView(String),
}

/// The host could not schedule another frame callback
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("frame request refused: {0}")]
    Refused(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("draw failed: {0}")]
    Draw(String),
}

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("viewer initialization failed: {0}")]
    Initialization(#[from] ResourceAcquisitionError),
    #[error("operation requires {expected:?} state, viewer is {actual:?}")]
    InvalidState {
        expected: LifecycleState,
        actual: LifecycleState,
    },
    #[error(transparent)]
    View(#[from] ViewError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}
