use thiserror::Error;

/// Errors that can occur during audio capture and storage operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// No candidate sample rate yields a usable device buffer size.
    #[error("unsupported audio hardware")]
    UnsupportedHardware,

    /// The device could not be opened within the retry budget.
    #[error("device initialization failed: {0}")]
    DeviceInitFailed(String),

    /// A read from an open device failed mid-capture.
    #[error("device read failed: {0}")]
    DeviceReadError(String),

    #[error("device not available")]
    DeviceNotAvailable,

    /// An operation was invoked in a state that forbids it.
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

impl From<std::io::Error> for CaptureError {
    fn from(e: std::io::Error) -> Self {
        CaptureError::StorageError(e.to_string())
    }
}
