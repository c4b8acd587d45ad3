use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::error::CaptureError;

/// Why a capture worker stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The caller stopped the session.
    Stopped,
    /// The sample buffer reached capacity.
    BufferFull,
    /// The device returned fewer samples than requested.
    ShortRead,
    /// A device read failed. Samples captured before the failure are kept.
    DeviceError(CaptureError),
}

impl StopReason {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::DeviceError(_))
    }
}

/// Delivered exactly once when a capture worker exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOutcome {
    pub reason: StopReason,
    /// Valid samples in the session buffer when the worker exited.
    pub samples_captured: usize,
    pub sample_rate: u32,
}

impl CaptureOutcome {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples_captured as f64 / self.sample_rate as f64
    }
}

/// Result returned when a recording is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub file_path: PathBuf,
    pub metadata: RecordingMetadata,
}

/// Metadata stored as a JSON sidecar next to a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub created_at: String,
    pub sample_rate: u32,
    pub num_frames: usize,
    pub duration_secs: f64,
    pub reversed: bool,
    pub checksum: String,
}

impl RecordingMetadata {
    pub fn new(sample_rate: u32, num_frames: usize, reversed: bool, checksum: &str) -> Self {
        let duration_secs = if sample_rate == 0 {
            0.0
        } else {
            num_frames as f64 / sample_rate as f64
        };
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            sample_rate,
            num_frames,
            duration_secs,
            reversed,
            checksum: checksum.to_string(),
        }
    }
}
