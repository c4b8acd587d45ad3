use std::fs;
use std::path::{Path, PathBuf};

use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingMetadata;

/// Sidecar path for a recording: `clip.wav` → `clip.metadata.json`.
pub fn metadata_path(recording_path: &Path) -> PathBuf {
    recording_path.with_extension("metadata.json")
}

/// Write recording metadata as a JSON sidecar file.
pub fn write_metadata(metadata: &RecordingMetadata, recording_path: &Path) -> Result<(), CaptureError> {
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| CaptureError::StorageError(format!("failed to serialize metadata: {}", e)))?;
    fs::write(metadata_path(recording_path), json)
        .map_err(|e| CaptureError::StorageError(format!("failed to write metadata: {}", e)))?;
    Ok(())
}

/// Read recording metadata from its JSON sidecar, if one exists.
pub fn read_metadata(recording_path: &Path) -> Result<Option<RecordingMetadata>, CaptureError> {
    let path = metadata_path(recording_path);
    if !path.exists() {
        return Ok(None);
    }
    let json = fs::read_to_string(&path)
        .map_err(|e| CaptureError::StorageError(format!("failed to read metadata: {}", e)))?;
    let metadata = serde_json::from_str(&json)
        .map_err(|e| CaptureError::StorageError(format!("failed to parse metadata: {}", e)))?;
    Ok(Some(metadata))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidecar_sits_next_to_recording() {
        assert_eq!(
            metadata_path(Path::new("/tmp/rec/clip.wav")),
            PathBuf::from("/tmp/rec/clip.metadata.json")
        );
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let recording = dir.path().join("clip.wav");
        let metadata = RecordingMetadata::new(16000, 32000, false, "deadbeef");

        write_metadata(&metadata, &recording).unwrap();
        assert_eq!(read_metadata(&recording).unwrap(), Some(metadata));
    }

    #[test]
    fn missing_sidecar_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_metadata(&dir.path().join("clip.wav")).unwrap(), None);
    }

    #[test]
    fn corrupt_sidecar_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let recording = dir.path().join("clip.wav");
        fs::write(metadata_path(&recording), "{not json").unwrap();
        assert!(matches!(read_metadata(&recording), Err(CaptureError::StorageError(_))));
    }
}
