use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::models::error::CaptureError;
use crate::models::recording_result::{RecordingMetadata, RecordingResult};
use crate::processing::wave_file::WaveFile;
use crate::storage::metadata;

/// Persist a recording as `path` (WAV) plus a JSON metadata sidecar.
///
/// The sidecar records a SHA-256 checksum of the WAV bytes, checked again by
/// `load_recording`.
pub fn save_recording(wave: &WaveFile, path: &Path, reversed: bool) -> Result<RecordingResult, CaptureError> {
    let bytes = wave.encode()?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| CaptureError::StorageError(format!("failed to create directory: {}", e)))?;
        }
    }
    fs::write(path, &bytes).map_err(|e| CaptureError::StorageError(format!("failed to write recording: {}", e)))?;

    let checksum = sha256_hex(&bytes);
    let metadata = RecordingMetadata::new(wave.sample_rate(), wave.num_frames(), reversed, &checksum);
    metadata::write_metadata(&metadata, path)?;

    log::info!(
        "Saved recording {} ({} frames, {:.2}s)",
        path.display(),
        wave.num_frames(),
        metadata.duration_secs
    );

    Ok(RecordingResult {
        file_path: path.to_path_buf(),
        metadata,
    })
}

/// Load a recording, verifying it against its sidecar when present.
pub fn load_recording(path: &Path) -> Result<(WaveFile, Option<RecordingMetadata>), CaptureError> {
    let bytes = fs::read(path).map_err(|e| CaptureError::StorageError(format!("failed to read recording: {}", e)))?;
    let sidecar = metadata::read_metadata(path)?;

    if let Some(ref meta) = sidecar {
        let checksum = sha256_hex(&bytes);
        if checksum != meta.checksum {
            return Err(CaptureError::StorageError(format!(
                "checksum mismatch for {}: expected {}, found {}",
                path.display(),
                meta.checksum,
                checksum
            )));
        }
    } else {
        log::debug!("No metadata sidecar for {}", path.display());
    }

    Ok((WaveFile::decode(&bytes)?, sidecar))
}

/// SHA-256 hex digest.
pub fn sha256_hex(data: &[u8]) -> String {
    Sha256::digest(data).iter().map(|b| format!("{:02x}", b)).collect()
}
