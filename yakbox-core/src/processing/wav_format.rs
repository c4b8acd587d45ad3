//! WAV header encoding and decoding.
//!
//! Only the minimal 44-byte RIFF layout with a single `fmt ` + `data` chunk
//! pair is supported.

use crate::models::config::WavSpec;
use crate::models::error::CaptureError;

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// PCM format code stored at offset 20.
pub const FORMAT_PCM: u16 = 1;

/// Fields recovered from a WAV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub format: u16,
    pub spec: WavSpec,
    /// Payload size in bytes.
    pub data_size: u32,
}

impl WavHeader {
    /// Frames in the payload (`data_size / block_align`).
    pub fn num_frames(&self) -> usize {
        let block_align = self.spec.block_align() as usize;
        if block_align == 0 {
            return 0;
        }
        self.data_size as usize / block_align
    }
}

/// Generate a 44-byte WAV RIFF header.
///
/// Format: PCM (format code 1), little-endian.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    file size - 8 (36 + data_size)
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * channels * bit_depth / 8
/// [32-33]  block_align = channels * bit_depth / 8
/// [34-35]  bit_depth
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
///
/// Fails with `EncodingFailed` if a derived field or the RIFF size does not
/// fit its slot.
pub fn generate_wav_header(spec: &WavSpec, data_size: u32) -> Result<[u8; WAV_HEADER_SIZE], CaptureError> {
    let chunk_size = data_size
        .checked_add(WAV_HEADER_SIZE as u32 - 8)
        .ok_or_else(|| CaptureError::EncodingFailed(format!("{} data bytes overflow the RIFF size", data_size)))?;
    let byte_rate = spec.byte_rate().ok_or_else(|| {
        CaptureError::EncodingFailed(format!("byte rate overflows at {} Hz", spec.sample_rate))
    })?;
    let block_align = u16::try_from(spec.block_align()).map_err(|_| {
        CaptureError::EncodingFailed(format!(
            "frame size of {} channels at {} bits does not fit a WAV header",
            spec.channels, spec.bit_depth
        ))
    })?;

    let mut header = [0u8; WAV_HEADER_SIZE];

    // RIFF chunk descriptor
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    // fmt sub-chunk
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&FORMAT_PCM.to_le_bytes());
    header[22..24].copy_from_slice(&spec.channels.to_le_bytes());
    header[24..28].copy_from_slice(&spec.sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&spec.bit_depth.to_le_bytes());

    // data sub-chunk
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    Ok(header)
}

/// Parse the fixed 44-byte header at the start of `bytes`.
///
/// Tag bytes and the redundant byte-rate / block-align fields are skipped,
/// not validated.
pub fn parse_wav_header(bytes: &[u8]) -> Result<WavHeader, CaptureError> {
    if bytes.len() < WAV_HEADER_SIZE {
        return Err(CaptureError::EncodingFailed(format!(
            "WAV header needs {} bytes, got {}",
            WAV_HEADER_SIZE,
            bytes.len()
        )));
    }

    let u16_at = |i: usize| u16::from_le_bytes([bytes[i], bytes[i + 1]]);
    let u32_at = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);

    Ok(WavHeader {
        format: u16_at(20),
        spec: WavSpec {
            channels: u16_at(22),
            sample_rate: u32_at(24),
            bit_depth: u16_at(34),
        },
        data_size: u32_at(40),
    })
}
