use std::fs;
use std::path::Path;

use crate::models::config::WavSpec;
use crate::models::error::CaptureError;
use crate::processing::sample_buffer::SampleBuffer;
use crate::processing::wav_format::{self, WAV_HEADER_SIZE};

/// An immutable in-memory WAV recording.
///
/// Only 16-bit mono PCM is written. Decoding trusts the header beyond
/// structural length checks, so files in any other layout load as noise
/// rather than failing.
///
/// ## File Format
/// ```text
/// [44-byte WAV header]
/// [num_frames × i16, little-endian]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveFile {
    spec: WavSpec,
    samples: Vec<i16>,
}

impl WaveFile {
    /// Wrap mono 16-bit samples recorded at `sample_rate`.
    pub fn from_samples(samples: &[i16], sample_rate: u32) -> Self {
        Self {
            spec: WavSpec::mono16(sample_rate),
            samples: samples.to_vec(),
        }
    }

    /// Snapshot the valid region of a sample buffer.
    pub fn from_buffer(buffer: &SampleBuffer, sample_rate: u32) -> Self {
        Self::from_samples(buffer.samples(), sample_rate)
    }

    /// Serialize to a complete WAV byte stream.
    pub fn encode(&self) -> Result<Vec<u8>, CaptureError> {
        let data_size = self
            .samples
            .len()
            .checked_mul(self.spec.block_align() as usize)
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| n.checked_add(WAV_HEADER_SIZE as u32).is_some())
            .ok_or_else(|| {
                CaptureError::EncodingFailed(format!("{} frames do not fit in a WAV file", self.samples.len()))
            })?;

        let header = wav_format::generate_wav_header(&self.spec, data_size)?;
        let mut bytes = Vec::with_capacity(WAV_HEADER_SIZE + data_size as usize);
        bytes.extend_from_slice(&header);
        for sample in &self.samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        Ok(bytes)
    }

    /// Parse a WAV byte stream produced by `encode` (or any 44-byte-header
    /// 16-bit mono PCM file).
    pub fn decode(bytes: &[u8]) -> Result<Self, CaptureError> {
        let header = wav_format::parse_wav_header(bytes)?;
        let block_align = header.spec.block_align();
        if block_align == 0 || block_align > u16::MAX as u32 {
            return Err(CaptureError::EncodingFailed(format!(
                "invalid frame size {} ({} channels, {} bits)",
                block_align, header.spec.channels, header.spec.bit_depth
            )));
        }

        let payload = &bytes[WAV_HEADER_SIZE..];
        let data_size = header.data_size as usize;
        if payload.len() < data_size {
            return Err(CaptureError::EncodingFailed(format!(
                "WAV payload truncated: header declares {} bytes, found {}",
                data_size,
                payload.len()
            )));
        }

        let num_frames = header.num_frames();
        let data = &payload[..data_size];
        if data.len() < num_frames * 2 {
            return Err(CaptureError::EncodingFailed(format!(
                "{} frames need {} bytes, payload has {}",
                num_frames,
                num_frames * 2,
                data.len()
            )));
        }

        let samples = data
            .chunks_exact(2)
            .take(num_frames)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        Ok(Self {
            spec: header.spec,
            samples,
        })
    }

    pub fn write_to_file(&self, path: &Path) -> Result<(), CaptureError> {
        let bytes = self.encode()?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| CaptureError::StorageError(format!("failed to create directory: {}", e)))?;
            }
        }
        fs::write(path, bytes).map_err(|e| CaptureError::StorageError(format!("failed to write WAV file: {}", e)))?;
        log::debug!("Wrote {} frames to {}", self.num_frames(), path.display());
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<Self, CaptureError> {
        let bytes = fs::read(path).map_err(|e| CaptureError::StorageError(format!("failed to read WAV file: {}", e)))?;
        Self::decode(&bytes)
    }

    /// Replace the contents of `buffer` with these samples.
    ///
    /// Resets the buffer cursor first; samples beyond the buffer's capacity
    /// are dropped. Returns the number of samples copied.
    pub fn copy_into(&self, buffer: &mut SampleBuffer) -> usize {
        buffer.reset_cursor();
        let copied = buffer.write(&self.samples);
        if copied < self.samples.len() {
            log::warn!(
                "Buffer holds {} samples, dropped {} from WAV",
                buffer.capacity(),
                self.samples.len() - copied
            );
        }
        copied
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn num_frames(&self) -> usize {
        self.samples.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.spec.sample_rate
    }

    pub fn bit_depth(&self) -> u16 {
        self.spec.bit_depth
    }

    pub fn channels(&self) -> u16 {
        self.spec.channels
    }

    pub fn spec(&self) -> WavSpec {
        self.spec
    }

    pub fn duration_secs(&self) -> f64 {
        if self.spec.sample_rate == 0 {
            return 0.0;
        }
        self.num_frames() as f64 / self.spec.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 16-bit sine wave at full amplitude.
    fn sine_wave(len_s: usize, freq: f64, sample_rate: u32) -> Vec<i16> {
        let num_samples = len_s * sample_rate as usize;
        (0..num_samples)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                (i16::MAX as f64 * (2.0 * std::f64::consts::PI * freq * t).sin()) as i16
            })
            .collect()
    }

    #[test]
    fn reverse_then_encode_scenario() {
        let mut buf = SampleBuffer::new(100);
        buf.write(&[1, 2, 3, 4]);
        assert_eq!(buf.cursor(), 4);
        assert_eq!(buf.remaining(), 96);

        buf.reverse();
        assert_eq!(buf.samples(), &[4, 3, 2, 1]);

        let bytes = WaveFile::from_buffer(&buf, 8000).encode().unwrap();
        assert_eq!(bytes.len(), 44 + 8);
        assert_eq!(u32::from_le_bytes([bytes[40], bytes[41], bytes[42], bytes[43]]), 8);
        assert_eq!(u32::from_le_bytes([bytes[28], bytes[29], bytes[30], bytes[31]]), 16000);
        assert_eq!(u16::from_le_bytes([bytes[32], bytes[33]]), 2);
        assert_eq!(&bytes[44..], &[0x04, 0x00, 0x03, 0x00, 0x02, 0x00, 0x01, 0x00]);

        let wav = WaveFile::decode(&bytes).unwrap();
        assert_eq!(wav.num_frames(), 4);
        assert_eq!(wav.sample_rate(), 8000);
        assert_eq!(wav.samples(), &[4, 3, 2, 1]);
    }

    #[test]
    fn round_trip_common_rates() {
        for rate in [8000, 16000, 22050, 44100] {
            let samples = sine_wave(2, 440.0, rate);
            let bytes = WaveFile::from_samples(&samples, rate).encode().unwrap();
            let wav = WaveFile::decode(&bytes).unwrap();

            assert_eq!(wav.num_frames(), samples.len());
            assert_eq!(wav.sample_rate(), rate);
            assert_eq!(wav.bit_depth(), 16);
            assert_eq!(wav.channels(), 1);
            assert_eq!(wav.samples(), samples.as_slice());
        }
    }

    #[test]
    fn round_trip_prefix_of_longer_array() {
        let samples: Vec<i16> = (0..1000).map(|i| (i * 31 % 65536 - 32768) as i16).collect();
        let wav = WaveFile::from_samples(&samples[..250], 16000);
        let decoded = WaveFile::decode(&wav.encode().unwrap()).unwrap();
        assert_eq!(decoded.samples(), &samples[..250]);
    }

    #[test]
    fn empty_recording_round_trips() {
        let bytes = WaveFile::from_samples(&[], 22050).encode().unwrap();
        assert_eq!(bytes.len(), 44);
        let wav = WaveFile::decode(&bytes).unwrap();
        assert_eq!(wav.num_frames(), 0);
        assert_eq!(wav.sample_rate(), 22050);
    }

    #[test]
    fn decode_rejects_truncated_payload() {
        let bytes = WaveFile::from_samples(&[1, 2, 3], 8000).encode().unwrap();
        let err = WaveFile::decode(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, CaptureError::EncodingFailed(_)));
    }

    #[test]
    fn decode_ignores_trailing_bytes() {
        let mut bytes = WaveFile::from_samples(&[7, -7], 8000).encode().unwrap();
        bytes.extend_from_slice(&[0xFF; 6]);
        let wav = WaveFile::decode(&bytes).unwrap();
        assert_eq!(wav.samples(), &[7, -7]);
    }

    #[test]
    fn decode_rejects_zero_frame_size() {
        let spec = WavSpec {
            sample_rate: 8000,
            bit_depth: 0,
            channels: 0,
        };
        let bytes = wav_format::generate_wav_header(&spec, 0).unwrap();
        assert!(WaveFile::decode(&bytes).is_err());
    }

    #[test]
    fn decode_garbage_channel_count() {
        let mut bytes = WaveFile::from_samples(&[1, 2, 3, 4], 8000).encode().unwrap();
        // 4096 channels make an 8 KiB frame, larger than the whole payload.
        bytes[22..24].copy_from_slice(&0x1000u16.to_le_bytes());
        let wave = WaveFile::decode(&bytes).unwrap();
        assert_eq!(wave.num_frames(), 0);

        // A frame size past the 16-bit block-align field is structural garbage.
        bytes[22..24].copy_from_slice(&u16::MAX.to_le_bytes());
        bytes[34..36].copy_from_slice(&u16::MAX.to_le_bytes());
        assert!(matches!(WaveFile::decode(&bytes), Err(CaptureError::EncodingFailed(_))));
    }

    #[test]
    fn decode_accepts_wide_frames_within_header_limits() {
        let mut bytes = WaveFile::from_samples(&[7; 8], 8000).encode().unwrap();
        // 8 channels of 16 bits: one 16-byte frame in the 16-byte payload.
        bytes[22..24].copy_from_slice(&8u16.to_le_bytes());
        let wave = WaveFile::decode(&bytes).unwrap();
        assert_eq!(wave.channels(), 8);
        assert_eq!(wave.num_frames(), 1);
    }

    #[test]
    fn encode_rejects_unrepresentable_rate() {
        let err = WaveFile::from_samples(&[1, 2], u32::MAX).encode().unwrap_err();
        assert!(matches!(err, CaptureError::EncodingFailed(_)));

        let bytes = WaveFile::from_samples(&[1, 2], 300_000_000).encode().unwrap();
        assert_eq!(WaveFile::decode(&bytes).unwrap().sample_rate(), 300_000_000);
    }

    #[test]
    fn file_round_trip_and_hound_interop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("clip.wav");
        let samples = sine_wave(1, 220.0, 22050);

        WaveFile::from_samples(&samples, 22050).write_to_file(&path).unwrap();

        let wav = WaveFile::from_file(&path).unwrap();
        assert_eq!(wav.samples(), samples.as_slice());
        assert!((wav.duration_secs() - 1.0).abs() < 1e-9);

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 22050);
        assert_eq!(spec.bits_per_sample, 16);
        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn copy_into_clamps_to_buffer() {
        let wav = WaveFile::from_samples(&[1, 2, 3, 4, 5], 8000);

        let mut small = SampleBuffer::new(3);
        small.write(&[9]);
        assert_eq!(wav.copy_into(&mut small), 3);
        assert_eq!(small.samples(), &[1, 2, 3]);

        let mut large = SampleBuffer::new(10);
        assert_eq!(wav.copy_into(&mut large), 5);
        assert_eq!(large.samples(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn missing_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = WaveFile::from_file(&dir.path().join("nope.wav")).unwrap_err();
        assert!(matches!(err, CaptureError::StorageError(_)));
    }
}
