use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::models::error::CaptureError;

/// Fixed-capacity mono 16-bit sample store with a write cursor.
///
/// Only `[0, cursor)` holds valid samples. Samples past the cursor are stale
/// leftovers from earlier recordings and are never exposed.
///
/// Not synchronized. The capture session wraps it in a
/// `parking_lot::Mutex` to share it with its worker thread.
///
/// Overflow behavior: writes past capacity are silently truncated. Use
/// `remaining()` or `is_full()` to detect it.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    storage: Vec<i16>,
    cursor: usize,
}

impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            storage: vec![0; capacity],
            cursor: 0,
        }
    }

    /// Append samples at the cursor.
    ///
    /// Copies `min(remaining, chunk.len())` samples and returns that count.
    pub fn write(&mut self, chunk: &[i16]) -> usize {
        let len = chunk.len().min(self.remaining());
        self.storage[self.cursor..self.cursor + len].copy_from_slice(&chunk[..len]);
        self.cursor += len;
        len
    }

    /// Reverse the valid samples in place. The cursor is unchanged.
    pub fn reverse(&mut self) {
        self.storage[..self.cursor].reverse();
    }

    /// Move the cursor back to the start. Storage is left untouched.
    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    /// The valid samples, `[0, cursor)`.
    pub fn samples(&self) -> &[i16] {
        &self.storage[..self.cursor]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    pub fn remaining(&self) -> usize {
        self.storage.len() - self.cursor
    }

    pub fn is_full(&self) -> bool {
        self.cursor == self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// Persist the valid samples to a private scratch file.
    ///
    /// Layout (big-endian):
    /// ```text
    /// [0-3]  frame count (u32)
    /// [4..]  frame count × i16
    /// ```
    ///
    /// The buffer is not modified, even on failure.
    pub fn save_to_file(&self, path: &Path) -> Result<(), CaptureError> {
        let file = File::create(path)
            .map_err(|e| CaptureError::StorageError(format!("failed to create scratch file: {}", e)))?;
        let mut writer = BufWriter::new(file);

        writer
            .write_all(&(self.cursor as u32).to_be_bytes())
            .map_err(|e| CaptureError::StorageError(format!("write failed: {}", e)))?;
        for sample in self.samples() {
            writer
                .write_all(&sample.to_be_bytes())
                .map_err(|e| CaptureError::StorageError(format!("write failed: {}", e)))?;
        }
        writer
            .flush()
            .map_err(|e| CaptureError::StorageError(format!("flush failed: {}", e)))?;

        log::debug!("Saved {} samples to {}", self.cursor, path.display());
        Ok(())
    }

    /// Restore samples from a scratch file written by `save_to_file`.
    ///
    /// If the file holds more samples than this buffer can, only the first
    /// `capacity` samples are loaded and the cursor ends at capacity.
    pub fn load_from_file(&mut self, path: &Path) -> Result<(), CaptureError> {
        let file = File::open(path)
            .map_err(|e| CaptureError::StorageError(format!("failed to open scratch file: {}", e)))?;
        let mut reader = BufReader::new(file);

        let mut count = [0u8; 4];
        reader
            .read_exact(&mut count)
            .map_err(|e| CaptureError::StorageError(format!("failed to read frame count: {}", e)))?;
        let stored = u32::from_be_bytes(count) as usize;

        let to_load = stored.min(self.capacity());
        if to_load < stored {
            log::warn!(
                "Scratch file holds {} samples, loading first {} (buffer capacity)",
                stored,
                to_load
            );
        }

        let mut bytes = vec![0u8; to_load * 2];
        reader
            .read_exact(&mut bytes)
            .map_err(|e| CaptureError::StorageError(format!("scratch file truncated: {}", e)))?;

        for (dst, pair) in self.storage.iter_mut().zip(bytes.chunks_exact(2)) {
            *dst = i16::from_be_bytes([pair[0], pair[1]]);
        }
        self.cursor = to_load;

        log::debug!("Loaded {} samples from {}", to_load, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_BUFFER_SIZE: usize = 100;

    #[test]
    fn new_buffer_is_empty() {
        let buf = SampleBuffer::new(TEST_BUFFER_SIZE);
        assert_eq!(buf.cursor(), 0);
        assert_eq!(buf.capacity(), TEST_BUFFER_SIZE);
        assert_eq!(buf.remaining(), TEST_BUFFER_SIZE);
        assert!(!buf.is_full());
        assert!(buf.samples().is_empty());
    }

    #[test]
    fn write_advances_cursor() {
        let mut buf = SampleBuffer::new(TEST_BUFFER_SIZE);
        assert_eq!(buf.write(&[1]), 1);
        assert_eq!(buf.cursor(), 1);
        assert_eq!(buf.remaining(), TEST_BUFFER_SIZE - 1);
    }

    #[test]
    fn overflow_is_truncated() {
        let mut buf = SampleBuffer::new(4);
        assert_eq!(buf.write(&[1, 2, 3]), 3);
        assert_eq!(buf.write(&[4, 5, 6]), 1);

        assert!(buf.is_full());
        assert_eq!(buf.remaining(), 0);
        assert_eq!(buf.samples(), &[1, 2, 3, 4]);

        // Further writes are dropped entirely.
        assert_eq!(buf.write(&[7]), 0);
        assert_eq!(buf.samples(), &[1, 2, 3, 4]);
    }

    #[test]
    fn cursor_never_exceeds_capacity() {
        for capacity in [0usize, 1, 7, 64, 257] {
            let mut buf = SampleBuffer::new(capacity);
            let mut total = 0usize;
            for len in [0usize, 1, 3, 50, 13, 200, 5] {
                let chunk: Vec<i16> = (0..len as i16).collect();
                buf.write(&chunk);
                total += len;

                assert!(buf.cursor() <= capacity);
                assert_eq!(buf.cursor(), capacity.min(total));
                assert_eq!(buf.remaining(), capacity - buf.cursor());
            }
        }
    }

    #[test]
    fn reverse_swaps_valid_region_only() {
        let mut buf = SampleBuffer::new(8);
        buf.write(&[9, 9, 9, 9, 9, 9]);
        buf.reset_cursor();
        buf.write(&[1, 2, 3]);

        buf.reverse();
        assert_eq!(buf.samples(), &[3, 2, 1]);
        assert_eq!(buf.cursor(), 3);

        // Stale tail past the cursor is untouched.
        assert_eq!(&buf.storage[..6], &[3, 2, 1, 9, 9, 9]);
    }

    #[test]
    fn reverse_twice_restores_original() {
        for n in [0usize, 1, 2, 5, 64] {
            let mut buf = SampleBuffer::new(64);
            let original: Vec<i16> = (0..n as i16).map(|i| i * 37 - 500).collect();
            buf.write(&original);

            buf.reverse();
            buf.reverse();
            assert_eq!(buf.samples(), original.as_slice());
        }
    }

    #[test]
    fn reset_keeps_storage() {
        let mut buf = SampleBuffer::new(4);
        buf.write(&[5, 6, 7, 8]);
        buf.reset_cursor();

        assert_eq!(buf.cursor(), 0);
        assert_eq!(buf.remaining(), 4);
        assert!(buf.samples().is_empty());
        assert_eq!(buf.storage, vec![5, 6, 7, 8]);
    }

    #[test]
    fn scratch_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scratch.buf");

        let mut buf = SampleBuffer::new(16);
        buf.write(&[i16::MIN, -1, 0, 1, i16::MAX]);
        buf.save_to_file(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 4 + 5 * 2);
        assert_eq!(&bytes[0..4], &[0, 0, 0, 5]);
        assert_eq!(&bytes[4..6], &[0x80, 0x00]);

        let mut restored = SampleBuffer::new(16);
        restored.load_from_file(&path).unwrap();
        assert_eq!(restored.samples(), &[i16::MIN, -1, 0, 1, i16::MAX]);
    }

    #[test]
    fn load_clamps_to_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.buf");

        let mut big = SampleBuffer::new(50);
        let samples: Vec<i16> = (0..50).collect();
        big.write(&samples);
        big.save_to_file(&path).unwrap();

        let mut small = SampleBuffer::new(20);
        small.load_from_file(&path).unwrap();
        assert_eq!(small.cursor(), 20);
        assert!(small.is_full());
        assert_eq!(small.samples(), &samples[..20]);
    }

    #[test]
    fn load_missing_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut buf = SampleBuffer::new(4);
        buf.write(&[1, 2]);

        let err = buf.load_from_file(&dir.path().join("missing.buf")).unwrap_err();
        assert!(matches!(err, CaptureError::StorageError(_)));
        assert_eq!(buf.samples(), &[1, 2]);
    }

    #[test]
    fn load_truncated_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.buf");
        // Claims 3 samples but carries only one.
        std::fs::write(&path, [0, 0, 0, 3, 0, 1]).unwrap();

        let mut buf = SampleBuffer::new(8);
        let err = buf.load_from_file(&path).unwrap_err();
        assert!(matches!(err, CaptureError::StorageError(_)));
        assert!(buf.cursor() <= buf.capacity());
    }
}
