use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Candidate capture rates, tried in order during device acquisition.
pub const DEFAULT_CANDIDATE_RATES: [u32; 5] = [44100, 22050, 16000, 11025, 8000];

/// Samples pulled from the device per worker iteration.
pub const DEFAULT_CHUNK_SIZE: usize = 256;

/// Configuration for device acquisition and capture sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Maximum recording length in seconds. Sizes the capture buffer.
    pub max_record_seconds: u32,

    /// Samples read from the device per worker iteration (default: 256).
    ///
    /// Small values keep stop latency low since the worker polls its stop
    /// flag once per chunk.
    pub chunk_size: usize,

    /// Sample rates to try, highest preference first.
    pub candidate_rates: Vec<u32>,

    /// Number of attempts to open the device before giving up (default: 3).
    pub init_attempts: u32,

    /// Delay between failed open attempts.
    #[serde(with = "duration_millis")]
    pub init_retry_delay: Duration,
}

impl RecorderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_record_seconds == 0 {
            return Err("max record time must be positive".into());
        }
        if self.chunk_size == 0 {
            return Err("chunk size must be positive".into());
        }
        if self.candidate_rates.is_empty() {
            return Err("at least one candidate sample rate is required".into());
        }
        if self.candidate_rates.contains(&0) {
            return Err("candidate sample rates must be positive".into());
        }
        if self.init_attempts == 0 {
            return Err("at least one init attempt is required".into());
        }
        Ok(())
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            max_record_seconds: 10,
            chunk_size: DEFAULT_CHUNK_SIZE,
            candidate_rates: DEFAULT_CANDIDATE_RATES.to_vec(),
            init_attempts: 3,
            init_retry_delay: Duration::from_millis(20),
        }
    }
}

/// Format parameters for a WAV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    pub sample_rate: u32,
    pub bit_depth: u16,
    pub channels: u16,
}

impl WavSpec {
    /// 16-bit mono PCM at the given rate, the only layout the codec writes.
    pub fn mono16(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            bit_depth: 16,
            channels: 1,
        }
    }

    /// Bytes per frame (`channels * bit_depth / 8`).
    ///
    /// May exceed `u16::MAX` for headers read from disk.
    pub fn block_align(&self) -> u32 {
        self.channels as u32 * self.bit_depth as u32 / 8
    }

    /// Bytes per second, or `None` if it does not fit the 32-bit header field.
    pub fn byte_rate(&self) -> Option<u32> {
        self.sample_rate.checked_mul(self.block_align())
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
