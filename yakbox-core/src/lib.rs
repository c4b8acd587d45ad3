//! # yakbox-core
//!
//! Platform-agnostic voice capture core library.
//!
//! Provides exclusive access to a single capture device, a bounded sample
//! buffer, a background capture session, and WAV I/O. Platform-specific
//! backends implement the `CaptureProvider` trait and plug into the generic
//! `DeviceArbiter`.
//!
//! ## Architecture
//!
//! ```text
//! yakbox-core (this crate)
//! ├── traits/       ← CaptureProvider, CaptureDevice, CaptureListener
//! ├── models/       ← CaptureError, ArbiterState, RecorderConfig, CaptureOutcome, etc.
//! ├── processing/   ← SampleBuffer, RingBuffer, WAV header + WaveFile, PCM helpers
//! ├── session/      ← DeviceArbiter, CaptureSession
//! └── storage/      ← recording + metadata sidecar persistence
//! ```
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use yakbox_core::{CaptureSession, DeviceArbiter, WaveFile};
//!
//! let arbiter = Arc::new(DeviceArbiter::new(provider));
//! let mut session = CaptureSession::new(Arc::clone(&arbiter), 10)?;
//! let outcome = session.start()?.wait()?;
//! let wav = session.with_buffer(|buf| WaveFile::from_buffer(buf, session.sample_rate()));
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{DeviceInfo, InputSource};
pub use models::config::{RecorderConfig, WavSpec};
pub use models::error::CaptureError;
pub use models::recording_result::{CaptureOutcome, RecordingMetadata, RecordingResult, StopReason};
pub use models::state::ArbiterState;
pub use processing::ring_buffer::RingBuffer;
pub use processing::sample_buffer::SampleBuffer;
pub use processing::wave_file::WaveFile;
pub use session::arbiter::DeviceArbiter;
pub use session::capture::{CaptureCompletion, CaptureSession, StopHandle};
pub use storage::recording_store::{load_recording, save_recording};
pub use traits::capture_delegate::CaptureListener;
pub use traits::capture_provider::{CaptureDevice, CaptureProvider};
