//! # yakbox-cpal
//!
//! Cross-platform capture backend for yakbox, built on cpal.
//!
//! Provides:
//! - `CpalCaptureProvider` : opens the default (or a named) input device as
//!   a mono 16-bit stream for `DeviceArbiter`
//! - `DeviceEnumerator` : lists input devices on the default host
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use yakbox_core::{CaptureSession, DeviceArbiter};
//! use yakbox_cpal::CpalCaptureProvider;
//!
//! let arbiter = Arc::new(DeviceArbiter::new(CpalCaptureProvider::default_device()));
//! let mut session = CaptureSession::new(arbiter, 10)?;
//! let outcome = session.start()?.wait()?;
//! ```

pub mod cpal_capture;
pub mod device_enumerator;

pub use cpal_capture::{CpalCaptureDevice, CpalCaptureProvider};
pub use device_enumerator::DeviceEnumerator;
