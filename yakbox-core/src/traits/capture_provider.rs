use crate::models::audio_models::InputSource;
use crate::models::error::CaptureError;

/// Platform-specific factory for the physical capture device.
///
/// Implemented by:
/// - `CpalCaptureProvider` (yakbox-cpal)
///
/// Only the `DeviceArbiter` calls into a provider, always while holding its
/// serialization lock, so implementations need no internal locking.
pub trait CaptureProvider: Send {
    type Device: CaptureDevice;

    /// Minimum device buffer size, in samples, for mono 16-bit capture at
    /// `sample_rate`. `None` if the rate is not supported.
    fn min_buffer_size(&self, sample_rate: u32) -> Option<usize>;

    /// Open the input device at `sample_rate` with room for `buffer_size`
    /// samples. Failures here are considered transient and retried.
    fn open(&mut self, sample_rate: u32, buffer_size: usize) -> Result<Self::Device, CaptureError>;

    /// Information about the input device backing this provider.
    fn device_info(&self) -> InputSource;
}

/// An open mono 16-bit input stream.
///
/// All calls are blocking.
pub trait CaptureDevice: Send {
    fn start(&mut self) -> Result<(), CaptureError>;

    fn stop(&mut self) -> Result<(), CaptureError>;

    /// Read up to `dest.len()` samples, blocking until they are available or
    /// the stream stops. Returns the number of samples written to `dest`.
    fn read(&mut self, dest: &mut [i16]) -> Result<usize, CaptureError>;

    /// Release the underlying hardware. The device is not used afterwards.
    fn release(&mut self);
}
