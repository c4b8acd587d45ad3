use std::thread;

use parking_lot::FairMutex;

use crate::models::audio_models::{DeviceInfo, InputSource};
use crate::models::config::RecorderConfig;
use crate::models::error::CaptureError;
use crate::models::state::ArbiterState;
use crate::traits::capture_provider::{CaptureDevice, CaptureProvider};

/// The open device plus what was negotiated when it was opened.
struct DeviceHandle<D> {
    device: D,
    info: DeviceInfo,
}

/// State protected by the arbiter lock.
struct ArbiterInner<P: CaptureProvider> {
    provider: P,
    handle: Option<DeviceHandle<P::Device>>,
    state: ArbiterState,
}

/// Serializes every call to the single physical capture device.
///
/// All device operations from any thread go through one fair mutex, so no
/// two calls ever reach the hardware concurrently, and a `release` on one
/// thread cannot interleave with a `start_recording` on another. Calls are
/// served in arrival order.
///
/// Construct one per process and share it as `Arc<DeviceArbiter<P>>`.
pub struct DeviceArbiter<P: CaptureProvider> {
    inner: FairMutex<ArbiterInner<P>>,
    config: RecorderConfig,
}

impl<P: CaptureProvider> DeviceArbiter<P> {
    pub fn new(provider: P) -> Self {
        Self {
            inner: FairMutex::new(ArbiterInner {
                provider,
                handle: None,
                state: ArbiterState::Uninitialized,
            }),
            config: RecorderConfig::default(),
        }
    }

    pub fn with_config(provider: P, config: RecorderConfig) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::ConfigurationFailed)?;
        let mut arbiter = Self::new(provider);
        arbiter.config = config;
        Ok(arbiter)
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn state(&self) -> ArbiterState {
        self.inner.lock().state
    }

    /// Rate of the held device, if any.
    pub fn sample_rate(&self) -> Option<u32> {
        self.device_info().map(|info| info.sample_rate)
    }

    pub fn device_info(&self) -> Option<DeviceInfo> {
        self.inner.lock().handle.as_ref().map(|h| h.info)
    }

    pub fn input_source(&self) -> InputSource {
        self.inner.lock().provider.device_info()
    }

    /// Open the device, retrying transient failures.
    ///
    /// Each attempt picks the first candidate rate the provider reports a
    /// buffer size for, then opens the device at that rate. A failed open
    /// is retried after `init_retry_delay`, up to `init_attempts` times.
    ///
    /// If a device is already held it is kept; only `capacity_samples` is
    /// recomputed for the new `max_record_seconds`.
    /// On failure the arbiter is left `Uninitialized`.
    pub fn acquire(&self, max_record_seconds: u32) -> Result<DeviceInfo, CaptureError> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        if let Some(handle) = &inner.handle {
            log::debug!("Device already acquired at {} Hz", handle.info.sample_rate);
            return Ok(DeviceInfo {
                capacity_samples: capacity_for(handle.info.sample_rate, max_record_seconds),
                ..handle.info
            });
        }

        let attempts = self.config.init_attempts;
        let mut last_error = None;

        for attempt in 1..=attempts {
            let Some((sample_rate, buffer_size)) = self.find_sample_rate(&inner.provider) else {
                inner.state = ArbiterState::Uninitialized;
                log::error!("No supported capture sample rate in {:?}", self.config.candidate_rates);
                return Err(CaptureError::UnsupportedHardware);
            };

            log::debug!("Opening capture device at {} Hz (attempt {}/{})", sample_rate, attempt, attempts);
            match inner.provider.open(sample_rate, buffer_size) {
                Ok(device) => {
                    let info = DeviceInfo {
                        sample_rate,
                        buffer_size,
                        capacity_samples: capacity_for(sample_rate, max_record_seconds),
                    };
                    inner.handle = Some(DeviceHandle { device, info });
                    inner.state = ArbiterState::Ready;
                    log::info!("Capture device initialised. Sample rate: {} Hz", sample_rate);
                    return Ok(info);
                }
                Err(e) => {
                    log::warn!("Capture device open failed (attempt {}/{}): {}", attempt, attempts, e);
                    last_error = Some(e);
                    if attempt < attempts {
                        thread::sleep(self.config.init_retry_delay);
                    }
                }
            }
        }

        inner.state = ArbiterState::Uninitialized;
        Err(CaptureError::DeviceInitFailed(format!(
            "gave up after {} attempts: {}",
            attempts,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    /// Start the held device. Fails if no device is held or it is already
    /// recording.
    pub fn start_recording(&self) -> Result<(), CaptureError> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        match inner.state {
            ArbiterState::Ready => {}
            ArbiterState::Recording => {
                return Err(CaptureError::InvalidState("device is already recording".into()));
            }
            other => {
                return Err(CaptureError::InvalidState(format!("cannot start recording when {:?}", other)));
            }
        }

        let handle = inner
            .handle
            .as_mut()
            .ok_or_else(|| CaptureError::InvalidState("no device handle".into()))?;
        handle.device.start()?;
        inner.state = ArbiterState::Recording;
        log::debug!("Device recording");
        Ok(())
    }

    /// Stop the held device. A no-op if it is not recording.
    pub fn stop_recording(&self) -> Result<(), CaptureError> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        match inner.state {
            ArbiterState::Recording => {}
            ArbiterState::Ready => return Ok(()),
            other => {
                return Err(CaptureError::InvalidState(format!("cannot stop recording when {:?}", other)));
            }
        }

        let handle = inner
            .handle
            .as_mut()
            .ok_or_else(|| CaptureError::InvalidState("no device handle".into()))?;
        // The device is considered stopped even if the driver complains.
        inner.state = ArbiterState::Ready;
        handle.device.stop()?;
        log::debug!("Device stopped");
        Ok(())
    }

    /// Read up to `max_samples` samples into `destination[offset..]`.
    ///
    /// The range is clamped to the destination slice. Returns the number of
    /// samples read; device failures are reported as `DeviceReadError`.
    pub fn read(&self, destination: &mut [i16], offset: usize, max_samples: usize) -> Result<usize, CaptureError> {
        let mut guard = self.inner.lock();
        let handle = guard
            .handle
            .as_mut()
            .ok_or_else(|| CaptureError::InvalidState("read before acquire".into()))?;

        let start = offset.min(destination.len());
        let end = start.saturating_add(max_samples).min(destination.len());
        handle.device.read(&mut destination[start..end]).map_err(|e| match e {
            CaptureError::DeviceReadError(_) => e,
            other => CaptureError::DeviceReadError(other.to_string()),
        })
    }

    /// Stop the device if recording and release it.
    ///
    /// A later `acquire` is required before reuse. Calling this again has no
    /// further effect.
    pub fn release(&self) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let Some(mut handle) = inner.handle.take() else {
            log::debug!("Release with no device held");
            return;
        };

        if inner.state.is_recording() {
            if let Err(e) = handle.device.stop() {
                log::warn!("Failed to stop device during release: {}", e);
            }
        }
        handle.device.release();
        inner.state = ArbiterState::Released;
        log::info!("Capture device released");
    }

    /// First candidate rate with a positive minimum buffer size.
    fn find_sample_rate(&self, provider: &P) -> Option<(u32, usize)> {
        self.config.candidate_rates.iter().find_map(|&rate| {
            provider
                .min_buffer_size(rate)
                .filter(|&size| size > 0)
                .map(|size| {
                    log::debug!("Supported sample rate found: {}", rate);
                    (rate, size)
                })
        })
    }
}

impl<P: CaptureProvider> Drop for DeviceArbiter<P> {
    fn drop(&mut self) {
        self.release();
    }
}

fn capacity_for(sample_rate: u32, max_record_seconds: u32) -> usize {
    sample_rate as usize * max_record_seconds as usize
}
