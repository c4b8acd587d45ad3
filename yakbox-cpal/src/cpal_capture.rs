//! cpal input capture provider.
//!
//! cpal delivers audio through a callback on a host-owned thread, and its
//! `Stream` handle cannot cross threads. The device therefore owns a
//! dedicated "cpal-capture" thread that builds and plays the stream, while
//! the callback downmixes each period to mono 16-bit and pushes it into a
//! shared ring. `read` blocks on a condvar until enough samples arrive.
//!
//! ```text
//! [cpal callback] → downmix → [RingBuffer] → read() → [DeviceArbiter]
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{BufferSize, SampleFormat, SampleRate, StreamConfig, SupportedBufferSize};
use parking_lot::{Condvar, Mutex};

use yakbox_core::models::audio_models::InputSource;
use yakbox_core::models::error::CaptureError;
use yakbox_core::processing::pcm;
use yakbox_core::processing::ring_buffer::RingBuffer;
use yakbox_core::traits::capture_provider::{CaptureDevice, CaptureProvider};

use crate::device_enumerator::DeviceEnumerator;

/// Buffer size assumed when the host does not report one, in frames.
const FALLBACK_BUFFER_FRAMES: usize = 1024;

/// Ring size as a multiple of the device buffer.
const RING_PERIODS: usize = 8;

/// How often a blocked `read` re-checks for stop and stream errors.
const READ_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A `read` that sees no progress for this long fails the stream.
const READ_STALL_TIMEOUT: Duration = Duration::from_secs(2);

/// One supported input configuration, reduced to what rate negotiation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StreamCandidate {
    channels: u16,
    min_rate: u32,
    max_rate: u32,
    format: SampleFormat,
    min_buffer_frames: Option<u32>,
}

impl StreamCandidate {
    fn from_range(range: &cpal::SupportedStreamConfigRange) -> Self {
        let min_buffer_frames = match range.buffer_size() {
            SupportedBufferSize::Range { min, .. } => Some(*min),
            SupportedBufferSize::Unknown => None,
        };
        Self {
            channels: range.channels(),
            min_rate: range.min_sample_rate().0,
            max_rate: range.max_sample_rate().0,
            format: range.sample_format(),
            min_buffer_frames,
        }
    }

    fn supports(&self, sample_rate: u32) -> bool {
        self.channels > 0
            && (self.min_rate..=self.max_rate).contains(&sample_rate)
            && matches!(self.format, SampleFormat::I16 | SampleFormat::F32)
    }

    /// Minimum buffer in mono samples. One frame downmixes to one sample.
    fn buffer_size(&self) -> usize {
        self.min_buffer_frames
            .filter(|&frames| frames > 0)
            .map(|frames| frames as usize)
            .unwrap_or(FALLBACK_BUFFER_FRAMES)
    }

    fn stream_config(&self, sample_rate: u32) -> StreamConfig {
        StreamConfig {
            channels: self.channels,
            sample_rate: SampleRate(sample_rate),
            buffer_size: BufferSize::Default,
        }
    }
}

/// Pick the stream for `sample_rate`, preferring fewer channels and native i16.
fn pick_candidate(candidates: &[StreamCandidate], sample_rate: u32) -> Option<StreamCandidate> {
    candidates
        .iter()
        .filter(|c| c.supports(sample_rate))
        .min_by_key(|c| (c.channels, c.format != SampleFormat::I16))
        .copied()
}

/// Capture provider backed by a cpal input device.
///
/// Devices are looked up by name on every call, so a provider created for
/// an unplugged device simply reports every rate as unsupported.
pub struct CpalCaptureProvider {
    device_name: Option<String>,
}

impl CpalCaptureProvider {
    /// Provider for the host's default input device.
    pub fn default_device() -> Self {
        Self { device_name: None }
    }

    /// Provider for the input device with the given name.
    pub fn with_device(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
        }
    }

    fn negotiate(&self, sample_rate: u32) -> Option<StreamCandidate> {
        let device = DeviceEnumerator::new().find_input_device(self.device_name.as_deref())?;
        let ranges = match device.supported_input_configs() {
            Ok(ranges) => ranges,
            Err(e) => {
                log::debug!("Failed to query input configs: {}", e);
                return None;
            }
        };
        let candidates: Vec<StreamCandidate> = ranges.map(|r| StreamCandidate::from_range(&r)).collect();
        pick_candidate(&candidates, sample_rate)
    }
}

impl CaptureProvider for CpalCaptureProvider {
    type Device = CpalCaptureDevice;

    fn min_buffer_size(&self, sample_rate: u32) -> Option<usize> {
        self.negotiate(sample_rate).map(|c| c.buffer_size())
    }

    fn open(&mut self, sample_rate: u32, buffer_size: usize) -> Result<CpalCaptureDevice, CaptureError> {
        let candidate = self
            .negotiate(sample_rate)
            .ok_or_else(|| CaptureError::DeviceInitFailed(format!("no input stream available at {} Hz", sample_rate)))?;

        log::debug!(
            "Opening input: {} Hz, {} channel(s), {:?}",
            sample_rate,
            candidate.channels,
            candidate.format
        );

        let ring_capacity = (buffer_size * RING_PERIODS).max(sample_rate as usize);
        Ok(CpalCaptureDevice::new(
            self.device_name.clone(),
            candidate.stream_config(sample_rate),
            candidate.format,
            ring_capacity,
        ))
    }

    fn device_info(&self) -> InputSource {
        match self.device_name {
            Some(ref name) => InputSource {
                name: name.clone(),
                is_default: false,
            },
            None => InputSource {
                name: DeviceEnumerator::new()
                    .default_input_device_name()
                    .unwrap_or_else(|| "Default Input".into()),
                is_default: true,
            },
        }
    }
}

/// State shared between the stream callback and the reading thread.
struct SharedCapture {
    ring: Mutex<RingBuffer>,
    available: Condvar,
    running: AtomicBool,
    error: Mutex<Option<String>>,
}

impl SharedCapture {
    fn new(capacity: usize) -> Self {
        Self {
            ring: Mutex::new(RingBuffer::new(capacity)),
            available: Condvar::new(),
            running: AtomicBool::new(false),
            error: Mutex::new(None),
        }
    }

    fn push(&self, samples: &[i16]) {
        let dropped = self.ring.lock().write(samples);
        if dropped > 0 {
            log::trace!("Capture ring overflow, dropped {} samples", dropped);
        }
        self.available.notify_one();
    }

    fn fail(&self, message: String) {
        *self.error.lock() = Some(message);
        self.available.notify_all();
    }

    fn reset(&self) {
        self.ring.lock().reset();
        *self.error.lock() = None;
    }
}

struct StreamThread {
    stop_tx: mpsc::Sender<()>,
    handle: thread::JoinHandle<()>,
}

/// An open cpal input stream delivering mono 16-bit samples.
pub struct CpalCaptureDevice {
    device_name: Option<String>,
    config: StreamConfig,
    sample_format: SampleFormat,
    shared: Arc<SharedCapture>,
    stream: Option<StreamThread>,
}

impl CpalCaptureDevice {
    fn new(device_name: Option<String>, config: StreamConfig, sample_format: SampleFormat, ring_capacity: usize) -> Self {
        Self {
            device_name,
            config,
            sample_format,
            shared: Arc::new(SharedCapture::new(ring_capacity)),
            stream: None,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }
}

impl CaptureDevice for CpalCaptureDevice {
    fn start(&mut self) -> Result<(), CaptureError> {
        if self.stream.is_some() {
            return Ok(());
        }

        self.shared.reset();
        self.shared.running.store(true, Ordering::SeqCst);

        let (ready_tx, ready_rx) = mpsc::channel();
        let (stop_tx, stop_rx) = mpsc::channel();
        let device_name = self.device_name.clone();
        let config = self.config.clone();
        let format = self.sample_format;
        let shared = Arc::clone(&self.shared);

        let spawned = thread::Builder::new()
            .name("cpal-capture".into())
            .spawn(move || run_stream(device_name, config, format, shared, ready_tx, stop_rx));

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.shared.running.store(false, Ordering::SeqCst);
                return Err(CaptureError::DeviceInitFailed(format!(
                    "failed to spawn capture thread: {}",
                    e
                )));
            }
        };

        let ready = ready_rx
            .recv()
            .unwrap_or_else(|_| Err(CaptureError::DeviceInitFailed("capture thread exited during start".into())));

        match ready {
            Ok(()) => {
                log::info!("Input stream started at {} Hz", self.sample_rate());
                self.stream = Some(StreamThread { stop_tx, handle });
                Ok(())
            }
            Err(e) => {
                self.shared.running.store(false, Ordering::SeqCst);
                let _ = handle.join();
                Err(e)
            }
        }
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        self.shared.running.store(false, Ordering::SeqCst);
        self.shared.available.notify_all();

        if let Some(stream) = self.stream.take() {
            let _ = stream.stop_tx.send(());
            stream
                .handle
                .join()
                .map_err(|_| CaptureError::DeviceReadError("capture thread panicked".into()))?;
            log::info!("Input stream stopped");
        }
        Ok(())
    }

    fn read(&mut self, dest: &mut [i16]) -> Result<usize, CaptureError> {
        if dest.is_empty() {
            return Ok(0);
        }

        let mut deadline = Instant::now() + READ_STALL_TIMEOUT;
        let mut ring = self.shared.ring.lock();
        let mut seen = ring.count();

        loop {
            if let Some(message) = self.shared.error.lock().take() {
                return Err(CaptureError::DeviceReadError(message));
            }
            // Once stopped, whatever is buffered is returned as a short read.
            if ring.count() >= dest.len() || !self.shared.running.load(Ordering::SeqCst) {
                break;
            }
            if ring.count() > seen {
                seen = ring.count();
                deadline = Instant::now() + READ_STALL_TIMEOUT;
            } else if Instant::now() >= deadline {
                return Err(CaptureError::DeviceReadError(format!(
                    "input stream stalled for {:?}",
                    READ_STALL_TIMEOUT
                )));
            }
            self.shared.available.wait_for(&mut ring, READ_POLL_INTERVAL);
        }

        Ok(ring.read_into(dest))
    }

    fn release(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("Failed to stop input stream on release: {}", e);
        }
        self.shared.reset();
    }
}

impl Drop for CpalCaptureDevice {
    fn drop(&mut self) {
        if self.stream.is_some() {
            let _ = self.stop();
        }
    }
}

/// Body of the "cpal-capture" thread.
///
/// Reports the outcome of building and playing the stream on `ready`, then
/// keeps the stream alive until `stop` fires or its sender is dropped.
fn run_stream(
    device_name: Option<String>,
    config: StreamConfig,
    format: SampleFormat,
    shared: Arc<SharedCapture>,
    ready: mpsc::Sender<Result<(), CaptureError>>,
    stop: mpsc::Receiver<()>,
) {
    let stream = match build_stream(device_name.as_deref(), &config, format, &shared) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready.send(Err(CaptureError::DeviceInitFailed(format!(
            "failed to start input stream: {}",
            e
        ))));
        return;
    }
    let _ = ready.send(Ok(()));

    let _ = stop.recv();
    if let Err(e) = stream.pause() {
        log::debug!("Failed to pause input stream: {}", e);
    }
    drop(stream);
    log::debug!("cpal capture thread exiting");
}

fn build_stream(
    device_name: Option<&str>,
    config: &StreamConfig,
    format: SampleFormat,
    shared: &Arc<SharedCapture>,
) -> Result<cpal::Stream, CaptureError> {
    let device = DeviceEnumerator::new()
        .find_input_device(device_name)
        .ok_or(CaptureError::DeviceNotAvailable)?;
    let channels = config.channels as usize;

    let stream = match format {
        SampleFormat::I16 => {
            let sink = Arc::clone(shared);
            device.build_input_stream(
                config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    sink.push(&pcm::downmix_to_mono(data, channels));
                },
                error_callback(Arc::clone(shared)),
                None,
            )
        }
        SampleFormat::F32 => {
            let sink = Arc::clone(shared);
            device.build_input_stream(
                config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    sink.push(&pcm::downmix_f32_to_mono_i16(data, channels));
                },
                error_callback(Arc::clone(shared)),
                None,
            )
        }
        other => {
            return Err(CaptureError::ConfigurationFailed(format!(
                "unsupported sample format {:?}",
                other
            )))
        }
    };

    stream.map_err(|e| CaptureError::DeviceInitFailed(format!("failed to build input stream: {}", e)))
}

fn error_callback(shared: Arc<SharedCapture>) -> impl FnMut(cpal::StreamError) + Send + 'static {
    move |err| {
        log::error!("Input stream error: {}", err);
        shared.fail(err.to_string());
    }
}
