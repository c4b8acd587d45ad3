use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::error::CaptureError;
use crate::models::recording_result::{CaptureOutcome, StopReason};
use crate::processing::sample_buffer::SampleBuffer;
use crate::session::arbiter::DeviceArbiter;
use crate::traits::capture_delegate::CaptureListener;
use crate::traits::capture_provider::CaptureProvider;

/// One-shot handle to the outcome of a recording.
///
/// The worker sends exactly one `CaptureOutcome` when it exits. `wait`
/// consumes the handle.
#[derive(Debug)]
pub struct CaptureCompletion {
    rx: mpsc::Receiver<CaptureOutcome>,
}

impl CaptureCompletion {
    /// Block until the worker exits.
    pub fn wait(self) -> Result<CaptureOutcome, CaptureError> {
        self.rx
            .recv()
            .map_err(|_| CaptureError::InvalidState("capture worker exited without reporting".into()))
    }

    /// Wait up to `timeout`. `Ok(None)` means the recording is still running.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<Option<CaptureOutcome>, CaptureError> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => Ok(Some(outcome)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(CaptureError::InvalidState(
                "capture worker exited without reporting".into(),
            )),
        }
    }
}

/// Cloneable handle that ends the current recording from another thread.
#[derive(Debug, Clone)]
pub struct StopHandle {
    recording: Arc<AtomicBool>,
}

impl StopHandle {
    /// Same as `CaptureSession::stop`.
    pub fn stop(&self) {
        if self.recording.swap(false, Ordering::SeqCst) {
            log::info!("Stopping capture");
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }
}

/// Runs one recording at a time into a fixed-size sample buffer.
///
/// `start` spawns a worker that pulls small chunks from the arbiter into
/// the buffer until one of:
/// - the caller calls `stop`
/// - the buffer is full
/// - the device returns fewer samples than requested
/// - a device read fails
///
/// In every case the worker stops the device once and reports the outcome
/// once, to the listener and through the `CaptureCompletion`.
///
/// ```text
/// [Arbiter] → read(chunk) → [scratch] → write → [SampleBuffer]
/// ```
///
/// The buffer must only be read after completion.
pub struct CaptureSession<P: CaptureProvider + 'static> {
    arbiter: Arc<DeviceArbiter<P>>,
    buffer: Arc<Mutex<SampleBuffer>>,
    recording: Arc<AtomicBool>,
    listener: Option<Arc<dyn CaptureListener>>,
    worker: Option<thread::JoinHandle<CaptureOutcome>>,
    sample_rate: u32,
    chunk_size: usize,
}

impl<P: CaptureProvider + 'static> CaptureSession<P> {
    /// Acquire the device and size the buffer for `max_record_seconds`.
    pub fn new(arbiter: Arc<DeviceArbiter<P>>, max_record_seconds: u32) -> Result<Self, CaptureError> {
        let info = arbiter.acquire(max_record_seconds)?;
        Ok(Self::build(arbiter, info.sample_rate, info.capacity_samples))
    }

    /// Acquire the device and use a buffer of exactly `capacity` samples.
    pub fn with_capacity(arbiter: Arc<DeviceArbiter<P>>, capacity: usize) -> Result<Self, CaptureError> {
        let info = arbiter.acquire(arbiter.config().max_record_seconds)?;
        Ok(Self::build(arbiter, info.sample_rate, capacity))
    }

    fn build(arbiter: Arc<DeviceArbiter<P>>, sample_rate: u32, capacity: usize) -> Self {
        let chunk_size = arbiter.config().chunk_size;
        log::debug!("Capture session: {} samples at {} Hz", capacity, sample_rate);
        Self {
            arbiter,
            buffer: Arc::new(Mutex::new(SampleBuffer::new(capacity))),
            recording: Arc::new(AtomicBool::new(false)),
            listener: None,
            worker: None,
            sample_rate,
            chunk_size,
        }
    }

    pub fn set_listener(&mut self, listener: Arc<dyn CaptureListener>) {
        self.listener = Some(listener);
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Buffer size in samples.
    pub fn capacity(&self) -> usize {
        self.buffer.lock().capacity()
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    pub fn samples_captured(&self) -> usize {
        self.buffer.lock().cursor()
    }

    /// Begin a new recording, overwriting the previous one.
    ///
    /// Blocks only for the device start call.
    pub fn start(&mut self) -> Result<CaptureCompletion, CaptureError> {
        if self.is_recording() {
            return Err(CaptureError::InvalidState("session is already recording".into()));
        }
        // A finished worker may still be unwinding; it has already reported.
        self.join();

        log::info!("Starting capture");
        self.buffer.lock().reset_cursor();
        self.arbiter.start_recording()?;
        self.recording.store(true, Ordering::SeqCst);

        let (tx, rx) = mpsc::sync_channel(1);
        let worker = CaptureWorker {
            arbiter: Arc::clone(&self.arbiter),
            buffer: Arc::clone(&self.buffer),
            recording: Arc::clone(&self.recording),
            listener: self.listener.clone(),
            sample_rate: self.sample_rate,
            chunk_size: self.chunk_size,
        };

        let spawned = thread::Builder::new()
            .name("capture-worker".into())
            .spawn(move || worker.run(tx));

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                Ok(CaptureCompletion { rx })
            }
            Err(e) => {
                self.recording.store(false, Ordering::SeqCst);
                let _ = self.arbiter.stop_recording();
                Err(CaptureError::InvalidState(format!("failed to spawn capture worker: {}", e)))
            }
        }
    }

    /// Ask the worker to finish. It exits within one chunk read and stops the
    /// device itself; this call does not wait for it. Use `join` for that.
    pub fn stop(&self) {
        if self.recording.swap(false, Ordering::SeqCst) {
            log::info!("Stopping capture");
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            recording: Arc::clone(&self.recording),
        }
    }

    /// Wait for the current worker, if any, to exit.
    pub fn join(&mut self) -> Option<CaptureOutcome> {
        let handle = self.worker.take()?;
        match handle.join() {
            Ok(outcome) => Some(outcome),
            Err(_) => {
                log::error!("Capture worker panicked");
                None
            }
        }
    }

    /// Stop, wait for the worker, and release the device.
    pub fn release(&mut self) {
        self.stop();
        self.join();
        self.arbiter.release();
    }

    /// Append the captured samples to `destination` at its cursor.
    ///
    /// Samples that do not fit are dropped. Returns the number copied.
    pub fn read(&self, destination: &mut SampleBuffer) -> usize {
        let buffer = self.buffer.lock();
        let copied = destination.write(buffer.samples());
        if copied < buffer.cursor() {
            log::warn!(
                "Destination buffer full, dropped {} of {} samples",
                buffer.cursor() - copied,
                buffer.cursor()
            );
        }
        copied
    }

    /// Run `f` against the session buffer.
    pub fn with_buffer<R>(&self, f: impl FnOnce(&SampleBuffer) -> R) -> R {
        f(&self.buffer.lock())
    }
}

impl<P: CaptureProvider + 'static> Drop for CaptureSession<P> {
    fn drop(&mut self) {
        self.stop();
        self.join();
    }
}

/// State moved onto the worker thread.
struct CaptureWorker<P: CaptureProvider> {
    arbiter: Arc<DeviceArbiter<P>>,
    buffer: Arc<Mutex<SampleBuffer>>,
    recording: Arc<AtomicBool>,
    listener: Option<Arc<dyn CaptureListener>>,
    sample_rate: u32,
    chunk_size: usize,
}

impl<P: CaptureProvider> CaptureWorker<P> {
    fn run(self, tx: mpsc::SyncSender<CaptureOutcome>) -> CaptureOutcome {
        let reason = self.capture_loop();

        self.recording.store(false, Ordering::SeqCst);
        if let Err(e) = self.arbiter.stop_recording() {
            log::warn!("Failed to stop device after capture: {}", e);
        }

        let outcome = CaptureOutcome {
            reason,
            samples_captured: self.buffer.lock().cursor(),
            sample_rate: self.sample_rate,
        };
        log::info!(
            "Capture finished ({:?}): {} samples, {:.2}s",
            outcome.reason,
            outcome.samples_captured,
            outcome.duration_secs()
        );

        if let Some(ref listener) = self.listener {
            listener.on_capture_finished(&outcome);
        }
        // The receiver may have been dropped; the outcome is still returned
        // through the join handle.
        let _ = tx.send(outcome.clone());
        outcome
    }

    fn capture_loop(&self) -> StopReason {
        // Read through a scratch chunk rather than straight into the
        // session buffer so the buffer lock is never held across a device
        // call.
        let mut scratch = vec![0i16; self.chunk_size];

        loop {
            if !self.recording.load(Ordering::SeqCst) {
                return StopReason::Stopped;
            }

            let wanted = self.chunk_size.min(self.buffer.lock().remaining());
            if wanted == 0 {
                return StopReason::BufferFull;
            }

            match self.arbiter.read(&mut scratch, 0, wanted) {
                Ok(read) => {
                    let mut buffer = self.buffer.lock();
                    buffer.write(&scratch[..read]);
                    if buffer.is_full() {
                        return StopReason::BufferFull;
                    }
                    if read < wanted {
                        log::debug!("Short read: {} of {} samples", read, wanted);
                        return StopReason::ShortRead;
                    }
                }
                Err(e) => {
                    log::error!("Device read error: {}", e);
                    return StopReason::DeviceError(e);
                }
            }
        }
    }
}
