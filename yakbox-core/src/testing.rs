//! Scripted capture provider for exercising the arbiter and session without
//! hardware.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::models::audio_models::InputSource;
use crate::models::error::CaptureError;
use crate::traits::capture_provider::{CaptureDevice, CaptureProvider};

/// Counts device calls and tracks how many are in flight at once.
#[derive(Debug, Default)]
pub(crate) struct CallProbe {
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub opens: AtomicUsize,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    pub reads: AtomicUsize,
    pub releases: AtomicUsize,
}

impl CallProbe {
    fn enter(&self, counter: &AtomicUsize, hold: Duration) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        counter.fetch_add(1, Ordering::SeqCst);
        if !hold.is_zero() {
            thread::sleep(hold);
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// What a mock device produces on `read`.
#[derive(Debug, Clone, Copy)]
pub(crate) enum MockSource {
    /// Always fills the request with a rising counter.
    Endless,
    /// Delivers this many samples in total, then short reads.
    Finite(usize),
    /// Delivers this many samples in total, then fails.
    FailAfter(usize),
}

pub(crate) struct MockProvider {
    /// Rates reported as supported, with their buffer sizes.
    pub supported: Vec<(u32, usize)>,
    /// Number of upcoming `open` calls that fail.
    pub open_failures: usize,
    pub source: MockSource,
    /// Time each device call holds the device, to widen race windows.
    pub hold: Duration,
    pub probe: Arc<CallProbe>,
}

impl MockProvider {
    pub fn new(source: MockSource) -> Self {
        Self {
            supported: vec![(8000, 512)],
            open_failures: 0,
            source,
            hold: Duration::ZERO,
            probe: Arc::new(CallProbe::default()),
        }
    }
}

impl CaptureProvider for MockProvider {
    type Device = MockDevice;

    fn min_buffer_size(&self, sample_rate: u32) -> Option<usize> {
        self.supported
            .iter()
            .find(|(rate, _)| *rate == sample_rate)
            .map(|(_, size)| *size)
    }

    fn open(&mut self, _sample_rate: u32, _buffer_size: usize) -> Result<MockDevice, CaptureError> {
        self.probe.enter(&self.probe.opens, self.hold);
        if self.open_failures > 0 {
            self.open_failures -= 1;
            return Err(CaptureError::DeviceInitFailed("mock device busy".into()));
        }
        Ok(MockDevice {
            source: self.source,
            delivered: 0,
            hold: self.hold,
            probe: Arc::clone(&self.probe),
        })
    }

    fn device_info(&self) -> InputSource {
        InputSource {
            name: "Mock Microphone".into(),
            is_default: true,
        }
    }
}

pub(crate) struct MockDevice {
    source: MockSource,
    delivered: usize,
    hold: Duration,
    probe: Arc<CallProbe>,
}

impl CaptureDevice for MockDevice {
    fn start(&mut self) -> Result<(), CaptureError> {
        self.probe.enter(&self.probe.starts, self.hold);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        self.probe.enter(&self.probe.stops, self.hold);
        Ok(())
    }

    fn read(&mut self, dest: &mut [i16]) -> Result<usize, CaptureError> {
        self.probe.enter(&self.probe.reads, self.hold);
        let n = match self.source {
            MockSource::Endless => dest.len(),
            MockSource::Finite(total) => dest.len().min(total - self.delivered),
            MockSource::FailAfter(total) => {
                if self.delivered >= total {
                    return Err(CaptureError::DeviceReadError("mock read failure".into()));
                }
                dest.len().min(total - self.delivered)
            }
        };
        for slot in dest.iter_mut().take(n) {
            *slot = (self.delivered % i16::MAX as usize) as i16;
            self.delivered += 1;
        }
        Ok(n)
    }

    fn release(&mut self) {
        self.probe.enter(&self.probe.releases, self.hold);
    }
}
