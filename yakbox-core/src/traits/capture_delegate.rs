use crate::models::recording_result::CaptureOutcome;

/// Listener for capture completion.
///
/// Called from the capture worker thread, not the caller's thread.
/// Implementations should marshal to a UI thread if needed.
pub trait CaptureListener: Send + Sync {
    /// Called exactly once per recording when the worker exits, whether the
    /// buffer filled, the caller stopped, or the device failed.
    fn on_capture_finished(&self, outcome: &CaptureOutcome);
}

impl<F> CaptureListener for F
where
    F: Fn(&CaptureOutcome) + Send + Sync,
{
    fn on_capture_finished(&self, outcome: &CaptureOutcome) {
        self(outcome)
    }
}
