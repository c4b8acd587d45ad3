/// Parameters negotiated with the capture device on acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Rate the device was opened at, in Hz.
    pub sample_rate: u32,

    /// Minimum device buffer size reported by the platform, in samples.
    pub buffer_size: usize,

    /// Buffer size in samples for the requested maximum record time
    /// (`sample_rate * max_record_seconds`).
    pub capacity_samples: usize,
}

impl DeviceInfo {
    pub fn buffer_size_bytes(&self) -> usize {
        self.buffer_size * std::mem::size_of::<i16>()
    }
}

/// Describes an input device offered by a capture provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSource {
    pub name: String,
    pub is_default: bool,
}
