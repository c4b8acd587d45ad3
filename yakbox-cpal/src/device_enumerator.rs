//! Input device enumeration through the cpal default host.

use cpal::traits::{DeviceTrait, HostTrait};

use yakbox_core::models::audio_models::InputSource;
use yakbox_core::models::error::CaptureError;

/// Lists and resolves input devices on the default host.
pub struct DeviceEnumerator {
    host: cpal::Host,
}

impl DeviceEnumerator {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    /// List every input device the host reports.
    pub fn list_input_devices(&self) -> Result<Vec<InputSource>, CaptureError> {
        let default_name = self.default_input_device_name();
        let devices = self
            .host
            .input_devices()
            .map_err(|e| CaptureError::DeviceInitFailed(format!("failed to enumerate input devices: {}", e)))?;

        let mut sources = Vec::new();
        for device in devices {
            let name = match device.name() {
                Ok(name) => name,
                Err(e) => {
                    log::debug!("Skipping input device without a name: {}", e);
                    continue;
                }
            };
            let is_default = default_name.as_deref() == Some(name.as_str());
            sources.push(InputSource { name, is_default });
        }
        Ok(sources)
    }

    pub fn default_input_device_name(&self) -> Option<String> {
        self.host.default_input_device().and_then(|d| d.name().ok())
    }

    /// Find an input device by name, or the default device when `name` is `None`.
    pub fn find_input_device(&self, name: Option<&str>) -> Option<cpal::Device> {
        match name {
            None => self.host.default_input_device(),
            Some(wanted) => self
                .host
                .input_devices()
                .ok()?
                .find(|d| d.name().map(|n| n == wanted).unwrap_or(false)),
        }
    }
}

impl Default for DeviceEnumerator {
    fn default() -> Self {
        Self::new()
    }
}
