//! Capture configuration
//!
//! Which microphone to open and how to ask the platform for its stream.

use serde::{Deserialize, Serialize};

/// Default capture sample rate (48kHz)
/// If the input device doesn't support it, the device's maximum rate is used
/// and the analysis range is derived from that.
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Lower bound for a fixed callback buffer size (frames)
pub const MIN_BUFFER_SIZE: u32 = 64;

/// Upper bound for a fixed callback buffer size (frames)
pub const MAX_BUFFER_SIZE: u32 = 8192;

/// Preferred callback buffer size for the input stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BufferSize {
    /// Let the system choose
    #[default]
    Default,
    /// Request a specific size in frames (clamped to 64-8192)
    Fixed(u32),
}

impl BufferSize {
    /// Buffer size in frames, or None for system default
    pub fn as_frames(&self) -> Option<u32> {
        match self {
            BufferSize::Default => None,
            BufferSize::Fixed(frames) => Some((*frames).clamp(MIN_BUFFER_SIZE, MAX_BUFFER_SIZE)),
        }
    }
}

/// Audio device identifier
///
/// Includes both the device name and the host backend (ALSA, PulseAudio,
/// CoreAudio, ...) so the same microphone can be picked on systems with
/// several audio hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceId {
    /// Device name as reported by the system
    pub name: String,
    /// Audio host identifier; None searches every host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

impl DeviceId {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: None,
        }
    }

    pub fn with_host(name: &str, host: &str) -> Self {
        Self {
            name: name.to_string(),
            host: Some(host.to_string()),
        }
    }

    /// Display label that includes the host if available
    pub fn display_label(&self) -> String {
        match &self.host {
            Some(host) => format!("[{}] {}", host, self.name),
            None => self.name.clone(),
        }
    }
}

/// Microphone capture settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Input device (None = system default microphone)
    pub input_device: Option<DeviceId>,

    /// Preferred sample rate (None = 48kHz)
    pub sample_rate: Option<u32>,

    /// Preferred callback buffer size
    pub buffer_size: BufferSize,
}

impl AudioConfig {
    /// Set the input device
    pub fn with_input_device(mut self, device: DeviceId) -> Self {
        self.input_device = Some(device);
        self
    }

    /// Set the preferred sample rate
    pub fn with_sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = Some(rate);
        self
    }

    /// Set a fixed callback buffer size in frames
    pub fn with_buffer_frames(mut self, frames: u32) -> Self {
        self.buffer_size = BufferSize::Fixed(frames);
        self
    }

    /// Sample rate to ask the device for
    pub fn target_sample_rate(&self) -> u32 {
        self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_buffer_size_is_clamped() {
        assert_eq!(BufferSize::Default.as_frames(), None);
        assert_eq!(BufferSize::Fixed(16).as_frames(), Some(MIN_BUFFER_SIZE));
        assert_eq!(BufferSize::Fixed(256).as_frames(), Some(256));
        assert_eq!(BufferSize::Fixed(1 << 20).as_frames(), Some(MAX_BUFFER_SIZE));
    }

    #[test]
    fn test_device_label() {
        assert_eq!(DeviceId::new("USB Mic").display_label(), "USB Mic");
        assert_eq!(DeviceId::with_host("hw:1,0", "ALSA").display_label(), "[ALSA] hw:1,0");
    }

    #[test]
    fn test_builder_and_yaml() {
        let config = AudioConfig::default()
            .with_input_device(DeviceId::new("USB Mic"))
            .with_sample_rate(44100)
            .with_buffer_frames(512);
        assert_eq!(config.target_sample_rate(), 44100);

        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: AudioConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(AudioConfig::default().target_sample_rate(), DEFAULT_SAMPLE_RATE);
    }
}
