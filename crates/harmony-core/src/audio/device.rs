//! Input device enumeration
//!
//! Devices are listed from ALL available audio hosts (ALSA, PulseAudio,
//! CoreAudio, WASAPI, ...) so a specific microphone can be chosen even when
//! the default host only exposes a virtual device.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Host, HostId};

use super::config::DeviceId;
use super::error::{AudioError, AudioResult};

/// Sample rates checked when describing a device
const COMMON_SAMPLE_RATES: [u32; 6] = [44100, 48000, 88200, 96000, 176400, 192000];

/// Get a human-readable name for a host ID
fn host_name(host_id: HostId) -> String {
    let name = format!("{:?}", host_id);
    match name.as_str() {
        "Alsa" => "ALSA".to_string(),
        "Jack" => "JACK".to_string(),
        "Wasapi" => "WASAPI".to_string(),
        _ => name,
    }
}

fn get_host_by_name(name: &str) -> Option<Host> {
    cpal::available_hosts()
        .into_iter()
        .find(|&host_id| host_name(host_id) == name)
        .and_then(|host_id| cpal::host_from_id(host_id).ok())
}

/// Information about an audio input device
#[derive(Debug, Clone)]
pub struct InputDevice {
    /// Device identifier for configuration (includes host info)
    pub id: DeviceId,
    /// Whether this is the default input of its host
    pub is_default: bool,
    /// Common sample rates the device accepts
    pub sample_rates: Vec<u32>,
    /// Maximum input channels
    pub max_channels: u16,
    /// Whether any configuration delivers f32 samples
    pub supports_f32: bool,
}

impl InputDevice {
    pub fn label(&self) -> String {
        if self.is_default {
            format!("{} (default)", self.id.display_label())
        } else {
            self.id.display_label()
        }
    }
}

/// Get all input devices from every available host
///
/// Default devices come first, then the list is ordered by host and name.
pub fn get_input_devices() -> AudioResult<Vec<InputDevice>> {
    let mut all_devices = Vec::new();

    for host_id in cpal::available_hosts() {
        let host = match cpal::host_from_id(host_id) {
            Ok(h) => h,
            Err(e) => {
                log::debug!("Could not initialize host {:?}: {}", host_id, e);
                continue;
            }
        };
        let host_label = host_name(host_id);

        let default_name = host.default_input_device().and_then(|d| d.name().ok());

        let devices = match host.input_devices() {
            Ok(d) => d,
            Err(e) => {
                log::debug!("Could not enumerate inputs for {:?}: {}", host_id, e);
                continue;
            }
        };

        for device in devices {
            let Ok(name) = device.name() else {
                continue;
            };
            let configs: Vec<_> = match device.supported_input_configs() {
                Ok(c) => c.collect(),
                Err(_) => continue,
            };
            if configs.is_empty() {
                continue;
            }

            let mut sample_rates = Vec::new();
            let mut max_channels = 0;
            let mut supports_f32 = false;
            for config in &configs {
                max_channels = max_channels.max(config.channels());
                supports_f32 |= config.sample_format() == cpal::SampleFormat::F32;
                for rate in COMMON_SAMPLE_RATES {
                    if rate >= config.min_sample_rate().0
                        && rate <= config.max_sample_rate().0
                        && !sample_rates.contains(&rate)
                    {
                        sample_rates.push(rate);
                    }
                }
            }
            sample_rates.sort_unstable();

            all_devices.push(InputDevice {
                is_default: default_name.as_ref() == Some(&name),
                id: DeviceId::with_host(&name, &host_label),
                sample_rates,
                max_channels,
                supports_f32,
            });
        }
    }

    if all_devices.is_empty() {
        return Err(AudioError::NoInputDevice);
    }

    all_devices.sort_by(|a, b| {
        b.is_default
            .cmp(&a.is_default)
            .then_with(|| a.id.host.cmp(&b.id.host))
            .then_with(|| a.id.name.cmp(&b.id.name))
    });

    Ok(all_devices)
}

/// Find a cpal input device by its identifier
///
/// With a host set only that host is searched; otherwise every host is tried
/// in order and the first device with a matching name wins.
pub(crate) fn find_device_by_id(id: &DeviceId) -> AudioResult<cpal::Device> {
    let hosts: Vec<Host> = match &id.host {
        Some(name) => get_host_by_name(name)
            .into_iter()
            .collect(),
        None => cpal::available_hosts()
            .into_iter()
            .filter_map(|host_id| cpal::host_from_id(host_id).ok())
            .collect(),
    };

    for host in hosts {
        let Ok(devices) = host.input_devices() else {
            continue;
        };
        for device in devices {
            if device.name().ok().as_deref() == Some(id.name.as_str()) {
                return Ok(device);
            }
        }
    }

    Err(AudioError::DeviceNotFound(id.display_label()))
}

/// The default input of the platform's default host
pub(crate) fn get_default_input_device() -> AudioResult<cpal::Device> {
    cpal::default_host()
        .default_input_device()
        .ok_or(AudioError::NoInputDevice)
}
