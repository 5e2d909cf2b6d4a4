//! CPAL microphone capture
//!
//! ```text
//! ┌──────────────────┐  &[f32] quantum   ┌─────────────────────┐
//! │ CPAL Input Thread│──────────────────►│   FrameProducer     │
//! │ (platform owned) │                   │ (moved in callback) │
//! └──────────────────┘                   └──────────┬──────────┘
//!                                                   │ try_enqueue()
//!                                                   ▼
//!                                        ┌─────────────────────┐
//!                                        │  Frame ring → UI    │
//!                                        └─────────────────────┘
//! ```
//!
//! The producer is moved into the data callback and owned by the audio
//! thread from then on. Dropping the handle stops the stream and drops the
//! producer with it.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{BufferSize as CpalBufferSize, SampleFormat, Stream, StreamConfig};

use super::backend::{CaptureBackend, CaptureHandle, ProducerFactory};
use super::config::AudioConfig;
use super::device::{find_device_by_id, get_default_input_device};
use super::error::{AudioError, AudioResult};
use crate::engine::FrameProducer;

/// Opens inputs through CPAL
#[derive(Debug, Default)]
pub struct CpalCaptureBackend;

impl CpalCaptureBackend {
    pub fn new() -> Self {
        Self
    }
}

/// CPAL-specific capture handle
///
/// Keeps the input stream alive. Drop this to stop capture.
pub struct CpalCaptureHandle {
    _stream: Stream,
    sample_rate: u32,
    channels: u16,
    device_name: String,
}

impl CaptureHandle for CpalCaptureHandle {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn device_name(&self) -> &str {
        &self.device_name
    }
}

impl CaptureBackend for CpalCaptureBackend {
    type Handle = CpalCaptureHandle;

    fn start(
        &mut self,
        config: &AudioConfig,
        factory: &mut ProducerFactory<'_>,
    ) -> AudioResult<CpalCaptureHandle> {
        let device = match &config.input_device {
            Some(id) => find_device_by_id(id)?,
            None => get_default_input_device()?,
        };

        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        log::info!("Using input device: {}", device_name);

        let supported = get_input_config(&device, config)?;
        let sample_rate = supported.sample_rate().0;
        let stream_config = StreamConfig {
            channels: supported.channels(),
            sample_rate: supported.sample_rate(),
            buffer_size: match config.buffer_size.as_frames() {
                Some(frames) => CpalBufferSize::Fixed(frames),
                None => CpalBufferSize::Default,
            },
        };

        let producer = factory(sample_rate)?;
        log::info!(
            "Capture config: {} channels, {}Hz, analysis block {} samples (~{:.0}ms)",
            stream_config.channels,
            sample_rate,
            producer.block_size(),
            producer.block_size() as f32 / sample_rate as f32 * 1000.0
        );

        let stream = build_input_stream(&device, &stream_config, producer)?;
        stream.play().map_err(|e| match e {
            cpal::PlayStreamError::DeviceNotAvailable => {
                AudioError::DeviceUnavailable(device_name.clone())
            }
            other => AudioError::StreamPlayError(other.to_string()),
        })?;

        log::info!("Input stream started");

        Ok(CpalCaptureHandle {
            _stream: stream,
            sample_rate,
            channels: stream_config.channels,
            device_name,
        })
    }
}

/// Pick the input configuration to open
///
/// Only f32 configurations are considered. The sample rate closest to the
/// target wins (the lower one on a tie, which keeps pitch lags short), then
/// the fewest channels (less downmixing on the audio thread).
fn choose_input_config(
    ranges: &[cpal::SupportedStreamConfigRange],
    target_sample_rate: u32,
) -> Option<cpal::SupportedStreamConfig> {
    ranges
        .iter()
        .filter(|c| c.sample_format() == SampleFormat::F32)
        .map(|c| {
            let rate = target_sample_rate.clamp(c.min_sample_rate().0, c.max_sample_rate().0);
            (rate.abs_diff(target_sample_rate), rate, c)
        })
        .min_by_key(|&(distance, rate, c)| (distance, rate, c.channels()))
        .map(|(_, rate, c)| c.clone().with_sample_rate(cpal::SampleRate(rate)))
}

fn get_input_config(
    device: &cpal::Device,
    config: &AudioConfig,
) -> AudioResult<cpal::SupportedStreamConfig> {
    let supported_configs: Vec<_> = device
        .supported_input_configs()
        .map_err(|e| match e {
            cpal::SupportedStreamConfigsError::DeviceNotAvailable => AudioError::DeviceUnavailable(
                device.name().unwrap_or_else(|_| "Unknown".to_string()),
            ),
            other => AudioError::ConfigError(other.to_string()),
        })?
        .collect();

    let target_sample_rate = config.target_sample_rate();
    let chosen = choose_input_config(&supported_configs, target_sample_rate).ok_or_else(|| {
        AudioError::UnsupportedFormat("device offers no f32 input configuration".to_string())
    })?;

    if chosen.sample_rate().0 != target_sample_rate {
        log::warn!(
            "Input device doesn't support {}Hz, falling back to {}Hz",
            target_sample_rate,
            chosen.sample_rate().0
        );
    }
    Ok(chosen)
}

fn build_input_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    mut producer: FrameProducer,
) -> AudioResult<Stream> {
    let channels = config.channels as usize;
    let atomics = producer.shared_atomics();

    device
        .build_input_stream(
            config,
            move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                producer.push_interleaved(data, channels);
            },
            move |err| {
                log::error!("Input stream error: {}", err);
                // The data callback stays installed; the session has to notice
                if matches!(err, cpal::StreamError::DeviceNotAvailable) {
                    atomics.record_stream_failure();
                }
            },
            None,
        )
        .map_err(|e| match e {
            cpal::BuildStreamError::DeviceNotAvailable => AudioError::DeviceUnavailable(
                device.name().unwrap_or_else(|_| "Unknown".to_string()),
            ),
            cpal::BuildStreamError::StreamConfigNotSupported => {
                AudioError::UnsupportedFormat(format!("{:?}", config))
            }
            other => AudioError::StreamBuildError(other.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpal::{SampleRate, SupportedBufferSize, SupportedStreamConfigRange};

    fn range(
        channels: u16,
        min: u32,
        max: u32,
        format: SampleFormat,
    ) -> SupportedStreamConfigRange {
        SupportedStreamConfigRange::new(
            channels,
            SampleRate(min),
            SampleRate(max),
            SupportedBufferSize::Unknown,
            format,
        )
    }

    #[test]
    fn test_target_rate_prefers_fewest_channels() {
        let ranges = [
            range(2, 8000, 192000, SampleFormat::F32),
            range(1, 8000, 96000, SampleFormat::F32),
            range(1, 8000, 192000, SampleFormat::I16),
        ];
        let chosen = choose_input_config(&ranges, 48000).unwrap();
        assert_eq!(chosen.sample_rate().0, 48000);
        assert_eq!(chosen.channels(), 1);
        assert_eq!(chosen.sample_format(), SampleFormat::F32);
    }

    #[test]
    fn test_fallback_picks_closest_rate_not_highest() {
        let ranges = [
            range(2, 96000, 96000, SampleFormat::F32),
            range(2, 192000, 192000, SampleFormat::F32),
            range(2, 44100, 44100, SampleFormat::F32),
        ];
        assert_eq!(choose_input_config(&ranges, 48000).unwrap().sample_rate().0, 44100);

        // Only high rates on offer: the nearest one, clamped into its range
        let high_only = [
            range(2, 88200, 96000, SampleFormat::F32),
            range(2, 176400, 192000, SampleFormat::F32),
        ];
        assert_eq!(choose_input_config(&high_only, 48000).unwrap().sample_rate().0, 88200);
    }

    #[test]
    fn test_equal_distance_prefers_lower_rate() {
        let ranges = [
            range(1, 50000, 50000, SampleFormat::F32),
            range(1, 46000, 46000, SampleFormat::F32),
        ];
        assert_eq!(choose_input_config(&ranges, 48000).unwrap().sample_rate().0, 46000);
    }

    #[test]
    fn test_no_f32_config() {
        let ranges = [range(2, 8000, 48000, SampleFormat::I16)];
        assert!(choose_input_config(&ranges, 48000).is_none());
        assert!(choose_input_config(&[], 48000).is_none());
    }
}
