//! Capture backend seam
//!
//! A session only needs two things from the platform: open the microphone,
//! and run a [`FrameProducer`] on every quantum it delivers. The producer is
//! built by the session through a factory once the stream's real sample rate
//! is known, so the analysis range always matches the device.
//!
//! [`CpalCaptureBackend`](super::CpalCaptureBackend) is the platform
//! implementation; tests drive sessions through their own backends.

use crate::analysis::AnalysisError;
use crate::engine::FrameProducer;

use super::config::AudioConfig;
use super::error::AudioResult;

/// Builds the audio-thread producer for a negotiated sample rate
pub type ProducerFactory<'a> = dyn FnMut(u32) -> Result<FrameProducer, AnalysisError> + 'a;

/// Something that can open an audio input and feed it to a producer
pub trait CaptureBackend {
    type Handle: CaptureHandle;

    /// Open the input described by `config` and start streaming into the
    /// producer returned by `factory`
    ///
    /// The returned handle keeps capture alive; dropping it releases the
    /// device.
    fn start(
        &mut self,
        config: &AudioConfig,
        factory: &mut ProducerFactory<'_>,
    ) -> AudioResult<Self::Handle>;
}

/// A running capture stream
pub trait CaptureHandle {
    /// Sample rate the device actually delivers
    fn sample_rate(&self) -> u32;

    /// Interleaved channels per sample frame
    fn channels(&self) -> u16;

    /// Name of the opened device
    fn device_name(&self) -> &str;
}
