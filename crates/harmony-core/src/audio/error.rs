//! Capture error types

use thiserror::Error;

use crate::analysis::AnalysisError;

/// Errors that can occur while opening the microphone
#[derive(Error, Debug)]
pub enum AudioError {
    /// No input device on any host
    #[error("No audio input devices found")]
    NoInputDevice,

    /// Configured device not found
    #[error("Audio input device not found: {0}")]
    DeviceNotFound(String),

    /// Device exists but cannot be opened (in use, unplugged, or access denied)
    #[error("Audio input device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Failed to query device configuration
    #[error("Failed to get device config: {0}")]
    ConfigError(String),

    /// No f32 input configuration
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// Failed to build the input stream
    #[error("Failed to build audio stream: {0}")]
    StreamBuildError(String),

    /// Failed to start the input stream
    #[error("Failed to start audio stream: {0}")]
    StreamPlayError(String),

    /// The analysis module could not be built for this stream
    #[error("Analysis setup failed: {0}")]
    Analysis(#[from] AnalysisError),
}

/// Result type for capture operations
pub type AudioResult<T> = Result<T, AudioError>;
