//! Errors reported to the UI through the session

use thiserror::Error;

use crate::audio::AudioError;

/// Why a session is `Failed` or `Unavailable`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The platform lacks lock-free 64-bit atomics; terminal
    #[error("Environment unsupported: lock-free 64-bit atomics are not available")]
    EnvironmentUnsupported,

    /// The microphone exists but could not be opened
    #[error("Microphone access denied: {0}")]
    AcquisitionDenied(String),

    /// Opening or running the microphone failed
    #[error("Microphone acquisition failed: {0}")]
    AcquisitionFailed(String),

    /// The analysis module could not be initialized
    #[error("Analysis module failed to load: {0}")]
    ModuleLoadFailed(String),
}

impl SessionError {
    /// Whether toggling on again may succeed
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, SessionError::EnvironmentUnsupported)
    }
}

impl From<AudioError> for SessionError {
    fn from(err: AudioError) -> Self {
        match err {
            AudioError::DeviceUnavailable(device) => SessionError::AcquisitionDenied(device),
            AudioError::Analysis(e) => SessionError::ModuleLoadFailed(e.to_string()),
            other => SessionError::AcquisitionFailed(other.to_string()),
        }
    }
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisError;

    #[test]
    fn test_audio_errors_are_classified() {
        assert_eq!(
            SessionError::from(AudioError::DeviceUnavailable("USB Mic".into())),
            SessionError::AcquisitionDenied("USB Mic".into())
        );
        assert!(matches!(
            SessionError::from(AudioError::NoInputDevice),
            SessionError::AcquisitionFailed(_)
        ));
        assert!(matches!(
            SessionError::from(AudioError::StreamBuildError("busy".into())),
            SessionError::AcquisitionFailed(msg) if msg.contains("busy")
        ));
        let analysis = AnalysisError::InvalidBlockSize {
            block_size: 0,
            divisor: 4,
        };
        assert!(matches!(
            SessionError::from(AudioError::from(analysis)),
            SessionError::ModuleLoadFailed(_)
        ));
    }

    #[test]
    fn test_only_environment_errors_are_fatal() {
        assert!(!SessionError::EnvironmentUnsupported.is_recoverable());
        assert!(SessionError::AcquisitionDenied(String::new()).is_recoverable());
        assert!(SessionError::ModuleLoadFailed(String::new()).is_recoverable());
    }
}
