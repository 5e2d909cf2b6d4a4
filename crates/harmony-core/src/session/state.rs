//! Session lifecycle as seen by the UI

use std::fmt;

/// Where a capture session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Idle, microphone off
    #[default]
    Ready,
    /// Acquiring the microphone and building the analysis module
    Starting,
    /// Frames are flowing
    Running,
    /// Tearing capture down
    Stopping,
    /// Last start attempt or running capture failed; toggling on retries
    Failed,
    /// The platform lacks a required primitive; terminal
    Unavailable,
}

/// Inputs to the session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// User turned the microphone on
    ToggleOn,
    /// Stream acquired and analysis module loaded
    Acquired,
    /// Acquisition or module load failed
    AcquisitionError,
    /// User turned the microphone off
    ToggleOff,
    /// Capture and transport released
    TeardownComplete,
}

impl SessionState {
    /// Apply `event`, returning the next state or `None` if the event is not
    /// valid in this state
    pub fn on_event(self, event: SessionEvent) -> Option<SessionState> {
        use SessionEvent::*;
        use SessionState::*;

        match (self, event) {
            (Ready | Failed, ToggleOn) => Some(Starting),
            (Starting, Acquired) => Some(Running),
            (Starting | Running, AcquisitionError) => Some(Failed),
            (Running, ToggleOff) => Some(Stopping),
            (Stopping, TeardownComplete) => Some(Ready),
            _ => None,
        }
    }

    /// Whether frames can currently arrive
    pub fn is_running(self) -> bool {
        self == SessionState::Running
    }

    /// Whether a toggle from this state would do anything
    pub fn accepts_toggle(self) -> bool {
        matches!(
            self,
            SessionState::Ready | SessionState::Failed | SessionState::Running
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Ready => "ready",
            SessionState::Starting => "starting",
            SessionState::Running => "running",
            SessionState::Stopping => "stopping",
            SessionState::Failed => "failed",
            SessionState::Unavailable => "unavailable",
        };
        f.write_str(name)
    }
}
