//! Harmony Core - live pitch-class candidate tracking from a microphone

pub mod analysis;
pub mod audio;
pub mod config;
pub mod delta;
pub mod engine;
pub mod session;
pub mod types;

pub use delta::BitMaskDelta;
pub use session::{Session, SessionError, SessionState};
pub use types::*;
