//! Microphone capture
//!
//! # Architecture
//!
//! Capture follows the same lock-free split as the rest of the engine:
//!
//! - **Audio Thread**: owns the [`FrameProducer`](crate::engine::FrameProducer)
//!   exclusively and pushes one frame per analysis window
//! - **UI Thread**: owns the reader end of the frame ring and polls it
//! - **Atomics**: produced/dropped counters readable without locks
//!
//! # Example Usage
//!
//! ```ignore
//! use harmony_core::audio::{get_input_devices, AudioConfig, CpalCaptureBackend};
//!
//! for device in get_input_devices()? {
//!     println!("{}", device.label());
//! }
//!
//! let mut backend = CpalCaptureBackend::new();
//! let handle = backend.start(&AudioConfig::default(), &mut |rate| build_producer(rate))?;
//! ```

mod backend;
mod config;
mod cpal_backend;
mod device;
mod error;

pub use backend::{CaptureBackend, CaptureHandle, ProducerFactory};
pub use config::{
    AudioConfig, BufferSize, DeviceId, DEFAULT_SAMPLE_RATE, MAX_BUFFER_SIZE, MIN_BUFFER_SIZE,
};
pub use cpal_backend::{CpalCaptureBackend, CpalCaptureHandle};
pub use device::{get_input_devices, InputDevice};
pub use error::{AudioError, AudioResult};
