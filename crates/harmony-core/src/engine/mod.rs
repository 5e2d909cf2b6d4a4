//! Tracking engine - candidate tracker, frame transport, producer/consumer
//!
//! This module contains everything between the extractor and the UI:
//! - CandidateTracker: per-pitch-class evidence and the dominance front
//! - RingTransport: lock-free SPSC frame ring (audio → UI)
//! - FrameProducer: audio-thread driver (block accumulation, tracking, enqueue)
//! - FrameConsumer: UI-thread driver (one frame per tick, mask deltas)

mod consumer;
mod producer;
mod tracker;
mod transport;

pub use consumer::FrameConsumer;
pub use producer::FrameProducer;
pub use tracker::{compare, CandidateTracker, Dominance, PitchClassStats};
pub use transport::{
    writer_handoff, FrameReader, FrameWriter, RingTransport, TransportAtomics, WriterHandoff,
    WriterInbox,
};
