//! Lock-free frame transport from the audio thread to the UI thread
//!
//! Analysis results travel in the opposite direction of a command queue:
//! the audio callback produces one [`FrameTuple`] per analysis window and
//! the UI picks them up at its own tick rate.
//!
//! # Real-Time Safety
//!
//! The transport is an `rtrb` ringbuffer of encoded frames:
//! - **No allocations**: all slots are allocated when the session starts
//! - **Wait-free**: enqueue and dequeue are O(1) and never block
//! - **Drop on full**: a slow UI never stalls the audio thread; the frame
//!   that does not fit is handed back and counted as dropped
//!
//! # Handshake
//!
//! The capture stream is running before the UI side has finished setting up,
//! so the writer end reaches the audio thread through a one-slot handoff
//! queue. Until the audio thread has picked it up, produced frames have
//! nowhere to go and are counted as dropped.
//!
//! ```text
//! ┌──────────────────┐  deliver(writer)  ┌─────────────────┐
//! │    UI Thread     │──────────────────►│  WriterInbox    │ (capacity 1)
//! │ (FrameReader)    │                   └────────┬────────┘
//! └────────▲─────────┘                            │ take()
//!          │ try_dequeue()                        ▼
//! ┌────────┴─────────┐    try_enqueue()  ┌─────────────────┐
//! │  Frame ring      │◄──────────────────│  Audio Thread   │
//! │  (SPSC, N slots) │                   │ (FrameWriter)   │
//! └──────────────────┘                   └─────────────────┘
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::types::{FrameTuple, WireFrame};

/// Counters shared between the audio thread and the UI (relaxed atomics)
#[derive(Debug, Default)]
pub struct TransportAtomics {
    /// Analysis windows completed by the producer
    pub frames_produced: AtomicU64,
    /// Windows whose frame could not be enqueued (full ring or no writer yet)
    pub frames_dropped: AtomicU64,
    /// Set by the capture backend when the stream died under a live producer
    pub stream_failed: AtomicBool,
}

impl TransportAtomics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn frames_produced(&self) -> u64 {
        self.frames_produced.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn record_produced(&self) {
        self.frames_produced.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Whether the capture stream reported a fatal error
    #[inline]
    pub fn stream_failed(&self) -> bool {
        self.stream_failed.load(Ordering::Relaxed)
    }

    /// Flag the capture stream as dead (callable from the stream's error callback)
    #[inline]
    pub fn record_stream_failure(&self) {
        self.stream_failed.store(true, Ordering::Relaxed);
    }

    /// Zero the counters and clear the failure flag (between sessions)
    pub fn reset(&self) {
        self.frames_produced.store(0, Ordering::Relaxed);
        self.frames_dropped.store(0, Ordering::Relaxed);
        self.stream_failed.store(false, Ordering::Relaxed);
    }
}

/// Factory for the frame ring
pub struct RingTransport;

impl RingTransport {
    /// Allocate a ring of `capacity` frame slots (at least one)
    ///
    /// Returns `(FrameWriter, FrameReader)` where:
    /// - FrameWriter: enqueue side, owned by the audio thread
    /// - FrameReader: dequeue side, owned by the UI thread
    pub fn with_capacity(capacity: usize) -> (FrameWriter, FrameReader) {
        let (producer, consumer) = rtrb::RingBuffer::<WireFrame>::new(capacity.max(1));
        (FrameWriter { producer }, FrameReader { consumer })
    }
}

/// Audio-thread end of the frame ring
pub struct FrameWriter {
    producer: rtrb::Producer<WireFrame>,
}

impl FrameWriter {
    /// Enqueue a frame without blocking
    ///
    /// Returns `Err(frame)` if the ring is full; the frame is handed back and
    /// the caller drops it.
    pub fn try_enqueue(&mut self, frame: FrameTuple) -> Result<(), FrameTuple> {
        self.producer.push(frame.to_wire()).map_err(|e| match e {
            rtrb::PushError::Full(_) => frame,
        })
    }

    /// Free slots right now
    #[inline]
    pub fn available_to_write(&self) -> usize {
        self.producer.slots()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.producer.buffer().capacity()
    }
}

/// UI-thread end of the frame ring
pub struct FrameReader {
    consumer: rtrb::Consumer<WireFrame>,
}

impl FrameReader {
    /// Frames that can be dequeued right now
    #[inline]
    pub fn available_to_read(&self) -> usize {
        self.consumer.slots()
    }

    /// Dequeue the oldest frame without blocking, `None` if the ring is empty
    pub fn try_dequeue(&mut self) -> Option<FrameTuple> {
        self.consumer.pop().ok().map(|wire| FrameTuple::from_wire(&wire))
    }

    /// Discard everything currently buffered, returning how many frames were dropped
    pub fn discard_all(&mut self) -> usize {
        let mut discarded = 0;
        while self.consumer.pop().is_ok() {
            discarded += 1;
        }
        discarded
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.consumer.buffer().capacity()
    }

    /// Whether the writer end has been dropped (capture torn down)
    pub fn is_abandoned(&self) -> bool {
        self.consumer.is_abandoned()
    }
}

/// Create the one-shot channel that carries a [`FrameWriter`] to the audio thread
pub fn writer_handoff() -> (WriterHandoff, WriterInbox) {
    let (producer, consumer) = rtrb::RingBuffer::new(1);
    (WriterHandoff { producer }, WriterInbox { consumer })
}

/// UI-thread side of the writer handoff
pub struct WriterHandoff {
    producer: rtrb::Producer<FrameWriter>,
}

impl WriterHandoff {
    /// Send the writer to the audio thread
    ///
    /// Returns the writer back if one is already waiting to be picked up.
    pub fn deliver(&mut self, writer: FrameWriter) -> Result<(), FrameWriter> {
        self.producer.push(writer).map_err(|e| match e {
            rtrb::PushError::Full(value) => value,
        })
    }
}

/// Audio-thread side of the writer handoff
pub struct WriterInbox {
    consumer: rtrb::Consumer<FrameWriter>,
}

impl WriterInbox {
    /// Take the delivered writer, if any (non-blocking, no allocation)
    #[inline]
    pub fn take(&mut self) -> Option<FrameWriter> {
        self.consumer.pop().ok()
    }
}
