//! UI-thread side of a session
//!
//! [`FrameConsumer`] is polled once per UI tick. It takes at most one frame
//! per tick so a backlog never turns into a long tick, and turns the two
//! masks of that frame into [`BitMaskDelta`]s the UI can merge into its own
//! state.

use super::transport::FrameReader;
use crate::delta::BitMaskDelta;
use crate::types::{FrameTuple, PitchMask};

#[derive(Default)]
pub struct FrameConsumer {
    /// `None` while no session is running
    reader: Option<FrameReader>,
    candidate_delta: BitMaskDelta,
    stimulus_delta: BitMaskDelta,
    latest: Option<FrameTuple>,
}

impl FrameConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the reader end of a freshly created frame ring
    pub fn connect(&mut self, reader: FrameReader) {
        self.reader = Some(reader);
    }

    /// One tick: dequeue a single frame if available and update both deltas
    pub fn poll(&mut self) -> Option<FrameTuple> {
        let reader = self.reader.as_mut()?;
        if reader.available_to_read() == 0 {
            return None;
        }
        let frame = reader.try_dequeue()?;

        self.candidate_delta.update(frame.usual_suspects);
        self.stimulus_delta.update(frame.active_mask);
        self.latest = Some(frame);
        Some(frame)
    }

    /// Drop the reader and anything still buffered, and forget mask history
    ///
    /// Returns the number of frames discarded.
    pub fn disconnect(&mut self) -> usize {
        let discarded = self
            .reader
            .take()
            .map_or(0, |mut reader| reader.discard_all());
        self.candidate_delta.reset();
        self.stimulus_delta.reset();
        self.latest = None;
        discarded
    }

    pub fn is_connected(&self) -> bool {
        self.reader.is_some()
    }

    /// Whether the producer side is gone and nothing is left to read
    pub fn is_abandoned(&self) -> bool {
        self.reader
            .as_ref()
            .is_some_and(|reader| reader.is_abandoned() && reader.available_to_read() == 0)
    }

    /// Frames waiting in the ring
    pub fn pending(&self) -> usize {
        self.reader.as_ref().map_or(0, FrameReader::available_to_read)
    }

    /// Changes of the usual-suspects mask on the last poll
    pub fn candidate_delta(&self) -> &BitMaskDelta {
        &self.candidate_delta
    }

    /// Changes of the active mask on the last poll
    pub fn stimulus_delta(&self) -> &BitMaskDelta {
        &self.stimulus_delta
    }

    /// Merge the last candidate change into `selection`
    pub fn merge_candidates(&self, selection: PitchMask) -> PitchMask {
        self.candidate_delta.apply(selection)
    }

    /// Merge the last stimulus change into `highlight`
    pub fn merge_stimuli(&self, highlight: PitchMask) -> PitchMask {
        self.stimulus_delta.apply(highlight)
    }

    pub fn latest(&self) -> Option<&FrameTuple> {
        self.latest.as_ref()
    }

    /// Melody semitone of the latest frame, NaN when unvoiced or nothing received
    pub fn mean_semitone(&self) -> f32 {
        self.latest.map_or(f32::NAN, |f| f.mean_semitone)
    }

    /// RMS of the latest frame
    pub fn rms(&self) -> f32 {
        self.latest.map_or(0.0, |f| f.rms)
    }
}
