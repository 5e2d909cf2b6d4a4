//! Audio-thread side of a session
//!
//! The capture callback hands whatever quantum of samples the platform
//! delivers to [`FrameProducer`]. Samples are collected into one fixed-size
//! analysis block; each full block is extracted, tracked, and published as a
//! [`FrameTuple`] on the frame ring.
//!
//! Nothing in here allocates, locks or logs once constructed. Problems that
//! would be worth reporting (full ring, writer not yet delivered) only bump
//! the shared [`TransportAtomics`] counters for the UI to read.

use std::sync::Arc;

use super::tracker::CandidateTracker;
use super::transport::{FrameWriter, TransportAtomics, WriterInbox};
use crate::analysis::{Extraction, Extractor};
use crate::types::FrameTuple;

pub struct FrameProducer {
    extractor: Box<dyn Extractor>,
    tracker: CandidateTracker,
    /// Pre-allocated analysis block
    block: Vec<f32>,
    /// Samples collected in `block` so far
    filled: usize,
    inbox: WriterInbox,
    /// `None` until the UI has delivered the writer
    writer: Option<FrameWriter>,
    atomics: Arc<TransportAtomics>,
}

impl FrameProducer {
    pub fn new(
        extractor: Box<dyn Extractor>,
        tracker: CandidateTracker,
        inbox: WriterInbox,
        atomics: Arc<TransportAtomics>,
    ) -> Self {
        let block_size = extractor.block_size().max(1);
        Self {
            extractor,
            tracker,
            block: vec![0.0; block_size],
            filled: 0,
            inbox,
            writer: None,
            atomics,
        }
    }

    /// Feed mono samples
    pub fn push_samples(&mut self, mut samples: &[f32]) {
        while !samples.is_empty() {
            let n = (self.block.len() - self.filled).min(samples.len());
            self.block[self.filled..self.filled + n].copy_from_slice(&samples[..n]);
            self.filled += n;
            samples = &samples[n..];

            if self.filled == self.block.len() {
                self.analyse_block();
            }
        }
    }

    /// Feed interleaved multi-channel samples, downmixed to mono by averaging
    pub fn push_interleaved(&mut self, data: &[f32], channels: usize) {
        if channels <= 1 {
            self.push_samples(data);
            return;
        }

        for frame in data.chunks(channels) {
            let mono = frame.iter().sum::<f32>() / frame.len() as f32;
            self.block[self.filled] = mono;
            self.filled += 1;

            if self.filled == self.block.len() {
                self.analyse_block();
            }
        }
    }

    fn analyse_block(&mut self) {
        let extraction = self.extractor.extract(&self.block);
        self.filled = 0;
        self.process_extraction(&extraction);
    }

    /// Track one window's features and publish the resulting frame
    pub fn process_extraction(&mut self, extraction: &Extraction) -> FrameTuple {
        let frame = self.tracker.process(extraction);
        self.publish(frame);
        frame
    }

    fn publish(&mut self, frame: FrameTuple) {
        self.atomics.record_produced();

        if self.writer.is_none() {
            self.writer = self.inbox.take();
        }

        let enqueued = match self.writer.as_mut() {
            Some(writer) => writer.try_enqueue(frame).is_ok(),
            None => false,
        };
        if !enqueued {
            self.atomics.record_dropped();
        }
    }

    /// Whether the writer has been delivered
    pub fn is_connected(&self) -> bool {
        self.writer.is_some()
    }

    /// Counters shared with the UI, for the capture stream's error callback
    pub fn shared_atomics(&self) -> Arc<TransportAtomics> {
        Arc::clone(&self.atomics)
    }

    pub fn tracker(&self) -> &CandidateTracker {
        &self.tracker
    }

    pub fn block_size(&self) -> usize {
        self.block.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.extractor.sample_rate()
    }
}
