//! Candidate tracking: which pitch classes are plausibly being played
//!
//! Every analysis window turns a chroma vector and an optional melody pitch
//! into evidence for individual pitch classes. Evidence accumulates in
//! per-class running statistics, and a Pareto front over four ranking
//! criteria decides which classes are the best-supported ones right now.
//! Front members enter the sticky "usual suspects" set and age out of it
//! once they stop receiving stimulus.
//!
//! # Per-window flow
//!
//! ```text
//! chroma[12] ──► debounce (D windows) ──► active mask ──┐
//!                                                      ├─► dominance admission ──► front
//! melody pitch ──► fold to pitch class ────────────────┘                          │
//!                                                                                  ▼
//!                                   usual suspects ◄── union ◄── stimuli (front ∩ evidence)
//!                                         │
//!                                         └── aging: stimulus → 0, active → -step, idle → +step
//!                                             age ≥ E → dropped
//! ```
//!
//! Everything here is owned by the audio thread. State lives in fixed-size
//! arrays indexed by pitch class; processing a window never allocates.

use crate::analysis::Extraction;
use crate::config::TrackerConfig;
use crate::types::{pitch_classes, FrameTuple, PitchClass, PitchMask, NUM_PITCH_CLASSES};

/// Running statistics of one pitch class within a session
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PitchClassStats {
    /// Windows since this class last lacked harmonic evidence
    pub consecutive_active_frames: u32,
    /// Loudest RMS seen while this class had evidence
    pub max_gain: f32,
    /// Longest run of consecutive evidence
    pub max_duration: u32,
    /// Times the melody pitch landed on this class
    pub melodic_trigger_count: u32,
    /// Times a harmonic run reached the debounce length
    pub harmonic_trigger_count: u32,
    /// Windows since this class last received stimulus
    pub age: u32,
}

/// Relation between two candidates under the four ranking criteria
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dominance {
    /// At least as good everywhere, strictly better somewhere
    Dominates,
    /// The mirror image of `Dominates`
    DominatedBy,
    /// Identical on every criterion
    Equal,
    /// Each side wins at least one criterion
    Incomparable,
}

/// Compare two candidates on gain, duration, melodic and harmonic triggers
pub fn compare(a: &PitchClassStats, b: &PitchClassStats) -> Dominance {
    let signs = [
        // NaN gain compares as equal: it carries no ranking information
        a.max_gain.partial_cmp(&b.max_gain),
        Some(a.max_duration.cmp(&b.max_duration)),
        Some(a.melodic_trigger_count.cmp(&b.melodic_trigger_count)),
        Some(a.harmonic_trigger_count.cmp(&b.harmonic_trigger_count)),
    ];

    let greater = signs.contains(&Some(std::cmp::Ordering::Greater));
    let less = signs.contains(&Some(std::cmp::Ordering::Less));

    match (greater, less) {
        (true, false) => Dominance::Dominates,
        (false, true) => Dominance::DominatedBy,
        (false, false) => Dominance::Equal,
        (true, true) => Dominance::Incomparable,
    }
}

/// Accumulates per-window evidence into the front and usual-suspects masks
#[derive(Debug, Clone)]
pub struct CandidateTracker {
    config: TrackerConfig,
    /// Frequency of semitone 0 for the melody fold (pitch class C)
    reference_frequency: f32,
    stats: [PitchClassStats; NUM_PITCH_CLASSES],
    front: PitchMask,
    usual_suspects: PitchMask,
}

impl CandidateTracker {
    pub fn new(config: TrackerConfig, reference_frequency: f32) -> Self {
        Self {
            config,
            reference_frequency,
            stats: [PitchClassStats::default(); NUM_PITCH_CLASSES],
            front: 0,
            usual_suspects: 0,
        }
    }

    /// Fold one analysis window into the running state
    pub fn process(&mut self, extraction: &Extraction) -> FrameTuple {
        let rms = extraction.rms;
        let min_duration = self.config.min_duration;

        let mut active_mask: PitchMask = 0;

        // Harmonic evidence, debounced
        for pc in PitchClass::ALL {
            let energy = extraction.chroma[pc.index()];
            let stats = &mut self.stats[pc.index()];

            // `!(>=)` so that NaN energy counts as absent
            if !(energy >= self.config.detection_threshold) {
                stats.consecutive_active_frames = 0;
                continue;
            }

            stats.consecutive_active_frames = stats.consecutive_active_frames.saturating_add(1);
            let duration = stats.consecutive_active_frames;
            if duration < min_duration {
                continue;
            }

            active_mask |= pc.bit();
            if duration == min_duration {
                stats.harmonic_trigger_count += 1;
            }
            stats.max_gain = stats.max_gain.max(rms);
            stats.max_duration = stats.max_duration.max(duration);

            self.admit(pc);
        }

        let mut stimuli = self.front & active_mask;

        // Melodic evidence
        let mut mean_semitone = f32::NAN;
        if let Some(semitone) = self.melody_semitone(extraction) {
            let pc = PitchClass::from_semitone(semitone);
            let stats = &mut self.stats[pc.index()];

            active_mask |= pc.bit();
            stats.melodic_trigger_count += 1;
            stats.max_gain = stats.max_gain.max(rms);
            stats.max_duration = stats.max_duration.max(min_duration);

            self.admit(pc);
            mean_semitone = semitone;
        }

        stimuli |= self.front & active_mask;
        self.usual_suspects |= stimuli;
        self.age_usual_suspects(stimuli, active_mask);

        FrameTuple {
            usual_suspects: self.usual_suspects,
            active_mask,
            mean_semitone,
            rms,
        }
    }

    /// Semitone offset of the melody pitch above the reference, when it is trustworthy
    fn melody_semitone(&self, extraction: &Extraction) -> Option<f32> {
        let pitch = extraction.pitch_hz?;
        if !(pitch > 0.0 && pitch.is_finite()) {
            return None;
        }
        if !(extraction.pitch_confidence / extraction.rms > 1.0) {
            return None;
        }
        // Factor 4 lifts the estimate two octaves; only the fold matters
        Some(12.0 * (4.0 * pitch / self.reference_frequency).log2())
    }

    /// Dominance admission of `candidate` into the front
    ///
    /// Front members the candidate dominates are evicted; the candidate joins
    /// unless a remaining member dominates it.
    fn admit(&mut self, candidate: PitchClass) {
        let contender = &self.stats[candidate.index()];
        let mut front = self.front & !candidate.bit();
        let mut admitted = true;

        for member in pitch_classes(front) {
            match compare(contender, &self.stats[member.index()]) {
                Dominance::Dominates => front &= !member.bit(),
                Dominance::DominatedBy => admitted = false,
                Dominance::Equal | Dominance::Incomparable => {}
            }
        }

        if admitted {
            front |= candidate.bit();
        }
        self.front = front;
    }

    fn age_usual_suspects(&mut self, stimuli: PitchMask, active_mask: PitchMask) {
        for pc in pitch_classes(self.usual_suspects) {
            let stats = &mut self.stats[pc.index()];

            stats.age = if pc.is_in(stimuli) {
                0
            } else if pc.is_in(active_mask) {
                stats.age.saturating_sub(self.config.reactivation_step)
            } else {
                stats.age.saturating_add(self.config.inactive_step)
            };

            if stats.age >= self.config.expiry {
                self.usual_suspects &= !pc.bit();
            }
        }
    }

    /// Forget everything, as at session start
    pub fn reset(&mut self) {
        self.stats = [PitchClassStats::default(); NUM_PITCH_CLASSES];
        self.front = 0;
        self.usual_suspects = 0;
    }

    #[inline]
    pub fn stats(&self, pc: PitchClass) -> &PitchClassStats {
        &self.stats[pc.index()]
    }

    /// Current non-dominated set
    #[inline]
    pub fn front(&self) -> PitchMask {
        self.front
    }

    #[inline]
    pub fn usual_suspects(&self) -> PitchMask {
        self.usual_suspects
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
}
