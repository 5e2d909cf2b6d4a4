//! Common types for Harmony
//!
//! This module contains the fundamental value types that flow from the audio
//! thread to the UI: pitch classes, 12-bit pitch-class masks, and the frame
//! tuple that describes one analysis window.

/// Number of pitch classes (chromatic notes folded to one octave)
pub const NUM_PITCH_CLASSES: usize = 12;

/// Mask covering all twelve pitch-class bits
pub const PITCH_MASK_ALL: PitchMask = (1 << NUM_PITCH_CLASSES) - 1;

/// Number of floats in one encoded [`FrameTuple`]
pub const FRAME_WIDTH: usize = 4;

/// Set of pitch classes, bit `i` = pitch class `i` (bit 0 = C)
pub type PitchMask = u32;

/// Encoded frame as it sits in a transport slot
pub type WireFrame = [f32; FRAME_WIDTH];

/// Octave-folded identity of a chromatic note (0=C, 1=C#, ..., 11=B)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PitchClass(u8);

impl PitchClass {
    /// All pitch classes in ascending order
    pub const ALL: [PitchClass; NUM_PITCH_CLASSES] = [
        PitchClass(0),
        PitchClass(1),
        PitchClass(2),
        PitchClass(3),
        PitchClass(4),
        PitchClass(5),
        PitchClass(6),
        PitchClass(7),
        PitchClass(8),
        PitchClass(9),
        PitchClass(10),
        PitchClass(11),
    ];

    /// Convert from index (0-11) to PitchClass
    pub fn from_index(idx: usize) -> Option<Self> {
        if idx < NUM_PITCH_CLASSES {
            Some(Self(idx as u8))
        } else {
            None
        }
    }

    /// Fold a (possibly negative, possibly fractional) semitone offset
    /// to the nearest pitch class
    pub fn from_semitone(semitone: f32) -> Self {
        let rounded = semitone.round() as i32;
        Self(rounded.rem_euclid(NUM_PITCH_CLASSES as i32) as u8)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Single-bit mask for this pitch class
    #[inline]
    pub fn bit(self) -> PitchMask {
        1 << self.0
    }

    /// Whether this pitch class is a member of `mask`
    #[inline]
    pub fn is_in(self, mask: PitchMask) -> bool {
        mask & self.bit() != 0
    }
}

/// Iterate the pitch classes set in `mask`, ascending
pub fn pitch_classes(mask: PitchMask) -> impl Iterator<Item = PitchClass> {
    PitchClass::ALL.into_iter().filter(move |pc| pc.is_in(mask))
}

/// Conclusions of one analysis window
///
/// Immutable value copy: this is the only thing that crosses from the
/// audio thread to the consumer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTuple {
    /// Sticky set of plausible pitch classes that have not expired
    pub usual_suspects: PitchMask,
    /// Pitch classes with confirmed evidence in this window
    pub active_mask: PitchMask,
    /// Melody pitch as a semitone offset from the reference note, NaN when unvoiced
    pub mean_semitone: f32,
    /// RMS level of the analysed block
    pub rms: f32,
}

impl FrameTuple {
    /// Index of each field in the wire layout
    pub const USUAL_SUSPECTS: usize = 0;
    pub const ACTIVE_MASK: usize = 1;
    pub const MEAN_SEMITONE: usize = 2;
    pub const RMS: usize = 3;

    /// Frame carrying no evidence
    pub fn silent() -> Self {
        Self {
            usual_suspects: 0,
            active_mask: 0,
            mean_semitone: f32::NAN,
            rms: 0.0,
        }
    }

    /// Melody pitch class, if the window was voiced
    pub fn melody_pitch_class(&self) -> Option<PitchClass> {
        if self.mean_semitone.is_nan() {
            None
        } else {
            Some(PitchClass::from_semitone(self.mean_semitone))
        }
    }

    /// Encode as four contiguous floats
    ///
    /// Masks are 12-bit integers and therefore exactly representable in f32.
    pub fn to_wire(&self) -> WireFrame {
        let mut wire = [0.0; FRAME_WIDTH];
        wire[Self::USUAL_SUSPECTS] = (self.usual_suspects & PITCH_MASK_ALL) as f32;
        wire[Self::ACTIVE_MASK] = (self.active_mask & PITCH_MASK_ALL) as f32;
        wire[Self::MEAN_SEMITONE] = self.mean_semitone;
        wire[Self::RMS] = self.rms;
        wire
    }

    /// Decode four contiguous floats
    pub fn from_wire(wire: &WireFrame) -> Self {
        Self {
            usual_suspects: wire_mask(wire[Self::USUAL_SUSPECTS]),
            active_mask: wire_mask(wire[Self::ACTIVE_MASK]),
            mean_semitone: wire[Self::MEAN_SEMITONE],
            rms: wire[Self::RMS],
        }
    }
}

impl Default for FrameTuple {
    fn default() -> Self {
        Self::silent()
    }
}

#[inline]
fn wire_mask(value: f32) -> PitchMask {
    // NaN and negatives saturate to 0 in `as` casts
    (value as u32) & PITCH_MASK_ALL
}
