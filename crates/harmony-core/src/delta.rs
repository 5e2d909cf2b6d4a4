//! Incremental bit-level change tracking
//!
//! A [`BitMaskDelta`] remembers the last value it saw and, on each update,
//! records which bits flipped and what they flipped to. Applying the delta
//! to some other value overwrites only those bits. This lets the UI merge
//! a stream of observations into state the user also edits (e.g. a manual
//! note selection) without clobbering bits the stream has no news about.

use crate::types::PitchMask;

/// Change tracker for one logical stream of bitmasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitMaskDelta {
    previous: PitchMask,
    mask: PitchMask,
    bits: PitchMask,
}

impl BitMaskDelta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking from a known value instead of zero
    pub fn with_start_value(start: PitchMask) -> Self {
        Self {
            previous: start,
            ..Self::default()
        }
    }

    /// Record the bits that changed since the previous update
    pub fn update(&mut self, current: PitchMask) -> &mut Self {
        self.mask = current ^ self.previous;
        self.bits = current & self.mask;
        self.previous = current;
        self
    }

    /// Overwrite the changed bit positions of `target`, keep all others
    #[inline]
    pub fn apply(&self, target: PitchMask) -> PitchMask {
        (target & !self.mask) | self.bits
    }

    /// Forget the stream history so the next session starts clean
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Bit positions that changed on the last update
    #[inline]
    pub fn mask(&self) -> PitchMask {
        self.mask
    }

    /// New values at the changed positions
    #[inline]
    pub fn bits(&self) -> PitchMask {
        self.bits
    }

    #[inline]
    pub fn previous(&self) -> PitchMask {
        self.previous
    }

    /// Whether the last update changed anything
    #[inline]
    pub fn has_changes(&self) -> bool {
        self.mask != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_overwrites_only_changed_bits() {
        let samples: [PitchMask; 6] = [
            0,
            0xFFF,
            0b1010_1010_1010,
            0b0000_1111_0000,
            0b1,
            0b1000_0000_0001,
        ];
        for &start in &samples {
            for &x in &samples {
                for &y in &samples {
                    let mut delta = BitMaskDelta::with_start_value(start);
                    delta.update(x);
                    let merged = delta.apply(y);
                    let changed = delta.mask();
                    assert_eq!(merged & !changed, y & !changed);
                    assert_eq!(merged & changed, x & changed);
                }
            }
        }
    }

    #[test]
    fn test_repeated_update_is_identity() {
        let mut delta = BitMaskDelta::new();
        delta.update(0b0101);
        delta.update(0b0101);
        assert!(!delta.has_changes());
        assert_eq!(delta.apply(0b1110_0000_0011), 0b1110_0000_0011);
    }

    #[test]
    fn test_preserves_user_edits_elsewhere() {
        let mut delta = BitMaskDelta::new();
        // Stream reports C and E
        let selection = delta.update(0b1_0001).apply(0);
        assert_eq!(selection, 0b1_0001);

        // User adds G by hand, stream drops E
        let selection = selection | (1 << 7);
        let selection = delta.update(0b1).apply(selection);
        assert_eq!(selection, 0b1000_0001);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut delta = BitMaskDelta::new();
        delta.update(0b111);
        delta.reset();
        assert_eq!(delta.previous(), 0);
        delta.update(0b111);
        assert_eq!(delta.mask(), 0b111);
        assert_eq!(delta.bits(), 0b111);
    }
}
