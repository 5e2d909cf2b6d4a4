//! FFT chroma + YIN melody extractor
//!
//! - **Chroma**: Hann-windowed real FFT of the whole block. Every bin inside
//!   the analysed range adds its power to the nearest pitch class, and the
//!   vector is scaled so the strongest class is exactly 1.0.
//! - **Melody**: YIN over overlapping sub-frames of the block. The estimate is
//!   the mean over voiced sub-frames; the confidence is the mean of
//!   `1 - d'(τ)` at the chosen lag.
//!
//! Every buffer is allocated in [`SpectralExtractor::new`], so `extract` is
//! safe to call from the audio callback.

use std::f32::consts::PI;
use std::sync::Arc;

use realfft::num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};

use super::{rms, AnalysisError, Extraction, Extractor};
use crate::config::AnalysisConfig;
use crate::types::{PitchClass, NUM_PITCH_CLASSES};

/// Half a semitone as a frequency ratio, the tolerance at the range edges
const HALF_SEMITONE: f32 = 1.029_302_2;

/// Shortest lag the pitch search considers (sample-level aliasing below this)
const MIN_LAG_FLOOR: usize = 2;

pub struct SpectralExtractor {
    sample_rate: u32,
    block_size: usize,

    fft: Arc<dyn RealToComplex<f32>>,
    window: Vec<f32>,
    fft_input: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    /// Pitch class of each FFT bin, `None` outside the analysed range
    bin_classes: Vec<Option<PitchClass>>,

    pitch_frame: usize,
    pitch_hop: usize,
    /// Samples summed per lag in the difference function
    integration: usize,
    min_lag: usize,
    max_lag: usize,
    voicing_threshold: f32,
    /// Cumulative-mean-normalised difference, indexed by lag
    yin: Vec<f32>,
}

impl SpectralExtractor {
    pub fn new(config: &AnalysisConfig, sample_rate: u32) -> Result<Self, AnalysisError> {
        let block_size = config.block_size;
        let divisor = config.pitch_frame_divisor;
        if block_size == 0 || divisor == 0 || block_size % divisor != 0 {
            return Err(AnalysisError::InvalidBlockSize { block_size, divisor });
        }

        let lowest = config.lowest_frequency;
        let highest = config.highest_frequency();
        let nyquist = sample_rate as f32 / 2.0;
        if !(lowest > 0.0) || !(highest > lowest) || highest * HALF_SEMITONE >= nyquist {
            return Err(AnalysisError::InvalidFrequencyRange {
                lowest,
                highest,
                sample_rate,
            });
        }

        let pitch_frame = block_size / divisor;
        let min_lag = ((sample_rate as f32 / highest).floor() as usize).max(MIN_LAG_FLOOR);
        let max_lag = (sample_rate as f32 / lowest).ceil() as usize;
        // One extra lag of headroom for parabolic refinement
        let integration = pitch_frame.saturating_sub(max_lag + 1);
        if integration < max_lag {
            return Err(AnalysisError::PitchWindowTooShort {
                frame: pitch_frame,
                max_lag,
            });
        }

        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(block_size);
        let fft_input = fft.make_input_vec();
        let spectrum = fft.make_output_vec();
        let scratch = fft.make_scratch_vec();

        let window = (0..block_size)
            .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / block_size as f32).cos())
            .collect();

        let bin_hz = sample_rate as f32 / block_size as f32;
        let bin_classes = (0..spectrum.len())
            .map(|bin| {
                let freq = bin as f32 * bin_hz;
                if freq * HALF_SEMITONE < lowest || freq > highest * HALF_SEMITONE {
                    None
                } else {
                    Some(PitchClass::from_semitone(12.0 * (freq / lowest).log2()))
                }
            })
            .collect();

        log::debug!(
            "SpectralExtractor: {} samples @ {}Hz, {:.1}-{:.1}Hz, pitch frame {} (lags {}-{})",
            block_size,
            sample_rate,
            lowest,
            highest,
            pitch_frame,
            min_lag,
            max_lag
        );

        Ok(Self {
            sample_rate,
            block_size,
            fft,
            window,
            fft_input,
            spectrum,
            scratch,
            bin_classes,
            pitch_frame,
            pitch_hop: pitch_frame / 2,
            integration,
            min_lag,
            max_lag,
            voicing_threshold: config.voicing_threshold,
            yin: vec![0.0; max_lag + 2],
        })
    }

    /// Unit-max chroma of `block`, all zeros for silence
    fn chroma(&mut self, block: &[f32]) -> [f32; NUM_PITCH_CLASSES] {
        let mut chroma = [0.0; NUM_PITCH_CLASSES];

        // Shorter blocks are zero-padded to the planned length
        for (i, slot) in self.fft_input.iter_mut().enumerate() {
            *slot = block.get(i).map_or(0.0, |s| s * self.window[i]);
        }
        if self
            .fft
            .process_with_scratch(&mut self.fft_input, &mut self.spectrum, &mut self.scratch)
            .is_err()
        {
            // Buffer lengths are fixed at construction; nothing to report from the audio thread
            return chroma;
        }

        for (bin, value) in self.spectrum.iter().enumerate() {
            if let Some(pc) = self.bin_classes[bin] {
                chroma[pc.index()] += value.norm_sqr();
            }
        }

        let max = chroma.iter().copied().fold(0.0f32, f32::max);
        if max > 0.0 && max.is_finite() {
            for energy in chroma.iter_mut() {
                *energy /= max;
            }
        }
        chroma
    }

    /// Mean pitch and confidence over voiced sub-frames
    fn melody(&mut self, block: &[f32]) -> (Option<f32>, f32) {
        let mut pitch_sum = 0.0;
        let mut confidence_sum = 0.0;
        let mut voiced = 0usize;

        let mut start = 0;
        while start + self.pitch_frame <= block.len() {
            if let Some((pitch, confidence)) = self.yin_frame(&block[start..start + self.pitch_frame]) {
                pitch_sum += pitch;
                confidence_sum += confidence;
                voiced += 1;
            }
            start += self.pitch_hop;
        }

        if voiced == 0 {
            (None, 0.0)
        } else {
            (Some(pitch_sum / voiced as f32), confidence_sum / voiced as f32)
        }
    }

    /// YIN estimate of one sub-frame, `None` when unvoiced
    fn yin_frame(&mut self, frame: &[f32]) -> Option<(f32, f32)> {
        let w = self.integration;

        // Difference function with cumulative mean normalisation
        self.yin[0] = 1.0;
        let mut running_sum = 0.0;
        for tau in 1..=self.max_lag + 1 {
            let mut diff = 0.0;
            for i in 0..w {
                let delta = frame[i] - frame[i + tau];
                diff += delta * delta;
            }
            running_sum += diff;
            self.yin[tau] = if running_sum > 0.0 {
                diff * tau as f32 / running_sum
            } else {
                1.0
            };
        }

        // First dip under the threshold, followed down to its local minimum
        let mut tau = (self.min_lag..=self.max_lag).find(|&t| self.yin[t] < self.voicing_threshold)?;
        while tau < self.max_lag && self.yin[tau + 1] < self.yin[tau] {
            tau += 1;
        }

        let (y0, y1, y2) = (self.yin[tau - 1], self.yin[tau], self.yin[tau + 1]);
        let curvature = y0 - 2.0 * y1 + y2;
        let period = if curvature.abs() > f32::EPSILON {
            tau as f32 + (y0 - y2) / (2.0 * curvature)
        } else {
            tau as f32
        };

        let pitch = self.sample_rate as f32 / period;
        if !pitch.is_finite() || pitch <= 0.0 {
            return None;
        }
        Some((pitch, (1.0 - y1).clamp(0.0, 1.0)))
    }
}

impl Extractor for SpectralExtractor {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn extract(&mut self, block: &[f32]) -> Extraction {
        let block = &block[..block.len().min(self.block_size)];
        let chroma = self.chroma(block);
        let (pitch_hz, pitch_confidence) = self.melody(block);

        Extraction {
            chroma,
            pitch_hz,
            pitch_confidence,
            rms: rms(block),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 48000;

    fn sine(freq: f32, amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * PI * freq * i as f32 / SAMPLE_RATE as f32).sin())
            .collect()
    }

    fn extractor() -> SpectralExtractor {
        SpectralExtractor::new(&AnalysisConfig::default(), SAMPLE_RATE).unwrap()
    }

    #[test]
    fn test_sine_chroma_peaks_on_its_pitch_class() {
        let mut extractor = extractor();
        let block = sine(440.0, 0.5, extractor.block_size());

        let extraction = extractor.extract(&block);
        let a = 9;
        assert_eq!(extraction.chroma[a], 1.0);
        for (i, &energy) in extraction.chroma.iter().enumerate() {
            if i != a {
                assert!(energy < 0.1, "class {} has energy {}", i, energy);
            }
        }
        assert!((extraction.rms - 0.5 / 2f32.sqrt()).abs() < 0.01);
    }

    #[test]
    fn test_sine_pitch_estimate() {
        let mut extractor = extractor();
        let block = sine(220.0, 0.3, extractor.block_size());

        let extraction = extractor.extract(&block);
        let pitch = extraction.pitch_hz.expect("sine should be voiced");
        assert!((pitch - 220.0).abs() < 2.0, "estimated {}", pitch);
        assert!(extraction.pitch_confidence > 0.8);
    }

    #[test]
    fn test_silence_has_no_evidence() {
        let mut extractor = extractor();
        let extraction = extractor.extract(&vec![0.0; extractor.block_size()]);
        assert_eq!(extraction, Extraction::silence());
    }

    #[test]
    fn test_short_block_is_zero_padded() {
        let mut extractor = extractor();
        let block = sine(440.0, 0.5, extractor.block_size() / 2);

        let extraction = extractor.extract(&block);
        assert_eq!(extraction.chroma[9], 1.0);
        assert!(extraction.rms > 0.3);
    }

    #[test]
    fn test_default_config_fits_common_rates() {
        for rate in [44100, 48000] {
            assert!(SpectralExtractor::new(&AnalysisConfig::default(), rate).is_ok());
        }
        for rate in [88200, 96000, 192000] {
            assert!(matches!(
                SpectralExtractor::new(&AnalysisConfig::default(), rate),
                Err(AnalysisError::PitchWindowTooShort { frame: 2048, .. })
            ));
        }
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        let zero_block = AnalysisConfig {
            block_size: 0,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            SpectralExtractor::new(&zero_block, SAMPLE_RATE),
            Err(AnalysisError::InvalidBlockSize { .. })
        ));

        let above_nyquist = AnalysisConfig {
            lowest_frequency: 2000.0,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            SpectralExtractor::new(&above_nyquist, SAMPLE_RATE),
            Err(AnalysisError::InvalidFrequencyRange { .. })
        ));

        // 8192 / 4 samples cannot hold two periods of C2 at 96kHz
        assert!(matches!(
            SpectralExtractor::new(&AnalysisConfig::default(), 96000),
            Err(AnalysisError::PitchWindowTooShort { .. })
        ));
    }
}
