//! Per-deck resonant filter, switchable between low-pass and high-pass
//!
//! Cutoff is a normalized knob in [0, 1] swept linearly across 20 Hz to
//! 20 kHz; resonance in [0, 1] maps to Q in [1, 10]. Output is hard-clipped
//! after the biquad so high resonance cannot push samples past full scale.

use super::biquad::{BiquadCoeffs, BiquadState};

/// Low end of the cutoff sweep.
const MIN_FREQ: f64 = 20.0;
/// High end of the cutoff sweep.
const MAX_FREQ: f64 = 20_000.0;

/// Filter shape selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterShape {
    #[default]
    None,
    LowPass,
    HighPass,
}

/// Resonant biquad filter over an interleaved stereo stream.
#[derive(Debug)]
pub struct Filter {
    shape: FilterShape,
    cutoff: f64,
    resonance: f64,
    coeffs: Option<BiquadCoeffs>,
    state: BiquadState,
    sample_rate: f64,
}

impl Filter {
    /// Create a disengaged filter for the given sample rate.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            shape: FilterShape::None,
            cutoff: 0.5,
            resonance: 0.0,
            coeffs: None,
            state: BiquadState::default(),
            sample_rate,
        }
    }

    /// Select a shape and set cutoff/resonance (both clamped to [0, 1]).
    ///
    /// Selecting `None` behaves like [`reset`](Self::reset). Switching
    /// between low-pass and high-pass keeps the delay taps; the residual
    /// click is an accepted trade-off.
    pub fn configure(&mut self, shape: FilterShape, cutoff: f64, resonance: f64) {
        if shape == FilterShape::None {
            self.reset();
            return;
        }

        self.shape = shape;
        self.cutoff = cutoff.clamp(0.0, 1.0);
        self.resonance = resonance.clamp(0.0, 1.0);

        let freq = MIN_FREQ + (MAX_FREQ - MIN_FREQ) * self.cutoff;
        let q = 1.0 + 9.0 * self.resonance;
        self.coeffs = Some(if shape == FilterShape::LowPass {
            BiquadCoeffs::low_pass(freq, q, self.sample_rate)
        } else {
            BiquadCoeffs::high_pass(freq, q, self.sample_rate)
        });
    }

    /// Disengage the filter and zero the delay taps.
    pub fn reset(&mut self) {
        self.shape = FilterShape::None;
        self.coeffs = None;
        self.state.reset();
    }

    /// Current (shape, cutoff, resonance).
    pub fn settings(&self) -> (FilterShape, f64, f64) {
        (self.shape, self.cutoff, self.resonance)
    }

    /// Run the filter over an interleaved stereo buffer in place.
    pub fn process(&mut self, samples: &mut [f32]) {
        let Some(coeffs) = &self.coeffs else {
            return;
        };

        for frame in samples.chunks_mut(2) {
            for (channel, sample) in frame.iter_mut().enumerate() {
                let y = self.state.process(channel, *sample as f64, coeffs);
                *sample = y.clamp(-1.0, 1.0) as f32;
            }
        }
    }
}
