//! Three-band EQ: low shelf, peaking mid, high shelf in series
//!
//! Band settings are bipolar knobs in [-1, 1] mapping to ±12 dB. A setting
//! of exactly 0 bypasses that band entirely (identity, taps frozen), so a
//! flat EQ adds no coloration and no CPU cost.

use super::biquad::{BiquadCoeffs, BiquadState};

/// Low shelf center frequency.
const LOW_SHELF_HZ: f64 = 100.0;
/// Peaking mid center frequency.
const PEAK_HZ: f64 = 1000.0;
/// Peaking mid bandwidth.
const PEAK_Q: f64 = 1.0;
/// High shelf center frequency.
const HIGH_SHELF_HZ: f64 = 10_000.0;
/// Full-scale knob deflection in dB.
const BAND_RANGE_DB: f64 = 12.0;

/// Convert a knob setting in [-1, 1] to a linear gain.
fn setting_to_gain(setting: f64) -> f64 {
    10f64.powf(setting * BAND_RANGE_DB / 20.0)
}

/// 3-band equalizer over an interleaved stereo stream.
///
/// Coefficients are cached per band and recomputed only when the band
/// setting changes; the per-sample path is pure multiply-adds.
#[derive(Debug, Default)]
pub struct ThreeBandEq {
    low: f64,
    mid: f64,
    high: f64,

    low_coeffs: Option<BiquadCoeffs>,
    mid_coeffs: Option<BiquadCoeffs>,
    high_coeffs: Option<BiquadCoeffs>,

    low_state: BiquadState,
    mid_state: BiquadState,
    high_state: BiquadState,

    sample_rate: f64,
}

impl ThreeBandEq {
    /// Create a flat EQ for the given sample rate.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    /// Set the low band in [-1, 1] (clamped).
    pub fn set_low(&mut self, setting: f64) {
        self.low = setting.clamp(-1.0, 1.0);
        self.low_coeffs = (self.low != 0.0).then(|| {
            BiquadCoeffs::low_shelf(LOW_SHELF_HZ, setting_to_gain(self.low), self.sample_rate)
        });
    }

    /// Set the mid band in [-1, 1] (clamped).
    pub fn set_mid(&mut self, setting: f64) {
        self.mid = setting.clamp(-1.0, 1.0);
        self.mid_coeffs = (self.mid != 0.0).then(|| {
            BiquadCoeffs::peaking(PEAK_HZ, setting_to_gain(self.mid), PEAK_Q, self.sample_rate)
        });
    }

    /// Set the high band in [-1, 1] (clamped).
    pub fn set_high(&mut self, setting: f64) {
        self.high = setting.clamp(-1.0, 1.0);
        self.high_coeffs = (self.high != 0.0).then(|| {
            BiquadCoeffs::high_shelf(HIGH_SHELF_HZ, setting_to_gain(self.high), self.sample_rate)
        });
    }

    /// Current band settings (low, mid, high).
    pub fn settings(&self) -> (f64, f64, f64) {
        (self.low, self.mid, self.high)
    }

    /// Run the EQ over an interleaved stereo buffer in place.
    pub fn process(&mut self, samples: &mut [f32]) {
        if self.low_coeffs.is_none() && self.mid_coeffs.is_none() && self.high_coeffs.is_none() {
            return;
        }

        for frame in samples.chunks_mut(2) {
            for (channel, sample) in frame.iter_mut().enumerate() {
                let mut x = *sample as f64;
                if let Some(c) = &self.low_coeffs {
                    x = self.low_state.process(channel, x, c);
                }
                if let Some(c) = &self.mid_coeffs {
                    x = self.mid_state.process(channel, x, c);
                }
                if let Some(c) = &self.high_coeffs {
                    x = self.high_state.process(channel, x, c);
                }
                *sample = x as f32;
            }
        }
    }
}
