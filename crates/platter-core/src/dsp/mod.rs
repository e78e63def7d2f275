//! Per-deck DSP chain: biquad primitive, 3-band EQ, resonant filter

mod biquad;
mod eq;
mod filter;

pub use biquad::{BiquadCoeffs, BiquadState};
pub use eq::ThreeBandEq;
pub use filter::{Filter, FilterShape};
