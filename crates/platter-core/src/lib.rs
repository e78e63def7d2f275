//! platter-core — a two-deck DJ mixing engine
//!
//! A realtime mixing pipeline: two independently controlled decks, each
//! with a fractional-rate playhead and a per-deck DSP chain (resonant
//! filter, 3-band EQ), blended by an equal-power crossfader into a clipped
//! master bus. Track loading and tempo analysis run off the audio thread;
//! control and status cross over lock-free.

pub mod analysis;
pub mod audio;
pub mod control;
pub mod cue;
pub mod dsp;
pub mod engine;
pub mod loader;
pub mod track;
pub mod types;

pub use types::*;
