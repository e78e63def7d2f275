//! Offline track analysis (tempo estimation)

mod bpm;

pub use bpm::{analyze, BpmEstimate};
