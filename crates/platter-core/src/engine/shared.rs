//! Lock-free published deck state
//!
//! One `DeckShared` exists per deck slot, created at engine construction
//! and outliving every deck swap. The audio thread stores into it after
//! each read; control threads and the analysis step load from it without
//! taking any lock. Floats travel as bit patterns in `AtomicU64`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::types::NUM_DECKS;

/// Relaxed-atomic view of one deck slot.
#[derive(Debug, Default)]
pub struct DeckShared {
    position_secs: AtomicU64,
    duration_secs: AtomicU64,
    playing: AtomicBool,
    loop_active: AtomicBool,
    bpm: AtomicU64,
    bpm_confidence: AtomicU64,
}

#[inline]
fn store_f64(cell: &AtomicU64, value: f64) {
    cell.store(value.to_bits(), Ordering::Relaxed);
}

#[inline]
fn load_f64(cell: &AtomicU64) -> f64 {
    f64::from_bits(cell.load(Ordering::Relaxed))
}

impl DeckShared {
    pub fn new() -> Self {
        Self::default()
    }

    /// One handle per deck slot.
    pub fn per_slot() -> [Arc<DeckShared>; NUM_DECKS] {
        std::array::from_fn(|_| Arc::new(DeckShared::new()))
    }

    pub fn set_position_secs(&self, secs: f64) {
        store_f64(&self.position_secs, secs);
    }

    pub fn position_secs(&self) -> f64 {
        load_f64(&self.position_secs)
    }

    pub fn set_duration_secs(&self, secs: f64) {
        store_f64(&self.duration_secs, secs);
    }

    pub fn duration_secs(&self) -> f64 {
        load_f64(&self.duration_secs)
    }

    pub fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::Relaxed);
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }

    pub fn set_loop_active(&self, active: bool) {
        self.loop_active.store(active, Ordering::Relaxed);
    }

    pub fn loop_active(&self) -> bool {
        self.loop_active.load(Ordering::Relaxed)
    }

    /// Publish a tempo estimate (analysis step) or clear it (deck swap).
    pub fn set_bpm(&self, bpm: f64, confidence: f64) {
        store_f64(&self.bpm, bpm);
        store_f64(&self.bpm_confidence, confidence);
    }

    pub fn bpm(&self) -> f64 {
        load_f64(&self.bpm)
    }

    pub fn bpm_confidence(&self) -> f64 {
        load_f64(&self.bpm_confidence)
    }
}
