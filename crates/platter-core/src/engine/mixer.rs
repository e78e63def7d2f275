//! Mixer - combines both decks into the output stream
//!
//! Owned exclusively by the audio thread. Each callback: drain at most one
//! prepared deck from the load-completion queue, apply tempo sync, pull a
//! buffer from each deck, blend with equal-power crossfade gains, apply
//! master volume, and hard-clip. Nothing on this path blocks or allocates;
//! scratch buffers are pre-sized at construction.

use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;

use super::command::{EngineCommand, LoadedDeck};
use super::deck::Deck;
use super::shared::DeckShared;
use crate::types::{DeckId, MAX_BUFFER_SAMPLES, NUM_DECKS};

/// Equal-power crossfade gains `(gain_a, gain_b)` for a crossfader in
/// [-1, 1]: -1 is full deck A, +1 full deck B, 0 blends both at √2/2.
pub fn crossfade_gains(crossfader: f64) -> (f64, f64) {
    let normalized = (crossfader + 1.0) / 2.0;
    let angle = normalized * FRAC_PI_2;
    (angle.cos(), angle.sin())
}

/// The two-deck mixer.
pub struct Mixer {
    decks: [Deck; NUM_DECKS],
    /// Crossfader in [-1, 1].
    crossfader: f64,
    /// Master volume in [0, 1].
    master_volume: f64,
    sync_enabled: bool,
    sync_master: DeckId,
    /// Prepared decks from the decoder agent.
    completion_rx: rtrb::Consumer<LoadedDeck>,
    /// Per-deck scratch, pre-sized so `mix` never allocates.
    scratch: [Vec<f32>; NUM_DECKS],
}

impl Mixer {
    /// Create a mixer with two empty decks.
    ///
    /// `shared` are the per-slot state handles (also held by the control
    /// façade and the decoder agent); `dsp_rate` is the output stream's
    /// sample rate.
    pub fn new(
        shared: [Arc<DeckShared>; NUM_DECKS],
        completion_rx: rtrb::Consumer<LoadedDeck>,
        dsp_rate: f64,
    ) -> Self {
        let [shared_a, shared_b] = shared;
        Self {
            decks: [
                Deck::empty(shared_a, dsp_rate),
                Deck::empty(shared_b, dsp_rate),
            ],
            crossfader: 0.0,
            master_volume: 1.0,
            sync_enabled: false,
            sync_master: DeckId::A,
            completion_rx,
            scratch: std::array::from_fn(|_| Vec::with_capacity(MAX_BUFFER_SAMPLES)),
        }
    }

    pub fn deck(&self, id: DeckId) -> &Deck {
        &self.decks[id.index()]
    }

    fn deck_mut(&mut self, id: DeckId) -> &mut Deck {
        &mut self.decks[id.index()]
    }

    pub fn crossfader(&self) -> f64 {
        self.crossfader
    }

    pub fn master_volume(&self) -> f64 {
        self.master_volume
    }

    /// Apply all pending control commands, in send order.
    pub fn process_commands(&mut self, rx: &mut rtrb::Consumer<EngineCommand>) {
        while let Ok(command) = rx.pop() {
            match command {
                EngineCommand::Play { deck } => self.deck_mut(deck).play(),
                EngineCommand::Pause { deck } => self.deck_mut(deck).pause(),
                EngineCommand::Stop { deck } => self.deck_mut(deck).stop(),
                EngineCommand::Seek { deck, seconds } => self.deck_mut(deck).seek(seconds),
                EngineCommand::SetVolume { deck, volume } => {
                    self.deck_mut(deck).set_volume(volume)
                }
                EngineCommand::SetSpeed { deck, speed } => self.deck_mut(deck).set_speed(speed),
                EngineCommand::SetEq {
                    deck,
                    low,
                    mid,
                    high,
                } => self.deck_mut(deck).set_eq(low, mid, high),
                EngineCommand::SetFilter {
                    deck,
                    shape,
                    cutoff,
                    resonance,
                } => self.deck_mut(deck).configure_filter(shape, cutoff, resonance),
                EngineCommand::AddCue { deck, cue } => {
                    self.deck_mut(deck).add_cue(cue.name, cue.position, cue.color)
                }
                EngineCommand::JumpToCue { deck, index } => {
                    self.deck_mut(deck).jump_to_cue(index);
                }
                EngineCommand::SetLoop { deck, start, end } => {
                    self.deck_mut(deck).set_loop(start, end)
                }
                EngineCommand::EnableLoop { deck, enabled } => {
                    self.deck_mut(deck).enable_loop(enabled)
                }
                EngineCommand::SetCrossfader(value) => {
                    self.crossfader = value.clamp(-1.0, 1.0);
                }
                EngineCommand::SetMasterVolume(volume) => {
                    self.master_volume = volume.clamp(0.0, 1.0);
                }
                EngineCommand::SetSync { enabled, master } => {
                    self.sync_enabled = enabled;
                    self.sync_master = master;
                }
            }
        }
    }

    /// Fill `out` (interleaved stereo) with the next mixed buffer.
    pub fn mix(&mut self, out: &mut [f32]) {
        // At most one deck swap per callback; pop is wait-free.
        if let Ok(loaded) = self.completion_rx.pop() {
            self.swap_deck(loaded);
        }

        if self.sync_enabled {
            self.apply_sync();
        }

        let len = out.len();
        debug_assert!(len <= MAX_BUFFER_SAMPLES, "output buffer exceeds scratch capacity");
        for buffer in &mut self.scratch {
            buffer.resize(len, 0.0);
        }

        for i in 0..NUM_DECKS {
            self.decks[i].read(&mut self.scratch[i]);
        }

        let (gain_a, gain_b) = crossfade_gains(self.crossfader);
        let master = self.master_volume;
        for (i, slot) in out.iter_mut().enumerate() {
            let mixed =
                self.scratch[0][i] as f64 * gain_a + self.scratch[1][i] as f64 * gain_b;
            *slot = (mixed * master).clamp(-1.0, 1.0) as f32;
        }
    }

    /// Replace a deck with a freshly prepared one. The superseded deck is
    /// dropped here; its sample buffer free is deferred to the collector.
    fn swap_deck(&mut self, loaded: LoadedDeck) {
        // Logging is not RT-safe; swaps happen at file-load cadence.
        log::debug!("swapping in new track on deck {}", loaded.slot);
        let slot = loaded.slot.index();
        self.decks[slot].stop();
        self.decks[slot] = *loaded.deck;
    }

    /// Match the slave deck's speed to the master's tempo. Skipped until
    /// both decks have a published estimate.
    fn apply_sync(&mut self) {
        let (master, slave) = match self.sync_master {
            DeckId::A => (0, 1),
            DeckId::B => (1, 0),
        };

        let master_bpm = self.decks[master].shared().bpm();
        let slave_bpm = self.decks[slave].shared().bpm();
        if master_bpm == 0.0 || slave_bpm == 0.0 {
            return;
        }

        self.decks[slave].set_speed(master_bpm / slave_bpm);
    }
}
