//! Control-side state mirror and the status snapshot
//!
//! The audio thread owns the decks, so the façade keeps a mirror of the
//! slow-changing descriptive state it has sent (knob values, cue list,
//! loop settings, file path) and merges it with the live per-slot atomics
//! when a snapshot is requested. The mirror is written only by control
//! threads and the decoder agent; the audio thread never touches it.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use crate::cue::CuePoint;
use crate::dsp::FilterShape;
use crate::engine::DeckShared;
use crate::types::{DeckId, NUM_DECKS};

/// Mirrored descriptive state for one deck slot.
#[derive(Debug, Clone)]
pub(crate) struct DeckMirror {
    pub path: Option<PathBuf>,
    pub volume: f64,
    pub speed: f64,
    pub eq_low: f64,
    pub eq_mid: f64,
    pub eq_high: f64,
    pub filter_shape: FilterShape,
    pub filter_cutoff: f64,
    pub filter_resonance: f64,
    pub cues: Vec<CuePoint>,
    pub loop_enabled: bool,
    pub loop_start: f64,
    pub loop_end: f64,
}

impl Default for DeckMirror {
    fn default() -> Self {
        Self {
            path: None,
            volume: 1.0,
            speed: 1.0,
            eq_low: 0.0,
            eq_mid: 0.0,
            eq_high: 0.0,
            filter_shape: FilterShape::None,
            filter_cutoff: 0.5,
            filter_resonance: 0.0,
            cues: Vec::new(),
            loop_enabled: false,
            loop_start: 0.0,
            loop_end: 0.0,
        }
    }
}

/// Mirrored mixer-level state.
#[derive(Debug, Clone)]
struct MixerMirror {
    crossfader: f64,
    master_volume: f64,
    sync_enabled: bool,
    sync_master: DeckId,
}

impl Default for MixerMirror {
    fn default() -> Self {
        Self {
            crossfader: 0.0,
            master_volume: 1.0,
            sync_enabled: false,
            sync_master: DeckId::A,
        }
    }
}

/// The façade's mirror of everything a snapshot needs.
#[derive(Debug, Default)]
pub struct StatusBoard {
    decks: [RwLock<DeckMirror>; NUM_DECKS],
    mixer: RwLock<MixerMirror>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_deck(&self, slot: DeckId, update: impl FnOnce(&mut DeckMirror)) {
        let mut mirror = self.decks[slot.index()]
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        update(&mut mirror);
    }

    fn with_mixer(&self, update: impl FnOnce(&mut MixerMirror)) {
        let mut mirror = self.mixer.write().unwrap_or_else(PoisonError::into_inner);
        update(&mut mirror);
    }

    /// New track landed on a slot: fresh descriptive state, keep the path.
    pub fn on_track_loaded(&self, slot: DeckId, path: PathBuf) {
        self.with_deck(slot, |deck| {
            *deck = DeckMirror {
                path: Some(path),
                ..DeckMirror::default()
            };
        });
    }

    pub(crate) fn set_volume(&self, slot: DeckId, volume: f64) {
        self.with_deck(slot, |deck| deck.volume = volume);
    }

    pub(crate) fn set_speed(&self, slot: DeckId, speed: f64) {
        self.with_deck(slot, |deck| deck.speed = speed);
    }

    pub(crate) fn set_eq(&self, slot: DeckId, low: f64, mid: f64, high: f64) {
        self.with_deck(slot, |deck| {
            deck.eq_low = low;
            deck.eq_mid = mid;
            deck.eq_high = high;
        });
    }

    pub(crate) fn set_filter(&self, slot: DeckId, shape: FilterShape, cutoff: f64, resonance: f64) {
        self.with_deck(slot, |deck| {
            deck.filter_shape = shape;
            // disengaging keeps the knob values, matching the engine
            if shape != FilterShape::None {
                deck.filter_cutoff = cutoff;
                deck.filter_resonance = resonance;
            }
        });
    }

    pub(crate) fn add_cue(&self, slot: DeckId, cue: CuePoint) {
        self.with_deck(slot, |deck| deck.cues.push(cue));
    }

    pub(crate) fn set_loop(&self, slot: DeckId, start: f64, end: f64) {
        if start >= end {
            return;
        }
        self.with_deck(slot, |deck| {
            deck.loop_start = start;
            deck.loop_end = end;
            deck.loop_enabled = true;
        });
    }

    pub(crate) fn enable_loop(&self, slot: DeckId, enabled: bool) {
        self.with_deck(slot, |deck| deck.loop_enabled = enabled);
    }

    pub(crate) fn set_crossfader(&self, value: f64) {
        self.with_mixer(|mixer| mixer.crossfader = value);
    }

    pub(crate) fn set_master_volume(&self, volume: f64) {
        self.with_mixer(|mixer| mixer.master_volume = volume);
    }

    pub(crate) fn set_sync(&self, enabled: bool, master: DeckId) {
        self.with_mixer(|mixer| {
            mixer.sync_enabled = enabled;
            mixer.sync_master = master;
        });
    }

    /// Build a full snapshot from the mirror plus the live atomics.
    pub fn snapshot(&self, shared: &[Arc<DeckShared>; NUM_DECKS]) -> EngineStatus {
        let deck = |slot: DeckId| {
            let mirror = self.decks[slot.index()]
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            let live = &shared[slot.index()];
            DeckStatus {
                file: mirror.path,
                is_playing: live.is_playing(),
                position_seconds: live.position_secs(),
                duration_seconds: live.duration_secs(),
                volume: mirror.volume,
                speed: mirror.speed,
                bpm: live.bpm(),
                bpm_confidence: live.bpm_confidence(),
                eq: EqStatus {
                    low: mirror.eq_low,
                    mid: mirror.eq_mid,
                    high: mirror.eq_high,
                },
                filter: FilterStatus {
                    shape: mirror.filter_shape,
                    cutoff: mirror.filter_cutoff,
                    resonance: mirror.filter_resonance,
                },
                cue_points: mirror.cues,
                loop_status: LoopStatus {
                    enabled: mirror.loop_enabled,
                    start: mirror.loop_start,
                    end: mirror.loop_end,
                    is_active: live.loop_active(),
                },
            }
        };

        let mixer = self
            .mixer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        EngineStatus {
            deck_a: deck(DeckId::A),
            deck_b: deck(DeckId::B),
            crossfader: mixer.crossfader,
            master_volume: mixer.master_volume,
            sync_enabled: mixer.sync_enabled,
            sync_master: mixer.sync_master,
        }
    }
}

/// Snapshot of the whole engine, serializable for the control surface.
#[derive(Debug, Clone, serde::Serialize)]
pub struct EngineStatus {
    pub deck_a: DeckStatus,
    pub deck_b: DeckStatus,
    pub crossfader: f64,
    pub master_volume: f64,
    pub sync_enabled: bool,
    pub sync_master: DeckId,
}

/// Snapshot of one deck.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DeckStatus {
    pub file: Option<PathBuf>,
    pub is_playing: bool,
    pub position_seconds: f64,
    pub duration_seconds: f64,
    pub volume: f64,
    pub speed: f64,
    pub bpm: f64,
    pub bpm_confidence: f64,
    pub eq: EqStatus,
    pub filter: FilterStatus,
    pub cue_points: Vec<CuePoint>,
    #[serde(rename = "loop")]
    pub loop_status: LoopStatus,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct EqStatus {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct FilterStatus {
    #[serde(rename = "type")]
    pub shape: FilterShape,
    pub cutoff: f64,
    pub resonance: f64,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct LoopStatus {
    pub enabled: bool,
    pub start: f64,
    pub end: f64,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_a_fresh_deck() {
        let board = StatusBoard::new();
        let shared = DeckShared::per_slot();
        let status = board.snapshot(&shared);

        assert!(status.deck_a.file.is_none());
        assert!(!status.deck_a.is_playing);
        assert_eq!(status.deck_a.volume, 1.0);
        assert_eq!(status.deck_a.speed, 1.0);
        assert_eq!(status.deck_a.filter.cutoff, 0.5);
        assert_eq!(status.crossfader, 0.0);
        assert_eq!(status.master_volume, 1.0);
    }

    #[test]
    fn track_load_resets_the_mirror() {
        let board = StatusBoard::new();
        let shared = DeckShared::per_slot();

        board.set_volume(DeckId::A, 0.2);
        board.set_eq(DeckId::A, 0.5, -0.5, 1.0);
        board.add_cue(
            DeckId::A,
            CuePoint {
                name: "x".into(),
                position: 3.0,
                color: "#000000".into(),
            },
        );

        board.on_track_loaded(DeckId::A, PathBuf::from("/music/track.wav"));
        let status = board.snapshot(&shared);
        assert_eq!(status.deck_a.file, Some(PathBuf::from("/music/track.wav")));
        assert_eq!(status.deck_a.volume, 1.0);
        assert_eq!(status.deck_a.eq.low, 0.0);
        assert!(status.deck_a.cue_points.is_empty());
    }

    #[test]
    fn invalid_loop_is_ignored_by_the_mirror() {
        let board = StatusBoard::new();
        let shared = DeckShared::per_slot();
        board.set_loop(DeckId::B, 4.0, 2.0);
        let status = board.snapshot(&shared);
        assert!(!status.deck_b.loop_status.enabled);
    }

    #[test]
    fn snapshot_merges_live_atomics() {
        let board = StatusBoard::new();
        let shared = DeckShared::per_slot();
        shared[1].set_playing(true);
        shared[1].set_position_secs(42.5);
        shared[1].set_bpm(128.0, 0.8);

        let status = board.snapshot(&shared);
        assert!(status.deck_b.is_playing);
        assert_eq!(status.deck_b.position_seconds, 42.5);
        assert_eq!(status.deck_b.bpm, 128.0);
    }

    #[test]
    fn snapshot_serializes() {
        let board = StatusBoard::new();
        let shared = DeckShared::per_slot();
        let json = serde_json::to_value(board.snapshot(&shared)).unwrap();
        assert_eq!(json["deck_a"]["filter"]["type"], "none");
        assert_eq!(json["sync_master"], "a");
        assert!(json["deck_b"]["loop"]["enabled"].is_boolean());
    }
}
