//! Thread-safe control façade
//!
//! `EngineHandle` is the entry point the control surface talks to: one
//! method per operation, every setter clamps, and every call is safe
//! concurrently with the audio callback. Mutations become commands on the
//! lock-free queue; loads go to the decoder agent; `status()` assembles a
//! snapshot from the mirror and the live atomics.

mod status;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

use crate::cue::CuePoint;
use crate::dsp::FilterShape;
use crate::engine::{
    command_channel, completion_channel, CueRequest, DeckShared, EngineCommand, EngineCore, Mixer,
};
use crate::loader::LoadWorker;
use crate::types::{DeckId, NUM_DECKS};

pub use status::{DeckStatus, EngineStatus, EqStatus, FilterStatus, LoopStatus, StatusBoard};

/// Errors surfaced synchronously on the control path.
///
/// Decode failures are asynchronous by design: the deck simply never
/// updates, which subsequent snapshots make visible.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("load queue full, retry later")]
    QueueFull,

    #[error("engine is shut down")]
    Disconnected,
}

/// Build the engine: per-slot shared state, command and completion queues,
/// the decoder agent, and the mixer.
///
/// Returns the audio-thread bundle (hand it to the output callback, or
/// drive [`EngineCore::render`] directly in tests) and the control façade.
pub fn start_engine(sample_rate: u32) -> (EngineCore, EngineHandle) {
    let shared = DeckShared::per_slot();
    let board = Arc::new(StatusBoard::new());
    let (command_tx, command_rx) = command_channel();
    let (completion_tx, completion_rx) = completion_channel();

    let loader = LoadWorker::spawn(
        completion_tx,
        [shared[0].clone(), shared[1].clone()],
        board.clone(),
        sample_rate as f64,
    );
    let mixer = Mixer::new(
        [shared[0].clone(), shared[1].clone()],
        completion_rx,
        sample_rate as f64,
    );

    let core = EngineCore::new(mixer, command_rx);
    let handle = EngineHandle {
        commands: Mutex::new(command_tx),
        loader,
        board,
        shared,
    };
    (core, handle)
}

/// Thread-safe command entry points for the external control surface.
pub struct EngineHandle {
    commands: Mutex<rtrb::Producer<EngineCommand>>,
    loader: LoadWorker,
    board: Arc<StatusBoard>,
    shared: [Arc<DeckShared>; NUM_DECKS],
}

impl EngineHandle {
    fn send(&self, command: EngineCommand) {
        let mut producer = self.commands.lock().unwrap_or_else(PoisonError::into_inner);
        if producer.push(command).is_err() {
            // 256 queued commands means the audio thread is gone or wedged;
            // dropping is the only non-blocking option left
            log::warn!("command queue full, dropping command");
        }
    }

    /// Enqueue an asynchronous track load. Returns once the request is
    /// queued; the swap happens on a later mix callback.
    pub fn load(&self, deck: DeckId, path: impl Into<PathBuf>) -> Result<(), ControlError> {
        let path = path.into();
        if !path.is_file() {
            return Err(ControlError::FileNotFound(path));
        }
        self.loader.request(deck, path).map_err(|e| match e {
            flume::TrySendError::Full(_) => ControlError::QueueFull,
            flume::TrySendError::Disconnected(_) => ControlError::Disconnected,
        })
    }

    pub fn play(&self, deck: DeckId) {
        self.send(EngineCommand::Play { deck });
    }

    pub fn pause(&self, deck: DeckId) {
        self.send(EngineCommand::Pause { deck });
    }

    pub fn stop(&self, deck: DeckId) {
        self.send(EngineCommand::Stop { deck });
    }

    pub fn seek(&self, deck: DeckId, seconds: f64) {
        self.send(EngineCommand::Seek { deck, seconds });
    }

    pub fn set_volume(&self, deck: DeckId, volume: f64) {
        let volume = volume.clamp(0.0, 1.0);
        self.board.set_volume(deck, volume);
        self.send(EngineCommand::SetVolume { deck, volume });
    }

    pub fn set_speed(&self, deck: DeckId, speed: f64) {
        let speed = speed.clamp(0.5, 2.0);
        self.board.set_speed(deck, speed);
        self.send(EngineCommand::SetSpeed { deck, speed });
    }

    pub fn set_eq(&self, deck: DeckId, low: f64, mid: f64, high: f64) {
        let low = low.clamp(-1.0, 1.0);
        let mid = mid.clamp(-1.0, 1.0);
        let high = high.clamp(-1.0, 1.0);
        self.board.set_eq(deck, low, mid, high);
        self.send(EngineCommand::SetEq {
            deck,
            low,
            mid,
            high,
        });
    }

    pub fn set_filter(&self, deck: DeckId, shape: FilterShape, cutoff: f64, resonance: f64) {
        let cutoff = cutoff.clamp(0.0, 1.0);
        let resonance = resonance.clamp(0.0, 1.0);
        self.board.set_filter(deck, shape, cutoff, resonance);
        self.send(EngineCommand::SetFilter {
            deck,
            shape,
            cutoff,
            resonance,
        });
    }

    /// Add a cue marker at the deck's current position.
    pub fn add_cue(&self, deck: DeckId, name: impl Into<String>, color: impl Into<String>) {
        let name = name.into();
        let color = color.into();
        // capture the position once so the engine and the mirror agree
        let position = self.shared[deck.index()].position_secs();
        self.board.add_cue(
            deck,
            CuePoint {
                name: name.clone(),
                position,
                color: color.clone(),
            },
        );
        self.send(EngineCommand::AddCue {
            deck,
            cue: Box::new(CueRequest {
                name,
                position,
                color,
            }),
        });
    }

    pub fn jump_to_cue(&self, deck: DeckId, index: usize) {
        self.send(EngineCommand::JumpToCue { deck, index });
    }

    /// Configure the loop region; `start >= end` is ignored.
    pub fn set_loop(&self, deck: DeckId, start: f64, end: f64) {
        self.board.set_loop(deck, start, end);
        self.send(EngineCommand::SetLoop { deck, start, end });
    }

    /// Enable (and arm) or disable the loop.
    pub fn enable_loop(&self, deck: DeckId, enabled: bool) {
        self.board.enable_loop(deck, enabled);
        self.send(EngineCommand::EnableLoop { deck, enabled });
    }

    pub fn set_crossfader(&self, value: f64) {
        let value = value.clamp(-1.0, 1.0);
        self.board.set_crossfader(value);
        self.send(EngineCommand::SetCrossfader(value));
    }

    pub fn set_master_volume(&self, volume: f64) {
        let volume = volume.clamp(0.0, 1.0);
        self.board.set_master_volume(volume);
        self.send(EngineCommand::SetMasterVolume(volume));
    }

    pub fn set_sync(&self, enabled: bool, master: DeckId) {
        self.board.set_sync(enabled, master);
        self.send(EngineCommand::SetSync { enabled, master });
    }

    /// Full engine snapshot.
    pub fn status(&self) -> EngineStatus {
        self.board.snapshot(&self.shared)
    }
}
