//! Lock-free queues between the control side and the audio thread
//!
//! Two bounded SPSC ring buffers carry everything that crosses into the
//! audio callback: parameter/transport commands, and decks prepared by the
//! decoder agent. Push and pop are wait-free, so the callback drains both
//! without ever blocking, and FIFO order gives setters a total order — two
//! commands are always observed in the order they were sent.

use super::deck::Deck;
use crate::dsp::FilterShape;
use crate::types::DeckId;

/// Capacity of the command queue. Control traffic is human-scale; this is
/// generous headroom for bursts (e.g. a surface syncing every knob at once).
pub const COMMAND_QUEUE_CAPACITY: usize = 256;

/// Capacity of the load-completion queue. Drained once per mix callback,
/// which outpaces any realistic file-load cadence.
pub const COMPLETION_QUEUE_CAPACITY: usize = 16;

/// Capacity of the load-request channel feeding the decoder agent.
pub const LOAD_QUEUE_CAPACITY: usize = 16;

/// A cue marker request, boxed so the command enum stays pointer-small.
#[derive(Debug)]
pub struct CueRequest {
    pub name: String,
    /// Position in seconds, captured by the caller at send time.
    pub position: f64,
    pub color: String,
}

/// Commands applied by the audio thread at the top of each callback.
#[derive(Debug)]
pub enum EngineCommand {
    // Transport
    Play { deck: DeckId },
    Pause { deck: DeckId },
    Stop { deck: DeckId },
    Seek { deck: DeckId, seconds: f64 },

    // Deck parameters (all clamped at application)
    SetVolume { deck: DeckId, volume: f64 },
    SetSpeed { deck: DeckId, speed: f64 },
    SetEq { deck: DeckId, low: f64, mid: f64, high: f64 },
    SetFilter { deck: DeckId, shape: FilterShape, cutoff: f64, resonance: f64 },

    // Cues and loop
    AddCue { deck: DeckId, cue: Box<CueRequest> },
    JumpToCue { deck: DeckId, index: usize },
    SetLoop { deck: DeckId, start: f64, end: f64 },
    EnableLoop { deck: DeckId, enabled: bool },

    // Mixer
    SetCrossfader(f64),
    SetMasterVolume(f64),
    SetSync { enabled: bool, master: DeckId },
}

/// A fully prepared deck emitted by the decoder agent.
///
/// Boxed: the deck carries the DSP chain inline and the command is moved
/// through a fixed-size ring slot.
pub struct LoadedDeck {
    pub slot: DeckId,
    pub deck: Box<Deck>,
}

/// Create the control → audio command channel.
pub fn command_channel() -> (rtrb::Producer<EngineCommand>, rtrb::Consumer<EngineCommand>) {
    rtrb::RingBuffer::new(COMMAND_QUEUE_CAPACITY)
}

/// Create the decoder agent → audio load-completion channel.
pub fn completion_channel() -> (rtrb::Producer<LoadedDeck>, rtrb::Consumer<LoadedDeck>) {
    rtrb::RingBuffer::new(COMPLETION_QUEUE_CAPACITY)
}
