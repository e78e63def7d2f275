//! Audio engine: decks, mixer, lock-free control plumbing
//!
//! Everything in this module past the channel endpoints is owned by the
//! audio thread. The control façade talks to it exclusively through the
//! command and load queues; observable state comes back through the
//! per-slot [`DeckShared`] atomics.

mod command;
mod deck;
pub mod gc;
mod mixer;
mod shared;

pub use command::{
    command_channel, completion_channel, CueRequest, EngineCommand, LoadedDeck,
    COMMAND_QUEUE_CAPACITY, COMPLETION_QUEUE_CAPACITY, LOAD_QUEUE_CAPACITY,
};
pub use deck::Deck;
pub use mixer::{crossfade_gains, Mixer};
pub use shared::DeckShared;

/// The bundle the audio callback owns: the mixer plus its command inlet.
pub struct EngineCore {
    mixer: Mixer,
    commands: rtrb::Consumer<EngineCommand>,
}

impl EngineCore {
    pub fn new(mixer: Mixer, commands: rtrb::Consumer<EngineCommand>) -> Self {
        Self { mixer, commands }
    }

    /// One callback's worth of work: apply pending commands, then mix.
    pub fn render(&mut self, out: &mut [f32]) {
        self.mixer.process_commands(&mut self.commands);
        self.mixer.mix(out);
    }
}
