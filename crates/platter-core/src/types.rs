//! Common types and engine-wide constants
//!
//! The engine processes interleaved 32-bit float audio end to end: track
//! buffers, deck scratch buffers, and the device output all share the same
//! layout, so samples move between stages without format conversion.

/// Default sample rate of the output stream (CD rate; actual rate is
/// negotiated with the device at startup).
pub const SAMPLE_RATE: u32 = 44_100;

/// Output channel count. The mix bus is always stereo; tracks may be mono.
pub const CHANNELS: usize = 2;

/// Frames per output buffer requested from the device.
pub const FRAMES_PER_BUFFER: u32 = 512;

/// Number of playback decks.
pub const NUM_DECKS: usize = 2;

/// Maximum buffer size (in interleaved samples) to pre-allocate for
/// real-time safety. Covers every common device buffer configuration, so
/// the audio callback never grows a scratch buffer.
pub const MAX_BUFFER_SAMPLES: usize = 8192 * CHANNELS;

/// Identifies one of the two decks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeckId {
    A,
    B,
}

impl DeckId {
    /// Both decks in slot order.
    pub const ALL: [DeckId; NUM_DECKS] = [DeckId::A, DeckId::B];

    /// Slot index (A = 0, B = 1).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            DeckId::A => 0,
            DeckId::B => 1,
        }
    }
}

impl std::fmt::Display for DeckId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeckId::A => write!(f, "A"),
            DeckId::B => write!(f, "B"),
        }
    }
}
