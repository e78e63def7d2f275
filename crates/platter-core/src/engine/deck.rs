//! Deck - one playback channel with its own buffer, transport, and DSP chain
//!
//! The playhead is a fractional index into the interleaved sample buffer
//! and advances once per scalar output slot, so playback rate scaling is a
//! plain per-slot increment and track time is
//! `playhead / channels / sample_rate`.

use std::sync::Arc;

use basedrop::Shared;

use super::shared::DeckShared;
use crate::cue::CueBank;
use crate::dsp::{Filter, FilterShape, ThreeBandEq};
use crate::track::TrackBuffer;

/// A single deck.
///
/// Owned exclusively by the audio thread. Control changes arrive as
/// commands; observable state leaves through the slot's [`DeckShared`].
pub struct Deck {
    /// Loaded track (None when the deck is empty).
    track: Option<Shared<TrackBuffer>>,
    /// Fractional playhead in interleaved-sample space.
    playhead: f64,
    playing: bool,
    /// Deck fader in [0, 1].
    volume: f64,
    /// Playback rate in [0.5, 2.0].
    speed: f64,
    eq: ThreeBandEq,
    filter: Filter,
    cues: CueBank,
    /// Sample rate the DSP chain runs at (the output stream's rate).
    dsp_rate: f64,
    shared: Arc<DeckShared>,
}

impl Deck {
    /// Create an empty deck for a slot.
    pub fn empty(shared: Arc<DeckShared>, dsp_rate: f64) -> Self {
        Self {
            track: None,
            playhead: 0.0,
            playing: false,
            volume: 1.0,
            speed: 1.0,
            eq: ThreeBandEq::new(dsp_rate),
            filter: Filter::new(dsp_rate),
            cues: CueBank::new(),
            dsp_rate,
            shared,
        }
    }

    /// Create a deck with a track already installed (decoder agent path).
    pub fn with_track(track: Shared<TrackBuffer>, shared: Arc<DeckShared>, dsp_rate: f64) -> Self {
        let mut deck = Self::empty(shared, dsp_rate);
        deck.load(track);
        deck
    }

    /// Install a new sample buffer. Resets the playhead, transport, cue
    /// bank, and the whole DSP chain.
    pub fn load(&mut self, track: Shared<TrackBuffer>) {
        let duration = track.duration_seconds();
        self.track = Some(track);
        self.playhead = 0.0;
        self.playing = false;
        self.eq = ThreeBandEq::new(self.dsp_rate);
        self.filter = Filter::new(self.dsp_rate);
        self.cues = CueBank::new();

        self.shared.set_duration_secs(duration);
        self.shared.set_position_secs(0.0);
        self.shared.set_playing(false);
        self.shared.set_loop_active(false);
    }

    pub fn has_track(&self) -> bool {
        self.track.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    // --- Transport ---

    /// Start playback. No-op on an empty deck.
    pub fn play(&mut self) {
        if self.track.as_ref().is_some_and(|t| !t.samples.is_empty()) {
            self.playing = true;
            self.shared.set_playing(true);
        }
    }

    pub fn pause(&mut self) {
        self.playing = false;
        self.shared.set_playing(false);
    }

    /// Pause and rewind to the start.
    pub fn stop(&mut self) {
        self.playing = false;
        self.playhead = 0.0;
        self.shared.set_playing(false);
        self.shared.set_position_secs(0.0);
    }

    /// Jump to a position in seconds, clamped to the track bounds.
    ///
    /// Seeking at or past the end parks the playhead on the end marker;
    /// the next read emits silence and pauses.
    pub fn seek(&mut self, seconds: f64) {
        let Some(track) = &self.track else {
            return;
        };
        let target = seconds * track.sample_rate as f64 * track.channels as f64;
        self.playhead = target.clamp(0.0, track.samples.len() as f64);
        self.shared.set_position_secs(self.position_seconds());
    }

    // --- Clamped setters ---

    pub fn set_volume(&mut self, volume: f64) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed.clamp(0.5, 2.0);
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn set_eq(&mut self, low: f64, mid: f64, high: f64) {
        self.eq.set_low(low);
        self.eq.set_mid(mid);
        self.eq.set_high(high);
    }

    pub fn configure_filter(&mut self, shape: FilterShape, cutoff: f64, resonance: f64) {
        self.filter.configure(shape, cutoff, resonance);
    }

    // --- Cues and loop ---

    /// Add a cue marker at an explicit position in seconds.
    pub fn add_cue(&mut self, name: impl Into<String>, position: f64, color: impl Into<String>) {
        self.cues.add(name, position, color);
    }

    /// Seek to the cue at `index` if it exists.
    pub fn jump_to_cue(&mut self, index: usize) -> bool {
        let Some(position) = self.cues.get(index).map(|c| c.position) else {
            return false;
        };
        self.seek(position);
        true
    }

    pub fn set_loop(&mut self, start: f64, end: f64) {
        self.cues.set_loop(start, end);
        self.shared.set_loop_active(self.cues.loop_region().armed);
    }

    /// Enable or disable the loop; enabling also arms it.
    pub fn enable_loop(&mut self, enabled: bool) {
        self.cues.enable_loop(enabled);
        if enabled {
            self.cues.arm_loop();
        }
        self.shared.set_loop_active(self.cues.loop_region().armed);
    }

    pub fn cues(&self) -> &CueBank {
        &self.cues
    }

    // --- Time accessors ---

    /// Current position in seconds (0 for an empty deck).
    pub fn position_seconds(&self) -> f64 {
        let Some(track) = &self.track else {
            return 0.0;
        };
        if track.samples.is_empty() {
            return 0.0;
        }
        self.playhead / track.channels as f64 / track.sample_rate as f64
    }

    /// Track duration in seconds (0 for an empty deck).
    pub fn duration_seconds(&self) -> f64 {
        self.track.as_ref().map_or(0.0, |t| t.duration_seconds())
    }

    // --- Audio ---

    /// Fill `out` with the deck's next interleaved samples.
    ///
    /// Per slot: emit `buffer[floor(playhead)] * volume` and advance by
    /// `speed`; crossing the buffer end emits silence and pauses with the
    /// playhead rewound. The filter then the EQ run over the whole buffer,
    /// and the loop is evaluated once per call (callers pass modest buffer
    /// sizes, so the loop granularity stays under a frame period).
    pub fn read(&mut self, out: &mut [f32]) {
        if let Some(track) = &self.track {
            let data = &track.samples;
            let gain = self.volume as f32;
            for slot in out.iter_mut() {
                if !self.playing || data.is_empty() {
                    *slot = 0.0;
                    continue;
                }
                let index = self.playhead as usize;
                if index >= data.len() {
                    *slot = 0.0;
                    self.playing = false;
                    self.playhead = 0.0;
                } else {
                    *slot = data[index] * gain;
                    // keep the playhead inside [0, len] even on the last
                    // fractional step before the end
                    self.playhead = (self.playhead + self.speed).min(data.len() as f64);
                }
            }
        } else {
            out.fill(0.0);
        }

        self.filter.process(out);
        self.eq.process(out);

        let (should_loop, new_position) = self.cues.check_loop(self.position_seconds());
        if should_loop {
            self.seek(new_position);
        }

        self.publish();
    }

    /// Push observable state to the slot atomics.
    fn publish(&self) {
        self.shared.set_position_secs(self.position_seconds());
        self.shared.set_playing(self.playing);
        self.shared.set_loop_active(self.cues.loop_region().armed);
    }

    pub fn shared(&self) -> &Arc<DeckShared> {
        &self.shared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::gc::gc_handle;
    use std::path::PathBuf;

    const RATE: u32 = 44_100;

    fn deck_with(samples: Vec<f32>, channels: usize) -> Deck {
        let track = Shared::new(
            &gc_handle(),
            TrackBuffer {
                path: PathBuf::from("test.wav"),
                samples,
                channels,
                sample_rate: RATE,
            },
        );
        Deck::with_track(track, Arc::new(DeckShared::new()), RATE as f64)
    }

    fn stereo_sine(freq: f64, seconds: f64) -> Vec<f32> {
        let frames = (seconds * RATE as f64) as usize;
        let mut out = Vec::with_capacity(frames * 2);
        for i in 0..frames {
            let s = (2.0 * std::f64::consts::PI * freq * i as f64 / RATE as f64).sin() as f32;
            out.push(s);
            out.push(s);
        }
        out
    }

    #[test]
    fn empty_deck_reads_silence() {
        let mut deck = Deck::empty(Arc::new(DeckShared::new()), RATE as f64);
        let mut out = vec![1.0f32; 256];
        deck.read(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(deck.position_seconds(), 0.0);
        assert_eq!(deck.duration_seconds(), 0.0);

        // play on empty deck is a no-op
        deck.play();
        assert!(!deck.is_playing());
    }

    #[test]
    fn read_reconstructs_source_at_unity() {
        let source = stereo_sine(440.0, 1.0);
        let mut deck = deck_with(source.clone(), 2);
        deck.play();

        let mut out = vec![0.0f32; source.len()];
        for chunk in out.chunks_mut(1024) {
            deck.read(chunk);
        }
        for (i, (&got, &want)) in out.iter().zip(source.iter()).enumerate() {
            assert!((got - want).abs() <= 1e-6, "slot {i}: {got} vs {want}");
        }
    }

    #[test]
    fn volume_scales_output() {
        let mut deck = deck_with(vec![0.8; 1024], 2);
        deck.set_volume(0.5);
        deck.play();

        let mut out = vec![0.0f32; 512];
        deck.read(&mut out);
        assert!(out.iter().all(|&s| (s - 0.4).abs() < 1e-6));
    }

    #[test]
    fn double_speed_finishes_after_half_the_slots() {
        let len = 1000;
        let mut deck = deck_with(vec![0.25; len], 2);
        deck.set_speed(2.0);
        deck.play();

        let mut produced = 0usize;
        let mut out = vec![0.0f32; 128];
        while deck.is_playing() {
            deck.read(&mut out);
            produced += out.iter().filter(|&&s| s != 0.0).count();
        }
        assert_eq!(produced, len.div_ceil(2));
        assert_eq!(deck.position_seconds(), 0.0);
    }

    #[test]
    fn end_of_track_pauses_and_rewinds() {
        let mut deck = deck_with(vec![0.5; 64], 2);
        deck.play();

        let mut out = vec![0.0f32; 128];
        deck.read(&mut out);
        assert!(!deck.is_playing());
        assert_eq!(deck.position_seconds(), 0.0);
        // slots past the end are silent
        assert!(out[64..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn seek_clamps_to_track_bounds() {
        let mut deck = deck_with(stereo_sine(440.0, 1.0), 2);

        deck.seek(-5.0);
        assert_eq!(deck.position_seconds(), 0.0);

        deck.seek(99.0);
        assert!((deck.position_seconds() - deck.duration_seconds()).abs() < 1e-9);

        // next read after an over-seek emits silence and pauses
        deck.play();
        let mut out = vec![1.0f32; 256];
        deck.read(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
        assert!(!deck.is_playing());
    }

    #[test]
    fn setters_clamp() {
        let mut deck = deck_with(vec![0.0; 64], 2);
        deck.set_volume(1.7);
        assert_eq!(deck.volume(), 1.0);
        deck.set_volume(-0.2);
        assert_eq!(deck.volume(), 0.0);
        deck.set_speed(3.0);
        assert_eq!(deck.speed(), 2.0);
        deck.set_speed(0.1);
        assert_eq!(deck.speed(), 0.5);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut deck = deck_with(vec![0.5; 1024], 2);
        deck.play();
        deck.seek(0.001);
        deck.stop();
        let pos = deck.position_seconds();
        deck.stop();
        assert_eq!(deck.position_seconds(), pos);
        assert_eq!(pos, 0.0);
        assert!(!deck.is_playing());
    }

    #[test]
    fn loop_re_enters_region() {
        // 4 seconds of signal, loop [1.0, 2.0)
        let mut deck = deck_with(vec![0.5; RATE as usize * 2 * 4], 2);
        deck.set_loop(1.0, 2.0);
        deck.enable_loop(true);
        deck.seek(0.9);
        deck.play();

        let mut out = vec![0.0f32; 2048];
        let mut looped = false;
        // read ~2.5 seconds worth; the playhead must never escape past the
        // loop end by more than one buffer
        for _ in 0..(RATE as usize * 2 * 5 / 2 / 2048) {
            deck.read(&mut out);
            let pos = deck.position_seconds();
            assert!(pos < 2.1, "escaped the loop: {pos}");
            if pos >= 1.9 {
                looped = true;
            }
        }
        assert!(looped, "playhead never reached the loop end");
        let final_pos = deck.position_seconds();
        assert!((1.0..2.0).contains(&final_pos), "ended at {final_pos}");
    }

    #[test]
    fn cue_jump_seeks() {
        let mut deck = deck_with(vec![0.5; RATE as usize * 2 * 2], 2);
        deck.add_cue("drop", 1.5, "#FF0000");
        assert!(deck.jump_to_cue(0));
        assert!((deck.position_seconds() - 1.5).abs() < 1e-9);
        assert!(!deck.jump_to_cue(7));
    }

    #[test]
    fn load_resets_state() {
        let mut deck = deck_with(vec![0.5; 1024], 2);
        deck.play();
        deck.seek(0.005);
        deck.add_cue("a", 0.0, "");
        deck.set_loop(0.001, 0.002);
        deck.enable_loop(true);

        let fresh = Shared::new(
            &gc_handle(),
            TrackBuffer {
                path: PathBuf::from("other.wav"),
                samples: vec![0.1; 2048],
                channels: 2,
                sample_rate: RATE,
            },
        );
        deck.load(fresh);

        assert!(!deck.is_playing());
        assert_eq!(deck.position_seconds(), 0.0);
        assert_eq!(deck.cues().len(), 0);
        assert!(!deck.cues().loop_region().enabled);
    }
}
