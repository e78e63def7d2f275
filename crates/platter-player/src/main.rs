//! platter-player — command-line demo driver
//!
//! Loads one or two WAV files onto the decks, starts playback through the
//! default output device, and prints the engine status as JSON until both
//! decks run out.

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use platter_core::audio::{self, AudioConfig};
use platter_core::control::EngineHandle;
use platter_core::DeckId;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("platter-player starting up");

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() || args.len() > 2 {
        bail!("usage: platter-player <deck-a.wav> [deck-b.wav]");
    }

    let (audio, engine) = audio::start(&AudioConfig::default()).context("audio startup failed")?;
    log::info!(
        "running at {} Hz, ~{:.1} ms output latency",
        audio.sample_rate(),
        audio.latency_ms()
    );

    engine.load(DeckId::A, &args[0])?;
    if let Some(path) = args.get(1) {
        engine.load(DeckId::B, path)?;
    }
    wait_until_loaded(&engine, args.len())?;

    engine.play(DeckId::A);
    if args.len() == 2 {
        // both decks up: blend at the center
        engine.play(DeckId::B);
        engine.set_crossfader(0.0);
    } else {
        engine.set_crossfader(-1.0);
    }

    loop {
        thread::sleep(Duration::from_secs(2));
        let status = engine.status();
        println!("{}", serde_json::to_string_pretty(&status)?);
        if !status.deck_a.is_playing && !status.deck_b.is_playing {
            break;
        }
    }

    log::info!("both decks finished, shutting down");
    Ok(())
}

/// Wait for the async loads to land (decode failures show up as a deck
/// that never reports a duration).
fn wait_until_loaded(engine: &EngineHandle, deck_count: usize) -> Result<()> {
    let deadline = Instant::now() + Duration::from_secs(30);
    loop {
        let status = engine.status();
        let a_ready = status.deck_a.duration_seconds > 0.0;
        let b_ready = deck_count < 2 || status.deck_b.duration_seconds > 0.0;
        if a_ready && b_ready {
            return Ok(());
        }
        if Instant::now() > deadline {
            bail!("tracks did not load within 30s (decode failure?)");
        }
        thread::sleep(Duration::from_millis(50));
    }
}
