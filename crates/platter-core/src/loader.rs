//! Background decoder agent
//!
//! One worker thread services load requests in FIFO order: decode the WAV,
//! build a fully initialized deck, hand it to the audio thread through the
//! completion queue, then run tempo analysis on the retained buffer and
//! publish the estimate. Decode failures are logged and skipped; the deck
//! that was playing stays in place.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use basedrop::Shared;

use crate::analysis;
use crate::control::StatusBoard;
use crate::engine::gc::gc_handle;
use crate::engine::{Deck, DeckShared, LoadedDeck, LOAD_QUEUE_CAPACITY};
use crate::track::TrackBuffer;
use crate::types::{DeckId, NUM_DECKS};

/// A request to load a file onto a deck.
#[derive(Debug)]
pub struct LoadRequest {
    pub slot: DeckId,
    pub path: PathBuf,
}

/// Handle to the decoder agent thread.
///
/// Dropping the handle closes the request channel and lets the thread
/// exit after the request in flight.
pub struct LoadWorker {
    tx: flume::Sender<LoadRequest>,
    _handle: JoinHandle<()>,
}

impl LoadWorker {
    /// Spawn the agent.
    pub fn spawn(
        completion_tx: rtrb::Producer<LoadedDeck>,
        shared: [Arc<DeckShared>; NUM_DECKS],
        board: Arc<StatusBoard>,
        dsp_rate: f64,
    ) -> Self {
        let (tx, rx) = flume::bounded(LOAD_QUEUE_CAPACITY);
        let handle = thread::Builder::new()
            .name("platter-loader".to_string())
            .spawn(move || worker_loop(rx, completion_tx, shared, board, dsp_rate))
            .expect("failed to spawn loader thread");

        Self { tx, _handle: handle }
    }

    /// Enqueue a load without blocking. Errors when the request queue is
    /// full (caller may retry) or the agent is gone.
    pub fn request(
        &self,
        slot: DeckId,
        path: PathBuf,
    ) -> Result<(), flume::TrySendError<LoadRequest>> {
        self.tx.try_send(LoadRequest { slot, path })
    }
}

fn worker_loop(
    rx: flume::Receiver<LoadRequest>,
    mut completion_tx: rtrb::Producer<LoadedDeck>,
    shared: [Arc<DeckShared>; NUM_DECKS],
    board: Arc<StatusBoard>,
    dsp_rate: f64,
) {
    log::info!("decoder agent started");

    for request in rx.iter() {
        let start = Instant::now();
        log::info!("deck {}: loading {:?}", request.slot, request.path);

        let buffer = match TrackBuffer::load_wav(&request.path) {
            Ok(buffer) => buffer,
            Err(e) => {
                log::error!("deck {}: load failed for {:?}: {e}", request.slot, request.path);
                continue;
            }
        };

        let slot_shared = shared[request.slot.index()].clone();
        let track = Shared::new(&gc_handle(), buffer);
        let deck = Deck::with_track(Shared::clone(&track), slot_shared.clone(), dsp_rate);

        // The estimate for the outgoing track no longer applies.
        slot_shared.set_bpm(0.0, 0.0);

        if completion_tx
            .push(LoadedDeck {
                slot: request.slot,
                deck: Box::new(deck),
            })
            .is_err()
        {
            log::error!(
                "deck {}: completion queue full, dropping {:?}",
                request.slot,
                request.path
            );
            continue;
        }

        board.on_track_loaded(request.slot, request.path.clone());
        log::info!(
            "deck {}: ready in {:?} ({:.2}s of audio)",
            request.slot,
            start.elapsed(),
            track.duration_seconds()
        );

        // Analysis runs after the handoff so the swap is never delayed;
        // the deck reports bpm 0 until the estimate lands.
        let estimate = analysis::analyze(&track.samples, track.slot_rate());
        slot_shared.set_bpm(estimate.bpm, estimate.confidence);
        log::info!(
            "deck {}: tempo {:.1} bpm (confidence {:.2})",
            request.slot,
            estimate.bpm,
            estimate.confidence
        );
    }

    log::info!("decoder agent shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::completion_channel;
    use std::fs::File;
    use std::io::Write;
    use std::time::Duration;

    /// Minimal 16-bit PCM stereo WAV with a click every half second.
    fn write_click_wav(name: &str, seconds: f64) -> PathBuf {
        let rate = 44_100u32;
        let frames = (seconds * rate as f64) as usize;
        let mut data = vec![0i16; frames * 2];
        let period = rate as usize / 2;
        let mut pos = 0;
        while pos < frames {
            for i in 0..64.min(frames - pos) {
                let v = (16384.0 * (1.0 - i as f32 / 64.0)) as i16;
                data[(pos + i) * 2] = v;
                data[(pos + i) * 2 + 1] = v;
            }
            pos += period;
        }

        let path = std::env::temp_dir().join(format!("platter-loader-{}-{}", std::process::id(), name));
        let data_bytes = data.len() * 2;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&((36 + data_bytes) as u32).to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"fmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&rate.to_le_bytes());
        bytes.extend_from_slice(&(rate * 4).to_le_bytes());
        bytes.extend_from_slice(&4u16.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&(data_bytes as u32).to_le_bytes());
        for &s in &data {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        File::create(&path).unwrap().write_all(&bytes).unwrap();
        path
    }

    fn wait_for<T>(mut poll: impl FnMut() -> Option<T>, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Some(value) = poll() {
                return Some(value);
            }
            thread::sleep(Duration::from_millis(10));
        }
        None
    }

    #[test]
    fn successful_load_emits_a_ready_deck() {
        let shared = DeckShared::per_slot();
        let board = Arc::new(StatusBoard::new());
        let (completion_tx, mut completion_rx) = completion_channel();
        let worker = LoadWorker::spawn(
            completion_tx,
            [shared[0].clone(), shared[1].clone()],
            board.clone(),
            44_100.0,
        );

        let path = write_click_wav("ok.wav", 4.0);
        worker.request(DeckId::B, path.clone()).unwrap();

        let loaded = wait_for(|| completion_rx.pop().ok(), Duration::from_secs(10))
            .expect("no completion arrived");
        assert_eq!(loaded.slot, DeckId::B);
        assert!(loaded.deck.has_track());
        assert!(!loaded.deck.is_playing());
        assert!((loaded.deck.duration_seconds() - 4.0).abs() < 0.01);

        // the analysis step publishes an estimate shortly after the handoff
        let bpm = wait_for(
            || (shared[1].bpm() > 0.0).then(|| shared[1].bpm()),
            Duration::from_secs(10),
        )
        .expect("no tempo estimate arrived");
        assert!((bpm - 120.0).abs() <= 2.0, "bpm = {bpm}");
        assert!(shared[1].bpm_confidence() > 0.5);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn failed_load_emits_nothing() {
        let shared = DeckShared::per_slot();
        let board = Arc::new(StatusBoard::new());
        let (completion_tx, mut completion_rx) = completion_channel();
        let worker = LoadWorker::spawn(
            completion_tx,
            [shared[0].clone(), shared[1].clone()],
            board,
            44_100.0,
        );

        worker
            .request(DeckId::A, PathBuf::from("/nonexistent/file.wav"))
            .unwrap();

        // decode fails quickly; give the worker a moment, then confirm
        // nothing was enqueued
        thread::sleep(Duration::from_millis(300));
        assert!(completion_rx.pop().is_err());
    }

    #[test]
    fn loads_are_serviced_in_request_order() {
        let shared = DeckShared::per_slot();
        let board = Arc::new(StatusBoard::new());
        let (completion_tx, mut completion_rx) = completion_channel();
        let worker = LoadWorker::spawn(
            completion_tx,
            [shared[0].clone(), shared[1].clone()],
            board,
            44_100.0,
        );

        let first = write_click_wav("first.wav", 2.5);
        let second = write_click_wav("second.wav", 2.5);
        worker.request(DeckId::A, first.clone()).unwrap();
        worker.request(DeckId::B, second.clone()).unwrap();

        let a = wait_for(|| completion_rx.pop().ok(), Duration::from_secs(10)).unwrap();
        let b = wait_for(|| completion_rx.pop().ok(), Duration::from_secs(10)).unwrap();
        assert_eq!(a.slot, DeckId::A);
        assert_eq!(b.slot, DeckId::B);

        std::fs::remove_file(&first).ok();
        std::fs::remove_file(&second).ok();
    }
}
