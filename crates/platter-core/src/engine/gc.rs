//! Deferred deallocation for sample buffers
//!
//! Track buffers are minutes of float audio; freeing one involves system
//! calls that can blow the audio callback's deadline. Buffers are therefore
//! held in `basedrop::Shared` pointers: dropping the last reference on the
//! audio thread only enqueues the pointer, and the actual free runs on a
//! background collector thread.

use std::sync::mpsc;
use std::sync::OnceLock;
use std::thread;
use std::time::Duration;

use basedrop::{Collector, Handle};

static GC_HANDLE: OnceLock<Handle> = OnceLock::new();

fn init_collector() -> Handle {
    let (tx, rx) = mpsc::channel();

    thread::Builder::new()
        .name("platter-gc".to_string())
        .spawn(move || {
            // Collector is !Sync; it lives on this thread.
            let mut collector = Collector::new();
            tx.send(collector.handle()).expect("gc handle send failed");

            log::info!("buffer collector thread started");
            loop {
                collector.collect();
                thread::sleep(Duration::from_millis(100));
            }
        })
        .expect("failed to spawn gc thread");

    rx.recv().expect("gc handle recv failed")
}

/// Handle for allocating `basedrop::Shared` values. Cheap to clone; the
/// collector thread is started on first use.
pub fn gc_handle() -> Handle {
    GC_HANDLE.get_or_init(init_collector).clone()
}
