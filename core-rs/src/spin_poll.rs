//! Busy polling - workers that spin on a receive that never succeeds
//!
//! Each worker loops on a non-blocking `try_recv` against a channel nobody
//! sends on. It never blocks and never makes progress: one full CPU per worker
//! burned on checking. Used by the `busy-poll` binary.

use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};

use crate::diagnostics::Diagnostics;

/// Site of the spinning workers
pub const POLL_SITE: &str = "busy_poll.spin";

/// Start `count` detached spinning workers.
///
/// Returns the sending halves of the workers that started; a value sent on
/// one is logged by its worker, which then goes back to spinning. Dropping
/// them changes nothing: a disconnected channel is polled just the same.
pub fn spawn_pollers(diagnostics: &Diagnostics, count: usize) -> Vec<Sender<u64>> {
    (0..count)
        .filter_map(|_| {
            let (tx, rx) = channel();
            match diagnostics.spawn_detached(POLL_SITE, move || poll_forever(rx)) {
                Ok(()) => Some(tx),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to spawn busy poller");
                    None
                }
            }
        })
        .collect()
}

fn poll_forever(rx: Receiver<u64>) {
    loop {
        match rx.try_recv() {
            Ok(value) => tracing::info!(value, "busy poller received a value"),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {}
        }
    }
}
