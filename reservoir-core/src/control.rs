//! The signalling bundle between a component and its containing reservoir.
//!
//! Each queue and each stage adapter owns one [`Control`]. It wraps four
//! capacity-1 channels (stats, final-stats, clear, done) behind typed
//! methods rather than exposing the raw `tokio::sync` primitives, per the
//! single-`Control`-type redesign: `publish_stats`, `publish_final_stats`,
//! `await_done`, `await_clear`.
//!
//! Stats publication is overwrite-on-full: a component that calls
//! `publish_stats` while the previous snapshot hasn't been polled yet simply
//! drops the new value. The poller is assumed to run faster than it needs
//! to see every intermediate snapshot; it only ever needs the latest one.

use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};

/// A `done`/`clear` latch: fires at most once per run. Implemented on
/// `tokio::sync::watch` so both "wait for it" and "has it already fired"
/// are cheap, non-consuming checks. The reservoir recreates the pair on
/// every `start()`, so a signal from a previous run can never leak in.
fn latch_pair() -> (LatchSender, LatchWaiter) {
    let (fired_tx, fired_rx) = watch::channel(false);
    (LatchSender { fired_tx }, LatchWaiter { fired_rx })
}

struct LatchSender {
    fired_tx: watch::Sender<bool>,
}

impl LatchSender {
    fn fire(&mut self) {
        let _ = self.fired_tx.send(true);
    }
}

#[derive(Clone)]
struct LatchWaiter {
    fired_rx: watch::Receiver<bool>,
}

impl LatchWaiter {
    async fn wait(&mut self) {
        if *self.fired_rx.borrow() {
            return;
        }
        let _ = self.fired_rx.changed().await;
    }

    fn has_fired(&self) -> bool {
        *self.fired_rx.borrow()
    }
}

/// A JSON-valued stats snapshot. The framework never interprets its
/// contents; it is whatever the plugin chose to report.
pub type StatsSnapshot = Value;

/// The producer-side handle a component's task holds: it can publish
/// periodic and final stats, and it can observe `done`/`clear` requests
/// from the reservoir.
pub struct Control {
    stats_tx: mpsc::Sender<StatsSnapshot>,
    final_stats_tx: Option<oneshot::Sender<StatsSnapshot>>,
    done: LatchWaiter,
    clear: LatchWaiter,
}

/// The reservoir-side handle: it can poll stats, request a final snapshot,
/// and signal `done`/`clear`.
pub struct ControlHandle {
    stats_rx: mpsc::Receiver<StatsSnapshot>,
    final_stats_rx: Option<oneshot::Receiver<StatsSnapshot>>,
    done: LatchSender,
    clear: LatchSender,
    last_snapshot: Option<StatsSnapshot>,
}

/// Creates a fresh `Control`/`ControlHandle` pair for one component for one
/// run. The reservoir recreates this pair immediately before `start()`
/// spawns the component's task, so stale `done` signals from a previous run
/// can never leak into the next one.
pub fn control_pair() -> (Control, ControlHandle) {
    let (stats_tx, stats_rx) = mpsc::channel(1);
    let (final_stats_tx, final_stats_rx) = oneshot::channel();
    let (done_tx, done_rx) = latch_pair();
    let (clear_tx, clear_rx) = latch_pair();

    (
        Control {
            stats_tx,
            final_stats_tx: Some(final_stats_tx),
            done: done_rx,
            clear: clear_rx,
        },
        ControlHandle {
            stats_rx,
            final_stats_rx: Some(final_stats_rx),
            done: done_tx,
            clear: clear_tx,
            last_snapshot: None,
        },
    )
}

impl Control {
    /// Non-blocking, overwrite-on-full publish of a periodic stats snapshot.
    /// Silently drops the value if the poller hasn't drained the previous
    /// one yet.
    pub fn publish_stats(&self, snapshot: StatsSnapshot) {
        if let Err(mpsc::error::TrySendError::Full(_)) = self.stats_tx.try_send(snapshot) {
            tracing::trace!("stats channel full, dropping snapshot");
        }
    }

    /// Blocking (capacity-1, sent once) publish of the terminal snapshot.
    /// Consumes `self`'s final-stats slot; calling it twice is a logic
    /// error and the second call is a no-op.
    pub fn publish_final_stats(&mut self, snapshot: StatsSnapshot) {
        if let Some(tx) = self.final_stats_tx.take() {
            let _ = tx.send(snapshot);
        }
    }

    /// Resolves once the reservoir has signalled shutdown for this
    /// component. A stage's drive loop selects on this alongside its queue
    /// operations to know when to drain-and-exit.
    pub async fn await_done(&mut self) {
        self.done.wait().await;
    }

    /// `true` if `done` has already fired — used by drain loops that poll
    /// rather than `select!` on every iteration.
    pub fn is_done(&self) -> bool {
        self.done.has_fired()
    }

    /// Resolves once the reservoir has requested a stats reset.
    pub async fn await_clear(&mut self) {
        self.clear.wait().await;
    }
}

impl ControlHandle {
    /// Non-blocking drain of the stats channel into the cached snapshot.
    /// Called by `Reservoir::update()`. Does nothing if no new snapshot has
    /// been published since the last call.
    pub fn update(&mut self) {
        while let Ok(snapshot) = self.stats_rx.try_recv() {
            self.last_snapshot = Some(snapshot);
        }
    }

    /// The most recently cached snapshot, if any has been published yet.
    pub fn last_snapshot(&self) -> Option<&StatsSnapshot> {
        self.last_snapshot.as_ref()
    }

    /// Blocking receive of the terminal snapshot, once. Called by
    /// `Reservoir::update_final()` after `init_stop`. Updates the cached
    /// snapshot on success.
    pub async fn update_final(&mut self) {
        if let Some(rx) = self.final_stats_rx.take() {
            if let Ok(snapshot) = rx.await {
                self.last_snapshot = Some(snapshot);
            }
        }
    }

    /// Signals `done` to the component. Idempotent.
    pub fn signal_done(&mut self) {
        self.done.fire();
    }

    /// Signals `clear` to the component. Idempotent.
    pub fn signal_clear(&mut self) {
        self.clear.fire();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn publish_stats_drops_new_value_when_buffer_full() {
        let (control, mut handle) = control_pair();

        control.publish_stats(json!({"n": 1}));
        control.publish_stats(json!({"n": 2}));

        handle.update();
        assert_eq!(handle.last_snapshot(), Some(&json!({"n": 1})));
    }

    #[tokio::test]
    async fn done_signal_is_observed_by_waiter() {
        let (mut control, mut handle) = control_pair();
        assert!(!control.is_done());

        handle.signal_done();
        control.await_done().await;
        assert!(control.is_done());
    }

    #[tokio::test]
    async fn final_stats_delivered_exactly_once() {
        let (mut control, mut handle) = control_pair();
        control.publish_final_stats(json!({"final": true}));

        handle.update_final().await;
        assert_eq!(handle.last_snapshot(), Some(&json!({"final": true})));
    }
}
