//! The queue abstraction that decouples adjacent stages.
//!
//! A [`Queue`] is an ordered, bounded, closable channel of opaque byte
//! records. The framework never inspects what flows through it; plugins
//! supply the concrete implementation, the core only ever talks to the
//! `Queue` trait object.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::control::{Control, ControlHandle};

/// Failure mode for queue operations. Internal signal only — stages
/// interpret it as "drain and exit", never as a user-visible error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("queue closed")]
pub struct Closed;

/// A bounded, closable, FIFO channel of byte records between two adjacent
/// stages. Exactly one writer and one reader hold a reference to any given
/// queue while a reservoir is running.
#[async_trait]
pub trait Queue: Send + Sync {
    /// Stable name for this queue instance, used in `get_flow()`.
    fn name(&self) -> &str;

    /// Blocks until capacity is available or the queue closes.
    async fn push(&self, value: Bytes) -> Result<(), Closed>;

    /// Blocks until a value is available or the queue closes and drains.
    async fn pop(&self) -> Result<Bytes, Closed>;

    /// Idempotent. Wakes blocked pushers/poppers with `Closed`; items
    /// already buffered remain poppable until exhausted.
    fn close(&self);

    /// Returns the queue to a freshly-constructed, empty, open state. Only
    /// legal when no task holds a reference — the reservoir calls this
    /// immediately before spawning the producer/consumer tasks for a run.
    fn reset(&self);

    /// Current number of buffered records.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured capacity.
    fn capacity(&self) -> usize;

    /// Long-running task: periodically publish a stats snapshot until
    /// `control`'s `done` fires, then publish one final snapshot and
    /// return.
    async fn monitor(&self, control: Control);
}

/// Owns a plugin-supplied [`Queue`] plus the monitor-control block and last
/// cached stats snapshot for it.
///
/// The queue itself is held behind an `Arc` (not a `Box`): its methods all
/// take `&self` — internal mutability is the plugin's problem, same as a
/// channel — so the same instance can be cheaply shared with the monitor
/// task and with whichever two stage tasks read and write it for a run.
pub struct QueueAdapter {
    queue: Arc<dyn Queue>,
    control: ControlHandle,
}

impl QueueAdapter {
    pub fn new(queue: Arc<dyn Queue>, control: ControlHandle) -> Self {
        Self { queue, control }
    }

    pub fn name(&self) -> &str {
        self.queue.name()
    }

    pub fn queue(&self) -> &dyn Queue {
        self.queue.as_ref()
    }

    /// A cloned handle suitable for moving into a spawned task.
    pub fn queue_handle(&self) -> Arc<dyn Queue> {
        Arc::clone(&self.queue)
    }

    pub fn reset(&self) {
        tracing::debug!(queue = self.queue.name(), "queue reset: into");
        self.queue.reset();
        tracing::debug!(queue = self.queue.name(), "queue reset: outof");
    }

    pub fn close(&self) {
        tracing::debug!(queue = self.queue.name(), "queue close: into");
        self.queue.close();
        tracing::debug!(queue = self.queue.name(), "queue close: outof");
    }

    pub fn control_mut(&mut self) -> &mut ControlHandle {
        &mut self.control
    }

    pub fn last_snapshot(&self) -> Option<&crate::control::StatsSnapshot> {
        self.control.last_snapshot()
    }

    /// Installs a fresh control pair for the upcoming run and returns the
    /// component-facing `Control` half for the spawned monitor task to take.
    pub fn begin_run(&mut self) -> Control {
        let (control, handle) = crate::control::control_pair();
        self.control = handle;
        control
    }
}
