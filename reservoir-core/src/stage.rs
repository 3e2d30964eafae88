//! The three stage roles: Ingester, Digester, Expeller.
//!
//! Each role has a single driving method plus a `monitor` method with the
//! same contract as [`crate::queue::Queue::monitor`]. The framework never
//! inspects record payloads — it only schedules these methods and listens
//! for their `done` completion.
//!
//! Every method takes `&self`, not `&mut self`: the reservoir's start
//! protocol runs a stage's drive method and its `monitor` method as two
//! independent, concurrently-scheduled tasks sharing one `Arc<dyn _>`
//! handle to the same stage object, exactly as [`crate::queue::Queue`]'s
//! `push`/`pop`/`monitor` already share one `Arc<dyn Queue>`. A stage that
//! needs mutable state (a counter, a cursor, a buffered partial record)
//! holds it behind its own interior mutability, the plugin's problem same
//! as a channel — never the framework's.
//!
//! Queues are passed in as `Arc<dyn Queue>` rather than references: the
//! reservoir spawns each drive method as an independent `tokio` task, which
//! requires `'static` ownership of everything the task touches.

use std::sync::Arc;

use async_trait::async_trait;

use crate::control::Control;
use crate::queue::Queue;

/// Produces records from an external source into `out_queue`. Terminates
/// when `control`'s `done` fires; on termination it drains any in-flight
/// record before returning, guaranteeing no partially-produced record is
/// lost.
#[async_trait]
pub trait Ingester: Send + Sync {
    fn name(&self) -> &str;

    async fn ingest(&self, out_queue: Arc<dyn Queue>, control: Control);

    async fn monitor(&self, control: Control);
}

/// Pops from `in_queue`, may transform, and pushes to `out_queue`. On
/// `done`, drains `in_queue` until empty-or-closed, forwarding everything,
/// before returning — the drain-before-exit rule that makes orderly
/// shutdown lossless.
#[async_trait]
pub trait Digester: Send + Sync {
    fn name(&self) -> &str;

    async fn digest(&self, in_queue: Arc<dyn Queue>, out_queue: Arc<dyn Queue>, control: Control);

    async fn monitor(&self, control: Control);
}

/// Multi-input sink. Pops fairly across all of its input queues and emits
/// records externally. On `done`, drains all inputs until closed-empty.
#[async_trait]
pub trait Expeller: Send + Sync {
    fn name(&self) -> &str;

    async fn expel(&self, in_queues: Vec<Arc<dyn Queue>>, control: Control);

    async fn monitor(&self, control: Control);
}
