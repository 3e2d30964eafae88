//! Runtime core for the reservoird stream-processing framework.
//!
//! This crate assembles plugin-supplied queues and stages into running
//! topologies ("reservoirs"), schedules their tasks, coordinates their
//! lifecycle, and aggregates their self-reported statistics. It never
//! knows what any stage does with a record's bytes — that is entirely the
//! concern of the plugin implementations resolved through
//! `reservoir-plugin`'s `PluginRegistry`.

pub mod adapter;
pub mod control;
pub mod error;
pub mod manifest;
pub mod queue;
pub mod reservoir;
pub mod reservoir_map;
pub mod stage;
pub mod stats;

pub use control::{Control, ControlHandle, StatsSnapshot};
pub use error::{CoreError, CoreResult, StateError};
pub use manifest::{DigesterConfig, ExpellerConfig, IngesterConfig, Manifest, QueueConfig, ReservoirConfig};
pub use queue::{Closed, Queue, QueueAdapter};
pub use reservoir::Reservoir;
pub use reservoir_map::ReservoirMap;
pub use stage::{Digester, Expeller, Ingester};
pub use stats::{Flow, FlowStats, ReservoirFlowStats, ReservoirSnapshot, ReservoirStats, RuntimeStats, Version};
