//! Process-level and per-reservoir statistics types returned by the admin
//! surface.
//!
//! `FlowStats`/`ReservoirStats` mirror the map-of-name-to-sequence shape the
//! original implementation returns; `RuntimeStats` reports the same class of
//! process metrics (core count, task count, build info) through
//! `tokio`/`std` equivalents of the Go runtime fields.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::control::StatsSnapshot;

/// Linearized component names for one reservoir's flow, ingester-first,
/// expeller-last.
pub type Flow = Vec<String>;

/// `GET /v1/flows` response body: reservoir name -> its flow.
pub type FlowStats = HashMap<String, Flow>;

/// Per-component stats snapshots for one reservoir, in the same order as
/// its flow.
pub type ReservoirFlowStats = Vec<StatsSnapshot>;

/// `GET /v1/reservoirs` response body: reservoir name -> its component
/// snapshots.
pub type ReservoirStats = HashMap<String, ReservoirFlowStats>;

/// Process-level metrics reported by `GET /v1/stats`.
///
/// Rust has no garbage collector, so there are no GC-pause counters here;
/// CPU count, task count, build info, and memory counters are reported
/// below instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeStats {
    /// Number of logical CPUs available to the process.
    pub cpus: usize,
    /// Number of reservoirs currently registered (running or not).
    pub reservoir_count: usize,
    /// Number of reservoirs currently running (not stopped).
    pub running_count: usize,
    /// Sum of every running reservoir's live (unreaped) task count.
    pub task_count: usize,
    /// Resident set size in bytes, read from `/proc/self/status`. `None`
    /// on platforms without a `/proc` filesystem.
    pub memory_rss_bytes: Option<u64>,
    pub rustc_version: &'static str,
    pub build_profile: &'static str,
}

impl RuntimeStats {
    pub fn collect(reservoir_count: usize, running_count: usize, task_count: usize) -> Self {
        Self {
            cpus: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            reservoir_count,
            running_count,
            task_count,
            memory_rss_bytes: read_rss_bytes(),
            rustc_version: env!("CARGO_PKG_RUST_VERSION"),
            build_profile: if cfg!(debug_assertions) { "debug" } else { "release" },
        }
    }
}

/// Parses `VmRSS` out of `/proc/self/status`, the same field `ps`/`top`
/// report as resident memory. Returns `None` if the file can't be read or
/// parsed (non-Linux platforms, restrictive sandboxes).
fn read_rss_bytes() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    for line in status.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            let kb: u64 = rest.trim().strip_suffix("kB")?.trim().parse().ok()?;
            return Some(kb * 1024);
        }
    }
    None
}

/// `GET /v1/version` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Version {
    pub version: String,
}

impl Version {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// A single reservoir's component snapshots plus its lifecycle flags, as
/// returned by `GET /v1/reservoirs/:name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservoirSnapshot {
    pub stats: ReservoirFlowStats,
    pub stopped: bool,
    pub disposed: bool,
}
