use std::sync::Arc;

use crate::control::{Control, ControlHandle};
use crate::queue::QueueAdapter;
use crate::stage::Ingester;

use super::DigesterAdapter;

/// Owns a plugin [`Ingester`], its output [`QueueAdapter`], and the chain
/// of [`DigesterAdapter`]s downstream of it. Created once at reservoir
/// construction and reused across every start/stop cycle.
///
/// The stage itself lives behind a bare `Arc` (no `Mutex`): the reservoir's
/// start protocol spawns its `ingest` drive loop and its `monitor` loop as
/// two independent tasks sharing this one handle, the same way
/// [`QueueAdapter`] shares `Arc<dyn Queue>` between a queue's readers,
/// writers, and its monitor.
///
/// Two separate [`ControlHandle`]s back the two tasks: `drive_control` for
/// `ingest`'s `done` signal, `monitor_control` for `monitor`'s stats,
/// final-stats, and `done` signal. Mirrors the distinction the original
/// implementation drew between a stage's flow-done channel and its
/// monitor's own stats/done channels.
pub struct IngesterAdapter {
    ingester: Arc<dyn Ingester>,
    name: String,
    queue: QueueAdapter,
    digesters: Vec<DigesterAdapter>,
    drive_control: ControlHandle,
    monitor_control: ControlHandle,
}

impl IngesterAdapter {
    pub fn new(
        ingester: Box<dyn Ingester>,
        queue: QueueAdapter,
        digesters: Vec<DigesterAdapter>,
        drive_control: ControlHandle,
        monitor_control: ControlHandle,
    ) -> Self {
        let name = ingester.name().to_string();
        Self {
            ingester: Arc::from(ingester),
            name,
            queue,
            digesters,
            drive_control,
            monitor_control,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn queue(&self) -> &QueueAdapter {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut QueueAdapter {
        &mut self.queue
    }

    pub fn digesters(&self) -> &[DigesterAdapter] {
        &self.digesters
    }

    pub fn digesters_mut(&mut self) -> &mut [DigesterAdapter] {
        &mut self.digesters
    }

    pub fn last_snapshot(&self) -> Option<&crate::control::StatsSnapshot> {
        self.monitor_control.last_snapshot()
    }

    /// Non-blocking drain of the monitor's stats channel into the cached
    /// snapshot.
    pub fn update(&mut self) {
        self.monitor_control.update();
    }

    /// Blocking receive of the monitor's terminal snapshot, once.
    pub async fn update_final(&mut self) {
        self.monitor_control.update_final().await;
    }

    /// Signals `done` to both the drive task and the monitor task.
    pub fn signal_done(&mut self) {
        self.drive_control.signal_done();
        self.monitor_control.signal_done();
    }

    /// Installs a fresh control pair for each of the upcoming run's two
    /// tasks and returns `(drive_control, monitor_control)` for the
    /// reservoir to hand to `run` and `run_monitor` respectively.
    pub fn begin_run(&mut self) -> (Control, Control) {
        let (drive_control, drive_handle) = crate::control::control_pair();
        let (monitor_control, monitor_handle) = crate::control::control_pair();
        self.drive_control = drive_handle;
        self.monitor_control = monitor_handle;
        (drive_control, monitor_control)
    }

    /// A cloned handle to the underlying stage, suitable for moving into a
    /// spawned task.
    pub fn stage_handle(&self) -> Arc<dyn Ingester> {
        Arc::clone(&self.ingester)
    }

    /// Drives the plugin's `ingest` loop for one run. Spawned as a task by
    /// the reservoir's start protocol.
    pub async fn run(stage: Arc<dyn Ingester>, out_queue: Arc<dyn crate::queue::Queue>, control: Control) {
        let name = stage.name().to_string();
        tracing::debug!(ingester = %name, "ingest: into");
        stage.ingest(out_queue, control).await;
        tracing::debug!(ingester = %name, "ingest: outof");
    }

    /// Drives the plugin's `monitor` loop for one run. Spawned alongside
    /// `run` by the reservoir's start protocol.
    pub async fn run_monitor(stage: Arc<dyn Ingester>, control: Control) {
        let name = stage.name().to_string();
        tracing::debug!(ingester = %name, "ingester monitor: into");
        stage.monitor(control).await;
        tracing::debug!(ingester = %name, "ingester monitor: outof");
    }
}
