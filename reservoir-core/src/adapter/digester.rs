use std::sync::Arc;

use crate::control::{Control, ControlHandle};
use crate::queue::QueueAdapter;
use crate::stage::Digester;

/// Owns a plugin [`Digester`] and its output [`QueueAdapter`]. The input
/// queue belongs to whichever adapter sits upstream (the ingester, or the
/// previous digester in the chain); this adapter only owns what it writes
/// to.
///
/// See [`super::IngesterAdapter`]'s doc comment for why the stage is a bare
/// `Arc` and why it carries two separate `ControlHandle`s.
pub struct DigesterAdapter {
    digester: Arc<dyn Digester>,
    name: String,
    queue: QueueAdapter,
    drive_control: ControlHandle,
    monitor_control: ControlHandle,
}

impl DigesterAdapter {
    pub fn new(digester: Box<dyn Digester>, queue: QueueAdapter, drive_control: ControlHandle, monitor_control: ControlHandle) -> Self {
        let name = digester.name().to_string();
        Self {
            digester: Arc::from(digester),
            name,
            queue,
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

    pub fn last_snapshot(&self) -> Option<&crate::control::StatsSnapshot> {
        self.monitor_control.last_snapshot()
    }

    pub fn update(&mut self) {
        self.monitor_control.update();
    }

    pub async fn update_final(&mut self) {
        self.monitor_control.update_final().await;
    }

    /// Signals `done` to both the drive task and the monitor task.
    pub fn signal_done(&mut self) {
        self.drive_control.signal_done();
        self.monitor_control.signal_done();
    }

    pub fn begin_run(&mut self) -> (Control, Control) {
        let (drive_control, drive_handle) = crate::control::control_pair();
        let (monitor_control, monitor_handle) = crate::control::control_pair();
        self.drive_control = drive_handle;
        self.monitor_control = monitor_handle;
        (drive_control, monitor_control)
    }

    pub fn stage_handle(&self) -> Arc<dyn Digester> {
        Arc::clone(&self.digester)
    }

    /// Drives the plugin's `digest` loop for one run. Spawned as a task by
    /// the reservoir's start protocol.
    pub async fn run(stage: Arc<dyn Digester>, in_queue: Arc<dyn crate::queue::Queue>, out_queue: Arc<dyn crate::queue::Queue>, control: Control) {
        let name = stage.name().to_string();
        tracing::debug!(digester = %name, "digest: into");
        stage.digest(in_queue, out_queue, control).await;
        tracing::debug!(digester = %name, "digest: outof");
    }

    /// Drives the plugin's `monitor` loop for one run. Spawned alongside
    /// `run` by the reservoir's start protocol.
    pub async fn run_monitor(stage: Arc<dyn Digester>, control: Control) {
        let name = stage.name().to_string();
        tracing::debug!(digester = %name, "digester monitor: into");
        stage.monitor(control).await;
        tracing::debug!(digester = %name, "digester monitor: outof");
    }
}
