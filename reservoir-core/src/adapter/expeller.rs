use std::sync::Arc;

use crate::control::{Control, ControlHandle};
use crate::stage::Expeller;

use super::IngesterAdapter;

/// The root of a reservoir's topology. Owns the plugin [`Expeller`] and
/// every [`IngesterAdapter`] chain feeding it; there is exactly one per
/// reservoir.
///
/// See [`super::IngesterAdapter`]'s doc comment for why the stage is a bare
/// `Arc` and why it carries two separate `ControlHandle`s.
pub struct ExpellerAdapter {
    expeller: Arc<dyn Expeller>,
    name: String,
    ingesters: Vec<IngesterAdapter>,
    drive_control: ControlHandle,
    monitor_control: ControlHandle,
}

impl ExpellerAdapter {
    pub fn new(expeller: Box<dyn Expeller>, ingesters: Vec<IngesterAdapter>, drive_control: ControlHandle, monitor_control: ControlHandle) -> Self {
        let name = expeller.name().to_string();
        Self {
            expeller: Arc::from(expeller),
            name,
            ingesters,
            drive_control,
            monitor_control,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ingesters(&self) -> &[IngesterAdapter] {
        &self.ingesters
    }

    pub fn ingesters_mut(&mut self) -> &mut [IngesterAdapter] {
        &mut self.ingesters
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

    pub fn stage_handle(&self) -> Arc<dyn Expeller> {
        Arc::clone(&self.expeller)
    }

    /// Drives the plugin's `expel` loop for one run, over the tail queue of
    /// every ingester chain. Spawned as a task by the reservoir's start
    /// protocol.
    pub async fn run(stage: Arc<dyn Expeller>, in_queues: Vec<Arc<dyn crate::queue::Queue>>, control: Control) {
        let name = stage.name().to_string();
        tracing::debug!(expeller = %name, "expel: into");
        stage.expel(in_queues, control).await;
        tracing::debug!(expeller = %name, "expel: outof");
    }

    /// Drives the plugin's `monitor` loop for one run. Spawned alongside
    /// `run` by the reservoir's start protocol.
    pub async fn run_monitor(stage: Arc<dyn Expeller>, control: Control) {
        let name = stage.name().to_string();
        tracing::debug!(expeller = %name, "expeller monitor: into");
        stage.monitor(control).await;
        tracing::debug!(expeller = %name, "expeller monitor: outof");
    }
}
