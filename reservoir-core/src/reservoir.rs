//! One topology instance: construction, lifecycle, and the start/shutdown
//! protocols that schedule and tear down its component tasks.

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::adapter::{DigesterAdapter, ExpellerAdapter, IngesterAdapter};
use crate::control::StatsSnapshot;
use crate::error::{CoreResult, StateError};
use crate::queue::Queue;

/// A single running (or stopped, or disposed) topology.
///
/// Holds the owning tree rooted at its [`ExpellerAdapter`] and the two
/// boolean lifecycle flags. `tasks` tracks every task spawned by the
/// current (or most recent) run, so `wait()` is exact: it returns only
/// once every one of them has completed.
pub struct Reservoir {
    name: String,
    expeller: ExpellerAdapter,
    stopped: bool,
    disposed: bool,
    tasks: JoinSet<()>,
}

impl Reservoir {
    /// Wraps an already-constructed topology tree. Construction itself
    /// (resolving plugin locations into live stage/queue objects) is the
    /// caller's responsibility — see `reservoir-plugin`'s registry.
    pub fn new(name: String, expeller: ExpellerAdapter) -> Self {
        Self {
            name,
            expeller,
            stopped: true,
            disposed: false,
            tasks: JoinSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Number of tasks spawned by the current (or most recently completed)
    /// run that haven't been reaped by `wait()` yet.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// The linearized component-name sequence: ingester, its queue,
    /// digester, its queue, ..., expeller.
    pub fn get_flow(&self) -> CoreResult<Vec<String>> {
        self.require_not_disposed()?;
        let mut flow = Vec::new();
        for ingester in self.expeller.ingesters() {
            flow.push(ingester.name().to_string());
            flow.push(ingester.queue().name().to_string());
            for digester in ingester.digesters() {
                flow.push(digester.name().to_string());
                flow.push(digester.queue().name().to_string());
            }
        }
        flow.push(self.expeller.name().to_string());
        Ok(flow)
    }

    /// The cached stats snapshot for every component, in `get_flow` order.
    /// Components that haven't published yet report `null`.
    pub fn get_reservoir(&self) -> CoreResult<Vec<StatsSnapshot>> {
        self.require_not_disposed()?;
        let mut stats = Vec::new();
        for ingester in self.expeller.ingesters() {
            stats.push(snapshot_or_null(ingester.last_snapshot()));
            stats.push(snapshot_or_null(ingester.queue().last_snapshot()));
            for digester in ingester.digesters() {
                stats.push(snapshot_or_null(digester.last_snapshot()));
                stats.push(snapshot_or_null(digester.queue().last_snapshot()));
            }
        }
        stats.push(snapshot_or_null(self.expeller.last_snapshot()));
        Ok(stats)
    }

    /// Resets every queue, spawns one task per stage and one per
    /// queue-monitor, and marks the reservoir running. See the module-level
    /// start protocol description.
    pub fn start(&mut self) -> CoreResult<()> {
        if self.disposed {
            return Err(StateError::Disposed(self.name.clone()).into());
        }
        if !self.stopped {
            return Err(StateError::AlreadyStarted(self.name.clone()).into());
        }

        let mut tail_queues: Vec<Arc<dyn Queue>> = Vec::new();

        for ingester in self.expeller.ingesters_mut() {
            ingester.queue_mut().reset();
            spawn_queue_monitor(&mut self.tasks, ingester.queue_mut());

            let (ingest_control, ingest_monitor_control) = ingester.begin_run();
            let stage = ingester.stage_handle();
            let out_queue = ingester.queue().queue_handle();
            self.tasks.spawn(IngesterAdapter::run(Arc::clone(&stage), out_queue, ingest_control));
            self.tasks.spawn(IngesterAdapter::run_monitor(stage, ingest_monitor_control));

            let mut upstream = ingester.queue().queue_handle();
            for digester in ingester.digesters_mut() {
                digester.queue_mut().reset();
                spawn_queue_monitor(&mut self.tasks, digester.queue_mut());

                let (digest_control, digest_monitor_control) = digester.begin_run();
                let stage = digester.stage_handle();
                let in_queue = upstream.clone();
                let out_queue = digester.queue().queue_handle();
                self.tasks.spawn(DigesterAdapter::run(Arc::clone(&stage), in_queue, out_queue, digest_control));
                self.tasks.spawn(DigesterAdapter::run_monitor(stage, digest_monitor_control));

                upstream = digester.queue().queue_handle();
            }

            tail_queues.push(upstream);
        }

        let (expel_control, expel_monitor_control) = self.expeller.begin_run();
        let stage = self.expeller.stage_handle();
        self.tasks.spawn(ExpellerAdapter::run(Arc::clone(&stage), tail_queues, expel_control));
        self.tasks.spawn(ExpellerAdapter::run_monitor(stage, expel_monitor_control));

        self.stopped = false;
        Ok(())
    }

    /// Sends `done` to every component in strict reverse-topology order
    /// (expeller first, then each ingester chain innermost-digester-first)
    /// and marks the reservoir stopped. Does not wait for tasks to exit.
    pub fn init_stop(&mut self) -> CoreResult<()> {
        if self.disposed {
            return Err(StateError::Disposed(self.name.clone()).into());
        }
        if self.stopped {
            return Err(StateError::AlreadyStopped(self.name.clone()).into());
        }

        self.expeller.signal_done();

        for ingester in self.expeller.ingesters_mut().iter_mut().rev() {
            for digester in ingester.digesters_mut().iter_mut().rev() {
                digester.queue().close();
                digester.queue_mut().control_mut().signal_done();
                digester.signal_done();
            }
            ingester.queue().close();
            ingester.queue_mut().control_mut().signal_done();
            ingester.signal_done();
        }

        self.stopped = true;
        Ok(())
    }

    /// Blocks until every task spawned by the current run has exited.
    pub async fn wait(&mut self) {
        while self.tasks.join_next().await.is_some() {}
    }

    /// `init_stop()` followed by `wait()`.
    pub async fn stop(&mut self) -> CoreResult<()> {
        self.init_stop()?;
        self.wait().await;
        Ok(())
    }

    /// Non-blocking drain of every component's stats channel into its
    /// cached snapshot.
    pub fn update(&mut self) -> CoreResult<()> {
        self.require_not_disposed()?;
        for ingester in self.expeller.ingesters_mut() {
            ingester.update();
            ingester.queue_mut().control_mut().update();
            for digester in ingester.digesters_mut() {
                digester.update();
                digester.queue_mut().control_mut().update();
            }
        }
        self.expeller.update();
        Ok(())
    }

    /// Blocking receive of the terminal snapshot from every component,
    /// once each. Call after `init_stop()` to capture end-of-run stats
    /// before `wait()` reaps the tasks.
    pub async fn update_final(&mut self) {
        for ingester in self.expeller.ingesters_mut() {
            ingester.update_final().await;
            ingester.queue_mut().control_mut().update_final().await;
            for digester in ingester.digesters_mut() {
                digester.update_final().await;
                digester.queue_mut().control_mut().update_final().await;
            }
        }
        self.expeller.update_final().await;
    }

    /// Tombstones the reservoir. Only legal while stopped.
    pub fn dispose(&mut self) -> CoreResult<()> {
        if !self.stopped {
            return Err(StateError::Running(self.name.clone()).into());
        }
        self.disposed = true;
        Ok(())
    }

    /// Un-tombstones the reservoir so it can be started again.
    pub fn retrieve(&mut self) -> CoreResult<()> {
        if !self.disposed {
            return Err(StateError::NotDisposed(self.name.clone()).into());
        }
        self.disposed = false;
        Ok(())
    }

    fn require_not_disposed(&self) -> CoreResult<()> {
        if self.disposed {
            return Err(StateError::Disposed(self.name.clone()).into());
        }
        Ok(())
    }
}

fn spawn_queue_monitor(tasks: &mut JoinSet<()>, queue: &mut crate::queue::QueueAdapter) {
    let control = queue.begin_run();
    let handle = queue.queue_handle();
    tasks.spawn(async move { handle.monitor(control).await });
}

fn snapshot_or_null(snapshot: Option<&StatsSnapshot>) -> StatsSnapshot {
    snapshot.cloned().unwrap_or(StatsSnapshot::Null)
}
