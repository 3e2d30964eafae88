//! The topology registry: name -> [`Reservoir`].
//!
//! Two levels of locking: a brief outer mutex over the map's *structure*
//! (insert, lookup, the set of names) and one mutex per reservoir guarding
//! that reservoir's own lifecycle operations. A lookup clones the
//! reservoir's `Arc` and releases the outer lock before doing anything that
//! might block, so a hung `wait()` on one reservoir never stalls a lookup,
//! an insert, or another reservoir's admin operation.
//!
//! Stats polling (`update_all`) never blocks on a reservoir's lock at all:
//! it uses `try_lock` and skips any reservoir currently mid-operation,
//! picking it back up on the next poll tick.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::control::StatsSnapshot;
use crate::error::{CoreError, CoreResult};
use crate::reservoir::Reservoir;

type Entry = Arc<Mutex<Reservoir>>;

/// Registry of every reservoir known to the process.
#[derive(Clone)]
pub struct ReservoirMap {
    inner: Arc<Mutex<HashMap<String, Entry>>>,
}

impl Default for ReservoirMap {
    fn default() -> Self {
        Self::new()
    }
}

impl ReservoirMap {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Brief outer-lock lookup; returns a cloned handle to the reservoir's
    /// own mutex, already released from the map's structural lock.
    async fn get_entry(&self, name: &str) -> CoreResult<Entry> {
        let map = self.inner.lock().await;
        map.get(name).cloned().ok_or_else(|| CoreError::NotFound(name.to_string()))
    }

    /// Brief outer-lock snapshot of every `(name, entry)` pair, for fan-out
    /// operations that must not hold the structural lock while they touch
    /// individual reservoirs.
    async fn snapshot(&self) -> Vec<(String, Entry)> {
        let map = self.inner.lock().await;
        map.iter().map(|(name, entry)| (name.clone(), Arc::clone(entry))).collect()
    }

    pub async fn insert(&self, reservoir: Reservoir) {
        let mut map = self.inner.lock().await;
        map.insert(reservoir.name().to_string(), Arc::new(Mutex::new(reservoir)));
    }

    pub async fn names(&self) -> Vec<String> {
        let map = self.inner.lock().await;
        map.keys().cloned().collect()
    }

    pub async fn get_flow(&self, name: &str) -> CoreResult<Vec<String>> {
        let entry = self.get_entry(name).await?;
        let reservoir = entry.lock().await;
        reservoir.get_flow()
    }

    pub async fn get_flows(&self) -> CoreResult<HashMap<String, Vec<String>>> {
        let mut flows = HashMap::new();
        for (name, entry) in self.snapshot().await {
            let reservoir = entry.lock().await;
            if reservoir.is_disposed() {
                continue;
            }
            flows.insert(name, reservoir.get_flow()?);
        }
        Ok(flows)
    }

    pub async fn get_reservoir(&self, name: &str) -> CoreResult<(Vec<StatsSnapshot>, bool, bool)> {
        let entry = self.get_entry(name).await?;
        let reservoir = entry.lock().await;
        Ok((reservoir.get_reservoir()?, reservoir.is_stopped(), reservoir.is_disposed()))
    }

    pub async fn get_reservoirs(&self) -> CoreResult<HashMap<String, Vec<StatsSnapshot>>> {
        let mut stats = HashMap::new();
        for (name, entry) in self.snapshot().await {
            let reservoir = entry.lock().await;
            if reservoir.is_disposed() {
                continue;
            }
            stats.insert(name, reservoir.get_reservoir()?);
        }
        Ok(stats)
    }

    pub async fn start(&self, name: &str) -> CoreResult<()> {
        let entry = self.get_entry(name).await?;
        let mut reservoir = entry.lock().await;
        reservoir.start()
    }

    pub async fn init_stop(&self, name: &str) -> CoreResult<()> {
        let entry = self.get_entry(name).await?;
        let mut reservoir = entry.lock().await;
        reservoir.init_stop()
    }

    pub async fn wait(&self, name: &str) -> CoreResult<()> {
        let entry = self.get_entry(name).await?;
        let mut reservoir = entry.lock().await;
        reservoir.wait().await;
        Ok(())
    }

    pub async fn stop(&self, name: &str) -> CoreResult<()> {
        let entry = self.get_entry(name).await?;
        let mut reservoir = entry.lock().await;
        reservoir.stop().await
    }

    pub async fn update_final_and_wait(&self, name: &str) -> CoreResult<()> {
        let entry = self.get_entry(name).await?;
        let mut reservoir = entry.lock().await;
        reservoir.init_stop()?;
        reservoir.update_final().await;
        reservoir.wait().await;
        Ok(())
    }

    pub async fn dispose(&self, name: &str) -> CoreResult<()> {
        let entry = self.get_entry(name).await?;
        let mut reservoir = entry.lock().await;
        reservoir.dispose()
    }

    pub async fn retrieve(&self, name: &str) -> CoreResult<()> {
        let entry = self.get_entry(name).await?;
        let mut reservoir = entry.lock().await;
        reservoir.retrieve()
    }

    pub async fn update(&self, name: &str) -> CoreResult<()> {
        let entry = self.get_entry(name).await?;
        let mut reservoir = entry.lock().await;
        reservoir.update()
    }

    /// Starts every reservoir not already running or disposed, skipping
    /// (rather than failing) entries in an illegal state.
    pub async fn start_all(&self) {
        for (_, entry) in self.snapshot().await {
            let mut reservoir = entry.lock().await;
            if reservoir.is_disposed() || !reservoir.is_stopped() {
                continue;
            }
            if let Err(err) = reservoir.start() {
                tracing::warn!(reservoir = reservoir.name(), error = %err, "start_all: skipped");
            }
        }
    }

    pub async fn init_stop_all(&self) {
        for (_, entry) in self.snapshot().await {
            let mut reservoir = entry.lock().await;
            if reservoir.is_disposed() || reservoir.is_stopped() {
                continue;
            }
            if let Err(err) = reservoir.init_stop() {
                tracing::warn!(reservoir = reservoir.name(), error = %err, "init_stop_all: skipped");
            }
        }
    }

    pub async fn wait_all(&self) {
        for (_, entry) in self.snapshot().await {
            let mut reservoir = entry.lock().await;
            reservoir.wait().await;
        }
    }

    pub async fn stop_all(&self) {
        self.init_stop_all().await;
        self.wait_all().await;
    }

    /// Non-blocking drain of every reservoir's stats. A reservoir whose
    /// lock is currently held by an in-flight lifecycle operation is
    /// skipped for this tick rather than waited on.
    pub async fn update_all(&self) {
        for (name, entry) in self.snapshot().await {
            let Ok(mut reservoir) = entry.try_lock() else {
                tracing::trace!(reservoir = %name, "update_all: busy, skipped this tick");
                continue;
            };
            if reservoir.is_disposed() {
                continue;
            }
            if let Err(err) = reservoir.update() {
                tracing::warn!(reservoir = %name, error = %err, "update_all: skipped");
            }
        }
    }

    pub async fn update_final_all(&self) {
        for (_, entry) in self.snapshot().await {
            let mut reservoir = entry.lock().await;
            reservoir.update_final().await;
        }
    }

    /// Reports `true` only if every reservoir is both stopped and not
    /// currently busy with another operation.
    pub async fn stopped_all(&self) -> bool {
        for (_, entry) in self.snapshot().await {
            match entry.try_lock() {
                Ok(reservoir) => {
                    if !reservoir.is_stopped() {
                        return false;
                    }
                }
                Err(_) => return false,
            }
        }
        true
    }

    pub async fn reservoir_count(&self) -> usize {
        let map = self.inner.lock().await;
        map.len()
    }

    /// A reservoir currently busy with another operation counts as
    /// running: it cannot be mid-`start`/`stop` while actually stopped.
    pub async fn running_count(&self) -> usize {
        let mut count = 0;
        for (_, entry) in self.snapshot().await {
            match entry.try_lock() {
                Ok(reservoir) if reservoir.is_stopped() => {}
                _ => count += 1,
            }
        }
        count
    }

    /// Sum of every reservoir's live task count, for `RuntimeStats`. Busy
    /// reservoirs contribute nothing for this tick rather than blocking.
    pub async fn task_count(&self) -> usize {
        let mut total = 0;
        for (_, entry) in self.snapshot().await {
            if let Ok(reservoir) = entry.try_lock() {
                total += reservoir.task_count();
            }
        }
        total
    }
}
