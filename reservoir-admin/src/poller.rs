//! The background stats-polling task: calls `ReservoirMap::update_all`
//! once per `interval`. `update_all` never blocks on a reservoir's own
//! lock — it uses `try_lock` and skips anything mid-operation — so a
//! stuck `wait()` on one reservoir can't stall this poller or any other
//! reservoir's admin requests.

use std::time::Duration;

use reservoir_core::ReservoirMap;

/// Spawns the poller as a detached task and returns a handle that cancels
/// it on drop — held by the admin server for as long as it's serving.
pub fn spawn(reservoirs: ReservoirMap, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so the first real
        // poll happens one interval after startup, matching a ticker
        // that "runs once per second" rather than "runs once at t=0".
        ticker.tick().await;
        loop {
            ticker.tick().await;
            tracing::trace!("stats poller: tick");
            reservoirs.update_all().await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn poller_drains_a_published_snapshot_into_the_cache() {
        let map = ReservoirMap::new();
        let handle = spawn(map.clone(), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(30)).await;
        handle.abort();
    }
}
