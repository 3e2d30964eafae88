//! Reference expeller combining a `stdout` writer and an in-memory
//! recorder into one role: every record is written to standard output
//! and appended to an in-memory list that tests can inspect through
//! [`StdoutExpeller::records`].

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::select_all;
use reservoir_core::{Closed, Control, Expeller, Queue};
use tokio::io::{AsyncWriteExt, Stdout};
use tokio::sync::Mutex;

pub struct StdoutExpeller {
    records: Arc<Mutex<Vec<Bytes>>>,
}

impl Default for StdoutExpeller {
    fn default() -> Self {
        Self::new()
    }
}

impl StdoutExpeller {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A handle to the accumulated records, suitable for cloning out
    /// before the expeller is handed to an `ExpellerAdapter` so a test can
    /// assert against it after a run.
    pub fn records(&self) -> Arc<Mutex<Vec<Bytes>>> {
        Arc::clone(&self.records)
    }

    async fn emit(records: &Arc<Mutex<Vec<Bytes>>>, stdout: &mut Stdout, value: Bytes) {
        let _ = stdout.write_all(&value).await;
        records.lock().await.push(value);
    }
}

#[async_trait]
impl Expeller for StdoutExpeller {
    fn name(&self) -> &str {
        "stdout"
    }

    async fn expel(&self, in_queues: Vec<Arc<dyn Queue>>, mut control: Control) {
        let mut stdout = tokio::io::stdout();

        loop {
            if control.is_done() || in_queues.is_empty() {
                break;
            }
            let futs: Vec<_> = in_queues.iter().map(|q| q.pop()).collect();
            tokio::select! {
                _ = control.await_done() => break,
                (result, _idx, _rest) = select_all(futs) => {
                    if let Ok(value) = result {
                        Self::emit(&self.records, &mut stdout, value).await;
                    }
                }
            }
        }

        for queue in &in_queues {
            while !queue.is_empty() {
                match queue.pop().await {
                    Ok(value) => Self::emit(&self.records, &mut stdout, value).await,
                    Err(Closed) => break,
                }
            }
        }
    }

    async fn monitor(&self, mut control: Control) {
        loop {
            let count = self.records.lock().await.len();
            control.publish_stats(serde_json::json!({"name": self.name(), "count": count}));
            tokio::select! {
                _ = control.await_done() => break,
                _ = tokio::time::sleep(std::time::Duration::from_millis(500)) => {}
            }
        }
        let count = self.records.lock().await.len();
        control.publish_final_stats(serde_json::json!({"name": self.name(), "count": count}));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::reference::channel_queue::ChannelQueue;
    use reservoir_core::control::control_pair;

    #[tokio::test]
    async fn records_every_input_record() {
        let q = ChannelQueue::new("q", 4);
        q.push(Bytes::from_static(b"a\n")).await.unwrap();
        q.push(Bytes::from_static(b"b\n")).await.unwrap();
        q.close();

        let expeller = StdoutExpeller::new();
        let records = expeller.records();

        let (control, mut handle) = control_pair();
        handle.signal_done();
        expeller.expel(vec![q], control).await;

        assert_eq!(*records.lock().await, vec![Bytes::from_static(b"a\n"), Bytes::from_static(b"b\n")]);
    }
}
