//! An in-memory bounded FIFO queue. The reference plugin used wherever a
//! manifest names `mem:channel` for a queue's location.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use reservoir_core::{Closed, Control, Queue};
use tokio::sync::Notify;

pub struct ChannelQueue {
    name: String,
    capacity: usize,
    buf: Mutex<VecDeque<Bytes>>,
    notify: Notify,
    closed: AtomicBool,
}

impl ChannelQueue {
    pub fn new(name: impl Into<String>, capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            capacity: capacity.max(1),
            buf: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
        })
    }

    /// Parses `config` as `{"capacity": <usize>}`, defaulting to 64.
    pub fn from_config(name: impl Into<String>, config: &str) -> Arc<Self> {
        let capacity = serde_json::from_str::<serde_json::Value>(config)
            .ok()
            .and_then(|v| v.get("capacity").and_then(|c| c.as_u64()))
            .unwrap_or(64) as usize;
        Self::new(name, capacity)
    }
}

#[async_trait]
impl Queue for ChannelQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn push(&self, value: Bytes) -> Result<(), Closed> {
        loop {
            if self.closed.load(Ordering::SeqCst) {
                return Err(Closed);
            }
            {
                let mut buf = self.buf.lock();
                if buf.len() < self.capacity {
                    buf.push_back(value);
                    self.notify.notify_waiters();
                    return Ok(());
                }
            }
            self.notify.notified().await;
        }
    }

    async fn pop(&self) -> Result<Bytes, Closed> {
        loop {
            {
                let mut buf = self.buf.lock();
                if let Some(value) = buf.pop_front() {
                    self.notify.notify_waiters();
                    return Ok(value);
                }
                if self.closed.load(Ordering::SeqCst) {
                    return Err(Closed);
                }
            }
            self.notify.notified().await;
        }
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    fn reset(&self) {
        self.closed.store(false, Ordering::SeqCst);
        self.buf.lock().clear();
    }

    fn len(&self) -> usize {
        self.buf.lock().len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    async fn monitor(&self, mut control: Control) {
        loop {
            control.publish_stats(serde_json::json!({
                "name": self.name,
                "len": self.len(),
                "capacity": self.capacity,
            }));
            tokio::select! {
                _ = control.await_done() => break,
                _ = tokio::time::sleep(std::time::Duration::from_millis(500)) => {}
            }
        }
        control.publish_final_stats(serde_json::json!({
            "name": self.name,
            "len": self.len(),
            "capacity": self.capacity,
        }));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn push_then_pop_is_fifo() {
        let q = ChannelQueue::new("q", 4);
        q.push(Bytes::from_static(b"a")).await.unwrap();
        q.push(Bytes::from_static(b"b")).await.unwrap();
        assert_eq!(q.pop().await.unwrap(), Bytes::from_static(b"a"));
        assert_eq!(q.pop().await.unwrap(), Bytes::from_static(b"b"));
    }

    #[tokio::test]
    async fn closed_queue_fails_push_but_drains_pop() {
        let q = ChannelQueue::new("q", 4);
        q.push(Bytes::from_static(b"a")).await.unwrap();
        q.close();
        assert!(q.push(Bytes::from_static(b"b")).await.is_err());
        assert_eq!(q.pop().await.unwrap(), Bytes::from_static(b"a"));
        assert!(q.pop().await.is_err());
    }
}
