//! End-to-end topology tests against small fixture stages and an in-memory
//! channel queue, exercising the no-loss-on-orderly-shutdown property and
//! the get_flow/get_reservoir linearization.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::select_all;
use tokio::sync::{Mutex, Notify};

use reservoir_core::adapter::{DigesterAdapter, ExpellerAdapter, IngesterAdapter};
use reservoir_core::control::control_pair;
use reservoir_core::{Closed, Control, ControlHandle, Digester, Expeller, Ingester, Queue, QueueAdapter, Reservoir};

/// A bounded FIFO `Queue` backed by a std mutex and a notify, standing in
/// for a plugin-supplied implementation in these tests.
struct ChannelQueue {
    name: String,
    capacity: usize,
    buf: StdMutex<VecDeque<Bytes>>,
    notify: Notify,
    closed: AtomicBool,
}

impl ChannelQueue {
    fn new(name: &str, capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            capacity,
            buf: StdMutex::new(VecDeque::new()),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
        })
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
                let mut buf = self.buf.lock().expect("queue mutex poisoned");
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
                let mut buf = self.buf.lock().expect("queue mutex poisoned");
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
        self.buf.lock().expect("queue mutex poisoned").clear();
    }

    fn len(&self) -> usize {
        self.buf.lock().expect("queue mutex poisoned").len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    async fn monitor(&self, mut control: Control) {
        loop {
            control.publish_stats(serde_json::json!({"len": self.len()}));
            tokio::select! {
                _ = control.await_done() => break,
                _ = tokio::time::sleep(Duration::from_millis(10)) => {}
            }
        }
        control.publish_final_stats(serde_json::json!({"len": self.len()}));
    }
}

/// Emits a fixed script of records, then blocks until told to stop.
struct ScriptedIngester {
    records: Mutex<Vec<Bytes>>,
}

impl ScriptedIngester {
    fn new(records: Vec<Bytes>) -> Self {
        Self { records: Mutex::new(records) }
    }
}

#[async_trait]
impl Ingester for ScriptedIngester {
    fn name(&self) -> &str {
        "scripted-ingester"
    }

    async fn ingest(&self, out_queue: Arc<dyn Queue>, mut control: Control) {
        let script = self.records.lock().await.drain(..).collect::<Vec<_>>();
        for record in script {
            if out_queue.push(record).await.is_err() {
                return;
            }
        }
        control.await_done().await;
    }

    async fn monitor(&self, _control: Control) {}
}

/// Forwards every record unchanged; drains `in_queue` on shutdown before
/// returning.
struct IdentityDigester;

#[async_trait]
impl Digester for IdentityDigester {
    fn name(&self) -> &str {
        "identity-digester"
    }

    async fn digest(&self, in_queue: Arc<dyn Queue>, out_queue: Arc<dyn Queue>, mut control: Control) {
        loop {
            tokio::select! {
                _ = control.await_done() => break,
                popped = in_queue.pop() => {
                    match popped {
                        Ok(value) => { let _ = out_queue.push(value).await; }
                        Err(Closed) => break,
                    }
                }
            }
        }
        while in_queue.len() > 0 {
            match in_queue.pop().await {
                Ok(value) => {
                    let _ = out_queue.push(value).await;
                }
                Err(Closed) => break,
            }
        }
    }

    async fn monitor(&self, _control: Control) {}
}

/// Accumulates every record it receives into an in-memory list, fanning in
/// fairly across however many input queues it's given.
struct RecordingExpeller {
    records: Arc<Mutex<Vec<Bytes>>>,
}

#[async_trait]
impl Expeller for RecordingExpeller {
    fn name(&self) -> &str {
        "recording-expeller"
    }

    async fn expel(&self, in_queues: Vec<Arc<dyn Queue>>, mut control: Control) {
        loop {
            if control.is_done() {
                break;
            }
            let futs: Vec<_> = in_queues.iter().map(|q| q.pop()).collect();
            tokio::select! {
                _ = control.await_done() => break,
                (result, _idx, _rest) = select_all(futs) => {
                    if let Ok(value) = result {
                        self.records.lock().await.push(value);
                    }
                }
            }
        }
        for q in &in_queues {
            while q.len() > 0 {
                match q.pop().await {
                    Ok(value) => self.records.lock().await.push(value),
                    Err(Closed) => break,
                }
            }
        }
    }

    async fn monitor(&self, _control: Control) {}
}

fn placeholder_handle() -> ControlHandle {
    let (_, handle) = control_pair();
    handle
}

#[tokio::test]
async fn drains_records_through_a_digester_chain_on_orderly_shutdown() {
    let q1 = ChannelQueue::new("q1", 16);
    let q2 = ChannelQueue::new("q2", 16);
    let records = Arc::new(Mutex::new(Vec::new()));

    let ingester: Box<dyn Ingester> = Box::new(ScriptedIngester::new(vec![
        Bytes::from_static(b"a\n"),
        Bytes::from_static(b"b\n"),
        Bytes::from_static(b"c\n"),
    ]));
    let digester: Box<dyn Digester> = Box::new(IdentityDigester);
    let expeller: Box<dyn Expeller> = Box::new(RecordingExpeller { records: records.clone() });

    let digester_queue = QueueAdapter::new(q2, placeholder_handle());
    let digester_adapter = DigesterAdapter::new(digester, digester_queue, placeholder_handle(), placeholder_handle());

    let ingester_queue = QueueAdapter::new(q1, placeholder_handle());
    let ingester_adapter = IngesterAdapter::new(ingester, ingester_queue, vec![digester_adapter], placeholder_handle(), placeholder_handle());

    let expeller_adapter = ExpellerAdapter::new(expeller, vec![ingester_adapter], placeholder_handle(), placeholder_handle());

    let mut reservoir = Reservoir::new("r1".to_string(), expeller_adapter);

    let flow = reservoir.get_flow().expect("not disposed");
    assert_eq!(
        flow,
        vec!["scripted-ingester", "q1", "identity-digester", "q2", "recording-expeller"]
    );

    reservoir.start().expect("start from fresh reservoir");
    assert!(reservoir.start().is_err(), "double start must fail");

    tokio::time::sleep(Duration::from_millis(150)).await;

    reservoir.init_stop().expect("init_stop while running");
    reservoir.update_final().await;
    reservoir.wait().await;

    let got = records.lock().await.clone();
    assert_eq!(
        got,
        vec![Bytes::from_static(b"a\n"), Bytes::from_static(b"b\n"), Bytes::from_static(b"c\n")]
    );
}

#[tokio::test]
async fn start_stop_cycle_is_repeatable() {
    let q1 = ChannelQueue::new("q1", 16);
    let records = Arc::new(Mutex::new(Vec::new()));

    let ingester: Box<dyn Ingester> = Box::new(ScriptedIngester::new(vec![Bytes::from_static(b"x\n")]));
    let expeller: Box<dyn Expeller> = Box::new(RecordingExpeller { records: records.clone() });

    let ingester_queue = QueueAdapter::new(q1, placeholder_handle());
    let ingester_adapter = IngesterAdapter::new(ingester, ingester_queue, Vec::new(), placeholder_handle(), placeholder_handle());
    let expeller_adapter = ExpellerAdapter::new(expeller, vec![ingester_adapter], placeholder_handle(), placeholder_handle());

    let mut reservoir = Reservoir::new("r2".to_string(), expeller_adapter);

    for _ in 0..2 {
        reservoir.start().expect("start");
        tokio::time::sleep(Duration::from_millis(80)).await;
        reservoir.init_stop().expect("init_stop");
        reservoir.wait().await;
    }

    reservoir.dispose().expect("dispose while stopped");
    assert!(reservoir.is_disposed());
    reservoir.retrieve().expect("retrieve");
    assert!(!reservoir.is_disposed());
}
