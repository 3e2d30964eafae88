//! Line-oriented stdin ingester: reads `\n`-terminated records from the
//! process's standard input until EOF, then waits for shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reservoir_core::{Control, Ingester, Queue};
use tokio::io::{AsyncBufReadExt, BufReader};

pub struct StdinIngester {
    eof: AtomicBool,
}

impl Default for StdinIngester {
    fn default() -> Self {
        Self::new()
    }
}

impl StdinIngester {
    pub fn new() -> Self {
        Self { eof: AtomicBool::new(false) }
    }
}

#[async_trait]
impl Ingester for StdinIngester {
    fn name(&self) -> &str {
        "stdin"
    }

    async fn ingest(&self, out_queue: Arc<dyn Queue>, mut control: Control) {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while !self.eof.load(Ordering::SeqCst) {
            tokio::select! {
                _ = control.await_done() => return,
                line = lines.next_line() => {
                    match line {
                        Ok(Some(text)) => {
                            let mut record = text.into_bytes();
                            record.push(b'\n');
                            if out_queue.push(Bytes::from(record)).await.is_err() {
                                return;
                            }
                        }
                        Ok(None) => self.eof.store(true, Ordering::SeqCst),
                        Err(err) => {
                            tracing::warn!(error = %err, "stdin ingester: read error, stopping");
                            self.eof.store(true, Ordering::SeqCst);
                        }
                    }
                }
            }
        }

        control.await_done().await;
    }

    async fn monitor(&self, mut control: Control) {
        control.await_done().await;
        control.publish_final_stats(serde_json::json!({"name": self.name()}));
    }
}
