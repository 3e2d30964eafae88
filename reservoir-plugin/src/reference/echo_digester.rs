//! Identity digester: forwards every record unchanged.

use std::sync::Arc;

use async_trait::async_trait;
use reservoir_core::{Closed, Control, Digester, Queue};

pub struct EchoDigester;

#[async_trait]
impl Digester for EchoDigester {
    fn name(&self) -> &str {
        "echo"
    }

    async fn digest(&self, in_queue: Arc<dyn Queue>, out_queue: Arc<dyn Queue>, mut control: Control) {
        loop {
            tokio::select! {
                _ = control.await_done() => break,
                popped = in_queue.pop() => {
                    match popped {
                        Ok(value) => {
                            if out_queue.push(value).await.is_err() {
                                return;
                            }
                        }
                        Err(Closed) => return,
                    }
                }
            }
        }

        while !in_queue.is_empty() {
            match in_queue.pop().await {
                Ok(value) => {
                    if out_queue.push(value).await.is_err() {
                        break;
                    }
                }
                Err(Closed) => break,
            }
        }
    }

    async fn monitor(&self, mut control: Control) {
        control.await_done().await;
        control.publish_final_stats(serde_json::json!({"name": self.name()}));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::reference::channel_queue::ChannelQueue;
    use bytes::Bytes;
    use reservoir_core::control::control_pair;

    #[tokio::test]
    async fn forwards_then_drains_on_done() {
        let in_q = ChannelQueue::new("in", 4);
        let out_q = ChannelQueue::new("out", 4);
        in_q.push(Bytes::from_static(b"a\n")).await.unwrap();

        let (control, mut handle) = control_pair();
        handle.signal_done();

        let digester = EchoDigester;
        digester.digest(in_q.clone(), out_q.clone(), control).await;

        assert_eq!(out_q.pop().await.unwrap(), Bytes::from_static(b"a\n"));
    }
}
