//! Chain watcher
//!
//! Polls the connected network and reports new blocks and chain switches
//! on a stream the caller owns. There is no global listener: each
//! `Subscription` has its own task, stopped by `cancel()` or by dropping
//! the handle. A `NetworkChanged` event means the current `Session` is
//! stale and should be rebuilt.

use crate::clients::Network;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

const EVENT_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainEvent {
    NewBlock(u64),
    NetworkChanged { from: u64, to: u64 },
}

pub struct ChainWatcher {
    network: Arc<dyn Network>,
    interval: Duration,
}

impl ChainWatcher {
    pub fn new(network: Arc<dyn Network>, interval: Duration) -> Self {
        Self { network, interval }
    }

    /// Start polling on the current runtime.
    pub fn spawn(self) -> Subscription {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let handle = tokio::spawn(self.run(tx));
        Subscription {
            events: ReceiverStream::new(rx),
            handle,
        }
    }

    async fn run(self, tx: mpsc::Sender<ChainEvent>) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut chain_id: Option<u64> = None;
        let mut last_block: Option<u64> = None;

        info!("Chain watcher started (every {}ms)", self.interval.as_millis());
        loop {
            interval.tick().await;

            match self.network.chain_id().await {
                Ok(current) => {
                    if let Some(previous) = chain_id.filter(|&id| id != current) {
                        warn!("Network changed: chain {} -> {}", previous, current);
                        last_block = None;
                        let event = ChainEvent::NetworkChanged {
                            from: previous,
                            to: current,
                        };
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    chain_id = Some(current);
                }
                Err(e) => {
                    warn!("Chain id poll failed: {}", e);
                    continue;
                }
            }

            match self.network.block_number().await {
                Ok(block) if last_block.map_or(true, |last| block > last) => {
                    debug!("New block {}", block);
                    last_block = Some(block);
                    if tx.send(ChainEvent::NewBlock(block)).await.is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(e) => warn!("Block number poll failed: {}", e),
            }
        }
        debug!("Chain watcher stopped: subscriber gone");
    }
}

/// Caller-owned handle over a running watcher.
pub struct Subscription {
    events: ReceiverStream<ChainEvent>,
    handle: JoinHandle<()>,
}

impl Subscription {
    pub async fn next(&mut self) -> Option<ChainEvent> {
        self.events.next().await
    }

    /// Stop the watcher. Events already buffered are still delivered.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Stream for Subscription {
    type Item = ChainEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<ChainEvent>> {
        Pin::new(&mut self.events).poll_next(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
