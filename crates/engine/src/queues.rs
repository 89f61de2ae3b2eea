// SPDX-License-Identifier: MIT

//! Per-key serial queues.
//!
//! One FIFO per routing key, concurrency exactly 1 per key, unbounded
//! across keys. This is what prevents two concurrent updates for the same
//! account from racing on the same branch or rate-limit budget. Backlog
//! depth is unbounded and there is no backpressure signal: a stuck account
//! grows its own backlog without affecting other accounts, and without
//! bound. Queues are process-lifetime state, reclaimed only by restart.

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use updot_core::RoutingKey;

type Task = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

#[derive(Default)]
struct KeyQueue {
    backlog: VecDeque<Task>,
    running: bool,
}

/// Registry of per-key serial queues with create-if-absent lookup.
#[derive(Clone, Default)]
pub struct SerialQueues {
    inner: Arc<Mutex<HashMap<RoutingKey, KeyQueue>>>,
}

impl SerialQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task to the key's FIFO and start a drain task if the key
    /// is idle. Tasks for one key run strictly in enqueue order, one at a
    /// time; tasks for different keys run concurrently.
    pub fn enqueue<F>(&self, key: RoutingKey, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let start_drain = {
            let mut map = self.inner.lock();
            let queue = map.entry(key.clone()).or_default();
            queue.backlog.push_back(Box::pin(task));
            if queue.running {
                false
            } else {
                queue.running = true;
                true
            }
        };

        if start_drain {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                loop {
                    // The guard never lives across the await below.
                    let next = {
                        let mut map = inner.lock();
                        match map.get_mut(&key) {
                            Some(queue) => match queue.backlog.pop_front() {
                                Some(task) => Some(task),
                                None => {
                                    queue.running = false;
                                    None
                                }
                            },
                            None => None,
                        }
                    };
                    match next {
                        Some(task) => task.await,
                        None => break,
                    }
                }
            });
        }
    }

    /// Whether a task for this key is currently executing or queued.
    pub fn is_busy(&self, key: &RoutingKey) -> bool {
        self.inner.lock().get(key).map(|q| q.running).unwrap_or(false)
    }

    /// Queued (not yet started) tasks for a key.
    pub fn backlog(&self, key: &RoutingKey) -> usize {
        self.inner.lock().get(key).map(|q| q.backlog.len()).unwrap_or(0)
    }

    /// Number of keys ever seen. Queues are never destroyed.
    pub fn key_count(&self) -> usize {
        self.inner.lock().len()
    }

    /// True when no key has running or queued work.
    pub fn is_idle(&self) -> bool {
        self.inner.lock().values().all(|q| !q.running && q.backlog.is_empty())
    }

    /// Test helper: wait until every queue has drained.
    #[cfg(any(test, feature = "test-support"))]
    pub async fn wait_idle(&self) {
        while !self.is_idle() {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
    }
}

#[cfg(test)]
#[path = "queues_tests.rs"]
mod tests;
