// SPDX-License-Identifier: MIT

//! Rate-limited write gate.
//!
//! The hosting API enforces abuse-rate limits per installation and per IP.
//! Every mutating call in the process goes through one gate, which executes
//! them strictly one at a time with a fixed minimum spacing between
//! dispatches. This is the true global concurrency bound; the per-key
//! queues only shard ordering. Reads bypass the gate entirely.

use crate::client::HostClient;
use crate::error::HostError;
use crate::ops::{WriteOp, WriteResult};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use updot_core::UpdotConfig;

/// Global serializer for mutating hosting-API calls.
pub struct WriteGate {
    spacing: Duration,
    /// Instant the previous operation was dispatched at. The mutex is held
    /// across the spacing sleep and the call itself, which is what makes
    /// the serialization strict.
    last_dispatch: Mutex<Option<Instant>>,
}

impl WriteGate {
    pub fn new(spacing: Duration) -> Self {
        Self { spacing, last_dispatch: Mutex::new(None) }
    }

    pub fn from_config(config: &UpdotConfig) -> Self {
        Self::new(Duration::from_millis(config.write_spacing_ms))
    }

    pub fn spacing(&self) -> Duration {
        self.spacing
    }

    /// Execute one mutating operation, spaced at least `spacing` after the
    /// previous one began.
    pub async fn submit(
        &self,
        client: &dyn HostClient,
        op: WriteOp,
    ) -> Result<WriteResult, HostError> {
        let mut last = self.last_dispatch.lock().await;
        if let Some(prev) = *last {
            tokio::time::sleep_until(prev + self.spacing).await;
        }
        *last = Some(Instant::now());
        tracing::trace!(?op, "write gate dispatch");
        client.write(op).await
    }
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
