// SPDX-License-Identifier: MIT

//! Message broker contract.
//!
//! Delivery is at-least-once: the dispatch pipeline never relies on
//! exactly-once and instead keeps handlers idempotent. The broker flags
//! redelivered messages, which is what bounds the retry-once policy in the
//! worker.

use async_trait::async_trait;
use thiserror::Error;
use updot_core::{Job, QueueEntry, QueueName};

#[derive(Debug, Clone, Error)]
pub enum BrokerError {
    #[error("publish failed: {0}")]
    Publish(String),

    #[error("acknowledge failed: {0}")]
    Ack(String),

    #[error("consume failed: {0}")]
    Consume(String),
}

/// One delivery of a job message.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub queue: QueueName,
    pub job: Job,
    /// Set by the broker when this message was delivered before.
    pub redelivered: bool,
    /// Broker-assigned tag identifying this delivery for ack/reject.
    pub tag: u64,
}

impl Delivery {
    /// Whether the worker should treat this as a retry.
    ///
    /// Covers brokers without a native redelivery flag via the attempt
    /// counter stamped on the job itself.
    pub fn is_retry(&self) -> bool {
        self.redelivered || self.job.attempt > 0
    }
}

/// Durable, priority-ordered queues with at-least-once delivery.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Publish an entry, honoring its priority and optional delay.
    async fn publish(&self, queue: QueueName, entry: QueueEntry) -> Result<(), BrokerError>;

    /// Pop the next pending delivery on `queue`, if any.
    ///
    /// Pull-based consumption seam: the dispatcher's run loop drains queues
    /// through this rather than a push subscription, which keeps
    /// backpressure with the consumer. A consumed delivery stays unsettled
    /// until acked or rejected.
    async fn consume(&self, queue: QueueName) -> Result<Option<Delivery>, BrokerError>;

    /// Remove a delivered message permanently.
    async fn ack(&self, delivery: &Delivery) -> Result<(), BrokerError>;

    /// Return a message to the broker. With `requeue` the broker redelivers
    /// it (flagged); without, the message is discarded.
    async fn reject(&self, delivery: &Delivery, requeue: bool) -> Result<(), BrokerError>;
}

#[cfg(test)]
#[path = "broker_tests.rs"]
mod tests;
