// SPDX-License-Identifier: MIT

//! Delivery dispatch: routing-key resolution plus per-key serialization.
//!
//! The dispatcher pulls deliveries off the broker, resolves each to a
//! routing key and hands it to that key's serial queue. Everything after
//! resolution (execution, classification, ack/reject) belongs to the
//! worker.

use crate::accounts::AccountStore;
use crate::broker::{Broker, BrokerError, Delivery};
use crate::error::DispatchError;
use crate::queues::SerialQueues;
use crate::routing::resolve_routing_key;
use crate::worker::Worker;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use updot_core::{Event, EventSink, FailureKind, QueueName};

/// How long the run loop sleeps when both queues are empty.
const IDLE_POLL: Duration = Duration::from_millis(50);

pub struct Dispatcher {
    queues: SerialQueues,
    worker: Arc<Worker>,
    accounts: Arc<dyn AccountStore>,
    broker: Arc<dyn Broker>,
    events: Arc<dyn EventSink>,
}

impl Dispatcher {
    pub fn new(
        worker: Arc<Worker>,
        accounts: Arc<dyn AccountStore>,
        broker: Arc<dyn Broker>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self { queues: SerialQueues::new(), worker, accounts, broker, events }
    }

    pub fn queues(&self) -> &SerialQueues {
        &self.queues
    }

    /// Consume both broker queues until `shutdown` is notified.
    ///
    /// Deliveries already handed to a serial queue keep running after the
    /// loop stops pulling; a delivery consumed but not yet dispatched when
    /// shutdown wins the race stays unsettled and redelivers.
    pub async fn run(&self, shutdown: &Notify) {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.notified() => break,
                next = self.next_delivery() => match next {
                    Ok(Some(delivery)) => self.dispatch(delivery).await,
                    Ok(None) => tokio::time::sleep(IDLE_POLL).await,
                    Err(err) => {
                        tracing::error!(error = %err, "broker consume failed");
                        tokio::time::sleep(IDLE_POLL).await;
                    }
                },
            }
        }
        tracing::info!("dispatcher run loop stopped");
    }

    /// Next delivery across both queues. Events drain ahead of jobs.
    async fn next_delivery(&self) -> Result<Option<Delivery>, BrokerError> {
        for queue in [QueueName::Events, QueueName::Jobs] {
            if let Some(delivery) = self.broker.consume(queue).await? {
                return Ok(Some(delivery));
            }
        }
        Ok(None)
    }

    /// Route one delivery onto its key's serial queue.
    ///
    /// An unroutable payload is malformed, not transient: it is rejected
    /// without requeue and never reaches a handler. A store fault during
    /// the login lookup requeues, since the lookup may succeed later.
    pub async fn dispatch(&self, delivery: Delivery) {
        let key = match resolve_routing_key(&delivery.job, self.accounts.as_ref()).await {
            Ok(key) => key,
            Err(DispatchError::NoRoutingKey { job, name }) => {
                tracing::warn!(job = %job, name = %name, "unroutable payload, discarding");
                self.events.emit(Event::JobFailed {
                    job: job.clone(),
                    name,
                    classification: FailureKind::NoRoutingKey,
                    requeued: false,
                    runtime_ms: 0,
                    error: format!("no routing key for job {job}"),
                });
                if let Err(err) = self.broker.reject(&delivery, false).await {
                    tracing::error!(error = %err, "broker settle failed");
                }
                return;
            }
            Err(err) => {
                tracing::warn!(job = %delivery.job.id, error = %err, "routing lookup failed, requeueing");
                if let Err(err) = self.broker.reject(&delivery, true).await {
                    tracing::error!(error = %err, "broker settle failed");
                }
                return;
            }
        };

        tracing::debug!(job = %delivery.job.id, key = %key, "dispatching");
        let worker = Arc::clone(&self.worker);
        self.queues.enqueue(key, async move {
            worker.run(delivery).await;
        });
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
