// SPDX-License-Identifier: MIT

//! Job execution and failure classification.
//!
//! The worker is the single place that decides broker semantics: every
//! delivery ends in exactly one ack or reject, and every terminal outcome
//! emits exactly one observability event. Handlers only raise typed
//! errors; the classification table lives here.

use crate::broker::{Broker, BrokerError, Delivery};
use crate::handlers::{HandlerContext, HandlerRegistry};
use crate::routing::probe_account_id;
use std::sync::Arc;
use updot_core::{
    schedule_priority, Clock, Event, FailureKind, Job, Plan, QueueEntry, QueueName, SystemClock,
};

pub struct Worker {
    registry: Arc<HandlerRegistry>,
    ctx: Arc<HandlerContext>,
    broker: Arc<dyn Broker>,
    clock: Arc<dyn Clock>,
}

impl Worker {
    pub fn new(
        registry: Arc<HandlerRegistry>,
        ctx: Arc<HandlerContext>,
        broker: Arc<dyn Broker>,
    ) -> Self {
        Self { registry, ctx, broker, clock: Arc::new(SystemClock) }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Execute one delivery to a terminal broker outcome.
    ///
    /// Never returns an error: a delivery the broker handed us must end in
    /// ack or reject, and the only caller is a fire-and-forget queue task.
    pub async fn run(&self, delivery: Delivery) {
        let job = delivery.job.clone();

        let Some(handler) = self.registry.get(&job.name) else {
            tracing::warn!(job = %job.id, name = %job.name, "no handler registered");
            self.ctx.events.emit(Event::JobFailed {
                job: job.id.clone(),
                name: job.name.clone(),
                classification: FailureKind::HandlerNotFound,
                requeued: false,
                runtime_ms: 0,
                error: format!("no handler registered for '{}'", job.name),
            });
            self.finish(self.broker.reject(&delivery, false).await);
            return;
        };

        self.ctx.events.emit(Event::JobStarted { job: job.id.clone(), name: job.name.clone() });
        let started = self.clock.epoch_ms();

        let result = handler.execute(&self.ctx, &job).await;
        let follow_ups = match result {
            Ok(follow_ups) => follow_ups,
            Err(err) => {
                let runtime_ms = self.clock.epoch_ms().saturating_sub(started);
                self.fail(&delivery, err.is_transient_auth(), runtime_ms, err.to_string()).await;
                return;
            }
        };

        if let Err(err) = self.schedule_follow_ups(&follow_ups).await {
            // Follow-ups could not be published, so this run did not fully
            // take effect. The redelivery will rebuild idempotently.
            let runtime_ms = self.clock.epoch_ms().saturating_sub(started);
            self.fail(&delivery, false, runtime_ms, err.to_string()).await;
            return;
        }

        self.finish(self.broker.ack(&delivery).await);
        self.ctx.events.emit(Event::JobSucceeded {
            job: job.id,
            name: job.name,
            runtime_ms: self.clock.epoch_ms().saturating_sub(started),
            follow_ups: follow_ups.len(),
        });
    }

    /// Classify a failed delivery and emit its terminal event.
    ///
    /// Transient auth failures requeue unconditionally; anything else is
    /// retried exactly once, then discarded as poison.
    async fn fail(&self, delivery: &Delivery, transient_auth: bool, runtime_ms: u64, error: String) {
        let job = &delivery.job;
        if transient_auth {
            tracing::warn!(job = %job.id, name = %job.name, runtime_ms, %error, "transient auth failure, requeueing");
            self.ctx.events.emit(Event::JobFailed {
                job: job.id.clone(),
                name: job.name.clone(),
                classification: FailureKind::TransientAuth,
                requeued: true,
                runtime_ms,
                error,
            });
            self.finish(self.broker.reject(delivery, true).await);
        } else if !delivery.is_retry() {
            tracing::warn!(job = %job.id, name = %job.name, runtime_ms, %error, "job failed, requeueing once");
            self.ctx.events.emit(Event::JobFailed {
                job: job.id.clone(),
                name: job.name.clone(),
                classification: FailureKind::HandlerFailed,
                requeued: true,
                runtime_ms,
                error,
            });
            self.finish(self.broker.reject(delivery, true).await);
        } else {
            tracing::error!(job = %job.id, name = %job.name, runtime_ms, %error, "redelivered job failed again, discarding");
            self.ctx.events.emit(Event::JobPoisoned {
                job: job.id.clone(),
                name: job.name.clone(),
                runtime_ms,
                error,
            });
            self.finish(self.broker.reject(delivery, false).await);
        }
    }

    /// Publish follow-up descriptors, each at a freshly computed priority.
    async fn schedule_follow_ups(&self, follow_ups: &[Job]) -> Result<(), BrokerError> {
        for follow in follow_ups {
            let plan = self.plan_for(follow).await;
            let priority = schedule_priority(plan, &follow.name);
            self.ctx.events.emit(Event::FollowUpScheduled {
                job: follow.id.clone(),
                name: follow.name.clone(),
                priority,
            });
            self.broker.publish(QueueName::Jobs, QueueEntry::new(follow.clone(), priority)).await?;
        }
        Ok(())
    }

    /// Plan of the account a follow-up belongs to. A missing account or a
    /// store fault degrades to no plan (lowest applicable priority) rather
    /// than failing the job that already ran.
    async fn plan_for(&self, job: &Job) -> Option<Plan> {
        let id = probe_account_id(&job.payload)?;
        match self.ctx.accounts.get_account(id).await {
            Ok(account) => account.map(|a| a.plan),
            Err(err) => {
                tracing::warn!(account = id, error = %err, "plan lookup failed, scheduling without plan");
                None
            }
        }
    }

    /// Broker ack/reject faults cannot change the job outcome; the message
    /// stays pending and redelivers, which the idempotent handlers absorb.
    fn finish(&self, result: Result<(), BrokerError>) {
        if let Err(err) = result {
            tracing::error!(error = %err, "broker settle failed");
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
