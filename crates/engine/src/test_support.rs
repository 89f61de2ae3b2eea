// SPDX-License-Identifier: MIT

//! In-memory collaborators and a wiring harness for dispatch tests.

use crate::accounts::{AccountStore, StoreError};
use crate::broker::{Broker, BrokerError, Delivery};
use crate::dispatch::Dispatcher;
use crate::handlers::{HandlerContext, HandlerRegistry};
use crate::worker::Worker;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use updot_core::{Account, Job, Priority, QueueEntry, QueueName, UpdotConfig};
use updot_core::test_support::CollectingSink;
use updot_hosting::test_support::InMemoryHost;
use updot_hosting::{BuildError, LockfileService, WriteGate};

#[derive(Default)]
struct BrokerState {
    published: Vec<(QueueName, QueueEntry)>,
    acked: Vec<u64>,
    discarded: Vec<Job>,
    ready: VecDeque<(Priority, Delivery)>,
    next_tag: u64,
    fail_publishes: u32,
}

/// In-memory [`Broker`] that models at-least-once redelivery.
///
/// Pending deliveries are ordered by priority class, FIFO within a class.
/// A requeued rejection re-enters at the head of the queue flagged as
/// redelivered, with the attempt counter stamped the way a real
/// publisher-side retry would stamp it. Delay hints are recorded on the
/// published entry but not simulated; tests drive time explicitly.
#[derive(Default)]
pub struct MemoryBroker {
    state: Mutex<BrokerState>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh (first-attempt) delivery without going through publish.
    pub fn delivery(&self, queue: QueueName, job: Job) -> Delivery {
        let mut state = self.state.lock();
        state.next_tag += 1;
        Delivery { queue, job, redelivered: false, tag: state.next_tag }
    }

    /// Pop the next pending delivery across both queues, if any.
    pub fn take_delivery(&self) -> Option<Delivery> {
        self.state.lock().ready.pop_front().map(|(_, delivery)| delivery)
    }

    /// Fail the next `n` publish calls.
    pub fn fail_next_publishes(&self, n: u32) {
        self.state.lock().fail_publishes = n;
    }

    pub fn published(&self) -> Vec<(QueueName, QueueEntry)> {
        self.state.lock().published.clone()
    }

    pub fn acked_count(&self) -> usize {
        self.state.lock().acked.len()
    }

    /// Jobs rejected without requeue.
    pub fn discarded(&self) -> Vec<Job> {
        self.state.lock().discarded.clone()
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().ready.len()
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn publish(&self, queue: QueueName, entry: QueueEntry) -> Result<(), BrokerError> {
        let mut state = self.state.lock();
        if state.fail_publishes > 0 {
            state.fail_publishes -= 1;
            return Err(BrokerError::Publish("broker unavailable".to_string()));
        }
        state.next_tag += 1;
        let tag = state.next_tag;
        let delivery = Delivery { queue, job: entry.job.clone(), redelivered: false, tag };
        // Insert behind every entry of equal or higher priority.
        let position = state
            .ready
            .iter()
            .position(|(priority, _)| *priority < entry.priority)
            .unwrap_or(state.ready.len());
        state.ready.insert(position, (entry.priority, delivery));
        state.published.push((queue, entry));
        Ok(())
    }

    async fn consume(&self, queue: QueueName) -> Result<Option<Delivery>, BrokerError> {
        let mut state = self.state.lock();
        let position = state.ready.iter().position(|(_, delivery)| delivery.queue == queue);
        Ok(position.and_then(|i| state.ready.remove(i)).map(|(_, delivery)| delivery))
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), BrokerError> {
        self.state.lock().acked.push(delivery.tag);
        Ok(())
    }

    async fn reject(&self, delivery: &Delivery, requeue: bool) -> Result<(), BrokerError> {
        let mut state = self.state.lock();
        if requeue {
            state.next_tag += 1;
            let tag = state.next_tag;
            // Redeliveries go back to the head, ahead of fresh publishes.
            state.ready.push_front((
                Priority::High,
                Delivery {
                    queue: delivery.queue,
                    job: delivery.job.next_attempt(),
                    redelivered: true,
                    tag,
                },
            ));
        } else {
            state.discarded.push(delivery.job.clone());
        }
        Ok(())
    }
}

#[derive(Default)]
struct AccountsState {
    accounts: HashMap<u64, Account>,
    fail_lookups: u32,
}

/// In-memory [`AccountStore`] with failure injection.
#[derive(Default)]
pub struct MemoryAccountStore {
    state: Mutex<AccountsState>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, account: Account) {
        self.state.lock().accounts.insert(account.id, account);
    }

    /// Fail the next `n` lookups with a backend error.
    pub fn fail_next_lookups(&self, n: u32) {
        self.state.lock().fail_lookups = n;
    }

    fn check_failure(&self) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        if state.fail_lookups > 0 {
            state.fail_lookups -= 1;
            return Err(StoreError::Backend("store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn get_account(&self, id: u64) -> Result<Option<Account>, StoreError> {
        self.check_failure()?;
        Ok(self.state.lock().accounts.get(&id).cloned())
    }

    async fn get_account_id_by_login(&self, login: &str) -> Result<Option<u64>, StoreError> {
        self.check_failure()?;
        Ok(self
            .state
            .lock()
            .accounts
            .values()
            .find(|account| account.login == login)
            .map(|account| account.id))
    }
}

/// Deterministic lockfile regeneration: a line per updated manifest.
pub struct FixedLockfiles;

#[async_trait]
impl LockfileService for FixedLockfiles {
    async fn regenerate(
        &self,
        manifests: &HashMap<String, String>,
        _lockfile: &str,
    ) -> Result<String, BuildError> {
        let mut paths: Vec<&String> = manifests.keys().collect();
        paths.sort();
        let mut body = String::from("# lockfile\n");
        for path in paths {
            body.push_str(&format!("{path} {}\n", manifests[path].len()));
        }
        Ok(body)
    }
}

/// Lockfile service that always fails, for error-path tests.
pub struct BrokenLockfiles;

#[async_trait]
impl LockfileService for BrokenLockfiles {
    async fn regenerate(
        &self,
        _manifests: &HashMap<String, String>,
        _lockfile: &str,
    ) -> Result<String, BuildError> {
        Err(BuildError::Lockfile("regeneration service unavailable".to_string()))
    }
}

/// Handler that succeeds with no follow-ups.
pub struct NoopHandler;

#[async_trait]
impl crate::handlers::JobHandler for NoopHandler {
    async fn execute(
        &self,
        _ctx: &HandlerContext,
        _job: &Job,
    ) -> Result<Vec<Job>, crate::handlers::HandlerError> {
        Ok(vec![])
    }
}

/// Handler that always fails with a permanent error.
pub struct FailingHandler;

#[async_trait]
impl crate::handlers::JobHandler for FailingHandler {
    async fn execute(
        &self,
        _ctx: &HandlerContext,
        _job: &Job,
    ) -> Result<Vec<Job>, crate::handlers::HandlerError> {
        Err(crate::handlers::HandlerError::Payload("induced failure".to_string()))
    }
}

/// Fully wired dispatch pipeline over in-memory collaborators.
pub struct Harness {
    pub host: Arc<InMemoryHost>,
    pub broker: Arc<MemoryBroker>,
    pub accounts: Arc<MemoryAccountStore>,
    pub events: Arc<CollectingSink>,
    pub dispatcher: Dispatcher,
}

impl Harness {
    /// Harness with the standard registry and a zero-spacing write gate.
    pub fn new() -> Self {
        Self::with_registry(HandlerRegistry::standard())
    }

    pub fn with_registry(registry: HandlerRegistry) -> Self {
        let host = Arc::new(InMemoryHost::new());
        let broker = Arc::new(MemoryBroker::new());
        let accounts = Arc::new(MemoryAccountStore::new());
        let events = Arc::new(CollectingSink::new());
        let ctx = Arc::new(HandlerContext {
            host: Arc::clone(&host) as Arc<dyn updot_hosting::HostClient>,
            gate: Arc::new(WriteGate::new(Duration::ZERO)),
            accounts: Arc::clone(&accounts) as Arc<dyn AccountStore>,
            lockfiles: Arc::new(FixedLockfiles),
            config: Arc::new(UpdotConfig::default()),
            events: Arc::clone(&events) as Arc<dyn updot_core::EventSink>,
        });
        let worker =
            Arc::new(Worker::new(Arc::new(registry), ctx, Arc::clone(&broker) as Arc<dyn Broker>));
        let dispatcher = Dispatcher::new(
            worker,
            Arc::clone(&accounts) as Arc<dyn AccountStore>,
            Arc::clone(&broker) as Arc<dyn Broker>,
            Arc::clone(&events) as Arc<dyn updot_core::EventSink>,
        );
        Self { host, broker, accounts, events, dispatcher }
    }

    /// Dispatch a first-attempt delivery of `job` on the jobs queue.
    pub async fn dispatch_job(&self, job: Job) {
        let delivery = self.broker.delivery(QueueName::Jobs, job);
        self.dispatcher.dispatch(delivery).await;
    }

    /// Drain every pending broker delivery through the dispatcher until the
    /// system settles. This is how redeliveries and follow-ups get run.
    pub async fn run_to_quiescence(&self) {
        loop {
            self.dispatcher.queues().wait_idle().await;
            match self.broker.take_delivery() {
                Some(delivery) => self.dispatcher.dispatch(delivery).await,
                None => break,
            }
        }
        self.dispatcher.queues().wait_idle().await;
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
