// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! updot-engine: broker consumption, routing, per-key serial queues, and
//! job handlers.
//!
//! The pipeline is: broker delivery, routing-key resolution, per-key FIFO,
//! worker execution, handler, follow-up publication. Ordering is guaranteed
//! only within one routing key; the write gate in `updot-hosting` bounds
//! global mutation throughput underneath all of it.

pub mod accounts;
pub mod broker;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod queues;
pub mod routing;
pub mod worker;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use accounts::{AccountStore, StoreError};
pub use broker::{Broker, BrokerError, Delivery};
pub use dispatch::Dispatcher;
pub use error::DispatchError;
pub use handlers::{
    HandlerContext, HandlerError, HandlerRegistry, InitialBranchHandler, JobHandler,
    VersionBranchHandler,
};
pub use queues::SerialQueues;
pub use routing::resolve_routing_key;
pub use worker::Worker;
