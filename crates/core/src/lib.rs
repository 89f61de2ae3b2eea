// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! updot-core: domain types for the dependency-update dispatch pipeline.

pub mod macros;

pub mod account;
pub mod clock;
pub mod config;
pub mod event;
pub mod job;
pub mod priority;
pub mod routing;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use account::{Account, Plan};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{BotIdentity, ConfigError, UpdotConfig};
pub use event::{Event, EventSink, FailureKind, NullSink};
pub use job::{Job, JobId, JobName, QueueEntry, QueueName};
pub use priority::{schedule_priority, Priority};
pub use routing::RoutingKey;
