// SPDX-License-Identifier: MIT

//! Dispatch-level errors.

use crate::accounts::StoreError;
use crate::broker::BrokerError;
use thiserror::Error;
use updot_core::{JobId, JobName};

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The payload carried no resolvable account identity. A malformed
    /// job, not a transient fault: the message is permanently rejected.
    #[error("no routing key for job {job} ({name})")]
    NoRoutingKey { job: JobId, name: JobName },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Broker(#[from] BrokerError),
}
