// SPDX-License-Identifier: MIT

//! Account lookup collaborator.

use async_trait::async_trait;
use thiserror::Error;
use updot_core::Account;

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("account store: {0}")]
    Backend(String),
}

/// Key/value account store with a login secondary index.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn get_account(&self, id: u64) -> Result<Option<Account>, StoreError>;

    /// Secondary lookup used when a payload carries only a login name.
    async fn get_account_id_by_login(&self, login: &str) -> Result<Option<u64>, StoreError>;
}
