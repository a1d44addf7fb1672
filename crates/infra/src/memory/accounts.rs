//! In-memory account store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use shopledger_core::AccountId;
use shopledger_ledger::{Account, AccountPatch, AccountStore, LedgerError, LedgerResult};

/// In-memory [`AccountStore`]. Balance adjustments happen under the write
/// lock, matching the atomic-increment contract.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<AccountId, Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn insert(&self, account: Account) -> LedgerResult<()> {
        self.accounts.write().await.insert(account.id, account);
        Ok(())
    }

    async fn get(&self, id: AccountId) -> LedgerResult<Account> {
        self.accounts
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(LedgerError::AccountNotFound(id))
    }

    async fn adjust_balance(&self, id: AccountId, delta: i64) -> LedgerResult<i64> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(&id)
            .ok_or(LedgerError::AccountNotFound(id))?;
        account.balance += delta;
        Ok(account.balance)
    }

    async fn update(&self, id: AccountId, patch: AccountPatch) -> LedgerResult<Account> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(&id)
            .ok_or(LedgerError::AccountNotFound(id))?;
        account.apply_patch(patch);
        Ok(account.clone())
    }

    async fn all_active(&self) -> LedgerResult<Vec<Account>> {
        let mut active: Vec<Account> = self
            .accounts
            .read()
            .await
            .values()
            .filter(|a| a.is_active)
            .cloned()
            .collect();
        active.sort_by_key(|a| a.created_at);
        Ok(active)
    }
}
