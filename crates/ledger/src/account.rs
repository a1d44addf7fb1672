//! Monetary accounts and their persistence seam.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shopledger_core::{AccountId, LocationId};

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger-level error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("account {0} not found")]
    AccountNotFound(AccountId),
}

/// A monetary account.
///
/// `balance` is a denormalized running total updated on every payment event;
/// the ledger fold over transaction history starting at `initial_balance` is
/// the source of truth. The two agree as long as every apply has a matching
/// revert (the reconstruction invariant checked by the account book).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub account_number: String,
    pub balance: i64,
    /// Immutable after creation; update paths cannot carry it.
    pub initial_balance: i64,
    pub business_location: LocationId,
    pub is_active: bool,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Open an account. The cached balance starts equal to the initial
    /// balance.
    pub fn open(
        name: impl Into<String>,
        account_number: impl Into<String>,
        initial_balance: i64,
        business_location: LocationId,
    ) -> Self {
        Self {
            id: AccountId::new(),
            name: name.into(),
            account_number: account_number.into(),
            balance: initial_balance,
            initial_balance,
            business_location,
            is_active: true,
            note: None,
            created_at: Utc::now(),
        }
    }

    /// Apply a metadata update. `AccountPatch` structurally cannot touch
    /// `balance` or `initial_balance`.
    pub fn apply_patch(&mut self, patch: AccountPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(number) = patch.account_number {
            self.account_number = number;
        }
        if let Some(note) = patch.note {
            self.note = Some(note);
        }
        if let Some(active) = patch.is_active {
            self.is_active = active;
        }
    }
}

/// Updatable account metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPatch {
    pub name: Option<String>,
    pub account_number: Option<String>,
    pub note: Option<String>,
    pub is_active: Option<bool>,
}

/// Store of monetary accounts.
///
/// `adjust_balance` must be an atomic increment (no read-modify-write race);
/// each balance mutation is its own committed step.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn insert(&self, account: Account) -> LedgerResult<()>;

    async fn get(&self, id: AccountId) -> LedgerResult<Account>;

    /// Atomically add `delta` to the cached balance; returns the new value.
    async fn adjust_balance(&self, id: AccountId, delta: i64) -> LedgerResult<i64>;

    async fn update(&self, id: AccountId, patch: AccountPatch) -> LedgerResult<Account>;

    async fn all_active(&self) -> LedgerResult<Vec<Account>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_cannot_move_balances() {
        let mut account = Account::open("Till", "ACC-001", 5_000, LocationId::new());
        let before_balance = account.balance;
        let before_initial = account.initial_balance;

        account.apply_patch(AccountPatch {
            name: Some("Front till".into()),
            is_active: Some(false),
            ..AccountPatch::default()
        });

        assert_eq!(account.name, "Front till");
        assert!(!account.is_active);
        assert_eq!(account.balance, before_balance);
        assert_eq!(account.initial_balance, before_initial);
    }

    #[test]
    fn open_starts_balanced() {
        let account = Account::open("Bank", "ACC-002", 12_345, LocationId::new());
        assert_eq!(account.balance, account.initial_balance);
    }
}
