//! Deposits and fund transfers.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use shopledger_core::{AccountId, DepositId, LocationId, TransferId};
use shopledger_documents::{Deposit, DepositStore, FundTransfer, Sequencer, TransferStore};
use shopledger_ledger::AccountStore;

use super::WorkflowResult;

pub struct TreasuryWorkflow<DB, A> {
    db: Arc<DB>,
    accounts: Arc<A>,
}

impl<DB, A> Clone for TreasuryWorkflow<DB, A> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            accounts: Arc::clone(&self.accounts),
        }
    }
}

impl<DB, A> TreasuryWorkflow<DB, A>
where
    DB: DepositStore + TransferStore + Sequencer,
    A: AccountStore,
{
    pub fn new(db: Arc<DB>, accounts: Arc<A>) -> Self {
        Self { db, accounts }
    }

    /// Add outside money to an account.
    pub async fn record_deposit(
        &self,
        to_account: AccountId,
        amount: i64,
        note: Option<String>,
        business_location: LocationId,
        date_time: DateTime<Utc>,
    ) -> WorkflowResult<Deposit> {
        // Fails before any balance moves if the account is missing.
        self.accounts.get(to_account).await?;

        let deposit = Deposit {
            id: DepositId::new(),
            to_account,
            amount,
            note,
            reference_no: self.db.next_reference("DEP").await?,
            business_location,
            date_time,
        };
        self.db.insert_deposit(deposit.clone()).await?;
        let balance = self.accounts.adjust_balance(to_account, amount).await?;
        info!(account = %to_account, amount, balance, "recorded deposit");
        Ok(deposit)
    }

    /// Move money between two tracked accounts. Debits the source, credits
    /// the destination; the combined balance across accounts is unchanged.
    pub async fn transfer_funds(
        &self,
        from_account: AccountId,
        to_account: AccountId,
        amount: i64,
        note: Option<String>,
        business_location: LocationId,
        date_time: DateTime<Utc>,
    ) -> WorkflowResult<FundTransfer> {
        // Both ends must exist before either balance moves.
        self.accounts.get(from_account).await?;
        self.accounts.get(to_account).await?;

        let transfer = FundTransfer {
            id: TransferId::new(),
            from_account,
            to_account,
            amount,
            note,
            reference_no: self.db.next_reference("TRF").await?,
            business_location,
            date_time,
        };
        self.db.insert_transfer(transfer.clone()).await?;
        self.accounts.adjust_balance(from_account, -amount).await?;
        self.accounts.adjust_balance(to_account, amount).await?;
        info!(from = %from_account, to = %to_account, amount, "transferred funds");
        Ok(transfer)
    }
}
