//! Cash flow projection across one or all accounts.

use std::sync::Arc;

use shopledger_core::{AccountId, LocationId};
use shopledger_documents::{
    DepositStore, ExpenseStore, PurchaseReturnStore, PurchaseStore, SaleReturnStore, SaleStore,
    TransferStore,
};
use shopledger_ledger::AccountStore;

use crate::book::{account_entries, BookResult};
use crate::entry::{DateRange, LedgerEntry};

/// Cash movement over a window.
///
/// In the combined (all-accounts) view, internal fund-transfer legs are
/// listed and still move their account's running balance, but they cancel
/// pairwise and are excluded from `total_debit`/`total_credit`. A
/// single-account view counts its transfer legs normally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CashFlow {
    pub total_debit: i64,
    pub total_credit: i64,
    /// Newest first; `balance` is the running balance of each entry's own
    /// account.
    pub entries: Vec<LedgerEntry>,
}

/// Projects cash movement per account or across every active account.
pub struct CashFlowProjector<DB, A> {
    db: Arc<DB>,
    accounts: Arc<A>,
}

impl<DB, A> Clone for CashFlowProjector<DB, A> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            accounts: Arc::clone(&self.accounts),
        }
    }
}

impl<DB, A> CashFlowProjector<DB, A>
where
    DB: SaleStore
        + PurchaseStore
        + ExpenseStore
        + DepositStore
        + TransferStore
        + SaleReturnStore
        + PurchaseReturnStore,
    A: AccountStore,
{
    pub fn new(db: Arc<DB>, accounts: Arc<A>) -> Self {
        Self { db, accounts }
    }

    /// Project cash flow for one account, or for every active account when
    /// `scope` is `None`.
    pub async fn project(
        &self,
        scope: Option<AccountId>,
        range: DateRange,
        location: Option<LocationId>,
    ) -> BookResult<CashFlow> {
        let accounts = match scope {
            Some(id) => vec![self.accounts.get(id).await?],
            None => self.accounts.all_active().await?,
        };
        let combined = scope.is_none();

        let mut all = Vec::new();
        for account in &accounts {
            let mut entries =
                account_entries(&*self.db, account.id, location, combined).await?;
            entries.sort_by_key(|e| e.date);
            let mut running = account.initial_balance;
            for mut entry in entries {
                running += entry.delta();
                entry.balance = running;
                if range.contains(entry.date) {
                    all.push(entry);
                }
            }
        }

        let total_debit = all
            .iter()
            .filter(|e| !e.exclude_from_totals)
            .map(|e| e.debit)
            .sum();
        let total_credit = all
            .iter()
            .filter(|e| !e.exclude_from_totals)
            .map(|e| e.credit)
            .sum();
        all.sort_by(|a, b| b.date.cmp(&a.date));

        Ok(CashFlow {
            total_debit,
            total_credit,
            entries: all,
        })
    }
}
