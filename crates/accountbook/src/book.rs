//! Account book projection: one account's ledger rebuilt from documents.

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use shopledger_core::{AccountId, DomainError, LocationId};
use shopledger_documents::{
    DepositStore, ExpenseStore, PurchaseReturnStore, PurchaseStore, SaleReturnStore, SaleStore,
    TransferStore,
};
use shopledger_ledger::{AccountStore, LedgerError, Payment};

use crate::entry::{DateRange, LedgerEntry};

pub type BookResult<T> = Result<T, BookError>;

#[derive(Debug, Error)]
pub enum BookError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// A single account's projected ledger over a date window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountBook {
    pub account: AccountId,
    /// Balance at the start of the window (initial balance plus everything
    /// before it).
    pub opening_balance: i64,
    pub total_debit: i64,
    pub total_credit: i64,
    /// Balance after the last entry in the window.
    pub closing_balance: i64,
    /// The stored cached balance at projection time. Differs from the fold
    /// only when apply/revert history has drifted.
    pub account_balance: i64,
    /// Newest first.
    pub entries: Vec<LedgerEntry>,
}

fn payment_entry(
    account: AccountId,
    payment: &Payment,
    description: &str,
    reference_no: &str,
    credit: bool,
) -> LedgerEntry {
    let mut entry = if credit {
        LedgerEntry::credit(account, payment.paid_on, description, payment.amount, reference_no)
    } else {
        LedgerEntry::debit(account, payment.paid_on, description, payment.amount, reference_no)
    };
    entry.method = payment.method;
    entry.note = payment.note.clone();
    entry
}

/// Every ledger row touching `account`, unsorted and without running
/// balances. Document queries run concurrently.
pub(crate) async fn account_entries<DB>(
    db: &DB,
    account: AccountId,
    location: Option<LocationId>,
    flag_transfers: bool,
) -> BookResult<Vec<LedgerEntry>>
where
    DB: SaleStore
        + PurchaseStore
        + ExpenseStore
        + DepositStore
        + TransferStore
        + SaleReturnStore
        + PurchaseReturnStore,
{
    let (deposits, transfers_in, transfers_out, sales, purchases, expenses, sale_rets, purchase_rets) = tokio::join!(
        db.deposits_into(account, location),
        db.transfers_into(account, location),
        db.transfers_out_of(account, location),
        db.sales_paying_into(account, location),
        db.purchases_paying_from(account, location),
        db.expenses_paying_from(account, location),
        db.sale_returns_paying_from(account, location),
        db.purchase_returns_paying_into(account, location),
    );

    let mut entries = Vec::new();

    for deposit in deposits? {
        let mut entry = LedgerEntry::credit(
            account,
            deposit.date_time,
            "Deposit",
            deposit.amount,
            deposit.reference_no,
        );
        entry.note = deposit.note;
        entries.push(entry);
    }
    for transfer in transfers_in? {
        let mut entry = LedgerEntry::credit(
            account,
            transfer.date_time,
            "Fund transfer in",
            transfer.amount,
            transfer.reference_no,
        );
        entry.note = transfer.note;
        entry.exclude_from_totals = flag_transfers;
        entries.push(entry);
    }
    for transfer in transfers_out? {
        let mut entry = LedgerEntry::debit(
            account,
            transfer.date_time,
            "Fund transfer out",
            transfer.amount,
            transfer.reference_no,
        );
        entry.note = transfer.note;
        entry.exclude_from_totals = flag_transfers;
        entries.push(entry);
    }
    for sale in sales? {
        for payment in sale.payments.iter().filter(|p| p.account == Some(account)) {
            entries.push(payment_entry(account, payment, "Sale payment", &sale.invoice_no, true));
        }
    }
    for purchase in purchases? {
        for payment in purchase.payments.iter().filter(|p| p.account == Some(account)) {
            entries.push(payment_entry(
                account,
                payment,
                "Purchase payment",
                &purchase.reference_no,
                false,
            ));
        }
    }
    for expense in expenses? {
        for payment in expense.payments.iter().filter(|p| p.account == Some(account)) {
            entries.push(payment_entry(
                account,
                payment,
                "Expense payment",
                &expense.reference_no,
                false,
            ));
        }
    }
    for ret in sale_rets? {
        for payment in ret.return_payments.iter().filter(|p| p.account == Some(account)) {
            entries.push(payment_entry(
                account,
                payment,
                "Sale return refund",
                &ret.reference_no,
                false,
            ));
        }
    }
    for ret in purchase_rets? {
        for payment in ret.return_payments.iter().filter(|p| p.account == Some(account)) {
            entries.push(payment_entry(
                account,
                payment,
                "Purchase return refund",
                &ret.reference_no,
                true,
            ));
        }
    }

    Ok(entries)
}

/// Rebuilds one account's ledger by folding every payment that ever touched
/// it over the initial balance.
pub struct AccountBookProjector<DB, A> {
    db: Arc<DB>,
    accounts: Arc<A>,
}

impl<DB, A> Clone for AccountBookProjector<DB, A> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            accounts: Arc::clone(&self.accounts),
        }
    }
}

impl<DB, A> AccountBookProjector<DB, A>
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

    pub async fn project(
        &self,
        account: AccountId,
        range: DateRange,
        location: Option<LocationId>,
    ) -> BookResult<AccountBook> {
        let record = self.accounts.get(account).await?;
        let mut entries = account_entries(&*self.db, account, location, false).await?;
        entries.sort_by_key(|e| e.date);

        // Fold the full history; entries before the window move the opening
        // balance, entries after it are dropped.
        let mut running = record.initial_balance;
        let mut opening = record.initial_balance;
        let mut total_debit = 0;
        let mut total_credit = 0;
        let mut kept = Vec::new();
        for mut entry in entries {
            running += entry.delta();
            entry.balance = running;
            if range.precedes(entry.date) {
                opening = running;
                continue;
            }
            if !range.contains(entry.date) {
                continue;
            }
            total_debit += entry.debit;
            total_credit += entry.credit;
            kept.push(entry);
        }
        let closing_balance = kept.last().map(|e| e.balance).unwrap_or(opening);

        if range.from.is_none() && range.to.is_none() && closing_balance != record.balance {
            warn!(
                account = %account,
                cached = record.balance,
                reconstructed = closing_balance,
                "account balance drifted from ledger history"
            );
        }

        kept.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(AccountBook {
            account,
            opening_balance: opening,
            total_debit,
            total_credit,
            closing_balance,
            account_balance: record.balance,
            entries: kept,
        })
    }
}
