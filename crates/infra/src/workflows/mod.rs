//! Document workflows: the write-side services tying stores, the stock
//! manager, and the ledger applier together.
//!
//! Shared protocol: creating a document applies its payments after it is
//! persisted; editing payments reverts the old list, persists the new one,
//! then applies it; deleting reverts payments (and stock where the document
//! moved stock) and soft-deletes. There is no cross-store transaction, so
//! the revert steps are what keeps balances and stock honest.

mod expenses;
mod purchasing;
mod sales;
mod settlements;
mod treasury;

use thiserror::Error;

use shopledger_core::DomainError;
use shopledger_ledger::LedgerError;
use shopledger_stock::StockError;

pub use expenses::{ExpenseWorkflow, NewExpense};
pub use purchasing::{NewPurchase, NewPurchaseLine, PurchaseWorkflow};
pub use sales::{NewSale, NewSaleLine, SaleWorkflow};
pub use settlements::SettlementWorkflow;
pub use treasury::TreasuryWorkflow;

pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Deleting a sale that has live returns would orphan the return's
    /// stock and refund records.
    #[error("sale has live returns and cannot be deleted")]
    HasLiveReturns,

    #[error(transparent)]
    Stock(#[from] StockError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}
