//! `shopledger-documents` — transaction documents and their store seams.

pub mod expense;
pub mod purchase;
pub mod returns;
pub mod sale;
pub mod store;
pub mod treasury;

pub use expense::Expense;
pub use purchase::{Purchase, PurchaseLine, PurchaseOrigin, PurchaseStatus};
pub use returns::{PurchaseReturn, ReturnedLine, SaleReturn};
pub use sale::{Sale, SaleLine, SaleStatus};
pub use store::{
    format_reference, DepositStore, ExpenseStore, PurchaseReturnStore, PurchaseStore,
    SaleReturnStore, SaleStore, Sequencer, TransferStore,
};
pub use treasury::{Deposit, FundTransfer};
