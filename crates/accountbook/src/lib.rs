//! `shopledger-accountbook` — account book and cash flow projections.

pub mod book;
pub mod cashflow;
pub mod entry;

pub use book::{AccountBook, AccountBookProjector, BookError, BookResult};
pub use cashflow::{CashFlow, CashFlowProjector};
pub use entry::{DateRange, LedgerEntry};
