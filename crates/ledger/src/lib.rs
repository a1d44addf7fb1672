//! `shopledger-ledger` — accounts, payments, and the balance ledger applier.

pub mod account;
pub mod applier;
pub mod payment;

pub use account::{Account, AccountPatch, AccountStore, LedgerError, LedgerResult};
pub use applier::{LedgerApplier, TxnKind};
pub use payment::{invoice_paid_total, Payment, PaymentStatus};
