//! `shopledger-infra` — in-memory stores, document workflows, and logging
//! wiring for the shop ledger engine.

pub mod memory;
pub mod observability;
pub mod workflows;

#[cfg(test)]
mod integration_tests;

pub use memory::{InMemoryAccountStore, InMemoryDocumentDb, InMemoryStockStore};
pub use workflows::{
    ExpenseWorkflow, NewExpense, NewPurchase, NewPurchaseLine, NewSale, NewSaleLine,
    PurchaseWorkflow, SaleWorkflow, SettlementWorkflow, TreasuryWorkflow, WorkflowError,
    WorkflowResult,
};
