//! `shopledger-returns` — the return reconciler.

pub mod reconciler;

pub use reconciler::{
    PurchaseReturnLine, PurchaseReturnOutcome, PurchaseReturnRequest, ReturnError,
    ReturnReconciler, ReturnResult, SaleReturnLine, SaleReturnOutcome, SaleReturnRequest,
};
