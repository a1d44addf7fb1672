//! Expense documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopledger_core::{ExpenseId, LocationId};
use shopledger_ledger::{invoice_paid_total, Payment, PaymentStatus};

/// An expense document. Refund expenses carry `is_refund`; recurring
/// scheduling is driven by an external job and is not modeled here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub reference_no: String,
    pub transaction_date: DateTime<Utc>,
    pub is_refund: bool,
    pub category: Option<String>,
    pub business_location: LocationId,
    pub payments: Vec<Payment>,
    pub total_amount: i64,
    pub payment_due: i64,
    pub payment_status: PaymentStatus,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    pub fn amount_paid(&self) -> i64 {
        invoice_paid_total(&self.payments)
    }
}
