//! Payments embedded in transaction documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopledger_core::{AccountId, PaymentMethodId};

/// A payment embedded in a sale, purchase, expense, or return document.
///
/// `for_shop_use` payments are excluded from invoice "amount paid" totals
/// but still post to the account ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Amount in smallest currency unit. Always positive; the transaction
    /// kind decides the sign.
    pub amount: i64,
    pub paid_on: DateTime<Utc>,
    pub method: Option<PaymentMethodId>,
    /// Payments without a resolvable account are kept on the document but
    /// never posted to any balance.
    pub account: Option<AccountId>,
    pub payment_ref_no: String,
    pub bank_account_no: Option<String>,
    pub for_shop_use: bool,
    pub note: Option<String>,
}

impl Payment {
    pub fn new(amount: i64, paid_on: DateTime<Utc>, account: AccountId, ref_no: impl Into<String>) -> Self {
        Self {
            amount,
            paid_on,
            method: None,
            account: Some(account),
            payment_ref_no: ref_no.into(),
            bank_account_no: None,
            for_shop_use: false,
            note: None,
        }
    }
}

/// Invoice-facing paid total: sums all payments except `for_shop_use` ones.
pub fn invoice_paid_total(payments: &[Payment]) -> i64 {
    payments
        .iter()
        .filter(|p| !p.for_shop_use)
        .map(|p| p.amount)
        .sum()
}

/// Settlement state of a payment-bearing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Partial,
    Due,
}

impl PaymentStatus {
    /// Derive the status from a document total and its invoice-facing paid
    /// amount.
    pub fn derive(total: i64, paid: i64) -> Self {
        if paid <= 0 {
            PaymentStatus::Due
        } else if paid < total {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Paid
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shop_use_payments_do_not_count_toward_invoice_total() {
        let account = AccountId::new();
        let mut shop = Payment::new(300, Utc::now(), account, "PYMNT2026/0001");
        shop.for_shop_use = true;
        let normal = Payment::new(700, Utc::now(), account, "PYMNT2026/0001");

        assert_eq!(invoice_paid_total(&[shop, normal]), 700);
    }

    #[test]
    fn payment_status_derivation() {
        assert_eq!(PaymentStatus::derive(1000, 0), PaymentStatus::Due);
        assert_eq!(PaymentStatus::derive(1000, 400), PaymentStatus::Partial);
        assert_eq!(PaymentStatus::derive(1000, 1000), PaymentStatus::Paid);
        assert_eq!(PaymentStatus::derive(1000, 1200), PaymentStatus::Paid);
    }
}
