//! Ledger entry rows shared by the account book and cash flow views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopledger_core::{AccountId, PaymentMethodId};

/// Optional inclusive date window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        if let Some(from) = self.from {
            if date < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if date > to {
                return false;
            }
        }
        true
    }

    /// Whether the date falls before the window opens.
    pub fn precedes(&self, date: DateTime<Utc>) -> bool {
        matches!(self.from, Some(from) if date < from)
    }
}

/// One projected ledger row for a single account.
///
/// Exactly one of `debit`/`credit` is non-zero; `balance` is the running
/// balance of the account after this row, oldest-first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub account: AccountId,
    pub date: DateTime<Utc>,
    pub description: String,
    pub method: Option<PaymentMethodId>,
    pub note: Option<String>,
    pub debit: i64,
    pub credit: i64,
    /// Reference number of the originating document.
    pub reference_no: String,
    pub balance: i64,
    /// Set on internal fund-transfer legs in the combined cash flow view;
    /// such rows still move the per-account running balance but stay out of
    /// the combined debit/credit totals.
    pub exclude_from_totals: bool,
}

impl LedgerEntry {
    pub fn credit(
        account: AccountId,
        date: DateTime<Utc>,
        description: impl Into<String>,
        amount: i64,
        reference_no: impl Into<String>,
    ) -> Self {
        Self {
            account,
            date,
            description: description.into(),
            method: None,
            note: None,
            debit: 0,
            credit: amount,
            reference_no: reference_no.into(),
            balance: 0,
            exclude_from_totals: false,
        }
    }

    pub fn debit(
        account: AccountId,
        date: DateTime<Utc>,
        description: impl Into<String>,
        amount: i64,
        reference_no: impl Into<String>,
    ) -> Self {
        Self {
            account,
            date,
            description: description.into(),
            method: None,
            note: None,
            debit: amount,
            credit: 0,
            reference_no: reference_no.into(),
            balance: 0,
            exclude_from_totals: false,
        }
    }

    /// Signed effect on the account balance.
    pub fn delta(&self) -> i64 {
        self.credit - self.debit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn open_range_contains_everything() {
        assert!(DateRange::default().contains(at(1)));
        assert!(!DateRange::default().precedes(at(1)));
    }

    #[test]
    fn bounded_range_is_inclusive() {
        let range = DateRange {
            from: Some(at(10)),
            to: Some(at(20)),
        };
        assert!(range.contains(at(10)));
        assert!(range.contains(at(20)));
        assert!(!range.contains(at(9)));
        assert!(!range.contains(at(21)));
        assert!(range.precedes(at(9)));
        assert!(!range.precedes(at(10)));
    }
}
