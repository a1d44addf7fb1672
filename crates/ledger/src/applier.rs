//! Balance ledger applier: payments -> signed balance deltas.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::account::{AccountStore, LedgerError, LedgerResult};
use crate::payment::Payment;

/// Payment-bearing transaction kinds, each with a fixed balance sign.
///
/// This is the only place signs are defined; apply and revert both read from
/// it, so the two paths cannot drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxnKind {
    Sale,
    Purchase,
    SaleReturn,
    PurchaseReturn,
    Expense,
}

impl TxnKind {
    /// Sign of a payment when the document is applied: inflows to the shop
    /// (sales, purchase returns) are positive, outflows (purchases,
    /// expenses, sale-return refunds) negative.
    pub fn applied_sign(self) -> i64 {
        match self {
            TxnKind::Sale | TxnKind::PurchaseReturn => 1,
            TxnKind::Purchase | TxnKind::Expense | TxnKind::SaleReturn => -1,
        }
    }

    /// Sign used when reverting; always the exact inverse of apply.
    pub fn reverted_sign(self) -> i64 {
        -self.applied_sign()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TxnKind::Sale => "sale",
            TxnKind::Purchase => "purchase",
            TxnKind::SaleReturn => "sale_return",
            TxnKind::PurchaseReturn => "purchase_return",
            TxnKind::Expense => "expense",
        }
    }
}

/// Applies and reverts payment lists against account balances.
///
/// Each payment is posted as its own atomic increment; there is no
/// cross-payment atomicity. A failure partway leaves earlier payments
/// applied — callers compensate by reverting, they do not get rollback.
pub struct LedgerApplier<A> {
    accounts: Arc<A>,
}

impl<A> Clone for LedgerApplier<A> {
    fn clone(&self) -> Self {
        Self {
            accounts: Arc::clone(&self.accounts),
        }
    }
}

impl<A: AccountStore> LedgerApplier<A> {
    pub fn new(accounts: Arc<A>) -> Self {
        Self { accounts }
    }

    pub fn accounts(&self) -> &Arc<A> {
        &self.accounts
    }

    /// Post every payment with a resolvable account at the kind's apply
    /// sign. Payments without an account, or referencing a missing account,
    /// are skipped (the document still carries them).
    pub async fn apply_payments(&self, payments: &[Payment], kind: TxnKind) -> LedgerResult<()> {
        self.post(payments, kind, kind.applied_sign()).await
    }

    /// Symmetric inverse of [`apply_payments`](Self::apply_payments).
    pub async fn revert_payments(&self, payments: &[Payment], kind: TxnKind) -> LedgerResult<()> {
        self.post(payments, kind, kind.reverted_sign()).await
    }

    /// Edit protocol for replacing a document's payments: revert the old
    /// list, then apply the new one. Persisting the new payments on the
    /// document happens between the two steps and is the caller's job.
    /// Skipping the revert here is how balances drift permanently.
    pub async fn replace_payments(
        &self,
        old: &[Payment],
        new: &[Payment],
        kind: TxnKind,
    ) -> LedgerResult<()> {
        self.revert_payments(old, kind).await?;
        self.apply_payments(new, kind).await
    }

    async fn post(&self, payments: &[Payment], kind: TxnKind, sign: i64) -> LedgerResult<()> {
        for payment in payments {
            let Some(account) = payment.account else {
                continue;
            };
            let delta = sign * payment.amount;
            match self.accounts.adjust_balance(account, delta).await {
                Ok(balance) => {
                    debug!(
                        account = %account,
                        kind = kind.as_str(),
                        delta,
                        balance,
                        "posted payment"
                    );
                }
                Err(LedgerError::AccountNotFound(_)) => {
                    warn!(account = %account, kind = kind.as_str(), "payment references missing account, skipped");
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sign_table_matches_domain_conventions() {
        assert_eq!(TxnKind::Sale.applied_sign(), 1);
        assert_eq!(TxnKind::PurchaseReturn.applied_sign(), 1);
        assert_eq!(TxnKind::Purchase.applied_sign(), -1);
        assert_eq!(TxnKind::Expense.applied_sign(), -1);
        assert_eq!(TxnKind::SaleReturn.applied_sign(), -1);
    }

    proptest! {
        /// Apply and revert always cancel exactly, for every kind and amount.
        #[test]
        fn apply_plus_revert_is_zero(amount in 0i64..1_000_000_000) {
            for kind in [
                TxnKind::Sale,
                TxnKind::Purchase,
                TxnKind::SaleReturn,
                TxnKind::PurchaseReturn,
                TxnKind::Expense,
            ] {
                prop_assert_eq!(
                    kind.applied_sign() * amount + kind.reverted_sign() * amount,
                    0
                );
            }
        }
    }
}
