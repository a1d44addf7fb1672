//! Refund settlement on return records.
//!
//! The reconciler creates returns with no payments and the full amount due;
//! refunds are settled afterwards by replacing the return's payment list.

use std::sync::Arc;

use shopledger_core::{PurchaseReturnId, SaleReturnId};
use shopledger_documents::{PurchaseReturn, PurchaseReturnStore, SaleReturn, SaleReturnStore};
use shopledger_ledger::{AccountStore, LedgerApplier, Payment, PaymentStatus, TxnKind};

use super::WorkflowResult;

pub struct SettlementWorkflow<DB, A> {
    db: Arc<DB>,
    ledger: LedgerApplier<A>,
}

impl<DB, A> Clone for SettlementWorkflow<DB, A> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            ledger: self.ledger.clone(),
        }
    }
}

impl<DB, A> SettlementWorkflow<DB, A>
where
    DB: SaleReturnStore + PurchaseReturnStore,
    A: AccountStore,
{
    pub fn new(db: Arc<DB>, ledger: LedgerApplier<A>) -> Self {
        Self { db, ledger }
    }

    /// Replace the refund payments on a sale return. Refunds leave the
    /// shop's accounts, so they post at the sale-return sign.
    pub async fn settle_sale_return(
        &self,
        id: SaleReturnId,
        payments: Vec<Payment>,
    ) -> WorkflowResult<SaleReturn> {
        let mut ret = self.db.get_sale_return(id).await?;
        let old = std::mem::replace(&mut ret.return_payments, payments);
        self.ledger
            .revert_payments(&old, TxnKind::SaleReturn)
            .await?;

        let paid = shopledger_ledger::invoice_paid_total(&ret.return_payments);
        ret.payment_due = (ret.total_return_amount - paid).max(0);
        ret.payment_status = PaymentStatus::derive(ret.total_return_amount, paid);
        self.db.update_sale_return(ret.clone()).await?;

        self.ledger
            .apply_payments(&ret.return_payments, TxnKind::SaleReturn)
            .await?;
        Ok(ret)
    }

    /// Replace the refund payments on a purchase return. Supplier refunds
    /// come back into the shop, so they post at the purchase-return sign.
    pub async fn settle_purchase_return(
        &self,
        id: PurchaseReturnId,
        payments: Vec<Payment>,
    ) -> WorkflowResult<PurchaseReturn> {
        let mut ret = self.db.get_purchase_return(id).await?;
        let old = std::mem::replace(&mut ret.return_payments, payments);
        self.ledger
            .revert_payments(&old, TxnKind::PurchaseReturn)
            .await?;

        let paid = shopledger_ledger::invoice_paid_total(&ret.return_payments);
        ret.payment_due = (ret.total_return_amount - paid).max(0);
        ret.payment_status = PaymentStatus::derive(ret.total_return_amount, paid);
        self.db.update_purchase_return(ret.clone()).await?;

        self.ledger
            .apply_payments(&ret.return_payments, TxnKind::PurchaseReturn)
            .await?;
        Ok(ret)
    }
}
