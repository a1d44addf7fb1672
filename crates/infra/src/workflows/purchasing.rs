//! Purchase workflow: create, edit payments, soft-delete.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use shopledger_core::{ContactId, LocationId, PurchaseId};
use shopledger_documents::{
    Purchase, PurchaseLine, PurchaseOrigin, PurchaseStatus, PurchaseStore, Sequencer,
};
use shopledger_ledger::{AccountStore, LedgerApplier, Payment, PaymentStatus, TxnKind};
use shopledger_stock::{StockDraw, StockIntake, StockManager, StockStore};

use super::WorkflowResult;

/// One line of a purchase being created; becomes a stock unit.
#[derive(Debug, Clone)]
pub struct NewPurchaseLine {
    pub intake: StockIntake,
}

#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub supplier: Option<ContactId>,
    pub purchase_date: DateTime<Utc>,
    pub business_location: LocationId,
    pub status: PurchaseStatus,
    pub lines: Vec<NewPurchaseLine>,
    pub payments: Vec<Payment>,
}

pub struct PurchaseWorkflow<DB, S, A> {
    db: Arc<DB>,
    stock: StockManager<S>,
    ledger: LedgerApplier<A>,
}

impl<DB, S, A> Clone for PurchaseWorkflow<DB, S, A> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            stock: self.stock.clone(),
            ledger: self.ledger.clone(),
        }
    }
}

impl<DB, S, A> PurchaseWorkflow<DB, S, A>
where
    DB: PurchaseStore + Sequencer,
    S: StockStore,
    A: AccountStore,
{
    pub fn new(db: Arc<DB>, stock: StockManager<S>, ledger: LedgerApplier<A>) -> Self {
        Self { db, stock, ledger }
    }

    /// Buy stock: creates one stock unit per line, persists the purchase,
    /// then posts the payments.
    pub async fn create_purchase(&self, new: NewPurchase) -> WorkflowResult<Purchase> {
        let intakes: Vec<StockIntake> = new.lines.iter().map(|l| l.intake.clone()).collect();
        let units = self
            .stock
            .create_stock(intakes, new.business_location)
            .await?;

        let mut lines = Vec::with_capacity(new.lines.len());
        for (item, unit) in new.lines.iter().zip(&units) {
            let line_total = item.intake.unit_cost * item.intake.quantity;
            let gst_amount = if item.intake.gst_applicable {
                line_total * item.intake.gst_percentage / 100
            } else {
                0
            };
            lines.push(PurchaseLine {
                product_id: item.intake.product_id,
                imei_no: item.intake.imei_no.clone(),
                serial_no: item.intake.serial_no.clone(),
                quantity: item.intake.quantity,
                unit_cost: item.intake.unit_cost,
                line_total,
                original_unit_cost: None,
                stock_id: Some(unit.id),
                is_return: false,
                returned_qty: 0,
                return_date: None,
                gst_applicable: item.intake.gst_applicable,
                gst_percentage: item.intake.gst_percentage,
                gst_amount,
                line_total_with_gst: line_total + gst_amount,
            });
        }

        let total: i64 = lines.iter().map(|l| l.line_total_with_gst).sum();
        let paid = shopledger_ledger::invoice_paid_total(&new.payments);
        let purchase = Purchase {
            id: PurchaseId::new(),
            reference_no: self.db.next_reference("PUR").await?,
            supplier: new.supplier,
            purchase_date: new.purchase_date,
            business_location: new.business_location,
            products: lines,
            payments: new.payments,
            total,
            payment_due: (total - paid).max(0),
            status: new.status,
            payment_status: PaymentStatus::derive(total, paid),
            origin: PurchaseOrigin::Direct,
            is_deleted: false,
            created_at: Utc::now(),
        };
        self.db.insert_purchase(purchase.clone()).await?;

        self.ledger
            .apply_payments(&purchase.payments, TxnKind::Purchase)
            .await?;
        info!(purchase = %purchase.id, reference = %purchase.reference_no, total, "created purchase");
        Ok(purchase)
    }

    /// Replace a purchase's payments: revert old, persist new, apply new.
    pub async fn update_purchase_payments(
        &self,
        id: PurchaseId,
        payments: Vec<Payment>,
    ) -> WorkflowResult<Purchase> {
        let mut purchase = self.db.get_purchase(id).await?;
        let old = std::mem::replace(&mut purchase.payments, payments);
        self.ledger.revert_payments(&old, TxnKind::Purchase).await?;

        let paid = purchase.amount_paid();
        purchase.payment_due = (purchase.total - paid).max(0);
        purchase.payment_status = PaymentStatus::derive(purchase.total, paid);
        self.db.update_purchase(purchase.clone()).await?;

        self.ledger
            .apply_payments(&purchase.payments, TxnKind::Purchase)
            .await?;
        Ok(purchase)
    }

    /// Soft-delete a purchase: reverts its payments and consumes whatever
    /// quantity of its stock units is still unsold.
    pub async fn delete_purchase(&self, id: PurchaseId) -> WorkflowResult<()> {
        let mut purchase = self.db.get_purchase(id).await?;

        self.ledger
            .revert_payments(&purchase.payments, TxnKind::Purchase)
            .await?;

        let mut draws = Vec::new();
        for line in &purchase.products {
            let Some(stock_id) = line.stock_id else {
                continue;
            };
            match self.stock.unit(stock_id).await {
                Ok(unit) if unit.is_available() && unit.quantity > 0 => draws.push(StockDraw {
                    stock_id,
                    quantity: unit.quantity,
                }),
                _ => {}
            }
        }
        self.stock.consume_stock(&draws).await?;

        purchase.is_deleted = true;
        self.db.update_purchase(purchase).await?;
        info!(purchase = %id, "deleted purchase");
        Ok(())
    }
}
