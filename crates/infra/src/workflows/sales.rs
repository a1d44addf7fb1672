//! Sale workflow: create, edit payments, soft-delete.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use shopledger_core::{ContactId, LocationId, SaleId};
use shopledger_documents::{
    PurchaseStore, Sale, SaleLine, SaleReturnStore, SaleStatus, SaleStore, Sequencer,
};
use shopledger_ledger::{AccountStore, LedgerApplier, Payment, PaymentStatus, TxnKind};
use shopledger_stock::{StockDraw, StockManager, StockStore, UnitKind};

use super::{WorkflowError, WorkflowResult};

/// One line of a sale being created. Prices are per unit in the smallest
/// currency unit; product identity and cost basis are snapshotted from the
/// referenced stock unit.
#[derive(Debug, Clone)]
pub struct NewSaleLine {
    pub draw: StockDraw,
    pub unit_price: i64,
}

#[derive(Debug, Clone)]
pub struct NewSale {
    pub customer: Option<ContactId>,
    pub sale_date: DateTime<Utc>,
    pub business_location: LocationId,
    pub lines: Vec<NewSaleLine>,
    pub payments: Vec<Payment>,
}

pub struct SaleWorkflow<DB, S, A> {
    db: Arc<DB>,
    stock: StockManager<S>,
    ledger: LedgerApplier<A>,
}

impl<DB, S, A> Clone for SaleWorkflow<DB, S, A> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            stock: self.stock.clone(),
            ledger: self.ledger.clone(),
        }
    }
}

impl<DB, S, A> SaleWorkflow<DB, S, A>
where
    DB: SaleStore + SaleReturnStore + PurchaseStore + Sequencer,
    S: StockStore,
    A: AccountStore,
{
    pub fn new(db: Arc<DB>, stock: StockManager<S>, ledger: LedgerApplier<A>) -> Self {
        Self { db, stock, ledger }
    }

    /// Sell stock units. Consumes the stock, persists the sale with line
    /// snapshots taken from the units, then posts the payments.
    pub async fn create_sale(&self, new: NewSale) -> WorkflowResult<Sale> {
        let draws: Vec<StockDraw> = new.lines.iter().map(|l| l.draw).collect();

        // Snapshot the units before consuming so the lines carry IMEI,
        // serial, cost basis, and the originating purchase.
        let mut lines = Vec::with_capacity(new.lines.len());
        for item in &new.lines {
            let unit = self.stock.unit(item.draw.stock_id).await?;
            let purchase_ref = self
                .db
                .purchase_containing_stock(unit.id)
                .await?
                .map(|p| p.id);
            let line_total = item.unit_price * item.draw.quantity;
            let gst_amount = if unit.gst_applicable {
                line_total * unit.gst_percentage / 100
            } else {
                0
            };
            let serial_no = match &unit.kind {
                UnitKind::Serialized { serial_no, .. } => serial_no.clone(),
                UnitKind::Fungible => None,
            };
            lines.push(SaleLine {
                product_id: unit.product_id,
                imei_no: unit.imei_no().map(str::to_owned),
                serial_no,
                quantity: item.draw.quantity,
                unit_price: item.unit_price,
                line_total,
                stock_id: Some(unit.id),
                purchase_ref,
                original_unit_cost: Some(unit.unit_cost),
                is_return: false,
                return_date: None,
                returned_quantity: 0,
                gst_applicable: unit.gst_applicable,
                gst_percentage: unit.gst_percentage,
                gst_amount,
                line_total_with_gst: line_total + gst_amount,
            });
        }

        self.stock.consume_stock(&draws).await?;

        let total: i64 = lines.iter().map(|l| l.line_total_with_gst).sum();
        let paid = shopledger_ledger::invoice_paid_total(&new.payments);
        let sale = Sale {
            id: SaleId::new(),
            invoice_no: self.db.next_reference("INV").await?,
            customer: new.customer,
            sale_date: new.sale_date,
            business_location: new.business_location,
            products: lines,
            payments: new.payments,
            total,
            payment_due: (total - paid).max(0),
            status: SaleStatus::Completed,
            payment_status: PaymentStatus::derive(total, paid),
            is_deleted: false,
            created_at: Utc::now(),
        };
        if let Err(e) = self.db.insert_sale(sale.clone()).await {
            // Compensate the consumption; persistence failed before the
            // document existed.
            self.stock.revert_stock(&draws).await?;
            return Err(e.into());
        }

        self.ledger
            .apply_payments(&sale.payments, TxnKind::Sale)
            .await?;
        info!(sale = %sale.id, invoice = %sale.invoice_no, total, "created sale");
        Ok(sale)
    }

    /// Replace a sale's payments: revert the old list, persist the new one,
    /// then apply it.
    pub async fn update_sale_payments(
        &self,
        id: SaleId,
        payments: Vec<Payment>,
    ) -> WorkflowResult<Sale> {
        let mut sale = self.db.get_sale(id).await?;
        let old = std::mem::replace(&mut sale.payments, payments);
        self.ledger.revert_payments(&old, TxnKind::Sale).await?;

        let paid = sale.amount_paid();
        sale.payment_due = (sale.total - paid).max(0);
        sale.payment_status = PaymentStatus::derive(sale.total, paid);
        self.db.update_sale(sale.clone()).await?;

        self.ledger
            .apply_payments(&sale.payments, TxnKind::Sale)
            .await?;
        Ok(sale)
    }

    /// Soft-delete a sale: reverts its payments and restores the consumed
    /// stock. Refused while a live return references the sale.
    pub async fn delete_sale(&self, id: SaleId) -> WorkflowResult<()> {
        let mut sale = self.db.get_sale(id).await?;
        if self.db.sale_has_live_returns(id).await? {
            return Err(WorkflowError::HasLiveReturns);
        }

        self.ledger
            .revert_payments(&sale.payments, TxnKind::Sale)
            .await?;

        let draws: Vec<StockDraw> = sale
            .products
            .iter()
            .filter_map(|l| {
                l.stock_id.map(|stock_id| StockDraw {
                    stock_id,
                    quantity: l.quantity - l.returned_quantity,
                })
            })
            .filter(|d| d.quantity > 0)
            .collect();
        self.stock.revert_stock(&draws).await?;

        sale.is_deleted = true;
        self.db.update_sale(sale).await?;
        info!(sale = %id, "deleted sale");
        Ok(())
    }
}
