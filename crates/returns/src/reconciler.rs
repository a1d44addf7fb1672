//! Return reconciliation.
//!
//! A sale return re-enters goods as a brand-new purchase document carrying
//! fresh stock units, so downstream stock and purchase reporting never has
//! to special-case returned goods. A purchase return consumes stock back
//! out and leaves a return record against the original purchase.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use shopledger_core::{
    DomainError, ProductId, PurchaseId, PurchaseReturnId, SaleId, SaleReturnId, StockUnitId,
};
use shopledger_documents::{
    Purchase, PurchaseLine, PurchaseOrigin, PurchaseReturn, PurchaseReturnStore, PurchaseStatus,
    PurchaseStore, ReturnedLine, SaleLine, SaleReturn, SaleReturnStore, SaleStatus, SaleStore,
    Sequencer,
};
use shopledger_ledger::PaymentStatus;
use shopledger_stock::{StockDraw, StockError, StockIntake, StockManager, StockStore};

pub type ReturnResult<T> = Result<T, ReturnError>;

#[derive(Debug, Error)]
pub enum ReturnError {
    #[error("line for product {product} is already fully returned")]
    AlreadyReturned { product: ProductId },

    #[error("product {product} was never actually sold on this document")]
    NotSold { product: ProductId },

    #[error("return of {requested} exceeds returnable quantity {returnable} for product {product}")]
    OverReturn {
        product: ProductId,
        requested: i64,
        returnable: i64,
    },

    #[error("document has no line for product {product}")]
    LineNotFound { product: ProductId },

    #[error("stock unit {unit} is no longer in stock")]
    SoldOut { unit: StockUnitId },

    #[error("cannot determine cost basis for product {product}")]
    UnknownCostBasis { product: ProductId },

    #[error(transparent)]
    Stock(#[from] StockError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// One requested sale-return line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleReturnLine {
    pub product_id: ProductId,
    pub quantity: i64,
    /// Last resort for the cost-basis chain when neither the sale line, the
    /// originating purchase, nor the stock unit can supply one.
    pub fallback_unit_cost: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleReturnRequest {
    pub sale: SaleId,
    pub lines: Vec<SaleReturnLine>,
    pub return_date: DateTime<Utc>,
}

/// One requested purchase-return line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReturnLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReturnRequest {
    pub purchase: PurchaseId,
    pub lines: Vec<PurchaseReturnLine>,
    pub return_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleReturnOutcome {
    pub sale_return: SaleReturnId,
    pub new_purchase: PurchaseId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseReturnOutcome {
    pub purchase_return: PurchaseReturnId,
}

struct PlannedSaleReturn {
    line_idx: usize,
    quantity: i64,
    /// Refund per unit (what the customer paid).
    refund_unit: i64,
    /// Acquisition cost per unit carried into the re-created stock.
    basis_unit: i64,
}

/// Orchestrates both return directions against the document stores and the
/// stock manager.
///
/// Mutations happen in validated order without a surrounding transaction:
/// every line is checked against current state before the first write, so a
/// rejection leaves nothing to clean up.
pub struct ReturnReconciler<DB, S> {
    db: Arc<DB>,
    stock: StockManager<S>,
}

impl<DB, S> Clone for ReturnReconciler<DB, S> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            stock: self.stock.clone(),
        }
    }
}

impl<DB, S> ReturnReconciler<DB, S>
where
    DB: SaleStore + PurchaseStore + SaleReturnStore + PurchaseReturnStore + Sequencer,
    S: StockStore,
{
    pub fn new(db: Arc<DB>, stock: StockManager<S>) -> Self {
        Self { db, stock }
    }

    /// Take goods back from a customer.
    ///
    /// Marks the sold lines returned, re-creates the stock units at their
    /// acquisition cost basis, wraps them in a return-originated purchase,
    /// and records a [`SaleReturn`] owing the refund. The refund itself is
    /// settled later through return payments.
    pub async fn reconcile_sale_return(
        &self,
        req: SaleReturnRequest,
    ) -> ReturnResult<SaleReturnOutcome> {
        let mut sale = self.db.get_sale(req.sale).await?;
        if sale.is_deleted {
            return Err(DomainError::not_found(format!("sale {}", req.sale)).into());
        }

        // Validate every requested line before touching anything.
        let mut planned = Vec::with_capacity(req.lines.len());
        for line in &req.lines {
            if line.quantity <= 0 {
                return Err(
                    DomainError::validation("return quantity must be positive").into(),
                );
            }
            let idx = sale
                .products
                .iter()
                .position(|l| l.product_id == line.product_id)
                .ok_or(ReturnError::LineNotFound {
                    product: line.product_id,
                })?;
            let sold = &sale.products[idx];
            if sold.quantity <= 0 {
                return Err(ReturnError::NotSold {
                    product: line.product_id,
                });
            }
            let returnable = sold.returnable_quantity();
            if returnable == 0 {
                return Err(ReturnError::AlreadyReturned {
                    product: line.product_id,
                });
            }
            if line.quantity > returnable {
                return Err(ReturnError::OverReturn {
                    product: line.product_id,
                    requested: line.quantity,
                    returnable,
                });
            }
            let basis_unit = self.cost_basis(sold, line.fallback_unit_cost).await?;
            planned.push(PlannedSaleReturn {
                line_idx: idx,
                quantity: line.quantity,
                refund_unit: sold.unit_price,
                basis_unit,
            });
        }

        // Mark the sold lines returned and flip the sale status once every
        // line is exhausted.
        for plan in &planned {
            let line = &mut sale.products[plan.line_idx];
            line.returned_quantity += plan.quantity;
            line.return_date = Some(req.return_date);
            if line.returnable_quantity() == 0 {
                line.is_return = true;
            }
        }
        if sale.products.iter().all(|l| l.returnable_quantity() == 0) {
            sale.status = SaleStatus::Returned;
        }
        self.db.update_sale(sale.clone()).await?;

        // Re-enter the goods as fresh stock at cost basis.
        let intakes: Vec<StockIntake> = planned
            .iter()
            .map(|plan| {
                let line = &sale.products[plan.line_idx];
                StockIntake {
                    product_id: line.product_id,
                    imei_no: line.imei_no.clone(),
                    serial_no: line.serial_no.clone(),
                    quantity: plan.quantity,
                    unit_cost: plan.basis_unit,
                    gst_applicable: line.gst_applicable,
                    gst_percentage: line.gst_percentage,
                }
            })
            .collect();
        let units = self.stock.create_stock(intakes, sale.business_location).await?;

        let sale_return_id = SaleReturnId::new();
        let purchase_ref = self.db.next_reference("PUR").await?;
        let mut purchase_lines = Vec::with_capacity(planned.len());
        let mut returned_lines = Vec::with_capacity(planned.len());
        for (plan, unit) in planned.iter().zip(&units) {
            let line = &sale.products[plan.line_idx];
            let line_total = plan.refund_unit * plan.quantity;
            let gst_amount = if line.gst_applicable {
                line_total * line.gst_percentage / 100
            } else {
                0
            };
            purchase_lines.push(PurchaseLine {
                product_id: line.product_id,
                imei_no: line.imei_no.clone(),
                serial_no: line.serial_no.clone(),
                quantity: plan.quantity,
                unit_cost: plan.refund_unit,
                line_total,
                original_unit_cost: Some(plan.basis_unit),
                stock_id: Some(unit.id),
                is_return: false,
                returned_qty: 0,
                return_date: None,
                gst_applicable: line.gst_applicable,
                gst_percentage: line.gst_percentage,
                gst_amount,
                line_total_with_gst: line_total + gst_amount,
            });
            returned_lines.push(ReturnedLine {
                product_id: line.product_id,
                stock_id: line.stock_id,
                purchase_ref: line.purchase_ref,
                imei_no: line.imei_no.clone(),
                serial_no: line.serial_no.clone(),
                quantity: plan.quantity,
                unit_cost: plan.refund_unit,
                original_unit_cost: Some(plan.basis_unit),
                line_total,
                gst_applicable: line.gst_applicable,
                gst_percentage: line.gst_percentage,
                gst_amount,
                line_total_with_gst: line_total + gst_amount,
            });
        }

        let total: i64 = purchase_lines.iter().map(|l| l.line_total_with_gst).sum();
        let purchase = Purchase {
            id: PurchaseId::new(),
            reference_no: purchase_ref,
            supplier: None,
            purchase_date: req.return_date,
            business_location: sale.business_location,
            products: purchase_lines,
            payments: Vec::new(),
            total,
            payment_due: total,
            status: PurchaseStatus::Received,
            payment_status: PaymentStatus::Due,
            origin: PurchaseOrigin::FromSaleReturn {
                sale_return: sale_return_id,
            },
            is_deleted: false,
            created_at: Utc::now(),
        };
        let new_purchase = purchase.id;
        self.db.insert_purchase(purchase).await?;

        let reference_no = self.db.next_reference("SALERET").await?;
        let sale_return = SaleReturn {
            id: sale_return_id,
            original_sale: sale.id,
            new_purchase: Some(new_purchase),
            business_location: sale.business_location,
            reference_no,
            returned_products: returned_lines,
            total_return_amount: total,
            payment_status: PaymentStatus::Due,
            payment_due: total,
            return_payments: Vec::new(),
            return_date: req.return_date,
            is_deleted: false,
        };
        self.db.insert_sale_return(sale_return).await?;

        info!(sale = %sale.id, sale_return = %sale_return_id, purchase = %new_purchase, total, "reconciled sale return");
        Ok(SaleReturnOutcome {
            sale_return: sale_return_id,
            new_purchase,
        })
    }

    /// Send goods back to the supplier.
    ///
    /// Validates every line against both the purchase document and current
    /// stock, then consumes the stock and records a [`PurchaseReturn`]
    /// carrying the refund owed by the supplier.
    pub async fn reconcile_purchase_return(
        &self,
        req: PurchaseReturnRequest,
    ) -> ReturnResult<PurchaseReturnOutcome> {
        let mut purchase = self.db.get_purchase(req.purchase).await?;
        if purchase.is_deleted {
            return Err(DomainError::not_found(format!("purchase {}", req.purchase)).into());
        }

        let mut draws = Vec::with_capacity(req.lines.len());
        let mut planned = Vec::with_capacity(req.lines.len());
        for line in &req.lines {
            if line.quantity <= 0 {
                return Err(
                    DomainError::validation("return quantity must be positive").into(),
                );
            }
            let idx = purchase
                .products
                .iter()
                .position(|l| l.product_id == line.product_id)
                .ok_or(ReturnError::LineNotFound {
                    product: line.product_id,
                })?;
            let bought = &purchase.products[idx];
            let returnable = bought.returnable_quantity();
            if returnable == 0 {
                return Err(ReturnError::AlreadyReturned {
                    product: line.product_id,
                });
            }
            if line.quantity > returnable {
                return Err(ReturnError::OverReturn {
                    product: line.product_id,
                    requested: line.quantity,
                    returnable,
                });
            }
            // Goods already sold on cannot go back to the supplier.
            let stock_id = bought
                .stock_id
                .ok_or_else(|| DomainError::invariant("purchase line has no stock unit"))?;
            let unit = self.stock.unit(stock_id).await?;
            if !unit.is_available() || unit.quantity < line.quantity {
                return Err(ReturnError::SoldOut { unit: stock_id });
            }
            draws.push(StockDraw {
                stock_id,
                quantity: line.quantity,
            });
            planned.push((idx, line.quantity));
        }

        self.stock.consume_stock(&draws).await?;

        for (idx, quantity) in &planned {
            let line = &mut purchase.products[*idx];
            line.returned_qty += *quantity;
            line.return_date = Some(req.return_date);
            if line.returnable_quantity() == 0 {
                line.is_return = true;
            }
        }
        if purchase.products.iter().all(|l| l.returnable_quantity() == 0) {
            purchase.status = PurchaseStatus::Returned;
        }
        self.db.update_purchase(purchase.clone()).await?;

        let mut returned_lines = Vec::with_capacity(planned.len());
        for ((idx, quantity), draw) in planned.iter().zip(&draws) {
            let line = &purchase.products[*idx];
            let line_total = line.unit_cost * *quantity;
            let gst_amount = if line.gst_applicable {
                line_total * line.gst_percentage / 100
            } else {
                0
            };
            returned_lines.push(ReturnedLine {
                product_id: line.product_id,
                stock_id: Some(draw.stock_id),
                purchase_ref: Some(purchase.id),
                imei_no: line.imei_no.clone(),
                serial_no: line.serial_no.clone(),
                quantity: *quantity,
                unit_cost: line.unit_cost,
                original_unit_cost: line.original_unit_cost,
                line_total,
                gst_applicable: line.gst_applicable,
                gst_percentage: line.gst_percentage,
                gst_amount,
                line_total_with_gst: line_total + gst_amount,
            });
        }

        let total: i64 = returned_lines.iter().map(|l| l.line_total_with_gst).sum();
        let reference_no = self.db.next_reference("PURRET").await?;
        let purchase_return = PurchaseReturn {
            id: PurchaseReturnId::new(),
            original_purchase: purchase.id,
            business_location: purchase.business_location,
            reference_no,
            returned_products: returned_lines,
            total_return_amount: total,
            payment_status: PaymentStatus::Due,
            payment_due: total,
            return_payments: Vec::new(),
            return_date: req.return_date,
            is_deleted: false,
        };
        let purchase_return_id = purchase_return.id;
        self.db.insert_purchase_return(purchase_return).await?;

        info!(purchase = %purchase.id, purchase_return = %purchase_return_id, total, "reconciled purchase return");
        Ok(PurchaseReturnOutcome {
            purchase_return: purchase_return_id,
        })
    }

    /// Acquisition cost per unit for a returned sale line.
    ///
    /// Chain: cost snapshotted on the sale line, then the originating
    /// purchase line, then the stock unit itself, then the caller-supplied
    /// fallback. Broken links (deleted purchases, purged stock) are skipped
    /// with a warning rather than failing the return.
    async fn cost_basis(&self, line: &SaleLine, fallback: Option<i64>) -> ReturnResult<i64> {
        if let Some(cost) = line.original_unit_cost {
            return Ok(cost);
        }
        if let Some(purchase_ref) = line.purchase_ref {
            match self.db.get_purchase(purchase_ref).await {
                Ok(purchase) => {
                    let found = line
                        .stock_id
                        .and_then(|sid| purchase.line_for_stock(sid))
                        .or_else(|| purchase.line_for_product(line.product_id));
                    if let Some(pl) = found {
                        return Ok(pl.original_unit_cost.unwrap_or(pl.unit_cost));
                    }
                }
                Err(DomainError::NotFound(_)) => {
                    warn!(purchase = %purchase_ref, "cost-basis lookup: purchase missing");
                }
                Err(e) => return Err(e.into()),
            }
        }
        if let Some(stock_id) = line.stock_id {
            match self.stock.unit(stock_id).await {
                Ok(unit) => return Ok(unit.unit_cost),
                Err(StockError::NotFound(_)) => {
                    warn!(unit = %stock_id, "cost-basis lookup: stock unit missing");
                }
                Err(e) => return Err(e.into()),
            }
        }
        fallback.ok_or(ReturnError::UnknownCostBasis {
            product: line.product_id,
        })
    }
}
