//! Purchase documents, including return-originated ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopledger_core::{ContactId, LocationId, ProductId, PurchaseId, SaleReturnId, StockUnitId};
use shopledger_ledger::{invoice_paid_total, Payment, PaymentStatus};

/// Where a purchase came from.
///
/// A sale return re-enters inventory as a purchase-shaped document so the
/// whole purchase/stock reporting pipeline can treat it uniformly; the
/// variant keeps the backlink instead of a boolean flag plus nullable ref.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "origin")]
pub enum PurchaseOrigin {
    /// Bought from a supplier.
    Direct,
    /// Synthesized by reconciling a sale return.
    FromSaleReturn { sale_return: SaleReturnId },
}

/// One purchased line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLine {
    pub product_id: ProductId,
    pub imei_no: Option<String>,
    pub serial_no: Option<String>,
    pub quantity: i64,
    /// Cost per unit, smallest currency unit.
    pub unit_cost: i64,
    pub line_total: i64,
    /// For return-originated purchases: the true acquisition cost basis,
    /// distinct from the refund amount in `unit_cost`.
    pub original_unit_cost: Option<i64>,
    /// The stock unit this line created.
    pub stock_id: Option<StockUnitId>,
    pub is_return: bool,
    /// How much of `quantity` has been returned to the supplier.
    pub returned_qty: i64,
    pub return_date: Option<DateTime<Utc>>,
    pub gst_applicable: bool,
    pub gst_percentage: i64,
    pub gst_amount: i64,
    pub line_total_with_gst: i64,
}

impl PurchaseLine {
    pub fn returnable_quantity(&self) -> i64 {
        self.quantity - self.returned_qty
    }
}

/// Lifecycle status of a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Received,
    Pending,
    Ordered,
    Returned,
    Cancelled,
}

/// A purchase document. Owns its payments and the stock units it created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: PurchaseId,
    pub reference_no: String,
    pub supplier: Option<ContactId>,
    pub purchase_date: DateTime<Utc>,
    pub business_location: LocationId,
    pub products: Vec<PurchaseLine>,
    pub payments: Vec<Payment>,
    pub total: i64,
    pub payment_due: i64,
    pub status: PurchaseStatus,
    pub payment_status: PaymentStatus,
    pub origin: PurchaseOrigin,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl Purchase {
    pub fn amount_paid(&self) -> i64 {
        invoice_paid_total(&self.payments)
    }

    pub fn is_return_originated(&self) -> bool {
        matches!(self.origin, PurchaseOrigin::FromSaleReturn { .. })
    }

    pub fn source_return(&self) -> Option<SaleReturnId> {
        match self.origin {
            PurchaseOrigin::FromSaleReturn { sale_return } => Some(sale_return),
            PurchaseOrigin::Direct => None,
        }
    }

    pub fn line_for_product(&self, product_id: ProductId) -> Option<&PurchaseLine> {
        self.products.iter().find(|l| l.product_id == product_id)
    }

    pub fn line_for_stock(&self, stock_id: StockUnitId) -> Option<&PurchaseLine> {
        self.products.iter().find(|l| l.stock_id == Some(stock_id))
    }
}
