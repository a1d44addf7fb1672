//! Sale documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopledger_core::{ContactId, LocationId, ProductId, PurchaseId, SaleId, StockUnitId};
use shopledger_ledger::{invoice_paid_total, Payment, PaymentStatus};

/// One sold line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub product_id: ProductId,
    pub imei_no: Option<String>,
    pub serial_no: Option<String>,
    pub quantity: i64,
    /// Selling price per unit, smallest currency unit.
    pub unit_price: i64,
    pub line_total: i64,
    /// The stock unit this line consumed.
    pub stock_id: Option<StockUnitId>,
    /// The purchase that created that stock unit; lets a later return walk
    /// back to the original acquisition cost.
    pub purchase_ref: Option<PurchaseId>,
    /// Acquisition cost per unit, snapshotted at sale time.
    pub original_unit_cost: Option<i64>,
    pub is_return: bool,
    pub return_date: Option<DateTime<Utc>>,
    /// How much of `quantity` has been returned so far (fungible lines
    /// accumulate partial returns here).
    pub returned_quantity: i64,
    pub gst_applicable: bool,
    pub gst_percentage: i64,
    pub gst_amount: i64,
    pub line_total_with_gst: i64,
}

impl SaleLine {
    /// Quantity still eligible for return.
    pub fn returnable_quantity(&self) -> i64 {
        self.quantity - self.returned_quantity
    }
}

/// Lifecycle status of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Completed,
    Returned,
}

/// A sale document. Owns its payments; stock units are referenced by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub invoice_no: String,
    pub customer: Option<ContactId>,
    pub sale_date: DateTime<Utc>,
    pub business_location: LocationId,
    pub products: Vec<SaleLine>,
    pub payments: Vec<Payment>,
    pub total: i64,
    pub payment_due: i64,
    pub status: SaleStatus,
    pub payment_status: PaymentStatus,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Invoice-facing paid amount (excludes `for_shop_use` payments).
    pub fn amount_paid(&self) -> i64 {
        invoice_paid_total(&self.payments)
    }

    pub fn line_for_product(&self, product_id: ProductId) -> Option<&SaleLine> {
        self.products.iter().find(|l| l.product_id == product_id)
    }
}
