//! Sale-return and purchase-return documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopledger_core::{
    LocationId, ProductId, PurchaseId, PurchaseReturnId, SaleId, SaleReturnId, StockUnitId,
};
use shopledger_ledger::{Payment, PaymentStatus};

/// One returned line, shared by both return directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnedLine {
    pub product_id: ProductId,
    /// The stock unit the original document touched (for reference).
    pub stock_id: Option<StockUnitId>,
    /// For sale returns: the purchase that originally acquired the goods.
    pub purchase_ref: Option<PurchaseId>,
    pub imei_no: Option<String>,
    pub serial_no: Option<String>,
    pub quantity: i64,
    /// Refund amount per unit, smallest currency unit.
    pub unit_cost: i64,
    /// Original acquisition cost per unit (cost basis), tracked separately
    /// from the refund amount.
    pub original_unit_cost: Option<i64>,
    pub line_total: i64,
    pub gst_applicable: bool,
    pub gst_percentage: i64,
    pub gst_amount: i64,
    pub line_total_with_gst: i64,
}

/// Reconciliation record for goods a customer gave back.
///
/// The goods themselves re-enter inventory through the linked
/// `new_purchase`; this record tracks the refund owed to the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleReturn {
    pub id: SaleReturnId,
    pub original_sale: SaleId,
    /// The synthetic purchase carrying the re-created stock units.
    pub new_purchase: Option<PurchaseId>,
    pub business_location: LocationId,
    pub reference_no: String,
    pub returned_products: Vec<ReturnedLine>,
    pub total_return_amount: i64,
    pub payment_status: PaymentStatus,
    pub payment_due: i64,
    pub return_payments: Vec<Payment>,
    pub return_date: DateTime<Utc>,
    pub is_deleted: bool,
}

/// Record of goods sent back to a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReturn {
    pub id: PurchaseReturnId,
    pub original_purchase: PurchaseId,
    pub business_location: LocationId,
    pub reference_no: String,
    pub returned_products: Vec<ReturnedLine>,
    pub total_return_amount: i64,
    pub payment_status: PaymentStatus,
    pub payment_due: i64,
    pub return_payments: Vec<Payment>,
    pub return_date: DateTime<Utc>,
    pub is_deleted: bool,
}
