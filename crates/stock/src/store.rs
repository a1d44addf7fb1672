//! Persistence seam for stock units.

use async_trait::async_trait;

use shopledger_core::{ProductId, StockUnitId};

use crate::unit::{StockResult, StockUnit};

/// Store of persisted stock units.
///
/// `consume` and `restore` must be applied atomically per unit (conditional
/// update / compare-and-set at the row level). There is deliberately no
/// cross-unit transaction: each unit mutation is its own committed step and
/// callers compensate with reverts, not rollbacks.
#[async_trait]
pub trait StockStore: Send + Sync {
    async fn insert(&self, unit: StockUnit) -> StockResult<()>;

    async fn get(&self, id: StockUnitId) -> StockResult<StockUnit>;

    /// Whether any non-consumed unit carries this IMEI.
    async fn imei_in_stock(&self, imei_no: &str) -> StockResult<bool>;

    /// Atomically consume `quantity` from the unit, applying the unit-kind
    /// transition rules. Returns the unit after mutation.
    async fn consume(&self, id: StockUnitId, quantity: i64) -> StockResult<StockUnit>;

    /// Atomically restore `quantity` to the unit. Missing units are skipped
    /// (returns `None`) so that reverts stay best-effort.
    async fn restore(&self, id: StockUnitId, quantity: i64) -> StockResult<Option<StockUnit>>;

    /// All units ever created for a product (consumed ones included).
    async fn for_product(&self, product_id: ProductId) -> StockResult<Vec<StockUnit>>;
}
