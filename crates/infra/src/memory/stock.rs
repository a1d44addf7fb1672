//! In-memory stock unit store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use shopledger_core::{ProductId, StockUnitId};
use shopledger_stock::{StockError, StockResult, StockStore, StockUnit};

/// In-memory [`StockStore`].
///
/// Intended for tests/dev. Consume and restore mutate the unit under the
/// write lock, which gives the same per-unit atomicity a conditional update
/// gives a database row.
#[derive(Debug, Default)]
pub struct InMemoryStockStore {
    units: RwLock<HashMap<StockUnitId, StockUnit>>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StockStore for InMemoryStockStore {
    async fn insert(&self, unit: StockUnit) -> StockResult<()> {
        self.units.write().await.insert(unit.id, unit);
        Ok(())
    }

    async fn get(&self, id: StockUnitId) -> StockResult<StockUnit> {
        self.units
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StockError::NotFound(id))
    }

    async fn imei_in_stock(&self, imei_no: &str) -> StockResult<bool> {
        Ok(self
            .units
            .read()
            .await
            .values()
            .any(|u| u.is_available() && u.imei_no() == Some(imei_no)))
    }

    async fn consume(&self, id: StockUnitId, quantity: i64) -> StockResult<StockUnit> {
        let mut units = self.units.write().await;
        let unit = units.get_mut(&id).ok_or(StockError::NotFound(id))?;
        unit.consume(quantity)?;
        Ok(unit.clone())
    }

    async fn restore(&self, id: StockUnitId, quantity: i64) -> StockResult<Option<StockUnit>> {
        let mut units = self.units.write().await;
        match units.get_mut(&id) {
            Some(unit) => {
                unit.restore(quantity);
                Ok(Some(unit.clone()))
            }
            None => Ok(None),
        }
    }

    async fn for_product(&self, product_id: ProductId) -> StockResult<Vec<StockUnit>> {
        let mut units: Vec<StockUnit> = self
            .units
            .read()
            .await
            .values()
            .filter(|u| u.product_id == product_id)
            .cloned()
            .collect();
        units.sort_by_key(|u| u.created_at);
        Ok(units)
    }
}
