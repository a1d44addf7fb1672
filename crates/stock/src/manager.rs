//! Stock lifecycle manager: create, consume, revert.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use shopledger_core::{LocationId, ProductId, StockUnitId};

use crate::store::StockStore;
use crate::unit::{StockError, StockResult, StockUnit};

/// One incoming line item to be turned into a stock unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockIntake {
    pub product_id: ProductId,
    pub imei_no: Option<String>,
    pub serial_no: Option<String>,
    pub quantity: i64,
    /// Acquisition cost per unit, in smallest currency unit.
    pub unit_cost: i64,
    pub gst_applicable: bool,
    pub gst_percentage: i64,
}

/// A consumption (or reversal) request against one stock unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDraw {
    pub stock_id: StockUnitId,
    pub quantity: i64,
}

/// Drives stock unit lifecycle against a [`StockStore`], enforcing the
/// unit-kind quantity rules.
///
/// Batch contract: every operation validates all items before mutating any
/// unit. A failed batch leaves the store untouched; a failure in the apply
/// phase can only come from a concurrent writer winning the per-unit
/// conditional update.
pub struct StockManager<S> {
    store: Arc<S>,
}

impl<S> Clone for StockManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: StockStore> StockManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Load a single unit.
    pub async fn unit(&self, id: StockUnitId) -> StockResult<StockUnit> {
        self.store.get(id).await
    }

    /// Create one stock unit per intake item, all owned by `location`.
    ///
    /// Serialized items must have quantity 1 and a globally unique live
    /// IMEI (checked against the store and within the batch). Fungible items
    /// must have quantity >= 0. Returns the created units in input order.
    pub async fn create_stock(
        &self,
        items: Vec<StockIntake>,
        location: LocationId,
    ) -> StockResult<Vec<StockUnit>> {
        // Validation pass: nothing is inserted until every item checks out.
        let mut batch_imeis: HashSet<&str> = HashSet::new();
        for item in &items {
            match &item.imei_no {
                Some(imei) => {
                    if item.quantity != 1 {
                        return Err(StockError::InvalidQuantity {
                            quantity: item.quantity,
                            reason: "IMEI-based item must have quantity 1".into(),
                        });
                    }
                    if !batch_imeis.insert(imei.as_str())
                        || self.store.imei_in_stock(imei).await?
                    {
                        return Err(StockError::DuplicateUnit {
                            imei_no: imei.clone(),
                        });
                    }
                }
                None => {
                    if item.quantity < 0 {
                        return Err(StockError::InvalidQuantity {
                            quantity: item.quantity,
                            reason: "fungible item must have quantity >= 0".into(),
                        });
                    }
                }
            }
        }

        let mut created = Vec::with_capacity(items.len());
        for item in items {
            let unit = match item.imei_no {
                Some(imei) => StockUnit::new_serialized(
                    item.product_id,
                    imei,
                    item.serial_no,
                    item.unit_cost,
                    location,
                    item.gst_applicable,
                    item.gst_percentage,
                ),
                None => StockUnit::new_fungible(
                    item.product_id,
                    item.quantity,
                    item.unit_cost,
                    location,
                    item.gst_applicable,
                    item.gst_percentage,
                ),
            };
            debug!(unit = %unit.id, product = %unit.product_id, quantity = unit.quantity, "creating stock unit");
            self.store.insert(unit.clone()).await?;
            created.push(unit);
        }
        Ok(created)
    }

    /// Consume stock for the given draws.
    ///
    /// Validates the whole batch against current state first, then applies
    /// each draw as its own atomic conditional update. Draws targeting the
    /// same unit are validated against their combined quantity, so a batch
    /// can never pass validation and still fail partway through on its own
    /// arithmetic. If a concurrent writer wins a unit between validation
    /// and apply, the already-applied prefix is reverted before the error
    /// is returned.
    pub async fn consume_stock(&self, draws: &[StockDraw]) -> StockResult<()> {
        let mut requested: HashMap<StockUnitId, (i64, usize)> = HashMap::new();
        for draw in draws {
            if draw.quantity <= 0 {
                return Err(StockError::InvalidQuantity {
                    quantity: draw.quantity,
                    reason: "consume quantity must be positive".into(),
                });
            }
            let entry = requested.entry(draw.stock_id).or_insert((0, 0));
            entry.0 += draw.quantity;
            entry.1 += 1;
        }
        for (stock_id, (total, count)) in &requested {
            let unit = self.store.get(*stock_id).await?;
            // A serialized unit can only be drawn once per batch; the
            // second draw would hit an already-consumed unit.
            if unit.is_serialized() && *count > 1 {
                return Err(StockError::AlreadySold(unit.id));
            }
            unit.check_consume(*total)?;
        }
        for (idx, draw) in draws.iter().enumerate() {
            match self.store.consume(draw.stock_id, draw.quantity).await {
                Ok(unit) => {
                    debug!(unit = %unit.id, remaining = unit.quantity, "consumed stock");
                }
                Err(e) => {
                    warn!(unit = %draw.stock_id, error = %e, "consume lost to concurrent writer, rolling back batch");
                    self.revert_stock(&draws[..idx]).await?;
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Inverse of [`consume_stock`](Self::consume_stock).
    ///
    /// Missing units are skipped so document deletion stays best-effort.
    /// Callers must not revert the same consumption twice.
    pub async fn revert_stock(&self, draws: &[StockDraw]) -> StockResult<()> {
        for draw in draws {
            match self.store.restore(draw.stock_id, draw.quantity).await? {
                Some(unit) => {
                    debug!(unit = %unit.id, quantity = unit.quantity, "restored stock")
                }
                None => warn!(unit = %draw.stock_id, "revert skipped missing stock unit"),
            }
        }
        Ok(())
    }
}
