//! Stock units and their consume/restore state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shopledger_core::{LocationId, ProductId, StockUnitId};

/// Result type for stock operations.
pub type StockResult<T> = Result<T, StockError>;

/// Stock-level error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockError {
    /// A non-consumed unit with the same IMEI already exists.
    #[error("duplicate IMEI {imei_no} already exists and is in stock")]
    DuplicateUnit { imei_no: String },

    /// Quantity outside the rules for the unit kind.
    #[error("invalid quantity {quantity}: {reason}")]
    InvalidQuantity { quantity: i64, reason: String },

    /// Serialized unit was already consumed.
    #[error("stock unit {0} already sold")]
    AlreadySold(StockUnitId),

    /// Fungible unit has less remaining quantity than requested.
    #[error("insufficient stock for unit {unit}: available {available}, requested {requested}")]
    InsufficientStock {
        unit: StockUnitId,
        available: i64,
        requested: i64,
    },

    /// No stock unit with this id.
    #[error("stock unit {0} not found")]
    NotFound(StockUnitId),
}

/// What kind of unit this is: a serialized device or an interchangeable
/// accessory batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum UnitKind {
    /// Uniquely identified by IMEI (quantity is always 0 or 1).
    Serialized {
        imei_no: String,
        serial_no: Option<String>,
    },
    /// Interchangeable quantity of one product.
    Fungible,
}

/// Availability of a unit. For serialized units this is binary; for fungible
/// units it tracks `quantity > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    Available,
    Consumed,
}

/// One persisted inventory unit.
///
/// A unit is owned by exactly one business location and never moves; it is
/// only consumed and restored in place. Units are never physically removed,
/// they are retired by soft-deleting their owning document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockUnit {
    pub id: StockUnitId,
    pub product_id: ProductId,
    pub kind: UnitKind,
    /// Acquisition cost per unit, in smallest currency unit.
    pub unit_cost: i64,
    /// Quantity at creation time; immutable afterwards.
    pub initial_quantity: i64,
    /// Remaining unconsumed quantity.
    pub quantity: i64,
    pub business_location: LocationId,
    pub gst_applicable: bool,
    pub gst_percentage: i64,
    pub status: UnitStatus,
    pub created_at: DateTime<Utc>,
}

impl StockUnit {
    /// Create a serialized (IMEI) unit. Always quantity 1.
    pub fn new_serialized(
        product_id: ProductId,
        imei_no: String,
        serial_no: Option<String>,
        unit_cost: i64,
        business_location: LocationId,
        gst_applicable: bool,
        gst_percentage: i64,
    ) -> Self {
        Self {
            id: StockUnitId::new(),
            product_id,
            kind: UnitKind::Serialized { imei_no, serial_no },
            unit_cost,
            initial_quantity: 1,
            quantity: 1,
            business_location,
            gst_applicable,
            gst_percentage,
            status: UnitStatus::Available,
            created_at: Utc::now(),
        }
    }

    /// Create a fungible (accessory) unit with the given quantity.
    pub fn new_fungible(
        product_id: ProductId,
        quantity: i64,
        unit_cost: i64,
        business_location: LocationId,
        gst_applicable: bool,
        gst_percentage: i64,
    ) -> Self {
        Self {
            id: StockUnitId::new(),
            product_id,
            kind: UnitKind::Fungible,
            unit_cost,
            initial_quantity: quantity,
            quantity,
            business_location,
            gst_applicable,
            gst_percentage,
            status: if quantity > 0 {
                UnitStatus::Available
            } else {
                UnitStatus::Consumed
            },
            created_at: Utc::now(),
        }
    }

    pub fn imei_no(&self) -> Option<&str> {
        match &self.kind {
            UnitKind::Serialized { imei_no, .. } => Some(imei_no),
            UnitKind::Fungible => None,
        }
    }

    pub fn is_serialized(&self) -> bool {
        matches!(self.kind, UnitKind::Serialized { .. })
    }

    pub fn is_available(&self) -> bool {
        self.status == UnitStatus::Available
    }

    /// Check whether `requested` could be consumed right now, without
    /// mutating anything. Used for batch validation before any unit is
    /// touched.
    pub fn check_consume(&self, requested: i64) -> StockResult<()> {
        if requested <= 0 {
            return Err(StockError::InvalidQuantity {
                quantity: requested,
                reason: "consume quantity must be positive".into(),
            });
        }
        match self.kind {
            UnitKind::Serialized { .. } => {
                if self.status == UnitStatus::Consumed {
                    Err(StockError::AlreadySold(self.id))
                } else {
                    Ok(())
                }
            }
            UnitKind::Fungible => {
                if self.quantity < requested {
                    Err(StockError::InsufficientStock {
                        unit: self.id,
                        available: self.quantity,
                        requested,
                    })
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Consume `requested` from this unit.
    ///
    /// Serialized: the whole unit is consumed regardless of `requested`.
    /// Fungible: subtracts, flipping to `Consumed` when nothing remains.
    pub fn consume(&mut self, requested: i64) -> StockResult<()> {
        self.check_consume(requested)?;
        match self.kind {
            UnitKind::Serialized { .. } => {
                self.quantity = 0;
                self.status = UnitStatus::Consumed;
            }
            UnitKind::Fungible => {
                self.quantity -= requested;
                if self.quantity == 0 {
                    self.status = UnitStatus::Consumed;
                }
            }
        }
        Ok(())
    }

    /// Inverse of [`consume`](Self::consume).
    ///
    /// Not idempotent: callers must track quantities precisely and must not
    /// restore the same consumption twice.
    pub fn restore(&mut self, requested: i64) {
        match self.kind {
            UnitKind::Serialized { .. } => {
                self.quantity = 1;
                self.status = UnitStatus::Available;
            }
            UnitKind::Fungible => {
                self.quantity += requested;
                if self.quantity > 0 {
                    self.status = UnitStatus::Available;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn serialized() -> StockUnit {
        StockUnit::new_serialized(
            ProductId::new(),
            "356938035643809".into(),
            None,
            10_000,
            LocationId::new(),
            false,
            18,
        )
    }

    fn fungible(qty: i64) -> StockUnit {
        StockUnit::new_fungible(ProductId::new(), qty, 500, LocationId::new(), false, 18)
    }

    #[test]
    fn serialized_consume_is_binary() {
        let mut unit = serialized();
        assert!(unit.is_available());
        unit.consume(1).unwrap();
        assert_eq!(unit.quantity, 0);
        assert_eq!(unit.status, UnitStatus::Consumed);

        let err = unit.consume(1).unwrap_err();
        assert_eq!(err, StockError::AlreadySold(unit.id));
    }

    #[test]
    fn serialized_restore_makes_available_again() {
        let mut unit = serialized();
        unit.consume(1).unwrap();
        unit.restore(1);
        assert_eq!(unit.quantity, 1);
        assert!(unit.is_available());
    }

    #[test]
    fn fungible_partial_consume_keeps_available() {
        let mut unit = fungible(10);
        unit.consume(4).unwrap();
        assert_eq!(unit.quantity, 6);
        assert!(unit.is_available());
    }

    #[test]
    fn fungible_full_consume_flips_status() {
        let mut unit = fungible(3);
        unit.consume(3).unwrap();
        assert_eq!(unit.quantity, 0);
        assert_eq!(unit.status, UnitStatus::Consumed);

        unit.restore(2);
        assert_eq!(unit.quantity, 2);
        assert!(unit.is_available());
    }

    #[test]
    fn fungible_over_consume_is_rejected_without_mutation() {
        let mut unit = fungible(2);
        let err = unit.consume(5).unwrap_err();
        assert!(matches!(
            err,
            StockError::InsufficientStock {
                available: 2,
                requested: 5,
                ..
            }
        ));
        assert_eq!(unit.quantity, 2);
        assert!(unit.is_available());
    }

    #[test]
    fn zero_or_negative_consume_is_invalid() {
        let mut unit = fungible(2);
        assert!(matches!(
            unit.consume(0),
            Err(StockError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            unit.consume(-1),
            Err(StockError::InvalidQuantity { .. })
        ));
    }

    proptest! {
        /// Conservation at the unit level: for any interleaving of valid
        /// consumes and matching restores, `initial - consumed + restored`
        /// always equals the remaining quantity.
        #[test]
        fn fungible_quantity_is_conserved(
            initial in 1i64..1_000,
            ops in prop::collection::vec(1i64..50, 0..32)
        ) {
            let mut unit = fungible(initial);
            let mut consumed: i64 = 0;

            for op in ops {
                if unit.check_consume(op).is_ok() {
                    unit.consume(op).unwrap();
                    consumed += op;
                } else if consumed >= op {
                    unit.restore(op);
                    consumed -= op;
                }
                prop_assert_eq!(unit.quantity, initial - consumed);
                prop_assert!(unit.quantity >= 0 && unit.quantity <= unit.initial_quantity);
                prop_assert_eq!(unit.is_available(), unit.quantity > 0);
            }
        }
    }
}
