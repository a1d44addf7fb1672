//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! impl_uuid_newtype {
    ($(#[$doc:meta])* $t:ident, $name:literal) => {
        $(#[$doc])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Uuid);

        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

impl_uuid_newtype!(
    /// Identifier of a catalog product.
    ProductId, "ProductId"
);
impl_uuid_newtype!(
    /// Identifier of a single stock unit (one IMEI device or one accessory batch).
    StockUnitId, "StockUnitId"
);
impl_uuid_newtype!(
    /// Identifier of a monetary account.
    AccountId, "AccountId"
);
impl_uuid_newtype!(
    /// Identifier of a business location (shop/branch).
    LocationId, "LocationId"
);
impl_uuid_newtype!(
    /// Identifier of a contact (customer or supplier).
    ContactId, "ContactId"
);
impl_uuid_newtype!(
    /// Identifier of a payment method.
    PaymentMethodId, "PaymentMethodId"
);
impl_uuid_newtype!(
    /// Identifier of a sale document.
    SaleId, "SaleId"
);
impl_uuid_newtype!(
    /// Identifier of a purchase document.
    PurchaseId, "PurchaseId"
);
impl_uuid_newtype!(
    /// Identifier of a sale-return document.
    SaleReturnId, "SaleReturnId"
);
impl_uuid_newtype!(
    /// Identifier of a purchase-return document.
    PurchaseReturnId, "PurchaseReturnId"
);
impl_uuid_newtype!(
    /// Identifier of an expense document.
    ExpenseId, "ExpenseId"
);
impl_uuid_newtype!(
    /// Identifier of a deposit document.
    DepositId, "DepositId"
);
impl_uuid_newtype!(
    /// Identifier of a fund-transfer document.
    TransferId, "TransferId"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrip() {
        let id = AccountId::new();
        let parsed: AccountId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = "not-a-uuid".parse::<StockUnitId>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(_)));
    }
}
