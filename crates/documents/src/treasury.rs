//! Deposit and fund-transfer documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopledger_core::{AccountId, DepositId, LocationId, TransferId};

/// Money added to an account from outside the tracked accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub id: DepositId,
    pub to_account: AccountId,
    pub amount: i64,
    pub note: Option<String>,
    pub reference_no: String,
    pub business_location: LocationId,
    pub date_time: DateTime<Utc>,
}

/// Money moved between two tracked accounts. Internal by definition: a
/// transfer never changes the combined balance across accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundTransfer {
    pub id: TransferId,
    pub from_account: AccountId,
    pub to_account: AccountId,
    pub amount: i64,
    pub note: Option<String>,
    pub reference_no: String,
    pub business_location: LocationId,
    pub date_time: DateTime<Utc>,
}
