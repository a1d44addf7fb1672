//! Persistence seams for transaction documents.
//!
//! Queries that feed the read-side projectors take an optional location
//! filter and only ever see live (non-soft-deleted) documents.

use async_trait::async_trait;

use shopledger_core::{
    AccountId, DomainResult, ExpenseId, LocationId, PurchaseId, PurchaseReturnId, SaleId,
    SaleReturnId, StockUnitId,
};

use crate::expense::Expense;
use crate::purchase::Purchase;
use crate::returns::{PurchaseReturn, SaleReturn};
use crate::sale::Sale;
use crate::treasury::{Deposit, FundTransfer};

#[async_trait]
pub trait SaleStore: Send + Sync {
    async fn insert_sale(&self, sale: Sale) -> DomainResult<()>;
    async fn get_sale(&self, id: SaleId) -> DomainResult<Sale>;
    async fn update_sale(&self, sale: Sale) -> DomainResult<()>;
    /// Live sales carrying at least one payment posted to `account`.
    async fn sales_paying_into(
        &self,
        account: AccountId,
        location: Option<LocationId>,
    ) -> DomainResult<Vec<Sale>>;
    async fn live_sales(&self, location: Option<LocationId>) -> DomainResult<Vec<Sale>>;
}

#[async_trait]
pub trait PurchaseStore: Send + Sync {
    async fn insert_purchase(&self, purchase: Purchase) -> DomainResult<()>;
    async fn get_purchase(&self, id: PurchaseId) -> DomainResult<Purchase>;
    async fn update_purchase(&self, purchase: Purchase) -> DomainResult<()>;
    /// The live purchase whose lines created `stock_id`, if any.
    async fn purchase_containing_stock(
        &self,
        stock_id: StockUnitId,
    ) -> DomainResult<Option<Purchase>>;
    async fn purchases_paying_from(
        &self,
        account: AccountId,
        location: Option<LocationId>,
    ) -> DomainResult<Vec<Purchase>>;
    async fn live_purchases(&self, location: Option<LocationId>) -> DomainResult<Vec<Purchase>>;
}

#[async_trait]
pub trait ExpenseStore: Send + Sync {
    async fn insert_expense(&self, expense: Expense) -> DomainResult<()>;
    async fn get_expense(&self, id: ExpenseId) -> DomainResult<Expense>;
    async fn update_expense(&self, expense: Expense) -> DomainResult<()>;
    async fn expenses_paying_from(
        &self,
        account: AccountId,
        location: Option<LocationId>,
    ) -> DomainResult<Vec<Expense>>;
    async fn live_expenses(&self, location: Option<LocationId>) -> DomainResult<Vec<Expense>>;
}

#[async_trait]
pub trait DepositStore: Send + Sync {
    async fn insert_deposit(&self, deposit: Deposit) -> DomainResult<()>;
    async fn deposits_into(
        &self,
        account: AccountId,
        location: Option<LocationId>,
    ) -> DomainResult<Vec<Deposit>>;
    async fn all_deposits(&self, location: Option<LocationId>) -> DomainResult<Vec<Deposit>>;
}

#[async_trait]
pub trait TransferStore: Send + Sync {
    async fn insert_transfer(&self, transfer: FundTransfer) -> DomainResult<()>;
    async fn transfers_out_of(
        &self,
        account: AccountId,
        location: Option<LocationId>,
    ) -> DomainResult<Vec<FundTransfer>>;
    async fn transfers_into(
        &self,
        account: AccountId,
        location: Option<LocationId>,
    ) -> DomainResult<Vec<FundTransfer>>;
    async fn all_transfers(&self, location: Option<LocationId>) -> DomainResult<Vec<FundTransfer>>;
}

#[async_trait]
pub trait SaleReturnStore: Send + Sync {
    async fn insert_sale_return(&self, ret: SaleReturn) -> DomainResult<()>;
    async fn get_sale_return(&self, id: SaleReturnId) -> DomainResult<SaleReturn>;
    async fn update_sale_return(&self, ret: SaleReturn) -> DomainResult<()>;
    /// Whether a live return exists for this sale (blocks sale deletion).
    async fn sale_has_live_returns(&self, sale: SaleId) -> DomainResult<bool>;
    async fn sale_returns_paying_from(
        &self,
        account: AccountId,
        location: Option<LocationId>,
    ) -> DomainResult<Vec<SaleReturn>>;
    async fn live_sale_returns(&self, location: Option<LocationId>)
        -> DomainResult<Vec<SaleReturn>>;
}

#[async_trait]
pub trait PurchaseReturnStore: Send + Sync {
    async fn insert_purchase_return(&self, ret: PurchaseReturn) -> DomainResult<()>;
    async fn get_purchase_return(&self, id: PurchaseReturnId) -> DomainResult<PurchaseReturn>;
    async fn update_purchase_return(&self, ret: PurchaseReturn) -> DomainResult<()>;
    async fn purchase_returns_paying_into(
        &self,
        account: AccountId,
        location: Option<LocationId>,
    ) -> DomainResult<Vec<PurchaseReturn>>;
    async fn live_purchase_returns(
        &self,
        location: Option<LocationId>,
    ) -> DomainResult<Vec<PurchaseReturn>>;
}

/// Produces per-prefix sequential reference numbers
/// (e.g. `SALERET2026/0004`).
#[async_trait]
pub trait Sequencer: Send + Sync {
    async fn next_reference(&self, prefix: &str) -> DomainResult<String>;
}

/// Reference-number format shared by all sequencer implementations:
/// prefix + year + `/` + zero-padded sequence.
pub fn format_reference(prefix: &str, year: i32, seq: u64) -> String {
    format!("{prefix}{year}/{seq:04}")
}

#[cfg(test)]
mod tests {
    use super::format_reference;

    #[test]
    fn reference_format_is_prefix_year_slash_padded_seq() {
        assert_eq!(format_reference("SALERET", 2026, 4), "SALERET2026/0004");
        assert_eq!(format_reference("DEP", 2026, 12345), "DEP2026/12345");
    }
}
