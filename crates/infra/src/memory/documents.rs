//! In-memory document database.
//!
//! One struct carries every document collection so services that need
//! several store seams (the reconciler, the projectors) can share a single
//! `Arc`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use tokio::sync::{Mutex, RwLock};

use shopledger_core::{
    AccountId, DepositId, DomainError, DomainResult, ExpenseId, LocationId, PurchaseId,
    PurchaseReturnId, SaleId, SaleReturnId, StockUnitId, TransferId,
};
use shopledger_documents::{
    format_reference, Deposit, DepositStore, Expense, ExpenseStore, FundTransfer, Purchase,
    PurchaseReturn, PurchaseReturnStore, PurchaseStore, Sale, SaleReturn, SaleReturnStore,
    SaleStore, Sequencer, TransferStore,
};

fn in_location(doc_location: LocationId, filter: Option<LocationId>) -> bool {
    filter.is_none_or(|l| l == doc_location)
}

/// In-memory implementation of every document store seam plus the
/// reference-number sequencer. Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryDocumentDb {
    sales: RwLock<HashMap<SaleId, Sale>>,
    purchases: RwLock<HashMap<PurchaseId, Purchase>>,
    expenses: RwLock<HashMap<ExpenseId, Expense>>,
    deposits: RwLock<HashMap<DepositId, Deposit>>,
    transfers: RwLock<HashMap<TransferId, FundTransfer>>,
    sale_returns: RwLock<HashMap<SaleReturnId, SaleReturn>>,
    purchase_returns: RwLock<HashMap<PurchaseReturnId, PurchaseReturn>>,
    sequences: Mutex<HashMap<String, u64>>,
}

impl InMemoryDocumentDb {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SaleStore for InMemoryDocumentDb {
    async fn insert_sale(&self, sale: Sale) -> DomainResult<()> {
        self.sales.write().await.insert(sale.id, sale);
        Ok(())
    }

    async fn get_sale(&self, id: SaleId) -> DomainResult<Sale> {
        self.sales
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("sale {id}")))
    }

    async fn update_sale(&self, sale: Sale) -> DomainResult<()> {
        let mut sales = self.sales.write().await;
        if !sales.contains_key(&sale.id) {
            return Err(DomainError::not_found(format!("sale {}", sale.id)));
        }
        sales.insert(sale.id, sale);
        Ok(())
    }

    async fn sales_paying_into(
        &self,
        account: AccountId,
        location: Option<LocationId>,
    ) -> DomainResult<Vec<Sale>> {
        Ok(self
            .sales
            .read()
            .await
            .values()
            .filter(|s| {
                !s.is_deleted
                    && in_location(s.business_location, location)
                    && s.payments.iter().any(|p| p.account == Some(account))
            })
            .cloned()
            .collect())
    }

    async fn live_sales(&self, location: Option<LocationId>) -> DomainResult<Vec<Sale>> {
        Ok(self
            .sales
            .read()
            .await
            .values()
            .filter(|s| !s.is_deleted && in_location(s.business_location, location))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PurchaseStore for InMemoryDocumentDb {
    async fn insert_purchase(&self, purchase: Purchase) -> DomainResult<()> {
        self.purchases.write().await.insert(purchase.id, purchase);
        Ok(())
    }

    async fn get_purchase(&self, id: PurchaseId) -> DomainResult<Purchase> {
        self.purchases
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("purchase {id}")))
    }

    async fn update_purchase(&self, purchase: Purchase) -> DomainResult<()> {
        let mut purchases = self.purchases.write().await;
        if !purchases.contains_key(&purchase.id) {
            return Err(DomainError::not_found(format!("purchase {}", purchase.id)));
        }
        purchases.insert(purchase.id, purchase);
        Ok(())
    }

    async fn purchase_containing_stock(
        &self,
        stock_id: StockUnitId,
    ) -> DomainResult<Option<Purchase>> {
        Ok(self
            .purchases
            .read()
            .await
            .values()
            .find(|p| !p.is_deleted && p.products.iter().any(|l| l.stock_id == Some(stock_id)))
            .cloned())
    }

    async fn purchases_paying_from(
        &self,
        account: AccountId,
        location: Option<LocationId>,
    ) -> DomainResult<Vec<Purchase>> {
        Ok(self
            .purchases
            .read()
            .await
            .values()
            .filter(|p| {
                !p.is_deleted
                    && in_location(p.business_location, location)
                    && p.payments.iter().any(|pay| pay.account == Some(account))
            })
            .cloned()
            .collect())
    }

    async fn live_purchases(&self, location: Option<LocationId>) -> DomainResult<Vec<Purchase>> {
        Ok(self
            .purchases
            .read()
            .await
            .values()
            .filter(|p| !p.is_deleted && in_location(p.business_location, location))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ExpenseStore for InMemoryDocumentDb {
    async fn insert_expense(&self, expense: Expense) -> DomainResult<()> {
        self.expenses.write().await.insert(expense.id, expense);
        Ok(())
    }

    async fn get_expense(&self, id: ExpenseId) -> DomainResult<Expense> {
        self.expenses
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("expense {id}")))
    }

    async fn update_expense(&self, expense: Expense) -> DomainResult<()> {
        let mut expenses = self.expenses.write().await;
        if !expenses.contains_key(&expense.id) {
            return Err(DomainError::not_found(format!("expense {}", expense.id)));
        }
        expenses.insert(expense.id, expense);
        Ok(())
    }

    async fn expenses_paying_from(
        &self,
        account: AccountId,
        location: Option<LocationId>,
    ) -> DomainResult<Vec<Expense>> {
        Ok(self
            .expenses
            .read()
            .await
            .values()
            .filter(|e| {
                !e.is_deleted
                    && in_location(e.business_location, location)
                    && e.payments.iter().any(|p| p.account == Some(account))
            })
            .cloned()
            .collect())
    }

    async fn live_expenses(&self, location: Option<LocationId>) -> DomainResult<Vec<Expense>> {
        Ok(self
            .expenses
            .read()
            .await
            .values()
            .filter(|e| !e.is_deleted && in_location(e.business_location, location))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DepositStore for InMemoryDocumentDb {
    async fn insert_deposit(&self, deposit: Deposit) -> DomainResult<()> {
        self.deposits.write().await.insert(deposit.id, deposit);
        Ok(())
    }

    async fn deposits_into(
        &self,
        account: AccountId,
        location: Option<LocationId>,
    ) -> DomainResult<Vec<Deposit>> {
        Ok(self
            .deposits
            .read()
            .await
            .values()
            .filter(|d| d.to_account == account && in_location(d.business_location, location))
            .cloned()
            .collect())
    }

    async fn all_deposits(&self, location: Option<LocationId>) -> DomainResult<Vec<Deposit>> {
        Ok(self
            .deposits
            .read()
            .await
            .values()
            .filter(|d| in_location(d.business_location, location))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TransferStore for InMemoryDocumentDb {
    async fn insert_transfer(&self, transfer: FundTransfer) -> DomainResult<()> {
        self.transfers.write().await.insert(transfer.id, transfer);
        Ok(())
    }

    async fn transfers_out_of(
        &self,
        account: AccountId,
        location: Option<LocationId>,
    ) -> DomainResult<Vec<FundTransfer>> {
        Ok(self
            .transfers
            .read()
            .await
            .values()
            .filter(|t| t.from_account == account && in_location(t.business_location, location))
            .cloned()
            .collect())
    }

    async fn transfers_into(
        &self,
        account: AccountId,
        location: Option<LocationId>,
    ) -> DomainResult<Vec<FundTransfer>> {
        Ok(self
            .transfers
            .read()
            .await
            .values()
            .filter(|t| t.to_account == account && in_location(t.business_location, location))
            .cloned()
            .collect())
    }

    async fn all_transfers(&self, location: Option<LocationId>) -> DomainResult<Vec<FundTransfer>> {
        Ok(self
            .transfers
            .read()
            .await
            .values()
            .filter(|t| in_location(t.business_location, location))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SaleReturnStore for InMemoryDocumentDb {
    async fn insert_sale_return(&self, ret: SaleReturn) -> DomainResult<()> {
        self.sale_returns.write().await.insert(ret.id, ret);
        Ok(())
    }

    async fn get_sale_return(&self, id: SaleReturnId) -> DomainResult<SaleReturn> {
        self.sale_returns
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("sale return {id}")))
    }

    async fn update_sale_return(&self, ret: SaleReturn) -> DomainResult<()> {
        let mut returns = self.sale_returns.write().await;
        if !returns.contains_key(&ret.id) {
            return Err(DomainError::not_found(format!("sale return {}", ret.id)));
        }
        returns.insert(ret.id, ret);
        Ok(())
    }

    async fn sale_has_live_returns(&self, sale: SaleId) -> DomainResult<bool> {
        Ok(self
            .sale_returns
            .read()
            .await
            .values()
            .any(|r| !r.is_deleted && r.original_sale == sale))
    }

    async fn sale_returns_paying_from(
        &self,
        account: AccountId,
        location: Option<LocationId>,
    ) -> DomainResult<Vec<SaleReturn>> {
        Ok(self
            .sale_returns
            .read()
            .await
            .values()
            .filter(|r| {
                !r.is_deleted
                    && in_location(r.business_location, location)
                    && r.return_payments.iter().any(|p| p.account == Some(account))
            })
            .cloned()
            .collect())
    }

    async fn live_sale_returns(
        &self,
        location: Option<LocationId>,
    ) -> DomainResult<Vec<SaleReturn>> {
        Ok(self
            .sale_returns
            .read()
            .await
            .values()
            .filter(|r| !r.is_deleted && in_location(r.business_location, location))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PurchaseReturnStore for InMemoryDocumentDb {
    async fn insert_purchase_return(&self, ret: PurchaseReturn) -> DomainResult<()> {
        self.purchase_returns.write().await.insert(ret.id, ret);
        Ok(())
    }

    async fn get_purchase_return(&self, id: PurchaseReturnId) -> DomainResult<PurchaseReturn> {
        self.purchase_returns
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("purchase return {id}")))
    }

    async fn update_purchase_return(&self, ret: PurchaseReturn) -> DomainResult<()> {
        let mut returns = self.purchase_returns.write().await;
        if !returns.contains_key(&ret.id) {
            return Err(DomainError::not_found(format!("purchase return {}", ret.id)));
        }
        returns.insert(ret.id, ret);
        Ok(())
    }

    async fn purchase_returns_paying_into(
        &self,
        account: AccountId,
        location: Option<LocationId>,
    ) -> DomainResult<Vec<PurchaseReturn>> {
        Ok(self
            .purchase_returns
            .read()
            .await
            .values()
            .filter(|r| {
                !r.is_deleted
                    && in_location(r.business_location, location)
                    && r.return_payments.iter().any(|p| p.account == Some(account))
            })
            .cloned()
            .collect())
    }

    async fn live_purchase_returns(
        &self,
        location: Option<LocationId>,
    ) -> DomainResult<Vec<PurchaseReturn>> {
        Ok(self
            .purchase_returns
            .read()
            .await
            .values()
            .filter(|r| !r.is_deleted && in_location(r.business_location, location))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Sequencer for InMemoryDocumentDb {
    async fn next_reference(&self, prefix: &str) -> DomainResult<String> {
        let mut sequences = self.sequences.lock().await;
        let seq = sequences.entry(prefix.to_string()).or_insert(0);
        *seq += 1;
        Ok(format_reference(prefix, Utc::now().year(), *seq))
    }
}
