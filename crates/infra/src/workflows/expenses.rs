//! Expense workflow: create, edit payments, soft-delete.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use shopledger_core::{ExpenseId, LocationId};
use shopledger_documents::{Expense, ExpenseStore, Sequencer};
use shopledger_ledger::{AccountStore, LedgerApplier, Payment, PaymentStatus, TxnKind};

use super::WorkflowResult;

#[derive(Debug, Clone)]
pub struct NewExpense {
    pub transaction_date: DateTime<Utc>,
    pub is_refund: bool,
    pub category: Option<String>,
    pub business_location: LocationId,
    pub total_amount: i64,
    pub payments: Vec<Payment>,
}

pub struct ExpenseWorkflow<DB, A> {
    db: Arc<DB>,
    ledger: LedgerApplier<A>,
}

impl<DB, A> Clone for ExpenseWorkflow<DB, A> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            ledger: self.ledger.clone(),
        }
    }
}

impl<DB, A> ExpenseWorkflow<DB, A>
where
    DB: ExpenseStore + Sequencer,
    A: AccountStore,
{
    pub fn new(db: Arc<DB>, ledger: LedgerApplier<A>) -> Self {
        Self { db, ledger }
    }

    pub async fn create_expense(&self, new: NewExpense) -> WorkflowResult<Expense> {
        let paid = shopledger_ledger::invoice_paid_total(&new.payments);
        let expense = Expense {
            id: ExpenseId::new(),
            reference_no: self.db.next_reference("EXP").await?,
            transaction_date: new.transaction_date,
            is_refund: new.is_refund,
            category: new.category,
            business_location: new.business_location,
            payments: new.payments,
            total_amount: new.total_amount,
            payment_due: (new.total_amount - paid).max(0),
            payment_status: PaymentStatus::derive(new.total_amount, paid),
            is_deleted: false,
            created_at: Utc::now(),
        };
        self.db.insert_expense(expense.clone()).await?;

        self.ledger
            .apply_payments(&expense.payments, TxnKind::Expense)
            .await?;
        info!(expense = %expense.id, total = expense.total_amount, "created expense");
        Ok(expense)
    }

    pub async fn update_expense_payments(
        &self,
        id: ExpenseId,
        payments: Vec<Payment>,
    ) -> WorkflowResult<Expense> {
        let mut expense = self.db.get_expense(id).await?;
        let old = std::mem::replace(&mut expense.payments, payments);
        self.ledger.revert_payments(&old, TxnKind::Expense).await?;

        let paid = expense.amount_paid();
        expense.payment_due = (expense.total_amount - paid).max(0);
        expense.payment_status = PaymentStatus::derive(expense.total_amount, paid);
        self.db.update_expense(expense.clone()).await?;

        self.ledger
            .apply_payments(&expense.payments, TxnKind::Expense)
            .await?;
        Ok(expense)
    }

    pub async fn delete_expense(&self, id: ExpenseId) -> WorkflowResult<()> {
        let mut expense = self.db.get_expense(id).await?;
        self.ledger
            .revert_payments(&expense.payments, TxnKind::Expense)
            .await?;
        expense.is_deleted = true;
        self.db.update_expense(expense).await?;
        info!(expense = %id, "deleted expense");
        Ok(())
    }
}
