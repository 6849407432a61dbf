//! Invoice repository: generation, payment status and annulment.
//!
//! Creating an invoice freezes its member expenses by setting `invoice_id`;
//! annulment releases them in the same batch that flips the invoice status.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use viatix_core::ledger::invoice::{
    self, InvoiceLineItem, InvoiceRecord, InvoiceStatus,
};
use viatix_core::ledger::LedgerError;
use viatix_core::reconcile::ReconciliationMatch;
use viatix_shared::types::{ExpenseId, InvoiceId, ProjectId};

use crate::entities::{
    expenses, invoices, sea_orm_active_enums::PaymentStatus as DbPaymentStatus,
};
use crate::repositories::expense_record;

/// Error types for invoice operations.
#[derive(Debug, thiserror::Error)]
pub enum InvoiceError {
    /// Invoice not found.
    #[error("Invoice not found: {0}")]
    NotFound(Uuid),

    /// A referenced expense does not exist.
    #[error("Expense not found: {0}")]
    ExpenseNotFound(Uuid),

    /// The stored line items could not be deserialized.
    #[error("Corrupt line items on invoice {0}")]
    CorruptLineItems(Uuid),

    /// Ledger validation or policy error.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating an invoice.
#[derive(Debug, Clone)]
pub struct CreateInvoiceInput {
    /// Invoice number shown to the client.
    pub number: String,
    /// Client billed.
    pub client: Option<String>,
    /// Project the invoice draws from, if any.
    pub project_id: Option<Uuid>,
    /// Approved expenses to bundle.
    pub expense_ids: Vec<Uuid>,
    /// Free-standing line items.
    pub line_items: Vec<InvoiceLineItem>,
}

/// Invoice repository.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
}

impl InvoiceRepository {
    /// Creates a new invoice repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an invoice over approved, unlocked expenses and locks them,
    /// all in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `ExpenseNotFound` for dangling ids, a ledger policy error for
    /// unapproved or already-invoiced members, or a database error.
    pub async fn create(&self, input: CreateInvoiceInput) -> Result<invoices::Model, InvoiceError> {
        let members = expenses::Entity::find()
            .filter(expenses::Column::Id.is_in(input.expense_ids.clone()))
            .all(&self.db)
            .await?;
        for id in &input.expense_ids {
            if !members.iter().any(|m| m.id == *id) {
                return Err(InvoiceError::ExpenseNotFound(*id));
            }
        }

        let records: Vec<_> = members.iter().map(expense_record).collect();
        invoice::validate_members(&records, &input.line_items)?;
        let total = invoice::invoice_total(&records, &input.line_items);

        let txn = self.db.begin().await?;
        let now = Utc::now().into();
        let invoice_id = Uuid::now_v7();

        let model = invoices::ActiveModel {
            id: Set(invoice_id),
            number: Set(input.number.clone()),
            client: Set(input.client.clone()),
            project_id: Set(input.project_id),
            total_amount: Set(total),
            line_items: Set(serde_json::to_value(&input.line_items)
                .map_err(|e| DbErr::Custom(e.to_string()))?),
            payment_status: Set(DbPaymentStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = model.insert(&txn).await?;

        expenses::Entity::update_many()
            .col_expr(expenses::Column::InvoiceId, Expr::val(invoice_id).into())
            .col_expr(expenses::Column::UpdatedAt, Expr::current_timestamp().into())
            .filter(expenses::Column::Id.is_in(input.expense_ids))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        info!(invoice_id = %invoice_id, total = %total, "invoice created");
        Ok(created)
    }

    /// Updates the payment status. Annulment is routed through [`Self::annul`]
    /// so the member locks are always released with it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a database error.
    pub async fn set_payment_status(
        &self,
        invoice_id: Uuid,
        status: InvoiceStatus,
    ) -> Result<invoices::Model, InvoiceError> {
        let db_status = match status {
            InvoiceStatus::Annulled => return self.annul(invoice_id).await,
            InvoiceStatus::Pending => DbPaymentStatus::Pending,
            InvoiceStatus::Paid => DbPaymentStatus::Paid,
        };

        let model = self.require(invoice_id).await?;
        let mut active: invoices::ActiveModel = model.into();
        active.payment_status = Set(db_status);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Annuls an invoice: flips the status and clears `invoice_id` on every
    /// member expense in the same transaction, releasing their locks.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `InvoiceAlreadyAnnulled`, or a database error.
    pub async fn annul(&self, invoice_id: Uuid) -> Result<invoices::Model, InvoiceError> {
        let model = self.require(invoice_id).await?;
        let record = self.to_record(&model).await?;
        let released = invoice::plan_annulment(&record)?;

        let txn = self.db.begin().await?;

        let mut active: invoices::ActiveModel = model.into();
        active.payment_status = Set(DbPaymentStatus::Annulled);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        expenses::Entity::update_many()
            .col_expr(expenses::Column::InvoiceId, Expr::val(Option::<Uuid>::None).into())
            .col_expr(expenses::Column::UpdatedAt, Expr::current_timestamp().into())
            .filter(expenses::Column::InvoiceId.eq(invoice_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        info!(
            invoice_id = %invoice_id,
            released = released.len(),
            "invoice annulled, member expenses released"
        );
        Ok(updated)
    }

    /// Marks the invoices of confirmed reconciliation matches as paid. This
    /// is the only ledger-visible effect of a bank statement import.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a database error.
    pub async fn apply_matches(
        &self,
        matches: &[ReconciliationMatch],
    ) -> Result<(), InvoiceError> {
        for m in matches {
            self.set_payment_status(m.invoice_id.into_inner(), InvoiceStatus::Paid)
                .await?;
        }
        Ok(())
    }

    /// Finds an invoice by id.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn find_by_id(
        &self,
        invoice_id: Uuid,
    ) -> Result<Option<invoices::Model>, InvoiceError> {
        Ok(invoices::Entity::find_by_id(invoice_id).one(&self.db).await?)
    }

    /// Lists all invoices, newest first.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list(&self) -> Result<Vec<invoices::Model>, InvoiceError> {
        Ok(invoices::Entity::find()
            .order_by_desc(invoices::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Lists invoices awaiting payment, the candidate pool for bank
    /// reconciliation.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list_pending(&self) -> Result<Vec<InvoiceRecord>, InvoiceError> {
        let models = invoices::Entity::find()
            .filter(invoices::Column::PaymentStatus.eq(DbPaymentStatus::Pending))
            .order_by_desc(invoices::Column::CreatedAt)
            .all(&self.db)
            .await?;

        let mut records = Vec::with_capacity(models.len());
        for model in &models {
            records.push(self.to_record(model).await?);
        }
        Ok(records)
    }

    async fn require(&self, invoice_id: Uuid) -> Result<invoices::Model, InvoiceError> {
        self.find_by_id(invoice_id)
            .await?
            .ok_or(InvoiceError::NotFound(invoice_id))
    }

    async fn to_record(&self, model: &invoices::Model) -> Result<InvoiceRecord, InvoiceError> {
        let members = expenses::Entity::find()
            .filter(expenses::Column::InvoiceId.eq(model.id))
            .all(&self.db)
            .await?;
        let line_items: Vec<InvoiceLineItem> =
            serde_json::from_value(model.line_items.clone())
                .map_err(|_| InvoiceError::CorruptLineItems(model.id))?;

        Ok(InvoiceRecord {
            id: InvoiceId::from_uuid(model.id),
            number: model.number.clone(),
            client: model.client.clone(),
            project_id: model.project_id.map(ProjectId::from_uuid),
            total_amount: model.total_amount,
            expense_ids: members
                .iter()
                .map(|m| ExpenseId::from_uuid(m.id))
                .collect(),
            line_items,
            payment_status: match model.payment_status {
                DbPaymentStatus::Pending => InvoiceStatus::Pending,
                DbPaymentStatus::Paid => InvoiceStatus::Paid,
                DbPaymentStatus::Annulled => InvoiceStatus::Annulled,
            },
        })
    }
}
