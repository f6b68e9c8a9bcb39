//! Site expense repository: manual expense CRUD with the write-through
//! transaction mirror.
//!
//! Every mutation keeps the expense row, its mirror in `site_transactions`
//! (keyed by `(source, source_id)`), and the audit log consistent by doing all
//! writes inside one database transaction.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::entities::{
    sea_orm_active_enums::{AuditAction, TxnNature, TxnSource},
    site_expenses, site_transactions, sites,
};
use crate::repositories::audit::{AuditActor, AuditEntry, append_audit};

/// Entity name used in audit rows.
const AUDIT_ENTITY: &str = "site_expense";

/// Error types for site expense operations.
#[derive(Debug, thiserror::Error)]
pub enum SiteExpenseError {
    /// Expense not found.
    #[error("Site expense not found: {0}")]
    NotFound(Uuid),

    /// Referenced site not found.
    #[error("Site not found: {0}")]
    SiteNotFound(Uuid),

    /// Mirror transaction missing where it must already exist. Indicates
    /// prior data corruption; the enclosing transaction rolls back.
    #[error("Mirror transaction missing for expense {0}")]
    MirrorMissing(Uuid),

    /// Amount must be strictly positive.
    #[error("Amount must be positive")]
    NonPositiveAmount,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a manual expense.
#[derive(Debug, Clone)]
pub struct CreateSiteExpenseInput {
    /// Site the expense belongs to.
    pub site_id: Uuid,
    /// Expense date.
    pub expense_date: NaiveDate,
    /// Optional title; defaults to "Site Expense".
    pub title: Option<String>,
    /// Optional free-text summary.
    pub summary: Option<String>,
    /// Optional payment details.
    pub payment_details: Option<String>,
    /// Expense amount, must be > 0.
    pub amount: Decimal,
}

/// Input for updating a manual expense. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateSiteExpenseInput {
    /// New expense date.
    pub expense_date: Option<NaiveDate>,
    /// New title.
    pub title: Option<String>,
    /// New summary.
    pub summary: Option<String>,
    /// New payment details.
    pub payment_details: Option<String>,
    /// New amount, must be > 0.
    pub amount: Option<Decimal>,
}

/// Repository for manual site expenses and their transaction mirror.
#[derive(Debug, Clone)]
pub struct SiteExpenseRepository {
    db: DatabaseConnection,
}

impl SiteExpenseRepository {
    /// Creates a new site expense repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a manual expense and upserts its mirror transaction.
    ///
    /// All three writes (expense, mirror, audit) commit or roll back together.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is not positive, the site is missing,
    /// or a database operation fails.
    pub async fn create(
        &self,
        input: CreateSiteExpenseInput,
        actor: &AuditActor,
    ) -> Result<site_expenses::Model, SiteExpenseError> {
        if input.amount <= Decimal::ZERO {
            return Err(SiteExpenseError::NonPositiveAmount);
        }
        sites::Entity::find_by_id(input.site_id)
            .one(&self.db)
            .await?
            .ok_or(SiteExpenseError::SiteNotFound(input.site_id))?;

        let now = Utc::now().into();
        let txn = self.db.begin().await?;

        let expense = site_expenses::ActiveModel {
            id: Set(Uuid::new_v4()),
            site_id: Set(input.site_id),
            expense_date: Set(input.expense_date),
            title: Set(input.title.unwrap_or_else(|| "Site Expense".to_string())),
            summary: Set(input.summary),
            payment_details: Set(input.payment_details),
            amount: Set(input.amount),
            is_deleted: Set(false),
            deleted_at: Set(None),
            deleted_by: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        upsert_mirror(&txn, &expense).await?;

        append_audit(
            &txn,
            actor,
            AuditEntry {
                entity: AUDIT_ENTITY,
                entity_id: expense.id,
                action: AuditAction::Create,
                old_value: None,
                new_value: Some(snapshot(&expense)),
            },
        )
        .await?;

        txn.commit().await?;
        Ok(expense)
    }

    /// Applies a partial update and re-upserts the mirror under the same key,
    /// so the mirror row is updated in place rather than duplicated.
    ///
    /// # Errors
    ///
    /// Returns an error if the expense is missing, a patched amount is not
    /// positive, or a database operation fails.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateSiteExpenseInput,
        actor: &AuditActor,
    ) -> Result<site_expenses::Model, SiteExpenseError> {
        if input.amount.is_some_and(|a| a <= Decimal::ZERO) {
            return Err(SiteExpenseError::NonPositiveAmount);
        }

        let expense = self.get(id).await?;
        let old = snapshot(&expense);

        let txn = self.db.begin().await?;

        let mut active: site_expenses::ActiveModel = expense.into();
        if let Some(expense_date) = input.expense_date {
            active.expense_date = Set(expense_date);
        }
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(summary) = input.summary {
            active.summary = Set(Some(summary));
        }
        if let Some(payment_details) = input.payment_details {
            active.payment_details = Set(Some(payment_details));
        }
        if let Some(amount) = input.amount {
            active.amount = Set(amount);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(&txn).await?;

        upsert_mirror(&txn, &updated).await?;

        append_audit(
            &txn,
            actor,
            AuditEntry {
                entity: AUDIT_ENTITY,
                entity_id: updated.id,
                action: AuditAction::Update,
                old_value: Some(old),
                new_value: Some(snapshot(&updated)),
            },
        )
        .await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Soft-deletes the expense and its mirror in lockstep.
    ///
    /// The mirror update is keyed, not an upsert: a missing mirror row means
    /// prior corruption and fails the whole transaction, rolling back the
    /// expense flag flip with it.
    ///
    /// # Errors
    ///
    /// Returns an error if the expense or its mirror is missing, or a
    /// database operation fails.
    pub async fn soft_delete(
        &self,
        id: Uuid,
        actor: &AuditActor,
    ) -> Result<site_expenses::Model, SiteExpenseError> {
        self.set_deleted(id, true, AuditAction::SoftDelete, actor).await
    }

    /// Restores a soft-deleted expense and its mirror in lockstep.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::soft_delete`].
    pub async fn restore(
        &self,
        id: Uuid,
        actor: &AuditActor,
    ) -> Result<site_expenses::Model, SiteExpenseError> {
        self.set_deleted(id, false, AuditAction::Restore, actor).await
    }

    async fn set_deleted(
        &self,
        id: Uuid,
        deleted: bool,
        action: AuditAction,
        actor: &AuditActor,
    ) -> Result<site_expenses::Model, SiteExpenseError> {
        let expense = self.get(id).await?;
        let old = snapshot(&expense);

        let now = Utc::now().into();
        let deleted_at = deleted.then_some(now);
        let deleted_by = if deleted { actor.user_id.clone() } else { None };

        let txn = self.db.begin().await?;

        let mut active: site_expenses::ActiveModel = expense.into();
        active.is_deleted = Set(deleted);
        active.deleted_at = Set(deleted_at);
        active.deleted_by = Set(deleted_by.clone());
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        // Keyed update of the mirror; it must already exist.
        let mirror = site_transactions::Entity::find()
            .filter(site_transactions::Column::Source.eq(TxnSource::SiteExpense))
            .filter(site_transactions::Column::SourceId.eq(id))
            .one(&txn)
            .await?
            .ok_or(SiteExpenseError::MirrorMissing(id))?;

        let mut mirror_active: site_transactions::ActiveModel = mirror.into();
        mirror_active.is_deleted = Set(deleted);
        mirror_active.deleted_at = Set(deleted_at);
        mirror_active.deleted_by = Set(deleted_by);
        mirror_active.updated_at = Set(now);
        mirror_active.update(&txn).await?;

        append_audit(
            &txn,
            actor,
            AuditEntry {
                entity: AUDIT_ENTITY,
                entity_id: updated.id,
                action,
                old_value: Some(old),
                new_value: Some(snapshot(&updated)),
            },
        )
        .await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Permanently deletes the expense and any mirror rows. No recovery path.
    ///
    /// # Errors
    ///
    /// Returns an error if the expense is missing or the operation fails.
    pub async fn hard_delete(&self, id: Uuid, actor: &AuditActor) -> Result<(), SiteExpenseError> {
        let expense = self.get(id).await?;
        let old = snapshot(&expense);

        let txn = self.db.begin().await?;

        site_transactions::Entity::delete_many()
            .filter(site_transactions::Column::Source.eq(TxnSource::SiteExpense))
            .filter(site_transactions::Column::SourceId.eq(id))
            .exec(&txn)
            .await?;

        site_expenses::Entity::delete_by_id(id).exec(&txn).await?;

        append_audit(
            &txn,
            actor,
            AuditEntry {
                entity: AUDIT_ENTITY,
                entity_id: id,
                action: AuditAction::HardDelete,
                old_value: Some(old),
                new_value: None,
            },
        )
        .await?;

        txn.commit().await?;
        Ok(())
    }

    /// Gets an expense by id, deleted or not.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the row does not exist.
    pub async fn get(&self, id: Uuid) -> Result<site_expenses::Model, SiteExpenseError> {
        site_expenses::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(SiteExpenseError::NotFound(id))
    }

    /// Lists active (not soft-deleted) expenses, newest expense date first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_active(
        &self,
        site_id: Option<Uuid>,
    ) -> Result<Vec<site_expenses::Model>, SiteExpenseError> {
        let mut query =
            site_expenses::Entity::find().filter(site_expenses::Column::IsDeleted.eq(false));
        if let Some(site_id) = site_id {
            query = query.filter(site_expenses::Column::SiteId.eq(site_id));
        }
        let expenses = query
            .order_by_desc(site_expenses::Column::ExpenseDate)
            .order_by_asc(site_expenses::Column::Id)
            .all(&self.db)
            .await?;
        Ok(expenses)
    }

    /// Sums active manual expense amounts for one site.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn manual_total_for_site(&self, site_id: Uuid) -> Result<Decimal, SiteExpenseError> {
        let expenses = self.list_active(Some(site_id)).await?;
        Ok(expenses.iter().map(|e| e.amount).sum())
    }
}

/// Upserts the mirror transaction for an expense, keyed on
/// `(source, source_id)` so repeated calls update in place.
async fn upsert_mirror(
    txn: &DatabaseTransaction,
    expense: &site_expenses::Model,
) -> Result<(), DbErr> {
    let now = Utc::now().into();
    let meta = json!({
        "title": expense.title,
        "summary": expense.summary,
        "payment_details": expense.payment_details,
    });

    let mirror = site_transactions::ActiveModel {
        id: Set(Uuid::new_v4()),
        site_id: Set(expense.site_id),
        txn_date: Set(expense.expense_date),
        source: Set(TxnSource::SiteExpense),
        source_id: Set(expense.id),
        nature: Set(TxnNature::Debit),
        amount: Set(expense.amount),
        title: Set(expense.title.clone()),
        remarks: Set(None),
        meta: Set(meta),
        is_deleted: Set(false),
        deleted_at: Set(None),
        deleted_by: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    site_transactions::Entity::insert(mirror)
        .on_conflict(
            OnConflict::columns([
                site_transactions::Column::Source,
                site_transactions::Column::SourceId,
            ])
            .update_columns([
                site_transactions::Column::SiteId,
                site_transactions::Column::TxnDate,
                site_transactions::Column::Amount,
                site_transactions::Column::Title,
                site_transactions::Column::Meta,
                site_transactions::Column::UpdatedAt,
            ])
            .to_owned(),
        )
        .exec(txn)
        .await?;

    Ok(())
}

fn snapshot(expense: &site_expenses::Model) -> Value {
    json!({
        "site_id": expense.site_id,
        "expense_date": expense.expense_date,
        "title": expense.title,
        "summary": expense.summary,
        "payment_details": expense.payment_details,
        "amount": expense.amount,
        "is_deleted": expense.is_deleted,
    })
}
