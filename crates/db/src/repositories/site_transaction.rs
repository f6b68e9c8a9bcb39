//! Direct CRUD over the unified site transaction ledger.
//!
//! Rows created here use `source = manual` with `source_id` set to the row's
//! own id, so the `(source, source_id)` uniqueness invariant holds for every
//! row, mirrored or not.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::entities::{
    sea_orm_active_enums::{AuditAction, TxnNature, TxnSource},
    site_transactions, sites,
};
use crate::repositories::audit::{AuditActor, AuditEntry, append_audit};

/// Entity name used in audit rows.
const AUDIT_ENTITY: &str = "site_transaction";

/// Error types for site transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum SiteTransactionError {
    /// Transaction not found.
    #[error("Site transaction not found: {0}")]
    NotFound(Uuid),

    /// Referenced site not found.
    #[error("Site not found: {0}")]
    SiteNotFound(Uuid),

    /// Mirrored rows may only be mutated through their originating record.
    #[error("Transaction {0} is a mirror; mutate its source record instead")]
    MirrorReadOnly(Uuid),

    /// Amount must be strictly positive.
    #[error("Amount must be positive")]
    NonPositiveAmount,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a direct transaction.
#[derive(Debug, Clone)]
pub struct CreateSiteTransactionInput {
    /// Site the transaction belongs to.
    pub site_id: Uuid,
    /// Transaction date.
    pub txn_date: NaiveDate,
    /// Debit or credit.
    pub nature: TxnNature,
    /// Amount, must be > 0.
    pub amount: Decimal,
    /// Title.
    pub title: String,
    /// Optional remarks.
    pub remarks: Option<String>,
    /// Optional structured metadata.
    pub meta: Option<Value>,
}

/// Input for updating a direct transaction. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateSiteTransactionInput {
    /// New transaction date.
    pub txn_date: Option<NaiveDate>,
    /// New nature.
    pub nature: Option<TxnNature>,
    /// New amount, must be > 0.
    pub amount: Option<Decimal>,
    /// New title.
    pub title: Option<String>,
    /// New remarks.
    pub remarks: Option<String>,
}

/// Filter options for listing transactions.
#[derive(Debug, Clone, Default)]
pub struct SiteTransactionFilter {
    /// Filter by site.
    pub site_id: Option<Uuid>,
    /// Filter by date range start.
    pub from: Option<NaiveDate>,
    /// Filter by date range end.
    pub to: Option<NaiveDate>,
    /// Filter by origin.
    pub source: Option<TxnSource>,
    /// Filter by nature.
    pub nature: Option<TxnNature>,
    /// Include soft-deleted rows.
    pub include_deleted: bool,
}

/// Repository for direct transaction CRUD.
#[derive(Debug, Clone)]
pub struct SiteTransactionRepository {
    db: DatabaseConnection,
}

impl SiteTransactionRepository {
    /// Creates a new site transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a direct (non-mirrored) transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is not positive, the site is missing,
    /// or the database operation fails.
    pub async fn create(
        &self,
        input: CreateSiteTransactionInput,
        actor: &AuditActor,
    ) -> Result<site_transactions::Model, SiteTransactionError> {
        if input.amount <= Decimal::ZERO {
            return Err(SiteTransactionError::NonPositiveAmount);
        }
        sites::Entity::find_by_id(input.site_id)
            .one(&self.db)
            .await?
            .ok_or(SiteTransactionError::SiteNotFound(input.site_id))?;

        let now = Utc::now().into();
        let id = Uuid::new_v4();
        let txn = self.db.begin().await?;

        let row = site_transactions::ActiveModel {
            id: Set(id),
            site_id: Set(input.site_id),
            txn_date: Set(input.txn_date),
            source: Set(TxnSource::Manual),
            // A direct row is its own source.
            source_id: Set(id),
            nature: Set(input.nature),
            amount: Set(input.amount),
            title: Set(input.title),
            remarks: Set(input.remarks),
            meta: Set(input.meta.unwrap_or_else(|| json!({}))),
            is_deleted: Set(false),
            deleted_at: Set(None),
            deleted_by: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        append_audit(
            &txn,
            actor,
            AuditEntry {
                entity: AUDIT_ENTITY,
                entity_id: row.id,
                action: AuditAction::Create,
                old_value: None,
                new_value: Some(snapshot(&row)),
            },
        )
        .await?;

        txn.commit().await?;
        Ok(row)
    }

    /// Updates a direct transaction.
    ///
    /// Mirrored rows are rejected; they change only through their source.
    ///
    /// # Errors
    ///
    /// Returns an error if the row is missing, is a mirror, a patched amount
    /// is not positive, or the database operation fails.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateSiteTransactionInput,
        actor: &AuditActor,
    ) -> Result<site_transactions::Model, SiteTransactionError> {
        if input.amount.is_some_and(|a| a <= Decimal::ZERO) {
            return Err(SiteTransactionError::NonPositiveAmount);
        }

        let row = self.get(id).await?;
        if row.source != TxnSource::Manual {
            return Err(SiteTransactionError::MirrorReadOnly(id));
        }
        let old = snapshot(&row);

        let txn = self.db.begin().await?;

        let mut active: site_transactions::ActiveModel = row.into();
        if let Some(txn_date) = input.txn_date {
            active.txn_date = Set(txn_date);
        }
        if let Some(nature) = input.nature {
            active.nature = Set(nature);
        }
        if let Some(amount) = input.amount {
            active.amount = Set(amount);
        }
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(remarks) = input.remarks {
            active.remarks = Set(Some(remarks));
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(&txn).await?;

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

    /// Soft-deletes a direct transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the row is missing, is a mirror, or the operation
    /// fails.
    pub async fn soft_delete(
        &self,
        id: Uuid,
        actor: &AuditActor,
    ) -> Result<site_transactions::Model, SiteTransactionError> {
        self.set_deleted(id, true, AuditAction::SoftDelete, actor).await
    }

    /// Restores a soft-deleted direct transaction.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::soft_delete`].
    pub async fn restore(
        &self,
        id: Uuid,
        actor: &AuditActor,
    ) -> Result<site_transactions::Model, SiteTransactionError> {
        self.set_deleted(id, false, AuditAction::Restore, actor).await
    }

    async fn set_deleted(
        &self,
        id: Uuid,
        deleted: bool,
        action: AuditAction,
        actor: &AuditActor,
    ) -> Result<site_transactions::Model, SiteTransactionError> {
        let row = self.get(id).await?;
        if row.source != TxnSource::Manual {
            return Err(SiteTransactionError::MirrorReadOnly(id));
        }
        let old = snapshot(&row);

        let now = Utc::now().into();
        let txn = self.db.begin().await?;

        let mut active: site_transactions::ActiveModel = row.into();
        active.is_deleted = Set(deleted);
        active.deleted_at = Set(deleted.then_some(now));
        active.deleted_by = Set(if deleted { actor.user_id.clone() } else { None });
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

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

    /// Permanently deletes a direct transaction. No recovery path.
    ///
    /// # Errors
    ///
    /// Returns an error if the row is missing, is a mirror, or the operation
    /// fails.
    pub async fn hard_delete(
        &self,
        id: Uuid,
        actor: &AuditActor,
    ) -> Result<(), SiteTransactionError> {
        let row = self.get(id).await?;
        if row.source != TxnSource::Manual {
            return Err(SiteTransactionError::MirrorReadOnly(id));
        }
        let old = snapshot(&row);

        let txn = self.db.begin().await?;

        site_transactions::Entity::delete_by_id(id).exec(&txn).await?;

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

    /// Gets a transaction by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the row does not exist.
    pub async fn get(&self, id: Uuid) -> Result<site_transactions::Model, SiteTransactionError> {
        site_transactions::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(SiteTransactionError::NotFound(id))
    }

    /// Finds the mirror row for an originating record, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_source(
        &self,
        source: TxnSource,
        source_id: Uuid,
    ) -> Result<Option<site_transactions::Model>, SiteTransactionError> {
        let row = site_transactions::Entity::find()
            .filter(site_transactions::Column::Source.eq(source))
            .filter(site_transactions::Column::SourceId.eq(source_id))
            .one(&self.db)
            .await?;
        Ok(row)
    }

    /// Lists transactions with optional filters, newest date first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        filter: SiteTransactionFilter,
    ) -> Result<Vec<site_transactions::Model>, SiteTransactionError> {
        let mut query = site_transactions::Entity::find();

        if !filter.include_deleted {
            query = query.filter(site_transactions::Column::IsDeleted.eq(false));
        }
        if let Some(site_id) = filter.site_id {
            query = query.filter(site_transactions::Column::SiteId.eq(site_id));
        }
        if let Some(from) = filter.from {
            query = query.filter(site_transactions::Column::TxnDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(site_transactions::Column::TxnDate.lte(to));
        }
        if let Some(source) = filter.source {
            query = query.filter(site_transactions::Column::Source.eq(source));
        }
        if let Some(nature) = filter.nature {
            query = query.filter(site_transactions::Column::Nature.eq(nature));
        }

        let rows = query
            .order_by_desc(site_transactions::Column::TxnDate)
            .order_by_desc(site_transactions::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    /// Sums active credit transactions (receipts) for one site.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn received_total_for_site(
        &self,
        site_id: Uuid,
    ) -> Result<Decimal, SiteTransactionError> {
        let rows = self
            .list(SiteTransactionFilter {
                site_id: Some(site_id),
                nature: Some(TxnNature::Credit),
                ..Default::default()
            })
            .await?;
        Ok(rows.iter().map(|r| r.amount).sum())
    }
}

fn snapshot(row: &site_transactions::Model) -> Value {
    json!({
        "site_id": row.site_id,
        "txn_date": row.txn_date,
        "source": row.source,
        "source_id": row.source_id,
        "nature": row.nature,
        "amount": row.amount,
        "title": row.title,
        "remarks": row.remarks,
        "is_deleted": row.is_deleted,
    })
}
