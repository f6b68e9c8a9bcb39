//! Append-only audit log writer and queries.
//!
//! Every mutation path appends one audit row inside the same database
//! transaction as the mutation itself, so a committed change always has its
//! trail and a rolled-back change leaves none.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use serde_json::Value;
use uuid::Uuid;

use crate::entities::{audit_logs, sea_orm_active_enums::AuditAction};

/// Who performed a mutation, as far as the request reveals it.
#[derive(Debug, Clone, Default)]
pub struct AuditActor {
    /// Free-form user identifier from the request, if any.
    pub user_id: Option<String>,
    /// Client IP, if any.
    pub ip: Option<String>,
}

/// One audit entry to append.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    /// Entity name, e.g. `site_expense`.
    pub entity: &'static str,
    /// Id of the mutated row.
    pub entity_id: Uuid,
    /// Mutation kind.
    pub action: AuditAction,
    /// State before the mutation, when it existed.
    pub old_value: Option<Value>,
    /// State after the mutation, when it still exists.
    pub new_value: Option<Value>,
}

/// Appends one audit row on the given connection or open transaction.
pub async fn append_audit<C: ConnectionTrait>(
    conn: &C,
    actor: &AuditActor,
    entry: AuditEntry,
) -> Result<(), DbErr> {
    let row = audit_logs::ActiveModel {
        id: Set(Uuid::new_v4()),
        entity: Set(entry.entity.to_string()),
        entity_id: Set(entry.entity_id),
        action: Set(entry.action),
        actor: Set(actor.user_id.clone()),
        ip: Set(actor.ip.clone()),
        old_value: Set(entry.old_value),
        new_value: Set(entry.new_value),
        created_at: Set(Utc::now().into()),
    };
    row.insert(conn).await?;
    Ok(())
}

/// Read access to the audit log.
#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    db: DatabaseConnection,
}

impl AuditLogRepository {
    /// Creates a new audit log repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists audit entries for one entity row, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_entity(
        &self,
        entity: &str,
        entity_id: Uuid,
    ) -> Result<Vec<audit_logs::Model>, DbErr> {
        audit_logs::Entity::find()
            .filter(audit_logs::Column::Entity.eq(entity))
            .filter(audit_logs::Column::EntityId.eq(entity_id))
            .order_by_desc(audit_logs::Column::CreatedAt)
            .all(&self.db)
            .await
    }
}
