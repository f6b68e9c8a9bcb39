//! Site repository for the construction-site dimension.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder, Set, TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use crate::entities::{sea_orm_active_enums::AuditAction, sites};
use crate::repositories::audit::{AuditActor, AuditEntry, append_audit};

/// Error types for site operations.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// Site not found.
    #[error("Site not found: {0}")]
    NotFound(Uuid),

    /// Name is required.
    #[error("Site name must not be empty")]
    EmptyName,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a site.
#[derive(Debug, Clone)]
pub struct CreateSiteInput {
    /// Site name.
    pub name: String,
    /// Optional location.
    pub location: Option<String>,
    /// Optional client name.
    pub client_name: Option<String>,
}

/// Input for updating a site. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateSiteInput {
    /// New name.
    pub name: Option<String>,
    /// New location.
    pub location: Option<String>,
    /// New client name.
    pub client_name: Option<String>,
}

/// Site repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct SiteRepository {
    db: DatabaseConnection,
}

impl SiteRepository {
    /// Creates a new site repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a site.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or the database operation fails.
    pub async fn create(
        &self,
        input: CreateSiteInput,
        actor: &AuditActor,
    ) -> Result<sites::Model, SiteError> {
        if input.name.trim().is_empty() {
            return Err(SiteError::EmptyName);
        }

        let now = Utc::now().into();
        let txn = self.db.begin().await?;

        let site = sites::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            location: Set(input.location),
            client_name: Set(input.client_name),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        append_audit(
            &txn,
            actor,
            AuditEntry {
                entity: "site",
                entity_id: site.id,
                action: AuditAction::Create,
                old_value: None,
                new_value: Some(json!({ "name": site.name, "location": site.location })),
            },
        )
        .await?;

        txn.commit().await?;
        Ok(site)
    }

    /// Lists all sites, active first, newest first within each group.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<sites::Model>, SiteError> {
        let sites = sites::Entity::find()
            .order_by_desc(sites::Column::IsActive)
            .order_by_desc(sites::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(sites)
    }

    /// Gets a site by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the site is not found or the query fails.
    pub async fn get(&self, id: Uuid) -> Result<sites::Model, SiteError> {
        sites::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(SiteError::NotFound(id))
    }

    /// Updates a site.
    ///
    /// # Errors
    ///
    /// Returns an error if the site is not found or the operation fails.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateSiteInput,
        actor: &AuditActor,
    ) -> Result<sites::Model, SiteError> {
        if let Some(name) = &input.name {
            if name.trim().is_empty() {
                return Err(SiteError::EmptyName);
            }
        }

        let site = self.get(id).await?;
        let old = json!({
            "name": site.name,
            "location": site.location,
            "client_name": site.client_name,
        });

        let txn = self.db.begin().await?;

        let mut active: sites::ActiveModel = site.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(location) = input.location {
            active.location = Set(Some(location));
        }
        if let Some(client_name) = input.client_name {
            active.client_name = Set(Some(client_name));
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(&txn).await?;

        append_audit(
            &txn,
            actor,
            AuditEntry {
                entity: "site",
                entity_id: updated.id,
                action: AuditAction::Update,
                old_value: Some(old),
                new_value: Some(json!({
                    "name": updated.name,
                    "location": updated.location,
                    "client_name": updated.client_name,
                })),
            },
        )
        .await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Deactivates a site (it stays referenced by historical rows).
    ///
    /// # Errors
    ///
    /// Returns an error if the site is not found or the operation fails.
    pub async fn deactivate(&self, id: Uuid, actor: &AuditActor) -> Result<sites::Model, SiteError> {
        let site = self.get(id).await?;

        let txn = self.db.begin().await?;

        let mut active: sites::ActiveModel = site.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        append_audit(
            &txn,
            actor,
            AuditEntry {
                entity: "site",
                entity_id: updated.id,
                action: AuditAction::SoftDelete,
                old_value: Some(json!({ "is_active": true })),
                new_value: Some(json!({ "is_active": false })),
            },
        )
        .await?;

        txn.commit().await?;
        Ok(updated)
    }
}
