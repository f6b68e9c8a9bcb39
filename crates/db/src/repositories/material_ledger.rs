//! Material supplier ledger: suppliers, purchase rows, and the snapshot fetch
//! that feeds the auto-expense projector.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use sitebook_core::PurchaseRow;

use crate::entities::{
    material_purchases, material_suppliers, sea_orm_active_enums::AuditAction, sites,
};
use crate::repositories::audit::{AuditActor, AuditEntry, append_audit};

/// Error types for material ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum MaterialLedgerError {
    /// Supplier not found.
    #[error("Supplier not found: {0}")]
    SupplierNotFound(Uuid),

    /// Site not found.
    #[error("Site not found: {0}")]
    SiteNotFound(Uuid),

    /// Purchase row not found.
    #[error("Purchase not found: {0}")]
    PurchaseNotFound(Uuid),

    /// Supplier name is required.
    #[error("Supplier name must not be empty")]
    EmptyName,

    /// Material name is required.
    #[error("Material must not be empty")]
    EmptyMaterial,

    /// Quantity, rate, and total must not be negative.
    #[error("Amounts must not be negative")]
    NegativeAmount,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a purchase row.
#[derive(Debug, Clone)]
pub struct CreatePurchaseInput {
    /// Supplier the purchase is recorded against.
    pub supplier_id: Uuid,
    /// Site the material was delivered to.
    pub site_id: Uuid,
    /// Entry date.
    pub entry_date: NaiveDate,
    /// Material name.
    pub material: String,
    /// Quantity.
    pub qty: Decimal,
    /// Rate per unit.
    pub rate: Decimal,
    /// Stored total; preferred over qty x rate when present.
    pub total_amount: Option<Decimal>,
    /// Optional invoice number.
    pub invoice_no: Option<String>,
    /// Optional remarks.
    pub remarks: Option<String>,
}

/// Purchase rows together with the supplier names they reference.
#[derive(Debug, Clone)]
pub struct PurchaseSnapshot {
    /// Snapshot rows for the projector.
    pub rows: Vec<PurchaseRow>,
    /// Supplier id to name, resolved in one batch.
    pub supplier_names: HashMap<Uuid, String>,
}

/// Repository for suppliers and purchase rows.
#[derive(Debug, Clone)]
pub struct MaterialLedgerRepository {
    db: DatabaseConnection,
}

impl MaterialLedgerRepository {
    /// Creates a new material ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a supplier.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or the operation fails.
    pub async fn create_supplier(
        &self,
        name: String,
        contact: Option<String>,
        actor: &AuditActor,
    ) -> Result<material_suppliers::Model, MaterialLedgerError> {
        if name.trim().is_empty() {
            return Err(MaterialLedgerError::EmptyName);
        }

        let now = Utc::now().into();
        let txn = self.db.begin().await?;

        let supplier = material_suppliers::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            contact: Set(contact),
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
                entity: "material_supplier",
                entity_id: supplier.id,
                action: AuditAction::Create,
                old_value: None,
                new_value: Some(json!({ "name": supplier.name })),
            },
        )
        .await?;

        txn.commit().await?;
        Ok(supplier)
    }

    /// Lists all suppliers, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_suppliers(&self) -> Result<Vec<material_suppliers::Model>, MaterialLedgerError> {
        let suppliers = material_suppliers::Entity::find()
            .order_by_desc(material_suppliers::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(suppliers)
    }

    /// Updates a supplier's name and/or contact.
    ///
    /// # Errors
    ///
    /// Returns an error if the supplier is not found or the operation fails.
    pub async fn update_supplier(
        &self,
        id: Uuid,
        name: Option<String>,
        contact: Option<String>,
        actor: &AuditActor,
    ) -> Result<material_suppliers::Model, MaterialLedgerError> {
        if let Some(name) = &name {
            if name.trim().is_empty() {
                return Err(MaterialLedgerError::EmptyName);
            }
        }

        let supplier = material_suppliers::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(MaterialLedgerError::SupplierNotFound(id))?;
        let old = json!({ "name": supplier.name, "contact": supplier.contact });

        let txn = self.db.begin().await?;

        let mut active: material_suppliers::ActiveModel = supplier.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(contact) = contact {
            active.contact = Set(Some(contact));
        }
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        append_audit(
            &txn,
            actor,
            AuditEntry {
                entity: "material_supplier",
                entity_id: updated.id,
                action: AuditAction::Update,
                old_value: Some(old),
                new_value: Some(json!({ "name": updated.name, "contact": updated.contact })),
            },
        )
        .await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Creates a purchase row.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails, a referenced supplier or site is
    /// missing, or the database operation fails.
    pub async fn create_purchase(
        &self,
        input: CreatePurchaseInput,
        actor: &AuditActor,
    ) -> Result<material_purchases::Model, MaterialLedgerError> {
        if input.material.trim().is_empty() {
            return Err(MaterialLedgerError::EmptyMaterial);
        }
        if input.qty < Decimal::ZERO
            || input.rate < Decimal::ZERO
            || input.total_amount.is_some_and(|t| t < Decimal::ZERO)
        {
            return Err(MaterialLedgerError::NegativeAmount);
        }

        material_suppliers::Entity::find_by_id(input.supplier_id)
            .one(&self.db)
            .await?
            .ok_or(MaterialLedgerError::SupplierNotFound(input.supplier_id))?;
        sites::Entity::find_by_id(input.site_id)
            .one(&self.db)
            .await?
            .ok_or(MaterialLedgerError::SiteNotFound(input.site_id))?;

        let txn = self.db.begin().await?;

        let purchase = material_purchases::ActiveModel {
            id: Set(Uuid::new_v4()),
            supplier_id: Set(input.supplier_id),
            site_id: Set(input.site_id),
            entry_date: Set(input.entry_date),
            material: Set(input.material),
            qty: Set(input.qty),
            rate: Set(input.rate),
            total_amount: Set(input.total_amount),
            invoice_no: Set(input.invoice_no),
            remarks: Set(input.remarks),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await?;

        append_audit(
            &txn,
            actor,
            AuditEntry {
                entity: "material_purchase",
                entity_id: purchase.id,
                action: AuditAction::Create,
                old_value: None,
                new_value: Some(json!({
                    "site_id": purchase.site_id,
                    "material": purchase.material,
                    "qty": purchase.qty,
                    "rate": purchase.rate,
                    "total_amount": purchase.total_amount,
                })),
            },
        )
        .await?;

        txn.commit().await?;
        Ok(purchase)
    }

    /// Lists purchase rows, optionally filtered by site, newest entry first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_purchases(
        &self,
        site_id: Option<Uuid>,
    ) -> Result<Vec<material_purchases::Model>, MaterialLedgerError> {
        let mut query = material_purchases::Entity::find();
        if let Some(site_id) = site_id {
            query = query.filter(material_purchases::Column::SiteId.eq(site_id));
        }
        let purchases = query
            .order_by_desc(material_purchases::Column::EntryDate)
            .order_by_desc(material_purchases::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(purchases)
    }

    /// Hard-deletes a purchase row. Purchases have no soft-delete path.
    ///
    /// # Errors
    ///
    /// Returns an error if the row is not found or the operation fails.
    pub async fn delete_purchase(
        &self,
        id: Uuid,
        actor: &AuditActor,
    ) -> Result<(), MaterialLedgerError> {
        let purchase = material_purchases::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(MaterialLedgerError::PurchaseNotFound(id))?;

        let txn = self.db.begin().await?;

        material_purchases::Entity::delete_by_id(id).exec(&txn).await?;

        append_audit(
            &txn,
            actor,
            AuditEntry {
                entity: "material_purchase",
                entity_id: id,
                action: AuditAction::HardDelete,
                old_value: Some(json!({
                    "site_id": purchase.site_id,
                    "material": purchase.material,
                    "entry_date": purchase.entry_date,
                })),
                new_value: None,
            },
        )
        .await?;

        txn.commit().await?;
        Ok(())
    }

    /// Fetches the purchase snapshot for the projector, optionally filtered by
    /// site, with supplier names resolved in one batch query.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn purchase_snapshot(
        &self,
        site_id: Option<Uuid>,
    ) -> Result<PurchaseSnapshot, MaterialLedgerError> {
        let purchases = self.list_purchases(site_id).await?;

        let mut supplier_ids: Vec<Uuid> = purchases.iter().map(|p| p.supplier_id).collect();
        supplier_ids.sort_unstable();
        supplier_ids.dedup();

        let supplier_names: HashMap<Uuid, String> = if supplier_ids.is_empty() {
            HashMap::new()
        } else {
            material_suppliers::Entity::find()
                .filter(material_suppliers::Column::Id.is_in(supplier_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|s| (s.id, s.name))
                .collect()
        };

        let rows = purchases
            .into_iter()
            .map(|p| PurchaseRow {
                site_id: p.site_id,
                supplier_id: p.supplier_id,
                entry_date: p.entry_date,
                material: p.material,
                qty: p.qty,
                rate: p.rate,
                total_amount: p.total_amount,
            })
            .collect();

        Ok(PurchaseSnapshot {
            rows,
            supplier_names,
        })
    }
}
