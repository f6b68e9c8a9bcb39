//! Database enum mappings.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Origin of a site transaction row.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "txn_source")]
pub enum TxnSource {
    /// Mirrored from a site expense row.
    #[sea_orm(string_value = "site_expense")]
    SiteExpense,
    /// Entered directly through the transaction endpoints.
    #[sea_orm(string_value = "manual")]
    Manual,
}

/// Debit/credit nature of a site transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "txn_nature")]
pub enum TxnNature {
    /// Money out of the site.
    #[sea_orm(string_value = "debit")]
    Debit,
    /// Money into the site.
    #[sea_orm(string_value = "credit")]
    Credit,
}

/// Audited mutation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "audit_action")]
pub enum AuditAction {
    /// Row created.
    #[sea_orm(string_value = "create")]
    Create,
    /// Row updated.
    #[sea_orm(string_value = "update")]
    Update,
    /// Row flagged deleted.
    #[sea_orm(string_value = "soft_delete")]
    SoftDelete,
    /// Soft-deleted row restored.
    #[sea_orm(string_value = "restore")]
    Restore,
    /// Row removed permanently.
    #[sea_orm(string_value = "hard_delete")]
    HardDelete,
}
