//! `SeaORM` Entity for the material_purchases table.
//!
//! Purchase rows feed the auto-expense projector; they are hard-deleted only,
//! never soft-deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "material_purchases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub site_id: Uuid,
    pub entry_date: Date,
    pub material: String,
    pub qty: Decimal,
    pub rate: Decimal,
    pub total_amount: Option<Decimal>,
    pub invoice_no: Option<String>,
    pub remarks: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::material_suppliers::Entity",
        from = "Column::SupplierId",
        to = "super::material_suppliers::Column::Id"
    )]
    MaterialSuppliers,
    #[sea_orm(
        belongs_to = "super::sites::Entity",
        from = "Column::SiteId",
        to = "super::sites::Column::Id"
    )]
    Sites,
}

impl Related<super::material_suppliers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MaterialSuppliers.def()
    }
}

impl Related<super::sites::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sites.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
