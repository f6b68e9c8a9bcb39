//! `SeaORM` Entity for the sites table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "sites")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub location: Option<String>,
    pub client_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::site_expenses::Entity")]
    SiteExpenses,
    #[sea_orm(has_many = "super::site_transactions::Entity")]
    SiteTransactions,
    #[sea_orm(has_many = "super::material_purchases::Entity")]
    MaterialPurchases,
}

impl Related<super::site_expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SiteExpenses.def()
    }
}

impl Related<super::site_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SiteTransactions.def()
    }
}

impl Related<super::material_purchases::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MaterialPurchases.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
