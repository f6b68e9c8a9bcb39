//! `SeaORM` entity definitions.

pub mod audit_logs;
pub mod material_purchases;
pub mod material_suppliers;
pub mod sea_orm_active_enums;
pub mod site_expenses;
pub mod site_transactions;
pub mod sites;
