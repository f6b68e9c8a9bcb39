//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod audit;
pub mod material_ledger;
pub mod site;
pub mod site_expense;
pub mod site_transaction;

pub use audit::{AuditActor, AuditEntry, AuditLogRepository, append_audit};
pub use material_ledger::{
    CreatePurchaseInput, MaterialLedgerError, MaterialLedgerRepository, PurchaseSnapshot,
};
pub use site::{CreateSiteInput, SiteError, SiteRepository, UpdateSiteInput};
pub use site_expense::{
    CreateSiteExpenseInput, SiteExpenseError, SiteExpenseRepository, UpdateSiteExpenseInput,
};
pub use site_transaction::{
    CreateSiteTransactionInput, SiteTransactionError, SiteTransactionFilter,
    SiteTransactionRepository, UpdateSiteTransactionInput,
};
