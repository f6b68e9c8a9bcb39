//! Core business logic for Sitebook.
//!
//! Pure computations over snapshots of persisted data:
//! - Auto-aggregation of material purchases into synthetic expense rows
//! - Merging manual and auto expense rows into one ordered view
//! - Site profit arithmetic
//!
//! No web or database dependencies live here.

pub mod expense;
pub mod profit;

pub use expense::aggregate::{AutoExpense, PurchaseRow, aggregate_material_expenses};
pub use expense::merge::{ExpenseRow, ManualExpense, merge_expense_rows};
pub use profit::SiteProfit;
