//! Expense projections: auto-aggregation of material purchases and the
//! merged manual/auto read view.

pub mod aggregate;
pub mod merge;
