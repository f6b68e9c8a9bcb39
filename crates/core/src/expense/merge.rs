//! Merged view over manual and auto-aggregated expense rows.
//!
//! The two origins are modelled as a sum type rather than a loosely tagged
//! map; the shared accessors drive one sort for the whole view.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::aggregate::AutoExpense;

/// Source tag for manual expense rows.
pub const SOURCE_MANUAL: &str = "MANUAL";
/// Source tag for auto-aggregated expense rows.
pub const SOURCE_MATERIAL_LEDGER: &str = "MATERIAL_LEDGER";

/// A manually entered site expense, as loaded from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManualExpense {
    /// Persisted row id.
    pub id: Uuid,
    /// Site the expense belongs to.
    pub site_id: Uuid,
    /// Expense date.
    pub expense_date: NaiveDate,
    /// Expense title.
    pub title: String,
    /// Optional free-text summary.
    pub summary: Option<String>,
    /// Optional payment details.
    pub payment_details: Option<String>,
    /// Expense amount.
    pub amount: Decimal,
}

/// One row of the merged expense view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ExpenseRow {
    /// A persisted, user-entered expense.
    Manual(ManualExpense),
    /// A synthetic row derived from material purchases. Read-only.
    Auto(AutoExpense),
}

impl ExpenseRow {
    /// Row id as a string; uuid for manual rows, `AUTO_MSL_…` for auto rows.
    #[must_use]
    pub fn id(&self) -> String {
        match self {
            Self::Manual(m) => m.id.to_string(),
            Self::Auto(a) => a.id.clone(),
        }
    }

    /// Site the row belongs to.
    #[must_use]
    pub const fn site_id(&self) -> Uuid {
        match self {
            Self::Manual(m) => m.site_id,
            Self::Auto(a) => a.site_id,
        }
    }

    /// Date used for ordering the merged view.
    #[must_use]
    pub const fn expense_date(&self) -> NaiveDate {
        match self {
            Self::Manual(m) => m.expense_date,
            Self::Auto(a) => a.expense_date,
        }
    }

    /// Row amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        match self {
            Self::Manual(m) => m.amount,
            Self::Auto(a) => a.amount,
        }
    }

    /// Row title.
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Manual(m) => &m.title,
            Self::Auto(a) => &a.title,
        }
    }

    /// Whether the row is synthetic (not editable through the API).
    #[must_use]
    pub const fn is_auto(&self) -> bool {
        matches!(self, Self::Auto(_))
    }

    /// Origin tag exposed to clients.
    #[must_use]
    pub const fn source(&self) -> &'static str {
        match self {
            Self::Manual(_) => SOURCE_MANUAL,
            Self::Auto(_) => SOURCE_MATERIAL_LEDGER,
        }
    }
}

/// Merges manual and auto rows into one view.
///
/// Ordering is expense date descending; rows on the same date are ordered by
/// id ascending so the result is stable regardless of input order.
#[must_use]
pub fn merge_expense_rows(manual: Vec<ManualExpense>, auto: Vec<AutoExpense>) -> Vec<ExpenseRow> {
    let mut rows: Vec<ExpenseRow> = manual
        .into_iter()
        .map(ExpenseRow::Manual)
        .chain(auto.into_iter().map(ExpenseRow::Auto))
        .collect();

    rows.sort_by(|a, b| {
        b.expense_date()
            .cmp(&a.expense_date())
            .then_with(|| a.id().cmp(&b.id()))
    });

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expense::aggregate::AUTO_SUMMARY;
    use rust_decimal_macros::dec;

    fn site() -> Uuid {
        Uuid::from_u128(1)
    }

    fn manual(id: u128, date: &str, amount: Decimal) -> ManualExpense {
        ManualExpense {
            id: Uuid::from_u128(id),
            site_id: site(),
            expense_date: date.parse().unwrap(),
            title: "Diesel".to_string(),
            summary: None,
            payment_details: None,
            amount,
        }
    }

    fn auto(date: &str, amount: Decimal) -> AutoExpense {
        AutoExpense {
            id: format!("AUTO_MSL_{}_sand", site()),
            site_id: site(),
            expense_date: date.parse().unwrap(),
            title: "Sand".to_string(),
            summary: AUTO_SUMMARY.to_string(),
            payment_details: "A".to_string(),
            amount,
        }
    }

    #[test]
    fn test_newer_auto_row_sorts_before_older_manual_row() {
        let merged = merge_expense_rows(
            vec![manual(10, "2024-01-10", dec!(500))],
            vec![auto("2024-01-15", dec!(120))],
        );

        assert_eq!(merged.len(), 2);
        assert!(merged[0].is_auto());
        assert_eq!(merged[0].source(), SOURCE_MATERIAL_LEDGER);
        assert!(!merged[1].is_auto());
        assert_eq!(merged[1].source(), SOURCE_MANUAL);
    }

    #[test]
    fn test_equal_dates_tie_break_on_id() {
        let merged = merge_expense_rows(
            vec![
                manual(2, "2024-01-10", dec!(1)),
                manual(1, "2024-01-10", dec!(2)),
            ],
            vec![],
        );

        assert_eq!(merged[0].amount(), dec!(2));
        assert_eq!(merged[1].amount(), dec!(1));
    }

    #[test]
    fn test_merge_is_stable_across_input_order() {
        let a = merge_expense_rows(
            vec![manual(1, "2024-01-10", dec!(1)), manual(2, "2024-01-12", dec!(2))],
            vec![auto("2024-01-12", dec!(3))],
        );
        let b = merge_expense_rows(
            vec![manual(2, "2024-01-12", dec!(2)), manual(1, "2024-01-10", dec!(1))],
            vec![auto("2024-01-12", dec!(3))],
        );

        assert_eq!(a, b);
    }

    #[test]
    fn test_accessors_cover_both_variants() {
        let m = ExpenseRow::Manual(manual(7, "2024-02-01", dec!(42)));
        let a = ExpenseRow::Auto(auto("2024-02-02", dec!(9)));

        assert_eq!(m.title(), "Diesel");
        assert_eq!(a.title(), "Sand");
        assert_eq!(m.site_id(), site());
        assert_eq!(a.expense_date(), "2024-02-02".parse().unwrap());
        assert!(a.id().starts_with("AUTO_MSL_"));
    }

    #[test]
    fn test_empty_inputs() {
        assert!(merge_expense_rows(vec![], vec![]).is_empty());
    }
}
