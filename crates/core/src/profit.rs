//! Site profit arithmetic.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Profit summary for one site: received minus expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteProfit {
    /// Site the summary is for.
    pub site_id: Uuid,
    /// Total credit transactions (receipts) recorded against the site.
    pub received: Decimal,
    /// Manually entered expense total.
    pub manual_expenses: Decimal,
    /// Auto-aggregated material expense total.
    pub auto_expenses: Decimal,
    /// received - (manual + auto).
    pub profit: Decimal,
}

impl SiteProfit {
    /// Computes the profit summary from pre-aggregated totals.
    #[must_use]
    pub fn compute(
        site_id: Uuid,
        received: Decimal,
        manual_expenses: Decimal,
        auto_expenses: Decimal,
    ) -> Self {
        Self {
            site_id,
            received,
            manual_expenses,
            auto_expenses,
            profit: received - manual_expenses - auto_expenses,
        }
    }

    /// Combined expense total across both origins.
    #[must_use]
    pub fn total_expenses(&self) -> Decimal {
        self.manual_expenses + self.auto_expenses
    }
}
