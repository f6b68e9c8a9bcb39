//! Reporting routes.

use axum::{
    Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::error;
use uuid::Uuid;

use sitebook_core::{SiteProfit, aggregate_material_expenses};
use sitebook_db::repositories::{
    MaterialLedgerRepository, SiteError, SiteExpenseRepository, SiteRepository,
    SiteTransactionRepository,
};
use sitebook_shared::AppError;

use crate::routes::{fail, ok};
use crate::AppState;

/// Creates the report routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/reports/site-profit/{site_id}", get(site_profit))
}

fn internal_error() -> Response {
    fail(&AppError::Internal("An error occurred".into()))
}

/// GET `/reports/site-profit/{site_id}` - Profit summary for one site.
///
/// received = active credit transactions; expenses = active manual expenses
/// plus the auto-aggregated material totals; profit = received - expenses.
async fn site_profit(
    State(state): State<AppState>,
    Path(site_id): Path<Uuid>,
) -> impl IntoResponse {
    let site_repo = SiteRepository::new((*state.db).clone());
    if let Err(e) = site_repo.get(site_id).await {
        return match e {
            SiteError::NotFound(_) => fail(&AppError::NotFound("Site not found".into())),
            _ => {
                error!(error = %e, site_id = %site_id, "Failed to load site");
                internal_error()
            }
        };
    }

    let txn_repo = SiteTransactionRepository::new((*state.db).clone());
    let received = match txn_repo.received_total_for_site(site_id).await {
        Ok(total) => total,
        Err(e) => {
            error!(error = %e, site_id = %site_id, "Failed to total receipts");
            return internal_error();
        }
    };

    let expense_repo = SiteExpenseRepository::new((*state.db).clone());
    let manual_expenses = match expense_repo.manual_total_for_site(site_id).await {
        Ok(total) => total,
        Err(e) => {
            error!(error = %e, site_id = %site_id, "Failed to total manual expenses");
            return internal_error();
        }
    };

    let ledger_repo = MaterialLedgerRepository::new((*state.db).clone());
    let snapshot = match ledger_repo.purchase_snapshot(Some(site_id)).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!(error = %e, site_id = %site_id, "Failed to load purchase snapshot");
            return internal_error();
        }
    };
    let auto_expenses = aggregate_material_expenses(&snapshot.rows, &snapshot.supplier_names)
        .iter()
        .map(|a| a.amount)
        .sum();

    ok(&SiteProfit::compute(
        site_id,
        received,
        manual_expenses,
        auto_expenses,
    ))
}
