//! Site expense routes: manual CRUD plus the merged manual + auto read view.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use sitebook_core::{ExpenseRow, ManualExpense, aggregate_material_expenses, merge_expense_rows};
use sitebook_db::entities::site_expenses;
use sitebook_db::repositories::{
    CreateSiteExpenseInput, MaterialLedgerError, MaterialLedgerRepository, SiteExpenseError,
    SiteExpenseRepository, UpdateSiteExpenseInput,
};
use sitebook_shared::AppError;

use crate::extractors::RequestContext;
use crate::routes::{created, fail, ok, ok_list};
use crate::AppState;

/// Creates the site expense routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/site-exp", get(list_expenses))
        .route("/site-exp", post(create_expense))
        .route("/site-exp/site/{site_id}", get(list_expenses_for_site))
        .route("/site-exp/{id}", put(update_expense))
        .route("/site-exp/{id}", delete(soft_delete_expense))
        .route("/site-exp/{id}/restore", post(restore_expense))
        .route("/site-exp/{id}/hard", delete(hard_delete_expense))
}

/// Request body for creating a manual expense.
#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    /// Site the expense belongs to.
    pub site_id: Uuid,
    /// Expense date in `YYYY-MM-DD`.
    pub expense_date: String,
    /// Optional title; defaults server-side.
    pub title: Option<String>,
    /// Optional summary.
    pub summary: Option<String>,
    /// Optional payment details.
    pub payment_details: Option<String>,
    /// Amount as a decimal string.
    pub amount: String,
}

/// Request body for updating a manual expense.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateExpenseRequest {
    /// New expense date in `YYYY-MM-DD`.
    pub expense_date: Option<String>,
    /// New title.
    pub title: Option<String>,
    /// New summary.
    pub summary: Option<String>,
    /// New payment details.
    pub payment_details: Option<String>,
    /// New amount as a decimal string.
    pub amount: Option<String>,
}

/// One row of the merged expense view as serialized to clients.
///
/// Manual and auto rows share this flat shape; `is_auto` and `source` tell
/// them apart.
#[derive(Debug, Serialize)]
pub struct ExpenseRowResponse {
    /// Uuid for manual rows, `AUTO_MSL_…` for auto rows.
    pub id: String,
    /// Site the row belongs to.
    pub site_id: Uuid,
    /// Expense date.
    pub expense_date: NaiveDate,
    /// Row title.
    pub title: String,
    /// Summary text, if any.
    pub summary: Option<String>,
    /// Payment details or contributing supplier names.
    pub payment_details: Option<String>,
    /// Row amount.
    pub amount: Decimal,
    /// Whether the row is synthetic and read-only.
    pub is_auto: bool,
    /// Origin tag.
    pub source: &'static str,
}

impl From<ExpenseRow> for ExpenseRowResponse {
    fn from(row: ExpenseRow) -> Self {
        let (id, source, is_auto) = (row.id(), row.source(), row.is_auto());
        match row {
            ExpenseRow::Manual(m) => Self {
                id,
                site_id: m.site_id,
                expense_date: m.expense_date,
                title: m.title,
                summary: m.summary,
                payment_details: m.payment_details,
                amount: m.amount,
                is_auto,
                source,
            },
            ExpenseRow::Auto(a) => Self {
                id,
                site_id: a.site_id,
                expense_date: a.expense_date,
                title: a.title,
                summary: Some(a.summary),
                payment_details: Some(a.payment_details),
                amount: a.amount,
                is_auto,
                source,
            },
        }
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, Response> {
    raw.parse().map_err(|_| {
        fail(&AppError::Validation(
            "Invalid date format, expected YYYY-MM-DD".into(),
        ))
    })
}

fn parse_amount(raw: &str) -> Result<Decimal, Response> {
    raw.parse()
        .map_err(|_| fail(&AppError::Validation("Invalid amount".into())))
}

fn manual_from_model(model: site_expenses::Model) -> ManualExpense {
    ManualExpense {
        id: model.id,
        site_id: model.site_id,
        expense_date: model.expense_date,
        title: model.title,
        summary: model.summary,
        payment_details: model.payment_details,
        amount: model.amount,
    }
}

fn map_expense_error(e: &SiteExpenseError) -> Response {
    let err = match e {
        SiteExpenseError::NotFound(_) => AppError::NotFound("Site expense not found".into()),
        SiteExpenseError::SiteNotFound(_) => AppError::Validation("Site not found".into()),
        SiteExpenseError::NonPositiveAmount => {
            AppError::Validation("Amount must be positive".into())
        }
        SiteExpenseError::MirrorMissing(_) | SiteExpenseError::Database(_) => {
            AppError::Internal("An error occurred".into())
        }
    };
    fail(&err)
}

fn map_ledger_error(e: &MaterialLedgerError) -> Response {
    let err = match e {
        MaterialLedgerError::Database(_) => AppError::Internal("An error occurred".into()),
        _ => AppError::Validation("Invalid material ledger request".into()),
    };
    fail(&err)
}

/// Loads manual rows and the auto projection, merged and sorted.
async fn merged_view(state: &AppState, site_id: Option<Uuid>) -> Result<Vec<ExpenseRowResponse>, Response> {
    let expense_repo = SiteExpenseRepository::new((*state.db).clone());
    let ledger_repo = MaterialLedgerRepository::new((*state.db).clone());

    let manual = expense_repo.list_active(site_id).await.map_err(|e| {
        error!(error = %e, "Failed to list manual expenses");
        map_expense_error(&e)
    })?;
    let snapshot = ledger_repo.purchase_snapshot(site_id).await.map_err(|e| {
        error!(error = %e, "Failed to load purchase snapshot");
        map_ledger_error(&e)
    })?;

    let auto = aggregate_material_expenses(&snapshot.rows, &snapshot.supplier_names);
    let manual = manual.into_iter().map(manual_from_model).collect();

    Ok(merge_expense_rows(manual, auto)
        .into_iter()
        .map(ExpenseRowResponse::from)
        .collect())
}

/// GET `/site-exp` - Merged manual + auto expense view across all sites.
async fn list_expenses(State(state): State<AppState>) -> impl IntoResponse {
    match merged_view(&state, None).await {
        Ok(rows) => ok_list(&rows),
        Err(resp) => resp,
    }
}

/// GET `/site-exp/site/{site_id}` - Merged view for one site.
async fn list_expenses_for_site(
    State(state): State<AppState>,
    Path(site_id): Path<Uuid>,
) -> impl IntoResponse {
    match merged_view(&state, Some(site_id)).await {
        Ok(rows) => ok_list(&rows),
        Err(resp) => resp,
    }
}

/// POST `/site-exp` - Create a manual expense (mirrors into the ledger).
async fn create_expense(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<CreateExpenseRequest>,
) -> impl IntoResponse {
    let expense_date = match parse_date(&payload.expense_date) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let amount = match parse_amount(&payload.amount) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    let repo = SiteExpenseRepository::new((*state.db).clone());
    let input = CreateSiteExpenseInput {
        site_id: payload.site_id,
        expense_date,
        title: payload.title,
        summary: payload.summary,
        payment_details: payload.payment_details,
        amount,
    };

    match repo.create(input, &ctx.audit_actor()).await {
        Ok(expense) => {
            info!(expense_id = %expense.id, site_id = %expense.site_id, "Site expense created");
            created(&expense)
        }
        Err(e) => {
            error!(error = %e, "Failed to create site expense");
            map_expense_error(&e)
        }
    }
}

/// PUT `/site-exp/{id}` - Update a manual expense (re-mirrors).
async fn update_expense(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateExpenseRequest>,
) -> impl IntoResponse {
    let expense_date = match payload.expense_date.as_deref().map(parse_date).transpose() {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let amount = match payload.amount.as_deref().map(parse_amount).transpose() {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    let repo = SiteExpenseRepository::new((*state.db).clone());
    let input = UpdateSiteExpenseInput {
        expense_date,
        title: payload.title,
        summary: payload.summary,
        payment_details: payload.payment_details,
        amount,
    };

    match repo.update(id, input, &ctx.audit_actor()).await {
        Ok(expense) => {
            info!(expense_id = %expense.id, "Site expense updated");
            ok(&expense)
        }
        Err(e) => {
            error!(error = %e, expense_id = %id, "Failed to update site expense");
            map_expense_error(&e)
        }
    }
}

/// DELETE `/site-exp/{id}` - Soft-delete an expense and its mirror.
async fn soft_delete_expense(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = SiteExpenseRepository::new((*state.db).clone());
    match repo.soft_delete(id, &ctx.audit_actor()).await {
        Ok(expense) => {
            info!(expense_id = %expense.id, "Site expense soft-deleted");
            ok(&expense)
        }
        Err(e) => {
            error!(error = %e, expense_id = %id, "Failed to soft-delete site expense");
            map_expense_error(&e)
        }
    }
}

/// POST `/site-exp/{id}/restore` - Restore a soft-deleted expense.
async fn restore_expense(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = SiteExpenseRepository::new((*state.db).clone());
    match repo.restore(id, &ctx.audit_actor()).await {
        Ok(expense) => {
            info!(expense_id = %expense.id, "Site expense restored");
            ok(&expense)
        }
        Err(e) => {
            error!(error = %e, expense_id = %id, "Failed to restore site expense");
            map_expense_error(&e)
        }
    }
}

/// DELETE `/site-exp/{id}/hard` - Permanently delete an expense.
async fn hard_delete_expense(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = SiteExpenseRepository::new((*state.db).clone());
    match repo.hard_delete(id, &ctx.audit_actor()).await {
        Ok(()) => {
            info!(expense_id = %id, "Site expense hard-deleted");
            ok(&serde_json::json!({ "deleted": true }))
        }
        Err(e) => {
            error!(error = %e, expense_id = %id, "Failed to hard-delete site expense");
            map_expense_error(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sitebook_core::AutoExpense;

    #[test]
    fn test_auto_row_response_shape() {
        let site = Uuid::from_u128(3);
        let row = ExpenseRow::Auto(AutoExpense {
            id: format!("AUTO_MSL_{site}_cement"),
            site_id: site,
            expense_date: "2024-03-01".parse().unwrap(),
            title: "Cement".to_string(),
            summary: "Material Purchase (Auto)".to_string(),
            payment_details: "Shree Traders".to_string(),
            amount: dec!(1500),
        });

        let resp = ExpenseRowResponse::from(row);
        assert!(resp.is_auto);
        assert_eq!(resp.source, "MATERIAL_LEDGER");
        assert_eq!(resp.summary.as_deref(), Some("Material Purchase (Auto)"));
        assert!(resp.id.starts_with("AUTO_MSL_"));
    }

    #[test]
    fn test_manual_row_response_shape() {
        let row = ExpenseRow::Manual(ManualExpense {
            id: Uuid::from_u128(9),
            site_id: Uuid::from_u128(3),
            expense_date: "2024-03-02".parse().unwrap(),
            title: "Diesel".to_string(),
            summary: None,
            payment_details: Some("cash".to_string()),
            amount: dec!(700),
        });

        let resp = ExpenseRowResponse::from(row);
        assert!(!resp.is_auto);
        assert_eq!(resp.source, "MANUAL");
        assert_eq!(resp.id, Uuid::from_u128(9).to_string());
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert!(parse_amount("12.50").is_ok());
        assert!(parse_amount("twelve").is_err());
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date("2024-03-01").is_ok());
        assert!(parse_date("03/01/2024").is_err());
    }
}
