//! Direct site transaction routes over the unified ledger.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};
use uuid::Uuid;

use sitebook_db::entities::sea_orm_active_enums::{TxnNature, TxnSource};
use sitebook_db::repositories::{
    CreateSiteTransactionInput, SiteTransactionError, SiteTransactionFilter,
    SiteTransactionRepository, UpdateSiteTransactionInput,
};
use sitebook_shared::AppError;

use crate::extractors::RequestContext;
use crate::routes::{created, fail, ok, ok_list};
use crate::AppState;

/// Creates the site transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/site-transactions", get(list_transactions))
        .route("/site-transactions", post(create_transaction))
        .route("/site-transactions/{id}", get(get_transaction))
        .route("/site-transactions/{id}", put(update_transaction))
        .route("/site-transactions/{id}", delete(soft_delete_transaction))
        .route("/site-transactions/{id}/restore", post(restore_transaction))
        .route("/site-transactions/{id}/hard", delete(hard_delete_transaction))
}

/// Request body for creating a direct transaction.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// Site the transaction belongs to.
    pub site_id: Uuid,
    /// Transaction date in `YYYY-MM-DD`.
    pub txn_date: String,
    /// `debit` or `credit`.
    pub nature: String,
    /// Amount as a decimal string.
    pub amount: String,
    /// Title.
    pub title: String,
    /// Optional remarks.
    pub remarks: Option<String>,
    /// Optional structured metadata.
    pub meta: Option<Value>,
}

/// Request body for updating a direct transaction.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTransactionRequest {
    /// New transaction date in `YYYY-MM-DD`.
    pub txn_date: Option<String>,
    /// New nature, `debit` or `credit`.
    pub nature: Option<String>,
    /// New amount as a decimal string.
    pub amount: Option<String>,
    /// New title.
    pub title: Option<String>,
    /// New remarks.
    pub remarks: Option<String>,
}

/// Query parameters for listing transactions.
#[derive(Debug, Default, Deserialize)]
pub struct ListTransactionsQuery {
    /// Restrict to one site.
    pub site_id: Option<Uuid>,
    /// Date range start in `YYYY-MM-DD`.
    pub from: Option<String>,
    /// Date range end in `YYYY-MM-DD`.
    pub to: Option<String>,
    /// Origin filter, `site_expense` or `manual`.
    pub source: Option<String>,
    /// Nature filter, `debit` or `credit`.
    pub nature: Option<String>,
    /// Include soft-deleted rows.
    #[serde(default)]
    pub include_deleted: bool,
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

fn string_to_nature(raw: &str) -> Result<TxnNature, Response> {
    match raw {
        "debit" => Ok(TxnNature::Debit),
        "credit" => Ok(TxnNature::Credit),
        _ => Err(fail(&AppError::Validation(
            "Invalid nature, expected debit or credit".into(),
        ))),
    }
}

fn string_to_source(raw: &str) -> Result<TxnSource, Response> {
    match raw {
        "site_expense" => Ok(TxnSource::SiteExpense),
        "manual" => Ok(TxnSource::Manual),
        _ => Err(fail(&AppError::Validation(
            "Invalid source, expected site_expense or manual".into(),
        ))),
    }
}

fn map_error(e: &SiteTransactionError) -> Response {
    let err = match e {
        SiteTransactionError::NotFound(_) => {
            AppError::NotFound("Site transaction not found".into())
        }
        SiteTransactionError::SiteNotFound(_) => AppError::Validation("Site not found".into()),
        SiteTransactionError::MirrorReadOnly(_) => AppError::Validation(
            "Mirrored transactions can only be changed through their source record".into(),
        ),
        SiteTransactionError::NonPositiveAmount => {
            AppError::Validation("Amount must be positive".into())
        }
        SiteTransactionError::Database(_) => AppError::Internal("An error occurred".into()),
    };
    fail(&err)
}

/// GET `/site-transactions` - List transactions with optional filters.
async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<ListTransactionsQuery>,
) -> impl IntoResponse {
    let from = match query.from.as_deref().map(parse_date).transpose() {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let to = match query.to.as_deref().map(parse_date).transpose() {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let source = match query.source.as_deref().map(string_to_source).transpose() {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let nature = match query.nature.as_deref().map(string_to_nature).transpose() {
        Ok(n) => n,
        Err(resp) => return resp,
    };

    let repo = SiteTransactionRepository::new((*state.db).clone());
    let filter = SiteTransactionFilter {
        site_id: query.site_id,
        from,
        to,
        source,
        nature,
        include_deleted: query.include_deleted,
    };

    match repo.list(filter).await {
        Ok(rows) => ok_list(&rows),
        Err(e) => {
            error!(error = %e, "Failed to list site transactions");
            map_error(&e)
        }
    }
}

/// POST `/site-transactions` - Create a direct transaction.
async fn create_transaction(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<CreateTransactionRequest>,
) -> impl IntoResponse {
    let txn_date = match parse_date(&payload.txn_date) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let nature = match string_to_nature(&payload.nature) {
        Ok(n) => n,
        Err(resp) => return resp,
    };
    let amount = match parse_amount(&payload.amount) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    let repo = SiteTransactionRepository::new((*state.db).clone());
    let input = CreateSiteTransactionInput {
        site_id: payload.site_id,
        txn_date,
        nature,
        amount,
        title: payload.title,
        remarks: payload.remarks,
        meta: payload.meta,
    };

    match repo.create(input, &ctx.audit_actor()).await {
        Ok(row) => {
            info!(txn_id = %row.id, site_id = %row.site_id, "Site transaction created");
            created(&row)
        }
        Err(e) => {
            error!(error = %e, "Failed to create site transaction");
            map_error(&e)
        }
    }
}

/// GET `/site-transactions/{id}` - Get one transaction.
async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = SiteTransactionRepository::new((*state.db).clone());
    match repo.get(id).await {
        Ok(row) => ok(&row),
        Err(e) => {
            error!(error = %e, txn_id = %id, "Failed to get site transaction");
            map_error(&e)
        }
    }
}

/// PUT `/site-transactions/{id}` - Update a direct transaction.
async fn update_transaction(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTransactionRequest>,
) -> impl IntoResponse {
    let txn_date = match payload.txn_date.as_deref().map(parse_date).transpose() {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let nature = match payload.nature.as_deref().map(string_to_nature).transpose() {
        Ok(n) => n,
        Err(resp) => return resp,
    };
    let amount = match payload.amount.as_deref().map(parse_amount).transpose() {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    let repo = SiteTransactionRepository::new((*state.db).clone());
    let input = UpdateSiteTransactionInput {
        txn_date,
        nature,
        amount,
        title: payload.title,
        remarks: payload.remarks,
    };

    match repo.update(id, input, &ctx.audit_actor()).await {
        Ok(row) => {
            info!(txn_id = %row.id, "Site transaction updated");
            ok(&row)
        }
        Err(e) => {
            error!(error = %e, txn_id = %id, "Failed to update site transaction");
            map_error(&e)
        }
    }
}

/// DELETE `/site-transactions/{id}` - Soft-delete a direct transaction.
async fn soft_delete_transaction(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = SiteTransactionRepository::new((*state.db).clone());
    match repo.soft_delete(id, &ctx.audit_actor()).await {
        Ok(row) => {
            info!(txn_id = %row.id, "Site transaction soft-deleted");
            ok(&row)
        }
        Err(e) => {
            error!(error = %e, txn_id = %id, "Failed to soft-delete site transaction");
            map_error(&e)
        }
    }
}

/// POST `/site-transactions/{id}/restore` - Restore a soft-deleted transaction.
async fn restore_transaction(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = SiteTransactionRepository::new((*state.db).clone());
    match repo.restore(id, &ctx.audit_actor()).await {
        Ok(row) => {
            info!(txn_id = %row.id, "Site transaction restored");
            ok(&row)
        }
        Err(e) => {
            error!(error = %e, txn_id = %id, "Failed to restore site transaction");
            map_error(&e)
        }
    }
}

/// DELETE `/site-transactions/{id}/hard` - Permanently delete a transaction.
async fn hard_delete_transaction(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = SiteTransactionRepository::new((*state.db).clone());
    match repo.hard_delete(id, &ctx.audit_actor()).await {
        Ok(()) => {
            info!(txn_id = %id, "Site transaction hard-deleted");
            ok(&serde_json::json!({ "deleted": true }))
        }
        Err(e) => {
            error!(error = %e, txn_id = %id, "Failed to hard-delete site transaction");
            map_error(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_to_nature() {
        assert!(matches!(string_to_nature("debit"), Ok(TxnNature::Debit)));
        assert!(matches!(string_to_nature("credit"), Ok(TxnNature::Credit)));
        assert!(string_to_nature("DEBIT").is_err());
    }

    #[test]
    fn test_string_to_source() {
        assert!(matches!(
            string_to_source("site_expense"),
            Ok(TxnSource::SiteExpense)
        ));
        assert!(matches!(string_to_source("manual"), Ok(TxnSource::Manual)));
        assert!(string_to_source("auto").is_err());
    }
}
