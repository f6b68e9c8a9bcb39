//! API route definitions and the JSON response envelope.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde::Serialize;
use serde_json::json;

use sitebook_shared::AppError;

use crate::AppState;

pub mod health;
pub mod material_ledger;
pub mod reports;
pub mod site_expenses;
pub mod site_transactions;
pub mod sites;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(sites::routes())
        .merge(material_ledger::routes())
        .merge(site_expenses::routes())
        .merge(site_transactions::routes())
        .merge(reports::routes())
}

/// `200 OK` envelope around `data`.
pub(crate) fn ok<T: Serialize>(data: &T) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "data": data })),
    )
        .into_response()
}

/// `200 OK` envelope around a list, with its count.
pub(crate) fn ok_list<T: Serialize>(data: &[T]) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "data": data, "count": data.len() })),
    )
        .into_response()
}

/// `201 Created` envelope around `data`.
pub(crate) fn created<T: Serialize>(data: &T) -> Response {
    (
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": data })),
    )
        .into_response()
}

/// Error envelope derived from an [`AppError`].
pub(crate) fn fail(err: &AppError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "success": false,
            "code": err.error_code(),
            "message": err.to_string(),
        })),
    )
        .into_response()
}
