//! Material supplier ledger routes: suppliers and purchase rows.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use sitebook_db::repositories::{CreatePurchaseInput, MaterialLedgerError, MaterialLedgerRepository};
use sitebook_shared::AppError;

use crate::extractors::RequestContext;
use crate::routes::{created, fail, ok, ok_list};
use crate::AppState;

/// Creates the material ledger routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/material-supplier-ledger/suppliers", get(list_suppliers))
        .route("/material-supplier-ledger/suppliers", post(create_supplier))
        .route(
            "/material-supplier-ledger/suppliers/{id}",
            put(update_supplier),
        )
        .route("/material-supplier-ledger/purchases", get(list_purchases))
        .route("/material-supplier-ledger/purchases", post(create_purchase))
        .route(
            "/material-supplier-ledger/purchases/{id}",
            delete(delete_purchase),
        )
}

/// Request body for creating a supplier.
#[derive(Debug, Deserialize)]
pub struct CreateSupplierRequest {
    /// Supplier name.
    pub name: String,
    /// Optional contact details.
    pub contact: Option<String>,
}

/// Request body for updating a supplier.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSupplierRequest {
    /// New name.
    pub name: Option<String>,
    /// New contact details.
    pub contact: Option<String>,
}

/// Request body for creating a purchase row.
#[derive(Debug, Deserialize)]
pub struct CreatePurchaseRequest {
    /// Supplier the purchase is recorded against.
    pub supplier_id: Uuid,
    /// Site the material was delivered to.
    pub site_id: Uuid,
    /// Entry date in `YYYY-MM-DD`.
    pub entry_date: String,
    /// Material name.
    pub material: String,
    /// Quantity as a decimal string.
    pub qty: String,
    /// Rate per unit as a decimal string.
    pub rate: String,
    /// Stored total as a decimal string; preferred over qty x rate.
    pub total_amount: Option<String>,
    /// Optional invoice number.
    pub invoice_no: Option<String>,
    /// Optional remarks.
    pub remarks: Option<String>,
}

/// Query parameters for listing purchases.
#[derive(Debug, Default, Deserialize)]
pub struct ListPurchasesQuery {
    /// Restrict to one site.
    pub site_id: Option<Uuid>,
}

fn parse_amount(raw: &str, field: &str) -> Result<Decimal, Response> {
    raw.parse()
        .map_err(|_| fail(&AppError::Validation(format!("Invalid {field}"))))
}

fn map_error(e: &MaterialLedgerError) -> Response {
    let err = match e {
        MaterialLedgerError::SupplierNotFound(_) => AppError::NotFound("Supplier not found".into()),
        MaterialLedgerError::PurchaseNotFound(_) => AppError::NotFound("Purchase not found".into()),
        MaterialLedgerError::SiteNotFound(_) => AppError::Validation("Site not found".into()),
        MaterialLedgerError::EmptyName => {
            AppError::Validation("Supplier name must not be empty".into())
        }
        MaterialLedgerError::EmptyMaterial => {
            AppError::Validation("Material must not be empty".into())
        }
        MaterialLedgerError::NegativeAmount => {
            AppError::Validation("Amounts must not be negative".into())
        }
        MaterialLedgerError::Database(_) => AppError::Internal("An error occurred".into()),
    };
    fail(&err)
}

/// GET `/material-supplier-ledger/suppliers` - List suppliers.
async fn list_suppliers(State(state): State<AppState>) -> impl IntoResponse {
    let repo = MaterialLedgerRepository::new((*state.db).clone());
    match repo.list_suppliers().await {
        Ok(suppliers) => ok_list(&suppliers),
        Err(e) => {
            error!(error = %e, "Failed to list suppliers");
            map_error(&e)
        }
    }
}

/// POST `/material-supplier-ledger/suppliers` - Create a supplier.
async fn create_supplier(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<CreateSupplierRequest>,
) -> impl IntoResponse {
    let repo = MaterialLedgerRepository::new((*state.db).clone());
    match repo
        .create_supplier(payload.name, payload.contact, &ctx.audit_actor())
        .await
    {
        Ok(supplier) => {
            info!(supplier_id = %supplier.id, "Supplier created");
            created(&supplier)
        }
        Err(e) => {
            error!(error = %e, "Failed to create supplier");
            map_error(&e)
        }
    }
}

/// PUT `/material-supplier-ledger/suppliers/{id}` - Update a supplier.
async fn update_supplier(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSupplierRequest>,
) -> impl IntoResponse {
    let repo = MaterialLedgerRepository::new((*state.db).clone());
    match repo
        .update_supplier(id, payload.name, payload.contact, &ctx.audit_actor())
        .await
    {
        Ok(supplier) => {
            info!(supplier_id = %supplier.id, "Supplier updated");
            ok(&supplier)
        }
        Err(e) => {
            error!(error = %e, supplier_id = %id, "Failed to update supplier");
            map_error(&e)
        }
    }
}

/// GET `/material-supplier-ledger/purchases` - List purchase rows.
async fn list_purchases(
    State(state): State<AppState>,
    Query(query): Query<ListPurchasesQuery>,
) -> impl IntoResponse {
    let repo = MaterialLedgerRepository::new((*state.db).clone());
    match repo.list_purchases(query.site_id).await {
        Ok(purchases) => ok_list(&purchases),
        Err(e) => {
            error!(error = %e, "Failed to list purchases");
            map_error(&e)
        }
    }
}

/// POST `/material-supplier-ledger/purchases` - Create a purchase row.
async fn create_purchase(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<CreatePurchaseRequest>,
) -> impl IntoResponse {
    let entry_date = match payload.entry_date.parse() {
        Ok(d) => d,
        Err(_) => {
            return fail(&AppError::Validation(
                "Invalid date format, expected YYYY-MM-DD".into(),
            ));
        }
    };
    let qty = match parse_amount(&payload.qty, "qty") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let rate = match parse_amount(&payload.rate, "rate") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let total_amount = match payload
        .total_amount
        .as_deref()
        .map(|raw| parse_amount(raw, "total_amount"))
        .transpose()
    {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let repo = MaterialLedgerRepository::new((*state.db).clone());
    let input = CreatePurchaseInput {
        supplier_id: payload.supplier_id,
        site_id: payload.site_id,
        entry_date,
        material: payload.material,
        qty,
        rate,
        total_amount,
        invoice_no: payload.invoice_no,
        remarks: payload.remarks,
    };

    match repo.create_purchase(input, &ctx.audit_actor()).await {
        Ok(purchase) => {
            info!(purchase_id = %purchase.id, site_id = %purchase.site_id, "Purchase created");
            created(&purchase)
        }
        Err(e) => {
            error!(error = %e, "Failed to create purchase");
            map_error(&e)
        }
    }
}

/// DELETE `/material-supplier-ledger/purchases/{id}` - Delete a purchase row.
async fn delete_purchase(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = MaterialLedgerRepository::new((*state.db).clone());
    match repo.delete_purchase(id, &ctx.audit_actor()).await {
        Ok(()) => {
            info!(purchase_id = %id, "Purchase deleted");
            ok(&serde_json::json!({ "deleted": true }))
        }
        Err(e) => {
            error!(error = %e, purchase_id = %id, "Failed to delete purchase");
            map_error(&e)
        }
    }
}
