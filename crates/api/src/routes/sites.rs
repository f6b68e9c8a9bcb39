//! Site management routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use sitebook_db::repositories::{CreateSiteInput, SiteError, SiteRepository, UpdateSiteInput};
use sitebook_shared::AppError;

use crate::extractors::RequestContext;
use crate::routes::{created, fail, ok, ok_list};
use crate::AppState;

/// Creates the site routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sites", get(list_sites))
        .route("/sites", post(create_site))
        .route("/sites/{site_id}", get(get_site))
        .route("/sites/{site_id}", put(update_site))
        .route("/sites/{site_id}", delete(deactivate_site))
}

/// Request body for creating a site.
#[derive(Debug, Deserialize)]
pub struct CreateSiteRequest {
    /// Site name.
    pub name: String,
    /// Optional location.
    pub location: Option<String>,
    /// Optional client name.
    pub client_name: Option<String>,
}

/// Request body for updating a site.
#[derive(Debug, Deserialize)]
pub struct UpdateSiteRequest {
    /// New name.
    pub name: Option<String>,
    /// New location.
    pub location: Option<String>,
    /// New client name.
    pub client_name: Option<String>,
}

fn map_error(e: &SiteError) -> Response {
    let err = match e {
        SiteError::NotFound(_) => AppError::NotFound("Site not found".into()),
        SiteError::EmptyName => AppError::Validation("Site name must not be empty".into()),
        SiteError::Database(_) => AppError::Internal("An error occurred".into()),
    };
    fail(&err)
}

/// GET `/sites` - List all sites.
async fn list_sites(State(state): State<AppState>) -> impl IntoResponse {
    let repo = SiteRepository::new((*state.db).clone());
    match repo.list().await {
        Ok(sites) => ok_list(&sites),
        Err(e) => {
            error!(error = %e, "Failed to list sites");
            map_error(&e)
        }
    }
}

/// POST `/sites` - Create a site.
async fn create_site(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<CreateSiteRequest>,
) -> impl IntoResponse {
    let repo = SiteRepository::new((*state.db).clone());
    let input = CreateSiteInput {
        name: payload.name,
        location: payload.location,
        client_name: payload.client_name,
    };

    match repo.create(input, &ctx.audit_actor()).await {
        Ok(site) => {
            info!(site_id = %site.id, "Site created");
            created(&site)
        }
        Err(e) => {
            error!(error = %e, "Failed to create site");
            map_error(&e)
        }
    }
}

/// GET `/sites/{site_id}` - Get one site.
async fn get_site(State(state): State<AppState>, Path(site_id): Path<Uuid>) -> impl IntoResponse {
    let repo = SiteRepository::new((*state.db).clone());
    match repo.get(site_id).await {
        Ok(site) => ok(&site),
        Err(e) => {
            error!(error = %e, site_id = %site_id, "Failed to get site");
            map_error(&e)
        }
    }
}

/// PUT `/sites/{site_id}` - Update a site.
async fn update_site(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(site_id): Path<Uuid>,
    Json(payload): Json<UpdateSiteRequest>,
) -> impl IntoResponse {
    let repo = SiteRepository::new((*state.db).clone());
    let input = UpdateSiteInput {
        name: payload.name,
        location: payload.location,
        client_name: payload.client_name,
    };

    match repo.update(site_id, input, &ctx.audit_actor()).await {
        Ok(site) => {
            info!(site_id = %site.id, "Site updated");
            ok(&site)
        }
        Err(e) => {
            error!(error = %e, site_id = %site_id, "Failed to update site");
            map_error(&e)
        }
    }
}

/// DELETE `/sites/{site_id}` - Deactivate a site.
async fn deactivate_site(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(site_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = SiteRepository::new((*state.db).clone());
    match repo.deactivate(site_id, &ctx.audit_actor()).await {
        Ok(site) => {
            info!(site_id = %site.id, "Site deactivated");
            ok(&site)
        }
        Err(e) => {
            error!(error = %e, site_id = %site_id, "Failed to deactivate site");
            map_error(&e)
        }
    }
}
