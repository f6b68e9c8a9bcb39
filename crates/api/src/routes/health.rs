//! Service health endpoint with a database reachability probe.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use tracing::error;

use crate::AppState;

/// Payload returned by `GET /health`.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Always `"sitebook"`.
    pub service: &'static str,
    /// `"healthy"` when the database answers, `"degraded"` otherwise.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Database probe result: `"up"` or `"down"`.
    pub database: &'static str,
}

impl HealthResponse {
    fn new(database_up: bool) -> Self {
        Self {
            service: "sitebook",
            status: if database_up { "healthy" } else { "degraded" },
            version: env!("CARGO_PKG_VERSION"),
            database: if database_up { "up" } else { "down" },
        }
    }
}

/// Pings the database and reports service readiness.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_up = match state.db.ping().await {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, "Health probe could not reach the database");
            false
        }
    };
    Json(HealthResponse::new(database_up))
}

/// Creates the health route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_healthy_when_database_answers() {
        let resp = HealthResponse::new(true);
        assert_eq!(resp.service, "sitebook");
        assert_eq!(resp.status, "healthy");
        assert_eq!(resp.database, "up");
        assert_eq!(resp.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_degraded_when_database_is_down() {
        let resp = HealthResponse::new(false);
        assert_eq!(resp.status, "degraded");
        assert_eq!(resp.database, "down");
    }
}
