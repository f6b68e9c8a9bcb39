//! Request extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;

use sitebook_db::repositories::AuditActor;

/// Who is calling, as far as the request reveals it.
///
/// There is no authentication layer; the optional `x-user-id` header and the
/// forwarded client IP are recorded as-is for the audit trail.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Value of the `x-user-id` header, if present.
    pub user_id: Option<String>,
    /// Client IP from `x-forwarded-for` or `x-real-ip`, if present.
    pub ip: Option<String>,
}

impl RequestContext {
    /// Converts into the actor recorded in audit rows.
    #[must_use]
    pub fn audit_actor(&self) -> AuditActor {
        AuditActor {
            user_id: self.user_id.clone(),
            ip: self.ip.clone(),
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        let ip = header("x-forwarded-for")
            .and_then(|v| v.split(',').next().map(|s| s.trim().to_string()))
            .or_else(|| header("x-real-ip"));

        Ok(Self {
            user_id: header("x-user-id"),
            ip,
        })
    }
}
