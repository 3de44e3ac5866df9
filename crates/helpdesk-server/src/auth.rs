use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;

/// Header naming the actor a request acts as.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// The acting actor id, taken from [`ACTOR_HEADER`]. Whether the actor
/// exists and may do what it asks is decided by the desk, not here.
#[derive(Debug, Clone)]
pub struct ActingActor(pub String);

impl<S> FromRequestParts<S> for ActingActor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| ActingActor(id.to_string()))
            .ok_or_else(|| AppError::unauthenticated(format!("missing {ACTOR_HEADER} header")))
    }
}
