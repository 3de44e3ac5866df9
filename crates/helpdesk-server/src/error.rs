use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use helpdesk_core::error::HelpdeskError;

/// Private sentinel error type used to carry an explicit HTTP 401 through
/// the `anyhow::Error` chain without touching the `HelpdeskError` enum.
#[derive(Debug)]
struct UnauthenticatedError(String);

impl std::fmt::Display for UnauthenticatedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for UnauthenticatedError {}

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Construct a 401 for requests that name no actor.
    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self(UnauthenticatedError(msg.into()).into())
    }
}

fn status_for(e: &HelpdeskError) -> StatusCode {
    match e {
        HelpdeskError::NotInitialized | HelpdeskError::Validation(_) => StatusCode::BAD_REQUEST,
        HelpdeskError::Unauthorized { .. } => StatusCode::FORBIDDEN,
        HelpdeskError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        HelpdeskError::ActorNotFound(_)
        | HelpdeskError::TicketNotFound(_)
        | HelpdeskError::ArticleNotFound(_)
        | HelpdeskError::ScheduleNotFound(_) => StatusCode::NOT_FOUND,
        HelpdeskError::ExternalService(_) => StatusCode::BAD_GATEWAY,
        HelpdeskError::Io(_) | HelpdeskError::Yaml(_) | HelpdeskError::Json(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if self.0.downcast_ref::<UnauthenticatedError>().is_some() {
            StatusCode::UNAUTHORIZED
        } else if let Some(e) = self.0.downcast_ref::<HelpdeskError>() {
            status_for(e)
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
