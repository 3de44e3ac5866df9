use axum::extract::State;
use axum::Json;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/config: the settings a client needs to render the desk. The
/// classifier block is left out; it names where the API key lives.
pub async fn get_config(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let config = app.with_desk(|desk| desk.config()).await?;
    Ok(Json(serde_json::json!({
        "organization": config.organization.name,
        "assistant_name": config.assistant_name,
        "manual_triage_sector": config.manual_triage_sector,
        "allowed_domain": config.allowed_domain(),
    })))
}
