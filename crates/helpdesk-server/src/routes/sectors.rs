use axum::extract::{Path, State};
use axum::Json;

use crate::auth::ActingActor;
use crate::error::AppError;
use crate::state::AppState;

/// GET /api/sectors: public; the registration and ticket forms need it.
pub async fn list_sectors(State(app): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(app.with_desk(|desk| desk.sectors()).await?))
}

#[derive(serde::Deserialize)]
pub struct SectorBody {
    pub name: String,
}

/// POST /api/sectors
pub async fn add_sector(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Json(body): Json<SectorBody>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(
        app.with_desk(move |desk| desk.add_sector(&me, &body.name))
            .await?,
    ))
}

/// DELETE /api/sectors/{name}
pub async fn remove_sector(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Path(name): Path<String>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(
        app.with_desk(move |desk| desk.remove_sector(&me, &name))
            .await?,
    ))
}
