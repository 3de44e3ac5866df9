use axum::extract::{Path, Query, State};
use axum::Json;
use helpdesk_core::actor::{Actor, Registration};
use helpdesk_core::desk::ActorDirectory;
use helpdesk_core::types::Role;

use crate::auth::ActingActor;
use crate::error::AppError;
use crate::routes::ConfirmParams;
use crate::state::AppState;

/// GET /api/me
pub async fn whoami(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
) -> Result<Json<Actor>, AppError> {
    Ok(Json(app.with_desk(move |desk| desk.whoami(&me)).await?))
}

/// POST /api/register: self-registration; needs no acting actor.
pub async fn register(
    State(app): State<AppState>,
    Json(body): Json<Registration>,
) -> Result<Json<Actor>, AppError> {
    Ok(Json(app.with_desk(move |desk| desk.register(body)).await?))
}

/// GET /api/actors
pub async fn list_actors(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
) -> Result<Json<ActorDirectory>, AppError> {
    Ok(Json(app.with_desk(move |desk| desk.actors(&me)).await?))
}

#[derive(serde::Deserialize)]
pub struct RoleBody {
    pub role: Role,
}

/// POST /api/actors/{id}/approve
pub async fn approve(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Path(id): Path<String>,
    Json(body): Json<RoleBody>,
) -> Result<Json<Actor>, AppError> {
    Ok(Json(
        app.with_desk(move |desk| desk.approve_registration(&me, &id, body.role))
            .await?,
    ))
}

/// POST /api/actors/{id}/reject?confirm=true
pub async fn reject(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Path(id): Path<String>,
    Query(params): Query<ConfirmParams>,
) -> Result<Json<Actor>, AppError> {
    Ok(Json(
        app.with_desk(move |desk| desk.reject_registration(&me, &id, params.confirm))
            .await?,
    ))
}

/// PUT /api/actors/{id}/role
pub async fn change_role(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Path(id): Path<String>,
    Json(body): Json<RoleBody>,
) -> Result<Json<Actor>, AppError> {
    Ok(Json(
        app.with_desk(move |desk| desk.change_role(&me, &id, body.role))
            .await?,
    ))
}

#[derive(serde::Deserialize)]
pub struct SectorBody {
    #[serde(default)]
    pub sector: Option<String>,
}

/// PUT /api/actors/{id}/sector: `null` clears the home sector.
pub async fn set_home_sector(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Path(id): Path<String>,
    Json(body): Json<SectorBody>,
) -> Result<Json<Actor>, AppError> {
    Ok(Json(
        app.with_desk(move |desk| desk.set_home_sector(&me, &id, body.sector.as_deref()))
            .await?,
    ))
}

/// DELETE /api/actors/{id}?confirm=true
pub async fn remove(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Path(id): Path<String>,
    Query(params): Query<ConfirmParams>,
) -> Result<Json<Actor>, AppError> {
    Ok(Json(
        app.with_desk(move |desk| desk.remove_actor(&me, &id, params.confirm))
            .await?,
    ))
}

#[derive(serde::Deserialize)]
pub struct DomainBody {
    #[serde(default)]
    pub domain: Option<String>,
}

/// PUT /api/registration/domain
pub async fn set_allowed_domain(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Json(body): Json<DomainBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let config = app
        .with_desk(move |desk| desk.set_allowed_domain(&me, body.domain.as_deref()))
        .await?;
    Ok(Json(
        serde_json::json!({ "allowed_domain": config.allowed_domain() }),
    ))
}
