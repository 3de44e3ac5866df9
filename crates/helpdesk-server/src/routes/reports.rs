use axum::extract::{Path, Query, State};
use axum::Json;
use helpdesk_core::report::{ReportFilter, ReportSchedule, ReportSummary, ScheduleInput};

use crate::auth::ActingActor;
use crate::error::AppError;
use crate::routes::ConfirmParams;
use crate::state::AppState;

/// GET /api/reports/summary?from=&to=&status=&sector=
pub async fn summary(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Query(filter): Query<ReportFilter>,
) -> Result<Json<ReportSummary>, AppError> {
    Ok(Json(app.with_desk(move |desk| desk.report(&me, &filter)).await?))
}

/// GET /api/schedules
pub async fn list_schedules(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
) -> Result<Json<Vec<ReportSchedule>>, AppError> {
    Ok(Json(app.with_desk(move |desk| desk.schedules(&me)).await?))
}

/// POST /api/schedules: create, or replace when the body carries an id.
pub async fn save_schedule(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Json(body): Json<ScheduleInput>,
) -> Result<Json<ReportSchedule>, AppError> {
    Ok(Json(
        app.with_desk(move |desk| desk.save_schedule(&me, body))
            .await?,
    ))
}

/// POST /api/schedules/{id}/toggle
pub async fn toggle_schedule(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Path(id): Path<String>,
) -> Result<Json<ReportSchedule>, AppError> {
    Ok(Json(
        app.with_desk(move |desk| desk.toggle_schedule(&me, &id))
            .await?,
    ))
}

/// DELETE /api/schedules/{id}?confirm=true
pub async fn delete_schedule(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Path(id): Path<String>,
    Query(params): Query<ConfirmParams>,
) -> Result<Json<ReportSchedule>, AppError> {
    Ok(Json(
        app.with_desk(move |desk| desk.delete_schedule(&me, &id, params.confirm))
            .await?,
    ))
}
