use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use helpdesk_core::kb_import::ArticlePrefill;
use helpdesk_core::message::Message;
use helpdesk_core::ticket::NewTicket;
use helpdesk_core::view::{TicketQuery, TicketSummary, TicketView};

use crate::auth::ActingActor;
use crate::error::AppError;
use crate::state::AppState;

/// GET /api/tickets?status=&sector=&text=
pub async fn list_tickets(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Query(query): Query<TicketQuery>,
) -> Result<Json<Vec<TicketSummary>>, AppError> {
    Ok(Json(app.with_desk(move |desk| desk.tickets(&me, &query)).await?))
}

/// POST /api/tickets: open and triage a ticket.
pub async fn create_ticket(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Json(body): Json<NewTicket>,
) -> Result<(StatusCode, Json<TicketView>), AppError> {
    // The classifier call runs between two locked steps so a slow model
    // never holds up other writers.
    let job = {
        let me = me.clone();
        let body = body.clone();
        app.with_desk(move |desk| desk.prepare_ticket(&me, &body)).await?
    };
    let verdict = job.run(app.classifier.as_ref()).await;
    let view = app
        .with_desk(move |desk| desk.open_ticket(&me, body, verdict))
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/tickets/{id}
pub async fn get_ticket(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Path(id): Path<String>,
) -> Result<Json<TicketView>, AppError> {
    Ok(Json(app.with_desk(move |desk| desk.ticket(&me, &id)).await?))
}

#[derive(serde::Deserialize)]
pub struct MessageBody {
    pub content: String,
    #[serde(default)]
    pub internal: bool,
}

/// POST /api/tickets/{id}/messages
pub async fn send_message(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Path(id): Path<String>,
    Json(body): Json<MessageBody>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    let message = app
        .with_desk(move |desk| desk.send_message(&me, &id, &body.content, body.internal))
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// POST /api/tickets/{id}/resolve
pub async fn resolve(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Path(id): Path<String>,
) -> Result<Json<TicketView>, AppError> {
    Ok(Json(app.with_desk(move |desk| desk.resolve(&me, &id)).await?))
}

/// POST /api/tickets/{id}/close
pub async fn close(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Path(id): Path<String>,
) -> Result<Json<TicketView>, AppError> {
    Ok(Json(app.with_desk(move |desk| desk.close(&me, &id)).await?))
}

/// POST /api/tickets/{id}/reopen
pub async fn reopen(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Path(id): Path<String>,
) -> Result<Json<TicketView>, AppError> {
    Ok(Json(app.with_desk(move |desk| desk.reopen(&me, &id)).await?))
}

/// POST /api/tickets/{id}/assign: the acting agent takes the ticket.
pub async fn assign_to_self(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Path(id): Path<String>,
) -> Result<Json<TicketView>, AppError> {
    Ok(Json(
        app.with_desk(move |desk| desk.assign_to_self(&me, &id))
            .await?,
    ))
}

#[derive(serde::Deserialize)]
pub struct RatingBody {
    pub score: u8,
}

/// POST /api/tickets/{id}/rating
pub async fn rate(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Path(id): Path<String>,
    Json(body): Json<RatingBody>,
) -> Result<Json<TicketView>, AppError> {
    Ok(Json(
        app.with_desk(move |desk| desk.rate(&me, &id, body.score))
            .await?,
    ))
}

/// POST /api/tickets/{id}/import: draft a knowledge article from a
/// resolved ticket. Nothing is stored.
pub async fn import_to_kb(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Path(id): Path<String>,
) -> Result<Json<ArticlePrefill>, AppError> {
    let prefill = app
        .read_with_classifier(move |desk, classifier| async move {
            desk.import_ticket(&me, &id, classifier.as_ref()).await
        })
        .await?;
    Ok(Json(prefill))
}
