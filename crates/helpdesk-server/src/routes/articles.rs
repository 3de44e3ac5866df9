use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use helpdesk_core::article::{ArticleInput, KnowledgeArticle};
use helpdesk_core::view::{ArticleQuery, ArticleView};

use crate::auth::ActingActor;
use crate::error::AppError;
use crate::routes::ConfirmParams;
use crate::state::AppState;

/// GET /api/articles?text=&sector=
pub async fn list_articles(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Query(query): Query<ArticleQuery>,
) -> Result<Json<Vec<ArticleView>>, AppError> {
    Ok(Json(
        app.with_desk(move |desk| desk.articles(&me, &query))
            .await?,
    ))
}

/// POST /api/articles
pub async fn create_article(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Json(body): Json<ArticleInput>,
) -> Result<(StatusCode, Json<ArticleView>), AppError> {
    let view = app
        .with_desk(move |desk| desk.create_article(&me, body))
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/articles/{id}
pub async fn get_article(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Path(id): Path<String>,
) -> Result<Json<ArticleView>, AppError> {
    Ok(Json(app.with_desk(move |desk| desk.article(&me, &id)).await?))
}

/// PUT /api/articles/{id}
pub async fn edit_article(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Path(id): Path<String>,
    Json(body): Json<ArticleInput>,
) -> Result<Json<ArticleView>, AppError> {
    Ok(Json(
        app.with_desk(move |desk| desk.edit_article(&me, &id, body))
            .await?,
    ))
}

/// POST /api/articles/{id}/approval: flip approval.
pub async fn toggle_approval(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Path(id): Path<String>,
) -> Result<Json<ArticleView>, AppError> {
    Ok(Json(
        app.with_desk(move |desk| desk.toggle_approval(&me, &id))
            .await?,
    ))
}

#[derive(serde::Deserialize)]
pub struct ReviewBody {
    pub note: String,
    #[serde(default)]
    pub proposed_content: Option<String>,
}

/// POST /api/articles/{id}/review
pub async fn request_review(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Path(id): Path<String>,
    Json(body): Json<ReviewBody>,
) -> Result<Json<ArticleView>, AppError> {
    Ok(Json(
        app.with_desk(move |desk| {
            desk.request_review(&me, &id, &body.note, body.proposed_content.as_deref())
        })
        .await?,
    ))
}

/// POST /api/articles/{id}/review/validate
pub async fn validate_review(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Path(id): Path<String>,
) -> Result<Json<ArticleView>, AppError> {
    Ok(Json(
        app.with_desk(move |desk| desk.validate_review(&me, &id))
            .await?,
    ))
}

/// DELETE /api/articles/{id}?confirm=true
pub async fn delete_article(
    State(app): State<AppState>,
    ActingActor(me): ActingActor,
    Path(id): Path<String>,
    Query(params): Query<ConfirmParams>,
) -> Result<Json<KnowledgeArticle>, AppError> {
    Ok(Json(
        app.with_desk(move |desk| desk.delete_article(&me, &id, params.confirm))
            .await?,
    ))
}
