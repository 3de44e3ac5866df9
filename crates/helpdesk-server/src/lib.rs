pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post, put};
use axum::Router;
use helpdesk_core::classifier::Classifier;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve_on()` and available for integration testing.
pub fn build_router(root: PathBuf, classifier: Arc<dyn Classifier>) -> Router {
    let app_state = state::AppState::new(root, classifier);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/config", get(routes::config::get_config))
        // Actors
        .route("/api/me", get(routes::actors::whoami))
        .route("/api/register", post(routes::actors::register))
        .route("/api/actors", get(routes::actors::list_actors))
        .route("/api/actors/{id}", axum::routing::delete(routes::actors::remove))
        .route("/api/actors/{id}/approve", post(routes::actors::approve))
        .route("/api/actors/{id}/reject", post(routes::actors::reject))
        .route("/api/actors/{id}/role", put(routes::actors::change_role))
        .route("/api/actors/{id}/sector", put(routes::actors::set_home_sector))
        .route(
            "/api/registration/domain",
            put(routes::actors::set_allowed_domain),
        )
        // Tickets
        .route(
            "/api/tickets",
            get(routes::tickets::list_tickets).post(routes::tickets::create_ticket),
        )
        .route("/api/tickets/{id}", get(routes::tickets::get_ticket))
        .route(
            "/api/tickets/{id}/messages",
            post(routes::tickets::send_message),
        )
        .route("/api/tickets/{id}/resolve", post(routes::tickets::resolve))
        .route("/api/tickets/{id}/close", post(routes::tickets::close))
        .route("/api/tickets/{id}/reopen", post(routes::tickets::reopen))
        .route(
            "/api/tickets/{id}/assign",
            post(routes::tickets::assign_to_self),
        )
        .route("/api/tickets/{id}/rating", post(routes::tickets::rate))
        .route(
            "/api/tickets/{id}/import",
            post(routes::tickets::import_to_kb),
        )
        // Knowledge base
        .route(
            "/api/articles",
            get(routes::articles::list_articles).post(routes::articles::create_article),
        )
        .route(
            "/api/articles/{id}",
            get(routes::articles::get_article)
                .put(routes::articles::edit_article)
                .delete(routes::articles::delete_article),
        )
        .route(
            "/api/articles/{id}/approval",
            post(routes::articles::toggle_approval),
        )
        .route(
            "/api/articles/{id}/review",
            post(routes::articles::request_review),
        )
        .route(
            "/api/articles/{id}/review/validate",
            post(routes::articles::validate_review),
        )
        // Sectors
        .route(
            "/api/sectors",
            get(routes::sectors::list_sectors).post(routes::sectors::add_sector),
        )
        .route(
            "/api/sectors/{name}",
            axum::routing::delete(routes::sectors::remove_sector),
        )
        // Reports
        .route("/api/reports/summary", get(routes::reports::summary))
        .route(
            "/api/schedules",
            get(routes::reports::list_schedules).post(routes::reports::save_schedule),
        )
        .route(
            "/api/schedules/{id}",
            axum::routing::delete(routes::reports::delete_schedule),
        )
        .route(
            "/api/schedules/{id}/toggle",
            post(routes::reports::toggle_schedule),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Serve the API on a pre-bound listener, so the caller can report the
/// actual port (useful when binding port 0).
pub async fn serve_on(
    root: PathBuf,
    listener: tokio::net::TcpListener,
    classifier: Arc<dyn Classifier>,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(root, classifier);

    tracing::info!("helpdesk API listening on http://localhost:{actual_port}");

    axum::serve(listener, app).await?;
    Ok(())
}
