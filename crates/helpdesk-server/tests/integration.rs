use std::sync::Arc;

use axum::http::StatusCode;
use helpdesk_core::actor::Registration;
use helpdesk_core::classifier::{Classifier, FixedClassifier};
use helpdesk_core::kb_import::ArticleDraft;
use helpdesk_core::triage::TriageVerdict;
use helpdesk_core::types::{Priority, Role};
use helpdesk_core::Helpdesk;
use http_body_util::BodyExt;
use serde_json::json;
use tempfile::TempDir;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const ADMIN: &str = "admin";
const REQUESTER: &str = "U1";
const SUPPORT: &str = "U2";

/// A desk with sector "IT", requester U1 and support U2 homed in IT.
fn init_desk(dir: &TempDir) {
    helpdesk_core::desk::init(dir.path(), "Acme").unwrap();
    let desk = Helpdesk::open(dir.path()).unwrap();
    desk.add_sector(ADMIN, "IT").unwrap();
    for (name, number, role) in [("Ana", "1001", Role::Requester), ("Carl", "1002", Role::Support)] {
        let a = desk
            .register(Registration {
                name: name.to_string(),
                registration_number: number.to_string(),
                email: None,
            })
            .unwrap();
        desk.approve_registration(ADMIN, &a.id, role).unwrap();
    }
    desk.set_home_sector(ADMIN, SUPPORT, Some("IT")).unwrap();
}

fn vpn_verdict() -> TriageVerdict {
    TriageVerdict {
        sector: "IT".to_string(),
        priority: Priority::High,
        suggested_agent_id: SUPPORT.to_string(),
        reasoning: "network outage for one user".to_string(),
        auto_response: "Try restarting the VPN client.".to_string(),
        confidence_score: 0.92,
    }
}

fn router(dir: &TempDir, classifier: impl Classifier + 'static) -> axum::Router {
    helpdesk_server::build_router(dir.path().to_path_buf(), Arc::new(classifier))
}

fn app(dir: &TempDir) -> axum::Router {
    router(dir, FixedClassifier::with_verdict(vpn_verdict()))
}

async fn send(
    app: axum::Router,
    method: &str,
    uri: &str,
    actor: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut req = axum::http::Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        req = req.header("x-actor-id", actor);
    }
    let req = match body {
        Some(body) => req
            .header("content-type", "application/json")
            .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => req.body(axum::body::Body::empty()).unwrap(),
    };
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn get(app: axum::Router, uri: &str, actor: &str) -> (StatusCode, serde_json::Value) {
    send(app, "GET", uri, Some(actor), None).await
}

async fn post(
    app: axum::Router,
    uri: &str,
    actor: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "POST", uri, Some(actor), Some(body)).await
}

async fn open_vpn_ticket(dir: &TempDir) -> serde_json::Value {
    let (status, json) = post(
        app(dir),
        "/api/tickets",
        REQUESTER,
        json!({ "title": "VPN down", "description": "cannot connect from home" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json
}

async fn resolve_t1(dir: &TempDir) {
    let (status, _) = post(app(dir), "/api/tickets/T1/resolve", SUPPORT, json!({})).await;
    assert_eq!(status, StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Access
// ---------------------------------------------------------------------------

#[tokio::test]
async fn config_is_public() {
    let dir = TempDir::new().unwrap();
    init_desk(&dir);

    let (status, json) = send(app(&dir), "GET", "/api/config", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["organization"], "Acme");
    assert_eq!(json["manual_triage_sector"], "Manual Triage");
    assert!(json.get("classifier").is_none());
}

#[tokio::test]
async fn not_initialized_returns_400() {
    let dir = TempDir::new().unwrap();
    let (status, _) = send(app(&dir), "GET", "/api/config", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_actor_header_returns_401() {
    let dir = TempDir::new().unwrap();
    init_desk(&dir);
    let (status, json) = send(app(&dir), "GET", "/api/tickets", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json["error"].as_str().unwrap().contains("x-actor-id"));
}

#[tokio::test]
async fn unknown_actor_returns_403() {
    let dir = TempDir::new().unwrap();
    init_desk(&dir);
    let (status, _) = get(app(&dir), "/api/tickets", "U99").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn requester_cannot_list_actors() {
    let dir = TempDir::new().unwrap();
    init_desk(&dir);
    let (status, _) = get(app(&dir), "/api/actors", REQUESTER).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = get(app(&dir), "/api/actors", ADMIN).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["active"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn registration_then_approval() {
    let dir = TempDir::new().unwrap();
    init_desk(&dir);

    let (status, json) = send(
        app(&dir),
        "POST",
        "/api/register",
        None,
        Some(json!({ "name": "Dee", "registration_number": "1003" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["approved"], false);
    let id = json["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        app(&dir),
        "POST",
        "/api/register",
        None,
        Some(json!({ "name": "Dee again", "registration_number": "1003" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = post(
        app(&dir),
        &format!("/api/actors/{id}/approve"),
        ADMIN,
        json!({ "role": "support" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["approved"], true);
    assert_eq!(json["role"], "support");
}

// ---------------------------------------------------------------------------
// Tickets
// ---------------------------------------------------------------------------

#[tokio::test]
async fn vpn_ticket_is_triaged_and_answered() {
    let dir = TempDir::new().unwrap();
    init_desk(&dir);

    let ticket = open_vpn_ticket(&dir).await;
    assert_eq!(ticket["id"], "T1");
    assert_eq!(ticket["status"], "waiting_user");
    assert_eq!(ticket["sector"], "IT");
    assert_eq!(ticket["priority"], "high");
    let messages = ticket["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1]["content"], "Try restarting the VPN client.");
    assert_eq!(messages[1]["is_automated"], true);
    // Triage detail is staff-only.
    assert!(ticket["triage"].is_null());

    let (status, staff_view) = get(app(&dir), "/api/tickets/T1", SUPPORT).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(staff_view["triage"]["suggested_agent_id"], SUPPORT);
}

#[tokio::test]
async fn internal_note_is_hidden_and_keeps_status() {
    let dir = TempDir::new().unwrap();
    init_desk(&dir);
    open_vpn_ticket(&dir).await;

    let (status, _) = post(
        app(&dir),
        "/api/tickets/T1/messages",
        SUPPORT,
        json!({ "content": "Please reinstall the profile." }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, note) = post(
        app(&dir),
        "/api/tickets/T1/messages",
        SUPPORT,
        json!({ "content": "certificate expired on the gateway", "internal": true }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(note["is_internal"], true);

    let (_, staff) = get(app(&dir), "/api/tickets/T1", SUPPORT).await;
    assert_eq!(staff["status"], "waiting_user");
    assert_eq!(staff["messages"].as_array().unwrap().len(), 4);

    let (_, mine) = get(app(&dir), "/api/tickets/T1", REQUESTER).await;
    let mine = mine["messages"].as_array().unwrap();
    assert_eq!(mine.len(), 3);
    assert!(mine.iter().all(|m| m["is_internal"] == false));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_notes_are_all_kept() {
    let dir = TempDir::new().unwrap();
    init_desk(&dir);
    open_vpn_ticket(&dir).await;

    let shared = app(&dir);
    let mut handles = Vec::new();
    for n in 0..40 {
        let app = shared.clone();
        handles.push(tokio::spawn(async move {
            post(
                app,
                "/api/tickets/T1/messages",
                SUPPORT,
                json!({ "content": format!("note {n}"), "internal": true }),
            )
            .await
            .0
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::CREATED);
    }

    let (_, view) = get(shared, "/api/tickets/T1", SUPPORT).await;
    assert_eq!(view["messages"].as_array().unwrap().len(), 42);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_tickets_get_distinct_ids() {
    let dir = TempDir::new().unwrap();
    init_desk(&dir);

    let shared = app(&dir);
    let mut handles = Vec::new();
    for n in 0..12 {
        let app = shared.clone();
        handles.push(tokio::spawn(async move {
            post(
                app,
                "/api/tickets",
                REQUESTER,
                json!({ "title": format!("Issue {n}"), "description": "details" }),
            )
            .await
        }));
    }
    let mut ids = Vec::new();
    for handle in handles {
        let (status, ticket) = handle.await.unwrap();
        assert_eq!(status, StatusCode::CREATED);
        ids.push(ticket["id"].as_str().unwrap().to_string());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 12);

    let (_, queue) = get(shared, "/api/tickets", SUPPORT).await;
    assert_eq!(queue.as_array().unwrap().len(), 12);
}

#[tokio::test]
async fn classifier_failure_routes_to_manual_triage() {
    let dir = TempDir::new().unwrap();
    init_desk(&dir);

    let (status, ticket) = post(
        router(&dir, FixedClassifier::default()),
        "/api/tickets",
        REQUESTER,
        json!({ "title": "Printer", "description": "paper jam on floor 2" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(ticket["sector"], "Manual Triage");
    assert_eq!(ticket["priority"], "medium");
    assert_eq!(ticket["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn support_cannot_open_ticket() {
    let dir = TempDir::new().unwrap();
    init_desk(&dir);
    let (status, _) = post(
        app(&dir),
        "/api/tickets",
        SUPPORT,
        json!({ "title": "x", "description": "y" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn closed_ticket_rejects_messages() {
    let dir = TempDir::new().unwrap();
    init_desk(&dir);
    open_vpn_ticket(&dir).await;
    resolve_t1(&dir).await;
    let (status, _) = post(app(&dir), "/api/tickets/T1/close", SUPPORT, json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post(
        app(&dir),
        "/api/tickets/T1/messages",
        REQUESTER,
        json!({ "content": "hello?" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, view) = get(app(&dir), "/api/tickets/T1", REQUESTER).await;
    assert_eq!(view["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn second_rating_is_rejected() {
    let dir = TempDir::new().unwrap();
    init_desk(&dir);
    open_vpn_ticket(&dir).await;
    resolve_t1(&dir).await;

    let (status, view) = post(app(&dir), "/api/tickets/T1/rating", REQUESTER, json!({ "score": 5 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["rating"], 5);

    let (status, _) = post(app(&dir), "/api/tickets/T1/rating", REQUESTER, json!({ "score": 2 })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, view) = get(app(&dir), "/api/tickets/T1", REQUESTER).await;
    assert_eq!(view["rating"], 5);
}

#[tokio::test]
async fn reopen_moves_ticket_back_to_in_progress() {
    let dir = TempDir::new().unwrap();
    init_desk(&dir);
    open_vpn_ticket(&dir).await;
    resolve_t1(&dir).await;

    let (status, view) = post(app(&dir), "/api/tickets/T1/reopen", REQUESTER, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["status"], "in_progress");

    let messages = view["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    let last = &messages[2];
    assert_eq!(last["sender_id"], "system");
    assert!(last["content"].as_str().unwrap().contains("reopened by Ana"));
}

#[tokio::test]
async fn queue_filters_by_text() {
    let dir = TempDir::new().unwrap();
    init_desk(&dir);
    open_vpn_ticket(&dir).await;

    let (_, hits) = get(app(&dir), "/api/tickets?text=vpn", SUPPORT).await;
    assert_eq!(hits.as_array().unwrap().len(), 1);
    let (_, hits) = get(app(&dir), "/api/tickets?text=printer", SUPPORT).await;
    assert!(hits.as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Knowledge base
// ---------------------------------------------------------------------------

async fn create_admin_article(dir: &TempDir) {
    let (status, json) = post(
        app(dir),
        "/api/articles",
        ADMIN,
        json!({
            "title": "VPN certificate renewal",
            "content": "Reinstall the VPN profile.",
            "tags": ["vpn"],
            "sector": "IT"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    assert_eq!(json["state"], "approved");
}

#[tokio::test]
async fn review_workflow() {
    let dir = TempDir::new().unwrap();
    init_desk(&dir);
    create_admin_article(&dir).await;

    let (status, _) = post(app(&dir), "/api/articles/KB1/review", SUPPORT, json!({ "note": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, view) = post(
        app(&dir),
        "/api/articles/KB1/review",
        SUPPORT,
        json!({ "note": "step 2 changed", "proposed_content": "Reinstall the VPN profile, then reboot." }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["approved"], false);
    assert_eq!(view["review_requested"], true);

    let (status, view) = post(app(&dir), "/api/articles/KB1/review/validate", ADMIN, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["approved"], true);
    assert_eq!(view["review_requested"], false);
    assert!(view["review_note"].is_null());
}

#[tokio::test]
async fn requester_cannot_read_knowledge_base() {
    let dir = TempDir::new().unwrap();
    init_desk(&dir);
    let (status, _) = get(app(&dir), "/api/articles", REQUESTER).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn delete_article_needs_confirmation() {
    let dir = TempDir::new().unwrap();
    init_desk(&dir);
    create_admin_article(&dir).await;

    let (status, _) = send(app(&dir), "DELETE", "/api/articles/KB1", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(app(&dir), "DELETE", "/api/articles/KB1?confirm=true", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get(app(&dir), "/api/articles/KB1", ADMIN).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn import_builds_prefill_from_resolved_ticket() {
    let dir = TempDir::new().unwrap();
    init_desk(&dir);
    open_vpn_ticket(&dir).await;
    resolve_t1(&dir).await;

    let drafter = FixedClassifier {
        verdict: None,
        draft: Some(ArticleDraft {
            problem_description: "VPN gateway certificate expired.".to_string(),
            suggested_title: "VPN connection fails - expired certificate".to_string(),
            suggested_tags: vec!["vpn".to_string(), "certificate".to_string()],
            sufficient_information: true,
        }),
    };
    let (status, prefill) = post(router(&dir, drafter), "/api/tickets/T1/import", SUPPORT, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(prefill["complete"], true);
    assert_eq!(prefill["input"]["title"], "VPN connection fails - expired certificate");
    assert_eq!(prefill["input"]["sector"], "IT");
    assert_eq!(prefill["input"]["source_ticket_id"], "T1");
    assert!(prefill["input"]["content"]
        .as_str()
        .unwrap()
        .contains("VPN gateway certificate expired."));

    // Nothing was stored.
    let (_, articles) = get(app(&dir), "/api/articles", SUPPORT).await;
    assert!(articles.as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Sectors and reports
// ---------------------------------------------------------------------------

#[tokio::test]
async fn removing_sector_keeps_ticket_labels() {
    let dir = TempDir::new().unwrap();
    init_desk(&dir);
    open_vpn_ticket(&dir).await;

    let (status, sectors) = send(app(&dir), "DELETE", "/api/sectors/IT", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!sectors.as_array().unwrap().iter().any(|s| s == "IT"));

    let (_, view) = get(app(&dir), "/api/tickets/T1", SUPPORT).await;
    assert_eq!(view["sector"], "IT");
}

#[tokio::test]
async fn report_summary_counts_by_sector() {
    let dir = TempDir::new().unwrap();
    init_desk(&dir);
    open_vpn_ticket(&dir).await;
    resolve_t1(&dir).await;
    post(app(&dir), "/api/tickets/T1/rating", REQUESTER, json!({ "score": 4 })).await;

    let (status, summary) = get(app(&dir), "/api/reports/summary?sector=IT", SUPPORT).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total"], 1);
    assert_eq!(summary["resolved"], 1);
    assert_eq!(summary["average_rating"], 4.0);
    assert_eq!(summary["by_priority"]["high"], 1);
    assert_eq!(summary["by_priority"]["low"], 0);
}

#[tokio::test]
async fn schedules_are_admin_only() {
    let dir = TempDir::new().unwrap();
    init_desk(&dir);

    let (status, _) = get(app(&dir), "/api/schedules", SUPPORT).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, saved) = post(
        app(&dir),
        "/api/schedules",
        ADMIN,
        json!({
            "name": "IT monthly",
            "frequency": "monthly",
            "recipients": ["it@example.com", "it@example.com"],
            "email_subject": "IT month"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["id"], "S2");
    assert_eq!(saved["recipients"].as_array().unwrap().len(), 1);

    let (_, all) = get(app(&dir), "/api/schedules", ADMIN).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
}
