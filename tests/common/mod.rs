//! In-process ActiveCampaign stand-in for integration tests.
//!
//! Contacts, tags and automation enrollments are synthesized on the fly from
//! counts, so a listing of any size can be served without fixtures.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

pub const API_TOKEN: &str = "test-token";

/// A recorded request: endpoint name plus its query parameters.
pub type Recorded = (String, HashMap<String, String>);

#[derive(Clone, Default)]
pub struct MockAccount {
    pub contacts: u64,
    pub tags: u64,
    pub automations: u64,
    /// Enrollments served for automation id "3".
    pub enrollments: u64,
    /// Page offsets of the tags listing that answer 500.
    pub failing_tag_offsets: Vec<u64>,
    pub requests: Arc<Mutex<Vec<Recorded>>>,
    pub created: Arc<Mutex<Vec<Value>>>,
}

impl MockAccount {
    pub fn requests_to(&self, endpoint: &str) -> Vec<HashMap<String, String>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == endpoint)
            .map(|(_, params)| params.clone())
            .collect()
    }

    /// Offsets of full-size page requests to `endpoint`, sorted.
    pub fn page_offsets(&self, endpoint: &str) -> Vec<u64> {
        let mut offsets: Vec<u64> = self
            .requests_to(endpoint)
            .iter()
            .filter(|p| p.get("limit").map(String::as_str) == Some("100"))
            .filter_map(|p| p.get("offset").and_then(|o| o.parse().ok()))
            .collect();
        offsets.sort_unstable();
        offsets
    }
}

/// Start the server on an ephemeral port and return its base URL.
pub async fn spawn(account: MockAccount) -> String {
    let app = Router::new()
        .route("/api/3/contacts", get(contacts))
        .route("/api/3/contacts/{id}/contactTags", get(contact_tags))
        .route("/api/3/tags", get(tags))
        .route("/api/3/automations", get(automations))
        .route("/api/3/contactAutomations", get(contact_automations))
        .route("/api/3/contactTags", post(add_contact_tag))
        .with_state(account);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("api-token")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == API_TOKEN)
}

fn forbidden() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({"message": "No Result found for Subscriber with id 0"})),
    )
        .into_response()
}

fn window(params: &HashMap<String, String>, total: u64) -> std::ops::Range<u64> {
    let offset: u64 = params.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
    let limit: u64 = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(20);
    offset.min(total)..(offset + limit).min(total)
}

fn record(account: &MockAccount, endpoint: &str, params: &HashMap<String, String>) {
    account
        .requests
        .lock()
        .unwrap()
        .push((endpoint.to_string(), params.clone()));
}

fn contact(i: u64) -> Value {
    json!({
        "id": (i + 1).to_string(),
        "email": format!("user{i}@example.com"),
        "firstName": "User",
        "lastName": i.to_string(),
        "phone": "",
        "cdate": "2024-01-15T10:00:00-06:00",
    })
}

async fn contacts(
    State(account): State<MockAccount>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    record(&account, "contacts", &params);
    if !authorized(&headers) {
        return forbidden();
    }

    if let Some(email) = params.get("email") {
        let found: Vec<Value> = (0..account.contacts)
            .filter(|i| format!("user{i}@example.com") == *email)
            .map(contact)
            .collect();
        let total = found.len().to_string();
        return Json(json!({"contacts": found, "meta": {"total": total}})).into_response();
    }

    let items: Vec<Value> = window(&params, account.contacts).map(contact).collect();
    Json(json!({"contacts": items, "meta": {"total": account.contacts.to_string()}}))
        .into_response()
}

async fn contact_tags(
    State(account): State<MockAccount>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    record(&account, "contactTags", &HashMap::from([("contact".to_string(), id.clone())]));
    if !authorized(&headers) {
        return forbidden();
    }
    // Contact 1 carries tag 1; nobody else has tags.
    let tags = if id == "1" {
        vec![json!({"id": "900", "contact": "1", "tag": "1", "cdate": "2024-02-01"})]
    } else {
        Vec::new()
    };
    Json(json!({"contactTags": tags})).into_response()
}

async fn tags(
    State(account): State<MockAccount>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    record(&account, "tags", &params);
    if !authorized(&headers) {
        return forbidden();
    }

    let tag = |i: u64| json!({"id": (i + 1).to_string(), "tag": format!("tag-{}", i + 1), "tagType": "contact"});

    if let Some(search) = params.get("search") {
        let needle = search.to_lowercase();
        let found: Vec<Value> = (0..account.tags)
            .filter(|i| format!("tag-{}", i + 1).contains(&needle))
            .map(tag)
            .collect();
        return Json(json!({"tags": found, "meta": {"total": found.len().to_string()}}))
            .into_response();
    }

    let range = window(&params, account.tags);
    let is_page = params.get("limit").map(String::as_str) == Some("100");
    if is_page && account.failing_tag_offsets.contains(&range.start) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
    }
    let items: Vec<Value> = range.map(tag).collect();
    Json(json!({"tags": items, "meta": {"total": account.tags.to_string()}})).into_response()
}

async fn automations(
    State(account): State<MockAccount>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    record(&account, "automations", &params);
    if !authorized(&headers) {
        return forbidden();
    }
    let items: Vec<Value> = window(&params, account.automations)
        .map(|i| {
            json!({
                "id": (i + 1).to_string(),
                "name": format!("Automation {}", i + 1),
                "status": if i % 2 == 0 { "1" } else { "2" },
                "entered": "10",
                "exited": "4",
            })
        })
        .collect();
    // Numeric total, as some endpoints send it.
    Json(json!({"automations": items, "meta": {"total": account.automations}})).into_response()
}

async fn contact_automations(
    State(account): State<MockAccount>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    record(&account, "contactAutomations", &params);
    if !authorized(&headers) {
        return forbidden();
    }
    let total = match params.get("filters[seriesid]").map(String::as_str) {
        Some("3") => account.enrollments,
        _ => 0,
    };
    let items: Vec<Value> = window(&params, total)
        .map(|i| {
            json!({
                "id": (i + 1).to_string(),
                "contact": (i + 10).to_string(),
                "seriesid": "3",
                "status": if i % 3 == 0 { "2" } else { "1" },
                "adddate": "2024-03-01T09:00:00-06:00",
            })
        })
        .collect();
    Json(json!({"contactAutomations": items, "meta": {"total": total.to_string()}}))
        .into_response()
}

async fn add_contact_tag(
    State(account): State<MockAccount>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return forbidden();
    }
    account.created.lock().unwrap().push(body.clone());
    let contact = body["contactTag"]["contact"].clone();
    let tag = body["contactTag"]["tag"].clone();
    (
        StatusCode::CREATED,
        Json(json!({"contactTag": {"id": "501", "contact": contact, "tag": tag, "cdate": "2024-04-01"}})),
    )
        .into_response()
}

/// Slack incoming-webhook stand-in that records every posted body.
#[derive(Clone, Default)]
pub struct MockWebhook {
    /// Answer 500 instead of Slack's plain "ok".
    pub failing: bool,
    pub posts: Arc<Mutex<Vec<Value>>>,
}

impl MockWebhook {
    pub fn texts(&self) -> Vec<String> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .filter_map(|body| body["text"].as_str().map(str::to_string))
            .collect()
    }
}

/// Start the webhook on an ephemeral port and return its URL.
pub async fn spawn_webhook(hook: MockWebhook) -> String {
    let app = Router::new()
        .route("/hook", post(receive_hook))
        .with_state(hook);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/hook")
}

async fn receive_hook(State(hook): State<MockWebhook>, Json(body): Json<Value>) -> Response {
    hook.posts.lock().unwrap().push(body);
    if hook.failing {
        (StatusCode::INTERNAL_SERVER_ERROR, "channel_is_archived").into_response()
    } else {
        (StatusCode::OK, "ok").into_response()
    }
}
