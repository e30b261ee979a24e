//! In-process stand-in for the campaign backend used by the tests.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use shared::{
    domain::CampaignId,
    protocol::{Campaign, NewsQuery},
};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Default)]
pub(crate) struct BackendData {
    pub campaigns: Vec<Campaign>,
    pub next_id: u64,
    pub seen_authorization: Vec<(String, Option<String>)>,
    pub news_queries: Vec<NewsQuery>,
    pub require_auth: bool,
    pub fail_news: bool,
    pub reject_generate: Option<String>,
    pub issue_session_token: bool,
}

#[derive(Clone, Default)]
pub(crate) struct FakeBackend {
    pub data: Arc<Mutex<BackendData>>,
}

type Reply = (StatusCode, Json<Value>);

impl FakeBackend {
    async fn record(&self, path: &str, headers: &HeaderMap) -> Result<(), Reply> {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let mut data = self.data.lock().await;
        data.seen_authorization
            .push((path.to_string(), authorization.clone()));
        let has_bearer = authorization
            .as_deref()
            .is_some_and(|value| value.starts_with("Bearer "));
        if data.require_auth && !has_bearer {
            return Err(failure(StatusCode::UNAUTHORIZED, "No token provided"));
        }
        Ok(())
    }

    /// Authorization header values seen for `path`, in arrival order.
    pub async fn authorization_for(&self, path: &str) -> Vec<Option<String>> {
        self.data
            .lock()
            .await
            .seen_authorization
            .iter()
            .filter(|(seen, _)| seen == path)
            .map(|(_, value)| value.clone())
            .collect()
    }

    pub async fn request_count(&self) -> usize {
        self.data.lock().await.seen_authorization.len()
    }
}

fn failure(status: StatusCode, message: &str) -> Reply {
    (status, Json(json!({ "success": false, "message": message })))
}

fn campaign_reply(status: StatusCode, campaign: &Campaign) -> Reply {
    (status, Json(json!({ "success": true, "campaign": campaign })))
}

async fn register(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    if let Err(reply) = backend.record("/auth/register", &headers).await {
        return reply;
    }
    let email = body["email"].as_str().unwrap_or_default();
    (
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User created successfully",
            "user": {
                "uid": format!("user-{email}"),
                "email": email,
                "displayName": body["name"],
            }
        })),
    )
}

async fn login(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let _ = backend.record("/auth/login", &headers).await;
    let id_token = body["idToken"].as_str().unwrap_or_default();
    if id_token.is_empty() || id_token == "bad-token" {
        return failure(StatusCode::UNAUTHORIZED, "Invalid token");
    }
    let token = if backend.data.lock().await.issue_session_token {
        Some(format!("session-{id_token}"))
    } else {
        None
    };
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "user": { "uid": "user-1", "email": "ada@example.org", "displayName": "Ada" },
            "token": token,
        })),
    )
}

async fn current_user(State(backend): State<FakeBackend>, headers: HeaderMap) -> Reply {
    if let Err(reply) = backend.record("/auth/user", &headers).await {
        return reply;
    }
    if headers.get(header::AUTHORIZATION).is_none() {
        return failure(StatusCode::UNAUTHORIZED, "No token provided");
    }
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "user": { "uid": "user-1", "email": "ada@example.org", "displayName": "Ada" }
        })),
    )
}

async fn generate(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    if let Err(reply) = backend.record("/campaigns/generate", &headers).await {
        return reply;
    }
    let topic = body["topic"].as_str().unwrap_or_default().to_string();
    let mut data = backend.data.lock().await;
    if let Some(message) = data.reject_generate.clone() {
        return (
            StatusCode::OK,
            Json(json!({ "success": false, "message": message })),
        );
    }
    if topic.trim().is_empty() {
        return failure(StatusCode::BAD_REQUEST, "Topic is required");
    }
    data.next_id += 1;
    let campaign = Campaign {
        id: CampaignId(format!("c-{}", data.next_id)),
        topic: topic.clone(),
        text: format!("Campaign about {topic}"),
        image_url: Some(format!("https://img.example/{}.png", data.next_id)),
        created_at: Utc::now(),
        updated_at: None,
        user_id: Some("user-1".into()),
    };
    data.campaigns.insert(0, campaign.clone());
    campaign_reply(StatusCode::CREATED, &campaign)
}

async fn list(State(backend): State<FakeBackend>, headers: HeaderMap) -> Reply {
    if let Err(reply) = backend.record("/campaigns/list", &headers).await {
        return reply;
    }
    let campaigns = backend.data.lock().await.campaigns.clone();
    (
        StatusCode::OK,
        Json(json!({ "success": true, "campaigns": campaigns })),
    )
}

async fn get_campaign(
    State(backend): State<FakeBackend>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Reply {
    if let Err(reply) = backend.record("/campaigns/{id}", &headers).await {
        return reply;
    }
    let data = backend.data.lock().await;
    match data.campaigns.iter().find(|campaign| campaign.id.0 == id) {
        Some(campaign) => campaign_reply(StatusCode::OK, campaign),
        None => failure(StatusCode::NOT_FOUND, "Campaign not found"),
    }
}

async fn update(
    State(backend): State<FakeBackend>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    if let Err(reply) = backend.record("/campaigns/{id}", &headers).await {
        return reply;
    }
    let mut data = backend.data.lock().await;
    let Some(campaign) = data.campaigns.iter_mut().find(|campaign| campaign.id.0 == id) else {
        return failure(StatusCode::NOT_FOUND, "Campaign not found");
    };
    if let Some(text) = body["text"].as_str() {
        campaign.text = text.to_string();
    }
    campaign.updated_at = Some(Utc::now());
    let campaign = campaign.clone();
    campaign_reply(StatusCode::OK, &campaign)
}

async fn delete(
    State(backend): State<FakeBackend>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Reply {
    if let Err(reply) = backend.record("/campaigns/{id}", &headers).await {
        return reply;
    }
    let mut data = backend.data.lock().await;
    let before = data.campaigns.len();
    data.campaigns.retain(|campaign| campaign.id.0 != id);
    if data.campaigns.len() == before {
        return failure(StatusCode::NOT_FOUND, "Campaign not found");
    }
    (
        StatusCode::OK,
        Json(json!({ "success": true, "message": "Campaign deleted successfully" })),
    )
}

async fn regenerate(
    State(backend): State<FakeBackend>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Reply {
    if let Err(reply) = backend.record("/campaigns/regenerate/{id}", &headers).await {
        return reply;
    }
    let mut data = backend.data.lock().await;
    let Some(campaign) = data.campaigns.iter_mut().find(|campaign| campaign.id.0 == id) else {
        return failure(StatusCode::NOT_FOUND, "Campaign not found");
    };
    campaign.text = format!("{} (regenerated)", campaign.text);
    campaign.updated_at = Some(Utc::now());
    let campaign = campaign.clone();
    campaign_reply(StatusCode::OK, &campaign)
}

async fn trending(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Query(query): Query<NewsQuery>,
) -> Reply {
    if let Err(reply) = backend.record("/news/trending", &headers).await {
        return reply;
    }
    let mut data = backend.data.lock().await;
    data.news_queries.push(query.clone());
    if data.fail_news {
        return failure(StatusCode::INTERNAL_SERVER_ERROR, "News API unavailable");
    }
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "totalResults": 1,
            "news": [{
                "source": { "id": null, "name": "Wire" },
                "title": format!("Latest on {}", query.topic),
                "url": "https://news.example/1",
                "publishedAt": "2025-03-05T09:00:00Z"
            }]
        })),
    )
}

async fn topics(State(backend): State<FakeBackend>, headers: HeaderMap) -> Reply {
    if let Err(reply) = backend.record("/news/topics", &headers).await {
        return reply;
    }
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "topics": [
                { "id": "environment", "name": "Environment", "icon": "leaf" },
                { "id": "ocean", "name": "Ocean Conservation", "icon": "anchor" }
            ]
        })),
    )
}

/// Starts the backend on an ephemeral port; returns its `/api` base url.
pub(crate) async fn spawn_fake_backend() -> Result<(String, FakeBackend)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let backend = FakeBackend::default();
    let app = Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/user", get(current_user))
        .route("/api/campaigns/generate", post(generate))
        .route("/api/campaigns/list", get(list))
        .route("/api/campaigns/regenerate/:id", post(regenerate))
        .route(
            "/api/campaigns/:id",
            get(get_campaign).put(update).delete(delete),
        )
        .route("/api/news/trending", get(trending))
        .route("/api/news/topics", get(topics))
        .with_state(backend.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}/api"), backend))
}
