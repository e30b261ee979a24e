use super::*;
use crate::{fake_backend::spawn_fake_backend, session::MemoryCredentialStore};
use shared::error::ErrorCode;
use std::sync::Arc;

fn client_for(base_url: &str) -> (ApiClient, SessionContext) {
    let session = SessionContext::new(Arc::new(MemoryCredentialStore::new()));
    let client = ApiClient::new(base_url, session.clone()).expect("client");
    (client, session)
}

#[tokio::test]
async fn request_without_credential_omits_authorization() {
    let (base_url, backend) = spawn_fake_backend().await.expect("spawn backend");
    let (client, _session) = client_for(&base_url);

    client.list_campaigns().await.expect("list");

    assert_eq!(backend.authorization_for("/campaigns/list").await, vec![None]);
}

#[tokio::test]
async fn credential_written_after_construction_is_attached() {
    let (base_url, backend) = spawn_fake_backend().await.expect("spawn backend");
    let (client, session) = client_for(&base_url);

    client.list_campaigns().await.expect("anonymous list");
    session.establish("late-token").await.expect("establish");
    client.list_campaigns().await.expect("authenticated list");
    session.invalidate().await.expect("invalidate");
    client.list_campaigns().await.expect("anonymous again");

    assert_eq!(
        backend.authorization_for("/campaigns/list").await,
        vec![None, Some("Bearer late-token".to_string()), None]
    );
}

#[tokio::test]
async fn generate_and_list_round_trip_campaigns() {
    let (base_url, _backend) = spawn_fake_backend().await.expect("spawn backend");
    let (client, _session) = client_for(&base_url);

    let first = client
        .generate_campaign("clean water")
        .await
        .expect("generate")
        .into_payload()
        .expect("positive")
        .campaign
        .expect("campaign");
    client.generate_campaign("ocean plastic").await.expect("generate");

    let campaigns = client
        .list_campaigns()
        .await
        .expect("list")
        .into_payload()
        .expect("positive")
        .campaigns
        .expect("campaigns");
    assert_eq!(campaigns.len(), 2);
    assert_eq!(campaigns[1].id, first.id);
    assert_eq!(campaigns[0].topic, "ocean plastic");
}

#[tokio::test]
async fn non_success_status_is_distinct_from_rejected_envelope() {
    let (base_url, backend) = spawn_fake_backend().await.expect("spawn backend");
    let (client, _session) = client_for(&base_url);

    let err = client
        .generate_campaign("   ")
        .await
        .expect_err("400 must surface as an error");
    let api_error = err.api_error().expect("status error");
    assert_eq!(api_error.status, 400);
    assert_eq!(api_error.code, ErrorCode::Validation);
    assert_eq!(err.server_message(), Some("Topic is required"));

    backend.data.lock().await.reject_generate = Some("Model is overloaded".into());
    let envelope = client
        .generate_campaign("clean water")
        .await
        .expect("2xx envelope is returned as-is");
    assert!(!envelope.success);
    let rejection = envelope.into_payload().expect_err("rejected");
    assert_eq!(rejection.message.as_deref(), Some("Model is overloaded"));
}

#[tokio::test]
async fn missing_campaign_reports_not_found() {
    let (base_url, _backend) = spawn_fake_backend().await.expect("spawn backend");
    let (client, _session) = client_for(&base_url);

    let err = client
        .get_campaign(&CampaignId::from("does-not-exist"))
        .await
        .expect_err("must fail");
    assert!(err.is_not_found());
    assert!(!err.is_auth_failure());
}

#[tokio::test]
async fn rejected_credential_is_classified_as_auth_failure() {
    let (base_url, backend) = spawn_fake_backend().await.expect("spawn backend");
    backend.data.lock().await.require_auth = true;
    let (client, _session) = client_for(&base_url);

    let err = client.list_campaigns().await.expect_err("must fail");
    assert!(err.is_auth_failure());
    assert_eq!(err.server_message(), Some("No token provided"));
}

#[tokio::test]
async fn update_delete_and_regenerate_address_campaign_by_id() {
    let (base_url, _backend) = spawn_fake_backend().await.expect("spawn backend");
    let (client, _session) = client_for(&base_url);

    let campaign = client
        .generate_campaign("wildlife")
        .await
        .expect("generate")
        .payload
        .campaign
        .expect("campaign");

    let updated = client
        .update_campaign(&campaign.id, "Protect the pollinators.")
        .await
        .expect("update")
        .payload
        .campaign
        .expect("campaign");
    assert_eq!(updated.id, campaign.id);
    assert_eq!(updated.text, "Protect the pollinators.");

    let regenerated = client
        .regenerate_campaign(&campaign.id)
        .await
        .expect("regenerate")
        .payload
        .campaign
        .expect("campaign");
    assert_eq!(regenerated.text, "Protect the pollinators. (regenerated)");

    let deleted = client
        .delete_campaign(&campaign.id)
        .await
        .expect("delete");
    assert!(deleted.success);
    assert_eq!(
        deleted.message.as_deref(),
        Some("Campaign deleted successfully")
    );
}

#[tokio::test]
async fn trending_news_sends_query_parameters() {
    let (base_url, backend) = spawn_fake_backend().await.expect("spawn backend");
    let (client, _session) = client_for(&base_url);

    let query = NewsQuery {
        topic: "ocean".into(),
        page: 2,
        page_size: 3,
    };
    let payload = client
        .trending_news(&query)
        .await
        .expect("news")
        .into_payload()
        .expect("positive");
    assert_eq!(payload.total_results, Some(1));
    assert_eq!(
        payload.news.expect("news")[0].headline,
        "Latest on ocean"
    );
    assert_eq!(backend.data.lock().await.news_queries, vec![query]);

    let topics = client
        .news_topics()
        .await
        .expect("topics")
        .payload
        .topics
        .expect("topics");
    assert_eq!(topics.len(), 2);
}

#[tokio::test]
async fn login_stores_issued_session_token() {
    let (base_url, backend) = spawn_fake_backend().await.expect("spawn backend");
    backend.data.lock().await.issue_session_token = true;
    let (client, session) = client_for(&base_url);

    let envelope = client.login("firebase-id-token").await.expect("login");
    assert!(envelope.success);
    assert_eq!(
        session.bearer().await.as_deref(),
        Some("session-firebase-id-token")
    );

    let user = client
        .current_user()
        .await
        .expect("current user")
        .payload
        .user
        .expect("user");
    assert_eq!(user.uid, "user-1");
    assert_eq!(
        backend.authorization_for("/auth/user").await,
        vec![Some("Bearer session-firebase-id-token".to_string())]
    );
}

#[tokio::test]
async fn login_falls_back_to_identity_token_as_bearer() {
    let (base_url, _backend) = spawn_fake_backend().await.expect("spawn backend");
    let (client, session) = client_for(&base_url);

    client.login("firebase-id-token").await.expect("login");
    assert_eq!(session.bearer().await.as_deref(), Some("firebase-id-token"));
}

#[tokio::test]
async fn failed_login_leaves_session_unauthenticated() {
    let (base_url, _backend) = spawn_fake_backend().await.expect("spawn backend");
    let (client, session) = client_for(&base_url);

    let err = client.login("bad-token").await.expect_err("401");
    assert!(err.is_auth_failure());
    assert!(!session.is_authenticated().await);
}

#[tokio::test]
async fn register_returns_created_profile() {
    let (base_url, _backend) = spawn_fake_backend().await.expect("spawn backend");
    let (client, _session) = client_for(&base_url);

    let envelope = client
        .register("Ada", "ada@example.org", "hunter22")
        .await
        .expect("register");
    assert_eq!(envelope.message.as_deref(), Some("User created successfully"));
    let user = envelope.payload.user.expect("user");
    assert_eq!(user.display_name.as_deref(), Some("Ada"));
}

#[tokio::test]
async fn unreachable_backend_surfaces_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");

    let (client, _session) = client_for(&format!("http://{addr}/api"));
    let err = client.list_campaigns().await.expect_err("must fail");
    assert!(matches!(err, ClientError::Transport { .. }), "unexpected: {err}");
}

#[test]
fn rejects_unusable_base_urls() {
    let session = SessionContext::in_memory();
    assert!(matches!(
        ApiClient::new("not a url", session.clone()),
        Err(ClientError::InvalidBaseUrl { .. })
    ));
    assert!(matches!(
        ApiClient::new("ftp://example.org/api", session.clone()),
        Err(ClientError::InvalidBaseUrl { .. })
    ));
    assert!(ApiClient::new("http://localhost:5000/api/", session).is_ok());
}

#[test]
fn endpoint_appends_segments_to_base_path() {
    let client =
        ApiClient::new("http://localhost:5000/api/", SessionContext::in_memory()).expect("client");
    assert_eq!(
        client
            .endpoint(&["campaigns", "regenerate", "abc 1"])
            .as_str(),
        "http://localhost:5000/api/campaigns/regenerate/abc%201"
    );
}
