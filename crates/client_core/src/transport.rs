//! HTTP gateway to the campaign backend.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::CampaignId,
    error::ApiError,
    protocol::{
        Acknowledgement, CampaignListPayload, CampaignPayload, Envelope,
        GenerateCampaignRequest, LoginPayload, LoginRequest, NewsPayload, NewsQuery,
        RegisterRequest, TopicsPayload, UpdateCampaignRequest, UserPayload,
    },
};
use tracing::{debug, info, warn};
use url::Url;

use crate::{config::ClientSettings, error::ClientError, session::SessionContext};

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    session: SessionContext,
}

impl ApiClient {
    pub fn new(base_url: &str, session: SessionContext) -> Result<Self, ClientError> {
        Self::with_http(Client::new(), base_url, session)
    }

    pub fn from_settings(
        settings: &ClientSettings,
        session: SessionContext,
    ) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|source| ClientError::Transport {
                path: settings.api_base_url.clone(),
                source,
            })?;
        Self::with_http(http, &settings.api_base_url, session)
    }

    fn with_http(http: Client, base_url: &str, session: SessionContext) -> Result<Self, ClientError> {
        let invalid = |reason: String| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason,
        };
        let parsed = Url::parse(base_url.trim()).map_err(|err| invalid(err.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
        }
        if parsed.cannot_be_a_base() {
            return Err(invalid("url cannot carry a path".into()));
        }
        Ok(Self {
            http,
            base_url: parsed,
            session,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Envelope<UserPayload>, ClientError> {
        let body = RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.send_json(Method::POST, &["auth", "register"], &body)
            .await
    }

    /// Exchanges an identity token for a session. On success the session
    /// credential (the server-issued token, or the identity token itself when
    /// the server issues none) is written to the session context.
    pub async fn login(&self, id_token: &str) -> Result<Envelope<LoginPayload>, ClientError> {
        let body = LoginRequest {
            id_token: id_token.to_string(),
        };
        let envelope: Envelope<LoginPayload> = self
            .send_json(Method::POST, &["auth", "login"], &body)
            .await?;

        if envelope.success {
            let credential = envelope
                .payload
                .token
                .clone()
                .unwrap_or_else(|| id_token.to_string());
            self.session.establish(&credential).await?;
            info!(
                uid = envelope.payload.user.as_ref().map(|user| user.uid.as_str()),
                "auth: login accepted"
            );
        }

        Ok(envelope)
    }

    pub async fn current_user(&self) -> Result<Envelope<UserPayload>, ClientError> {
        self.send(Method::GET, &["auth", "user"]).await
    }

    pub async fn generate_campaign(
        &self,
        topic: &str,
    ) -> Result<Envelope<CampaignPayload>, ClientError> {
        let body = GenerateCampaignRequest {
            topic: topic.to_string(),
        };
        self.send_json(Method::POST, &["campaigns", "generate"], &body)
            .await
    }

    pub async fn list_campaigns(&self) -> Result<Envelope<CampaignListPayload>, ClientError> {
        self.send(Method::GET, &["campaigns", "list"]).await
    }

    pub async fn get_campaign(
        &self,
        id: &CampaignId,
    ) -> Result<Envelope<CampaignPayload>, ClientError> {
        self.send(Method::GET, &["campaigns", id.as_str()]).await
    }

    pub async fn update_campaign(
        &self,
        id: &CampaignId,
        text: &str,
    ) -> Result<Envelope<CampaignPayload>, ClientError> {
        let body = UpdateCampaignRequest {
            text: text.to_string(),
        };
        self.send_json(Method::PUT, &["campaigns", id.as_str()], &body)
            .await
    }

    pub async fn delete_campaign(
        &self,
        id: &CampaignId,
    ) -> Result<Envelope<Acknowledgement>, ClientError> {
        self.send(Method::DELETE, &["campaigns", id.as_str()]).await
    }

    pub async fn regenerate_campaign(
        &self,
        id: &CampaignId,
    ) -> Result<Envelope<CampaignPayload>, ClientError> {
        self.send(Method::POST, &["campaigns", "regenerate", id.as_str()])
            .await
    }

    pub async fn trending_news(
        &self,
        query: &NewsQuery,
    ) -> Result<Envelope<NewsPayload>, ClientError> {
        let path = ["news", "trending"];
        let request = self.request(Method::GET, &path).query(query);
        self.execute(request, &path).await
    }

    pub async fn news_topics(&self) -> Result<Envelope<TopicsPayload>, ClientError> {
        self.send(Method::GET, &["news", "topics"]).await
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.http.request(method, self.endpoint(segments))
    }

    async fn send<P: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<Envelope<P>, ClientError> {
        let request = self.request(method, segments);
        self.execute(request, segments).await
    }

    async fn send_json<B: Serialize + ?Sized, P: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<Envelope<P>, ClientError> {
        let request = self.request(method, segments).json(body);
        self.execute(request, segments).await
    }

    async fn execute<P: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        segments: &[&str],
    ) -> Result<Envelope<P>, ClientError> {
        let path = format!("/{}", segments.join("/"));

        // Read per request so a credential written after construction applies.
        let request = match self.session.bearer().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                path: path.clone(),
                source,
            })?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|source| ClientError::Transport {
                path: path.clone(),
                source,
            })?;

        if !status.is_success() {
            let message = serde_json::from_slice::<Envelope<Acknowledgement>>(&body)
                .ok()
                .and_then(|envelope| envelope.message);
            warn!(
                path = %path,
                status = status.as_u16(),
                message = message.as_deref().unwrap_or(""),
                "api: request failed"
            );
            return Err(ClientError::Status {
                path,
                error: ApiError::from_status(status.as_u16(), message),
            });
        }

        let envelope: Envelope<P> =
            serde_json::from_slice(&body).map_err(|source| ClientError::Decode {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path, success = envelope.success, "api: response received");
        Ok(envelope)
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
