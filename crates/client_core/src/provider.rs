//! Content provider seam between the workspace and whatever produces
//! campaigns: the remote backend or a deterministic in-process stub.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use shared::{
    domain::CampaignId,
    protocol::{Campaign, NewsItem, NewsQuery, NewsSource, NewsTopic},
};
use tokio::sync::Mutex;
use tracing::debug;

use crate::{error::ClientError, transport::ApiClient};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsFeed {
    pub items: Vec<NewsItem>,
    pub total_results: Option<u64>,
}

#[async_trait]
pub trait ContentProvider: Send + Sync {
    async fn generate(&self, topic: &str) -> Result<Campaign, ClientError>;
    async fn list(&self) -> Result<Vec<Campaign>, ClientError>;
    async fn get(&self, id: &CampaignId) -> Result<Campaign, ClientError>;
    async fn update(&self, id: &CampaignId, text: &str) -> Result<Campaign, ClientError>;
    async fn delete(&self, id: &CampaignId) -> Result<(), ClientError>;
    async fn regenerate(&self, id: &CampaignId) -> Result<Campaign, ClientError>;
    async fn trending_news(&self, query: &NewsQuery) -> Result<NewsFeed, ClientError>;
    async fn topics(&self) -> Result<Vec<NewsTopic>, ClientError>;
}

pub struct RemoteContentProvider {
    api: ApiClient,
}

impl RemoteContentProvider {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }
}

#[async_trait]
impl ContentProvider for RemoteContentProvider {
    async fn generate(&self, topic: &str) -> Result<Campaign, ClientError> {
        self.api
            .generate_campaign(topic)
            .await?
            .into_payload()?
            .campaign
            .ok_or(ClientError::MissingField("campaign"))
    }

    async fn list(&self) -> Result<Vec<Campaign>, ClientError> {
        self.api
            .list_campaigns()
            .await?
            .into_payload()?
            .campaigns
            .ok_or(ClientError::MissingField("campaigns"))
    }

    async fn get(&self, id: &CampaignId) -> Result<Campaign, ClientError> {
        self.api
            .get_campaign(id)
            .await?
            .into_payload()?
            .campaign
            .ok_or(ClientError::MissingField("campaign"))
    }

    async fn update(&self, id: &CampaignId, text: &str) -> Result<Campaign, ClientError> {
        self.api
            .update_campaign(id, text)
            .await?
            .into_payload()?
            .campaign
            .ok_or(ClientError::MissingField("campaign"))
    }

    async fn delete(&self, id: &CampaignId) -> Result<(), ClientError> {
        self.api.delete_campaign(id).await?.into_payload()?;
        Ok(())
    }

    async fn regenerate(&self, id: &CampaignId) -> Result<Campaign, ClientError> {
        self.api
            .regenerate_campaign(id)
            .await?
            .into_payload()?
            .campaign
            .ok_or(ClientError::MissingField("campaign"))
    }

    async fn trending_news(&self, query: &NewsQuery) -> Result<NewsFeed, ClientError> {
        let payload = self.api.trending_news(query).await?.into_payload()?;
        Ok(NewsFeed {
            items: payload.news.ok_or(ClientError::MissingField("news"))?,
            total_results: payload.total_results,
        })
    }

    async fn topics(&self) -> Result<Vec<NewsTopic>, ClientError> {
        self.api
            .news_topics()
            .await?
            .into_payload()?
            .topics
            .ok_or(ClientError::MissingField("topics"))
    }
}

const LOCAL_EPOCH_SECS: i64 = 1_741_132_800;

#[derive(Default)]
struct LocalState {
    issued: u64,
    campaigns: Vec<Campaign>,
}

impl LocalState {
    fn tick(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    fn find_mut(&mut self, id: &CampaignId) -> Result<&mut Campaign, ClientError> {
        self.campaigns
            .iter_mut()
            .find(|campaign| campaign.id == *id)
            .ok_or_else(|| ClientError::rejected("Campaign not found"))
    }
}

/// Deterministic stand-in for the backend. Ids are `local-1`, `local-2`, …
/// and timestamps advance one minute per write from a fixed origin.
#[derive(Default)]
pub struct LocalContentProvider {
    state: Mutex<LocalState>,
}

impl LocalContentProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

fn local_timestamp(tick: u64) -> DateTime<Utc> {
    DateTime::from_timestamp(LOCAL_EPOCH_SECS, 0).unwrap_or_default()
        + Duration::minutes(tick as i64)
}

fn placeholder_image(topic: &str) -> String {
    let text: String = url::form_urlencoded::byte_serialize(topic.as_bytes()).collect();
    format!("https://via.placeholder.com/600x400?text={text}")
}

fn campaign_text(topic: &str, revision: u32) -> String {
    let mut text = format!(
        "# {topic} Awareness Campaign\n\n\
         Did you know that {topic} affects millions of people worldwide? \
         It's time to take action and make a difference.\n\n\
         Join our campaign to raise awareness about {topic} and help create positive change in our communities.\n\n\
         ## How You Can Help\n\n\
         1. Share this campaign with your friends and family\n\
         2. Donate to organizations working on {topic}\n\
         3. Volunteer your time to local initiatives\n\n\
         Together, we can make a difference!"
    );
    if revision > 0 {
        text.push_str(&format!("\n\n(Revision {revision})"));
    }
    text
}

fn revision_of(text: &str) -> u32 {
    text.rsplit_once("(Revision ")
        .and_then(|(_, tail)| tail.trim_end_matches(')').parse().ok())
        .unwrap_or(0)
}

#[async_trait]
impl ContentProvider for LocalContentProvider {
    async fn generate(&self, topic: &str) -> Result<Campaign, ClientError> {
        if topic.trim().is_empty() {
            return Err(ClientError::rejected("Topic is required"));
        }
        let mut state = self.state.lock().await;
        let tick = state.tick();
        let created_at = local_timestamp(tick);
        let campaign = Campaign {
            id: CampaignId(format!("local-{tick}")),
            topic: topic.to_string(),
            text: campaign_text(topic, 0),
            image_url: Some(placeholder_image(topic)),
            created_at,
            updated_at: Some(created_at),
            user_id: None,
        };
        state.campaigns.insert(0, campaign.clone());
        debug!(campaign_id = %campaign.id, "local provider: campaign generated");
        Ok(campaign)
    }

    async fn list(&self) -> Result<Vec<Campaign>, ClientError> {
        Ok(self.state.lock().await.campaigns.clone())
    }

    async fn get(&self, id: &CampaignId) -> Result<Campaign, ClientError> {
        let mut state = self.state.lock().await;
        state.find_mut(id).map(|campaign| campaign.clone())
    }

    async fn update(&self, id: &CampaignId, text: &str) -> Result<Campaign, ClientError> {
        let mut state = self.state.lock().await;
        let updated_at = local_timestamp(state.tick());
        let campaign = state.find_mut(id)?;
        campaign.text = text.to_string();
        campaign.updated_at = Some(updated_at);
        Ok(campaign.clone())
    }

    async fn delete(&self, id: &CampaignId) -> Result<(), ClientError> {
        let mut state = self.state.lock().await;
        let before = state.campaigns.len();
        state.campaigns.retain(|campaign| campaign.id != *id);
        if state.campaigns.len() == before {
            return Err(ClientError::rejected("Campaign not found"));
        }
        Ok(())
    }

    async fn regenerate(&self, id: &CampaignId) -> Result<Campaign, ClientError> {
        let mut state = self.state.lock().await;
        let updated_at = local_timestamp(state.tick());
        let campaign = state.find_mut(id)?;
        let revision = revision_of(&campaign.text) + 1;
        campaign.text = campaign_text(&campaign.topic, revision);
        campaign.updated_at = Some(updated_at);
        Ok(campaign.clone())
    }

    async fn trending_news(&self, query: &NewsQuery) -> Result<NewsFeed, ClientError> {
        let items = sample_news();
        let total = items.len() as u64;
        let page_size = query.page_size.max(1) as usize;
        let skip = query.page.saturating_sub(1) as usize * page_size;
        Ok(NewsFeed {
            items: items.into_iter().skip(skip).take(page_size).collect(),
            total_results: Some(total),
        })
    }

    async fn topics(&self) -> Result<Vec<NewsTopic>, ClientError> {
        Ok(TOPIC_CATALOGUE
            .iter()
            .map(|(id, name, icon)| NewsTopic {
                id: (*id).to_string(),
                name: (*name).to_string(),
                icon: (*icon).to_string(),
            })
            .collect())
    }
}

const TOPIC_CATALOGUE: [(&str, &str, &str); 10] = [
    ("environment", "Environment", "leaf"),
    ("climate", "Climate Change", "thermometer"),
    ("health", "Health", "heart"),
    ("education", "Education", "book"),
    ("poverty", "Poverty", "dollar-sign"),
    ("equality", "Equality", "users"),
    ("water", "Clean Water", "droplet"),
    ("energy", "Renewable Energy", "zap"),
    ("wildlife", "Wildlife Conservation", "github"),
    ("ocean", "Ocean Conservation", "anchor"),
];

fn sample_news() -> Vec<NewsItem> {
    [
        (
            "New Climate Change Initiative Launched",
            "Environmental News",
            "2025-03-05T00:00:00Z",
        ),
        (
            "Global Plastic Reduction Campaign Gains Momentum",
            "Green Planet",
            "2025-03-04T00:00:00Z",
        ),
        (
            "Tech Companies Join Forces for Sustainability",
            "Tech Today",
            "2025-03-03T00:00:00Z",
        ),
    ]
    .into_iter()
    .map(|(headline, source, published_at)| NewsItem {
        headline: headline.to_string(),
        source: NewsSource {
            id: None,
            name: source.to_string(),
        },
        published_at: shared::protocol::timestamp::parse(published_at),
        link: "#".to_string(),
        description: None,
        image_url: None,
    })
    .collect()
}

#[cfg(test)]
#[path = "tests/provider_tests.rs"]
mod tests;
