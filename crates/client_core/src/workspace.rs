//! Campaign workspace controller.
//!
//! Holds the dashboard state for one user and sequences every user action
//! against a [`ContentProvider`]. State is only mutated after the provider
//! confirms an operation, and completions are matched to campaigns by id, so
//! overlapping operations can finish in any order.

use std::{collections::HashMap, sync::Arc};

use shared::{
    domain::{CampaignId, SocialPlatform, Template},
    protocol::{Campaign, NewsItem, NewsQuery},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::{
    error::{ErrorCategory, ValidationError, WorkspaceError},
    provider::ContentProvider,
    session::SessionContext,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// User-facing outcome of an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

impl Notice {
    fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            description: description.into(),
        }
    }

    fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceEvent {
    Notice(Notice),
    /// The session ended; front ends leave the workspace view.
    LoggedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Generate,
    Regenerate,
    Save,
    Load,
    Delete,
    Download,
    FetchNews,
    FetchCampaigns,
    Logout,
}

impl Operation {
    fn name(self) -> &'static str {
        match self {
            Operation::Generate => "generate",
            Operation::Regenerate => "regenerate",
            Operation::Save => "save",
            Operation::Load => "load",
            Operation::Delete => "delete",
            Operation::Download => "download",
            Operation::FetchNews => "fetch_news",
            Operation::FetchCampaigns => "fetch_campaigns",
            Operation::Logout => "logout",
        }
    }

    fn failure_title(self) -> &'static str {
        match self {
            Operation::Generate => "Generation failed",
            Operation::Regenerate => "Regeneration failed",
            Operation::Save => "Update failed",
            Operation::Load => "Loading failed",
            Operation::Delete => "Deletion failed",
            Operation::Download => "Download failed",
            Operation::FetchNews => "News unavailable",
            Operation::FetchCampaigns => "Campaigns unavailable",
            Operation::Logout => "Logout failed",
        }
    }

    fn fallback_description(self) -> &'static str {
        match self {
            Operation::Generate => {
                "There was an error generating your content. Please try again."
            }
            Operation::Regenerate => {
                "There was an error regenerating your content. Please try again."
            }
            Operation::Save => "There was an error saving your changes. Please try again.",
            Operation::Load => "There was an error loading the campaign. Please try again.",
            Operation::Delete => "There was an error deleting the campaign. Please try again.",
            Operation::Download => "There was an error exporting the campaign. Please try again.",
            Operation::FetchNews => "Trending news could not be loaded.",
            Operation::FetchCampaigns => "Your campaigns could not be loaded.",
            Operation::Logout => "There was an error logging out. Please try again.",
        }
    }
}

/// Builds the notice shown for a failed action.
pub fn failure_notice(operation: Operation, err: &WorkspaceError) -> Notice {
    match err.validation() {
        Some(ValidationError::EmptyTopic) => {
            return Notice::error(
                "Topic required",
                "Please enter a topic for your awareness campaign.",
            )
        }
        Some(ValidationError::NoCampaignSelected) => {
            return Notice::error("No campaign selected", "Please generate a campaign first.")
        }
        None => {}
    }

    let description = match err.category() {
        ErrorCategory::Auth => {
            return Notice::error("Session expired", "Please sign in again to continue.")
        }
        ErrorCategory::Application => err
            .client()
            .and_then(|client| client.server_message())
            .unwrap_or(operation.fallback_description()),
        ErrorCategory::Validation | ErrorCategory::Transport => operation.fallback_description(),
    };
    Notice::error(operation.failure_title(), description)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignExport {
    pub file_name: String,
    pub contents: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountSummary {
    pub news_loaded: bool,
    pub campaigns_loaded: bool,
}

/// Read-only copy of the workspace state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceSnapshot {
    pub topic: String,
    pub current_campaign: Option<Campaign>,
    pub draft: String,
    pub image_url: Option<String>,
    pub is_generating: bool,
    pub template: Template,
    pub menu_open: bool,
    pub campaigns: Vec<Campaign>,
    pub news: Vec<NewsItem>,
    pub authenticated: bool,
}

#[derive(Debug, Default)]
struct WorkspaceState {
    topic: String,
    current: Option<Campaign>,
    draft: String,
    image_url: Option<String>,
    generations_in_flight: usize,
    template: Template,
    menu_open: bool,
    campaigns: Vec<Campaign>,
    news: Vec<NewsItem>,
    // Bumped on logout; completions from an earlier session are dropped.
    session_epoch: u64,
    // Local list writes, stamped so a list fetch issued earlier can be
    // merged instead of overwriting them.
    write_seq: u64,
    touched: HashMap<CampaignId, u64>,
    removed: HashMap<CampaignId, u64>,
    list_fetches_in_flight: usize,
}

impl WorkspaceState {
    fn current_id(&self) -> Option<CampaignId> {
        self.current.as_ref().map(|campaign| campaign.id.clone())
    }

    fn is_current(&self, id: &CampaignId) -> bool {
        self.current
            .as_ref()
            .is_some_and(|campaign| campaign.id == *id)
    }

    fn show(&mut self, campaign: &Campaign) {
        self.current = Some(campaign.clone());
        self.draft = campaign.text.clone();
        self.image_url = campaign.image_url.clone();
    }

    fn clear_current(&mut self) {
        self.current = None;
        self.draft.clear();
        self.image_url = None;
    }

    fn mark_touched(&mut self, id: &CampaignId) {
        self.write_seq += 1;
        self.removed.remove(id);
        self.touched.insert(id.clone(), self.write_seq);
    }

    fn mark_removed(&mut self, id: &CampaignId) {
        self.write_seq += 1;
        self.touched.remove(id);
        self.removed.insert(id.clone(), self.write_seq);
    }

    /// Moves `campaign` to the head of the list, dropping any entry with the
    /// same id.
    fn upsert_front(&mut self, campaign: Campaign) {
        self.mark_touched(&campaign.id);
        self.campaigns.retain(|existing| existing.id != campaign.id);
        self.campaigns.insert(0, campaign);
    }

    /// Replaces the entry with the same id in place; returns whether one existed.
    fn replace_entry(&mut self, campaign: &Campaign) -> bool {
        self.mark_touched(&campaign.id);
        let mut found = false;
        for entry in self
            .campaigns
            .iter_mut()
            .filter(|entry| entry.id == campaign.id)
        {
            *entry = campaign.clone();
            found = true;
        }
        found
    }

    fn remove_entry(&mut self, id: &CampaignId) {
        self.mark_removed(id);
        self.campaigns.retain(|campaign| campaign.id != *id);
        if self.is_current(id) {
            self.clear_current();
        }
    }

    /// Applies a server listing taken when `write_seq` was `issued_at`.
    /// Entries written or removed locally since then keep their local state;
    /// the current campaign is cleared if it no longer appears.
    fn merge_listing(&mut self, listed: Vec<Campaign>, issued_at: u64) {
        let since = |stamps: &HashMap<CampaignId, u64>, id: &CampaignId| {
            stamps.get(id).is_some_and(|seq| *seq > issued_at)
        };

        let mut merged = Vec::with_capacity(listed.len());
        for campaign in listed {
            if since(&self.removed, &campaign.id) {
                continue;
            }
            let local = since(&self.touched, &campaign.id)
                .then(|| self.campaigns.iter().find(|entry| entry.id == campaign.id))
                .flatten();
            merged.push(local.cloned().unwrap_or(campaign));
        }

        let mut campaigns: Vec<Campaign> = self
            .campaigns
            .iter()
            .filter(|entry| since(&self.touched, &entry.id))
            .filter(|entry| !merged.iter().any(|listed| listed.id == entry.id))
            .cloned()
            .collect();
        campaigns.extend(merged);
        self.campaigns = campaigns;

        if let Some(id) = self.current_id() {
            if !self.campaigns.iter().any(|campaign| campaign.id == id) {
                self.clear_current();
            }
        }
    }

    fn finish_list_fetch(&mut self) {
        self.list_fetches_in_flight = self.list_fetches_in_flight.saturating_sub(1);
        if self.list_fetches_in_flight == 0 {
            self.touched.clear();
            self.removed.clear();
        }
    }

    fn snapshot(&self, authenticated: bool) -> WorkspaceSnapshot {
        WorkspaceSnapshot {
            topic: self.topic.clone(),
            current_campaign: self.current.clone(),
            draft: self.draft.clone(),
            image_url: self.image_url.clone(),
            is_generating: self.generations_in_flight > 0,
            template: self.template,
            menu_open: self.menu_open,
            campaigns: self.campaigns.clone(),
            news: self.news.clone(),
            authenticated,
        }
    }
}

pub struct Workspace {
    provider: Arc<dyn ContentProvider>,
    session: SessionContext,
    news_query: NewsQuery,
    inner: Mutex<WorkspaceState>,
    events: broadcast::Sender<WorkspaceEvent>,
}

impl Workspace {
    pub fn new(
        provider: Arc<dyn ContentProvider>,
        session: SessionContext,
        news_query: NewsQuery,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            provider,
            session,
            news_query,
            inner: Mutex::new(WorkspaceState::default()),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<WorkspaceEvent> {
        self.events.subscribe()
    }

    /// `authenticated` reflects the session at the time of the call, so a
    /// login made directly through the gateway client shows up here.
    pub async fn snapshot(&self) -> WorkspaceSnapshot {
        let authenticated = self.session.is_authenticated().await;
        self.inner.lock().await.snapshot(authenticated)
    }

    /// Initial population: the news feed and the campaign list are fetched
    /// concurrently and fail independently.
    pub async fn mount(&self) -> MountSummary {
        let authenticated = self.session.is_authenticated().await;

        let query = self.news_query.clone();
        let (news, campaigns) =
            futures::join!(self.refresh_news(&query), self.refresh_campaigns());
        let summary = MountSummary {
            news_loaded: news.is_ok(),
            campaigns_loaded: campaigns.is_ok(),
        };
        info!(
            news_loaded = summary.news_loaded,
            campaigns_loaded = summary.campaigns_loaded,
            authenticated,
            "workspace: mounted"
        );
        summary
    }

    /// Replaces the news feed wholesale. Failures leave the previous feed.
    pub async fn refresh_news(&self, query: &NewsQuery) -> Result<usize, WorkspaceError> {
        let epoch = self.inner.lock().await.session_epoch;
        match self.provider.trending_news(query).await {
            Ok(feed) => {
                let mut guard = self.inner.lock().await;
                if guard.session_epoch != epoch {
                    return Ok(0);
                }
                let count = feed.items.len();
                guard.news = feed.items;
                Ok(count)
            }
            Err(err) => {
                warn!(topic = %query.topic, "workspace: news fetch failed: {err}");
                Err(err.into())
            }
        }
    }

    /// Replaces the campaign list with the server's listing, keeping local
    /// writes that completed while the fetch was in flight. Failures leave
    /// the previous list.
    pub async fn refresh_campaigns(&self) -> Result<usize, WorkspaceError> {
        let (epoch, issued_at) = {
            let mut guard = self.inner.lock().await;
            guard.list_fetches_in_flight += 1;
            (guard.session_epoch, guard.write_seq)
        };
        let result = self.provider.list().await;

        let mut guard = self.inner.lock().await;
        if guard.session_epoch != epoch {
            return result.map(|_| 0).map_err(WorkspaceError::from);
        }
        match result {
            Ok(campaigns) => {
                guard.merge_listing(campaigns, issued_at);
                guard.finish_list_fetch();
                Ok(guard.campaigns.len())
            }
            Err(err) => {
                guard.finish_list_fetch();
                drop(guard);
                warn!("workspace: campaign list fetch failed: {err}");
                Err(err.into())
            }
        }
    }

    pub async fn set_topic(&self, topic: impl Into<String>) {
        self.inner.lock().await.topic = topic.into();
    }

    /// Edits the local draft. The draft may diverge from the saved campaign
    /// text until [`Workspace::save`] succeeds.
    pub async fn edit_draft(&self, text: impl Into<String>) {
        self.inner.lock().await.draft = text.into();
    }

    pub async fn select_template(&self, template: Template) {
        self.inner.lock().await.template = template;
    }

    pub async fn toggle_menu(&self) -> bool {
        let mut guard = self.inner.lock().await;
        guard.menu_open = !guard.menu_open;
        guard.menu_open
    }

    pub async fn generate(&self) -> Result<Campaign, WorkspaceError> {
        let (topic, epoch) = {
            let mut guard = self.inner.lock().await;
            if guard.topic.trim().is_empty() {
                drop(guard);
                return Err(self.fail(Operation::Generate, ValidationError::EmptyTopic.into()));
            }
            guard.generations_in_flight += 1;
            (guard.topic.clone(), guard.session_epoch)
        };

        info!(topic = %topic, "workspace: generating campaign");
        let result = self.provider.generate(&topic).await;

        let mut guard = self.inner.lock().await;
        if guard.session_epoch != epoch {
            drop(guard);
            return Self::stale(Operation::Generate, result);
        }
        guard.generations_in_flight = guard.generations_in_flight.saturating_sub(1);

        match result {
            Ok(campaign) => {
                guard.show(&campaign);
                guard.upsert_front(campaign.clone());
                drop(guard);
                info!(campaign_id = %campaign.id, "workspace: campaign generated");
                self.notify(Notice::info(
                    "Content generated",
                    "Your awareness campaign has been created successfully.",
                ));
                Ok(campaign)
            }
            Err(err) => {
                drop(guard);
                Err(self.fail(Operation::Generate, err.into()))
            }
        }
    }

    /// Replaces the text of the current campaign with a fresh version. Id,
    /// topic and image are kept.
    pub async fn regenerate(&self) -> Result<Campaign, WorkspaceError> {
        let (id, epoch) = {
            let guard = self.inner.lock().await;
            match guard.current_id() {
                Some(id) => (id, guard.session_epoch),
                None => {
                    drop(guard);
                    return Err(self.fail(
                        Operation::Regenerate,
                        ValidationError::NoCampaignSelected.into(),
                    ));
                }
            }
        };

        self.notify(Notice::info(
            "Regenerating content",
            "Creating a new version of your campaign...",
        ));
        info!(campaign_id = %id, "workspace: regenerating campaign");
        let result = self.provider.regenerate(&id).await;

        let regenerated = match result {
            Ok(regenerated) => regenerated,
            Err(err) => return Err(self.fail(Operation::Regenerate, err.into())),
        };

        let mut guard = self.inner.lock().await;
        if guard.session_epoch != epoch {
            return Ok(regenerated);
        }

        guard.mark_touched(&id);
        let mut applied = None;
        for entry in guard.campaigns.iter_mut().filter(|entry| entry.id == id) {
            entry.text = regenerated.text.clone();
            applied = Some(entry.clone());
        }
        if guard.is_current(&id) {
            if let Some(current) = guard.current.as_mut() {
                current.text = regenerated.text.clone();
                applied = Some(current.clone());
            }
            guard.draft = regenerated.text.clone();
        }
        drop(guard);

        self.notify(Notice::info(
            "Content regenerated",
            "Your campaign has been updated with new content.",
        ));
        Ok(applied.unwrap_or(regenerated))
    }

    /// Sends the full draft of the current campaign. Without a current
    /// campaign this does nothing.
    pub async fn save(&self) -> Result<Option<Campaign>, WorkspaceError> {
        let (id, draft, epoch) = {
            let guard = self.inner.lock().await;
            match guard.current_id() {
                Some(id) => (id, guard.draft.clone(), guard.session_epoch),
                None => return Ok(None),
            }
        };

        info!(campaign_id = %id, "workspace: saving campaign text");
        let saved = match self.provider.update(&id, &draft).await {
            Ok(saved) => saved,
            Err(err) => return Err(self.fail(Operation::Save, err.into())),
        };

        let mut guard = self.inner.lock().await;
        if guard.session_epoch != epoch {
            return Ok(Some(saved));
        }
        guard.replace_entry(&saved);
        if guard.is_current(&saved.id) {
            guard.current = Some(saved.clone());
        }
        drop(guard);

        self.notify(Notice::info(
            "Campaign updated",
            "Your changes have been saved successfully.",
        ));
        Ok(Some(saved))
    }

    pub async fn delete(&self, id: &CampaignId) -> Result<(), WorkspaceError> {
        let epoch = self.inner.lock().await.session_epoch;

        info!(campaign_id = %id, "workspace: deleting campaign");
        if let Err(err) = self.provider.delete(id).await {
            return Err(self.fail(Operation::Delete, err.into()));
        }

        let mut guard = self.inner.lock().await;
        if guard.session_epoch != epoch {
            return Ok(());
        }
        guard.remove_entry(id);
        drop(guard);

        self.notify(Notice::info(
            "Campaign deleted",
            "Your campaign has been deleted successfully.",
        ));
        Ok(())
    }

    /// Shows the canonical copy of a campaign. Unsaved edits to the draft are
    /// discarded without warning.
    pub async fn load(&self, id: &CampaignId) -> Result<Campaign, WorkspaceError> {
        let epoch = self.inner.lock().await.session_epoch;

        info!(campaign_id = %id, "workspace: loading campaign");
        let campaign = match self.provider.get(id).await {
            Ok(campaign) => campaign,
            Err(err) => return Err(self.fail(Operation::Load, err.into())),
        };

        let mut guard = self.inner.lock().await;
        if guard.session_epoch != epoch {
            return Ok(campaign);
        }
        guard.topic = campaign.topic.clone();
        guard.show(&campaign);
        if !guard.replace_entry(&campaign) {
            guard.upsert_front(campaign.clone());
        }
        Ok(campaign)
    }

    /// Plain-text export of the current campaign.
    pub async fn download(&self) -> Result<CampaignExport, WorkspaceError> {
        let current = self.inner.lock().await.current.clone();
        let Some(campaign) = current else {
            return Err(self.fail(
                Operation::Download,
                ValidationError::NoCampaignSelected.into(),
            ));
        };

        let export = CampaignExport {
            file_name: format!("{}-campaign.txt", topic_slug(&campaign.topic)),
            contents: campaign.text,
        };
        self.notify(Notice::info(
            "Campaign downloaded",
            "Your campaign has been downloaded as a text file.",
        ));
        Ok(export)
    }

    pub async fn share(&self, platform: SocialPlatform) {
        self.notify(Notice::info(
            format!("Shared to {}", platform.name()),
            "Your campaign has been shared successfully.",
        ));
    }

    pub async fn apply_template(&self) -> Template {
        let template = self.inner.lock().await.template;
        self.notify(Notice::info(
            "Template applied",
            format!(
                "The {} template has been applied to your campaign.",
                template.name()
            ),
        ));
        template
    }

    /// Ends the session: clears the stored credential and resets the
    /// workspace. Requests still in flight complete against a new epoch and
    /// are ignored.
    pub async fn logout(&self) -> Result<(), WorkspaceError> {
        if let Err(err) = self.session.invalidate().await {
            return Err(self.fail(Operation::Logout, err.into()));
        }

        {
            let mut guard = self.inner.lock().await;
            let session_epoch = guard.session_epoch + 1;
            *guard = WorkspaceState {
                session_epoch,
                ..WorkspaceState::default()
            };
        }

        info!("workspace: logged out");
        let _ = self.events.send(WorkspaceEvent::LoggedOut);
        Ok(())
    }

    fn notify(&self, notice: Notice) {
        let _ = self.events.send(WorkspaceEvent::Notice(notice));
    }

    fn fail(&self, operation: Operation, err: WorkspaceError) -> WorkspaceError {
        warn!(
            operation = operation.name(),
            category = ?err.category(),
            "workspace: action failed: {err}"
        );
        self.notify(failure_notice(operation, &err));
        err
    }

    fn stale(
        operation: Operation,
        result: Result<Campaign, crate::error::ClientError>,
    ) -> Result<Campaign, WorkspaceError> {
        info!(
            operation = operation.name(),
            "workspace: dropping completion from an ended session"
        );
        result.map_err(WorkspaceError::from)
    }
}

fn topic_slug(topic: &str) -> String {
    topic
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

#[cfg(test)]
#[path = "tests/workspace_tests.rs"]
mod tests;
