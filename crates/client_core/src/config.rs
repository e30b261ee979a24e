use std::{fs, path::Path};

use serde::Deserialize;
use shared::protocol::NewsQuery;
use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_SETTINGS_FILE: &str = "client.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub credential_db_url: String,
    pub news_topic: String,
    pub news_page_size: u32,
    pub request_timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.into(),
            credential_db_url: "sqlite://./data/session.db".into(),
            news_topic: "environment".into(),
            news_page_size: 5,
            request_timeout_secs: 30,
        }
    }
}

impl ClientSettings {
    /// First page of the trending feed fetched when the workspace mounts.
    pub fn news_query(&self) -> NewsQuery {
        NewsQuery {
            topic: self.news_topic.clone(),
            page: 1,
            page_size: self.news_page_size,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    credential_db_url: Option<String>,
    news_topic: Option<String>,
    news_page_size: Option<u32>,
    request_timeout_secs: Option<u64>,
}

pub fn load_settings() -> ClientSettings {
    load_settings_from(Path::new(DEFAULT_SETTINGS_FILE))
}

pub fn load_settings_from(path: &Path) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file_settings(&mut settings, file_cfg),
            Err(err) => warn!("config: ignoring unreadable '{}': {err}", path.display()),
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings.api_base_url = normalize_api_url(&settings.api_base_url);
    settings
}

fn apply_file_settings(settings: &mut ClientSettings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.api_base_url {
        settings.api_base_url = v;
    }
    if let Some(v) = file_cfg.credential_db_url {
        settings.credential_db_url = v;
    }
    if let Some(v) = file_cfg.news_topic {
        settings.news_topic = v;
    }
    if let Some(v) = file_cfg.news_page_size {
        settings.news_page_size = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
}

fn apply_env_overrides(settings: &mut ClientSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("CAMPAIGN_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("APP__API_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = lookup("APP__CREDENTIAL_DB") {
        settings.credential_db_url = v;
    }

    if let Some(v) = lookup("APP__NEWS_TOPIC") {
        settings.news_topic = v;
    }

    if let Some(v) = lookup("APP__NEWS_PAGE_SIZE") {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.news_page_size = parsed;
        }
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
}

fn normalize_api_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return DEFAULT_API_URL.to_string();
    }
    trimmed.to_string()
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
