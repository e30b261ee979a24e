//! Client core for the campaign dashboard: the authenticated gateway to the
//! campaign backend and the workspace controller that drives the dashboard.

pub mod config;
pub mod error;
pub mod provider;
pub mod session;
pub mod transport;
pub mod workspace;

pub use config::{load_settings, load_settings_from, ClientSettings, DEFAULT_API_URL};
pub use error::{ClientError, ErrorCategory, ValidationError, WorkspaceError};
pub use provider::{ContentProvider, LocalContentProvider, NewsFeed, RemoteContentProvider};
pub use session::{CredentialStore, MemoryCredentialStore, SessionContext};
pub use transport::ApiClient;
pub use workspace::{
    failure_notice, CampaignExport, MountSummary, Notice, NoticeLevel, Operation, Workspace,
    WorkspaceEvent, WorkspaceSnapshot,
};

#[cfg(test)]
#[path = "tests/fake_backend.rs"]
mod fake_backend;
