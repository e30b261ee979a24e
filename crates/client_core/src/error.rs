//! Error taxonomy for the gateway client and the workspace controller.

use shared::error::{ApiError, ErrorCode, Rejection};
use thiserror::Error;

/// Failure of a single backend round-trip.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{path} answered with {error}")]
    Status { path: String, error: ApiError },
    #[error("{path} returned an undecodable body: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error("response is missing required field `{0}`")]
    MissingField(&'static str),
    #[error("invalid api base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("credential store failure: {0:#}")]
    Credential(anyhow::Error),
}

impl ClientError {
    pub fn rejected(message: impl Into<String>) -> Self {
        ClientError::Rejected(Rejection {
            message: Some(message.into()),
        })
    }

    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            ClientError::Status { error, .. } => Some(error),
            _ => None,
        }
    }

    /// The backend rejected the bearer credential, or none was sent.
    pub fn is_auth_failure(&self) -> bool {
        self.api_error().is_some_and(|error| error.code.is_auth())
    }

    pub fn is_not_found(&self) -> bool {
        self.api_error()
            .is_some_and(|error| error.code == ErrorCode::NotFound)
    }

    /// Message supplied by the server, either in a rejected envelope or in
    /// the body of a non-2xx response. Workspace notices only show it for
    /// rejected envelopes; non-2xx bodies are for logs and direct callers.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Rejected(rejection) => rejection.message.as_deref(),
            ClientError::Status { error, .. } => error.message.as_deref(),
            _ => None,
        }
    }
}

/// Problems caught before any request is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("topic must not be empty")]
    EmptyTopic,
    #[error("no campaign selected")]
    NoCampaignSelected,
}

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Client(#[from] ClientError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Transport,
    Application,
    Auth,
}

impl WorkspaceError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            WorkspaceError::Validation(_) => ErrorCategory::Validation,
            WorkspaceError::Client(err) if err.is_auth_failure() => ErrorCategory::Auth,
            WorkspaceError::Client(ClientError::Rejected(_) | ClientError::MissingField(_)) => {
                ErrorCategory::Application
            }
            WorkspaceError::Client(_) => ErrorCategory::Transport,
        }
    }

    pub fn requires_reauth(&self) -> bool {
        self.category() == ErrorCategory::Auth
    }

    pub fn validation(&self) -> Option<ValidationError> {
        match self {
            WorkspaceError::Validation(err) => Some(*err),
            WorkspaceError::Client(_) => None,
        }
    }

    pub fn client(&self) -> Option<&ClientError> {
        match self {
            WorkspaceError::Client(err) => Some(err),
            WorkspaceError::Validation(_) => None,
        }
    }
}
