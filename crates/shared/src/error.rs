use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    RateLimited,
    Internal,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => ErrorCode::Unauthorized,
            403 => ErrorCode::Forbidden,
            404 => ErrorCode::NotFound,
            400 | 409 | 422 => ErrorCode::Validation,
            429 => ErrorCode::RateLimited,
            _ => ErrorCode::Internal,
        }
    }

    pub fn is_auth(self) -> bool {
        matches!(self, ErrorCode::Unauthorized | ErrorCode::Forbidden)
    }
}

/// Failure reported by the backend with a non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code:?} ({status}): {}", .message.as_deref().unwrap_or("no message"))]
pub struct ApiError {
    pub status: u16,
    pub code: ErrorCode,
    pub message: Option<String>,
}

impl ApiError {
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        Self {
            status,
            code: ErrorCode::from_status(status),
            message,
        }
    }
}

/// A 2xx envelope that reported `success: false`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("request rejected: {}", .message.as_deref().unwrap_or("no message"))]
pub struct Rejection {
    pub message: Option<String>,
}
