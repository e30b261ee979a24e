//! Session credential lifecycle.
//!
//! The bearer credential is owned by an explicit [`SessionContext`] that the
//! gateway client consults before every request, so a credential written by
//! login is honoured by clients constructed earlier.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use storage::{Storage, SESSION_TOKEN_KEY};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::ClientError;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load(&self) -> Result<Option<String>>;
    async fn store(&self, token: &str) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<Option<String>> {
        Ok(self.token.read().await.clone())
    }

    async fn store(&self, token: &str) -> Result<()> {
        *self.token.write().await = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.token.write().await.take();
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for Storage {
    async fn load(&self) -> Result<Option<String>> {
        self.load_credential(SESSION_TOKEN_KEY).await
    }

    async fn store(&self, token: &str) -> Result<()> {
        self.save_credential(SESSION_TOKEN_KEY, token).await
    }

    async fn clear(&self) -> Result<()> {
        self.clear_credential(SESSION_TOKEN_KEY).await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn CredentialStore>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCredentialStore::new()))
    }

    /// Current bearer value. A store that cannot be read is treated as
    /// holding no credential; the request then goes out unauthenticated.
    pub async fn bearer(&self) -> Option<String> {
        match self.store.load().await {
            Ok(token) => token.filter(|token| !token.trim().is_empty()),
            Err(err) => {
                warn!("session: credential lookup failed: {err:#}");
                None
            }
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        self.bearer().await.is_some()
    }

    pub async fn establish(&self, token: &str) -> Result<(), ClientError> {
        self.store.store(token).await.map_err(ClientError::Credential)?;
        info!("session: credential established");
        Ok(())
    }

    pub async fn invalidate(&self) -> Result<(), ClientError> {
        self.store.clear().await.map_err(ClientError::Credential)?;
        info!("session: credential invalidated");
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
