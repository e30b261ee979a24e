use super::*;

#[tokio::test]
async fn memory_store_round_trips_credential() {
    let session = SessionContext::in_memory();
    assert!(!session.is_authenticated().await);

    session.establish("token-1").await.expect("establish");
    assert_eq!(session.bearer().await.as_deref(), Some("token-1"));

    session.invalidate().await.expect("invalidate");
    assert_eq!(session.bearer().await, None);
}

#[tokio::test]
async fn blank_credential_counts_as_absent() {
    let session = SessionContext::new(Arc::new(MemoryCredentialStore::with_token("   ")));
    assert_eq!(session.bearer().await, None);
    assert!(!session.is_authenticated().await);
}

#[tokio::test]
async fn clones_share_the_same_credential() {
    let session = SessionContext::in_memory();
    let observer = session.clone();

    session.establish("shared").await.expect("establish");
    assert_eq!(observer.bearer().await.as_deref(), Some("shared"));
}

#[tokio::test]
async fn sqlite_store_backs_the_session() {
    let storage = Storage::new("sqlite::memory:").await.expect("storage");
    let session = SessionContext::new(Arc::new(storage.clone()));

    session.establish("persisted").await.expect("establish");
    assert_eq!(
        storage
            .load_credential(SESSION_TOKEN_KEY)
            .await
            .expect("load")
            .as_deref(),
        Some("persisted")
    );

    session.invalidate().await.expect("invalidate");
    assert!(!session.is_authenticated().await);
}

struct BrokenStore;

#[async_trait]
impl CredentialStore for BrokenStore {
    async fn load(&self) -> Result<Option<String>> {
        anyhow::bail!("disk unavailable")
    }

    async fn store(&self, _token: &str) -> Result<()> {
        anyhow::bail!("disk unavailable")
    }

    async fn clear(&self) -> Result<()> {
        anyhow::bail!("disk unavailable")
    }
}

#[tokio::test]
async fn unreadable_store_means_unauthenticated() {
    let session = SessionContext::new(Arc::new(BrokenStore));
    assert_eq!(session.bearer().await, None);

    let err = session.establish("token").await.expect_err("store fails");
    assert!(matches!(err, ClientError::Credential(_)));
    assert!(err.to_string().contains("disk unavailable"));
}
