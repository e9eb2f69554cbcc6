//! Durable persistence for the session token pair.
//!
//! The client owns token state in memory; a [`TokenStore`] is the seam to
//! whatever durable key-value storage the host platform provides. Store
//! failures degrade to the unauthenticated state and never fail a remote
//! call.

use anyhow::Context;
use async_trait::async_trait;
use entrega_core::models::auth::StoredSession;
use std::path::PathBuf;
use tokio::sync::Mutex;

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> anyhow::Result<Option<StoredSession>>;

    async fn save(&self, session: &StoredSession) -> anyhow::Result<()>;

    async fn clear(&self) -> anyhow::Result<()>;
}

/// Token store backed by a JSON file.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> anyhow::Result<Option<StoredSession>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let session = serde_json::from_slice(&bytes)
                    .with_context(|| format!("corrupt session file {}", self.path.display()))?;
                Ok(Some(session))
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => {
                Err(error).with_context(|| format!("reading {}", self.path.display()))
            }
        }
    }

    async fn save(&self, session: &StoredSession) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let bytes = serde_json::to_vec_pretty(session)?;
        tokio::fs::write(&self.path, bytes)
            .await
            .with_context(|| format!("writing {}", self.path.display()))
    }

    async fn clear(&self) -> anyhow::Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => {
                Err(error).with_context(|| format!("removing {}", self.path.display()))
            }
        }
    }
}

/// In-memory token store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryTokenStore {
    session: Mutex<Option<StoredSession>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a session already persisted, as after a previous run.
    pub fn with_session(session: StoredSession) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> anyhow::Result<Option<StoredSession>> {
        Ok(self.session.lock().await.clone())
    }

    async fn save(&self, session: &StoredSession) -> anyhow::Result<()> {
        *self.session.lock().await = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        *self.session.lock().await = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> StoredSession {
        StoredSession {
            access_token: Some("acceso-1".to_string()),
            refresh_token: Some("refresco-1".to_string()),
            role: Some("cliente".to_string()),
        }
    }

    #[tokio::test]
    async fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("sesion.json"));

        assert!(store.load().await.unwrap().is_none());

        store.save(&session()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(session()));

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_store_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("anidado/profundo/sesion.json"));

        store.save(&session()).await.unwrap();
        assert!(store.load().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn clearing_a_missing_file_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("sesion.json"));
        store.clear().await.unwrap();
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sesion.json");
        tokio::fs::write(&path, b"esto no es json").await.unwrap();

        let store = FileTokenStore::new(path);
        assert!(store.load().await.is_err());
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryTokenStore::new();
        assert!(store.load().await.unwrap().is_none());

        store.save(&session()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(session()));

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }
}
