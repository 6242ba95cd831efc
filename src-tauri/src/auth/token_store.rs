//! Persistence for the session token.

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use log::{error, info};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;

use crate::api::AuthToken;
use crate::utils::write_file_replacing;

const TOKEN_FILE_NAME: &str = "auth_token.json";

/// Where the session token survives app restarts.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// The saved token. Read failures are logged and reported as no token.
    async fn get(&self) -> Option<AuthToken>;
    async fn save(&self, token: &AuthToken) -> Result<()>;
    /// Forgets the token. Removing a missing token is not an error.
    async fn remove(&self) -> Result<()>;
}

#[derive(Serialize, Deserialize)]
struct StoredToken {
    token: AuthToken,
}

/// Keeps the token as a small JSON file in the app config directory.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    file_path: PathBuf,
}

impl FileTokenStore {
    pub fn new(config_dir: &Path) -> Self {
        Self {
            file_path: config_dir.join(TOKEN_FILE_NAME),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    async fn read(&self) -> Result<Option<AuthToken>> {
        if !self.file_path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.file_path).await?;
        let stored: StoredToken = serde_json::from_str(&json)?;
        Ok(AuthToken::new(stored.token.as_str()))
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self) -> Option<AuthToken> {
        match self.read().await {
            Ok(token) => token,
            Err(e) => {
                error!("Error retrieving token from {:?}: {}", self.file_path, e);
                None
            }
        }
    }

    async fn save(&self, token: &AuthToken) -> Result<()> {
        let json = serde_json::to_string(&StoredToken {
            token: token.clone(),
        })?;
        if let Err(e) = write_file_replacing(&self.file_path, &json).await {
            error!("Error saving token to {:?}: {:#}", self.file_path, e);
            return Err(e);
        }
        info!("Token saved.");
        Ok(())
    }

    async fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.file_path).await {
            Ok(()) => {
                info!("Token removed.");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                error!("Error removing token at {:?}: {}", self.file_path, e);
                Err(e.into())
            }
        }
    }
}

/// In-process store, for embedding without a config directory and for tests.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<AuthToken>>,
}

impl MemoryTokenStore {
    pub fn new(token: Option<AuthToken>) -> Self {
        Self {
            token: RwLock::new(token),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self) -> Option<AuthToken> {
        self.token.read().await.clone()
    }

    async fn save(&self, token: &AuthToken) -> Result<()> {
        *self.token.write().await = Some(token.clone());
        Ok(())
    }

    async fn remove(&self) -> Result<()> {
        *self.token.write().await = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(raw: &str) -> AuthToken {
        AuthToken::new(raw).unwrap()
    }

    #[tokio::test]
    async fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(&dir.path().join("app"));

        assert_eq!(store.get().await, None);

        store.save(&token("tok-1")).await.unwrap();
        assert_eq!(store.get().await, Some(token("tok-1")));

        // survives a new store instance, like an app restart
        let reopened = FileTokenStore::new(&dir.path().join("app"));
        assert_eq!(reopened.get().await, Some(token("tok-1")));

        reopened.remove().await.unwrap();
        assert_eq!(store.get().await, None);
        reopened.remove().await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_file_reads_as_no_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path());
        fs::write(store.file_path(), "{ not json").await.unwrap();

        assert_eq!(store.get().await, None);
    }

    #[tokio::test]
    async fn memory_store_behaves_like_file_store() {
        let store = MemoryTokenStore::default();
        assert_eq!(store.get().await, None);
        store.save(&token("abc")).await.unwrap();
        assert_eq!(store.get().await, Some(token("abc")));
        store.remove().await.unwrap();
        assert_eq!(store.get().await, None);
    }
}
