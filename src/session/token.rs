//! Session Token Persistence
//!
//! The token survives process restarts so a signed-in session can be
//! restored without asking for credentials again.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name under the state directory holding the persisted token.
pub const TOKEN_FILE: &str = "session_token";

/// An opaque bearer token issued by the server at sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read token from {path:?}: {error}")]
    Read { path: PathBuf, error: String },

    #[error("Failed to write token to {path:?}: {error}")]
    Write { path: PathBuf, error: String },

    #[error("Failed to clear token at {path:?}: {error}")]
    Clear { path: PathBuf, error: String },
}

/// Where the session token lives between runs.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> Result<Option<SessionToken>, StoreError>;
    async fn save(&self, token: &SessionToken) -> Result<(), StoreError>;
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Persists the token as a single file in the state directory.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: state_dir.into().join(TOKEN_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<SessionToken>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let trimmed = contents.trim();
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(SessionToken::new(trimmed)))
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Read {
                path: self.path.clone(),
                error: e.to_string(),
            }),
        }
    }

    async fn save(&self, token: &SessionToken) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Write {
                    path: self.path.clone(),
                    error: e.to_string(),
                })?;
        }
        tokio::fs::write(&self.path, token.as_str())
            .await
            .map_err(|e| StoreError::Write {
                path: self.path.clone(),
                error: e.to_string(),
            })
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Clear {
                path: self.path.clone(),
                error: e.to_string(),
            }),
        }
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: std::sync::RwLock<Option<SessionToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<SessionToken>, StoreError> {
        Ok(self.token.read().unwrap().clone())
    }

    async fn save(&self, token: &SessionToken) -> Result<(), StoreError> {
        *self.token.write().unwrap() = Some(token.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.token.write().unwrap() = None;
        Ok(())
    }
}
