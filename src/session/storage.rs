use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::models::UserRecord;
use crate::error::AppResult;

/// Durable form of a session, stored under the `user`, `token`,
/// `expires_in` and `expires_at` keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub user: UserRecord,
    pub token: String,
    pub expires_in: u64,
    pub expires_at: DateTime<Utc>,
}

/// Where the session store keeps its state between runs.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn load(&self) -> AppResult<Option<PersistedSession>>;
    async fn save(&self, session: &PersistedSession) -> AppResult<()>;
    async fn clear(&self) -> AppResult<()>;
}

/// Process local storage, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<PersistedSession>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: PersistedSession) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
        }
    }

    pub fn snapshot(&self) -> Option<PersistedSession> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn load(&self) -> AppResult<Option<PersistedSession>> {
        Ok(self.snapshot())
    }

    async fn save(&self, session: &PersistedSession) -> AppResult<()> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).take();
        Ok(())
    }
}

/// JSON file on disk, used by the command line front end.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SessionStorage for FileStorage {
    async fn load(&self) -> AppResult<Option<PersistedSession>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn save(&self, session: &PersistedSession) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_vec_pretty(session)?;
        tokio::fs::write(&self.path, json).await?;
        tracing::debug!("Session written to {}", self.path.display());
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
