use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{AsyncCommands, Client as RedisClient};

use super::storage::{PersistedSession, SessionStorage};
use crate::error::{AppError, AppResult};

const DEFAULT_PREFIX: &str = "secov:session";

/// Session storage shared through Redis, one key per session field.
///
/// Every key is written with the remaining lifetime of the session as its TTL,
/// so Redis drops an expired session even if nobody logs out.
#[derive(Clone)]
pub struct RedisStorage {
    redis: Arc<RedisClient>,
    prefix: String,
}

impl RedisStorage {
    pub fn new(redis: RedisClient) -> Self {
        Self {
            redis: Arc::new(redis),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    pub fn open(url: &str) -> AppResult<Self> {
        Ok(Self::new(RedisClient::open(url)?))
    }

    /// Namespaces the keys, e.g. per operator workstation.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn key(&self, field: &str) -> String {
        format!("{}:{}", self.prefix, field)
    }

    fn keys(&self) -> [String; 4] {
        [
            self.key("user"),
            self.key("token"),
            self.key("expires_in"),
            self.key("expires_at"),
        ]
    }
}

#[async_trait]
impl SessionStorage for RedisStorage {
    async fn load(&self) -> AppResult<Option<PersistedSession>> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let values: Vec<Option<String>> = conn.mget(self.keys().to_vec()).await?;

        let [Some(user), Some(token), Some(expires_in), Some(expires_at)] =
            <[Option<String>; 4]>::try_from(values)
                .map_err(|_| AppError::Storage("unexpected MGET reply".to_string()))?
        else {
            return Ok(None);
        };

        let expires_at = DateTime::parse_from_rfc3339(&expires_at)
            .map_err(|e| AppError::Storage(format!("bad expires_at: {e}")))?
            .with_timezone(&Utc);

        Ok(Some(PersistedSession {
            user: serde_json::from_str(&user)?,
            token,
            expires_in: expires_in.parse().unwrap_or_default(),
            expires_at,
        }))
    }

    async fn save(&self, session: &PersistedSession) -> AppResult<()> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let ttl = (session.expires_at - Utc::now()).num_seconds().max(1) as u64;
        let user = serde_json::to_string(&session.user)?;

        let _: () = conn.set_ex(self.key("user"), user, ttl).await?;
        let _: () = conn.set_ex(self.key("token"), session.token.as_str(), ttl).await?;
        let _: () = conn
            .set_ex(self.key("expires_in"), session.expires_in, ttl)
            .await?;
        let _: () = conn
            .set_ex(self.key("expires_at"), session.expires_at.to_rfc3339(), ttl)
            .await?;

        tracing::debug!("Session cached under {}", self.prefix);
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let _: () = conn.del(self.keys().to_vec()).await?;
        Ok(())
    }
}
