use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub api_base_url: String,
    pub person_api_url: Option<String>,
    pub request_timeout_secs: u64,
    pub session_file: PathBuf,
    pub redis_url: Option<String>,
    pub per_page: u32,
    pub session_ttl_secs: u64,
}

impl Config {
    /// Configuration for the given backend with defaults for everything else.
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            person_api_url: None,
            request_timeout_secs: 30,
            session_file: PathBuf::from(".secov/session.json"),
            redis_url: None,
            per_page: 10,
            session_ttl_secs: 3600,
        }
    }

    pub fn from_env() -> Result<Self, AppError> {
        dotenv::dotenv().ok();

        let api_base_url = env::var("SECOV_API_URL")
            .map_err(|_| AppError::Config("SECOV_API_URL is not set".to_string()))?;
        let mut config = Self::new(api_base_url);

        config.person_api_url = optional("SECOV_PERSON_API_URL");
        config.redis_url = optional("SECOV_REDIS_URL");
        if let Some(path) = optional("SECOV_SESSION_FILE") {
            config.session_file = PathBuf::from(path);
        }
        if let Some(timeout) = optional("SECOV_REQUEST_TIMEOUT") {
            config.request_timeout_secs = timeout
                .trim_end_matches('s')
                .parse()
                .unwrap_or(config.request_timeout_secs);
        }
        if let Some(per_page) = optional("SECOV_PER_PAGE") {
            config.per_page = per_page.parse().unwrap_or(config.per_page);
        }
        if let Some(ttl) = optional("SECOV_SESSION_TTL") {
            config.session_ttl_secs = ttl.parse().unwrap_or(config.session_ttl_secs);
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
