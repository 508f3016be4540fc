use std::sync::Arc;

use client::{PersonLookup, ResourceClient};
use config::Config;
use error::AppResult;
use routes::RouteTable;
use session::{FileStorage, RedisStorage, SessionStorage, SessionStore};

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod entity;
pub mod error;
pub mod form;
pub mod guard;
pub mod list;
pub mod notify;
pub mod routes;
pub mod session;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub client: ResourceClient,
    pub session: SessionStore,
    pub routes: Arc<RouteTable>,
    pub person_lookup: Option<PersonLookup>,
}

impl AppState {
    /// Wires the client, session store and lookup around the given storage.
    pub fn new(config: Config, storage: Arc<dyn SessionStorage>) -> AppResult<Self> {
        let client = ResourceClient::new(&config)?;
        let session = SessionStore::new(client.clone(), storage, config.session_ttl());
        let person_lookup = config
            .person_api_url
            .as_ref()
            .map(|url| PersonLookup::new(url.as_str(), config.request_timeout()));

        Ok(Self {
            config,
            client,
            session,
            routes: Arc::new(RouteTable::secov()),
            person_lookup,
        })
    }

    /// Persists the session in Redis when `SECOV_REDIS_URL` is set, else on disk.
    pub fn from_config(config: Config) -> AppResult<Self> {
        let storage: Arc<dyn SessionStorage> = match &config.redis_url {
            Some(url) => {
                tracing::debug!("Keeping the session in redis");
                Arc::new(RedisStorage::open(url)?)
            }
            None => Arc::new(FileStorage::new(config.session_file.clone())),
        };
        Self::new(config, storage)
    }
}
