//! Who is logged in, for how long, and what happens when that runs out.
//!
//! [`SessionStore`] is the only owner of the session. It moves through
//! `Unknown → Authenticated | Anonymous` once on [`SessionStore::rehydrate`],
//! then between `Anonymous` and `Authenticated` on login, logout and expiry.
//! Route guards and menus observe it through [`SessionStore::subscribe`].

mod redis_store;
pub mod storage;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::api::models::{LoginRequest, LoginResponse, UserRecord};
use crate::client::{ResourceClient, TokenSlot};
use crate::error::{AppError, AppResult};
use crate::utils::{offset_by, resolve_expiry};

pub use redis_store::RedisStorage;
pub use storage::{FileStorage, MemoryStorage, PersistedSession, SessionStorage};

pub const LOGIN_PATH: &str = "auth/login";

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: UserRecord,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl From<PersistedSession> for Session {
    fn from(p: PersistedSession) -> Self {
        Self {
            user: p.user,
            token: p.token,
            expires_at: p.expires_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Rehydration has not finished yet.
    Unknown,
    Anonymous,
    Authenticated(Session),
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(s) => Some(s),
            _ => None,
        }
    }

    pub fn user(&self) -> Option<&UserRecord> {
        self.session().map(|s| &s.user)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

struct Watchdog {
    generation: u64,
    handle: JoinHandle<()>,
}

struct Inner {
    client: ResourceClient,
    token: TokenSlot,
    storage: Arc<dyn SessionStorage>,
    state: watch::Sender<SessionState>,
    watchdog: Mutex<Option<Watchdog>>,
    generation: AtomicU64,
    rehydrated: AtomicBool,
    fallback_ttl: Duration,
}

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl SessionStore {
    pub fn new(
        client: ResourceClient,
        storage: Arc<dyn SessionStorage>,
        fallback_ttl: Duration,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Unknown);
        Self {
            inner: Arc::new(Inner {
                token: client.token_slot(),
                client,
                storage,
                state,
                watchdog: Mutex::new(None),
                generation: AtomicU64::new(0),
                rehydrated: AtomicBool::new(false),
                fallback_ttl,
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn current_user(&self) -> Option<UserRecord> {
        self.state().user().cloned()
    }

    /// Receiver observing every transition, starting from the current state.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Whether an expiry timer is currently armed.
    pub fn watchdog_armed(&self) -> bool {
        lock(&self.inner.watchdog)
            .as_ref()
            .is_some_and(|w| !w.handle.is_finished())
    }

    /// Authenticates against the backend and starts a session.
    ///
    /// A rejected login leaves any existing session untouched.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<Session> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let body = serde_json::to_value(&request)?;

        let response = match self.inner.client.post(LOGIN_PATH, &body).await {
            Ok(v) => v,
            Err(AppError::Backend {
                status,
                message,
                field_errors,
            }) if (400..500).contains(&status) => {
                tracing::info!("Login rejected for {}", username);
                return Err(AppError::Auth {
                    message,
                    field_errors,
                });
            }
            Err(e) => return Err(e),
        };

        let login: LoginResponse = serde_json::from_value(unwrap_data(response))?;
        let now = Utc::now();
        let expires_at = resolve_expiry(now, login.expires_in, &login.token, self.inner.fallback_ttl);
        self.start(login.user, login.token, expires_at).await
    }

    /// Starts a session for an already issued token that lives for `ttl`.
    pub async fn begin(&self, user: UserRecord, token: String, ttl: Duration) -> AppResult<Session> {
        self.start(user, token, offset_by(Utc::now(), ttl)).await
    }

    /// A started session also settles rehydration; a later
    /// [`SessionStore::rehydrate`] keeps it instead of reading storage.
    async fn start(
        &self,
        user: UserRecord,
        token: String,
        expires_at: DateTime<Utc>,
    ) -> AppResult<Session> {
        self.inner.rehydrated.store(true, Ordering::SeqCst);
        let session = Session {
            user,
            token,
            expires_at,
        };
        self.persist(&session).await;

        self.establish(session.clone());
        tracing::info!(
            "Logged in as {} until {}",
            session.user.name,
            session.expires_at.to_rfc3339()
        );
        Ok(session)
    }

    /// Restores the persisted session, once per store.
    ///
    /// The state stays `Unknown` until this returns, so guards report
    /// pending instead of bouncing to the login screen.
    pub async fn rehydrate(&self) -> SessionState {
        if self.inner.rehydrated.swap(true, Ordering::SeqCst) {
            return self.state();
        }
        if !matches!(self.state(), SessionState::Unknown) {
            return self.state();
        }

        match self.inner.storage.load().await {
            Ok(Some(persisted)) if persisted.expires_at > Utc::now() => {
                tracing::info!("Restored session for {}", persisted.user.name);
                self.establish(Session::from(persisted));
            }
            Ok(Some(_)) => {
                tracing::info!("Persisted session has expired");
                self.logout().await;
            }
            Ok(None) => self.logout().await,
            Err(e) => {
                tracing::warn!("Discarding unreadable session: {}", e);
                self.logout().await;
            }
        }
        self.state()
    }

    /// Ends the session. Idempotent and never fails.
    pub async fn logout(&self) {
        let generation = {
            let mut slot = lock(&self.inner.watchdog);
            if let Some(watchdog) = slot.take() {
                watchdog.handle.abort();
            }
            self.inner.generation.load(Ordering::SeqCst)
        };
        self.clear(generation).await;
    }

    async fn persist(&self, session: &Session) {
        let persisted = PersistedSession {
            user: session.user.clone(),
            token: session.token.clone(),
            expires_in: (session.expires_at - Utc::now()).num_seconds().max(0) as u64,
            expires_at: session.expires_at,
        };
        if let Err(e) = self.inner.storage.save(&persisted).await {
            tracing::warn!("Session will not survive a restart: {}", e);
        }
    }

    // The generation bump, the state change and the timer swap happen under
    // the watchdog lock so `clear` sees them together.
    fn establish(&self, session: Session) {
        let mut slot = lock(&self.inner.watchdog);
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let expires_at = session.expires_at;
        self.inner.token.set(Some(session.token.clone()));
        self.inner
            .state
            .send_replace(SessionState::Authenticated(session));

        let delay = (expires_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                SessionStore { inner }.expire(generation).await;
            }
        });

        if let Some(previous) = slot.replace(Watchdog { generation, handle }) {
            previous.handle.abort();
        }
        tracing::debug!("Expiry timer {} armed for {:?}", generation, delay);
    }

    async fn expire(&self, generation: u64) {
        {
            let mut slot = lock(&self.inner.watchdog);
            match slot.as_ref() {
                Some(w) if w.generation == generation => {
                    slot.take();
                }
                _ => return,
            }
        }
        tracing::info!("Session expired");
        self.clear(generation).await;
    }

    /// Drops the session started at `generation`. A login that lands while
    /// storage is being cleared wins and gets its record written back.
    async fn clear(&self, generation: u64) {
        if let Err(e) = self.inner.storage.clear().await {
            tracing::warn!("Failed to clear persisted session: {}", e);
        }

        let superseded = {
            let _slot = lock(&self.inner.watchdog);
            if self.inner.generation.load(Ordering::SeqCst) == generation {
                self.inner.token.set(None);
                let previous = self.inner.state.send_replace(SessionState::Anonymous);
                if previous.is_authenticated() {
                    tracing::info!("Logged out");
                }
                None
            } else {
                self.state().session().cloned()
            }
        };

        if let Some(session) = superseded {
            tracing::debug!("Keeping session for {} started during logout", session.user.name);
            self.persist(&session).await;
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

// Some deployments wrap the login payload in the usual `data` envelope.
fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map)
            if map.get("data").and_then(|d| d.get("token")).is_some() =>
        {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}
