//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::{ApiConfig, SessionConfig};
use crate::listing::Catalog;
use crate::store::{
    AdminSettings, AdminSettingsPatch, SessionState, SharedClock, Store, TimerSettings,
};
use crate::submission::{Scorer, SubmissionFlow};

/// Header carrying the visitor's session id, in both directions
pub const SESSION_HEADER: &str = "x-session-id";

/// One visitor: their store and their essay form
#[derive(Debug)]
pub struct Session {
    pub store: Store,
    pub flow: SubmissionFlow,
}

pub type SessionHandle = Arc<Mutex<Session>>;

struct SessionSlot {
    handle: SessionHandle,
    last_seen: tokio::time::Instant,
}

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Live sessions by id
    sessions: Arc<RwLock<HashMap<String, SessionSlot>>>,
    /// Product settings last saved from an admin session, seen by every session
    admin_settings: Arc<RwLock<AdminSettings>>,
    /// Scorer used for essay analysis
    pub scorer: Arc<dyn Scorer>,
    /// Lists served by the read-only endpoints
    pub catalog: Arc<Catalog>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Defaults for new sessions
    pub session_defaults: SessionConfig,
    clock: SharedClock,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        scorer: Arc<dyn Scorer>,
        catalog: Catalog,
        config: ApiConfig,
        session_defaults: SessionConfig,
        clock: SharedClock,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            admin_settings: Arc::new(RwLock::new(AdminSettings::default())),
            scorer,
            catalog: Arc::new(catalog),
            config: Arc::new(config),
            session_defaults,
            clock,
            start_time: Instant::now(),
        }
    }

    /// Look up the session named by the request headers, creating one if needed
    ///
    /// The session's admin settings are refreshed from the shared copy.
    pub async fn session(&self, headers: &HeaderMap) -> (String, SessionHandle) {
        let (id, handle) = match self.lookup(headers).await {
            Some(found) => found,
            None => self.create().await,
        };
        self.sync_admin_settings(&handle).await;
        (id, handle)
    }

    /// Like [`AppState::session`], but never creates one
    pub async fn existing_session(&self, headers: &HeaderMap) -> Option<(String, SessionHandle)> {
        let (id, handle) = self.lookup(headers).await?;
        self.sync_admin_settings(&handle).await;
        Some((id, handle))
    }

    async fn lookup(&self, headers: &HeaderMap) -> Option<(String, SessionHandle)> {
        let id = headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())?;

        let mut sessions = self.sessions.write().await;
        let slot = sessions.get_mut(id)?;
        slot.last_seen = tokio::time::Instant::now();
        Some((id.to_string(), Arc::clone(&slot.handle)))
    }

    async fn create(&self) -> (String, SessionHandle) {
        let id = uuid::Uuid::new_v4().to_string();
        let handle = Arc::new(Mutex::new(self.fresh_session()));

        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.session_defaults.max_sessions.max(1) {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, slot)| slot.last_seen)
                .map(|(id, _)| id.clone());
            if let Some(oldest) = oldest {
                sessions.remove(&oldest);
                tracing::debug!(session_id = %oldest, "Session evicted, limit reached");
            }
        }
        sessions.insert(
            id.clone(),
            SessionSlot {
                handle: Arc::clone(&handle),
                last_seen: tokio::time::Instant::now(),
            },
        );
        tracing::debug!(session_id = %id, "Session created");
        (id, handle)
    }

    async fn sync_admin_settings(&self, handle: &SessionHandle) {
        let settings = self.admin_settings.read().await.clone();
        handle
            .lock()
            .await
            .store
            .update_admin_settings(AdminSettingsPatch {
                pricing: Some(settings.pricing),
                referral: Some(settings.referral),
                trial: Some(settings.trial),
                discount_codes: Some(settings.discount_codes),
            });
    }

    /// Forget sessions idle for longer than the configured timeout
    ///
    /// A session a request is still holding is kept. Returns how many
    /// were removed.
    pub async fn expire_idle_sessions(&self) -> usize {
        let ttl = self.session_defaults.idle_timeout();
        let now = tokio::time::Instant::now();

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, slot| {
            now.duration_since(slot.last_seen) < ttl || Arc::strong_count(&slot.handle) > 1
        });
        let expired = before - sessions.len();
        if expired > 0 {
            tracing::debug!(expired, remaining = sessions.len(), "Idle sessions expired");
        }
        expired
    }

    /// Expire idle sessions in the background until the handle is aborted
    pub fn spawn_session_sweeper(&self) -> JoinHandle<()> {
        let state = self.clone();
        let every = (self.session_defaults.idle_timeout() / 4)
            .max(std::time::Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                state.expire_idle_sessions().await;
            }
        })
    }

    /// Discount percentage for `code` under the shared admin settings
    pub async fn discount_for(&self, code: &str) -> Option<u8> {
        self.admin_settings.read().await.discount_for(code, self.now())
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    /// Make `settings` the ones every session sees
    pub async fn publish_admin_settings(&self, settings: AdminSettings) {
        *self.admin_settings.write().await = settings;
    }

    fn fresh_session(&self) -> Session {
        let state = SessionState {
            trial_count: self.session_defaults.trial_count,
            timer_settings: TimerSettings {
                duration: self.session_defaults.timer_minutes.max(1),
                ..TimerSettings::default()
            },
            ..SessionState::default()
        };
        Session {
            store: Store::with_state(state, Arc::clone(&self.clock)),
            flow: SubmissionFlow::new(),
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
