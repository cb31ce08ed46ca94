//! Session Store
//!
//! Holds the state of one visitor: the signed-in user, theme flag, free
//! trial counter, timer preferences, admin configuration and referral
//! rewards.
//!
//! ## Architecture
//!
//! - **SessionState**: plain data, changed only by its reducer
//! - **Action / Outcome**: the reducer's input and side result
//! - **Store**: owns a state, a clock and an id source; one method per operation
//!
//! None of the operations fail with an error. Invalid input yields an
//! [`AuthResult::Failure`], `None`, `false`, or a no-op.

mod clock;
mod referral;
mod state;
mod types;

pub use clock::ManualClock;
pub use referral::{referral_link, share_links, ShareLink, SharePlatform};
pub use state::{
    Action, AuthFailure, AuthKind, AuthResult, Outcome, SessionState, ADMIN_LOGIN,
    ADMIN_PASSWORD, MIN_PASSWORD_LEN,
};
pub use types::*;

use chrono::{DateTime, Utc};
use mockable::{Clock, DefaultClock};
use rand::Rng;
use std::sync::Arc;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Shared clock handle
pub type SharedClock = Arc<dyn Clock + Send + Sync>;

/// A session store bound to a clock
pub struct Store {
    state: SessionState,
    clock: SharedClock,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("state", &self.state).finish()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(Arc::new(DefaultClock))
    }
}

impl Store {
    pub fn new(clock: SharedClock) -> Self {
        Self::with_state(SessionState::default(), clock)
    }

    pub fn with_state(state: SessionState, clock: SharedClock) -> Self {
        Self { state, clock }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    pub fn clock(&self) -> SharedClock {
        Arc::clone(&self.clock)
    }

    /// Run `action` through the reducer and keep the resulting state
    pub fn dispatch(&mut self, action: Action) -> Outcome {
        let now = self.now();
        let state = std::mem::take(&mut self.state);
        let (next, outcome) = state.reduce(action, now);
        self.state = next;
        outcome
    }

    pub fn set_user(&mut self, user: Option<User>) {
        self.dispatch(Action::SetUser(user));
    }

    pub fn set_current_essay(&mut self, essay: Option<Essay>) {
        self.dispatch(Action::SetCurrentEssay(essay));
    }

    pub fn record_essay(&mut self, essay: Essay) {
        self.dispatch(Action::RecordEssay(essay));
    }

    /// Flip the theme flag and return the new value
    pub fn toggle_dark_mode(&mut self) -> bool {
        self.dispatch(Action::ToggleDarkMode);
        self.state.dark_mode
    }

    /// Spend one free check; stays at zero once exhausted
    pub fn decrement_trial_count(&mut self) -> u32 {
        self.dispatch(Action::DecrementTrialCount);
        self.state.trial_count
    }

    pub fn login(&mut self, email: &str, password: &str) -> AuthResult {
        let result = self.authenticate(AuthKind::Login, email, password);
        match &result {
            AuthResult::Success { user } => {
                tracing::info!(user_id = %user.id, admin = user.is_admin, "Login succeeded")
            }
            AuthResult::Failure { reason } => {
                tracing::info!(reason = ?reason, "Login rejected")
            }
        }
        result
    }

    pub fn signup(&mut self, email: &str, password: &str) -> AuthResult {
        let result = self.authenticate(AuthKind::Signup, email, password);
        if let AuthResult::Success { user } = &result {
            tracing::info!(user_id = %user.id, "Account created");
        }
        result
    }

    fn authenticate(&mut self, kind: AuthKind, email: &str, password: &str) -> AuthResult {
        let now = self.now();
        let state = std::mem::take(&mut self.state);
        let (next, result) = state.authenticate(kind, email, password, fresh_user_id(), now);
        self.state = next;
        result
    }

    pub fn logout(&mut self) {
        if let Some(user) = &self.state.user {
            tracing::info!(user_id = %user.id, "Logout");
        }
        self.dispatch(Action::Logout);
    }

    pub fn start_essay_timer(&mut self) {
        self.dispatch(Action::StartEssayTimer);
    }

    /// Seconds since [`Store::start_essay_timer`], or 0 if it was never started
    pub fn stop_essay_timer(&mut self) -> f64 {
        match self.dispatch(Action::StopEssayTimer) {
            Outcome::Elapsed(secs) => secs,
            _ => 0.0,
        }
    }

    pub fn set_timer_settings(&mut self, settings: TimerSettings) {
        self.dispatch(Action::SetTimerSettings(settings));
    }

    pub fn update_admin_settings(&mut self, patch: AdminSettingsPatch) {
        self.dispatch(Action::UpdateAdminSettings(patch));
    }

    pub fn generate_referral_link(&self, user_id: &str) -> String {
        referral_link(user_id)
    }

    /// Percentage off for a valid, unexpired code
    pub fn apply_discount_code(&self, code: &str) -> Option<u8> {
        self.state.discount_for(code, self.now())
    }

    /// Credit `referrer_id` with a new referral if they are the loaded user
    pub fn add_referral(&mut self, user_id: &str, referrer_id: &str) {
        let credited = self
            .state
            .user
            .as_ref()
            .is_some_and(|u| u.id == referrer_id);
        if !credited {
            tracing::debug!(referrer_id = %referrer_id, "Referrer not loaded, referral skipped");
        }
        self.dispatch(Action::AddReferral {
            user_id: user_id.to_string(),
            referrer_id: referrer_id.to_string(),
        });
    }

    pub fn activate_referral_reward(&mut self, user_id: &str) {
        self.dispatch(Action::ActivateReferralReward {
            user_id: user_id.to_string(),
        });
        tracing::info!(user_id = %user_id, "Referral reward activated");
    }

    pub fn check_referral_eligibility(&self, user_id: &str) -> bool {
        self.state.is_eligible_for_reward(user_id, self.now())
    }

    pub fn referral_progress(&self) -> f64 {
        self.state.referral_progress()
    }
}

/// `user-` followed by nine random base36 characters
pub fn fresh_user_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("user-{}", suffix)
}
