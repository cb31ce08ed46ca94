//! Session state and its reducer
//!
//! `SessionState` is the whole client-side state of one visitor. It is
//! only changed through [`SessionState::reduce`], which takes the old
//! state and an [`Action`] and returns the new state together with an
//! [`Outcome`]. Time is passed in so the reducer stays deterministic.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::types::{
    AdminSettings, AdminSettingsPatch, Essay, EssaySummary, EssayTimer, Referral, ReferralReward,
    TimerSettings, User, DEFAULT_TRIAL_COUNT,
};

/// Fixed administrator credentials
pub const ADMIN_LOGIN: &str = "admin";
pub const ADMIN_PASSWORD: &str = "Adma1004";

/// Minimum password length accepted for ordinary accounts
pub const MIN_PASSWORD_LEN: usize = 6;

/// Everything the client keeps for one visitor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub is_authenticated: bool,
    pub user: Option<User>,
    pub current_essay: Option<Essay>,
    pub dark_mode: bool,
    pub trial_count: u32,
    pub is_admin: bool,
    pub timer_settings: TimerSettings,
    pub admin_settings: AdminSettings,
    pub essay_timer: EssayTimer,
    pub referral_rewards: Vec<ReferralReward>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            is_authenticated: false,
            user: None,
            current_essay: None,
            dark_mode: false,
            trial_count: DEFAULT_TRIAL_COUNT,
            is_admin: false,
            timer_settings: TimerSettings::default(),
            admin_settings: AdminSettings::default(),
            essay_timer: EssayTimer::default(),
            referral_rewards: Vec::new(),
        }
    }
}

/// A state change request
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetUser(Option<User>),
    SetCurrentEssay(Option<Essay>),
    /// Make `essay` current and append it to the loaded user's history
    RecordEssay(Essay),
    ToggleDarkMode,
    DecrementTrialCount,
    /// `fresh_id` is used when an ordinary account is fabricated
    Login {
        email: String,
        password: String,
        fresh_id: String,
    },
    Signup {
        email: String,
        password: String,
        fresh_id: String,
    },
    Logout,
    StartEssayTimer,
    StopEssayTimer,
    UpdateAdminSettings(AdminSettingsPatch),
    AddReferral {
        user_id: String,
        referrer_id: String,
    },
    ActivateReferralReward {
        user_id: String,
    },
    SetTimerSettings(TimerSettings),
}

/// Why a login or signup was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthFailure {
    EmptyEmail,
    PasswordTooShort,
}

impl AuthFailure {
    /// Message shown to the visitor, the same for every reason
    pub fn message(&self) -> &'static str {
        "Invalid email or password"
    }
}

/// Which credential check to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthKind {
    /// Accepts the administrator pair as well as ordinary accounts
    Login,
    Signup,
}

/// Result of a login or signup attempt
#[derive(Debug, Clone, PartialEq)]
pub enum AuthResult {
    Success { user: User },
    Failure { reason: AuthFailure },
}

impl AuthResult {
    pub fn is_success(&self) -> bool {
        matches!(self, AuthResult::Success { .. })
    }
}

/// What a reduction produced besides the new state
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Applied,
    Auth(AuthResult),
    /// Seconds measured by the essay timer
    Elapsed(f64),
}

impl SessionState {
    /// Apply `action` at time `now`
    pub fn reduce(mut self, action: Action, now: DateTime<Utc>) -> (Self, Outcome) {
        let outcome = match action {
            Action::SetUser(user) => {
                self.user = user;
                Outcome::Applied
            }
            Action::SetCurrentEssay(essay) => {
                self.current_essay = essay;
                Outcome::Applied
            }
            Action::RecordEssay(essay) => {
                if let Some(user) = self.user.as_mut() {
                    user.essays.push(EssaySummary {
                        id: essay.id.clone(),
                        content: essay.content.clone(),
                        score: essay.score.overall,
                        created_at: essay.created_at,
                    });
                    let total = user.essays.len() as f64;
                    let sum: f64 = user.essays.iter().map(|e| e.score).sum();
                    user.stats.total_essays = user.essays.len() as u32;
                    user.stats.average_score = sum / total;
                    user.stats.improvement_rate = improvement_rate(&user.essays);
                    user.stats.last_active = now;
                }
                self.current_essay = Some(essay);
                Outcome::Applied
            }
            Action::ToggleDarkMode => {
                self.dark_mode = !self.dark_mode;
                Outcome::Applied
            }
            Action::DecrementTrialCount => {
                self.trial_count = self.trial_count.saturating_sub(1);
                Outcome::Applied
            }
            Action::Login {
                email,
                password,
                fresh_id,
            } => Outcome::Auth(self.sign_in(AuthKind::Login, &email, &password, fresh_id, now)),
            Action::Signup {
                email,
                password,
                fresh_id,
            } => Outcome::Auth(self.sign_in(AuthKind::Signup, &email, &password, fresh_id, now)),
            Action::Logout => {
                self.user = None;
                self.is_admin = false;
                self.is_authenticated = false;
                self.current_essay = None;
                self.trial_count = DEFAULT_TRIAL_COUNT;
                Outcome::Applied
            }
            Action::StartEssayTimer => {
                self.essay_timer = EssayTimer {
                    start_time: Some(now),
                    duration: Some(i64::from(self.timer_settings.duration) * 60 * 1000),
                };
                Outcome::Applied
            }
            Action::StopEssayTimer => {
                let elapsed = match self.essay_timer.start_time {
                    Some(start) => (now - start).num_milliseconds() as f64 / 1000.0,
                    None => 0.0,
                };
                self.essay_timer = EssayTimer::default();
                Outcome::Elapsed(elapsed)
            }
            Action::UpdateAdminSettings(patch) => {
                if let Some(pricing) = patch.pricing {
                    self.admin_settings.pricing = pricing;
                }
                if let Some(referral) = patch.referral {
                    self.admin_settings.referral = referral;
                }
                if let Some(trial) = patch.trial {
                    self.admin_settings.trial = trial;
                }
                if let Some(codes) = patch.discount_codes {
                    self.admin_settings.discount_codes = codes;
                }
                Outcome::Applied
            }
            Action::AddReferral {
                user_id,
                referrer_id,
            } => {
                // Only the loaded user can be credited; other referrers are silently skipped
                if let Some(user) = self.user.as_mut().filter(|u| u.id == referrer_id) {
                    user.referrals.push(Referral {
                        name: user_id,
                        join_date: now,
                    });
                }
                Outcome::Applied
            }
            Action::ActivateReferralReward { user_id } => {
                let weeks = i64::from(self.admin_settings.referral.reward_duration_weeks);
                self.referral_rewards.push(ReferralReward {
                    user_id,
                    start_date: now,
                    end_date: now + Duration::days(weeks * 7),
                });
                Outcome::Applied
            }
            Action::SetTimerSettings(settings) => {
                self.timer_settings = TimerSettings {
                    enabled: settings.enabled,
                    duration: settings.duration.max(1),
                };
                Outcome::Applied
            }
        };

        (self, outcome)
    }

    /// True unless `user_id` already holds an unexpired referral reward
    pub fn is_eligible_for_reward(&self, user_id: &str, now: DateTime<Utc>) -> bool {
        !self
            .referral_rewards
            .iter()
            .any(|reward| reward.user_id == user_id && reward.is_active_at(now))
    }

    /// Reduce a login or signup, returning its result directly
    pub fn authenticate(
        mut self,
        kind: AuthKind,
        email: &str,
        password: &str,
        fresh_id: String,
        now: DateTime<Utc>,
    ) -> (Self, AuthResult) {
        let result = self.sign_in(kind, email, password, fresh_id, now);
        (self, result)
    }

    fn sign_in(
        &mut self,
        kind: AuthKind,
        email: &str,
        password: &str,
        fresh_id: String,
        now: DateTime<Utc>,
    ) -> AuthResult {
        if kind == AuthKind::Login && email == ADMIN_LOGIN && password == ADMIN_PASSWORD {
            let user = User::administrator(now);
            self.user = Some(user.clone());
            self.is_admin = true;
            self.is_authenticated = true;
            return AuthResult::Success { user };
        }

        match check_credentials(email, password) {
            Ok(()) => {
                let user = User::ordinary(fresh_id, email, now);
                self.user = Some(user.clone());
                // signup leaves the admin flag as it was
                if kind == AuthKind::Login {
                    self.is_admin = false;
                }
                self.is_authenticated = true;
                AuthResult::Success { user }
            }
            Err(reason) => AuthResult::Failure { reason },
        }
    }

    /// Percentage of a still-valid discount code matching `code` exactly
    pub fn discount_for(&self, code: &str, now: DateTime<Utc>) -> Option<u8> {
        self.admin_settings.discount_for(code, now)
    }

    /// Progress towards the referral reward, 0-100
    pub fn referral_progress(&self) -> f64 {
        let required = self.admin_settings.referral.required_invites;
        let count = self.user.as_ref().map(|u| u.referrals.len()).unwrap_or(0);
        if required == 0 {
            return 100.0;
        }
        (count as f64 / f64::from(required) * 100.0).min(100.0)
    }

    /// Whether an anonymous visitor has used up the free checks
    pub fn trial_exhausted(&self) -> bool {
        self.user.is_none() && self.trial_count == 0
    }
}

/// Change in overall band between the first and latest essay, in percent of the first
fn improvement_rate(essays: &[EssaySummary]) -> f64 {
    match (essays.first(), essays.last()) {
        (Some(first), Some(last)) if essays.len() > 1 && first.score > 0.0 => {
            (last.score - first.score) / first.score * 100.0
        }
        _ => 0.0,
    }
}

fn check_credentials(email: &str, password: &str) -> Result<(), AuthFailure> {
    if email.is_empty() {
        return Err(AuthFailure::EmptyEmail);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthFailure::PasswordTooShort);
    }
    Ok(())
}
