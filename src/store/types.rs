//! Core data types for the session store
//!
//! This module defines the records held by the store:
//! - `User`: the signed-in account with preferences, stats and referrals
//! - `Essay`: a scored essay produced by the analysis step
//! - `AdminSettings`: pricing, referral, trial and discount configuration
//! - `ReferralReward`: a time-boxed premium grant

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of free essay checks an anonymous visitor starts with
pub const DEFAULT_TRIAL_COUNT: u32 = 3;

/// A signed-in account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub premium: bool,
    #[serde(default)]
    pub is_admin: bool,
    pub trial_count: u32,
    #[serde(default)]
    pub essays: Vec<EssaySummary>,
    #[serde(default)]
    pub referrals: Vec<Referral>,
    pub preferences: Preferences,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<Subscription>,
    pub stats: UserStats,
}

impl User {
    /// Fabricate an ordinary account for `email`
    ///
    /// The display name is the local part of the address.
    pub fn ordinary(id: impl Into<String>, email: &str, now: DateTime<Utc>) -> Self {
        let name = email.split('@').next().unwrap_or(email).to_string();
        Self {
            id: id.into(),
            name,
            email: email.to_string(),
            premium: false,
            is_admin: false,
            trial_count: DEFAULT_TRIAL_COUNT,
            essays: Vec::new(),
            referrals: Vec::new(),
            preferences: Preferences::default(),
            subscription: None,
            stats: UserStats::fresh(now),
        }
    }

    /// The built-in administrator account
    pub fn administrator(now: DateTime<Utc>) -> Self {
        Self {
            id: "admin".to_string(),
            name: "Administrator".to_string(),
            email: "admin@example.com".to_string(),
            premium: true,
            is_admin: true,
            trial_count: 0,
            essays: Vec::new(),
            referrals: Vec::new(),
            preferences: Preferences::default(),
            subscription: None,
            stats: UserStats::fresh(now),
        }
    }
}

/// Short essay entry kept on the user record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EssaySummary {
    pub id: String,
    pub content: String,
    pub score: f64,
    pub created_at: DateTime<Utc>,
}

/// Someone who signed up through a user's referral link
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Referral {
    pub name: String,
    pub join_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Preferences {
    pub theme: Theme,
    pub language: String,
    pub notifications: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            language: "en".to_string(),
            notifications: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Premium,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Expired,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub plan: Plan,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: SubscriptionStatus,
}

/// Aggregate writing statistics shown on the dashboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_essays: u32,
    pub average_score: f64,
    pub improvement_rate: f64,
    pub last_active: DateTime<Utc>,
}

impl UserStats {
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            total_essays: 0,
            average_score: 0.0,
            improvement_rate: 0.0,
            last_active: now,
        }
    }
}

/// Band scores per IELTS criterion, 0-9 in half-band steps
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BandScores {
    pub task_achievement: f64,
    pub coherence_and_cohesion: f64,
    pub lexical_resource: f64,
    pub grammatical_range: f64,
    pub overall: f64,
}

/// Comments per criterion
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub task_achievement: Vec<String>,
    pub coherence_and_cohesion: Vec<String>,
    pub lexical_resource: Vec<String>,
    pub grammatical_range: Vec<String>,
    pub general: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GrammarError {
    pub text: String,
    pub suggestion: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VocabularyRepetition {
    pub word: String,
    pub count: u32,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StyleImprovement {
    pub original: String,
    pub improved: String,
    pub context: String,
}

/// Grammar and vocabulary findings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub grammar_errors: Vec<GrammarError>,
    pub vocabulary_repetition: Vec<VocabularyRepetition>,
    pub style_improvements: Vec<StyleImprovement>,
}

/// A scored essay
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Essay {
    pub id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<f64>,
    pub score: BandScores,
    pub feedback: Feedback,
    #[serde(default)]
    pub analysis: Analysis,
    pub improved_version: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PricingSettings {
    pub monthly_price: f64,
    pub yearly_price: f64,
    pub yearly_discount: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReferralPolicy {
    pub required_invites: u32,
    pub reward_duration_weeks: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrialPolicy {
    /// Trial length in days
    pub duration: u32,
    pub essay_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiscountCode {
    pub code: String,
    pub percentage: u8,
    pub expiry_date: DateTime<Utc>,
}

/// Global product configuration edited from the admin panel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminSettings {
    pub pricing: PricingSettings,
    pub referral: ReferralPolicy,
    pub trial: TrialPolicy,
    #[serde(default)]
    pub discount_codes: Vec<DiscountCode>,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            pricing: PricingSettings {
                monthly_price: 1.99,
                yearly_price: 20.0,
                yearly_discount: 4.0,
            },
            referral: ReferralPolicy {
                required_invites: 10,
                reward_duration_weeks: 2,
            },
            trial: TrialPolicy {
                duration: 30,
                essay_limit: 3,
            },
            discount_codes: Vec::new(),
        }
    }
}

impl AdminSettings {
    /// Percentage of a still-valid discount code matching `code` exactly
    pub fn discount_for(&self, code: &str, now: DateTime<Utc>) -> Option<u8> {
        self.discount_codes
            .iter()
            .find(|dc| dc.code == code && dc.expiry_date > now)
            .map(|dc| dc.percentage)
            .filter(|pct| *pct > 0)
    }
}

/// Partial update for [`AdminSettings`]; present sections replace the current ones
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminSettingsPatch {
    #[serde(default)]
    pub pricing: Option<PricingSettings>,
    #[serde(default)]
    pub referral: Option<ReferralPolicy>,
    #[serde(default)]
    pub trial: Option<TrialPolicy>,
    #[serde(default)]
    pub discount_codes: Option<Vec<DiscountCode>>,
}

/// A premium grant earned through referrals
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReferralReward {
    pub user_id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl ReferralReward {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.end_date > now
    }
}

/// Writing-timer preferences
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimerSettings {
    pub enabled: bool,
    /// Minutes
    pub duration: u32,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            duration: 60,
        }
    }
}

/// Running essay timer; both fields are set together or not at all
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EssayTimer {
    pub start_time: Option<DateTime<Utc>>,
    /// Milliseconds
    pub duration: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinary_user_name_from_email() {
        let user = User::ordinary("user-abc", "jane.doe@example.com", Utc::now());
        assert_eq!(user.name, "jane.doe");
        assert!(!user.premium);
        assert_eq!(user.trial_count, DEFAULT_TRIAL_COUNT);
        assert_eq!(user.preferences.language, "en");
    }

    #[test]
    fn test_ordinary_user_without_at_sign() {
        let user = User::ordinary("user-abc", "jane", Utc::now());
        assert_eq!(user.name, "jane");
    }

    #[test]
    fn test_admin_settings_defaults() {
        let settings = AdminSettings::default();
        assert_eq!(settings.referral.required_invites, 10);
        assert_eq!(settings.referral.reward_duration_weeks, 2);
        assert_eq!(settings.trial.essay_limit, 3);
        assert!(settings.discount_codes.is_empty());
    }

    #[test]
    fn test_essay_serializes_camel_case() {
        let json = serde_json::to_value(BandScores {
            task_achievement: 7.0,
            coherence_and_cohesion: 6.5,
            lexical_resource: 7.0,
            grammatical_range: 6.5,
            overall: 6.75,
        })
        .unwrap();
        assert_eq!(json["coherenceAndCohesion"], 6.5);
    }
}
