//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use serde::{Deserialize, Serialize};

use crate::pricing::{BillingCycle, PlanOffer, PlanTier, Quote};
use crate::store::{Essay, ShareLink, User};
use crate::submission::FeedbackReport;

// ============================================
// SESSION DTOs
// ============================================

/// Login / signup request
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Successful login / signup
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub session_id: String,
    pub user: User,
}

/// What the client needs to render the shell
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub is_authenticated: bool,
    pub is_admin: bool,
    pub user: Option<User>,
    pub trial_count: u32,
    pub dark_mode: bool,
    pub timer_minutes: u32,
}

/// Generic acknowledgement
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

// ============================================
// ESSAY DTOs
// ============================================

/// Essay submission
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub content: String,
    #[serde(default)]
    pub topic: String,
    /// Seconds spent writing, when the client timed it
    #[serde(default)]
    pub time_spent: Option<f64>,
}

/// Scored essay
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub essay: Essay,
    pub report: FeedbackReport,
    /// Free checks left, `None` for signed-in users
    pub trials_left: Option<u32>,
}

// ============================================
// LIST DTOs
// ============================================

/// Query string shared by the list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub status: Option<String>,
    pub kind: Option<String>,
    pub category: Option<String>,
    pub plan: Option<String>,
    pub sort: Option<String>,
}

/// Filtered list
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub total: usize,
    pub items: Vec<T>,
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            total: items.len(),
            items,
        }
    }
}

// ============================================
// REFERRAL DTOs
// ============================================

#[derive(Debug, Serialize)]
pub struct ReferralLinkResponse {
    pub link: String,
    pub shares: Vec<ShareLink>,
    pub referrals: usize,
    pub required_invites: u32,
    /// Percent of the required invites reached
    pub progress: f64,
}

/// A friend who joined through the current user's link
#[derive(Debug, Deserialize)]
pub struct AddReferralRequest {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct EligibilityResponse {
    pub eligible: bool,
}

// ============================================
// PRICING DTOs
// ============================================

#[derive(Debug, Default, Deserialize)]
pub struct PricingParams {
    pub cycle: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PricingResponse {
    pub cycle: BillingCycle,
    pub plans: Vec<PlanOffer>,
}

#[derive(Debug, Deserialize)]
pub struct DiscountRequest {
    pub code: String,
    #[serde(default)]
    pub plan: Option<PlanTier>,
    #[serde(default)]
    pub cycle: Option<BillingCycle>,
}

#[derive(Debug, Serialize)]
pub struct DiscountResponse {
    pub code: String,
    pub percentage: u8,
    pub quote: Quote,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub scorer: String,
    pub sessions: usize,
    pub uptime_seconds: u64,
    pub version: String,
}
