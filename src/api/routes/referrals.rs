//! Referral Routes
//!
//! - GET /api/v1/referrals/link - Invite link, share URLs and progress
//! - POST /api/v1/referrals - Credit the signed-in user with a new referral
//! - POST /api/v1/referrals/reward - Activate the premium reward
//! - GET /api/v1/referrals/eligibility - Whether a reward can be activated

use axum::{extract::State, http::HeaderMap, Json};
use std::sync::Arc;

use crate::api::dto::{
    AddReferralRequest, EligibilityResponse, ReferralLinkResponse, StatusResponse,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::routes::{sign_in_first, signed_in};
use crate::api::state::AppState;
use crate::store::share_links;

/// GET /api/v1/referrals/link
pub async fn get_link(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<ReferralLinkResponse>> {
    let (_, handle) = state
        .existing_session(&headers)
        .await
        .ok_or_else(sign_in_first)?;
    let session = handle.lock().await;
    let user = signed_in(&session)?;

    Ok(Json(ReferralLinkResponse {
        link: session.store.generate_referral_link(&user.id),
        shares: share_links(&user.id),
        referrals: user.referrals.len(),
        required_invites: session.store.state().admin_settings.referral.required_invites,
        progress: session.store.referral_progress(),
    }))
}

/// POST /api/v1/referrals
pub async fn add_referral(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<AddReferralRequest>,
) -> ApiResult<Json<StatusResponse>> {
    if req.user_id.trim().is_empty() {
        return Err(ApiError::Validation("user_id is required".to_string()));
    }

    let (_, handle) = state
        .existing_session(&headers)
        .await
        .ok_or_else(sign_in_first)?;
    let mut session = handle.lock().await;
    let referrer_id = signed_in(&session)?.id.clone();
    session.store.add_referral(&req.user_id, &referrer_id);
    Ok(Json(StatusResponse::ok()))
}

/// POST /api/v1/referrals/reward
pub async fn activate_reward(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<StatusResponse>> {
    let (_, handle) = state
        .existing_session(&headers)
        .await
        .ok_or_else(sign_in_first)?;
    let mut session = handle.lock().await;
    let user_id = signed_in(&session)?.id.clone();

    if !session.store.check_referral_eligibility(&user_id) {
        return Err(ApiError::Conflict(
            "a referral reward is already active".to_string(),
        ));
    }
    session.store.activate_referral_reward(&user_id);
    Ok(Json(StatusResponse::ok()))
}

/// GET /api/v1/referrals/eligibility
pub async fn eligibility(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<EligibilityResponse>> {
    let (_, handle) = state
        .existing_session(&headers)
        .await
        .ok_or_else(sign_in_first)?;
    let session = handle.lock().await;
    let user = signed_in(&session)?;

    Ok(Json(EligibilityResponse {
        eligible: session.store.check_referral_eligibility(&user.id),
    }))
}
