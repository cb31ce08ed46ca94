//! Pricing Routes
//!
//! - GET /api/v1/pricing - Plan table for a billing cycle
//! - POST /api/v1/discounts/apply - Validate a discount code and quote a plan

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{DiscountRequest, DiscountResponse, PricingParams, PricingResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::pricing::{plans, quote, BillingCycle, PlanTier};

/// GET /api/v1/pricing
pub async fn get_pricing(Query(params): Query<PricingParams>) -> ApiResult<Json<PricingResponse>> {
    let cycle = match params.cycle.as_deref() {
        None | Some("") => BillingCycle::default(),
        Some(c) => c.parse()?,
    };

    Ok(Json(PricingResponse {
        cycle,
        plans: plans(cycle),
    }))
}

/// POST /api/v1/discounts/apply
///
/// Quotes Premium unless another plan is given. Codes come from the
/// shared admin settings, so no session is needed.
pub async fn apply_discount(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DiscountRequest>,
) -> ApiResult<Json<DiscountResponse>> {
    let percentage = state.discount_for(&req.code).await.ok_or_else(|| {
        ApiError::NotFound(format!("discount code '{}' is invalid or expired", req.code))
    })?;

    let tier = req.plan.unwrap_or(PlanTier::Premium);
    let cycle = req.cycle.unwrap_or_default();
    Ok(Json(DiscountResponse {
        code: req.code,
        percentage,
        quote: quote(tier, cycle, percentage),
    }))
}
