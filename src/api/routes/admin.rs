//! Admin Routes
//!
//! All endpoints require a session signed in as the administrator.
//!
//! - GET /api/v1/admin/users - List accounts (search, status, plan)
//! - GET /api/v1/admin/transactions - List payments (search, status)
//! - GET /api/v1/admin/settings - Current product settings
//! - PUT /api/v1/admin/settings - Replace the sections given in the body

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{ListParams, ListResponse};
use crate::api::error::ApiResult;
use crate::api::routes::{admin_only, require_admin};
use crate::api::state::{AppState, SessionHandle};
use crate::listing::{
    parse_facet, AccountType, ListQuery, Transaction, TransactionStatus, UserFacet, UserRecord,
    UserStatus,
};
use crate::store::{AdminSettings, AdminSettingsPatch};

/// The caller's session if it is the administrator's; unknown ids get 403
async fn admin_session(state: &AppState, headers: &HeaderMap) -> ApiResult<SessionHandle> {
    let (_, handle) = state.existing_session(headers).await.ok_or_else(admin_only)?;
    require_admin(&*handle.lock().await)?;
    Ok(handle)
}

/// GET /api/v1/admin/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<ListResponse<UserRecord>>> {
    admin_session(&state, &headers).await?;

    let status = parse_facet::<UserStatus>(params.status.as_deref())?;
    let plan = parse_facet::<AccountType>(params.plan.as_deref())?;

    let query = ListQuery::new()
        .search(params.search.unwrap_or_default())
        .facet_opt(status.map(UserFacet::Status))
        .facet_opt(plan.map(UserFacet::Account));

    Ok(Json(query.apply(&state.catalog.users).into()))
}

/// GET /api/v1/admin/transactions
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<ListResponse<Transaction>>> {
    admin_session(&state, &headers).await?;

    let status = parse_facet::<TransactionStatus>(params.status.as_deref())?;
    let query = ListQuery::new()
        .search(params.search.unwrap_or_default())
        .facet_opt(status);

    Ok(Json(query.apply(&state.catalog.transactions).into()))
}

/// GET /api/v1/admin/settings
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<AdminSettings>> {
    let handle = admin_session(&state, &headers).await?;
    let settings = handle.lock().await.store.state().admin_settings.clone();
    Ok(Json(settings))
}

/// PUT /api/v1/admin/settings
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(patch): Json<AdminSettingsPatch>,
) -> ApiResult<Json<AdminSettings>> {
    let handle = admin_session(&state, &headers).await?;
    let settings = {
        let mut session = handle.lock().await;
        session.store.update_admin_settings(patch);
        session.store.state().admin_settings.clone()
    };

    state.publish_admin_settings(settings.clone()).await;
    tracing::info!(
        discount_codes = settings.discount_codes.len(),
        "Admin settings updated"
    );
    Ok(Json(settings))
}
