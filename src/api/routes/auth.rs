//! Session Routes
//!
//! - POST /api/v1/auth/login - Sign in (admin credentials grant the admin panel)
//! - POST /api/v1/auth/signup - Create an account
//! - POST /api/v1/auth/logout - Sign out and reset the session
//! - GET /api/v1/session - Current session summary
//! - POST /api/v1/session/theme - Toggle dark mode

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::api::dto::{AuthResponse, CredentialsRequest, SessionResponse, StatusResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::routes::with_session;
use crate::api::state::AppState;
use crate::store::AuthResult;

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<Response> {
    let (session_id, handle) = state.session(&headers).await;
    let result = handle.lock().await.store.login(&req.email, &req.password);
    auth_response(session_id, result)
}

/// POST /api/v1/auth/signup
pub async fn signup(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<Response> {
    let (session_id, handle) = state.session(&headers).await;
    let result = handle.lock().await.store.signup(&req.email, &req.password);
    auth_response(session_id, result)
}

fn auth_response(session_id: String, result: AuthResult) -> ApiResult<Response> {
    match result {
        AuthResult::Success { user } => Ok(with_session(
            session_id.clone(),
            AuthResponse { session_id, user },
        )),
        AuthResult::Failure { .. } => Err(ApiError::InvalidCredentials),
    }
}

/// POST /api/v1/auth/logout
///
/// Cancels a running analysis. Without a known session there is nothing
/// to sign out of.
pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let Some((session_id, handle)) = state.existing_session(&headers).await else {
        return Json(StatusResponse::ok()).into_response();
    };
    {
        let mut session = handle.lock().await;
        session.flow.cancel();
        session.store.logout();
    }
    with_session(session_id, StatusResponse::ok())
}

/// GET /api/v1/session
pub async fn current(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let (session_id, handle) = state
        .existing_session(&headers)
        .await
        .ok_or_else(|| ApiError::NotFound("no such session".to_string()))?;
    let body = {
        let session = handle.lock().await;
        let s = session.store.state();
        SessionResponse {
            session_id: session_id.clone(),
            is_authenticated: s.is_authenticated,
            is_admin: s.is_admin,
            user: s.user.clone(),
            trial_count: s.trial_count,
            dark_mode: s.dark_mode,
            timer_minutes: s.timer_settings.duration,
        }
    };
    Ok(with_session(session_id, body))
}

#[derive(Serialize)]
struct ThemeResponse {
    dark_mode: bool,
}

/// POST /api/v1/session/theme
pub async fn toggle_theme(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let (session_id, handle) = state.session(&headers).await;
    let dark_mode = handle.lock().await.store.toggle_dark_mode();
    with_session(session_id, ThemeResponse { dark_mode })
}
