//! API Routes
//!
//! Route handlers organized by functionality.

pub mod admin;
pub mod auth;
pub mod community;
pub mod essays;
pub mod health;
pub mod pricing;
pub mod referrals;

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::state::{Session, SESSION_HEADER};
use crate::store::User;

/// JSON body with the session id echoed in the response headers
pub(crate) fn with_session<T: Serialize>(session_id: String, body: T) -> Response {
    ([(SESSION_HEADER, session_id)], Json(body)).into_response()
}

pub(crate) fn sign_in_first() -> ApiError {
    ApiError::Unauthorized("sign in first".to_string())
}

pub(crate) fn admin_only() -> ApiError {
    ApiError::Forbidden("admin access required".to_string())
}

/// The signed-in user, or 401
pub(crate) fn signed_in(session: &Session) -> Result<&User, ApiError> {
    session.store.state().user.as_ref().ok_or_else(sign_in_first)
}

/// Fail unless the session belongs to the administrator
pub(crate) fn require_admin(session: &Session) -> Result<(), ApiError> {
    if session.store.state().is_admin {
        Ok(())
    } else {
        Err(admin_only())
    }
}
