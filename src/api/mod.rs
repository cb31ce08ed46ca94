//! BandUP REST API
//!
//! HTTP API layer for BandUP, built with Axum. Every visitor gets a
//! session, named by the `x-session-id` header; a request without one
//! (or with an unknown one) starts a new session whose id is returned in
//! the same header.
//!
//! # Endpoints
//!
//! ## Session
//! - `POST /api/v1/auth/login` - Sign in
//! - `POST /api/v1/auth/signup` - Create an account
//! - `POST /api/v1/auth/logout` - Sign out
//! - `GET /api/v1/session` - Session summary
//! - `POST /api/v1/session/theme` - Toggle dark mode
//!
//! ## Essays
//! - `POST /api/v1/essays/analyze` - Score an essay
//! - `GET /api/v1/essays` - List saved essays
//!
//! ## Community
//! - `GET /api/v1/community/posts` - List posts
//!
//! ## Admin
//! - `GET /api/v1/admin/users` - List accounts
//! - `GET /api/v1/admin/transactions` - List payments
//! - `GET /api/v1/admin/settings` - Product settings
//! - `PUT /api/v1/admin/settings` - Update product settings
//!
//! ## Referrals and pricing
//! - `GET /api/v1/referrals/link` - Invite link and progress
//! - `POST /api/v1/referrals` - Record a referral
//! - `POST /api/v1/referrals/reward` - Activate the reward
//! - `GET /api/v1/referrals/eligibility` - Reward eligibility
//! - `GET /api/v1/pricing` - Plan table
//! - `POST /api/v1/discounts/apply` - Check a discount code
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use bandup::api::{serve, AppState};
//! use bandup::config::Config;
//! use bandup::listing::Catalog;
//! use bandup::submission::MockScorer;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let state = AppState::new(
//!         Arc::new(MockScorer::default()),
//!         Catalog::seeded(),
//!         config.api.clone(),
//!         config.session.clone(),
//!         Arc::new(mockable::DefaultClock),
//!     );
//!     serve(state).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{AppState, Session, SESSION_HEADER};

use axum::{
    http::{header::HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ApiConfig;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Session routes
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/signup", post(routes::auth::signup))
        .route("/auth/logout", post(routes::auth::logout))
        .route("/session", get(routes::auth::current))
        .route("/session/theme", post(routes::auth::toggle_theme))
        // Essay routes
        .route("/essays", get(routes::essays::list_essays))
        .route("/essays/analyze", post(routes::essays::analyze))
        // Community routes
        .route("/community/posts", get(routes::community::list_posts))
        // Admin routes
        .route("/admin/users", get(routes::admin::list_users))
        .route("/admin/transactions", get(routes::admin::list_transactions))
        .route(
            "/admin/settings",
            get(routes::admin::get_settings).put(routes::admin::update_settings),
        )
        // Referral routes
        .route("/referrals", post(routes::referrals::add_referral))
        .route("/referrals/link", get(routes::referrals::get_link))
        .route("/referrals/reward", post(routes::referrals::activate_reward))
        .route("/referrals/eligibility", get(routes::referrals::eligibility))
        // Pricing routes
        .route("/pricing", get(routes::pricing::get_pricing))
        .route("/discounts/apply", post(routes::pricing::apply_discount));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config);
    let timeout = TimeoutLayer::new(state.config.request_timeout());
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(timeout)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// CORS for the configured origins; any origin when none are set
fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let session_header = HeaderName::from_static(state::SESSION_HEADER);
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([axum::http::header::CONTENT_TYPE, session_header.clone()])
        .expose_headers([session_header])
        .max_age(Duration::from_secs(3600));

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}

/// Start the API server
pub async fn serve(state: AppState) -> Result<(), ApiError> {
    let addr = state.config.addr();
    let sweeper = state.spawn_session_sweeper();
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("BandUP API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    sweeper.abort();
    tracing::info!("BandUP API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::listing::Catalog;
    use crate::store::ManualClock;
    use crate::submission::MockScorer;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use chrono::Utc;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    fn test_state(latency: Duration, api: ApiConfig, session: SessionConfig) -> AppState {
        AppState::new(
            Arc::new(MockScorer::new(latency)),
            Catalog::seeded(),
            api,
            session,
            Arc::new(ManualClock::new(Utc::now())),
        )
    }

    fn create_test_app() -> Router {
        build_router(test_state(
            Duration::ZERO,
            ApiConfig::default(),
            SessionConfig::default(),
        ))
    }

    fn get(uri: &str, session: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(id) = session {
            builder = builder.header(SESSION_HEADER, id);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, session: Option<&str>, body: Value) -> Request<Body> {
        post_with_method("POST", uri, session, body)
    }

    fn post_with_method(
        method: &str,
        uri: &str,
        session: Option<&str>,
        body: Value,
    ) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json");
        if let Some(id) = session {
            builder = builder.header(SESSION_HEADER, id);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn session_of(response: &Response) -> String {
        response
            .headers()
            .get(SESSION_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    async fn admin_session(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/auth/login",
                None,
                json!({"email": "admin", "password": "Adma1004"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        session_of(&response)
    }

    fn essay(words: usize) -> Value {
        json!({"topic": "Some people think...", "content": vec!["word"; words].join(" ")})
    }

    #[tokio::test]
    async fn test_health_live() {
        let app = create_test_app();
        let response = app.oneshot(get("/health/live", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_full() {
        let app = create_test_app();
        let response = app.oneshot(get("/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["scorer"], "mock");
    }

    #[tokio::test]
    async fn test_login_returns_session() {
        let app = create_test_app();
        let response = app
            .oneshot(post_json(
                "/api/v1/auth/login",
                None,
                json!({"email": "jane@example.com", "password": "secret1"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let header = session_of(&response);
        let body = body_json(response).await;
        assert_eq!(body["session_id"], header.as_str());
        assert_eq!(body["user"]["email"], "jane@example.com");
        assert_eq!(body["user"]["name"], "jane");
    }

    #[tokio::test]
    async fn test_login_rejects_short_password() {
        let app = create_test_app();
        let response = app
            .oneshot(post_json(
                "/api/v1/auth/login",
                None,
                json!({"email": "jane@example.com", "password": "123"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
        assert_eq!(body["error"]["message"], "Invalid email or password");
        assert!(body["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_session_is_reused() {
        let app = create_test_app();
        let first = app
            .clone()
            .oneshot(post_json("/api/v1/session/theme", None, json!({})))
            .await
            .unwrap();
        let id = session_of(&first);

        let second = app
            .clone()
            .oneshot(post_json("/api/v1/session/theme", Some(&id), json!({})))
            .await
            .unwrap();
        assert_eq!(session_of(&second), id);
        assert_eq!(body_json(second).await["dark_mode"], false);
    }

    #[tokio::test]
    async fn test_analyze_short_essay_is_rejected() {
        let app = create_test_app();
        let response = app
            .oneshot(post_json("/api/v1/essays/analyze", None, essay(149)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_anonymous_trials_run_out() {
        let app = create_test_app();

        let first = app
            .clone()
            .oneshot(post_json("/api/v1/essays/analyze", None, essay(150)))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        let id = session_of(&first);
        let body = body_json(first).await;
        assert_eq!(body["trials_left"], 2);
        assert_eq!(body["essay"]["score"]["overall"], 6.75);

        for left in [1, 0] {
            let response = app
                .clone()
                .oneshot(post_json("/api/v1/essays/analyze", Some(&id), essay(200)))
                .await
                .unwrap();
            assert_eq!(body_json(response).await["trials_left"], left);
        }

        let blocked = app
            .clone()
            .oneshot(post_json("/api/v1/essays/analyze", Some(&id), essay(200)))
            .await
            .unwrap();
        assert_eq!(blocked.status(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(body_json(blocked).await["error"]["code"], "TRIAL_EXHAUSTED");
    }

    #[tokio::test]
    async fn test_signed_in_user_keeps_trials() {
        let app = create_test_app();
        let id = admin_session(&app).await;
        let response = app
            .clone()
            .oneshot(post_json("/api/v1/essays/analyze", Some(&id), essay(150)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_json(response).await["trials_left"].is_null());

        let session = app
            .oneshot(get("/api/v1/session", Some(&id)))
            .await
            .unwrap();
        assert_eq!(body_json(session).await["trial_count"], 3);
    }

    #[tokio::test]
    async fn test_essay_list_filters() {
        let app = create_test_app();
        let response = app
            .oneshot(get("/api/v1/essays?status=reviewed&kind=task1", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["items"][0]["type"], "task1");
    }

    #[tokio::test]
    async fn test_unknown_filter_is_bad_request() {
        let app = create_test_app();
        let response = app
            .oneshot(get("/api/v1/community/posts?category=memes", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "INVALID_FILTER");
    }

    #[tokio::test]
    async fn test_popular_posts_keep_pinned_first() {
        let app = create_test_app();
        let response = app
            .oneshot(get("/api/v1/community/posts?sort=popular", None))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["items"][0]["isPinned"], true);
        assert_eq!(body["items"][1]["likes"], 96);
    }

    #[tokio::test]
    async fn test_admin_lists_need_admin() {
        let app = create_test_app();
        let response = app
            .clone()
            .oneshot(get("/api/v1/admin/users", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let id = admin_session(&app).await;
        let response = app
            .clone()
            .oneshot(get("/api/v1/admin/users?status=inactive", Some(&id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["items"][0]["name"], "Jane Smith");

        let response = app
            .oneshot(get("/api/v1/admin/transactions?status=pending", Some(&id)))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["items"][0]["id"], "#TRX-0003");
    }

    #[tokio::test]
    async fn test_discount_code_round_trip() {
        let app = create_test_app();
        let id = admin_session(&app).await;

        let expiry = (Utc::now() + chrono::Duration::days(7)).to_rfc3339();
        let response = app
            .clone()
            .oneshot(post_with_method(
                "PUT",
                "/api/v1/admin/settings",
                Some(&id),
                json!({"discountCodes": [{"code": "SPRING20", "percentage": 20, "expiryDate": expiry}]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/discounts/apply",
                Some(&id),
                json!({"code": "SPRING20", "cycle": "yearly"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["percentage"], 20);
        assert_eq!(body["quote"]["totalCents"], 1599);

        // codes saved by the admin apply to every visitor
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/discounts/apply",
                None,
                json!({"code": "SPRING20"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["quote"]["totalCents"], 159);

        let response = app
            .oneshot(post_json(
                "/api/v1/discounts/apply",
                None,
                json!({"code": "spring20"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_referrals_need_sign_in() {
        let app = create_test_app();
        let response = app
            .clone()
            .oneshot(get("/api/v1/referrals/link", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let id = admin_session(&app).await;
        let response = app
            .clone()
            .oneshot(get("/api/v1/referrals/link", Some(&id)))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["link"], "https://bandup.com/signup?ref=admin");
        assert_eq!(body["shares"].as_array().unwrap().len(), 4);

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/referrals/reward", Some(&id), json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(get("/api/v1/referrals/eligibility", Some(&id)))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["eligible"], false);
    }

    #[tokio::test]
    async fn test_pricing_cycle() {
        let app = create_test_app();
        let response = app
            .oneshot(get("/api/v1/pricing?cycle=yearly", None))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["cycle"], "yearly");
        assert_eq!(body["plans"][1]["priceCents"], 1999);
        assert_eq!(body["plans"][1]["saveCents"], 400);
    }

    async fn new_session(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(post_json("/api/v1/session/theme", None, json!({})))
            .await
            .unwrap();
        session_of(&response)
    }

    #[tokio::test]
    async fn test_lookups_do_not_create_sessions() {
        let state = test_state(Duration::ZERO, ApiConfig::default(), SessionConfig::default());
        let app = build_router(state.clone());

        for _ in 0..50 {
            let response = app
                .clone()
                .oneshot(get("/api/v1/session", None))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }

        let response = app
            .clone()
            .oneshot(get("/api/v1/admin/users", Some("made-up")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .clone()
            .oneshot(get("/api/v1/referrals/eligibility", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/auth/logout", None, json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(post_json(
                "/api/v1/discounts/apply",
                None,
                json!({"code": "NOPE"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        assert_eq!(state.session_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_expire() {
        let session = SessionConfig {
            idle_timeout_minutes: 1,
            ..SessionConfig::default()
        };
        let state = test_state(Duration::ZERO, ApiConfig::default(), session);
        let app = build_router(state.clone());
        let id = new_session(&app).await;

        tokio::time::advance(Duration::from_secs(45)).await;
        let response = app
            .clone()
            .oneshot(get("/api/v1/session", Some(&id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // last use was 45s ago
        tokio::time::advance(Duration::from_secs(45)).await;
        assert_eq!(state.expire_idle_sessions().await, 0);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(state.expire_idle_sessions().await, 1);
        let response = app
            .oneshot(get("/api/v1/session", Some(&id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_removes_idle_sessions() {
        let session = SessionConfig {
            idle_timeout_minutes: 1,
            ..SessionConfig::default()
        };
        let state = test_state(Duration::ZERO, ApiConfig::default(), session);
        let app = build_router(state.clone());
        new_session(&app).await;
        assert_eq!(state.session_count().await, 1);

        let sweeper = state.spawn_session_sweeper();
        tokio::time::sleep(Duration::from_secs(90)).await;
        assert_eq!(state.session_count().await, 0);
        sweeper.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_limit_evicts_least_recent() {
        let session = SessionConfig {
            max_sessions: 2,
            ..SessionConfig::default()
        };
        let state = test_state(Duration::ZERO, ApiConfig::default(), session);
        let app = build_router(state.clone());

        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(new_session(&app).await);
            tokio::time::advance(Duration::from_secs(1)).await;
        }
        assert_eq!(state.session_count().await, 2);

        let response = app
            .clone()
            .oneshot(get("/api/v1/session", Some(&ids[0])))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = app
            .oneshot(get("/api/v1/session", Some(&ids[2])))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_during_analysis_drops_the_result() {
        let app = build_router(test_state(
            Duration::from_secs(2),
            ApiConfig::default(),
            SessionConfig::default(),
        ));
        let id = new_session(&app).await;

        let pending = tokio::spawn(app.clone().oneshot(post_json(
            "/api/v1/essays/analyze",
            Some(&id),
            essay(160),
        )));
        tokio::time::sleep(Duration::from_millis(500)).await;

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/auth/logout", Some(&id), json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = pending.await.unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            body_json(response).await["error"]["code"],
            "ANALYSIS_CANCELLED"
        );

        let response = app
            .oneshot(get("/api/v1/session", Some(&id)))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["trial_count"], 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_analysis_frees_the_session() {
        let api = ApiConfig {
            request_timeout_secs: 1,
            ..ApiConfig::default()
        };
        let app = build_router(test_state(
            Duration::from_secs(5),
            api,
            SessionConfig::default(),
        ));
        let id = new_session(&app).await;

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(post_json("/api/v1/essays/analyze", Some(&id), essay(160)))
                .await
                .unwrap();
            // a stuck analysis would answer 409 on the second round
            assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let response = app
            .oneshot(get("/api/v1/session", Some(&id)))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["trial_count"], 3);
    }
}
