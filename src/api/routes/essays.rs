//! Essay Routes
//!
//! - POST /api/v1/essays/analyze - Score an essay
//! - GET /api/v1/essays - List saved essays (search, status, kind)

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{AnalyzeRequest, AnalyzeResponse, ListParams, ListResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::routes::with_session;
use crate::api::state::{AppState, SessionHandle};
use crate::listing::{parse_facet, EssayFacet, EssayKind, EssayRecord, EssayStatus, ListQuery};
use crate::submission::{Draft, DraftError, FeedbackReport, SubmitDecision, Ticket};

/// Releases the session's analysis if the request is dropped mid-scoring
/// (client gone, request timeout)
struct AbandonOnDrop {
    handle: Option<SessionHandle>,
    ticket: Ticket,
}

impl AbandonOnDrop {
    fn disarm(mut self) {
        self.handle = None;
    }
}

impl Drop for AbandonOnDrop {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let ticket = self.ticket;
            tokio::spawn(async move {
                handle.lock().await.flow.abandon(ticket);
            });
        }
    }
}

/// POST /api/v1/essays/analyze
///
/// The session lock is released while the scorer runs, so other
/// requests on the same session are not held up by a slow analysis.
/// If the analysis is cancelled meanwhile (logout) the answer is 409 and
/// the session is left as the cancelling request put it.
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<AnalyzeRequest>,
) -> ApiResult<Response> {
    let (session_id, handle) = state.session(&headers).await;

    let mut draft = Draft::new(req.topic, req.content);
    if let Some(secs) = req.time_spent {
        draft = draft.time_spent(secs);
    }

    let (ticket, request) = {
        let mut session = handle.lock().await;
        let session = &mut *session;
        match session.flow.begin(&draft, &session.store) {
            SubmitDecision::Analyzing(ticket, request) => (ticket, request),
            SubmitDecision::Blocked => return Err(ApiError::TrialExhausted),
            SubmitDecision::Rejected(DraftError::Busy) => {
                return Err(ApiError::Conflict(DraftError::Busy.to_string()))
            }
            SubmitDecision::Rejected(err) => return Err(ApiError::Validation(err.to_string())),
        }
    };

    let guard = AbandonOnDrop {
        handle: Some(Arc::clone(&handle)),
        ticket,
    };
    let result = state.scorer.analyze(&request).await;

    let mut session = handle.lock().await;
    guard.disarm();
    let session = &mut *session;
    let essay = session.flow.complete(ticket, result, &mut session.store)?;
    let trials_left = match request.user_id {
        Some(_) => None,
        None => Some(session.store.state().trial_count),
    };

    let report = FeedbackReport::from(&essay);
    Ok(with_session(
        session_id,
        AnalyzeResponse {
            essay,
            report,
            trials_left,
        },
    ))
}

/// GET /api/v1/essays
pub async fn list_essays(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<ListResponse<EssayRecord>>> {
    let status = parse_facet::<EssayStatus>(params.status.as_deref())?;
    let kind = parse_facet::<EssayKind>(params.kind.as_deref())?;

    let query = ListQuery::new()
        .search(params.search.unwrap_or_default())
        .facet_opt(status.map(EssayFacet::Status))
        .facet_opt(kind.map(EssayFacet::Kind));

    Ok(Json(query.apply(&state.catalog.essays).into()))
}
