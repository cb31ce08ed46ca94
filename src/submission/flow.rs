//! Essay submission state machine
//!
//! ```text
//! Idle --submit--> Validating --ok--------------> Analyzing --result--> Scored
//!                      |  \--no user, no trials--> Blocked
//!                      \--empty / too short------> Idle
//! ```
//!
//! The synchronous half ([`SubmissionFlow::begin`]) decides where a submit
//! attempt goes and hands out a [`Ticket`] for the analysis. The
//! asynchronous half runs a [`Scorer`] and feeds the result back through
//! [`SubmissionFlow::complete`] with that ticket. A result whose ticket is
//! no longer the running one is dropped without touching the store.

use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;

use super::scorer::{AnalysisRequest, Scorer, ScoringError};
use super::words::{word_count, MIN_WORDS};
use crate::store::{Essay, Store};

/// Where the submission flow currently is
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Validating,
    /// `requester` is the signed-in user at submit time, if any
    Analyzing {
        ticket: Ticket,
        requester: Option<String>,
    },
    Scored(Box<Essay>),
    /// Free trials used up; the upgrade prompt is showing
    Blocked,
}

/// Why a draft was not sent for analysis
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("Essay is empty")]
    Empty,

    #[error("Essay has {words} words, at least {} are required", MIN_WORDS)]
    TooShort { words: usize },

    #[error("An analysis is already running")]
    Busy,
}

/// Identifies one analysis started by [`SubmissionFlow::begin`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// Essay text plus topic as entered in the form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    pub topic: String,
    pub content: String,
    /// Seconds spent writing, if measured
    pub time_spent: Option<f64>,
}

impl Draft {
    pub fn new(topic: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            content: content.into(),
            time_spent: None,
        }
    }

    pub fn time_spent(mut self, secs: f64) -> Self {
        self.time_spent = Some(secs);
        self
    }

    pub fn word_count(&self) -> usize {
        word_count(&self.content)
    }

    /// Check the draft on its own, without looking at the session
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.content.trim().is_empty() {
            return Err(DraftError::Empty);
        }
        let words = self.word_count();
        if words < MIN_WORDS {
            return Err(DraftError::TooShort { words });
        }
        Ok(())
    }
}

/// Result of a submit attempt
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitDecision {
    /// Stayed `Idle`
    Rejected(DraftError),
    /// Moved to `Blocked`
    Blocked,
    /// Moved to `Analyzing`; send the request to a scorer and hand the
    /// ticket back to [`SubmissionFlow::complete`]
    Analyzing(Ticket, AnalysisRequest),
}

/// Final result of [`SubmissionFlow::submit`]
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Rejected(DraftError),
    Blocked,
    Scored(Box<Essay>),
}

/// One essay form's submission state
#[derive(Debug, Default)]
pub struct SubmissionFlow {
    state: SubmissionState,
    issued: u64,
}

impl SubmissionFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn is_analyzing(&self) -> bool {
        matches!(self.state, SubmissionState::Analyzing { .. })
    }

    /// Handle a submit attempt
    pub fn begin(&mut self, draft: &Draft, store: &Store) -> SubmitDecision {
        if matches!(
            self.state,
            SubmissionState::Analyzing { .. } | SubmissionState::Validating
        ) {
            return SubmitDecision::Rejected(DraftError::Busy);
        }

        if let Err(err) = draft.validate() {
            tracing::debug!(error = %err, "Draft rejected");
            self.state = SubmissionState::Idle;
            return SubmitDecision::Rejected(err);
        }
        self.state = SubmissionState::Validating;

        let session = store.state();
        if session.user.is_none() && session.trial_count == 0 {
            tracing::info!("Free trials exhausted, submission blocked");
            self.state = SubmissionState::Blocked;
            return SubmitDecision::Blocked;
        }

        self.issued += 1;
        let ticket = Ticket(self.issued);
        let requester = session.user.as_ref().map(|u| u.id.clone());
        self.state = SubmissionState::Analyzing {
            ticket,
            requester: requester.clone(),
        };
        tracing::info!(words = draft.word_count(), "Essay sent for analysis");
        SubmitDecision::Analyzing(
            ticket,
            AnalysisRequest {
                content: draft.content.clone(),
                topic: draft.topic.clone(),
                user_id: requester,
                time_spent: draft.time_spent,
            },
        )
    }

    /// Feed the scorer's answer for `ticket` back in
    ///
    /// Who pays is decided by the requester recorded at submit time: an
    /// anonymous submit spends one free check, and the essay joins a
    /// user's history only if that same user is still signed in. On
    /// failure the flow returns to `Idle` and the trial is not spent.
    ///
    /// If `ticket` is not the running analysis (it was cancelled, or a
    /// newer one replaced it) the result is dropped, the store is left
    /// alone and [`ScoringError::Cancelled`] is returned.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<Essay, ScoringError>,
        store: &mut Store,
    ) -> Result<Essay, ScoringError> {
        let requester = match &self.state {
            SubmissionState::Analyzing {
                ticket: running,
                requester,
            } if *running == ticket => requester.clone(),
            other => {
                tracing::debug!(state = ?other, "Dropping result of a cancelled analysis");
                return Err(ScoringError::Cancelled);
            }
        };

        match result {
            Ok(essay) => {
                let signed_in = store.state().user.as_ref().map(|u| u.id.clone());
                if requester.is_some() && requester == signed_in {
                    store.record_essay(essay.clone());
                } else {
                    store.set_current_essay(Some(essay.clone()));
                }
                if requester.is_none() {
                    let left = store.decrement_trial_count();
                    tracing::info!(trials_left = left, "Anonymous check used a free trial");
                }
                self.state = SubmissionState::Scored(Box::new(essay.clone()));
                Ok(essay)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Essay analysis failed");
                self.state = SubmissionState::Idle;
                Err(err)
            }
        }
    }

    /// Drop a running analysis and go back to `Idle`
    pub fn cancel(&mut self) {
        if self.is_analyzing() {
            tracing::debug!("Analysis cancelled");
            self.state = SubmissionState::Idle;
        }
    }

    /// Cancel `ticket` if it is still the running analysis
    pub fn abandon(&mut self, ticket: Ticket) {
        let running = matches!(
            &self.state,
            SubmissionState::Analyzing { ticket: current, .. } if *current == ticket
        );
        if running {
            tracing::debug!("Analysis abandoned");
            self.state = SubmissionState::Idle;
        }
    }

    /// Close the upgrade prompt
    pub fn dismiss_block(&mut self) {
        if self.state == SubmissionState::Blocked {
            self.state = SubmissionState::Idle;
        }
    }

    /// Countdown ran out: submit whatever was written, if anything
    pub fn on_time_up(&mut self, draft: &Draft, store: &Store) -> Option<SubmitDecision> {
        if draft.content.trim().is_empty() {
            return None;
        }
        Some(self.begin(draft, store))
    }

    /// Validate, score and record in one go
    pub async fn submit(
        &mut self,
        draft: &Draft,
        store: &mut Store,
        scorer: &dyn Scorer,
    ) -> Result<Submission, ScoringError> {
        match self.begin(draft, store) {
            SubmitDecision::Rejected(err) => Ok(Submission::Rejected(err)),
            SubmitDecision::Blocked => Ok(Submission::Blocked),
            SubmitDecision::Analyzing(ticket, request) => {
                let result = scorer.analyze(&request).await;
                let essay = self.complete(ticket, result, store)?;
                Ok(Submission::Scored(Box::new(essay)))
            }
        }
    }
}

/// A scoring call running on its own task
///
/// Dropping the handle aborts the task, so a result never arrives for a
/// form that has gone away.
pub struct PendingAnalysis {
    handle: JoinHandle<Result<Essay, ScoringError>>,
}

impl PendingAnalysis {
    pub fn spawn(scorer: Arc<dyn Scorer>, request: AnalysisRequest) -> Self {
        let handle = tokio::spawn(async move {
            tracing::debug!(scorer = scorer.name(), "Analysis task started");
            scorer.analyze(&request).await
        });
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Abort the analysis
    pub fn cancel(self) {
        self.handle.abort();
    }

    /// Wait for the scorer's answer
    pub async fn wait(mut self) -> Result<Essay, ScoringError> {
        match (&mut self.handle).await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(ScoringError::Cancelled),
            Err(e) => Err(ScoringError::Task(e.to_string())),
        }
    }
}

impl Drop for PendingAnalysis {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ManualClock;
    use crate::submission::scorer::{canned_essay, MockScorer};
    use chrono::Utc;
    use std::time::Duration;

    fn essay_text(words: usize) -> String {
        vec!["word"; words].join(" ")
    }

    fn store() -> Store {
        Store::new(Arc::new(ManualClock::new(Utc::now())))
    }

    #[test]
    fn test_word_count_threshold() {
        let store = store();
        let mut flow = SubmissionFlow::new();

        let decision = flow.begin(&Draft::new("t", essay_text(149)), &store);
        assert_eq!(
            decision,
            SubmitDecision::Rejected(DraftError::TooShort { words: 149 })
        );
        assert_eq!(flow.state(), &SubmissionState::Idle);

        let decision = flow.begin(&Draft::new("t", essay_text(150)), &store);
        assert!(matches!(decision, SubmitDecision::Analyzing(..)));
        assert!(flow.is_analyzing());

        flow.cancel();
        assert_eq!(flow.state(), &SubmissionState::Idle);
    }

    #[test]
    fn test_empty_draft_rejected() {
        let store = store();
        let mut flow = SubmissionFlow::new();
        let decision = flow.begin(&Draft::new("t", "   \n "), &store);
        assert_eq!(decision, SubmitDecision::Rejected(DraftError::Empty));
    }

    #[test]
    fn test_second_submit_while_analyzing_is_busy() {
        let store = store();
        let mut flow = SubmissionFlow::new();
        let draft = Draft::new("t", essay_text(160));
        assert!(matches!(flow.begin(&draft, &store), SubmitDecision::Analyzing(..)));
        assert_eq!(
            flow.begin(&draft, &store),
            SubmitDecision::Rejected(DraftError::Busy)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_trial_then_blocked() {
        let mut store = store();
        store.decrement_trial_count();
        store.decrement_trial_count();
        assert_eq!(store.state().trial_count, 1);

        let scorer = MockScorer::default();
        let mut flow = SubmissionFlow::new();
        let draft = Draft::new("Bar chart", essay_text(160));

        let result = flow.submit(&draft, &mut store, &scorer).await.unwrap();
        assert!(matches!(result, Submission::Scored(_)));
        assert!(matches!(flow.state(), SubmissionState::Scored(_)));
        assert_eq!(store.state().trial_count, 0);
        assert!(store.state().current_essay.is_some());

        let result = flow.submit(&draft, &mut store, &scorer).await.unwrap();
        assert_eq!(result, Submission::Blocked);
        assert_eq!(flow.state(), &SubmissionState::Blocked);

        flow.dismiss_block();
        assert_eq!(flow.state(), &SubmissionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_signed_in_user_keeps_trials() {
        let mut store = store();
        assert!(store.login("jane@example.com", "secret1").is_success());
        for _ in 0..3 {
            store.decrement_trial_count();
        }

        let mut flow = SubmissionFlow::new();
        let result = flow
            .submit(
                &Draft::new("Bar chart", essay_text(180)),
                &mut store,
                &MockScorer::default(),
            )
            .await
            .unwrap();

        let Submission::Scored(essay) = result else {
            panic!("expected a scored essay");
        };
        assert_eq!(essay.user_id, store.state().user.as_ref().map(|u| u.id.clone()));
        assert_eq!(store.state().user.as_ref().unwrap().stats.total_essays, 1);
        assert_eq!(store.state().trial_count, 0);
    }

    #[test]
    fn test_failed_analysis_returns_to_idle_without_spending_trial() {
        let mut store = store();
        let mut flow = SubmissionFlow::new();
        let SubmitDecision::Analyzing(ticket, _) =
            flow.begin(&Draft::new("t", essay_text(150)), &store)
        else {
            panic!("expected an analysis to start");
        };

        let result = flow.complete(ticket, Err(ScoringError::Unavailable), &mut store);
        assert!(result.is_err());
        assert_eq!(flow.state(), &SubmissionState::Idle);
        assert_eq!(store.state().trial_count, 3);
    }

    fn start(flow: &mut SubmissionFlow, store: &Store) -> (Ticket, AnalysisRequest) {
        match flow.begin(&Draft::new("Bar chart", essay_text(160)), store) {
            SubmitDecision::Analyzing(ticket, request) => (ticket, request),
            other => panic!("expected an analysis to start, got {:?}", other),
        }
    }

    #[test]
    fn test_anonymous_submit_pays_even_after_sign_in() {
        let mut store = store();
        let mut flow = SubmissionFlow::new();
        let (ticket, request) = start(&mut flow, &store);
        assert_eq!(request.user_id, None);

        assert!(store.login("jane@example.com", "secret1").is_success());
        let essay = flow
            .complete(ticket, Ok(canned_essay(&request)), &mut store)
            .unwrap();

        assert_eq!(store.state().trial_count, 2);
        let user = store.state().user.as_ref().unwrap();
        assert!(user.essays.is_empty());
        assert_eq!(user.stats.total_essays, 0);
        assert_eq!(store.state().current_essay.as_ref(), Some(&essay));
    }

    #[test]
    fn test_signed_in_submit_is_free_after_sign_out() {
        let mut store = store();
        assert!(store.login("jane@example.com", "secret1").is_success());
        let mut flow = SubmissionFlow::new();
        let (ticket, request) = start(&mut flow, &store);
        assert!(request.user_id.is_some());

        store.set_user(None);
        flow.complete(ticket, Ok(canned_essay(&request)), &mut store).unwrap();
        assert_eq!(store.state().trial_count, 3);
    }

    #[test]
    fn test_result_after_cancel_is_dropped() {
        let mut store = store();
        let mut flow = SubmissionFlow::new();
        let (ticket, request) = start(&mut flow, &store);

        flow.cancel();
        let result = flow.complete(ticket, Ok(canned_essay(&request)), &mut store);

        assert!(matches!(result, Err(ScoringError::Cancelled)));
        assert_eq!(flow.state(), &SubmissionState::Idle);
        assert_eq!(store.state().trial_count, 3);
        assert!(store.state().current_essay.is_none());
    }

    #[test]
    fn test_stale_result_does_not_finish_newer_analysis() {
        let mut store = store();
        let mut flow = SubmissionFlow::new();
        let (old, request) = start(&mut flow, &store);
        flow.cancel();
        let (new, _) = start(&mut flow, &store);
        assert_ne!(old, new);

        let stale = flow.complete(old, Ok(canned_essay(&request)), &mut store);
        assert!(matches!(stale, Err(ScoringError::Cancelled)));
        assert!(flow.is_analyzing());
        assert_eq!(store.state().trial_count, 3);

        flow.complete(new, Ok(canned_essay(&request)), &mut store).unwrap();
        assert!(matches!(flow.state(), SubmissionState::Scored(_)));
        assert_eq!(store.state().trial_count, 2);
    }

    #[test]
    fn test_abandon_only_touches_its_own_analysis() {
        let store = store();
        let mut flow = SubmissionFlow::new();
        let (old, _) = start(&mut flow, &store);
        flow.cancel();
        let (new, _) = start(&mut flow, &store);

        flow.abandon(old);
        assert!(flow.is_analyzing());
        flow.abandon(new);
        assert_eq!(flow.state(), &SubmissionState::Idle);
    }

    #[test]
    fn test_time_up_with_empty_draft_does_nothing() {
        let store = store();
        let mut flow = SubmissionFlow::new();
        assert!(flow.on_time_up(&Draft::new("t", ""), &store).is_none());
        let decision = flow.on_time_up(&Draft::new("t", "too short"), &store);
        assert!(matches!(
            decision,
            Some(SubmitDecision::Rejected(DraftError::TooShort { words: 2 }))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_analysis_completes() {
        let scorer: Arc<dyn Scorer> = Arc::new(MockScorer::new(Duration::from_millis(500)));
        let request = AnalysisRequest {
            content: essay_text(150),
            topic: "t".to_string(),
            user_id: None,
            time_spent: None,
        };
        let pending = PendingAnalysis::spawn(scorer, request);
        let essay = pending.wait().await.unwrap();
        assert_eq!(essay.score.overall, 6.75);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_pending_analysis_aborts_it() {
        let finished = Arc::new(std::sync::atomic::AtomicBool::new(false));

        struct Flagging(Arc<std::sync::atomic::AtomicBool>);

        #[async_trait::async_trait]
        impl Scorer for Flagging {
            fn name(&self) -> &'static str {
                "flagging"
            }

            async fn analyze(&self, request: &AnalysisRequest) -> Result<Essay, ScoringError> {
                tokio::time::sleep(Duration::from_secs(2)).await;
                self.0.store(true, std::sync::atomic::Ordering::SeqCst);
                Ok(canned_essay(request))
            }
        }

        let pending = PendingAnalysis::spawn(
            Arc::new(Flagging(Arc::clone(&finished))),
            AnalysisRequest {
                content: essay_text(150),
                topic: "t".to_string(),
                user_id: None,
                time_spent: None,
            },
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(pending);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!finished.load(std::sync::atomic::Ordering::SeqCst));
    }
}
