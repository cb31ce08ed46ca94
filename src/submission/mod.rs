//! Essay Submission
//!
//! Collects a topic and essay text, enforces the minimum word count,
//! gates anonymous visitors on their free trials and hands the essay to
//! a [`Scorer`].
//!
//! ## Data Flow
//!
//! 1. [`SubmissionFlow::begin`] validates the [`Draft`] against the session
//! 2. A [`Scorer`] analyzes it, optionally on a [`PendingAnalysis`] task
//! 3. [`SubmissionFlow::complete`] records the essay and spends a trial
//! 4. [`FeedbackReport`] projects the essay for display

mod feedback;
mod flow;
mod scorer;
mod words;

pub use feedback::{CriterionRow, FeedbackReport};
pub use flow::{
    Draft, DraftError, PendingAnalysis, SubmitDecision, Submission, SubmissionFlow,
    SubmissionState, Ticket,
};
pub use scorer::{
    canned_essay, AnalysisRequest, HttpScorer, HttpScorerConfig, MockScorer, Scorer, ScoringError,
};
pub use words::{word_count, words_needed, MIN_WORDS};
