//! Essay Scorers
//!
//! The scoring engine lives outside this crate. [`Scorer`] is the seam:
//! [`MockScorer`] answers with a canned analysis after a fixed delay,
//! [`HttpScorer`] calls the external service's REST API.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::store::{Analysis, BandScores, Essay, Feedback};

/// Body sent to the scoring service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisRequest {
    pub content: String,
    pub topic: String,
    /// Requester, if signed in
    #[serde(skip)]
    pub user_id: Option<String>,
    /// Seconds spent writing, if the essay timer ran
    #[serde(skip)]
    pub time_spent: Option<f64>,
}

/// Errors that can occur while scoring an essay
#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Scoring service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Scoring service is not available")]
    Unavailable,

    #[error("Scoring request timed out")]
    Timeout,

    #[error("Analysis was cancelled")]
    Cancelled,

    #[error("Analysis task failed: {0}")]
    Task(String),
}

/// Something that turns an essay draft into a scored [`Essay`]
#[async_trait]
pub trait Scorer: Send + Sync {
    /// Human-readable name for logs
    fn name(&self) -> &'static str;

    async fn analyze(&self, request: &AnalysisRequest) -> Result<Essay, ScoringError>;
}

/// Stand-in scorer with fixed latency and a canned result
#[derive(Debug, Clone)]
pub struct MockScorer {
    latency: Duration,
}

impl MockScorer {
    /// Latency used by the web client
    pub const DEFAULT_LATENCY: Duration = Duration::from_millis(2000);

    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Default for MockScorer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LATENCY)
    }
}

#[async_trait]
impl Scorer for MockScorer {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<Essay, ScoringError> {
        tokio::time::sleep(self.latency).await;
        Ok(canned_essay(request))
    }
}

/// The fixed analysis returned by [`MockScorer`]
pub fn canned_essay(request: &AnalysisRequest) -> Essay {
    let now = Utc::now();
    Essay {
        id: uuid::Uuid::new_v4().to_string(),
        content: request.content.clone(),
        time_spent: request.time_spent,
        score: BandScores {
            task_achievement: 7.0,
            coherence_and_cohesion: 6.5,
            lexical_resource: 7.0,
            grammatical_range: 6.5,
            overall: 6.75,
        },
        feedback: Feedback {
            task_achievement: lines(&[
                "Good overview of main trends",
                "Key features well highlighted",
                "Data accurately reported",
            ]),
            coherence_and_cohesion: lines(&[
                "Consider using more cohesive devices",
                "Good paragraph organization",
                "Clear progression of ideas",
            ]),
            lexical_resource: lines(&[
                "Good range of vocabulary",
                "Effective use of collocations",
                "Consider using more sophisticated terms",
            ]),
            grammatical_range: lines(&[
                "Some complex structures used effectively",
                "Good control of grammar",
                "Minor errors in article usage",
            ]),
            general: lines(&["Overall good attempt"]),
        },
        analysis: Analysis::default(),
        improved_version: request.content.clone(),
        created_at: now,
        user_id: request.user_id.clone(),
    }
}

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Configuration for [`HttpScorer`]
#[derive(Debug, Clone)]
pub struct HttpScorerConfig {
    /// Base URL of the scoring service (e.g. "http://localhost:9000")
    pub base_url: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for HttpScorerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9000".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

/// Client for the external scoring service
pub struct HttpScorer {
    client: Client,
    config: HttpScorerConfig,
}

impl HttpScorer {
    pub fn new(config: HttpScorerConfig) -> Result<Self, ScoringError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpScorerConfig {
        &self.config
    }
}

#[async_trait]
impl Scorer for HttpScorer {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<Essay, ScoringError> {
        let url = format!(
            "{}/essays/analyze",
            self.config.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ScoringError::Timeout
                } else if e.is_connect() {
                    ScoringError::Unavailable
                } else {
                    ScoringError::Request(e)
                }
            })?;

        if response.status().is_success() {
            let mut essay: Essay = response.json().await?;
            // The service does not know who asked
            essay.user_id = request.user_id.clone();
            if essay.time_spent.is_none() {
                essay.time_spent = request.time_spent;
            }
            Ok(essay)
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            Err(ScoringError::Api {
                status: status.as_u16(),
                message: text,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            content: "The graph shows".to_string(),
            topic: "Population growth".to_string(),
            user_id: Some("user-1".to_string()),
            time_spent: Some(120.0),
        }
    }

    #[test]
    fn test_canned_essay_scores() {
        let essay = canned_essay(&request());
        assert_eq!(essay.score.overall, 6.75);
        assert_eq!(essay.improved_version, "The graph shows");
        assert_eq!(essay.user_id.as_deref(), Some("user-1"));
        assert_eq!(essay.time_spent, Some(120.0));
        assert_eq!(essay.feedback.general, vec!["Overall good attempt"]);
    }

    #[test]
    fn test_canned_essays_get_distinct_ids() {
        let first = canned_essay(&request());
        let second = canned_essay(&request());
        assert_ne!(first.id, second.id);
        assert!(uuid::Uuid::parse_str(&first.id).is_ok());
    }

    #[test]
    fn test_request_body_omits_local_fields() {
        let json = serde_json::to_value(request()).unwrap();
        assert_eq!(json["topic"], "Population growth");
        assert!(json.get("user_id").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_scorer_waits_for_latency() {
        let scorer = MockScorer::default();
        let started = tokio::time::Instant::now();
        let essay = scorer.analyze(&request()).await.unwrap();
        assert!(started.elapsed() >= MockScorer::DEFAULT_LATENCY);
        assert_eq!(essay.score.task_achievement, 7.0);
    }

    #[tokio::test]
    async fn test_http_scorer_unreachable() {
        let scorer = HttpScorer::new(HttpScorerConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            request_timeout_ms: 500,
        })
        .unwrap();
        let result = scorer.analyze(&request()).await;
        assert!(result.is_err());
    }
}
