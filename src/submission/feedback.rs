//! Feedback report
//!
//! A display projection of a scored [`Essay`]: one row per IELTS
//! criterion plus general comments and analysis findings.

use serde::Serialize;
use std::fmt::Write;

use crate::store::Essay;

/// One criterion with its band and comments
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CriterionRow {
    pub label: &'static str,
    pub band: f64,
    pub comments: Vec<String>,
}

/// Everything the results panel shows for an essay
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeedbackReport {
    pub overall: f64,
    pub criteria: Vec<CriterionRow>,
    pub general: Vec<String>,
    pub grammar_issues: usize,
    pub repeated_words: usize,
    pub time_spent: Option<f64>,
}

impl From<&Essay> for FeedbackReport {
    fn from(essay: &Essay) -> Self {
        let score = &essay.score;
        let feedback = &essay.feedback;
        let criteria = vec![
            CriterionRow {
                label: "Task Achievement",
                band: score.task_achievement,
                comments: feedback.task_achievement.clone(),
            },
            CriterionRow {
                label: "Coherence & Cohesion",
                band: score.coherence_and_cohesion,
                comments: feedback.coherence_and_cohesion.clone(),
            },
            CriterionRow {
                label: "Lexical Resource",
                band: score.lexical_resource,
                comments: feedback.lexical_resource.clone(),
            },
            CriterionRow {
                label: "Grammatical Range",
                band: score.grammatical_range,
                comments: feedback.grammatical_range.clone(),
            },
        ];

        Self {
            overall: score.overall,
            criteria,
            general: feedback.general.clone(),
            grammar_issues: essay.analysis.grammar_errors.len(),
            repeated_words: essay.analysis.vocabulary_repetition.len(),
            time_spent: essay.time_spent,
        }
    }
}

impl FeedbackReport {
    /// Plain-text rendering for terminals
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Overall band: {}", self.overall);
        if let Some(secs) = self.time_spent {
            let secs = secs.max(0.0) as u64;
            let _ = writeln!(out, "Time spent: {}m {:02}s", secs / 60, secs % 60);
        }
        for row in &self.criteria {
            let _ = writeln!(out);
            let _ = writeln!(out, "{:<22} {:.1}", row.label, row.band);
            for comment in &row.comments {
                let _ = writeln!(out, "  - {}", comment);
            }
        }
        if !self.general.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "General");
            for comment in &self.general {
                let _ = writeln!(out, "  - {}", comment);
            }
        }
        if self.grammar_issues > 0 || self.repeated_words > 0 {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "Grammar issues: {}, repeated words: {}",
                self.grammar_issues, self.repeated_words
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::scorer::{canned_essay, AnalysisRequest};

    #[test]
    fn test_report_from_canned_essay() {
        let essay = canned_essay(&AnalysisRequest {
            content: "text".to_string(),
            topic: "topic".to_string(),
            user_id: None,
            time_spent: Some(754.0),
        });
        let report = FeedbackReport::from(&essay);
        assert_eq!(report.criteria.len(), 4);
        assert_eq!(report.criteria[1].band, 6.5);

        let text = report.render_text();
        assert!(text.starts_with("Overall band: 6.75"));
        assert!(text.contains("Time spent: 12m 34s"));
        assert!(text.contains("  - Minor errors in article usage"));
        assert!(!text.contains("Grammar issues"));
    }
}
