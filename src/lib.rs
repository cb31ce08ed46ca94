//! # BandUP
//!
//! IELTS Writing practice backend: essay submission with band-score
//! feedback, a free-trial gate for anonymous visitors, a writing timer,
//! searchable lists for the community board and admin panel, and a
//! referral program.
//!
//! ## Modules
//!
//! - [`store`]: Per-visitor session state and its operations
//! - [`submission`]: Essay validation, scoring and feedback
//! - [`listing`]: Search, facet filters and sorting for list views
//! - [`timer`]: Countdown / stopwatch for timed writing
//! - [`pricing`]: Plans, billing cycles and discount quotes
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML configuration and logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bandup::store::Store;
//! use bandup::submission::{Draft, MockScorer, Submission, SubmissionFlow};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut store = Store::default();
//!     let mut flow = SubmissionFlow::new();
//!     let draft = Draft::new("Describe the chart", "The chart shows ...");
//!
//!     match flow.submit(&draft, &mut store, &MockScorer::default()).await? {
//!         Submission::Scored(essay) => println!("Band {}", essay.score.overall),
//!         Submission::Rejected(reason) => println!("{}", reason),
//!         Submission::Blocked => println!("No free checks left"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod listing;
pub mod pricing;
pub mod store;
pub mod submission;
pub mod timer;

// Re-export top-level types for convenience
pub use store::{Action, AuthResult, Essay, SessionState, Store, User};

pub use submission::{
    Draft, DraftError, FeedbackReport, HttpScorer, MockScorer, Scorer, ScoringError,
    SubmissionFlow, SubmissionState, Ticket,
};

pub use listing::{Catalog, Faceted, ListQuery, Listable, SortKey};

pub use timer::{TimerDriver, TimerMode, TimerModel};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{Config, ConfigError, LoggingConfig, ScoringBackend};
