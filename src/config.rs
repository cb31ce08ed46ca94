//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and `BANDUP_*` environment overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::submission::{HttpScorer, HttpScorerConfig, MockScorer, Scorer, ScoringError};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://127.0.0.1:5173".to_string(),
    ]
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Upper bound on handling one request, at least a second
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Which scorer analyzes essays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringBackend {
    /// Canned feedback after a fixed delay
    #[default]
    Mock,
    /// Remote analysis service
    Http,
}

/// Essay scoring configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub backend: ScoringBackend,

    #[serde(default = "default_scoring_url")]
    pub base_url: String,

    #[serde(default = "default_mock_latency")]
    pub latency_ms: u64,

    #[serde(default = "default_scoring_timeout")]
    pub request_timeout_ms: u64,
}

fn default_scoring_url() -> String {
    "http://localhost:9000".to_string()
}

fn default_mock_latency() -> u64 {
    2000
}

fn default_scoring_timeout() -> u64 {
    30_000
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            backend: ScoringBackend::default(),
            base_url: default_scoring_url(),
            latency_ms: default_mock_latency(),
            request_timeout_ms: default_scoring_timeout(),
        }
    }
}

impl ScoringConfig {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    pub fn http(&self) -> HttpScorerConfig {
        HttpScorerConfig {
            base_url: self.base_url.clone(),
            request_timeout_ms: self.request_timeout_ms,
        }
    }

    /// Instantiate the configured scorer
    pub fn build_scorer(&self) -> Result<Arc<dyn Scorer>, ScoringError> {
        let scorer: Arc<dyn Scorer> = match self.backend {
            ScoringBackend::Mock => Arc::new(MockScorer::new(self.latency())),
            ScoringBackend::Http => Arc::new(HttpScorer::new(self.http())?),
        };
        tracing::info!(scorer = scorer.name(), "Scorer ready");
        Ok(scorer)
    }
}

/// Defaults for new visitor sessions
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_trial_count")]
    pub trial_count: u32,

    #[serde(default = "default_timer_minutes")]
    pub timer_minutes: u32,

    /// Sessions unused for this long are forgotten
    #[serde(default = "default_idle_timeout_minutes")]
    pub idle_timeout_minutes: u64,

    /// Most sessions kept at once; the least recently used one makes room
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_trial_count() -> u32 {
    crate::store::DEFAULT_TRIAL_COUNT
}

fn default_timer_minutes() -> u32 {
    crate::timer::DEFAULT_DURATION_MINUTES
}

fn default_idle_timeout_minutes() -> u64 {
    120
}

fn default_max_sessions() -> usize {
    10_000
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            trial_count: default_trial_count(),
            timer_minutes: default_timer_minutes(),
            idle_timeout_minutes: default_idle_timeout_minutes(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_minutes.max(1) * 60)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    /// Install the global subscriber; `RUST_LOG` wins over `level`
    pub fn init(&self) {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("bandup={},tower_http=debug", self.level).into()
        });

        let registry = tracing_subscriber::registry().with(filter);
        let result = if self.format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
        } else {
            registry.with(tracing_subscriber::fmt::layer()).try_init()
        };

        if let Err(e) = result {
            eprintln!("Logging already initialized: {}", e);
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("bandup").join("config.toml")),
            Some(PathBuf::from("/etc/bandup/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `BANDUP_*` overrides read through `lookup`
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // API overrides
        if let Some(host) = lookup("BANDUP_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("BANDUP_API_PORT").and_then(|p| p.parse().ok()) {
            self.api.port = port;
        }

        // Scoring overrides
        match lookup("BANDUP_SCORING_BACKEND").as_deref() {
            Some("mock") => self.scoring.backend = ScoringBackend::Mock,
            Some("http") => self.scoring.backend = ScoringBackend::Http,
            Some(other) => tracing::warn!("Ignoring unknown scoring backend {:?}", other),
            None => {}
        }
        if let Some(url) = lookup("BANDUP_SCORING_URL") {
            self.scoring.base_url = url;
        }

        // Session overrides
        if let Some(count) = lookup("BANDUP_TRIAL_COUNT").and_then(|c| c.parse().ok()) {
            self.session.trial_count = count;
        }

        // Logging overrides
        if let Some(level) = lookup("BANDUP_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("BANDUP_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# BandUP Configuration
#
# Environment variables override these settings:
# - BANDUP_API_HOST
# - BANDUP_API_PORT
# - BANDUP_SCORING_BACKEND
# - BANDUP_SCORING_URL
# - BANDUP_TRIAL_COUNT
# - BANDUP_LOG_LEVEL
# - BANDUP_LOG_FORMAT

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8082

# Allowed CORS origins
cors_origins = ["http://localhost:5173", "http://127.0.0.1:5173"]

# Request timeout in seconds
request_timeout_secs = 30

[scoring]
# Scorer: mock (canned feedback) or http (analysis service)
backend = "mock"

# Analysis service URL, used by the http backend
base_url = "http://localhost:9000"

# Delay before the mock scorer answers (ms)
latency_ms = 2000

# Request timeout for the http backend (ms)
request_timeout_ms = 30000

[session]
# Free essay checks for anonymous visitors
trial_count = 3

# Countdown length for the writing timer (minutes)
timer_minutes = 60

# Forget sessions idle for this long (minutes)
idle_timeout_minutes = 120

# Most sessions kept in memory
max_sessions = 10000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.api.port, 8082);
        assert_eq!(config.scoring.backend, ScoringBackend::Mock);
        assert_eq!(config.scoring.latency(), Duration::from_millis(2000));
        assert_eq!(config.session.trial_count, 3);
        assert_eq!(config.session.timer_minutes, 60);
        assert_eq!(config.session.idle_timeout(), Duration::from_secs(7200));
        assert_eq!(config.session.max_sessions, 10_000);
        assert_eq!(config.api.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_zero_timeouts_are_raised() {
        let mut config = Config::default();
        config.api.request_timeout_secs = 0;
        config.session.idle_timeout_minutes = 0;
        assert_eq!(config.api.request_timeout(), Duration::from_secs(1));
        assert_eq!(config.session.idle_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[scoring]\nbackend = \"http\"\nbase_url = \"http://scorer:9000\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.scoring.backend, ScoringBackend::Http);
        assert_eq!(config.scoring.http().base_url, "http://scorer:9000");
        assert_eq!(config.api.host, "0.0.0.0");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_build_scorer_follows_backend() {
        let mut scoring = ScoringConfig::default();
        assert_eq!(scoring.build_scorer().unwrap().name(), "mock");
        scoring.backend = ScoringBackend::Http;
        assert_eq!(scoring.build_scorer().unwrap().name(), "http");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api\nport = ").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("BANDUP_API_PORT", "9999"),
            ("BANDUP_SCORING_BACKEND", "http"),
            ("BANDUP_TRIAL_COUNT", "not-a-number"),
            ("BANDUP_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.api.port, 9999);
        assert_eq!(config.scoring.backend, ScoringBackend::Http);
        assert_eq!(config.session.trial_count, 3);
        assert_eq!(config.logging.format, "json");
    }
}
