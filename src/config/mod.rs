//! Configuration module for Scholar
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`SCHOLAR_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use scholar::config::ScholarConfig;
//!
//! let config = ScholarConfig::default();
//! assert!(!config.retrieval.enabled);
//!
//! let toml = r#"
//! [executor]
//! max_concurrency = 2
//! "#;
//! let config: ScholarConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.executor.max_concurrency, 2);
//! ```

pub mod error;
pub mod executor;
pub mod logging;
pub mod scope;
pub mod synthesis;
pub mod tools;

pub use error::ConfigError;
pub use executor::ExecutorConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use scope::{ScopeMatcher, ScopePolicy};
pub use synthesis::SynthesisConfig;
pub use tools::{DocumentsConfig, GenerationConfig, RetrievalConfig, ScopeGuardConfig};

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration for the research pipeline and its tools.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScholarConfig {
    /// Scope policy injected into the validator
    pub scope: ScopePolicy,
    /// Tool execution limits
    pub executor: ExecutorConfig,
    /// Evidence synthesis thresholds
    pub synthesis: SynthesisConfig,
    /// External paper retrieval
    pub retrieval: RetrievalConfig,
    /// Text generation endpoint for the classifier
    pub generation: GenerationConfig,
    /// Scope guard tool
    pub scope_guard: ScopeGuardConfig,
    /// Document store for attached papers
    pub documents: DocumentsConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ScholarConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(level) = std::env::var("SCHOLAR_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("SCHOLAR_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        if let Ok(retrieval) = std::env::var("SCHOLAR_RETRIEVAL") {
            self.retrieval.enabled = retrieval.to_lowercase() == "true";
        }
        if let Ok(url) = std::env::var("SCHOLAR_RETRIEVAL_URL") {
            self.retrieval.base_url = url;
        }
        if let Ok(generation) = std::env::var("SCHOLAR_GENERATION") {
            self.generation.enabled = generation.to_lowercase() == "true";
        }
        if let Ok(url) = std::env::var("SCHOLAR_GENERATION_URL") {
            self.generation.base_url = url;
        }
        if let Ok(model) = std::env::var("SCHOLAR_MODEL") {
            self.generation.defaults.model = model;
        }

        if let Ok(timeout) = std::env::var("SCHOLAR_TOOL_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse() {
                self.executor.invocation_timeout_ms = ms;
            }
        }
        if let Ok(root) = std::env::var("SCHOLAR_DOCUMENTS_ROOT") {
            self.documents.root = root.into();
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.executor.max_concurrency == 0 {
            return Err(ConfigError::Validation {
                field: "executor.max_concurrency".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.executor.invocation_timeout_ms == 0 || self.executor.critical_timeout_ms == 0 {
            return Err(ConfigError::Validation {
                field: "executor".to_string(),
                message: "timeouts must be non-zero".to_string(),
            });
        }

        for (field, value) in [
            ("synthesis.topic_similarity", self.synthesis.topic_similarity),
            (
                "synthesis.corroboration_similarity",
                self.synthesis.corroboration_similarity,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Validation {
                    field: field.to_string(),
                    message: format!("must be within 0.0..=1.0, got {}", value),
                });
            }
        }
        if self.synthesis.max_claims_per_section == 0 {
            return Err(ConfigError::Validation {
                field: "synthesis.max_claims_per_section".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if self.retrieval.enabled && self.retrieval.base_url.is_empty() {
            return Err(ConfigError::Validation {
                field: "retrieval.base_url".to_string(),
                message: "URL cannot be empty when retrieval is enabled".to_string(),
            });
        }
        if self.generation.enabled && self.generation.base_url.is_empty() {
            return Err(ConfigError::Validation {
                field: "generation.base_url".to_string(),
                message: "URL cannot be empty when generation is enabled".to_string(),
            });
        }

        self.scope.validate()
    }
}
