//! Scope policy: which questions the agent accepts.

use super::ConfigError;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

/// Scope policy injected into the validator.
///
/// Patterns are globs matched against the lowercased, whitespace-normalised
/// question, e.g. `"*capital of *"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopePolicy {
    /// A match puts the question out of scope
    pub blocked_patterns: Vec<String>,
    /// Research-domain keywords. Empty means any domain
    pub research_domains: Vec<String>,
    /// Reject (instead of warn) questions naming none of `research_domains`
    pub strict_domains: bool,
    /// Warn when a question has more parts than this
    pub max_question_parts: usize,
    /// Warn when a question is shorter than this
    pub min_question_words: usize,
}

impl Default for ScopePolicy {
    fn default() -> Self {
        Self {
            blocked_patterns: vec![
                "*write me a poem*".to_string(),
                "*write a story*".to_string(),
                "*tell me a joke*".to_string(),
                "*lottery numbers*".to_string(),
                "*horoscope*".to_string(),
            ],
            research_domains: Vec::new(),
            strict_domains: false,
            max_question_parts: 2,
            min_question_words: 3,
        }
    }
}

impl ScopePolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_question_parts == 0 {
            return Err(ConfigError::Validation {
                field: "scope.max_question_parts".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        self.compile().map(|_| ())
    }

    /// Compile the blocked patterns once, at startup.
    pub fn compile(&self) -> Result<ScopeMatcher, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.blocked_patterns {
            let glob = GlobBuilder::new(&pattern.to_lowercase())
                .case_insensitive(true)
                .build()
                .map_err(|source| ConfigError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })?;
            builder.add(glob);
        }
        let blocked = builder.build().map_err(|source| ConfigError::Pattern {
            pattern: self.blocked_patterns.join(", "),
            source,
        })?;

        Ok(ScopeMatcher {
            blocked,
            domains: self
                .research_domains
                .iter()
                .map(|d| d.to_lowercase())
                .collect(),
        })
    }
}

/// Compiled form of [`ScopePolicy`].
#[derive(Debug, Clone)]
pub struct ScopeMatcher {
    blocked: GlobSet,
    domains: Vec<String>,
}

impl Default for ScopeMatcher {
    fn default() -> Self {
        Self {
            blocked: GlobSet::empty(),
            domains: Vec::new(),
        }
    }
}

impl ScopeMatcher {
    pub fn is_blocked(&self, question: &str) -> bool {
        self.blocked.is_match(normalise(question))
    }

    /// True when no domains are configured or the question names one.
    pub fn mentions_domain(&self, question: &str) -> bool {
        if self.domains.is_empty() {
            return true;
        }
        let question = normalise(question);
        self.domains.iter().any(|d| question.contains(d.as_str()))
    }
}

fn normalise(question: &str) -> String {
    question
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
