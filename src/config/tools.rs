//! Configuration of the concrete tool implementations.

use crate::state::GenerationSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// External paper retrieval (Semantic Scholar graph API).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub enabled: bool,
    pub base_url: String,
    /// Papers requested per search
    pub limit: u32,
    /// Environment variable holding an API key, sent as `x-api-key`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://api.semanticscholar.org".to_string(),
            limit: 5,
            api_key_env: None,
        }
    }
}

/// OpenAI-compatible text generation used by the intent classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub enabled: bool,
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// Used when the conversation supplies no settings of its own
    pub defaults: GenerationSettings,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://api.openai.com".to_string(),
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            defaults: GenerationSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeGuardConfig {
    pub enabled: bool,
    /// Phrases asking the agent to answer without evidence
    pub blocked_requests: Vec<String>,
}

impl Default for ScopeGuardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            blocked_requests: vec![
                "ignore previous instructions".to_string(),
                "ignore the papers".to_string(),
                "make something up".to_string(),
                "make it up".to_string(),
                "without citing".to_string(),
                "from your own knowledge".to_string(),
            ],
        }
    }
}

/// Where file-origin papers are read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    pub root: PathBuf,
    /// Fetch url-origin papers over HTTP
    pub allow_remote: bool,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            allow_remote: false,
        }
    }
}
