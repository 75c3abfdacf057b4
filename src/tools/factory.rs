//! Tool registry construction from configuration.

use super::classifier::GenerativeIntentClassifier;
use super::documents::LocalDocumentStore;
use super::generation::OpenAiCompatibleGenerator;
use super::parser::SectionParser;
use super::reliability::HeuristicReliabilityAssessor;
use super::retrieval::SemanticScholarRetriever;
use super::scope_guard::PolicyScopeGuard;
use super::{ToolError, ToolHandle, ToolRegistry};
use crate::config::ScholarConfig;
use reqwest::Client;
use std::sync::Arc;

/// Build the capability registry described by `config`.
///
/// Parsing and reliability assessment are always available. Retrieval,
/// classification and the scope guard are registered only when enabled.
///
/// # Examples
///
/// ```
/// use scholar::config::ScholarConfig;
/// use scholar::tools::{factory::build_registry, Capability};
///
/// let registry = build_registry(&ScholarConfig::default()).unwrap();
/// assert!(registry.has(Capability::Parse));
/// assert!(!registry.has(Capability::Retrieve));
/// ```
pub fn build_registry(config: &ScholarConfig) -> Result<ToolRegistry, ToolError> {
    let client = Arc::new(
        Client::builder()
            .user_agent(concat!("scholar/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ToolError::Configuration(format!("HTTP client: {}", e)))?,
    );

    let mut registry = ToolRegistry::new();

    let mut store = LocalDocumentStore::new(config.documents.root.clone());
    if config.documents.allow_remote {
        store = store.with_remote(Arc::clone(&client));
    }
    registry.register(ToolHandle::Parse(Arc::new(SectionParser::new(
        Arc::new(store),
        config.synthesis.max_claims_per_section,
        config.synthesis.min_claim_words,
    ))));

    registry.register(ToolHandle::AssessReliability(Arc::new(
        HeuristicReliabilityAssessor::new(),
    )));

    if config.retrieval.enabled {
        let api_key = read_api_key(config.retrieval.api_key_env.as_deref());
        registry.register(ToolHandle::Retrieve(Arc::new(SemanticScholarRetriever::new(
            config.retrieval.base_url.clone(),
            api_key,
            Arc::clone(&client),
        ))));
    }

    if config.generation.enabled {
        let api_key = read_api_key(config.generation.api_key_env.as_deref());
        let generator = OpenAiCompatibleGenerator::new(
            config.generation.base_url.clone(),
            api_key,
            Arc::clone(&client),
        );
        registry.register(ToolHandle::ClassifyIntent(Arc::new(
            GenerativeIntentClassifier::new(Arc::new(generator)),
        )));
    }

    if config.scope_guard.enabled {
        let topics = config
            .scope
            .compile()
            .map_err(|e| ToolError::Configuration(e.to_string()))?;
        registry.register(ToolHandle::ValidateScope(Arc::new(
            PolicyScopeGuard::new(config.scope_guard.blocked_requests.clone()).with_topics(topics),
        )));
    }

    tracing::debug!(
        capabilities = ?registry.capabilities(),
        "Tool registry built"
    );
    Ok(registry)
}

/// Local OpenAI-compatible servers run without keys, so a missing variable
/// only disables the header.
fn read_api_key(env_var: Option<&str>) -> Option<String> {
    let name = env_var?;
    match std::env::var(name) {
        Ok(key) if !key.trim().is_empty() => Some(key),
        _ => {
            tracing::debug!(env_var = name, "API key variable not set");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::Capability;

    #[test]
    fn default_registry() {
        let registry = build_registry(&ScholarConfig::default()).unwrap();
        assert_eq!(
            registry.capabilities(),
            vec![
                Capability::Parse,
                Capability::AssessReliability,
                Capability::ValidateScope
            ]
        );
    }

    #[test]
    fn enabled_tools_are_registered() {
        let mut config = ScholarConfig::default();
        config.retrieval.enabled = true;
        config.generation.enabled = true;
        config.scope_guard.enabled = false;

        let registry = build_registry(&config).unwrap();
        assert!(registry.has(Capability::Retrieve));
        assert!(registry.has(Capability::ClassifyIntent));
        assert!(!registry.has(Capability::ValidateScope));
        assert_eq!(registry.retriever().unwrap().name(), "semantic-scholar");
    }

    #[test]
    fn invalid_scope_pattern_fails() {
        let mut config = ScholarConfig::default();
        config.scope.blocked_patterns = vec!["[oops".to_string()];
        assert!(matches!(
            build_registry(&config),
            Err(ToolError::Configuration(_))
        ));
    }

    #[test]
    fn missing_key_variable_is_tolerated() {
        assert_eq!(read_api_key(Some("SCHOLAR_TEST_UNSET_KEY_VAR")), None);
        assert_eq!(read_api_key(None), None);
    }
}
