//! Shared test utilities for Scholar integration tests.
//!
//! Deterministic fake tools keyed by paper id, plus builders for papers,
//! registries and pipelines, so tests can script tool behaviour without
//! touching pipeline logic.

#![allow(dead_code)]

use async_trait::async_trait;
use scholar::config::{ExecutorConfig, ScholarConfig};
use scholar::pipeline::ResearchPipeline;
use scholar::state::{
    Claim, ConversationContext, GenerationSettings, Intent, Paper, PaperMetadata, PaperOrigin,
    PaperReference, ParsedSections, Provenance, Reliability, ReliabilityAssessment,
    ScopeDecision, Section, SourceType,
};
use scholar::tools::scope_guard::PolicyScopeGuard;
use scholar::tools::{
    IntentClassifier, PaperParser, PaperRetriever, ParsedPaper, ReliabilityAssessor, ScopeGuard,
    ToolError, ToolHandle, ToolRegistry,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Fake Tools
// =============================================================================

/// Parser that returns scripted sections per paper id.
#[derive(Default)]
pub struct FixtureParser {
    pub sections: HashMap<String, Vec<(Section, String)>>,
    pub failing: HashSet<String>,
    pub delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl FixtureParser {
    pub fn with_paper(mut self, id: &str, sections: &[(Section, &str)]) -> Self {
        self.sections.insert(
            id.to_string(),
            sections
                .iter()
                .map(|(s, text)| (*s, text.to_string()))
                .collect(),
        );
        self
    }

    pub fn failing_on(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl PaperParser for FixtureParser {
    fn name(&self) -> &str {
        "fixture-parser"
    }

    async fn parse(&self, paper: &Paper) -> Result<ParsedPaper, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(&paper.id) {
            return Err(ToolError::InvalidResponse("unreadable document".to_string()));
        }

        let entries = self.sections.get(&paper.id).cloned().unwrap_or_default();
        let mut sections = ParsedSections::default();
        let mut counters: HashMap<Section, usize> = HashMap::new();
        let mut claims = Vec::new();
        for (section, statement) in entries {
            let target = sections.get_mut(section);
            if !target.is_empty() {
                target.push(' ');
            }
            target.push_str(&statement);

            let n = counters.entry(section).or_insert(0);
            claims.push(Claim {
                id: format!("{}#{}-{}", paper.id, section.as_str(), n),
                source_paper_id: paper.id.clone(),
                statement,
                section_origin: section,
            });
            *n += 1;
        }

        Ok(ParsedPaper {
            paper_id: paper.id.clone(),
            sections,
            claims,
        })
    }
}

/// Assessor grading papers from a fixed table; unknown papers are medium.
#[derive(Default)]
pub struct FixtureAssessor {
    pub grades: HashMap<String, Reliability>,
}

impl FixtureAssessor {
    pub fn grade(mut self, id: &str, reliability: Reliability) -> Self {
        self.grades.insert(id.to_string(), reliability);
        self
    }
}

#[async_trait]
impl ReliabilityAssessor for FixtureAssessor {
    fn name(&self) -> &str {
        "fixture-assessor"
    }

    async fn assess(
        &self,
        paper: &Paper,
        _claims: &[Claim],
    ) -> Result<ReliabilityAssessment, ToolError> {
        Ok(ReliabilityAssessment {
            paper_id: paper.id.clone(),
            reliability: self
                .grades
                .get(&paper.id)
                .copied()
                .unwrap_or(Reliability::Medium),
            factors: vec!["fixture grade".to_string()],
        })
    }
}

/// Retriever returning a fixed list of papers.
pub struct FixtureRetriever {
    pub papers: Vec<Paper>,
    pub fail: bool,
}

#[async_trait]
impl PaperRetriever for FixtureRetriever {
    fn name(&self) -> &str {
        "fixture-retriever"
    }

    async fn retrieve(&self, _query: &str, limit: u32) -> Result<Vec<Paper>, ToolError> {
        if self.fail {
            return Err(ToolError::Upstream {
                status: 503,
                message: "index unavailable".to_string(),
            });
        }
        Ok(self.papers.iter().take(limit as usize).cloned().collect())
    }
}

/// Classifier returning a fixed intent.
pub struct FixedClassifier(pub Intent);

#[async_trait]
impl IntentClassifier for FixedClassifier {
    fn name(&self) -> &str {
        "fixed-classifier"
    }

    async fn classify(
        &self,
        _question: &str,
        _settings: &GenerationSettings,
    ) -> Result<Intent, ToolError> {
        Ok(self.0)
    }
}

/// Classifier whose backend is down.
pub struct BrokenClassifier;

#[async_trait]
impl IntentClassifier for BrokenClassifier {
    fn name(&self) -> &str {
        "broken-classifier"
    }

    async fn classify(
        &self,
        _question: &str,
        _settings: &GenerationSettings,
    ) -> Result<Intent, ToolError> {
        Err(ToolError::Network("connection refused".to_string()))
    }
}

/// Scope guard that never answers.
pub struct HangingGuard;

#[async_trait]
impl ScopeGuard for HangingGuard {
    fn name(&self) -> &str {
        "hanging-guard"
    }

    async fn check(&self, _question: &str, _intent: &Intent) -> Result<ScopeDecision, ToolError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(ScopeDecision::accepted(Vec::new()))
    }
}

// =============================================================================
// Builders
// =============================================================================

/// Attached paper reference resolved by identifier.
pub fn attached(id: &str) -> PaperReference {
    PaperReference::new(id, SourceType::Identifier, id)
}

pub fn context(ids: &[&str]) -> ConversationContext {
    ConversationContext::with_papers(ids.iter().map(|id| attached(id)).collect())
}

pub fn retrieved_paper(id: &str) -> Paper {
    Paper {
        id: id.to_string(),
        origin: PaperOrigin::Identifier(id.to_string()),
        provenance: Provenance::Retrieved,
        metadata: PaperMetadata::default(),
        parsed_sections: None,
    }
}

/// Parser and assessor fakes plus the real policy scope guard.
pub fn registry(parser: FixtureParser, assessor: FixtureAssessor) -> ToolRegistry {
    let config = ScholarConfig::default();
    ToolRegistry::new()
        .with(ToolHandle::Parse(Arc::new(parser)))
        .with(ToolHandle::AssessReliability(Arc::new(assessor)))
        .with(ToolHandle::ValidateScope(Arc::new(
            PolicyScopeGuard::new(config.scope_guard.blocked_requests.clone()),
        )))
}

/// Short timeouts so timeout tests finish quickly.
pub fn test_config() -> ScholarConfig {
    ScholarConfig {
        executor: ExecutorConfig {
            invocation_timeout_ms: 300,
            critical_timeout_ms: 300,
            max_concurrency: 4,
        },
        ..ScholarConfig::default()
    }
}

pub fn pipeline(registry: ToolRegistry) -> ResearchPipeline {
    ResearchPipeline::new(&test_config(), registry).unwrap()
}
