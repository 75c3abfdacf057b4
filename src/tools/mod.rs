//! Research tools: capability interfaces and the registry that resolves them.
//!
//! Each capability is a narrow async trait with interchangeable
//! implementations. The pipeline never names a concrete tool; it asks the
//! [`ToolRegistry`] for whatever implementation was registered for a
//! [`Capability`] at startup, which lets tests substitute deterministic fakes.
//!
//! # Object Safety
//!
//! All capability traits are object-safe and used as `Arc<dyn Trait>`. Async
//! methods use `async_trait` for compatibility with trait objects.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub mod classifier;
pub mod documents;
pub mod error;
pub mod factory;
pub mod generation;
pub mod parser;
pub mod reliability;
pub mod retrieval;
pub mod scope_guard;

pub use error::ToolError;

use crate::state::{
    Claim, GenerationSettings, Intent, Paper, PaperId, ParsedSections, ReliabilityAssessment,
    ScopeDecision,
};

/// Abstract operation a tool provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    Retrieve,
    Parse,
    AssessReliability,
    ClassifyIntent,
    ValidateScope,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::Retrieve,
        Capability::Parse,
        Capability::AssessReliability,
        Capability::ClassifyIntent,
        Capability::ValidateScope,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Retrieve => "retrieve",
            Capability::Parse => "parse",
            Capability::AssessReliability => "assess-reliability",
            Capability::ClassifyIntent => "classify-intent",
            Capability::ValidateScope => "validate-scope",
        }
    }

    /// Failure of a critical capability aborts the plan instead of being
    /// recorded as an uncertainty.
    pub fn is_critical(&self) -> bool {
        matches!(self, Capability::ClassifyIntent | Capability::ValidateScope)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims and sections extracted from one paper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPaper {
    pub paper_id: PaperId,
    pub sections: ParsedSections,
    pub claims: Vec<Claim>,
}

/// Finds papers relevant to a query in an external index.
#[async_trait]
pub trait PaperRetriever: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Returns papers in relevance order. Ids must be stable across calls.
    async fn retrieve(&self, query: &str, limit: u32) -> Result<Vec<Paper>, ToolError>;
}

/// Extracts structured sections and claims from a paper.
#[async_trait]
pub trait PaperParser: Send + Sync + 'static {
    fn name(&self) -> &str;

    async fn parse(&self, paper: &Paper) -> Result<ParsedPaper, ToolError>;
}

/// Grades how much a claim source can be trusted.
#[async_trait]
pub trait ReliabilityAssessor: Send + Sync + 'static {
    fn name(&self) -> &str;

    async fn assess(
        &self,
        paper: &Paper,
        claims: &[Claim],
    ) -> Result<ReliabilityAssessment, ToolError>;
}

/// Classifies questions the lexical heuristics could not settle.
#[async_trait]
pub trait IntentClassifier: Send + Sync + 'static {
    fn name(&self) -> &str;

    async fn classify(
        &self,
        question: &str,
        settings: &GenerationSettings,
    ) -> Result<Intent, ToolError>;
}

/// Second-line check that a request may be answered from evidence at all.
#[async_trait]
pub trait ScopeGuard: Send + Sync + 'static {
    fn name(&self) -> &str;

    async fn check(&self, question: &str, intent: &Intent) -> Result<ScopeDecision, ToolError>;
}

/// A registered tool, tagged by capability.
#[derive(Clone)]
pub enum ToolHandle {
    Retrieve(Arc<dyn PaperRetriever>),
    Parse(Arc<dyn PaperParser>),
    AssessReliability(Arc<dyn ReliabilityAssessor>),
    ClassifyIntent(Arc<dyn IntentClassifier>),
    ValidateScope(Arc<dyn ScopeGuard>),
}

impl ToolHandle {
    pub fn capability(&self) -> Capability {
        match self {
            ToolHandle::Retrieve(_) => Capability::Retrieve,
            ToolHandle::Parse(_) => Capability::Parse,
            ToolHandle::AssessReliability(_) => Capability::AssessReliability,
            ToolHandle::ClassifyIntent(_) => Capability::ClassifyIntent,
            ToolHandle::ValidateScope(_) => Capability::ValidateScope,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ToolHandle::Retrieve(t) => t.name(),
            ToolHandle::Parse(t) => t.name(),
            ToolHandle::AssessReliability(t) => t.name(),
            ToolHandle::ClassifyIntent(t) => t.name(),
            ToolHandle::ValidateScope(t) => t.name(),
        }
    }
}

impl fmt::Debug for ToolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolHandle")
            .field("capability", &self.capability())
            .field("name", &self.name())
            .finish()
    }
}

/// Capability → implementation mapping, resolved once at startup.
///
/// # Examples
///
/// ```
/// use scholar::tools::{Capability, ToolHandle, ToolRegistry};
/// use scholar::tools::reliability::HeuristicReliabilityAssessor;
/// use std::sync::Arc;
///
/// let mut registry = ToolRegistry::new();
/// registry.register(ToolHandle::AssessReliability(Arc::new(
///     HeuristicReliabilityAssessor::new(),
/// )));
///
/// assert!(registry.has(Capability::AssessReliability));
/// assert!(!registry.has(Capability::Retrieve));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<Capability, ToolHandle>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any previous tool of the same capability.
    pub fn register(&mut self, tool: ToolHandle) -> Option<ToolHandle> {
        tracing::debug!(
            capability = %tool.capability(),
            tool = tool.name(),
            "Registered tool"
        );
        self.tools.insert(tool.capability(), tool)
    }

    pub fn with(mut self, tool: ToolHandle) -> Self {
        self.register(tool);
        self
    }

    pub fn get(&self, capability: Capability) -> Option<&ToolHandle> {
        self.tools.get(&capability)
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.tools.contains_key(&capability)
    }

    /// Registered capabilities in canonical order.
    pub fn capabilities(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| self.has(*c))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn retriever(&self) -> Option<Arc<dyn PaperRetriever>> {
        match self.get(Capability::Retrieve) {
            Some(ToolHandle::Retrieve(t)) => Some(Arc::clone(t)),
            _ => None,
        }
    }

    pub fn parser(&self) -> Option<Arc<dyn PaperParser>> {
        match self.get(Capability::Parse) {
            Some(ToolHandle::Parse(t)) => Some(Arc::clone(t)),
            _ => None,
        }
    }

    pub fn assessor(&self) -> Option<Arc<dyn ReliabilityAssessor>> {
        match self.get(Capability::AssessReliability) {
            Some(ToolHandle::AssessReliability(t)) => Some(Arc::clone(t)),
            _ => None,
        }
    }

    pub fn classifier(&self) -> Option<Arc<dyn IntentClassifier>> {
        match self.get(Capability::ClassifyIntent) {
            Some(ToolHandle::ClassifyIntent(t)) => Some(Arc::clone(t)),
            _ => None,
        }
    }

    pub fn scope_guard(&self) -> Option<Arc<dyn ScopeGuard>> {
        match self.get(Capability::ValidateScope) {
            Some(ToolHandle::ValidateScope(t)) => Some(Arc::clone(t)),
            _ => None,
        }
    }
}
