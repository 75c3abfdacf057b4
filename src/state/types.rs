//! Data model shared by every pipeline stage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Identifier of a paper within one request.
pub type PaperId = String;

/// How an attached paper reference is resolved by the external store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    File,
    Identifier,
    Url,
}

impl std::str::FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" => Ok(SourceType::File),
            "id" | "identifier" | "doi" | "arxiv" => Ok(SourceType::Identifier),
            "url" => Ok(SourceType::Url),
            _ => Err(format!("Invalid source type: {}", s)),
        }
    }
}

/// A paper reference already associated with the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperReference {
    pub id: PaperId,
    pub source_type: SourceType,
    pub source_value: String,
    /// Title known to the caller, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Sections already extracted by an earlier request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_sections: Option<ParsedSections>,
}

impl PaperReference {
    pub fn new(
        id: impl Into<String>,
        source_type: SourceType,
        source_value: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_type,
            source_value: source_value.into(),
            title: None,
            parsed_sections: None,
        }
    }

    pub fn with_sections(mut self, sections: ParsedSections) -> Self {
        self.parsed_sections = Some(sections);
        self
    }
}

/// Raw user text plus the papers attached to the conversation. Immutable once received.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub text: String,
    pub attached: Vec<PaperReference>,
}

impl Question {
    pub fn new(text: impl Into<String>, attached: Vec<PaperReference>) -> Self {
        Self {
            text: text.into(),
            attached,
        }
    }

    pub fn has_papers(&self) -> bool {
        !self.attached.is_empty()
    }
}

/// Where a paper's bytes live. The core only ever holds this reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PaperOrigin {
    File(String),
    Identifier(String),
    Url(String),
}

impl From<&PaperReference> for PaperOrigin {
    fn from(reference: &PaperReference) -> Self {
        let value = reference.source_value.clone();
        match reference.source_type {
            SourceType::File => PaperOrigin::File(value),
            SourceType::Identifier => PaperOrigin::Identifier(value),
            SourceType::Url => PaperOrigin::Url(value),
        }
    }
}

/// How a paper entered the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Attached,
    Retrieved,
}

/// Bibliographic data returned by retrieval.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaperMetadata {
    pub title: Option<String>,
    pub year: Option<u16>,
    pub citation_count: Option<u32>,
    pub abstract_text: Option<String>,
}

/// The four canonical sections of a research paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    ResearchQuestion,
    Methodology,
    Results,
    Limitations,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::ResearchQuestion,
        Section::Methodology,
        Section::Results,
        Section::Limitations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::ResearchQuestion => "research_question",
            Section::Methodology => "methodology",
            Section::Results => "results",
            Section::Limitations => "limitations",
        }
    }

    /// Human-readable label used in composed messages.
    pub fn label(&self) -> &'static str {
        match self {
            Section::ResearchQuestion => "research question",
            Section::Methodology => "methodology",
            Section::Results => "results",
            Section::Limitations => "limitations",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedSections {
    pub research_question: String,
    pub methodology: String,
    pub results: String,
    pub limitations: String,
}

impl ParsedSections {
    pub fn get(&self, section: Section) -> &str {
        match section {
            Section::ResearchQuestion => &self.research_question,
            Section::Methodology => &self.methodology,
            Section::Results => &self.results,
            Section::Limitations => &self.limitations,
        }
    }

    pub fn get_mut(&mut self, section: Section) -> &mut String {
        match section {
            Section::ResearchQuestion => &mut self.research_question,
            Section::Methodology => &mut self.methodology,
            Section::Results => &mut self.results,
            Section::Limitations => &mut self.limitations,
        }
    }

    pub fn is_empty(&self) -> bool {
        Section::ALL.iter().all(|s| self.get(*s).trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub id: PaperId,
    pub origin: PaperOrigin,
    pub provenance: Provenance,
    #[serde(default)]
    pub metadata: PaperMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_sections: Option<ParsedSections>,
}

impl From<&PaperReference> for Paper {
    fn from(reference: &PaperReference) -> Self {
        Self {
            id: reference.id.clone(),
            origin: PaperOrigin::from(reference),
            provenance: Provenance::Attached,
            metadata: PaperMetadata {
                title: reference.title.clone(),
                ..PaperMetadata::default()
            },
            parsed_sections: reference.parsed_sections.clone(),
        }
    }
}

/// An atomic statement extracted from one section of one paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub id: String,
    pub source_paper_id: PaperId,
    pub statement: String,
    pub section_origin: Section,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reliability {
    Low,
    Medium,
    High,
}

impl fmt::Display for Reliability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Reliability::Low => "low",
            Reliability::Medium => "medium",
            Reliability::High => "high",
        };
        f.write_str(s)
    }
}

/// Output of the reliability assessor for one claim source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReliabilityAssessment {
    pub paper_id: PaperId,
    pub reliability: Reliability,
    pub factors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Supporting,
    Conflicting,
}

/// A claim labelled relative to the working answer of its topic group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub claim: Claim,
    pub relation: Relation,
    pub reliability: Reliability,
    pub source_paper_id: PaperId,
    /// Index of the topic group this item was synthesized in
    pub topic: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UncertaintyReason {
    SparseEvidence,
    ConflictingEvidence,
    ToolFailure,
    Timeout,
    InsufficientEvidence,
    CriticalToolFailure,
    RetrievalUnavailable,
}

impl fmt::Display for UncertaintyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UncertaintyReason::SparseEvidence => "sparse evidence",
            UncertaintyReason::ConflictingEvidence => "conflicting evidence",
            UncertaintyReason::ToolFailure => "tool failure",
            UncertaintyReason::Timeout => "timeout",
            UncertaintyReason::InsufficientEvidence => "insufficient evidence",
            UncertaintyReason::CriticalToolFailure => "critical tool failure",
            UncertaintyReason::RetrievalUnavailable => "retrieval unavailable",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uncertainty {
    pub reason: UncertaintyReason,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affected_claim_ids: Vec<String>,
}

impl Uncertainty {
    pub fn new(reason: UncertaintyReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
            affected_claim_ids: Vec::new(),
        }
    }

    pub fn with_claims(mut self, claim_ids: Vec<String>) -> Self {
        self.affected_claim_ids = claim_ids;
        self
    }
}

impl fmt::Display for Uncertainty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.detail.is_empty() {
            write!(f, "{}", self.reason)
        } else {
            write!(f, "{}: {}", self.reason, self.detail)
        }
    }
}

/// Answer confidence. Ordered so that `min` is the conservative aggregate.
///
/// `None` is reserved for rejected and clarification outcomes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl From<Reliability> for Confidence {
    fn from(reliability: Reliability) -> Self {
        match reliability {
            Reliability::Low => Confidence::Low,
            Reliability::Medium => Confidence::Medium,
            Reliability::High => Confidence::High,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Confidence::None => "none",
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    FactualLookup,
    Understanding,
    Comparison,
    Critique,
    Synthesis,
    OffTopic,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::FactualLookup => "factual-lookup",
            QuestionType::Understanding => "understanding",
            QuestionType::Comparison => "comparison",
            QuestionType::Critique => "critique",
            QuestionType::Synthesis => "synthesis",
            QuestionType::OffTopic => "off-topic",
        }
    }
}

impl std::str::FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "factual-lookup" | "factual" => Ok(QuestionType::FactualLookup),
            "understanding" => Ok(QuestionType::Understanding),
            "comparison" => Ok(QuestionType::Comparison),
            "critique" => Ok(QuestionType::Critique),
            "synthesis" => Ok(QuestionType::Synthesis),
            "off-topic" | "offtopic" => Ok(QuestionType::OffTopic),
            _ => Err(format!("Invalid question type: {}", s)),
        }
    }
}

/// Classification of a question. Produced once per request, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub question_type: QuestionType,
    pub requires_external_evidence: bool,
    pub requires_paper_context: bool,
}

impl Intent {
    pub fn off_topic() -> Self {
        Self {
            question_type: QuestionType::OffTopic,
            requires_external_evidence: false,
            requires_paper_context: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeDecision {
    pub in_scope: bool,
    pub requires_clarification: bool,
    pub warnings: Vec<String>,
}

impl ScopeDecision {
    pub fn rejected(warnings: Vec<String>) -> Self {
        Self {
            in_scope: false,
            requires_clarification: false,
            warnings,
        }
    }

    pub fn clarify(warnings: Vec<String>) -> Self {
        Self {
            in_scope: true,
            requires_clarification: true,
            warnings,
        }
    }

    pub fn accepted(warnings: Vec<String>) -> Self {
        Self {
            in_scope: true,
            requires_clarification: false,
            warnings,
        }
    }

    /// True when the pipeline must stop at this decision.
    pub fn is_terminal(&self) -> bool {
        !self.in_scope || self.requires_clarification
    }
}

/// Pipeline state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Intake,
    Intent,
    ScopeCheck,
    Rejected,
    Clarify,
    Planning,
    Executing,
    Synthesizing,
    Composing,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Intake => "INTAKE",
            Stage::Intent => "INTENT",
            Stage::ScopeCheck => "SCOPE_CHECK",
            Stage::Rejected => "REJECTED",
            Stage::Clarify => "CLARIFY",
            Stage::Planning => "PLANNING",
            Stage::Executing => "EXECUTING",
            Stage::Synthesizing => "SYNTHESIZING",
            Stage::Composing => "COMPOSING",
            Stage::Done => "DONE",
        }
    }

    /// Stages after which the pipeline stops.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Rejected | Stage::Clarify | Stage::Done)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the audit trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub detail: String,
}

impl fmt::Display for StageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.detail)
    }
}

/// Final answer handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub message: String,
    /// Stages actually executed, in order
    pub reasoning: Vec<String>,
    pub confidence: Confidence,
    /// Paper ids cited by evidence that was used
    pub sources: BTreeSet<PaperId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uncertainties: Vec<Uncertainty>,
}
