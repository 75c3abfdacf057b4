//! Per-request reasoning state.
//!
//! A `ReasoningState` is created fresh for every question, threaded by value
//! through the pipeline and dropped once the response is returned. Stages never
//! edit it in place: they produce a [`StateDelta`] and the owner merges it.

pub mod context;
pub mod types;

pub use context::{ConversationContext, GenerationSettings};
pub use types::*;

use std::collections::BTreeMap;

/// Accumulator threaded through the pipeline for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReasoningState {
    pub user_question: String,
    pub intent: Option<Intent>,
    /// Papers in arrival order (attached first, then retrieved)
    pub papers: Vec<Paper>,
    pub claims: Vec<Claim>,
    /// Reliability per claim source, keyed by paper id
    pub assessments: BTreeMap<PaperId, ReliabilityAssessment>,
    pub supporting_evidence: Vec<EvidenceItem>,
    pub conflicting_evidence: Vec<EvidenceItem>,
    pub uncertainties: Vec<Uncertainty>,
    pub confidence: Confidence,
    pub trace: Vec<StageRecord>,
}

/// Whole-field changes produced by one stage.
///
/// Collection fields are appended; scalar fields replace only when set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateDelta {
    pub intent: Option<Intent>,
    pub papers: Vec<Paper>,
    pub claims: Vec<Claim>,
    pub assessments: Vec<ReliabilityAssessment>,
    pub supporting_evidence: Vec<EvidenceItem>,
    pub conflicting_evidence: Vec<EvidenceItem>,
    pub uncertainties: Vec<Uncertainty>,
    pub confidence: Option<Confidence>,
    pub trace: Vec<StageRecord>,
}

impl StateDelta {
    pub fn is_empty(&self) -> bool {
        *self == StateDelta::default()
    }

    pub fn record(mut self, stage: Stage, detail: impl Into<String>) -> Self {
        self.trace.push(StageRecord {
            stage,
            detail: detail.into(),
        });
        self
    }

    /// Fold another delta into this one, preserving order.
    pub fn absorb(&mut self, other: StateDelta) {
        if other.intent.is_some() {
            self.intent = other.intent;
        }
        self.papers.extend(other.papers);
        self.claims.extend(other.claims);
        self.assessments.extend(other.assessments);
        self.supporting_evidence.extend(other.supporting_evidence);
        self.conflicting_evidence.extend(other.conflicting_evidence);
        self.uncertainties.extend(other.uncertainties);
        if other.confidence.is_some() {
            self.confidence = other.confidence;
        }
        self.trace.extend(other.trace);
    }
}

impl ReasoningState {
    pub fn new(user_question: impl Into<String>) -> Self {
        Self {
            user_question: user_question.into(),
            ..Self::default()
        }
    }

    /// Seed the state with the papers attached to the conversation.
    pub fn with_attached(mut self, attached: &[PaperReference]) -> Self {
        for reference in attached {
            self.merge_paper(Paper::from(reference));
        }
        self
    }

    /// Merge a delta, consuming the previous state.
    pub fn merge(mut self, delta: StateDelta) -> Self {
        if let Some(intent) = delta.intent {
            self.intent = Some(intent);
        }
        for paper in delta.papers {
            self.merge_paper(paper);
        }
        for claim in delta.claims {
            if !self.claims.iter().any(|c| c.id == claim.id) {
                self.claims.push(claim);
            }
        }
        for assessment in delta.assessments {
            self.assessments
                .entry(assessment.paper_id.clone())
                .or_insert(assessment);
        }
        self.supporting_evidence.extend(delta.supporting_evidence);
        self.conflicting_evidence.extend(delta.conflicting_evidence);
        self.uncertainties.extend(delta.uncertainties);
        if let Some(confidence) = delta.confidence {
            self.confidence = confidence;
        }
        self.trace.extend(delta.trace);
        self
    }

    /// Append a paper, or fill in fields the known copy is missing.
    fn merge_paper(&mut self, paper: Paper) {
        match self.papers.iter_mut().find(|p| p.id == paper.id) {
            Some(existing) => {
                if existing.parsed_sections.is_none() {
                    existing.parsed_sections = paper.parsed_sections;
                }
                let meta = &mut existing.metadata;
                meta.title = meta.title.take().or(paper.metadata.title);
                meta.year = meta.year.or(paper.metadata.year);
                meta.citation_count = meta.citation_count.or(paper.metadata.citation_count);
                meta.abstract_text = meta.abstract_text.take().or(paper.metadata.abstract_text);
            }
            None => self.papers.push(paper),
        }
    }

    pub fn paper(&self, id: &str) -> Option<&Paper> {
        self.papers.iter().find(|p| p.id == id)
    }

    pub fn claims_for(&self, paper_id: &str) -> Vec<&Claim> {
        self.claims
            .iter()
            .filter(|c| c.source_paper_id == paper_id)
            .collect()
    }

    pub fn has_claims_for(&self, paper_id: &str) -> bool {
        self.claims.iter().any(|c| c.source_paper_id == paper_id)
    }

    /// Reliability of a source; unassessed sources count as low.
    pub fn reliability_of(&self, paper_id: &str) -> Reliability {
        self.assessments
            .get(paper_id)
            .map(|a| a.reliability)
            .unwrap_or(Reliability::Low)
    }

    /// Every evidence item must cite a paper known to this state.
    pub fn check_grounding(&self) -> Result<(), String> {
        for item in self
            .supporting_evidence
            .iter()
            .chain(self.conflicting_evidence.iter())
        {
            if self.paper(&item.source_paper_id).is_none() {
                return Err(format!(
                    "evidence item {} cites unknown paper '{}'",
                    item.claim.id, item.source_paper_id
                ));
            }
        }
        Ok(())
    }

    /// Trace rendered as the response reasoning list.
    pub fn reasoning(&self) -> Vec<String> {
        self.trace.iter().map(|r| r.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(id: &str) -> Paper {
        Paper {
            id: id.to_string(),
            origin: PaperOrigin::File(format!("{}.txt", id)),
            provenance: Provenance::Attached,
            metadata: PaperMetadata::default(),
            parsed_sections: None,
        }
    }

    fn claim(id: &str, paper_id: &str) -> Claim {
        Claim {
            id: id.to_string(),
            source_paper_id: paper_id.to_string(),
            statement: "The treatment reduced symptoms".to_string(),
            section_origin: Section::Results,
        }
    }

    #[test]
    fn new_state_is_empty() {
        let state = ReasoningState::new("question");
        assert_eq!(state.user_question, "question");
        assert!(state.papers.is_empty());
        assert_eq!(state.confidence, Confidence::None);
    }

    #[test]
    fn merge_appends_papers_and_claims() {
        let state = ReasoningState::new("q").merge(StateDelta {
            papers: vec![paper("p1")],
            claims: vec![claim("p1#results-0", "p1")],
            ..StateDelta::default()
        });
        let state = state.merge(StateDelta {
            papers: vec![paper("p2")],
            claims: vec![claim("p2#results-0", "p2")],
            ..StateDelta::default()
        });

        assert_eq!(state.papers.len(), 2);
        assert_eq!(state.papers[0].id, "p1");
        assert_eq!(state.claims.len(), 2);
    }

    #[test]
    fn merge_never_overwrites_known_sections() {
        let mut known = paper("p1");
        known.parsed_sections = Some(ParsedSections {
            results: "original".to_string(),
            ..ParsedSections::default()
        });
        let mut incoming = paper("p1");
        incoming.parsed_sections = Some(ParsedSections {
            results: "replacement".to_string(),
            ..ParsedSections::default()
        });

        let state = ReasoningState::new("q")
            .merge(StateDelta {
                papers: vec![known],
                ..StateDelta::default()
            })
            .merge(StateDelta {
                papers: vec![incoming],
                ..StateDelta::default()
            });

        assert_eq!(state.papers.len(), 1);
        let sections = state.papers[0].parsed_sections.as_ref().unwrap();
        assert_eq!(sections.results, "original");
    }

    #[test]
    fn merge_fills_missing_sections() {
        let mut parsed = paper("p1");
        parsed.parsed_sections = Some(ParsedSections {
            limitations: "small sample".to_string(),
            ..ParsedSections::default()
        });

        let state = ReasoningState::new("q")
            .merge(StateDelta {
                papers: vec![paper("p1")],
                ..StateDelta::default()
            })
            .merge(StateDelta {
                papers: vec![parsed],
                ..StateDelta::default()
            });

        assert!(state.papers[0].parsed_sections.is_some());
    }

    #[test]
    fn duplicate_claims_are_ignored() {
        let state = ReasoningState::new("q").merge(StateDelta {
            claims: vec![claim("c1", "p1"), claim("c1", "p1")],
            ..StateDelta::default()
        });
        assert_eq!(state.claims.len(), 1);
    }

    #[test]
    fn confidence_only_replaced_when_set() {
        let state = ReasoningState::new("q").merge(StateDelta {
            confidence: Some(Confidence::Medium),
            ..StateDelta::default()
        });
        let state = state.merge(StateDelta::default());
        assert_eq!(state.confidence, Confidence::Medium);
    }

    #[test]
    fn unassessed_source_is_low_reliability() {
        let state = ReasoningState::new("q");
        assert_eq!(state.reliability_of("missing"), Reliability::Low);
    }

    #[test]
    fn grounding_check_rejects_orphan_evidence() {
        let state = ReasoningState::new("q").merge(StateDelta {
            supporting_evidence: vec![EvidenceItem {
                claim: claim("c1", "ghost"),
                relation: Relation::Supporting,
                reliability: Reliability::High,
                source_paper_id: "ghost".to_string(),
                topic: 0,
            }],
            ..StateDelta::default()
        });
        assert!(state.check_grounding().is_err());
    }

    #[test]
    fn attached_references_become_papers() {
        let reference = PaperReference::new("p1", SourceType::Url, "https://example.org/p1");
        let state = ReasoningState::new("q").with_attached(&[reference]);
        assert_eq!(state.papers.len(), 1);
        assert_eq!(
            state.papers[0].origin,
            PaperOrigin::Url("https://example.org/p1".to_string())
        );
        assert_eq!(state.papers[0].provenance, Provenance::Attached);
    }

    #[test]
    fn delta_absorb_keeps_order() {
        let mut delta = StateDelta::default().record(Stage::Intake, "first");
        delta.absorb(StateDelta::default().record(Stage::Intent, "second"));
        assert_eq!(delta.trace.len(), 2);
        assert_eq!(delta.trace[1].stage, Stage::Intent);
    }

    #[test]
    fn confidence_orders_conservatively() {
        assert!(Confidence::None < Confidence::Low);
        assert!(Confidence::Low < Confidence::Medium);
        assert!(Confidence::Medium < Confidence::High);
        assert_eq!(
            [Confidence::High, Confidence::Low].into_iter().min(),
            Some(Confidence::Low)
        );
    }

    #[test]
    fn question_type_serializes_kebab_case() {
        let json = serde_json::to_string(&QuestionType::FactualLookup).unwrap();
        assert_eq!(json, "\"factual-lookup\"");
        let json = serde_json::to_string(&QuestionType::OffTopic).unwrap();
        assert_eq!(json, "\"off-topic\"");
    }

    #[test]
    fn stage_record_display() {
        let record = StageRecord {
            stage: Stage::ScopeCheck,
            detail: "in scope".to_string(),
        };
        assert_eq!(record.to_string(), "SCOPE_CHECK: in scope");
    }
}
