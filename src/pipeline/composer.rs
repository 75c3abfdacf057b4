//! Response composition.
//!
//! Every sentence that attributes a statement to a paper is rendered from an
//! evidence item of the synthesis, and `sources` is exactly the set of papers
//! those items cite.

use super::synthesis::Synthesis;
use crate::state::{
    Confidence, EvidenceItem, ReasoningState, Relation, Response, Stage, StageRecord,
    Uncertainty, UncertaintyReason,
};
use crate::tools::Capability;
use std::collections::BTreeSet;

pub const REJECTION_MESSAGE: &str =
    "This question is outside the research scope. Please ask about paper content, methodology, or research findings.";

pub const CLARIFICATION_MESSAGE: &str =
    "I need more context to answer this question. Please provide relevant papers or clarify your question.";

pub const INSUFFICIENT_EVIDENCE_MESSAGE: &str =
    "I could not find enough evidence in the available papers to answer this question.";

#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseComposer;

impl ResponseComposer {
    pub fn new() -> Self {
        Self
    }

    /// Grounded answer from a finished synthesis.
    pub fn compose(&self, synthesis: &Synthesis, state: &ReasoningState) -> Response {
        let mut paragraphs: Vec<String> = Vec::new();

        if synthesis.is_empty() {
            paragraphs.push(INSUFFICIENT_EVIDENCE_MESSAGE.to_string());
        } else {
            for topic in &synthesis.topics {
                let supporting: Vec<&EvidenceItem> = synthesis
                    .supporting
                    .iter()
                    .filter(|e| e.topic == topic.index)
                    .collect();
                let conflicting: Vec<&EvidenceItem> = synthesis
                    .conflicting
                    .iter()
                    .filter(|e| e.topic == topic.index)
                    .collect();
                paragraphs.push(topic_paragraph(&supporting, &conflicting));
            }
        }

        if !state.uncertainties.is_empty() {
            let notes: Vec<String> = state.uncertainties.iter().map(|u| u.to_string()).collect();
            paragraphs.push(format!("Caveats: {}.", notes.join("; ")));
        }

        let sources: BTreeSet<String> = synthesis
            .supporting
            .iter()
            .chain(synthesis.conflicting.iter())
            .map(|e| e.source_paper_id.clone())
            .collect();

        let conflicts = synthesis.topics.iter().filter(|t| t.has_conflict).count();
        let mut detail = format!(
            "cited {} source(s) across {} topic(s)",
            sources.len(),
            synthesis.topics.len()
        );
        if conflicts > 0 {
            detail.push_str(&format!(
                "; conflicting evidence reported for {} topic(s)",
                conflicts
            ));
        }
        if synthesis.is_empty() {
            detail = "insufficient evidence; templated answer".to_string();
        }

        let confidence = synthesis.confidence.max(Confidence::Low);
        Response {
            message: paragraphs.join("\n\n"),
            reasoning: finish_trace(
                state,
                &[
                    (Stage::Composing, detail),
                    (Stage::Done, format!("confidence {}", confidence)),
                ],
            ),
            confidence,
            sources,
            uncertainties: state.uncertainties.clone(),
        }
    }

    pub fn rejected(&self, state: &ReasoningState, reason: &str) -> Response {
        terminal(state, Stage::Rejected, reason, REJECTION_MESSAGE)
    }

    pub fn clarification(&self, state: &ReasoningState, reason: &str) -> Response {
        terminal(state, Stage::Clarify, reason, CLARIFICATION_MESSAGE)
    }

    /// A critical tool failed: answer nothing rather than answer unchecked.
    pub fn degraded(
        &self,
        state: &ReasoningState,
        capability: Capability,
        reason: &str,
    ) -> Response {
        let mut uncertainties = state.uncertainties.clone();
        uncertainties.push(Uncertainty::new(
            UncertaintyReason::CriticalToolFailure,
            format!("{}: {}", capability, reason),
        ));
        Response {
            message: format!(
                "I could not complete the checks needed to answer this question reliably \
                 ({} is unavailable), so no answer was generated. Please try again later.",
                capability
            ),
            reasoning: finish_trace(
                state,
                &[(
                    Stage::Done,
                    format!("degraded after critical {} failure", capability),
                )],
            ),
            confidence: Confidence::Low,
            sources: BTreeSet::new(),
            uncertainties,
        }
    }
}

fn terminal(state: &ReasoningState, stage: Stage, reason: &str, message: &str) -> Response {
    Response {
        message: message.to_string(),
        reasoning: finish_trace(state, &[(stage, reason.to_string())]),
        confidence: Confidence::None,
        sources: BTreeSet::new(),
        uncertainties: Vec::new(),
    }
}

fn finish_trace(state: &ReasoningState, extra: &[(Stage, String)]) -> Vec<String> {
    let mut reasoning = state.reasoning();
    reasoning.extend(extra.iter().map(|(stage, detail)| {
        StageRecord {
            stage: *stage,
            detail: detail.clone(),
        }
        .to_string()
    }));
    reasoning
}

/// The working answer, its corroboration, then dissent.
fn topic_paragraph(supporting: &[&EvidenceItem], conflicting: &[&EvidenceItem]) -> String {
    let mut sentences = Vec::new();
    let mut items = supporting.iter();
    if let Some(candidate) = items.next() {
        sentences.push(format!(
            "According to {}, {}",
            cite(candidate),
            as_clause(&candidate.claim.statement)
        ));
    }
    for item in items {
        debug_assert_eq!(item.relation, Relation::Supporting);
        sentences.push(format!(
            "This is consistent with {}: {}",
            cite(item),
            as_sentence(&item.claim.statement)
        ));
    }
    for item in conflicting {
        sentences.push(format!(
            "However, {} reports: {}",
            cite(item),
            as_sentence(&item.claim.statement)
        ));
    }
    sentences.join(" ")
}

fn cite(item: &EvidenceItem) -> String {
    format!("[{}] ({} reliability)", item.source_paper_id, item.reliability)
}

/// Statement continuing "According to X, ...": lowercase first letter unless
/// it starts an acronym or a label like "Method A".
fn as_clause(statement: &str) -> String {
    let sentence = as_sentence(statement);
    let mut chars = sentence.chars();
    let first_word = sentence.split_whitespace().next().unwrap_or("");
    let keep_case = first_word.chars().filter(|c| c.is_uppercase()).count() > 1
        || sentence
            .split_whitespace()
            .nth(1)
            .is_some_and(|w| w.len() == 1 && w.chars().all(|c| c.is_uppercase()));
    match chars.next() {
        Some(first) if !keep_case => first.to_lowercase().chain(chars).collect(),
        _ => sentence,
    }
}

fn as_sentence(statement: &str) -> String {
    let trimmed = statement.trim();
    if trimmed.ends_with(['.', '!', '?']) {
        trimmed.to_string()
    } else {
        format!("{}.", trimmed)
    }
}
