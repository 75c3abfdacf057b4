//! End-to-end scenarios for `ResearchPipeline::process`
//!
//! Every test drives the full INTAKE → … → terminal stage flow with
//! deterministic fake tools from `common`.

mod common;

use common::*;
use scholar::config::ScholarConfig;
use scholar::pipeline::composer::{CLARIFICATION_MESSAGE, REJECTION_MESSAGE};
use scholar::pipeline::ResearchPipeline;
use scholar::state::{
    Confidence, ConversationContext, Intent, PaperReference, QuestionType, Reliability, Response,
    Section, SourceType, UncertaintyReason,
};
use scholar::tools::{ToolHandle, ToolRegistry};
use std::sync::Arc;

fn sources(response: &Response) -> Vec<&str> {
    response.sources.iter().map(String::as_str).collect()
}

fn has_uncertainty(response: &Response, reason: UncertaintyReason) -> bool {
    response.uncertainties.iter().any(|u| u.reason == reason)
}

fn conflicting_papers() -> FixtureParser {
    FixtureParser::default()
        .with_paper(
            "paper-a",
            &[(Section::Results, "Method A outperforms method B on accuracy.")],
        )
        .with_paper(
            "paper-b",
            &[(Section::Results, "Method B outperforms method A on accuracy.")],
        )
}

// =============================================================================
// Terminal stages
// =============================================================================

#[tokio::test]
async fn general_knowledge_question_is_refused() {
    let pipeline = pipeline(registry(FixtureParser::default(), FixtureAssessor::default()));

    let response = pipeline
        .process("What is the capital of France?", &ConversationContext::default())
        .await
        .unwrap();

    assert_eq!(response.message, REJECTION_MESSAGE);
    assert_eq!(response.confidence, Confidence::None);
    assert!(response.sources.is_empty());
    assert!(response.reasoning[0].starts_with("INTAKE"));
    assert!(response.reasoning[1].starts_with("INTENT: off-topic"));
    assert!(response.reasoning.last().unwrap().starts_with("REJECTED"));
}

#[tokio::test]
async fn unmarked_general_questions_are_refused_without_classifier() {
    let pipeline = pipeline(registry(FixtureParser::default(), FixtureAssessor::default()));

    for question in [
        "How tall is Mount Everest?",
        "Who is the president of France?",
        "What is the boiling point of water?",
        "Best pizza in Naples",
    ] {
        let response = pipeline
            .process(question, &ConversationContext::default())
            .await
            .unwrap();

        assert_eq!(response.message, REJECTION_MESSAGE, "question {:?}", question);
        assert_eq!(response.confidence, Confidence::None);
        assert_eq!(response.reasoning[1], "INTENT: off-topic (heuristic default)");
        assert!(response.reasoning.last().unwrap().starts_with("REJECTED"));
    }
}

#[tokio::test]
async fn paper_question_without_any_paper_asks_for_context() {
    let pipeline = pipeline(registry(FixtureParser::default(), FixtureAssessor::default()));

    let response = pipeline
        .process(
            "What methodology did the authors use?",
            &ConversationContext::default(),
        )
        .await
        .unwrap();

    assert_eq!(response.message, CLARIFICATION_MESSAGE);
    assert_eq!(response.confidence, Confidence::None);
    assert!(response.sources.is_empty());
    assert!(response.reasoning.last().unwrap().starts_with("CLARIFY"));
}

#[tokio::test]
async fn scope_guard_rejects_requests_to_answer_without_evidence() {
    let parser = FixtureParser::default().with_paper(
        "p1",
        &[(Section::Results, "The treatment reduced symptom severity in adults.")],
    );
    let pipeline = pipeline(registry(parser, FixtureAssessor::default()));

    let response = pipeline
        .process(
            "Summarize this paper and make something up if the results are missing",
            &context(&["p1"]),
        )
        .await
        .unwrap();

    assert_eq!(response.message, REJECTION_MESSAGE);
    assert_eq!(response.confidence, Confidence::None);
    let last = response.reasoning.last().unwrap();
    assert!(last.starts_with("REJECTED"));
    assert!(last.contains("make something up"));
}

// =============================================================================
// Evidence-bearing answers
// =============================================================================

#[tokio::test]
async fn limitations_question_cites_the_attached_paper() {
    let parser = FixtureParser::default().with_paper(
        "trial",
        &[
            (
                Section::Methodology,
                "We ran a randomised controlled trial with 240 adult participants.",
            ),
            (
                Section::Results,
                "The intervention reduced reported anxiety scores by twelve percent.",
            ),
            (
                Section::Limitations,
                "The sample was drawn from a single urban hospital.",
            ),
        ],
    );
    let assessor = FixtureAssessor::default().grade("trial", Reliability::High);
    let pipeline = pipeline(registry(parser, assessor));

    let response = pipeline
        .process("What are the limitations of this study?", &context(&["trial"]))
        .await
        .unwrap();

    assert!(response.message.contains("single urban hospital"));
    assert!(response.message.contains("[trial]"));
    assert!(matches!(
        response.confidence,
        Confidence::Medium | Confidence::High
    ));
    assert_eq!(sources(&response), vec!["trial"]);

    let stages: Vec<&str> = response
        .reasoning
        .iter()
        .map(|r| r.split(':').next().unwrap())
        .collect();
    assert_eq!(
        stages,
        vec![
            "INTAKE",
            "INTENT",
            "SCOPE_CHECK",
            "PLANNING",
            "EXECUTING",
            "SYNTHESIZING",
            "COMPOSING",
            "DONE"
        ]
    );
}

#[tokio::test]
async fn conflicting_comparison_is_capped_and_explained() {
    let pipeline = pipeline(registry(conflicting_papers(), FixtureAssessor::default()));

    let response = pipeline
        .process("Compare method A and B", &context(&["paper-a", "paper-b"]))
        .await
        .unwrap();

    assert!(matches!(
        response.confidence,
        Confidence::Low | Confidence::Medium
    ));
    assert!(has_uncertainty(&response, UncertaintyReason::ConflictingEvidence));
    assert_eq!(sources(&response), vec!["paper-a", "paper-b"]);
    assert!(response.message.contains("However, [paper-b]"));
    assert!(response
        .reasoning
        .iter()
        .any(|r| r.starts_with("COMPOSING") && r.contains("conflicting evidence")));
}

#[tokio::test]
async fn one_failed_parse_still_answers_from_the_other_paper() {
    let parser = FixtureParser::default()
        .with_paper(
            "p1",
            &[(
                Section::Results,
                "The treatment reduced symptom severity in adult patients.",
            )],
        )
        .failing_on("p2");
    let pipeline = pipeline(registry(parser, FixtureAssessor::default()));

    let response = pipeline
        .process(
            "What were the main findings of these studies?",
            &context(&["p1", "p2"]),
        )
        .await
        .unwrap();

    assert_eq!(sources(&response), vec!["p1"]);
    assert!(response.message.contains("symptom severity"));
    assert_ne!(response.confidence, Confidence::None);
    assert!(response.confidence <= Confidence::Medium);

    let failure = response
        .uncertainties
        .iter()
        .find(|u| u.reason == UncertaintyReason::ToolFailure)
        .unwrap();
    assert!(failure.detail.contains("p2"));
}

#[tokio::test]
async fn retrieved_papers_are_parsed_and_cited() {
    let parser = FixtureParser::default().with_paper(
        "s2:r1",
        &[(
            Section::Results,
            "Sleep deprivation impairs memory consolidation in healthy adults.",
        )],
    );
    let registry = registry(parser, FixtureAssessor::default()).with(ToolHandle::Retrieve(
        Arc::new(FixtureRetriever {
            papers: vec![retrieved_paper("s2:r1")],
            fail: false,
        }),
    ));
    let pipeline = pipeline(registry);

    let response = pipeline
        .process(
            "What does the literature say about sleep and memory consolidation?",
            &ConversationContext::default(),
        )
        .await
        .unwrap();

    assert_eq!(sources(&response), vec!["s2:r1"]);
    assert!(response.message.contains("memory consolidation"));
    assert!(response
        .reasoning
        .iter()
        .any(|r| r.starts_with("PLANNING") && r.contains("retrieve")));
}

#[tokio::test]
async fn failed_retrieval_yields_insufficient_evidence() {
    let registry = registry(FixtureParser::default(), FixtureAssessor::default()).with(
        ToolHandle::Retrieve(Arc::new(FixtureRetriever {
            papers: Vec::new(),
            fail: true,
        })),
    );
    let pipeline = pipeline(registry);

    let response = pipeline
        .process(
            "What does the literature say about sleep and memory consolidation?",
            &ConversationContext::default(),
        )
        .await
        .unwrap();

    assert!(response.sources.is_empty());
    assert_eq!(response.confidence, Confidence::Low);
    assert!(has_uncertainty(&response, UncertaintyReason::ToolFailure));
    assert!(has_uncertainty(&response, UncertaintyReason::InsufficientEvidence));
}

#[tokio::test]
async fn missing_retriever_is_reported_not_fatal() {
    let pipeline = pipeline(registry(conflicting_papers(), FixtureAssessor::default()));

    let response = pipeline
        .process("Compare method A and B", &context(&["paper-a", "paper-b"]))
        .await
        .unwrap();

    assert!(has_uncertainty(&response, UncertaintyReason::RetrievalUnavailable));
    assert!(!response.sources.is_empty());
}

// =============================================================================
// Guard invocations
// =============================================================================

#[tokio::test]
async fn hanging_scope_guard_degrades_instead_of_blocking() {
    let parser = FixtureParser::default().with_paper(
        "p1",
        &[(Section::Results, "The treatment reduced symptom severity in adults.")],
    );
    let registry = ToolRegistry::new()
        .with(ToolHandle::Parse(Arc::new(parser)))
        .with(ToolHandle::AssessReliability(Arc::new(
            FixtureAssessor::default(),
        )))
        .with(ToolHandle::ValidateScope(Arc::new(HangingGuard)));
    let pipeline = pipeline(registry);

    let response = pipeline
        .process("What were the results of this study?", &context(&["p1"]))
        .await
        .unwrap();

    assert_eq!(response.confidence, Confidence::Low);
    assert!(response.sources.is_empty());
    assert!(has_uncertainty(&response, UncertaintyReason::CriticalToolFailure));
    assert!(response.reasoning.last().unwrap().starts_with("DONE"));
    assert!(!response
        .reasoning
        .iter()
        .any(|r| r.starts_with("EXECUTING")));
}

#[tokio::test]
async fn inconclusive_question_uses_classifier() {
    let classified = Intent {
        question_type: QuestionType::Critique,
        requires_external_evidence: false,
        requires_paper_context: true,
    };
    let registry = registry(FixtureParser::default(), FixtureAssessor::default())
        .with(ToolHandle::ClassifyIntent(Arc::new(FixedClassifier(classified))));
    let pipeline = pipeline(registry);

    let response = pipeline
        .process("Is it any good?", &ConversationContext::default())
        .await
        .unwrap();

    assert!(response.reasoning[1].contains("critique"));
    assert!(response.reasoning[1].contains("fixed-classifier"));
    // Classified as needing a paper, none attached, no retrieval
    assert_eq!(response.message, CLARIFICATION_MESSAGE);
}

#[tokio::test]
async fn failing_classifier_degrades() {
    let registry = registry(FixtureParser::default(), FixtureAssessor::default())
        .with(ToolHandle::ClassifyIntent(Arc::new(BrokenClassifier)));
    let pipeline = pipeline(registry);

    let response = pipeline
        .process("Is it any good?", &ConversationContext::default())
        .await
        .unwrap();

    assert_eq!(response.confidence, Confidence::Low);
    assert!(has_uncertainty(&response, UncertaintyReason::CriticalToolFailure));
    assert!(response
        .reasoning
        .iter()
        .any(|r| r.starts_with("INTENT: classification failed")));
}

#[tokio::test]
async fn conclusive_question_never_calls_classifier() {
    let registry = registry(FixtureParser::default(), FixtureAssessor::default())
        .with(ToolHandle::ClassifyIntent(Arc::new(BrokenClassifier)));
    let pipeline = pipeline(registry);

    let response = pipeline
        .process("What is the capital of France?", &ConversationContext::default())
        .await
        .unwrap();

    assert_eq!(response.message, REJECTION_MESSAGE);
}

// =============================================================================
// Properties
// =============================================================================

#[tokio::test]
async fn identical_inputs_give_identical_responses() {
    let pipeline = pipeline(registry(conflicting_papers(), FixtureAssessor::default()));
    let ctx = context(&["paper-a", "paper-b"]);

    let first = pipeline.process("Compare method A and B", &ctx).await.unwrap();
    let second = pipeline.process("Compare method A and B", &ctx).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn real_tools_answer_from_a_local_document() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("trial.txt"),
        "\
Sleep and Recall

1. Introduction
We investigate whether sleep improves recall.

2. Methods
We recruited 120 participants from a university campus.

3. Results
Recall improved by 12 percent after a full night of sleep.

4. Limitations
The sample was drawn from a single university.
",
    )
    .unwrap();

    let mut config = ScholarConfig::default();
    config.documents.root = dir.path().to_path_buf();
    let pipeline = ResearchPipeline::from_config(&config).unwrap();
    let ctx = ConversationContext::with_papers(vec![PaperReference::new(
        "trial",
        SourceType::File,
        "trial.txt",
    )]);

    let response = pipeline
        .process("What are the limitations of this study?", &ctx)
        .await
        .unwrap();

    assert_eq!(sources(&response), vec!["trial"]);
    assert!(response.message.contains("single university"));
    assert_eq!(response.confidence, Confidence::Medium);
}
