//! Scope validation.
//!
//! Rules, first match wins:
//! 1. off-topic intent, a blocked pattern, or (strict) no research domain → rejected
//! 2. paper context required, no papers attached, no retrieval → clarify
//! 3. otherwise accepted, with warnings for soft issues

use crate::config::{ScopeMatcher, ScopePolicy};
use crate::state::{Intent, QuestionType, ScopeDecision};
use crate::text;

/// Connectives that usually join two separate questions.
const PART_SEPARATORS: &[&str] = &[" and also ", " as well as ", " additionally ", "; "];

#[derive(Debug, Clone)]
pub struct ScopeValidator {
    policy: ScopePolicy,
    matcher: ScopeMatcher,
    retrieval_available: bool,
}

impl ScopeValidator {
    pub fn new(policy: ScopePolicy, matcher: ScopeMatcher, retrieval_available: bool) -> Self {
        Self {
            policy,
            matcher,
            retrieval_available,
        }
    }

    pub fn validate(
        &self,
        question: &str,
        intent: &Intent,
        papers_attached: usize,
    ) -> ScopeDecision {
        if intent.question_type == QuestionType::OffTopic {
            return ScopeDecision::rejected(vec!["question is not about research".to_string()]);
        }
        if self.matcher.is_blocked(question) {
            return ScopeDecision::rejected(vec![
                "question matches a blocked scope pattern".to_string(),
            ]);
        }
        let in_domain = self.matcher.mentions_domain(question);
        if !in_domain && self.policy.strict_domains {
            return ScopeDecision::rejected(vec![
                "question is outside the configured research domains".to_string(),
            ]);
        }

        if intent.requires_paper_context && papers_attached == 0 && !self.retrieval_available {
            return ScopeDecision::clarify(vec![
                "question refers to a paper but none is attached".to_string(),
            ]);
        }

        let mut warnings = Vec::new();
        let parts = count_parts(question);
        if parts > self.policy.max_question_parts {
            warnings.push(format!(
                "question appears to have {} parts; answering them together",
                parts
            ));
        }
        let word_count = text::words(question).len();
        if word_count < self.policy.min_question_words {
            warnings.push(format!(
                "question is very short ({} words) and may be ambiguous",
                word_count
            ));
        }
        if !in_domain {
            warnings.push("question names none of the configured research domains".to_string());
        }
        if intent.requires_paper_context && papers_attached == 0 {
            warnings.push("no paper attached; answering from retrieved papers".to_string());
        }

        ScopeDecision::accepted(warnings)
    }
}

/// Question marks and joining connectives, at least one part.
fn count_parts(question: &str) -> usize {
    let marks = question.matches('?').count();
    let lower = format!(" {} ", question.to_lowercase());
    let joins: usize = PART_SEPARATORS
        .iter()
        .map(|sep| lower.matches(sep).count())
        .sum();
    marks.max(1) + joins
}
