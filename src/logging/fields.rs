//! Field extraction helpers for structured logging

use crate::state::{Confidence, Response, Stage};

const PREVIEW_CHARS: usize = 100;

/// Truncate a question for a log preview (privacy-safe)
///
/// Returns None if content logging is disabled or the question is blank.
///
/// # Examples
///
/// ```
/// use scholar::logging::truncate_question;
///
/// assert_eq!(truncate_question("What did the trial find?", false), None);
/// assert_eq!(
///     truncate_question("What did the trial find?", true).as_deref(),
///     Some("What did the trial find?")
/// );
/// ```
pub fn truncate_question(question: &str, enable_content_logging: bool) -> Option<String> {
    if !enable_content_logging {
        return None;
    }
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(crate::text::truncate(trimmed, PREVIEW_CHARS))
}

/// Metrics label for a finished response: the terminal stage it reached,
/// or "degraded" for an answer abandoned after a critical tool failure.
pub fn outcome_label(response: &Response) -> &'static str {
    let last = response.reasoning.last().map(String::as_str).unwrap_or("");
    if last.starts_with(Stage::Rejected.as_str()) {
        "rejected"
    } else if last.starts_with(Stage::Clarify.as_str()) {
        "clarify"
    } else if response.confidence == Confidence::Low && last.contains("degraded") {
        "degraded"
    } else {
        "done"
    }
}
