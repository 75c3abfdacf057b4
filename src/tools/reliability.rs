//! Heuristic source reliability.
//!
//! Scores a paper from what its own text says about how it was done. The
//! score is the sum of the factor weights below; the factors that fired are
//! returned alongside the grade so the composer can explain it.

use super::{ReliabilityAssessor, ToolError};
use crate::state::{Claim, Paper, Reliability, ReliabilityAssessment, Section};
use crate::text;
use async_trait::async_trait;

const HIGH_THRESHOLD: i32 = 3;
const MEDIUM_THRESHOLD: i32 = 1;

const SAMPLE_NOUNS: &[&str] = &[
    "participants",
    "subjects",
    "patients",
    "respondents",
    "samples",
    "students",
    "children",
    "adults",
    "users",
    "cases",
    "trials",
    "examples",
];

const HEDGES: &[&str] = &[
    "may",
    "might",
    "could",
    "possibly",
    "perhaps",
    "suggests",
    "suggest",
    "preliminary",
    "tentative",
    "unclear",
];

#[derive(Debug, Default)]
pub struct HeuristicReliabilityAssessor;

impl HeuristicReliabilityAssessor {
    pub fn new() -> Self {
        Self
    }

    /// Score and fired factors for the given text.
    fn score(&self, paper: &Paper, claims: &[Claim]) -> (i32, Vec<String>) {
        let corpus = corpus(paper, claims);
        let normalised = text::normalised(&corpus);
        let mut score = 0;
        let mut factors = Vec::new();

        if text::has_phrase(&normalised, "meta analysis")
            || text::has_phrase(&normalised, "systematic review")
        {
            score += 3;
            factors.push("systematic review or meta-analysis".to_string());
        } else if text::has_word_prefix(&normalised, "randomi")
            && text::has_word_prefix(&normalised, "control")
        {
            score += 2;
            factors.push("randomised controlled design".to_string());
        } else if text::has_word_prefix(&normalised, "randomi")
            || text::has_phrase(&normalised, "control group")
        {
            score += 1;
            factors.push("controlled comparison".to_string());
        }

        if text::has_phrase(&normalised, "case study")
            || text::has_phrase(&normalised, "anecdotal")
            || text::has_phrase(&normalised, "single case")
        {
            score -= 1;
            factors.push("case study or anecdotal evidence".to_string());
        }

        if let Some(n) = largest_sample(&corpus) {
            if n >= 1000 {
                score += 2;
                factors.push(format!("large sample (n={})", n));
            } else if n >= 100 {
                score += 1;
                factors.push(format!("moderate sample (n={})", n));
            } else if n < 30 {
                score -= 1;
                factors.push(format!("small sample (n={})", n));
            }
        }

        let hedges = text::words(&corpus)
            .iter()
            .filter(|w| HEDGES.contains(&w.as_str()))
            .count();
        if hedges >= 3 {
            score -= 1;
            factors.push(format!("hedged language ({} hedges)", hedges));
        }

        let acknowledges_limitations = claims
            .iter()
            .any(|c| c.section_origin == Section::Limitations)
            || paper
                .parsed_sections
                .as_ref()
                .is_some_and(|s| !s.limitations.trim().is_empty());
        if acknowledges_limitations {
            score += 1;
            factors.push("acknowledges limitations".to_string());
        }

        match paper.metadata.citation_count {
            Some(c) if c >= 100 => {
                score += 2;
                factors.push(format!("widely cited ({} citations)", c));
            }
            Some(c) if c >= 20 => {
                score += 1;
                factors.push(format!("cited ({} citations)", c));
            }
            _ => {}
        }

        (score, factors)
    }
}

#[async_trait]
impl ReliabilityAssessor for HeuristicReliabilityAssessor {
    fn name(&self) -> &str {
        "heuristic-reliability"
    }

    async fn assess(
        &self,
        paper: &Paper,
        claims: &[Claim],
    ) -> Result<ReliabilityAssessment, ToolError> {
        let (score, mut factors) = self.score(paper, claims);
        let reliability = if score >= HIGH_THRESHOLD {
            Reliability::High
        } else if score >= MEDIUM_THRESHOLD {
            Reliability::Medium
        } else {
            Reliability::Low
        };
        if factors.is_empty() {
            factors.push("no reliability signals found".to_string());
        }

        Ok(ReliabilityAssessment {
            paper_id: paper.id.clone(),
            reliability,
            factors,
        })
    }
}

/// Everything the paper says about itself, deduplicated by sentence.
fn corpus(paper: &Paper, claims: &[Claim]) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(sections) = &paper.parsed_sections {
        parts.extend(Section::ALL.iter().map(|s| sections.get(*s)));
    }
    if let Some(abstract_text) = &paper.metadata.abstract_text {
        parts.push(abstract_text);
    }
    for claim in claims {
        if !parts.iter().any(|p| p.contains(claim.statement.as_str())) {
            parts.push(&claim.statement);
        }
    }
    parts.join("\n\n")
}

/// Largest "N participants" / "n = N" count mentioned.
fn largest_sample(corpus: &str) -> Option<u32> {
    let words: Vec<String> = corpus
        .split(|c: char| !c.is_alphanumeric() && c != ',')
        .filter(|w| !w.is_empty())
        .map(|w| w.trim_matches(',').to_lowercase())
        .collect();

    let mut largest: Option<u32> = None;
    for (i, word) in words.iter().enumerate() {
        let count = if word == "n" {
            words.get(i + 1).and_then(|w| parse_count(w))
        } else if words
            .get(i + 1)
            .is_some_and(|next| SAMPLE_NOUNS.contains(&next.as_str()))
        {
            parse_count(word)
        } else {
            None
        };
        if let Some(n) = count {
            largest = Some(largest.map_or(n, |l| l.max(n)));
        }
    }
    largest
}

fn parse_count(word: &str) -> Option<u32> {
    let digits: String = word.chars().filter(|c| *c != ',').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
