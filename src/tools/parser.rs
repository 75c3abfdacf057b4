//! Section and claim extraction.
//!
//! Text is split into the four canonical sections by heading detection. When a
//! text has no recognisable headings (abstracts, short notes) each sentence is
//! classified by cue words instead. Claims are the sentences of each section.

use super::documents::DocumentStore;
use super::{PaperParser, ParsedPaper, ToolError};
use crate::state::{Claim, Paper, ParsedSections, Section};
use crate::text;
use async_trait::async_trait;
use std::sync::Arc;

/// Longest line, in words, still considered a heading.
const MAX_HEADING_WORDS: usize = 6;

const HEADINGS: &[(Section, &[&str])] = &[
    (
        Section::ResearchQuestion,
        &[
            "introduction",
            "background",
            "research question",
            "research questions",
            "objective",
            "objectives",
            "aim",
            "aims",
            "motivation",
            "hypothesis",
            "hypotheses",
            "purpose",
        ],
    ),
    (
        Section::Methodology,
        &[
            "method",
            "methods",
            "methodology",
            "materials and methods",
            "experimental setup",
            "experiments",
            "study design",
            "approach",
            "design",
            "participants",
            "procedure",
        ],
    ),
    (
        Section::Results,
        &[
            "results",
            "findings",
            "evaluation",
            "discussion",
            "results and discussion",
            "conclusion",
            "conclusions",
            "outcomes",
        ],
    ),
    (
        Section::Limitations,
        &[
            "limitations",
            "limitation",
            "threats to validity",
            "limitations and future work",
            "strengths and limitations",
        ],
    ),
];

/// Headings whose body is not one of the four sections.
const IGNORED_HEADINGS: &[&str] = &[
    "abstract",
    "references",
    "bibliography",
    "acknowledgements",
    "acknowledgments",
    "related work",
    "appendix",
    "funding",
    "keywords",
];

const LIMITATION_CUES: &[&str] = &[
    "limitation",
    "limited by",
    "small sample",
    "future work",
    "caveat",
    "may not generali",
    "cannot rule out",
    "was not controlled",
    "weakness",
    "threat to validity",
];

const QUESTION_CUES: &[&str] = &[
    "we investigate",
    "we examine",
    "we ask",
    "this study examines",
    "this paper examines",
    "we hypothesi",
    "the aim",
    "our aim",
    "we aim",
    "objective",
    "whether",
    "research question",
];

const METHOD_CUES: &[&str] = &[
    "we used",
    "we use",
    "we collected",
    "we conducted",
    "we recruited",
    "we trained",
    "participants",
    "sample of",
    "dataset",
    "randomi",
    "survey",
    "procedure",
    "were assigned",
    "we measured",
];

const RESULT_CUES: &[&str] = &[
    "we found",
    "we find",
    "results",
    "showed",
    "shows",
    "significant",
    "outperform",
    "underperform",
    "improve",
    "increase",
    "decrease",
    "reduce",
    "achieve",
    "accuracy",
    "associated with",
    "effective",
];

/// Parser backed by a [`DocumentStore`].
pub struct SectionParser {
    store: Arc<dyn DocumentStore>,
    max_claims_per_section: usize,
    min_claim_words: usize,
}

impl SectionParser {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        max_claims_per_section: usize,
        min_claim_words: usize,
    ) -> Self {
        Self {
            store,
            max_claims_per_section,
            min_claim_words,
        }
    }

    /// Sentence-level claims, ids stable as `<paper>#<section>-<n>`.
    pub fn extract_claims(&self, paper_id: &str, sections: &ParsedSections) -> Vec<Claim> {
        let mut claims = Vec::new();
        for section in Section::ALL {
            let kept = text::sentences(sections.get(section))
                .into_iter()
                .filter(|s| text::words(s).len() >= self.min_claim_words)
                .take(self.max_claims_per_section);
            for (n, statement) in kept.enumerate() {
                claims.push(Claim {
                    id: format!("{}#{}-{}", paper_id, section.as_str(), n),
                    source_paper_id: paper_id.to_string(),
                    statement,
                    section_origin: section,
                });
            }
        }
        claims
    }
}

#[async_trait]
impl PaperParser for SectionParser {
    fn name(&self) -> &str {
        "section-parser"
    }

    async fn parse(&self, paper: &Paper) -> Result<ParsedPaper, ToolError> {
        let sections = match &paper.parsed_sections {
            Some(existing) if !existing.is_empty() => existing.clone(),
            _ => match &paper.metadata.abstract_text {
                Some(abstract_text) => split_sections(abstract_text),
                None => {
                    let body = self.store.fetch_text(paper).await?;
                    split_sections(&body)
                }
            },
        };

        let claims = self.extract_claims(&paper.id, &sections);
        tracing::trace!(
            paper_id = %paper.id,
            claims = claims.len(),
            "Parsed paper"
        );

        Ok(ParsedPaper {
            paper_id: paper.id.clone(),
            sections,
            claims,
        })
    }
}

/// Split free text into the four canonical sections.
pub fn split_sections(body: &str) -> ParsedSections {
    let mut sections = ParsedSections::default();
    let mut found_heading = false;
    // None while inside an ignored heading or before the first heading
    let mut current: Option<Section> = None;
    let mut preamble = String::new();

    for line in body.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if let Some(section) = current {
                append(sections.get_mut(section), "\n\n");
            } else if !found_heading {
                preamble.push_str("\n\n");
            }
            continue;
        }

        match heading_of(trimmed) {
            Some(HeadingMatch { section, rest }) => {
                found_heading = true;
                current = section;
                if let (Some(section), Some(rest)) = (section, rest) {
                    append(sections.get_mut(section), rest);
                }
            }
            None => match current {
                Some(section) => append(sections.get_mut(section), trimmed),
                None if !found_heading => {
                    preamble.push_str(trimmed);
                    preamble.push('\n');
                }
                None => {}
            },
        }
    }

    if !found_heading {
        return classify_sentences(&preamble);
    }

    for section in Section::ALL {
        let cleaned = sections.get(section).trim().to_string();
        *sections.get_mut(section) = cleaned;
    }
    sections
}

struct HeadingMatch<'a> {
    section: Option<Section>,
    /// Body text following an inline `Heading:` prefix
    rest: Option<&'a str>,
}

fn heading_of(line: &str) -> Option<HeadingMatch<'_>> {
    // Inline form: "Results: accuracy improved by 4 points."
    if let Some((prefix, rest)) = line.split_once(':') {
        let rest = rest.trim();
        if !rest.is_empty() {
            if let Some(section) = match_heading(prefix) {
                return Some(HeadingMatch {
                    section,
                    rest: Some(rest),
                });
            }
            return None;
        }
    }

    if text::words(line).len() > MAX_HEADING_WORDS {
        return None;
    }
    match_heading(line).map(|section| HeadingMatch {
        section,
        rest: None,
    })
}

/// `Some(Some(_))` for a section heading, `Some(None)` for an ignored heading.
fn match_heading(candidate: &str) -> Option<Option<Section>> {
    let label = strip_numbering(candidate);
    if label.is_empty() {
        return None;
    }
    if IGNORED_HEADINGS.contains(&label.as_str()) {
        return Some(None);
    }
    HEADINGS
        .iter()
        .find(|(_, names)| names.contains(&label.as_str()))
        .map(|(section, _)| Some(*section))
}

/// "2.1 Materials and Methods" → "materials and methods"; "IV. RESULTS" → "results".
fn strip_numbering(candidate: &str) -> String {
    let words = text::words(candidate);
    let start = words
        .iter()
        .position(|w| !is_section_number(w))
        .unwrap_or(words.len());
    words[start..].join(" ")
}

fn is_section_number(word: &str) -> bool {
    word.chars().all(|c| c.is_ascii_digit())
        || (word.len() <= 4 && word.chars().all(|c| matches!(c, 'i' | 'v' | 'x')))
}

fn classify_sentences(body: &str) -> ParsedSections {
    let mut sections = ParsedSections::default();
    for sentence in text::sentences(body) {
        if let Some(section) = classify_sentence(&sentence) {
            append(sections.get_mut(section), &sentence);
        }
    }
    sections
}

/// Cue-word classification; unclassified sentences are dropped.
pub fn classify_sentence(sentence: &str) -> Option<Section> {
    let lower = sentence.to_lowercase();
    let has = |cues: &[&str]| cues.iter().any(|cue| lower.contains(cue));
    if has(LIMITATION_CUES) {
        Some(Section::Limitations)
    } else if has(QUESTION_CUES) {
        Some(Section::ResearchQuestion)
    } else if has(METHOD_CUES) {
        Some(Section::Methodology)
    } else if has(RESULT_CUES) {
        Some(Section::Results)
    } else {
        None
    }
}

fn append(target: &mut String, fragment: &str) {
    if fragment == "\n\n" {
        if !target.is_empty() && !target.ends_with("\n\n") {
            target.push_str("\n\n");
        }
        return;
    }
    if !target.is_empty() && !target.ends_with('\n') {
        target.push(' ');
    }
    target.push_str(fragment);
}
