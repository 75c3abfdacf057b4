//! Lightweight text utilities shared by the heuristics.
//!
//! Everything here is deterministic and allocation-light; no language model is
//! involved.

use std::collections::BTreeSet;

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "of", "to", "in", "on", "at", "for", "by", "with",
    "from", "as", "is", "are", "was", "were", "be", "been", "being", "this", "that", "these",
    "those", "it", "its", "they", "their", "them", "we", "our", "us", "you", "your", "i", "me",
    "my", "what", "which", "who", "whom", "how", "when", "where", "do", "does", "did", "has",
    "have", "had", "can", "could", "would", "should", "will", "shall", "than", "then", "there",
    "into", "about", "also", "such", "both", "each", "any", "all", "some", "so", "if", "not",
];

/// Words that end in a period without ending a sentence.
const ABBREVIATIONS: &[&str] = &[
    "e.g.", "i.e.", "et al.", "al.", "fig.", "figs.", "eq.", "vs.", "cf.", "approx.", "no.",
    "dr.", "etc.",
];

/// Lowercased alphanumeric words, in order, stopwords included.
pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

/// Crude suffix stripping so that "limitations"/"limitation" and
/// "improved"/"improves" compare equal.
pub fn stem(word: &str) -> String {
    let mut w = word.to_string();
    if w.len() > 4 && w.ends_with("ies") {
        w.truncate(w.len() - 3);
        w.push('y');
        return w;
    }
    if w.len() > 3 && w.ends_with('s') && !w.ends_with("ss") {
        w.pop();
    }
    if w.len() > 5 && w.ends_with("ing") {
        w.truncate(w.len() - 3);
    } else if w.len() > 4 && w.ends_with("ed") {
        w.truncate(w.len() - 2);
    }
    if w.len() > 4 && w.ends_with('e') {
        w.pop();
    }
    w
}

/// Stemmed content words.
pub fn token_set(text: &str) -> BTreeSet<String> {
    words(text)
        .into_iter()
        .filter(|w| !is_stopword(w))
        .map(|w| stem(&w))
        .collect()
}

/// Jaccard similarity of two token sets. Two empty sets are dissimilar.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    let union = a.len() + b.len() - shared;
    shared as f64 / union as f64
}

/// Text as `" w1 w2 ... "` so that phrase lookups respect word boundaries.
pub fn normalised(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(' ');
    for w in words(text) {
        out.push_str(&w);
        out.push(' ');
    }
    out
}

/// Whole-word phrase lookup against [`normalised`] text.
pub fn has_phrase(normalised_text: &str, phrase: &str) -> bool {
    let needle = format!(" {} ", phrase.trim());
    normalised_text.contains(&needle)
}

/// Whole-word prefix lookup, e.g. `"significan"` matches "significantly".
pub fn has_word_prefix(normalised_text: &str, prefix: &str) -> bool {
    normalised_text.contains(&format!(" {}", prefix))
}

/// Split prose into sentences.
///
/// Breaks on `.`, `!` or `?` followed by whitespace, and on blank lines.
/// Known abbreviations and decimals do not end a sentence.
pub fn sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for paragraph in text.split("\n\n") {
        let chars: Vec<char> = paragraph.chars().collect();
        let mut current = String::new();
        for (i, &c) in chars.iter().enumerate() {
            current.push(if c == '\n' { ' ' } else { c });
            let at_boundary = matches!(c, '.' | '!' | '?')
                && chars.get(i + 1).map_or(true, |n| n.is_whitespace());
            if at_boundary && !ends_with_abbreviation(&current) {
                push_sentence(&mut out, &current);
                current.clear();
            }
        }
        push_sentence(&mut out, &current);
    }
    out
}

fn ends_with_abbreviation(current: &str) -> bool {
    let lower = current.to_lowercase();
    ABBREVIATIONS.iter().any(|a| {
        lower.ends_with(a)
            && lower[..lower.len() - a.len()]
                .chars()
                .last()
                .map_or(true, |c| !c.is_alphanumeric())
    })
}

fn push_sentence(out: &mut Vec<String>, sentence: &str) {
    let trimmed = sentence.split_whitespace().collect::<Vec<_>>().join(" ");
    if !trimmed.is_empty() {
        out.push(trimmed);
    }
}

/// Shorten text for logs and one-line displays.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}
