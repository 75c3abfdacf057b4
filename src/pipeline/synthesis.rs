//! Evidence synthesis.
//!
//! 1. Claims are grouped into topics by single-link token similarity.
//! 2. Topics unrelated to the question are set aside (unless none relate).
//! 3. Each topic picks a working answer: the most reliable claim, ties broken
//!    by how many other papers corroborate it, then by arrival order.
//! 4. Every other claim in the topic supports or conflicts with it.
//! 5. Topic confidence follows the evidence; the answer takes the minimum.

use crate::config::SynthesisConfig;
use crate::state::{
    Claim, Confidence, EvidenceItem, ReasoningState, Relation, Reliability, Section,
    StateDelta, Uncertainty, UncertaintyReason,
};
use crate::text;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Words that flip the polarity of a statement.
const NEGATIONS: &[&str] = &[
    "not", "no", "never", "fail", "fails", "failed", "cannot", "without", "lack", "lacks",
    "neither", "nor", "none",
];

/// Opposite-polarity word pairs, compared after stemming.
const ANTONYMS: &[(&str, &str)] = &[
    ("outperform", "underperform"),
    ("increase", "decrease"),
    ("increase", "reduce"),
    ("higher", "lower"),
    ("better", "worse"),
    ("improve", "worsen"),
    ("improve", "degrade"),
    ("faster", "slower"),
    ("more", "less"),
    ("positive", "negative"),
    ("effective", "ineffective"),
    ("significant", "insignificant"),
    ("benefit", "harm"),
    ("support", "contradict"),
];

/// Verbs of the form "X <verb> Y" where X is the winner.
const COMPARATIVES: &[&str] = &[
    "outperforms",
    "outperformed",
    "outperform",
    "beats",
    "beat",
    "exceeds",
    "exceeded",
    "surpasses",
    "surpassed",
    "better than",
    "superior to",
];

/// Verbs of the form "X <verb> Y" where Y is the winner.
const INVERSE_COMPARATIVES: &[&str] = &[
    "underperforms",
    "underperformed",
    "underperform",
    "worse than",
    "inferior to",
];

/// Longest entity name read on either side of a comparative verb.
const MAX_ENTITY_WORDS: usize = 3;

/// Question words too generic to make a topic relevant.
const GENERIC_QUESTION_TOKENS: &[&str] = &[
    "paper", "study", "author", "work", "article", "compar", "method", "explain", "describ",
    "summariz", "main", "key", "say", "think", "tell",
];

/// One topic group after synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSummary {
    /// Index carried by this topic's evidence items
    pub index: usize,
    pub candidate: Claim,
    pub confidence: Confidence,
    pub has_conflict: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Synthesis {
    pub supporting: Vec<EvidenceItem>,
    pub conflicting: Vec<EvidenceItem>,
    pub uncertainties: Vec<Uncertainty>,
    pub confidence: Confidence,
    pub topics: Vec<TopicSummary>,
}

impl Synthesis {
    pub fn is_empty(&self) -> bool {
        self.supporting.is_empty() && self.conflicting.is_empty()
    }

    /// Evidence fields as a state delta.
    pub fn to_delta(&self) -> StateDelta {
        StateDelta {
            supporting_evidence: self.supporting.clone(),
            conflicting_evidence: self.conflicting.clone(),
            uncertainties: self.uncertainties.clone(),
            confidence: Some(self.confidence),
            ..StateDelta::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EvidenceSynthesizer {
    config: SynthesisConfig,
}

impl EvidenceSynthesizer {
    pub fn new(config: SynthesisConfig) -> Self {
        Self { config }
    }

    pub fn synthesize(&self, state: &ReasoningState) -> Synthesis {
        if state.claims.is_empty() {
            return Synthesis {
                confidence: Confidence::Low,
                uncertainties: vec![Uncertainty::new(
                    UncertaintyReason::InsufficientEvidence,
                    "no claims could be extracted from any paper",
                )],
                ..Synthesis::default()
            };
        }

        let tokens: Vec<BTreeSet<String>> = state
            .claims
            .iter()
            .map(|c| text::token_set(&c.statement))
            .collect();
        let groups = self.group(&tokens);
        let relevant = relevant_groups(&state.user_question, &state.claims, &tokens, &groups);

        let mut synthesis = Synthesis::default();
        let mut confidence: Option<Confidence> = None;

        for (index, members) in relevant.into_iter().enumerate() {
            let topic = self.synthesize_topic(index, &members, state, &tokens, &mut synthesis);
            confidence = Some(confidence.map_or(topic, |c| c.min(topic)));
        }

        let mut confidence = confidence.unwrap_or(Confidence::Low);
        let tools_failed = state.uncertainties.iter().any(|u| {
            matches!(
                u.reason,
                UncertaintyReason::ToolFailure | UncertaintyReason::Timeout
            )
        });
        if tools_failed {
            confidence = confidence.min(Confidence::Medium);
        }
        synthesis.confidence = confidence.max(Confidence::Low);
        synthesis
    }

    /// Single-link grouping: claims linked by any chain of similar pairs
    /// share a group. Groups are ordered by their earliest claim and list
    /// claim indices in ascending order.
    fn group(&self, tokens: &[BTreeSet<String>]) -> Vec<Vec<usize>> {
        let mut parent: Vec<usize> = (0..tokens.len()).collect();
        for i in 0..tokens.len() {
            for j in (i + 1)..tokens.len() {
                if text::jaccard(&tokens[i], &tokens[j]) >= self.config.topic_similarity {
                    let (a, b) = (find_root(&mut parent, i), find_root(&mut parent, j));
                    // Lower index stays root so group order follows claim order
                    if a != b {
                        parent[a.max(b)] = a.min(b);
                    }
                }
            }
        }

        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut slot_of_root: HashMap<usize, usize> = HashMap::new();
        for i in 0..tokens.len() {
            let root = find_root(&mut parent, i);
            match slot_of_root.get(&root) {
                Some(&slot) => groups[slot].push(i),
                None => {
                    slot_of_root.insert(root, groups.len());
                    groups.push(vec![i]);
                }
            }
        }
        groups
    }

    fn synthesize_topic(
        &self,
        index: usize,
        members: &[usize],
        state: &ReasoningState,
        tokens: &[BTreeSet<String>],
        out: &mut Synthesis,
    ) -> Confidence {
        let claims = &state.claims;
        let reliability = |i: usize| state.reliability_of(&claims[i].source_paper_id);

        let corroboration = |i: usize| -> usize {
            members
                .iter()
                .filter(|&&j| claims[j].source_paper_id != claims[i].source_paper_id)
                .filter(|&&j| {
                    text::jaccard(&tokens[i], &tokens[j]) >= self.config.corroboration_similarity
                })
                .filter(|&&j| !conflicts(&claims[i].statement, &claims[j].statement))
                .map(|&j| claims[j].source_paper_id.as_str())
                .collect::<HashSet<_>>()
                .len()
        };

        // Highest (reliability, corroboration); earliest wins ties.
        let mut candidate = members[0];
        let mut best = (reliability(candidate), corroboration(candidate));
        for &i in &members[1..] {
            let score = (reliability(i), corroboration(i));
            if score > best {
                candidate = i;
                best = score;
            }
        }

        let item = |i: usize, relation: Relation| EvidenceItem {
            claim: claims[i].clone(),
            relation,
            reliability: reliability(i),
            source_paper_id: claims[i].source_paper_id.clone(),
            topic: index,
        };

        let mut supporting = vec![item(candidate, Relation::Supporting)];
        let mut conflicting = Vec::new();
        for &i in members.iter().filter(|&&i| i != candidate) {
            if conflicts(&claims[candidate].statement, &claims[i].statement) {
                conflicting.push(item(i, Relation::Conflicting));
            } else {
                supporting.push(item(i, Relation::Supporting));
            }
        }

        let high_sources: HashSet<&str> = supporting
            .iter()
            .filter(|e| e.reliability == Reliability::High)
            .map(|e| e.source_paper_id.as_str())
            .collect();
        let subject = text::truncate(&claims[candidate].statement, 80);

        let confidence = if !conflicting.is_empty() {
            let mut affected = vec![claims[candidate].id.clone()];
            affected.extend(conflicting.iter().map(|e| e.claim.id.clone()));
            out.uncertainties.push(
                Uncertainty::new(
                    UncertaintyReason::ConflictingEvidence,
                    format!("sources disagree about \"{}\"", subject),
                )
                .with_claims(affected),
            );
            let weak_dissent = conflicting.iter().all(|e| e.reliability == Reliability::Low);
            if high_sources.len() >= 2 && weak_dissent {
                Confidence::Medium
            } else {
                Confidence::Low
            }
        } else if supporting.iter().all(|e| e.reliability == Reliability::Low) {
            out.uncertainties.push(
                Uncertainty::new(
                    UncertaintyReason::SparseEvidence,
                    format!("only low-reliability sources support \"{}\"", subject),
                )
                .with_claims(supporting.iter().map(|e| e.claim.id.clone()).collect()),
            );
            Confidence::Low
        } else if high_sources.len() >= 2 {
            Confidence::High
        } else {
            Confidence::Medium
        };

        out.topics.push(TopicSummary {
            index,
            candidate: claims[candidate].clone(),
            confidence,
            has_conflict: !conflicting.is_empty(),
        });
        out.supporting.extend(supporting);
        out.conflicting.extend(conflicting);
        confidence
    }
}

fn find_root(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Groups that bear on the question, in group order. Falls back to every
/// group when the question matches none of them.
fn relevant_groups(
    question: &str,
    claims: &[Claim],
    tokens: &[BTreeSet<String>],
    groups: &[Vec<usize>],
) -> Vec<Vec<usize>> {
    let focus = question_focus(question);
    let question_tokens: BTreeSet<String> = text::token_set(question)
        .into_iter()
        .filter(|t| !GENERIC_QUESTION_TOKENS.contains(&t.as_str()))
        .collect();

    let relevant: Vec<Vec<usize>> = groups
        .iter()
        .filter(|members| {
            members.iter().any(|&i| {
                focus.contains(&claims[i].section_origin)
                    || !question_tokens.is_disjoint(&tokens[i])
            })
        })
        .cloned()
        .collect();

    if relevant.is_empty() {
        groups.to_vec()
    } else {
        relevant
    }
}

/// Sections a question asks about by name.
fn question_focus(question: &str) -> Vec<Section> {
    let n = text::normalised(question);
    let mut focus = Vec::new();
    let mentions = |prefixes: &[&str]| prefixes.iter().any(|p| text::has_word_prefix(&n, p));
    if mentions(&["limitation", "weakness", "shortcoming", "caveat"]) {
        focus.push(Section::Limitations);
    }
    if mentions(&["method", "design", "procedure", "approach", "sample"]) {
        focus.push(Section::Methodology);
    }
    if mentions(&[
        "result",
        "finding",
        "performance",
        "outcome",
        "accuracy",
        "effect",
        "outperform",
    ]) {
        focus.push(Section::Results);
    }
    if mentions(&["aim", "hypothes", "objective", "research question", "motivation"]) {
        focus.push(Section::ResearchQuestion);
    }
    focus
}

/// Whether two statements on the same topic contradict each other.
///
/// Two comparisons ("A outperforms B") conflict when their winners are
/// swapped. Otherwise polarity flips are counted: differing negation parity
/// and each antonym pair split across the statements. An odd count is a
/// conflict.
pub fn conflicts(a: &str, b: &str) -> bool {
    let wa = text::words(a);
    let wb = text::words(b);

    let negations = |w: &[String]| w.iter().filter(|x| NEGATIONS.contains(&x.as_str())).count();
    let negation_differs = negations(&wa) % 2 != negations(&wb) % 2;

    if let (Some(ca), Some(cb)) = (comparison(&wa), comparison(&wb)) {
        let swapped = ca.winner != ca.loser && ca.winner == cb.loser && ca.loser == cb.winner;
        return swapped != negation_differs;
    }

    let mut flips = usize::from(negation_differs);
    let sa: HashSet<String> = wa.iter().map(|w| text::stem(w)).collect();
    let sb: HashSet<String> = wb.iter().map(|w| text::stem(w)).collect();
    for (x, y) in ANTONYMS {
        let (x, y) = (text::stem(x), text::stem(y));
        let a_x_b_y = sa.contains(&x) && sb.contains(&y) && !sa.contains(&y) && !sb.contains(&x);
        let a_y_b_x = sa.contains(&y) && sb.contains(&x) && !sa.contains(&x) && !sb.contains(&y);
        if a_x_b_y || a_y_b_x {
            flips += 1;
        }
    }
    flips % 2 == 1
}

#[derive(Debug, PartialEq, Eq)]
struct Comparison {
    winner: Vec<String>,
    loser: Vec<String>,
}

/// Entities on both sides of the first comparative verb, if any.
fn comparison(words: &[String]) -> Option<Comparison> {
    let verbs = COMPARATIVES
        .iter()
        .map(|v| (v, false))
        .chain(INVERSE_COMPARATIVES.iter().map(|v| (v, true)));

    for (verb, inverse) in verbs {
        let verb_words: Vec<&str> = verb.split(' ').collect();
        let len = verb_words.len();
        let Some(position) = words
            .windows(len)
            .position(|w| w.iter().map(String::as_str).eq(verb_words.iter().copied()))
        else {
            continue;
        };

        let mut subject = entity(words[..position].iter().rev());
        subject.reverse();
        let object = entity(words[position + len..].iter());
        if subject.is_empty() || object.is_empty() {
            continue;
        }
        return Some(if inverse {
            Comparison {
                winner: object,
                loser: subject,
            }
        } else {
            Comparison {
                winner: subject,
                loser: object,
            }
        });
    }
    None
}

/// Skip function words next to the verb ("is", "the"), then read a run of
/// content words. Single letters count as content ("method A").
fn entity<'a>(mut words: impl Iterator<Item = &'a String>) -> Vec<String> {
    let is_content = |w: &str| w.len() == 1 || !text::is_stopword(w);
    let mut run = Vec::new();
    for word in words.by_ref() {
        if is_content(word) {
            run.push(word.clone());
            break;
        }
    }
    if run.is_empty() {
        return run;
    }
    for word in words {
        if run.len() == MAX_ENTITY_WORDS || !is_content(word) {
            break;
        }
        run.push(word.clone());
    }
    run
}
