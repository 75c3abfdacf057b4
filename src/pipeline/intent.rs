//! Question classification.
//!
//! Lexical heuristics run first. A question with no paper or research
//! vocabulary defaults to off-topic but is marked inconclusive, so the
//! pipeline may delegate it to a registered classification tool.

use crate::state::{Intent, QuestionType};
use crate::text;

/// References to a specific paper the conversation is about.
const PAPER_DEIXIS: &[&str] = &[
    "this paper",
    "this study",
    "this article",
    "this work",
    "this preprint",
    "the paper",
    "the study",
    "the article",
    "the manuscript",
    "the authors",
    "these papers",
    "these studies",
    "both papers",
    "both studies",
    "the papers",
    "the studies",
    "their method",
    "their results",
    "their findings",
];

const PAPER_NOUNS: &[&str] = &[
    "paper",
    "papers",
    "study",
    "studies",
    "article",
    "articles",
    "author",
    "authors",
    "manuscript",
    "preprint",
];

/// Vocabulary that makes a question research-shaped.
const RESEARCH_VOCAB: &[&str] = &[
    "method",
    "methods",
    "methodology",
    "result",
    "results",
    "finding",
    "findings",
    "sample",
    "dataset",
    "data",
    "experiment",
    "experiments",
    "hypothesis",
    "evidence",
    "effect",
    "effects",
    "limitation",
    "limitations",
    "significant",
    "significance",
    "model",
    "models",
    "analysis",
    "trial",
    "participants",
    "measure",
    "approach",
    "accuracy",
    "performance",
    "research",
    "theory",
    "baseline",
    "benchmark",
    "outcome",
    "outcomes",
    "treatment",
    "variable",
    "correlation",
];

const OFF_TOPIC_PATTERNS: &[&str] = &[
    "capital of",
    "weather",
    "recipe",
    "joke",
    "stock price",
    "who won",
    "translate",
    "movie",
    "song",
    "lottery",
    "horoscope",
    "poem",
    "what time is it",
    "football",
    "celebrity",
    "restaurant",
];

const COMPARISON_MARKERS: &[&str] = &[
    "compare",
    "compared",
    "comparison",
    "comparing",
    "versus",
    "vs",
    "differ",
    "differs",
    "difference",
    "differences",
    "better than",
    "worse than",
    "contrast",
    "similarities",
];

const CRITIQUE_MARKERS: &[&str] = &[
    "why",
    "flaw",
    "flaws",
    "flawed",
    "weakness",
    "weaknesses",
    "critique",
    "criticize",
    "criticise",
    "bias",
    "biased",
    "shortcoming",
    "shortcomings",
    "valid",
    "validity",
    "problems with",
    "how reliable",
    "trustworthy",
    "convincing",
    "limitation",
    "limitations",
];

const SYNTHESIS_MARKERS: &[&str] = &[
    "literature",
    "consensus",
    "overall",
    "across studies",
    "evidence for",
    "evidence on",
    "state of the art",
    "what is known",
    "body of research",
    "research say",
    "research says",
    "meta analysis",
];

const FACTUAL_MARKERS: &[&str] = &[
    "how many",
    "how much",
    "how large",
    "sample size",
    "which dataset",
    "what dataset",
    "which datasets",
    "when was",
    "what year",
    "who are the authors",
    "who wrote",
    "what percentage",
];

/// Phrases asking for evidence beyond the attached papers.
const EXTERNAL_MARKERS: &[&str] = &[
    "other studies",
    "other papers",
    "other work",
    "related work",
    "prior work",
    "previous work",
    "literature",
    "the field",
];

/// Section names a content question may ask about.
const SECTION_WORDS: &[&str] = &[
    "limitation",
    "limitations",
    "method",
    "methods",
    "methodology",
    "result",
    "results",
    "finding",
    "findings",
    "research question",
    "research questions",
    "contribution",
    "contributions",
    "aim",
    "aims",
    "hypothesis",
    "hypotheses",
];

/// Outcome of the heuristic pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntentAnalysis {
    pub intent: Intent,
    /// False when no heuristic fired and the type is only a default
    pub conclusive: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntentAnalyzer;

impl IntentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Classify a question. Total: every input yields exactly one type.
    pub fn analyze(&self, question: &str) -> IntentAnalysis {
        let words = text::words(question);
        if !words.iter().any(|w| w.chars().any(char::is_alphabetic)) {
            return IntentAnalysis {
                intent: Intent::off_topic(),
                conclusive: true,
            };
        }

        let n = text::normalised(question);
        let any = |markers: &[&str]| markers.iter().any(|m| text::has_phrase(&n, m));

        let deixis = any(PAPER_DEIXIS);
        let paper_nouns = any(PAPER_NOUNS);
        let research = any(RESEARCH_VOCAB);

        if !deixis && !paper_nouns && !research && any(OFF_TOPIC_PATTERNS) {
            return IntentAnalysis {
                intent: Intent::off_topic(),
                conclusive: true,
            };
        }

        // Nothing ties the question to research: general knowledge unless a
        // classifier says otherwise
        let research_shaped = deixis
            || paper_nouns
            || research
            || any(SYNTHESIS_MARKERS)
            || any(EXTERNAL_MARKERS);
        if !research_shaped {
            return IntentAnalysis {
                intent: Intent::off_topic(),
                conclusive: false,
            };
        }

        let comparison = any(COMPARISON_MARKERS);
        let content_question = is_section_content_question(&n);
        let question_type = if comparison {
            QuestionType::Comparison
        } else if content_question {
            QuestionType::Understanding
        } else if any(CRITIQUE_MARKERS) {
            QuestionType::Critique
        } else if any(SYNTHESIS_MARKERS) {
            QuestionType::Synthesis
        } else if any(FACTUAL_MARKERS) {
            QuestionType::FactualLookup
        } else {
            // "explain", "summarize" and unmarked research questions alike
            QuestionType::Understanding
        };

        let synthesis = question_type == QuestionType::Synthesis;
        let requires_paper_context = deixis || (paper_nouns && !synthesis);
        let requires_external_evidence =
            synthesis || any(EXTERNAL_MARKERS) || !requires_paper_context;

        IntentAnalysis {
            intent: Intent {
                question_type,
                requires_external_evidence,
                requires_paper_context,
            },
            conclusive: true,
        }
    }
}

/// "What are the limitations of ...", "What were the main findings ...".
fn is_section_content_question(normalised: &str) -> bool {
    const OPENERS: &[&str] = &[
        " what are the ",
        " what were the ",
        " what is the ",
        " what was the ",
        " list the ",
        " summarize the ",
        " summarise the ",
        " describe the ",
    ];
    OPENERS.iter().any(|opener| {
        normalised.strip_prefix(opener.trim_end()).is_some_and(|rest| {
            let rest = rest.strip_prefix(" main").unwrap_or(rest);
            let rest = rest.strip_prefix(" key").unwrap_or(rest);
            SECTION_WORDS
                .iter()
                .any(|s| rest.starts_with(&format!(" {} ", s)))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(q: &str) -> IntentAnalysis {
        IntentAnalyzer::new().analyze(q)
    }

    #[test]
    fn empty_and_symbolic_input_is_off_topic() {
        for q in ["", "   ", "?!?", "12345"] {
            let analysis = analyze(q);
            assert_eq!(analysis.intent, Intent::off_topic(), "input {:?}", q);
            assert!(!analysis.intent.requires_paper_context);
        }
    }

    #[test]
    fn general_knowledge_is_off_topic() {
        let analysis = analyze("What is the capital of France?");
        assert_eq!(analysis.intent.question_type, QuestionType::OffTopic);
        assert!(analysis.conclusive);
    }

    #[test]
    fn off_topic_words_inside_paper_question_do_not_reject() {
        let analysis = analyze("Does this paper's sentiment model handle movie reviews?");
        assert_ne!(analysis.intent.question_type, QuestionType::OffTopic);
        assert!(analysis.intent.requires_paper_context);
    }

    #[test]
    fn section_content_question_is_understanding() {
        let intent = analyze("What are the limitations of this study?").intent;
        assert_eq!(intent.question_type, QuestionType::Understanding);
        assert!(intent.requires_paper_context);
        assert!(!intent.requires_external_evidence);

        let intent = analyze("What were the main findings of the paper?").intent;
        assert_eq!(intent.question_type, QuestionType::Understanding);
    }

    #[test]
    fn limitation_outside_content_question_is_critique() {
        let intent = analyze("Is the sample size a limitation of this study?").intent;
        assert_eq!(intent.question_type, QuestionType::Critique);
    }

    #[test]
    fn comparison_markers() {
        let intent = analyze("Compare method A and B").intent;
        assert_eq!(intent.question_type, QuestionType::Comparison);
        assert!(!intent.requires_paper_context);
        assert!(intent.requires_external_evidence);

        let intent = analyze("How do these papers differ in their datasets?").intent;
        assert_eq!(intent.question_type, QuestionType::Comparison);
        assert!(intent.requires_paper_context);
    }

    #[test]
    fn critique_markers() {
        let intent = analyze("Why might the authors' conclusions be biased?").intent;
        assert_eq!(intent.question_type, QuestionType::Critique);
        assert!(intent.requires_paper_context);
    }

    #[test]
    fn synthesis_needs_external_evidence() {
        let intent = analyze("What does the literature say about intermittent fasting?").intent;
        assert_eq!(intent.question_type, QuestionType::Synthesis);
        assert!(intent.requires_external_evidence);
        assert!(!intent.requires_paper_context);
    }

    #[test]
    fn factual_lookup() {
        let intent = analyze("How many participants were in this study?").intent;
        assert_eq!(intent.question_type, QuestionType::FactualLookup);
    }

    #[test]
    fn explicit_request_for_other_studies() {
        let intent = analyze("Explain this paper's method and how other studies handle it").intent;
        assert!(intent.requires_paper_context);
        assert!(intent.requires_external_evidence);
    }

    #[test]
    fn question_without_research_vocabulary_is_inconclusive_off_topic() {
        for q in [
            "Tardigrades in space",
            "How tall is Mount Everest?",
            "Who is the president of France?",
            "What is the boiling point of water?",
            "Best pizza in Naples",
            "Is it any good?",
        ] {
            let analysis = analyze(q);
            assert_eq!(analysis.intent, Intent::off_topic(), "input {:?}", q);
            assert!(!analysis.conclusive, "input {:?}", q);
        }
    }

    #[test]
    fn research_vocabulary_without_markers_is_conclusive() {
        let analysis = analyze("Methodology of the trial");
        assert!(analysis.conclusive);
        assert_eq!(analysis.intent.question_type, QuestionType::Understanding);
    }
}
