//! Language-model intent classification, used when the lexical heuristics
//! cannot settle a question.

use super::generation::TextGenerator;
use super::{IntentClassifier, ToolError};
use crate::state::{GenerationSettings, Intent, QuestionType};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

const PROMPT_TEMPLATE: &str = r#"Classify the research question below.

Answer with a single JSON object and nothing else:
{"question_type": "<one of: factual-lookup, understanding, comparison, critique, synthesis, off-topic>",
 "requires_external_evidence": <true if answering needs papers beyond those the user attached>,
 "requires_paper_context": <true if the question refers to a specific paper or study>}

Question: "#;

pub struct GenerativeIntentClassifier {
    generator: Arc<dyn TextGenerator>,
}

impl GenerativeIntentClassifier {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[derive(Debug, Deserialize)]
struct IntentReply {
    question_type: String,
    #[serde(default)]
    requires_external_evidence: bool,
    #[serde(default)]
    requires_paper_context: bool,
}

/// Pull the first JSON object out of a model reply, tolerating prose and
/// code fences around it.
pub fn parse_intent_reply(reply: &str) -> Result<Intent, ToolError> {
    let start = reply.find('{');
    let end = reply.rfind('}');
    let json = match (start, end) {
        (Some(s), Some(e)) if s < e => &reply[s..=e],
        _ => {
            return Err(ToolError::InvalidResponse(
                "classifier reply contains no JSON object".to_string(),
            ))
        }
    };

    let parsed: IntentReply = serde_json::from_str(json)
        .map_err(|e| ToolError::InvalidResponse(format!("classifier reply: {}", e)))?;
    let question_type: QuestionType = parsed
        .question_type
        .parse()
        .map_err(ToolError::InvalidResponse)?;

    if question_type == QuestionType::OffTopic {
        return Ok(Intent::off_topic());
    }
    Ok(Intent {
        question_type,
        requires_external_evidence: parsed.requires_external_evidence,
        requires_paper_context: parsed.requires_paper_context,
    })
}

#[async_trait]
impl IntentClassifier for GenerativeIntentClassifier {
    fn name(&self) -> &str {
        "generative-classifier"
    }

    async fn classify(
        &self,
        question: &str,
        settings: &GenerationSettings,
    ) -> Result<Intent, ToolError> {
        let prompt = format!("{}{}", PROMPT_TEMPLATE, question.trim());
        // Classification wants a deterministic, short answer whatever the
        // conversation's own sampling settings are.
        let settings = GenerationSettings {
            temperature: 0.0,
            max_tokens: settings.max_tokens.min(200),
            ..settings.clone()
        };
        let reply = self.generator.generate(&prompt, &settings).await?;
        parse_intent_reply(&reply)
    }
}
