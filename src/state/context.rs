//! Conversation context handed in by the surrounding system.

use super::types::PaperReference;
use serde::{Deserialize, Serialize};

/// Model-invocation settings of the dialog.
///
/// Opaque to the pipeline; forwarded verbatim to text-generation tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    pub max_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            temperature: 0.7,
            top_p: 0.9,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
            max_tokens: 2000,
        }
    }
}

/// Everything the caller knows about the conversation a question belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationContext {
    pub papers: Vec<PaperReference>,
    /// Overrides the configured generation defaults when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationSettings>,
}

impl ConversationContext {
    pub fn with_papers(papers: Vec<PaperReference>) -> Self {
        Self {
            papers,
            generation: None,
        }
    }
}
