//! Evidence synthesis tuning.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Jaccard similarity above which two claims address the same topic
    pub topic_similarity: f64,
    /// Jaccard similarity above which two claims assert the same thing
    pub corroboration_similarity: f64,
    /// Cap on claims extracted from one section of one paper
    pub max_claims_per_section: usize,
    /// Sentences shorter than this are not treated as claims
    pub min_claim_words: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            topic_similarity: 0.3,
            corroboration_similarity: 0.6,
            max_claims_per_section: 12,
            min_claim_words: 4,
        }
    }
}
