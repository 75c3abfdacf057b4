//! Tool executor configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Per-invocation timeout for retrieval, parsing and assessment
    pub invocation_timeout_ms: u64,
    /// Per-invocation timeout for classification and scope-guard tools
    pub critical_timeout_ms: u64,
    /// Maximum invocations in flight within one tier
    pub max_concurrency: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            invocation_timeout_ms: 30_000,
            critical_timeout_ms: 10_000,
            max_concurrency: 8,
        }
    }
}

impl ExecutorConfig {
    pub fn invocation_timeout(&self) -> Duration {
        Duration::from_millis(self.invocation_timeout_ms)
    }

    pub fn critical_timeout(&self) -> Duration {
        Duration::from_millis(self.critical_timeout_ms)
    }
}
