//! Structured logging helpers for pipeline requests
//!
//! Request ID generation, privacy-safe previews of question content, and
//! filter directives built from [`LoggingConfig`](crate::config::LoggingConfig).

pub mod fields;
pub mod request_id;

pub use fields::{outcome_label, truncate_question};
pub use request_id::generate_request_id;

/// Build filter directives string from LoggingConfig
///
/// Constructs a tracing filter string that includes the base log level
/// and any component-specific log levels configured in the LoggingConfig.
///
/// # Returns
///
/// A filter string in the format: "base_level,scholar::component1=level1,scholar::component2=level2"
///
/// # Examples
///
/// ```
/// use scholar::config::{LogFormat, LoggingConfig};
/// use scholar::logging::build_filter_directives;
/// use std::collections::HashMap;
///
/// let mut component_levels = HashMap::new();
/// component_levels.insert("pipeline".to_string(), "debug".to_string());
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     format: LogFormat::Pretty,
///     component_levels: Some(component_levels),
///     enable_content_logging: false,
/// };
///
/// let filter_str = build_filter_directives(&config);
/// assert_eq!(filter_str, "info,scholar::pipeline=debug");
/// ```
pub fn build_filter_directives(config: &crate::config::LoggingConfig) -> String {
    let mut filter_str = config.level.clone();

    if let Some(component_levels) = &config.component_levels {
        let mut components: Vec<_> = component_levels.iter().collect();
        components.sort();
        for (component, level) in components {
            filter_str.push_str(&format!(",scholar::{}={}", component, level));
        }
    }

    filter_str
}
