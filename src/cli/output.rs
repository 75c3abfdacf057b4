//! Output formatting helpers for CLI commands

use crate::state::{Confidence, Response};
use crate::tools::Capability;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;

/// View model for tool display
#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolView {
    pub capability: Capability,
    /// Registered implementation, if any
    pub tool: Option<String>,
    pub critical: bool,
}

/// Format tools as a table
pub fn format_tools_table(tools: &[ToolView]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Capability", "Tool", "Critical"]);

    for t in tools {
        let tool = match &t.tool {
            Some(name) => name.green().to_string(),
            None => "not registered".dimmed().to_string(),
        };
        table.add_row(vec![
            Cell::new(t.capability.as_str()),
            Cell::new(tool),
            Cell::new(if t.critical { "yes" } else { "no" }),
        ]);
    }

    table.to_string()
}

/// Format tools as JSON
pub fn format_tools_json(tools: &[ToolView]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({ "tools": tools }))
}

pub fn format_response_json(response: &Response) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(response)
}

/// Human-readable answer: message, confidence, sources, caveats, trace.
pub fn format_response_text(response: &Response) -> String {
    let mut out = String::new();
    out.push_str(&response.message);
    out.push_str("\n\n");
    out.push_str(&format!(
        "{} {}\n",
        "Confidence:".bold(),
        confidence_label(response.confidence)
    ));

    if !response.sources.is_empty() {
        let sources: Vec<&str> = response.sources.iter().map(String::as_str).collect();
        out.push_str(&format!("{} {}\n", "Sources:".bold(), sources.join(", ")));
    }

    if !response.uncertainties.is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Uncertainty", "Detail"]);
        for u in &response.uncertainties {
            table.add_row(vec![Cell::new(u.reason.to_string()), Cell::new(&u.detail)]);
        }
        out.push('\n');
        out.push_str(&table.to_string());
        out.push('\n');
    }

    out.push('\n');
    out.push_str(&"Reasoning:".bold().to_string());
    out.push('\n');
    for (i, step) in response.reasoning.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, step));
    }

    out.trim_end().to_string()
}

fn confidence_label(confidence: Confidence) -> String {
    let label = confidence.to_string();
    match confidence {
        Confidence::High => label.green().to_string(),
        Confidence::Medium => label.yellow().to_string(),
        Confidence::Low => label.red().to_string(),
        Confidence::None => label.dimmed().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Uncertainty, UncertaintyReason};
    use std::collections::BTreeSet;

    fn response() -> Response {
        Response {
            message: "According to [p1] (high reliability), the effect was small.".to_string(),
            reasoning: vec![
                "INTAKE: question received with 1 attached paper(s)".to_string(),
                "DONE: confidence medium".to_string(),
            ],
            confidence: Confidence::Medium,
            sources: BTreeSet::from(["p1".to_string()]),
            uncertainties: vec![Uncertainty::new(
                UncertaintyReason::SparseEvidence,
                "only one source",
            )],
        }
    }

    #[test]
    fn test_format_tools_table_empty() {
        let output = format_tools_table(&[]);
        assert!(output.contains("Capability"));
    }

    #[test]
    fn test_format_tools_table_with_data() {
        let output = format_tools_table(&[ToolView {
            capability: Capability::Parse,
            tool: Some("section-parser".to_string()),
            critical: false,
        }]);
        assert!(output.contains("parse"));
        assert!(output.contains("section-parser"));
    }

    #[test]
    fn test_format_tools_json_valid() {
        let output = format_tools_json(&[ToolView {
            capability: Capability::ValidateScope,
            tool: None,
            critical: true,
        }])
        .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["tools"][0]["capability"], "validate-scope");
        assert!(parsed["tools"][0]["tool"].is_null());
    }

    #[test]
    fn test_format_response_text_sections() {
        let output = format_response_text(&response());
        assert!(output.contains("the effect was small"));
        assert!(output.contains("p1"));
        assert!(output.contains("only one source"));
        assert!(output.contains("2. DONE: confidence medium"));
    }

    #[test]
    fn test_format_response_json_roundtrips() {
        let output = format_response_json(&response()).unwrap();
        let parsed: Response = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, response());
    }
}
