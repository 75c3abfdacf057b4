//! Tools command implementation

use crate::cli::output::{format_tools_json, format_tools_table, ToolView};
use crate::cli::ToolsArgs;
use crate::tools::{factory, Capability, ToolRegistry};

/// One row per capability, registered or not.
pub fn tool_views(registry: &ToolRegistry) -> Vec<ToolView> {
    Capability::ALL
        .iter()
        .map(|&capability| ToolView {
            capability,
            tool: registry.get(capability).map(|t| t.name().to_string()),
            critical: capability.is_critical(),
        })
        .collect()
}

/// Handle `scholar tools`
pub fn handle_tools(args: &ToolsArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = super::ask::load_config(&args.config)?;
    config.validate()?;
    let registry = factory::build_registry(&config)?;
    let views = tool_views(&registry);

    if args.json {
        Ok(format_tools_json(&views)?)
    } else {
        Ok(format_tools_table(&views))
    }
}
