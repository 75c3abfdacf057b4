//! Ask command implementation

use crate::cli::{output, AskArgs};
use crate::config::{LogFormat, LoggingConfig, ScholarConfig};
use crate::pipeline::ResearchPipeline;
use crate::state::ConversationContext;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Load a config file if present, then env overrides.
pub fn load_config(path: &Path) -> Result<ScholarConfig, Box<dyn std::error::Error>> {
    let config = if path.exists() {
        ScholarConfig::load(Some(path))?
    } else {
        tracing::debug!("Config file not found, using defaults");
        ScholarConfig::default()
    };
    Ok(config.with_env_overrides())
}

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(
    args: &AskArgs,
) -> Result<ScholarConfig, Box<dyn std::error::Error>> {
    let mut config = load_config(&args.config)?;

    // CLI flags win over file and environment
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }
    if args.retrieval {
        config.retrieval.enabled = true;
    }
    if args.no_scope_guard {
        config.scope_guard.enabled = false;
    }

    config.validate()?;
    Ok(config)
}

/// Initialize tracing based on configuration
///
/// Logs go to stderr so `--json` output stays machine-readable.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter_str = crate::logging::build_filter_directives(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    if config.enable_content_logging {
        eprintln!("WARNING: Content logging is enabled. Question text will be logged.");
        eprintln!("         Questions may describe unpublished work. Use only for debugging.");
    }

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        }
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        }
    }

    Ok(())
}

/// Handle `scholar ask`
pub async fn run_ask(args: AskArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config_with_overrides(&args)?;
    init_tracing(&config.logging)?;

    let pipeline = ResearchPipeline::from_config(&config)?;
    let context = ConversationContext::with_papers(args.papers.clone());

    tracing::debug!(
        papers = context.papers.len(),
        tools = pipeline.registry().len(),
        "Pipeline ready"
    );

    let response = pipeline.process(&args.question, &context).await?;

    if args.json {
        println!("{}", output::format_response_json(&response)?);
    } else {
        println!("{}", output::format_response_text(&response));
    }

    Ok(())
}
