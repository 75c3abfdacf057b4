//! CLI module for Scholar
//!
//! Command-line interface definitions and handlers for the research pipeline.
//!
//! # Commands
//!
//! - `ask` - Answer a research question from attached or retrieved papers
//! - `tools` - List the registered tool capabilities
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Ask about a local paper
//! scholar ask "What are the limitations of this study?" --paper file:trial.txt
//!
//! # Let retrieval find papers, print JSON
//! scholar ask "Does exercise improve sleep quality?" --retrieval --json
//!
//! # Generate shell completions
//! scholar completions bash > ~/.bash_completion.d/scholar
//! ```

pub mod ask;
pub mod completions;
pub mod config;
pub mod output;
pub mod tools;

pub use completions::handle_completions;
pub use config::handle_config_init;

use crate::state::{PaperReference, SourceType};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Scholar - evidence-grounded answers to research questions
#[derive(Parser, Debug)]
#[command(
    name = "scholar",
    version,
    about = "Answer research questions from the evidence in scientific papers"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer a research question
    Ask(AskArgs),
    /// List registered tools
    Tools(ToolsArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct AskArgs {
    /// The research question
    pub question: String,

    /// Attach a paper: file:<path>, id:<identifier> or url:<url> (repeatable)
    #[arg(short, long = "paper", value_parser = parse_paper_ref)]
    pub papers: Vec<PaperReference>,

    /// Path to configuration file
    #[arg(short, long, default_value = "scholar.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SCHOLAR_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Enable paper retrieval
    #[arg(long)]
    pub retrieval: bool,

    /// Disable the scope guard tool
    #[arg(long)]
    pub no_scope_guard: bool,
}

#[derive(Args, Debug)]
pub struct ToolsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    #[arg(short, long, default_value = "scholar.toml")]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "scholar.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

/// Parse `<type>:<value>` into a paper reference.
///
/// File papers are identified by their file stem, everything else by the
/// value itself.
pub fn parse_paper_ref(raw: &str) -> Result<PaperReference, String> {
    let (kind, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected <type>:<value>, got '{}'", raw))?;
    let source_type: SourceType = kind.parse()?;
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("empty paper reference '{}'", raw));
    }

    let id = match source_type {
        SourceType::File => Path::new(value)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| value.to_string()),
        SourceType::Identifier | SourceType::Url => value.to_string(),
    };
    Ok(PaperReference::new(id, source_type, value))
}
