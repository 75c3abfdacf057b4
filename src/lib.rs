//! Scholar - evidence-grounded answers to research questions
//!
//! This library provides the reasoning pipeline that classifies a research
//! question, decides whether it may be answered, gathers evidence from papers
//! through pluggable tools, and composes a response that only asserts what the
//! evidence supports.
//!
//! ```no_run
//! use scholar::config::ScholarConfig;
//! use scholar::pipeline::ResearchPipeline;
//! use scholar::state::{ConversationContext, PaperReference, SourceType};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = ResearchPipeline::from_config(&ScholarConfig::default())?;
//! let context = ConversationContext::with_papers(vec![PaperReference::new(
//!     "trial",
//!     SourceType::File,
//!     "papers/trial.txt",
//! )]);
//! let response = pipeline
//!     .process("What are the limitations of this study?", &context)
//!     .await?;
//! println!("{} ({})", response.message, response.confidence);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod logging;
pub mod pipeline;
pub mod state;
pub mod text;
pub mod tools;
