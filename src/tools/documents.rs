//! Access to paper text held by the external file store.
//!
//! The pipeline never stores document bytes; parsers fetch text through a
//! [`DocumentStore`] on demand and keep only what they extract.

use super::ToolError;
use crate::state::{Paper, PaperOrigin};
use async_trait::async_trait;
use reqwest::Client;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const FETCH_TIMEOUT_MS: u64 = 20_000;

#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Plain text of the paper.
    async fn fetch_text(&self, paper: &Paper) -> Result<String, ToolError>;
}

/// Reads file-origin papers below a root directory and, optionally,
/// url-origin papers over HTTP. Identifier-origin papers must be resolved by
/// retrieval first.
pub struct LocalDocumentStore {
    root: PathBuf,
    client: Option<Arc<Client>>,
}

impl LocalDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            client: None,
        }
    }

    /// Enable fetching url-origin papers.
    pub fn with_remote(mut self, client: Arc<Client>) -> Self {
        self.client = Some(client);
        self
    }

    /// Resolve a relative path below the root, refusing to escape it.
    fn resolve(&self, relative: &str) -> Result<PathBuf, ToolError> {
        let path = Path::new(relative);
        if path.is_absolute()
            || path
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(ToolError::NotFound(format!(
                "'{}' is outside the document root",
                relative
            )));
        }
        Ok(self.root.join(path))
    }

    async fn fetch_url(&self, url: &str) -> Result<String, ToolError> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| ToolError::Unsupported(format!("remote document {}", url)))?;

        let response = client
            .get(url)
            .timeout(Duration::from_millis(FETCH_TIMEOUT_MS))
            .send()
            .await
            .map_err(|e| ToolError::from_reqwest(e, FETCH_TIMEOUT_MS))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Upstream {
                status: status.as_u16(),
                message: format!("failed to fetch {}", url),
            });
        }

        response
            .text()
            .await
            .map_err(|e| ToolError::InvalidResponse(format!("Failed to read body: {}", e)))
    }
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn fetch_text(&self, paper: &Paper) -> Result<String, ToolError> {
        match &paper.origin {
            PaperOrigin::File(relative) => {
                let path = self.resolve(relative)?;
                tokio::fs::read_to_string(&path).await.map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        ToolError::NotFound(path.display().to_string())
                    } else {
                        ToolError::InvalidResponse(format!("{}: {}", path.display(), e))
                    }
                })
            }
            PaperOrigin::Url(url) => self.fetch_url(url).await,
            PaperOrigin::Identifier(id) => Err(ToolError::Unsupported(format!(
                "fetching identifier '{}' without retrieval",
                id
            ))),
        }
    }
}
