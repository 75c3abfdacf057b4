//! Paper retrieval against the Semantic Scholar graph API.

use super::{PaperRetriever, ToolError};
use crate::state::{Paper, PaperMetadata, PaperOrigin, Provenance};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

const SEARCH_TIMEOUT_MS: u64 = 15_000;
const SEARCH_FIELDS: &str = "title,abstract,year,citationCount,externalIds";

pub struct SemanticScholarRetriever {
    base_url: String,
    api_key: Option<String>,
    client: Arc<Client>,
}

impl SemanticScholarRetriever {
    pub fn new(base_url: String, api_key: Option<String>, client: Arc<Client>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchHit {
    paper_id: String,
    title: Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    year: Option<u16>,
    citation_count: Option<u32>,
    #[serde(default)]
    external_ids: Option<ExternalIds>,
}

#[derive(Debug, Deserialize)]
struct ExternalIds {
    #[serde(rename = "DOI")]
    doi: Option<String>,
    #[serde(rename = "ArXiv")]
    arxiv: Option<String>,
}

impl SearchHit {
    /// Prefer DOI, then arXiv, then the Semantic Scholar id.
    fn identifier(&self) -> String {
        let external = self.external_ids.as_ref();
        if let Some(doi) = external.and_then(|e| e.doi.as_ref()) {
            return format!("doi:{}", doi);
        }
        if let Some(arxiv) = external.and_then(|e| e.arxiv.as_ref()) {
            return format!("arXiv:{}", arxiv);
        }
        format!("s2:{}", self.paper_id)
    }

    fn into_paper(self) -> Paper {
        let identifier = self.identifier();
        Paper {
            id: format!("s2:{}", self.paper_id),
            origin: PaperOrigin::Identifier(identifier),
            provenance: Provenance::Retrieved,
            metadata: PaperMetadata {
                title: self.title,
                year: self.year,
                citation_count: self.citation_count,
                abstract_text: self.abstract_text.filter(|a| !a.trim().is_empty()),
            },
            parsed_sections: None,
        }
    }
}

#[async_trait]
impl PaperRetriever for SemanticScholarRetriever {
    fn name(&self) -> &str {
        "semantic-scholar"
    }

    async fn retrieve(&self, query: &str, limit: u32) -> Result<Vec<Paper>, ToolError> {
        let url = format!("{}/graph/v1/paper/search", self.base_url);
        let limit = limit.to_string();

        let mut request = self
            .client
            .get(&url)
            .query(&[
                ("query", query),
                ("limit", limit.as_str()),
                ("fields", SEARCH_FIELDS),
            ])
            .timeout(Duration::from_millis(SEARCH_TIMEOUT_MS));
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ToolError::from_reqwest(e, SEARCH_TIMEOUT_MS))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ToolError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body: SearchResponse = response.json().await.map_err(|e| {
            ToolError::InvalidResponse(format!("Failed to parse search response: {}", e))
        })?;

        let mut papers: Vec<Paper> = Vec::with_capacity(body.data.len());
        for hit in body.data {
            let paper = hit.into_paper();
            if !papers.iter().any(|p| p.id == paper.id) {
                papers.push(paper);
            }
        }

        tracing::debug!(hits = papers.len(), "Semantic Scholar search complete");
        Ok(papers)
    }
}
