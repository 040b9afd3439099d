use crate::error::SearchError;
use crate::provider::{SearchHit, SearchProvider};
use async_trait::async_trait;
use scout_core::{ScoutError, ScoutResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const MAX_ERROR_BODY: usize = 2048;

/// Settings for the Serper HTTP client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerperConfig {
    /// Base URL of the API; `/search` is appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout. The only timeout applied to a search call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://google.serper.dev".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for SerperConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
    num: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic: Vec<SearchHit>,
}

/// [`SearchProvider`] backed by the Serper `POST /search` endpoint.
pub struct SerperClient {
    endpoint: String,
    http: reqwest::Client,
}

impl SerperClient {
    pub fn new(config: &SerperConfig) -> ScoutResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ScoutError::Http(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            endpoint: format!("{}/search", config.base_url.trim_end_matches('/')),
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SearchProvider for SerperClient {
    async fn search(
        &self,
        query: &str,
        credential: &str,
        num: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .header("X-API-KEY", credential)
            .json(&SearchRequest { q: query, num })
            .send()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let mut body = resp
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SearchResponse = resp
            .json()
            .await
            .map_err(|e| SearchError::Decode(e.to_string()))?;

        debug!(hits = parsed.organic.len(), "Search provider responded");

        let mut hits = parsed.organic;
        hits.truncate(num);
        Ok(hits)
    }
}
