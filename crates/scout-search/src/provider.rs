use crate::error::SearchError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One organic search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

/// The external search service.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run `query` with the caller's `credential`, returning at most `num` hits
    /// in the provider's order.
    async fn search(
        &self,
        query: &str,
        credential: &str,
        num: usize,
    ) -> Result<Vec<SearchHit>, SearchError>;
}
