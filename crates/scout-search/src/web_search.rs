use crate::provider::SearchProvider;
use crate::report::format_results;
use async_trait::async_trait;
use scout_core::{ScoutError, ScoutResult, ToolCall, ToolContext, ToolResult, CREDENTIAL_HEADER};
use scout_session::CredentialStore;
use scout_skills::{Skill, SkillDescriptor};
use std::sync::Arc;
use tracing::{info, warn};

/// How many results `search_web` asks the provider for.
pub const NUM_RESULTS: usize = 3;

pub(crate) const MISSING_SESSION: &str =
    "Internal error: could not determine the session for this request.";
pub(crate) const SEARCH_FAILED: &str =
    "Search failed: the search provider could not complete the request. Please try again later.";

fn missing_credential() -> String {
    format!(
        "Configuration error: no search API key was supplied for this connection. \
         Set the '{CREDENTIAL_HEADER}' header when opening the event stream."
    )
}

/// The `search_web` tool.
///
/// Looks up the credential of the calling channel, forwards the query to the
/// search provider and renders the hits as text. Every outcome, including
/// missing session, missing credential and provider failure, comes back as a
/// [`ToolResult`]; only malformed arguments are reported as an error.
pub struct WebSearchSkill {
    descriptor: SkillDescriptor,
    provider: Arc<dyn SearchProvider>,
    credentials: Arc<CredentialStore>,
}

impl WebSearchSkill {
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        credentials: Arc<CredentialStore>,
    ) -> Self {
        Self {
            descriptor: SkillDescriptor {
                name: "search_web".to_string(),
                description: "Search the web and return the top results with title, link and snippet."
                    .to_string(),
                parameters_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "The search query"
                        }
                    },
                    "required": ["query"]
                }),
            },
            provider,
            credentials,
        }
    }
}

#[async_trait]
impl Skill for WebSearchSkill {
    fn descriptor(&self) -> &SkillDescriptor {
        &self.descriptor
    }

    async fn execute(&self, call: ToolCall, ctx: &ToolContext) -> ScoutResult<ToolResult> {
        let query = match call.arguments.get("query").and_then(|v| v.as_str()) {
            Some(q) if !q.trim().is_empty() => q.to_string(),
            _ => {
                return Err(ScoutError::InvalidArguments(
                    "'query' must be a non-empty string".to_string(),
                ))
            }
        };

        let Some(channel_id) = ctx.channel_id.as_ref() else {
            warn!(call_id = %call.id, "search_web called without a channel");
            return Ok(ToolResult::error(&call.id, MISSING_SESSION));
        };

        // Read once: a teardown while the provider call is in flight must not
        // change which credential that call uses.
        let Some(credential) = self.credentials.get(channel_id) else {
            warn!(channel_id = %channel_id, "search_web called for a channel with no session");
            return Ok(ToolResult::error(&call.id, MISSING_SESSION));
        };

        if credential.is_empty() {
            warn!(channel_id = %channel_id, "search_web called without a credential");
            return Ok(ToolResult::error(&call.id, missing_credential()));
        }

        info!(channel_id = %channel_id, query_len = query.len(), "Searching the web");

        match self
            .provider
            .search(&query, &credential, NUM_RESULTS)
            .await
        {
            Ok(hits) => {
                info!(channel_id = %channel_id, hits = hits.len(), "Search completed");
                Ok(ToolResult::success(&call.id, format_results(&query, &hits)))
            }
            Err(e) => {
                warn!(channel_id = %channel_id, error = %e, "Search provider call failed");
                Ok(ToolResult::error(&call.id, SEARCH_FAILED))
            }
        }
    }
}
