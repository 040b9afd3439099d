use crate::registry::{ChannelHandle, ChannelRegistry};
use scout_core::{ChannelId, ToolContext};
use scout_mcp::{JsonRpcRequest, McpHandler};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Why a follow-up post could not be routed to a channel.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unroutable {
    #[error("malformed request")]
    Malformed,
    #[error("no active channel")]
    NoActiveChannel,
}

/// Routes follow-up messages to the channel named by their `sessionId`.
pub struct RequestCorrelator {
    registry: Arc<ChannelRegistry>,
    handler: Arc<McpHandler>,
}

impl RequestCorrelator {
    pub fn new(registry: Arc<ChannelRegistry>, handler: Arc<McpHandler>) -> Self {
        Self { registry, handler }
    }

    /// Resolve the raw `sessionId` query value to an open channel.
    pub fn resolve(&self, session_id: Option<&str>) -> Result<Arc<ChannelHandle>, Unroutable> {
        let id = session_id
            .and_then(ChannelId::parse)
            .ok_or(Unroutable::Malformed)?;
        match self.registry.lookup(&id) {
            Some(handle) if handle.is_open() => Ok(handle),
            _ => {
                debug!(channel_id = %id, "No active channel for session id");
                Err(Unroutable::NoActiveChannel)
            }
        }
    }

    /// Handle `request` in the background and deliver the response on `handle`.
    ///
    /// The tool sees the channel's identity, never the credential itself.
    pub fn dispatch(&self, handle: Arc<ChannelHandle>, request: JsonRpcRequest) -> JoinHandle<()> {
        let handler = Arc::clone(&self.handler);
        tokio::spawn(async move {
            let ctx = ToolContext::for_channel(handle.id().clone());
            let method = request.method.clone();
            let Some(response) = handler.handle(request, &ctx).await else {
                return;
            };

            let payload = match serde_json::to_string(&response) {
                Ok(p) => p,
                Err(e) => {
                    error!(error = %e, method = %method, "Failed to serialize response");
                    return;
                }
            };

            if let Err(e) = handle.deliver(payload) {
                warn!(
                    channel_id = %handle.id(),
                    method = %method,
                    error = %e,
                    "Response undeliverable, channel closed"
                );
            }
        })
    }
}
