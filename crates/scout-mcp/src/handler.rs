use crate::protocol::{
    error_codes, CallToolParams, CallToolResult, InitializeParams, InitializeResult,
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, McpContent, McpToolDef, ServerInfo,
    LATEST_PROTOCOL_VERSION, SUPPORTED_PROTOCOL_VERSIONS,
};
use scout_core::{ScoutError, ToolCall, ToolContext};
use scout_skills::SkillRegistry;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Dispatches inbound MCP messages to the skill registry.
///
/// Stateless apart from the registry: the calling channel is supplied with
/// every message, so one handler serves every channel.
pub struct McpHandler {
    skills: Arc<SkillRegistry>,
    server_info: ServerInfo,
}

impl McpHandler {
    pub fn new(skills: Arc<SkillRegistry>) -> Self {
        Self::with_server_info(skills, ServerInfo::default())
    }

    pub fn with_server_info(skills: Arc<SkillRegistry>, server_info: ServerInfo) -> Self {
        Self {
            skills,
            server_info,
        }
    }

    /// Handle one message. Returns `None` for notifications.
    pub async fn handle(&self, request: JsonRpcRequest, ctx: &ToolContext) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            debug!(method = %request.method, "Notification received");
            return None;
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::new(error_codes::INVALID_REQUEST, "jsonrpc must be \"2.0\""),
            ));
        }

        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.initialize(request.params)),
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => Ok(self.list_tools()),
            "tools/call" => self.call_tool(&id, request.params, ctx).await,
            other => {
                warn!(method = %other, "Unsupported MCP method");
                Err(JsonRpcError::new(
                    error_codes::METHOD_NOT_FOUND,
                    format!("Method not found: {other}"),
                ))
            }
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    fn initialize(&self, params: Option<Value>) -> Value {
        let requested = params
            .and_then(|p| serde_json::from_value::<InitializeParams>(p).ok())
            .and_then(|p| p.protocol_version);

        let protocol_version = match requested {
            Some(v) if SUPPORTED_PROTOCOL_VERSIONS.contains(&v.as_str()) => v,
            _ => LATEST_PROTOCOL_VERSION.to_string(),
        };
        info!(protocol_version = %protocol_version, "MCP session initialized");

        let result = InitializeResult {
            protocol_version,
            capabilities: serde_json::json!({ "tools": {} }),
            server_info: self.server_info.clone(),
        };
        serde_json::to_value(result).unwrap_or_default()
    }

    fn list_tools(&self) -> Value {
        let tools: Vec<McpToolDef> = self
            .skills
            .list_descriptors()
            .into_iter()
            .map(|d| McpToolDef {
                name: d.name.clone(),
                description: d.description.clone(),
                input_schema: d.parameters_schema.clone(),
            })
            .collect();
        serde_json::json!({ "tools": tools })
    }

    async fn call_tool(
        &self,
        id: &Value,
        params: Option<Value>,
        ctx: &ToolContext,
    ) -> Result<Value, JsonRpcError> {
        let params: CallToolParams = params
            .ok_or_else(|| "missing params".to_string())
            .and_then(|p| serde_json::from_value(p).map_err(|e| e.to_string()))
            .map_err(|e| {
                JsonRpcError::new(error_codes::INVALID_PARAMS, format!("Invalid params: {e}"))
            })?;

        let call = ToolCall {
            id: match id {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
            name: params.name,
            arguments: params.arguments,
        };

        match self.skills.execute(call, ctx).await {
            Ok(result) => {
                let result = CallToolResult {
                    content: vec![McpContent::text(result.content)],
                    is_error: result.is_error,
                };
                Ok(serde_json::to_value(result).unwrap_or_default())
            }
            Err(e @ (ScoutError::Skill(_) | ScoutError::InvalidArguments(_))) => {
                Err(JsonRpcError::new(error_codes::INVALID_PARAMS, e.to_string()))
            }
            Err(e) => {
                warn!(error = %e, "Tool execution failed");
                Err(JsonRpcError::new(error_codes::INTERNAL_ERROR, "Internal error"))
            }
        }
    }
}
