use async_trait::async_trait;
use scout_core::{ScoutResult, ToolCall, ToolContext, ToolResult};
use serde::{Deserialize, Serialize};

/// Metadata describing a skill's interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDescriptor {
    pub name: String,
    pub description: String,
    pub parameters_schema: serde_json::Value,
}

/// Trait that every tool exposed to clients implements.
///
/// The caller's channel travels in `ctx`; skills never look it up from
/// ambient state.
#[async_trait]
pub trait Skill: Send + Sync {
    fn descriptor(&self) -> &SkillDescriptor;

    async fn execute(&self, call: ToolCall, ctx: &ToolContext) -> ScoutResult<ToolResult>;
}
