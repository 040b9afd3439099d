use crate::skill::{Skill, SkillDescriptor};
use scout_core::{ScoutError, ScoutResult, ToolCall, ToolContext, ToolResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Central registry for all available skills.
pub struct SkillRegistry {
    skills: HashMap<String, Arc<dyn Skill>>,
}

impl SkillRegistry {
    pub fn new() -> Self {
        Self {
            skills: HashMap::new(),
        }
    }

    pub fn register(&mut self, skill: Arc<dyn Skill>) {
        let name = skill.descriptor().name.clone();
        info!(skill = %name, "Registered skill");
        self.skills.insert(name, skill);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Skill>> {
        self.skills.get(name)
    }

    /// Descriptors sorted by name, so listings are stable.
    pub fn list_descriptors(&self) -> Vec<&SkillDescriptor> {
        let mut descriptors: Vec<&SkillDescriptor> =
            self.skills.values().map(|s| s.descriptor()).collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    /// Execute a tool call on behalf of the channel in `ctx`.
    pub async fn execute(&self, call: ToolCall, ctx: &ToolContext) -> ScoutResult<ToolResult> {
        let Some(skill) = self.get(&call.name) else {
            warn!(skill = %call.name, "Call to unknown skill");
            return Err(ScoutError::Skill(format!("Unknown tool: {}", call.name)));
        };

        skill.execute(call, ctx).await
    }

    pub fn skill_count(&self) -> usize {
        self.skills.len()
    }
}

impl Default for SkillRegistry {
    fn default() -> Self {
        Self::new()
    }
}
