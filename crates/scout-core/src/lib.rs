//! Core types and error definitions for Scout.
//!
//! This crate provides the foundational types shared across all Scout crates,
//! including error handling, channel identities, and tool call abstractions.
//!
//! # Main types
//!
//! - [`ScoutError`]: Unified error enum for all Scout subsystems.
//! - [`ScoutResult`]: Convenience alias for `Result<T, ScoutError>`.
//! - [`ChannelId`]: Opaque identity of one open event-stream channel.
//! - [`ToolContext`]: Per-invocation context carrying the caller's channel.
//! - [`ToolCall`]: A tool invocation request received from a client.
//! - [`ToolResult`]: The result returned after executing a tool call.

/// Channel identity and per-invocation context.
pub mod channel;

pub use channel::{ChannelId, ToolContext, CREDENTIAL_HEADER};

use serde::{Deserialize, Serialize};

// --- Error types ---

/// Top-level error type for Scout.
///
/// Each variant corresponds to a subsystem that can produce errors.
#[derive(Debug, thiserror::Error)]
pub enum ScoutError {
    /// An error from the channel registry or lifecycle (e.g. a duplicate identity).
    #[error("Channel error: {0}")]
    Channel(String),

    /// An error raised by a skill during invocation.
    #[error("Skill error: {0}")]
    Skill(String),

    /// Tool arguments that do not match the tool's schema.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// An error from an outbound HTTP request.
    #[error("HTTP error: {0}")]
    Http(String),
}

/// A convenience `Result` alias using [`ScoutError`].
pub type ScoutResult<T> = Result<T, ScoutError>;

// --- Tool types ---

/// A request from a connected client to invoke a specific tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier of the call (the JSON-RPC request id, stringified).
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// JSON arguments to pass to the tool.
    pub arguments: serde_json::Value,
}

/// The result returned after executing a [`ToolCall`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The ID of the [`ToolCall`] this result corresponds to.
    pub call_id: String,
    /// The textual output produced by the tool.
    pub content: String,
    /// Whether the tool execution ended in an error.
    pub is_error: bool,
}

impl ToolResult {
    /// Creates a successful tool result.
    pub fn success(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    /// Creates an error tool result.
    pub fn error(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            content: content.into(),
            is_error: true,
        }
    }
}
