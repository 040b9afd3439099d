use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Connection header through which a client supplies its search API key.
///
/// Header names are case-insensitive; this is the canonical lowercase form.
pub const CREDENTIAL_HEADER: &str = "x-serper-api-key";

/// Opaque identity of one event-stream channel.
///
/// Minted from a random v4 UUID when the channel connects. Follow-up requests
/// carry it back as a claimed identity, which is why it can also be built from
/// an arbitrary string: the registry, not this type, decides whether a claimed
/// identity refers to a live channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    /// Mint a fresh, unguessable identity.
    pub fn mint() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an identity claimed by a client. Returns `None` for blank input.
    pub fn parse(claimed: &str) -> Option<Self> {
        let trimmed = claimed.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Context passed explicitly to every tool invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// The channel the invocation was routed from, if it could be determined.
    pub channel_id: Option<ChannelId>,
}

impl ToolContext {
    /// Context for an invocation routed from `channel_id`.
    pub fn for_channel(channel_id: ChannelId) -> Self {
        Self {
            channel_id: Some(channel_id),
        }
    }
}
