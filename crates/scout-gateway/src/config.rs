use scout_core::{ScoutError, ScoutResult};
use serde::{Deserialize, Serialize};

/// What to do when a client opens a stream without a credential header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialPolicy {
    /// Accept the stream and store an empty credential; the first `search_web`
    /// call reports the missing key through the protocol.
    #[default]
    Defer,
    /// Refuse the stream with `400 Bad Request`.
    Reject,
}

/// Gateway behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub credential_policy: CredentialPolicy,
    /// Upper bound on simultaneously open channels. `None` means unbounded.
    #[serde(default)]
    pub max_channels: Option<usize>,
    /// Path advertised in the `endpoint` event and served for follow-up posts.
    #[serde(default = "default_messages_path")]
    pub messages_path: String,
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
}

fn default_messages_path() -> String {
    "/messages".to_string()
}
fn default_keep_alive_secs() -> u64 {
    15
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            credential_policy: CredentialPolicy::default(),
            max_channels: None,
            messages_path: default_messages_path(),
            keep_alive_secs: default_keep_alive_secs(),
        }
    }
}

impl GatewayConfig {
    /// Reject settings the router cannot serve.
    pub fn validate(&self) -> ScoutResult<()> {
        let path = &self.messages_path;
        if !path.starts_with('/') || path.len() < 2 {
            return Err(ScoutError::Config(format!(
                "messages_path must be an absolute path, got {path:?}"
            )));
        }
        if path.contains(|c: char| c.is_whitespace() || matches!(c, '?' | '#' | ':' | '{' | '}' | '*')) {
            return Err(ScoutError::Config(format!(
                "messages_path must be a literal path, got {path:?}"
            )));
        }
        if matches!(path.as_str(), "/sse" | "/health") {
            return Err(ScoutError::Config(format!("messages_path {path} collides with a built-in route")));
        }
        if self.keep_alive_secs == 0 {
            return Err(ScoutError::Config("keep_alive_secs must be at least 1".into()));
        }
        if self.max_channels == Some(0) {
            return Err(ScoutError::Config("max_channels must be at least 1 when set".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.credential_policy, CredentialPolicy::Defer);
        assert!(config.max_channels.is_none());
        assert_eq!(config.messages_path, "/messages");
    }

    #[test]
    fn test_deserialize_partial() {
        let config: GatewayConfig =
            serde_json::from_str(r#"{"credential_policy": "reject", "max_channels": 8}"#).unwrap();
        assert_eq!(config.credential_policy, CredentialPolicy::Reject);
        assert_eq!(config.max_channels, Some(8));
        assert_eq!(config.keep_alive_secs, 15);
    }

    #[test]
    fn test_validate() {
        assert!(GatewayConfig::default().validate().is_ok());

        for bad in ["messages", "/", "/msg?x=1", "/:id", "/sse"] {
            let config = GatewayConfig {
                messages_path: bad.into(),
                ..GatewayConfig::default()
            };
            assert!(config.validate().is_err(), "{bad} should be rejected");
        }

        let config = GatewayConfig {
            max_channels: Some(0),
            ..GatewayConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
