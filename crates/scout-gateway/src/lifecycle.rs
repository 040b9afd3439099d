use crate::config::{CredentialPolicy, GatewayConfig};
use crate::registry::{ChannelEvent, ChannelHandle, ChannelRegistry};
use crate::stream::{ChannelStream, TeardownGuard};
use chrono::Utc;
use scout_core::{ChannelId, ScoutError, CREDENTIAL_HEADER};
use scout_session::CredentialStore;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Why a stream could not be opened.
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("Missing required header: {0}")]
    MissingCredential(&'static str),

    #[error("Channel limit of {0} reached")]
    AtCapacity(usize),

    #[error(transparent)]
    Registry(#[from] ScoutError),
}

/// Creates channels on connect and tears them down on close.
///
/// A channel's registry entry and credential entry are created together in
/// [`connect`](Self::connect) and removed together in
/// [`teardown`](Self::teardown), so the credential store never holds a secret
/// for a channel that is not open.
pub struct ChannelLifecycle {
    registry: Arc<ChannelRegistry>,
    credentials: Arc<CredentialStore>,
    config: GatewayConfig,
}

impl ChannelLifecycle {
    pub fn new(
        registry: Arc<ChannelRegistry>,
        credentials: Arc<CredentialStore>,
        config: GatewayConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry,
            credentials,
            config,
        })
    }

    pub fn registry(&self) -> &Arc<ChannelRegistry> {
        &self.registry
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Open a channel for a client that supplied `secret` (if any).
    ///
    /// The returned stream starts with the `endpoint` handshake event and tears
    /// the channel down when dropped.
    pub fn connect(self: &Arc<Self>, secret: Option<String>) -> Result<ChannelStream, ConnectError> {
        let supplied = secret.is_some();
        let secret = match (secret, self.config.credential_policy) {
            (Some(secret), _) => secret,
            (None, CredentialPolicy::Defer) => String::new(),
            (None, CredentialPolicy::Reject) => {
                warn!("Rejected stream: missing {CREDENTIAL_HEADER} header");
                return Err(ConnectError::MissingCredential(CREDENTIAL_HEADER));
            }
        };

        let id = ChannelId::mint();
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = Arc::new(ChannelHandle::new(id.clone(), tx));

        // The id is fresh, so rolling back only ever removes this entry.
        self.credentials.put(&id, secret);
        let max = self.config.max_channels;
        match self.registry.register_bounded(Arc::clone(&handle), max) {
            Ok(true) => {}
            Ok(false) => {
                self.credentials.remove(&id);
                let max = max.unwrap_or_default();
                warn!(max_channels = max, "Rejected stream: channel limit reached");
                return Err(ConnectError::AtCapacity(max));
            }
            Err(e) => {
                self.credentials.remove(&id);
                return Err(e.into());
            }
        }
        handle.mark_open();

        // Cannot fail: the receiver is still in hand.
        let endpoint = format!("{}?sessionId={}", self.config.messages_path, id);
        let _ = handle.send(ChannelEvent::Endpoint(endpoint));

        info!(
            channel_id = %id,
            credential_supplied = supplied,
            open_channels = self.registry.len(),
            "Channel opened"
        );

        Ok(ChannelStream::new(
            rx,
            TeardownGuard::new(id, Arc::clone(self)),
        ))
    }

    /// Remove the channel's registry and credential entries.
    ///
    /// Returns false if the channel was already closed, so duplicate close
    /// notifications are harmless.
    pub fn teardown(&self, id: &ChannelId) -> bool {
        let Some(handle) = self.registry.remove(id) else {
            return false;
        };
        self.credentials.remove(id);

        let lifetime = Utc::now() - handle.opened_at();
        info!(
            channel_id = %id,
            lifetime_secs = lifetime.num_seconds(),
            open_channels = self.registry.len(),
            "Channel closed"
        );
        true
    }

    /// Server-initiated close. The client's stream ends once queued events drain.
    pub fn close(&self, id: &ChannelId) -> bool {
        self.teardown(id)
    }

    /// Close every open channel. Returns how many were closed.
    pub fn close_all(&self) -> usize {
        let closed = self
            .registry
            .ids()
            .iter()
            .filter(|id| self.teardown(id))
            .count();
        if closed > 0 {
            info!(closed, "Closed all channels");
        }
        closed
    }

    pub fn open_channels(&self) -> usize {
        self.registry.len()
    }
}
