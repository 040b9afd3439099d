use parking_lot::RwLock;
use scout_core::ChannelId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Process-wide mapping from channel identity to the secret supplied at connect.
///
/// An empty secret is a real entry: it means the channel connected without a
/// credential, which is different from the channel not existing at all.
/// Entries never expire on their own; the channel lifecycle removes them.
pub struct CredentialStore {
    secrets: RwLock<HashMap<ChannelId, String>>,
}

impl CredentialStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Insert or overwrite the secret for `id`.
    pub fn put(&self, id: &ChannelId, secret: impl Into<String>) {
        let secret = secret.into();
        let supplied = !secret.is_empty();
        self.secrets.write().insert(id.clone(), secret);
        debug!(channel_id = %id, supplied, "Credential stored");
    }

    /// Snapshot of the secret for `id`, or `None` if no entry exists.
    pub fn get(&self, id: &ChannelId) -> Option<String> {
        self.secrets.read().get(id).cloned()
    }

    /// Remove the entry for `id`. Returns whether an entry was present.
    pub fn remove(&self, id: &ChannelId) -> bool {
        let removed = self.secrets.write().remove(id).is_some();
        if removed {
            debug!(channel_id = %id, "Credential removed");
        }
        removed
    }

    pub fn contains(&self, id: &ChannelId) -> bool {
        self.secrets.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.secrets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.read().is_empty()
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self {
            secrets: RwLock::new(HashMap::new()),
        }
    }
}
