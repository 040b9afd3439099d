use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use scout_core::{ChannelId, ScoutError, ScoutResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

/// Lifecycle state of a channel. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
}

/// An event queued for delivery on a channel's stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// Handshake: the URL the client must post follow-up messages to.
    Endpoint(String),
    /// A serialized JSON-RPC message.
    Message(String),
}

/// One open outbound stream to a client.
///
/// The handle owns the only sender feeding the stream, so closing the handle
/// ends the stream even while in-flight tasks still hold clones of the `Arc`.
#[derive(Debug)]
pub struct ChannelHandle {
    id: ChannelId,
    opened_at: DateTime<Utc>,
    state: watch::Sender<ChannelState>,
    tx: Mutex<Option<mpsc::UnboundedSender<ChannelEvent>>>,
}

impl ChannelHandle {
    pub fn new(id: ChannelId, tx: mpsc::UnboundedSender<ChannelEvent>) -> Self {
        let (state, _) = watch::channel(ChannelState::Connecting);
        Self {
            id,
            opened_at: Utc::now(),
            state,
            tx: Mutex::new(Some(tx)),
        }
    }

    pub fn id(&self) -> &ChannelId {
        &self.id
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    pub fn is_open(&self) -> bool {
        self.state() == ChannelState::Open
    }

    /// Connecting → Open. Returns false if the channel was not connecting.
    pub fn mark_open(&self) -> bool {
        self.state.send_if_modified(|s| {
            if *s == ChannelState::Connecting {
                *s = ChannelState::Open;
                true
            } else {
                false
            }
        })
    }

    /// Move to `Closed` and drop the stream's sender.
    ///
    /// Returns false if the channel was already closed.
    pub fn close(&self) -> bool {
        let transitioned = self.state.send_if_modified(|s| {
            if *s == ChannelState::Closed {
                false
            } else {
                *s = ChannelState::Closed;
                true
            }
        });
        self.tx.lock().take();
        transitioned
    }

    /// Queue an event on the stream.
    ///
    /// Fails once the channel is closed or the client has gone away.
    pub fn send(&self, event: ChannelEvent) -> ScoutResult<()> {
        let guard = self.tx.lock();
        let Some(tx) = guard.as_ref() else {
            return Err(ScoutError::Channel(format!("channel {} is closed", self.id)));
        };
        tx.send(event)
            .map_err(|_| ScoutError::Channel(format!("channel {} stream is gone", self.id)))
    }

    /// Queue a JSON-RPC payload for the client.
    pub fn deliver(&self, payload: String) -> ScoutResult<()> {
        self.send(ChannelEvent::Message(payload))
    }

    /// Resolves once the channel reaches `Closed`.
    pub async fn closed(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|s| *s == ChannelState::Closed).await;
    }
}

/// Process-wide map of open channels.
pub struct ChannelRegistry {
    channels: RwLock<HashMap<ChannelId, Arc<ChannelHandle>>>,
}

impl ChannelRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a handle under its identity.
    ///
    /// Identities are minted unique, so a duplicate is an invariant violation.
    pub fn register(&self, handle: Arc<ChannelHandle>) -> ScoutResult<()> {
        self.register_bounded(handle, None).map(|_| ())
    }

    /// Register a handle unless `max` channels are already open.
    ///
    /// The count check and the insert happen under one write lock. Returns
    /// `Ok(false)` when the registry is full.
    pub fn register_bounded(&self, handle: Arc<ChannelHandle>, max: Option<usize>) -> ScoutResult<bool> {
        let id = handle.id().clone();
        let mut channels = self.channels.write();
        if channels.contains_key(&id) {
            return Err(ScoutError::Channel(format!("channel {id} is already registered")));
        }
        if max.is_some_and(|max| channels.len() >= max) {
            return Ok(false);
        }
        channels.insert(id.clone(), handle);
        drop(channels);
        info!(channel_id = %id, "Channel registered");
        Ok(true)
    }

    pub fn lookup(&self, id: &ChannelId) -> Option<Arc<ChannelHandle>> {
        self.channels.read().get(id).cloned()
    }

    pub fn contains(&self, id: &ChannelId) -> bool {
        self.channels.read().contains_key(id)
    }

    /// Remove and close the handle for `id`. Idempotent.
    pub fn remove(&self, id: &ChannelId) -> Option<Arc<ChannelHandle>> {
        let removed = self.channels.write().remove(id);
        match &removed {
            Some(handle) => {
                handle.close();
                info!(channel_id = %id, "Channel removed");
            }
            None => debug!(channel_id = %id, "Channel already removed"),
        }
        removed
    }

    pub fn ids(&self) -> Vec<ChannelId> {
        self.channels.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.channels.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.read().is_empty()
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn handle() -> (Arc<ChannelHandle>, mpsc::UnboundedReceiver<ChannelEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(ChannelHandle::new(ChannelId::mint(), tx)), rx)
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = ChannelRegistry::new();
        let (h, _rx) = handle();
        let id = h.id().clone();
        registry.register(h).unwrap();
        assert!(registry.lookup(&id).is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_register_fails() {
        let registry = ChannelRegistry::new();
        let (h, _rx) = handle();
        registry.register(h.clone()).unwrap();
        let err = registry.register(h).unwrap_err();
        assert!(err.to_string().contains("already registered"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_is_idempotent_and_closes() {
        let registry = ChannelRegistry::new();
        let (h, _rx) = handle();
        h.mark_open();
        let id = h.id().clone();
        registry.register(h.clone()).unwrap();

        assert!(registry.remove(&id).is_some());
        assert!(registry.remove(&id).is_none());
        assert_eq!(h.state(), ChannelState::Closed);
        assert!(registry.lookup(&id).is_none());
    }

    #[test]
    fn test_state_transitions() {
        let (h, _rx) = handle();
        assert_eq!(h.state(), ChannelState::Connecting);
        assert!(h.mark_open());
        assert!(!h.mark_open());
        assert!(h.is_open());
        assert!(h.close());
        assert!(!h.close());
        assert!(!h.mark_open());
        assert_eq!(h.state(), ChannelState::Closed);
    }

    #[tokio::test]
    async fn test_send_after_close_fails_and_ends_stream() {
        let (h, mut rx) = handle();
        h.mark_open();
        h.deliver("{}".to_string()).unwrap();
        assert_eq!(rx.recv().await, Some(ChannelEvent::Message("{}".into())));

        h.close();
        assert!(h.deliver("{}".to_string()).is_err());
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_send_to_dropped_receiver_fails() {
        let (h, rx) = handle();
        drop(rx);
        assert!(h.deliver("{}".to_string()).is_err());
    }

    #[tokio::test]
    async fn test_closed_notification() {
        let (h, _rx) = handle();
        h.mark_open();
        let waiter = {
            let h = h.clone();
            tokio::spawn(async move { h.closed().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        h.close();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[test]
    fn test_remove_leaves_other_channels() {
        let registry = ChannelRegistry::new();
        let (a, _ra) = handle();
        let (b, _rb) = handle();
        let (a_id, b_id) = (a.id().clone(), b.id().clone());
        registry.register(a).unwrap();
        registry.register(b).unwrap();

        registry.remove(&a_id);
        let b = registry.lookup(&b_id).unwrap();
        assert_eq!(b.state(), ChannelState::Connecting);
        assert_eq!(registry.ids(), vec![b_id]);
    }

    #[test]
    fn test_register_bounded_stops_at_limit() {
        let registry = ChannelRegistry::new();
        let (a, _ra) = handle();
        let (b, _rb) = handle();
        let b_id = b.id().clone();
        assert!(registry.register_bounded(a, Some(1)).unwrap());
        assert!(!registry.register_bounded(b, Some(1)).unwrap());
        assert!(!registry.contains(&b_id));
        assert_eq!(registry.len(), 1);
    }
}
