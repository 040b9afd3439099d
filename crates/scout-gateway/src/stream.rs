use crate::lifecycle::ChannelLifecycle;
use crate::registry::ChannelEvent;
use axum::response::sse::Event;
use futures_util::Stream;
use scout_core::ChannelId;
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::debug;

/// Tears a channel down when the stream that serves it is dropped.
///
/// axum drops the response body when the client disconnects, and the body
/// ends (and is dropped) after a server-side close, so this covers both.
pub(crate) struct TeardownGuard {
    id: ChannelId,
    lifecycle: Arc<ChannelLifecycle>,
}

impl TeardownGuard {
    pub(crate) fn new(id: ChannelId, lifecycle: Arc<ChannelLifecycle>) -> Self {
        Self { id, lifecycle }
    }
}

impl Drop for TeardownGuard {
    fn drop(&mut self) {
        debug!(channel_id = %self.id, "Channel stream dropped");
        self.lifecycle.teardown(&self.id);
    }
}

/// The event stream of one channel, served as the body of `GET /sse`.
pub struct ChannelStream {
    rx: mpsc::UnboundedReceiver<ChannelEvent>,
    guard: TeardownGuard,
}

impl ChannelStream {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<ChannelEvent>, guard: TeardownGuard) -> Self {
        Self { rx, guard }
    }

    pub fn id(&self) -> &ChannelId {
        &self.guard.id
    }

    /// Next raw event, bypassing SSE encoding.
    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        self.rx.recv().await
    }
}

impl std::fmt::Debug for ChannelStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelStream")
            .field("id", &self.guard.id)
            .finish_non_exhaustive()
    }
}

impl Stream for ChannelStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx
            .poll_recv(cx)
            .map(|event| event.map(|e| Ok(to_sse_event(e))))
    }
}

fn to_sse_event(event: ChannelEvent) -> Event {
    match event {
        ChannelEvent::Endpoint(url) => Event::default().event("endpoint").data(url),
        ChannelEvent::Message(json) => Event::default().event("message").data(json),
    }
}
