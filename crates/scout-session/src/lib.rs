//! Per-channel session state for Scout.
//!
//! The only state a channel carries beyond its stream is the search-provider
//! credential the client supplied when it connected. [`CredentialStore`] keeps
//! that secret keyed by [`ChannelId`](scout_core::ChannelId) for exactly as
//! long as the channel is open.

/// In-memory credential store.
pub mod store;

pub use store::CredentialStore;
