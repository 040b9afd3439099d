//! SSE transport for Scout: channel registry, lifecycle, request routing and the axum router.

pub mod config;
pub mod correlator;
pub mod lifecycle;
pub mod registry;
pub mod server;
pub mod stream;

pub use config::{CredentialPolicy, GatewayConfig};
pub use correlator::{RequestCorrelator, Unroutable};
pub use lifecycle::{ChannelLifecycle, ConnectError};
pub use registry::{ChannelEvent, ChannelHandle, ChannelRegistry, ChannelState};
pub use server::GatewayServer;
