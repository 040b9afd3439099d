//! Web search for Scout.
//!
//! Wraps the external search provider behind the [`SearchProvider`] trait and
//! exposes it to clients as the `search_web` tool.
//!
//! # Main types
//!
//! - [`SearchProvider`]: Query/response interface of the search collaborator.
//! - [`SerperClient`]: HTTP implementation against a Serper-compatible API.
//! - [`WebSearchSkill`]: The `search_web` tool: resolves the caller's
//!   credential, calls the provider, and renders a text report.

/// Search collaborator error type.
pub mod error;
/// The collaborator trait and result type.
pub mod provider;
/// Text rendering of search results.
pub mod report;
/// Serper HTTP client.
pub mod serper;
/// The `search_web` skill.
pub mod web_search;

pub use error::SearchError;
pub use provider::{SearchHit, SearchProvider};
pub use serper::{SerperClient, SerperConfig};
pub use scout_core::CREDENTIAL_HEADER;
pub use web_search::{WebSearchSkill, NUM_RESULTS};
