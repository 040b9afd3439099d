use thiserror::Error;

/// Failure of a call to the search collaborator.
///
/// The detail is meant for operator logs. Tool callers only ever see a
/// generic message.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Network(String),

    #[error("search provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed search response: {0}")]
    Decode(String),
}
