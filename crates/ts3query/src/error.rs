use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the ServerQuery client.
///
/// Transport errors are terminal for the owning [`crate::Client`]; every other
/// variant fails only the call (or event) that triggered it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("transport failure: {0}")]
    Transport(#[source] std::io::Error),

    #[error("connection closed by peer")]
    Eof,

    #[error("failed to encode command arguments: {0}")]
    Encoding(String),

    #[error("failed to decode server response: {0}")]
    Decoding(String),

    #[error("server returned error {id}: {msg}")]
    Server { id: u32, msg: String },

    #[error("turn timed out after {0:?}")]
    Timeout(Duration),

    #[error("call was cancelled")]
    Cancelled,

    #[error("client connection is shutting down")]
    Closed,

    #[error("malformed catalog entry: {0}")]
    Catalog(&'static str),
}
