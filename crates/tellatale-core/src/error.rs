//! Backend error types.

use thiserror::Error;

/// Failure talking to the generation backend.
///
/// These carry raw detail for logs only. The story generator maps every
/// variant onto a fixed user-facing message.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The request could not be sent or the response body could not be read.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status code.
    #[error("backend returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned.
        body: String,
    },

    /// The response body did not have the expected structure.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The response was well-formed but carried no generated content.
    #[error("backend returned no content")]
    EmptyResponse,
}
