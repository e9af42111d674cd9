use thiserror::Error;

/// Errors from model provider calls.
///
/// Any of these abandons the query in progress; the conversation keeps
/// every turn appended before the failing call.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// The request never got a response.
    #[error("network: {0}")]
    Network(String),

    /// The provider answered with a non-success status.
    #[error("provider api: {0}")]
    Api(String),

    /// The provider refused the prompt (safety filters and the like).
    #[error("prompt blocked: {0}")]
    Blocked(String),

    /// The provider response could not be parsed or held no text.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}
