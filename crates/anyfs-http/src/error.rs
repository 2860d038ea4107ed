//! Error types for the transport and authentication layers.

use thiserror::Error;

/// A failure to obtain any response from the remote end.
///
/// Every variant except [`HttpClientError::InvalidRequest`] and
/// [`HttpClientError::Setup`] may succeed on a later attempt.
#[derive(Debug, Error)]
pub enum HttpClientError {
    /// The request did not complete before the transport's deadline.
    #[error("request timed out")]
    Timeout,

    /// The connection could not be established or was dropped.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The request could not be built, so sending it again cannot help.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The transport itself could not be constructed.
    #[error("failed to set up http client: {0}")]
    Setup(String),

    /// Anything else the backend reported.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// A failure to authenticate a pending request.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The shared secret is not valid base64.
    #[error("account key is not valid base64: {0}")]
    InvalidKey(#[from] base64::DecodeError),

    /// The shared secret could not be used as a MAC key.
    #[error("account key has an unusable length")]
    KeyLength,

    /// The request URL could not be parsed for canonicalization.
    #[error("invalid request url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A computed header value contains bytes that are not allowed in headers.
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),

    /// The request date could not be rendered.
    #[error("failed to format request date: {0}")]
    Date(#[from] time::error::Format),

    /// The external credential provider failed to hand out a token.
    #[error("credential provider failed: {0}")]
    Token(String),
}
