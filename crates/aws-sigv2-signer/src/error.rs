//! Error types for SigV2 signing.
//!
//! Signing itself has a single failure mode, the keyed-hash primitive. The
//! remaining variants come from the request collaborator.

/// Errors that can occur while signing or presigning a request.
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    /// The keyed-hash primitive could not produce a digest.
    #[error("Failed to compute HMAC-SHA1 digest: {0}")]
    Digest(String),

    /// The `Authorization` value on a signed request is not `AWS <akid>:<signature>`.
    #[error("Malformed SigV2 Authorization value: {0}")]
    MalformedAuthorization(String),

    /// A URI could not be parsed or rebuilt.
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// A header name or value was rejected by the request.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Converting into an `http::Request` failed.
    #[error(transparent)]
    Http(#[from] http::Error),
}

/// Convenience result type for signing operations.
pub type SignerResult<T> = Result<T, SignerError>;
