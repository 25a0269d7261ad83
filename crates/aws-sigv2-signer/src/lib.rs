//! AWS Signature Version 2 request signing for HTTP clients.
//!
//! SigV2 proves possession of a secret access key by computing
//! `Base64(HMAC-SHA1(SecretKey, StringToSign))` over a canonical rendering of
//! the request. The signature travels either in the `Authorization` header
//! (`AWS <AWSAccessKeyId>:<Signature>`) or, for presigned URLs, in the
//! `Signature`, `AWSAccessKeyId` and `Expires` query parameters.
//!
//! ```text
//! StringToSign = HTTP-Verb + "\n" +
//!                Content-MD5 + "\n" +
//!                Content-Type + "\n" +
//!                (Expires | "") + "\n" +
//!                CanonicalizedAmzHeaders +
//!                URLEncodedPath
//! ```
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use aws_sigv2_signer::{
//!     AuthV2Signer, HttpRequest, RequestSigner, SignableRequest, StaticCredentialProvider,
//! };
//!
//! let provider = StaticCredentialProvider::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY");
//! let signer = AuthV2Signer::new(Arc::new(provider));
//!
//! let mut request = HttpRequest::new(http::Method::GET, "https://example.amazonaws.com/").unwrap();
//! signer.sign_request(&mut request).unwrap();
//! assert!(request.authorization().unwrap().starts_with("AWS AKIDEXAMPLE:"));
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - Header canonicalization and string-to-sign construction
//! - [`clock`] - Signing timestamp source and GMT date formatting
//! - [`config`] - Environment-driven signer configuration
//! - [`credentials`] - Credential pair and provider implementations
//! - [`error`] - Signing error types
//! - [`hash`] - Keyed-hash primitive and signature encoding
//! - [`request`] - The request abstraction the signer reads and mutates
//! - [`signer`] - The SigV2 signer and the `RequestSigner` interface

pub mod canonical;
pub mod clock;
pub mod config;
pub mod credentials;
pub mod error;
pub mod hash;
pub mod request;
pub mod signer;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::SignerConfig;
pub use credentials::{
    AnonymousCredentialProvider, CredentialProvider, Credentials, EnvironmentCredentialProvider,
    StaticCredentialProvider,
};
pub use error::{SignerError, SignerResult};
pub use hash::{HmacSha1, KeyedHash};
pub use request::{HttpRequest, SignableRequest};
pub use signer::{AuthV2Signer, RequestSigner};
