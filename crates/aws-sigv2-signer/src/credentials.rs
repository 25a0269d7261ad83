//! Credential pair and provider implementations.
//!
//! The signer asks its [`CredentialProvider`] for a fresh [`Credentials`] value
//! on every signing attempt and never caches it, so providers are free to
//! rotate keys between calls. A pair with either field empty is anonymous and
//! leaves requests unsigned.

use std::fmt;

/// Environment variable holding the access key ID.
pub const ACCESS_KEY_ID_ENV: &str = "AWS_ACCESS_KEY_ID";
/// Environment variable holding the secret access key.
pub const SECRET_ACCESS_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";

/// An access key ID and its secret key.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_key: String,
}

impl Credentials {
    /// Create a credential pair.
    pub fn new(access_key_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_key: secret_key.into(),
        }
    }

    /// The empty, anonymous pair.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// The access key ID.
    #[must_use]
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// The secret access key.
    #[must_use]
    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// Whether this pair is anonymous (either field empty).
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.access_key_id.is_empty() || self.secret_key.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_key", &"** redacted **")
            .finish()
    }
}

/// Source of credentials for each signing attempt.
///
/// Implementations may read configuration, call out to a metadata service, or
/// refresh expiring keys; the signer treats them as opaque.
pub trait CredentialProvider: Send + Sync {
    /// Return the credentials to sign with. Empty fields mean anonymous.
    fn get_credentials(&self) -> Credentials;
}

/// A provider that always returns the same credential pair.
///
/// # Examples
///
/// ```
/// use aws_sigv2_signer::credentials::{CredentialProvider, StaticCredentialProvider};
///
/// let provider = StaticCredentialProvider::new("AKIDEXAMPLE", "secret");
/// assert_eq!(provider.get_credentials().access_key_id(), "AKIDEXAMPLE");
/// ```
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider {
    credentials: Credentials,
}

impl StaticCredentialProvider {
    /// Create a provider for a fixed access key ID and secret key.
    pub fn new(access_key_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::new(access_key_id, secret_key),
        }
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn get_credentials(&self) -> Credentials {
        self.credentials.clone()
    }
}

/// A provider for callers without credentials. Requests pass through unsigned.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousCredentialProvider;

impl CredentialProvider for AnonymousCredentialProvider {
    fn get_credentials(&self) -> Credentials {
        Credentials::anonymous()
    }
}

/// A provider reading `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY` on every call.
///
/// Unset variables yield anonymous credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentCredentialProvider;

impl CredentialProvider for EnvironmentCredentialProvider {
    fn get_credentials(&self) -> Credentials {
        credentials_from_vars(|name| std::env::var(name).ok())
    }
}

fn credentials_from_vars(lookup: impl Fn(&str) -> Option<String>) -> Credentials {
    let access_key_id = lookup(ACCESS_KEY_ID_ENV).unwrap_or_default();
    let secret_key = lookup(SECRET_ACCESS_KEY_ENV).unwrap_or_default();
    Credentials::new(access_key_id.trim(), secret_key.trim())
}
