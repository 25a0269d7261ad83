//! Signer configuration.
//!
//! Configuration is driven by environment variables, using the standard AWS
//! credential variable names.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::credentials::{
    ACCESS_KEY_ID_ENV, AnonymousCredentialProvider, CredentialProvider, SECRET_ACCESS_KEY_ENV,
    StaticCredentialProvider,
};

/// Environment variable overriding the default presign expiry, in seconds.
pub const PRESIGN_EXPIRES_ENV: &str = "SIGV2_PRESIGN_EXPIRES";

/// Default lifetime of a presigned URL, in seconds.
pub const DEFAULT_EXPIRATION_SECS: i64 = 900;

/// Configuration for building an [`AuthV2Signer`](crate::AuthV2Signer).
#[derive(Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignerConfig {
    /// Access key ID. Empty means anonymous.
    pub access_key_id: String,
    /// Secret access key. Empty means anonymous.
    #[serde(skip_serializing)]
    pub secret_access_key: String,
    /// Lifetime of presigned URLs created with the default expiry.
    pub default_expiration_secs: i64,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            access_key_id: String::new(),
            secret_access_key: String::new(),
            default_expiration_secs: DEFAULT_EXPIRATION_SECS,
        }
    }
}

impl fmt::Debug for SignerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerConfig")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("default_expiration_secs", &self.default_expiration_secs)
            .finish()
    }
}

impl SignerConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup(ACCESS_KEY_ID_ENV) {
            config.access_key_id = v.trim().to_owned();
        }
        if let Some(v) = lookup(SECRET_ACCESS_KEY_ENV) {
            config.secret_access_key = v.trim().to_owned();
        }
        if let Some(v) = lookup(PRESIGN_EXPIRES_ENV) {
            match v.trim().parse::<i64>() {
                Ok(secs) if secs >= 0 => config.default_expiration_secs = secs,
                _ => warn!(
                    value = %v,
                    default = DEFAULT_EXPIRATION_SECS,
                    "Ignoring invalid {PRESIGN_EXPIRES_ENV}"
                ),
            }
        }

        config
    }

    /// Whether no usable credentials are configured.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.access_key_id.is_empty() || self.secret_access_key.is_empty()
    }

    /// Build the credential provider described by this configuration.
    #[must_use]
    pub fn credential_provider(&self) -> Arc<dyn CredentialProvider> {
        if self.is_anonymous() {
            Arc::new(AnonymousCredentialProvider)
        } else {
            Arc::new(StaticCredentialProvider::new(
                self.access_key_id.clone(),
                self.secret_access_key.clone(),
            ))
        }
    }
}
