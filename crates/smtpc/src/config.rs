//! Per-request TLS, authentication and timeout options.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::engine::DEFAULT_TIMEOUT;
use crate::error::Result;
use crate::request::{Built, Request};
use crate::types::UseSsl;

/// Options applied to a request before it executes.
///
/// Every field is optional; unset fields leave the transport default in
/// place. Deserializes from the same keys the embedding host accepts:
///
/// ```json
/// { "use_ssl": 1, "verify_peer": true, "timeout": 30.5, "username": "me" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RequestOptions {
    /// Directory holding CA certificates.
    pub ca_path: Option<String>,
    /// CA bundle file.
    pub ca_file: Option<String>,
    /// Verify the certificate name against the host.
    pub verify_host: Option<bool>,
    /// Verify the peer certificate chain.
    pub verify_peer: Option<bool>,
    /// Client private key path.
    pub ssl_key: Option<String>,
    /// Client certificate path.
    pub ssl_cert: Option<String>,
    /// TLS usage policy, `0..=3`.
    pub use_ssl: Option<UseSsl>,
    /// Transaction timeout, given in seconds.
    #[serde(deserialize_with = "seconds")]
    pub timeout: Option<Duration>,
    /// Verbose transport logging.
    pub verbose: Option<bool>,
    /// Authentication user name.
    pub username: Option<String>,
    /// Authentication password.
    pub password: Option<String>,
}

impl RequestOptions {
    /// Creates an empty option set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the CA certificate directory.
    #[must_use]
    pub fn ca_path(mut self, path: impl Into<String>) -> Self {
        self.ca_path = Some(path.into());
        self
    }

    /// Sets the CA bundle file.
    #[must_use]
    pub fn ca_file(mut self, path: impl Into<String>) -> Self {
        self.ca_file = Some(path.into());
        self
    }

    /// Sets host name verification.
    #[must_use]
    pub const fn verify_host(mut self, verify: bool) -> Self {
        self.verify_host = Some(verify);
        self
    }

    /// Sets peer certificate verification.
    #[must_use]
    pub const fn verify_peer(mut self, verify: bool) -> Self {
        self.verify_peer = Some(verify);
        self
    }

    /// Sets the client key and certificate paths.
    #[must_use]
    pub fn client_identity(mut self, key: impl Into<String>, cert: impl Into<String>) -> Self {
        self.ssl_key = Some(key.into());
        self.ssl_cert = Some(cert.into());
        self
    }

    /// Sets the TLS usage policy.
    #[must_use]
    pub const fn use_ssl(mut self, use_ssl: UseSsl) -> Self {
        self.use_ssl = Some(use_ssl);
        self
    }

    /// Sets the transaction timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets verbose transport logging.
    #[must_use]
    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    /// Sets authentication credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Returns the configured timeout, or [`DEFAULT_TIMEOUT`].
    #[must_use]
    pub fn effective_timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Forwards every set option to `request`.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by a setter.
    pub fn apply(&self, request: &mut Request<Built>) -> Result<()> {
        if let Some(path) = &self.ca_path {
            request.set_ca_path(path)?;
        }
        if let Some(path) = &self.ca_file {
            request.set_ca_file(path)?;
        }
        if let Some(verify) = self.verify_host {
            request.set_verify_host(verify)?;
        }
        if let Some(verify) = self.verify_peer {
            request.set_verify_peer(verify)?;
        }
        if let Some(path) = &self.ssl_key {
            request.set_client_key(path)?;
        }
        if let Some(path) = &self.ssl_cert {
            request.set_client_cert(path)?;
        }
        if let Some(use_ssl) = self.use_ssl {
            request.set_use_ssl(use_ssl)?;
        }
        if let Some(verbose) = self.verbose {
            request.set_verbose(verbose)?;
        }
        if let Some(username) = &self.username {
            request.set_username(username)?;
        }
        if let Some(password) = &self.password {
            request.set_password(password)?;
        }
        Ok(())
    }
}

fn seconds<'de, D>(deserializer: D) -> std::result::Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer)?
        .map(|secs| Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom))
        .transpose()
}
