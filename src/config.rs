//! Connection parameters for a gateway session.

use std::time::Duration;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Default bound on the TCP connect and TLS handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised when building a [`ConnectionConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The gateway host is blank.
    #[error("gateway host cannot be empty")]
    EmptyHost,
    /// The certificate path is blank.
    #[error("certificate path cannot be empty")]
    EmptyCertFile,
}

/// Immutable parameters for one gateway connection.
///
/// Supplied once when the connection is created and never mutated.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    host: String,
    port: u16,
    cert_file: Utf8PathBuf,
    timeout: Duration,
    seed: Option<Vec<u8>>,
}

impl ConnectionConfig {
    /// Create a configuration from validated values.
    ///
    /// # Errors
    /// Returns [`ConfigError::EmptyHost`] or [`ConfigError::EmptyCertFile`]
    /// when the host or certificate path is blank.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        cert_file: impl Into<Utf8PathBuf>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        let cert_file = cert_file.into();
        if cert_file.as_str().trim().is_empty() {
            return Err(ConfigError::EmptyCertFile);
        }
        Ok(Self {
            host,
            port,
            cert_file,
            timeout,
            seed: None,
        })
    }

    /// Attach an entropy seed for the secure-transport subsystem.
    ///
    /// The rustls backend manages its own CSPRNG and ignores the seed; it is
    /// accepted so callers can keep supplying it to any backend that uses it.
    #[must_use]
    pub fn with_seed(mut self, seed: Vec<u8>) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Return the gateway host name.
    #[must_use]
    pub fn host(&self) -> &str { &self.host }

    /// Return the gateway port.
    #[must_use]
    pub const fn port(&self) -> u16 { self.port }

    /// Return the path of the PEM file holding the client certificate and key.
    #[must_use]
    pub fn cert_file(&self) -> &Utf8PathBuf { &self.cert_file }

    /// Return the handshake timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration { self.timeout }

    /// Return the entropy seed, if one was supplied.
    #[must_use]
    pub fn seed(&self) -> Option<&[u8]> { self.seed.as_deref() }
}
