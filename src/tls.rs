//! Encrypted transport setup for the gateway session.
//!
//! Loads the client identity from a PEM file, performs the TCP connect and
//! TLS handshake, both bounded by the configured timeout, and hands the
//! established stream to the connection actor. Failures here abort startup;
//! the actor never exists without a live session.

use std::{io, sync::Arc};

use camino::Utf8Path;
use thiserror::Error;
use tokio::{net::TcpStream, time::timeout};
use tokio_rustls::{
    TlsConnector,
    client::TlsStream,
    rustls::{
        self, ClientConfig, RootCertStore,
        pki_types::{CertificateDer, PrivateKeyDer, ServerName},
    },
};

use crate::config::ConnectionConfig;

/// Errors that prevent a gateway session from being established.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The certificate file could not be read.
    #[error("certificate file {path}: {source}")]
    CertFile {
        /// Path of the file that failed to load.
        path: String,
        /// Underlying I/O failure.
        source: io::Error,
    },
    /// The PEM file holds no certificates.
    #[error("no certificates found in {0}")]
    MissingCertificate(String),
    /// The PEM file holds no private key.
    #[error("no private key found in {0}")]
    MissingKey(String),
    /// The host is not a valid TLS server name.
    #[error("invalid gateway host {0:?}")]
    InvalidHost(String),
    /// TLS configuration or handshake failure.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),
    /// I/O error while connecting.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The connect or handshake exceeded the configured timeout.
    #[error("gateway handshake timed out")]
    Timeout,
}

/// Client identity loaded from a PEM file.
type Identity = (Vec<CertificateDer<'static>>, PrivateKeyDer<'static>);

/// Load the certificate chain and private key from one PEM file.
async fn load_identity(path: &Utf8Path) -> Result<Identity, ConnectError> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|source| ConnectError::CertFile {
            path: path.to_string(),
            source,
        })?;
    let certs = rustls_pemfile::certs(&mut io::Cursor::new(&data))
        .collect::<Result<Vec<_>, _>>()?;
    if certs.is_empty() {
        return Err(ConnectError::MissingCertificate(path.to_string()));
    }
    let key = rustls_pemfile::private_key(&mut io::Cursor::new(&data))?
        .ok_or_else(|| ConnectError::MissingKey(path.to_string()))?;
    Ok((certs, key))
}

/// Build the rustls client configuration for the gateway.
fn client_config(identity: Identity) -> Result<ClientConfig, ConnectError> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let (certs, key) = identity;
    Ok(ClientConfig::builder()
        .with_root_certificates(roots)
        .with_client_auth_cert(certs, key)?)
}

/// Open the encrypted session described by `config`.
///
/// The certificate file is read before any network activity, so identity
/// problems surface without dialing the gateway. The TCP connect and the TLS
/// handshake are each bounded by the configured timeout.
///
/// # Errors
/// Returns a [`ConnectError`] describing the first failure; no stream is
/// returned on any error path.
#[must_use = "handle the result"]
pub async fn connect(config: &ConnectionConfig) -> Result<TlsStream<TcpStream>, ConnectError> {
    if let Some(seed) = config.seed() {
        // The rustls provider owns its CSPRNG; an external seed has no hook.
        tracing::debug!(seed_len = seed.len(), "entropy seed supplied but unused");
    }
    let identity = load_identity(config.cert_file()).await?;
    let tls = client_config(identity)?;
    let server_name = ServerName::try_from(config.host().to_owned())
        .map_err(|_| ConnectError::InvalidHost(config.host().to_owned()))?;

    let tcp = timeout(
        config.timeout(),
        TcpStream::connect((config.host(), config.port())),
    )
    .await
    .map_err(|_| ConnectError::Timeout)??;
    let connector = TlsConnector::from(Arc::new(tls));
    let stream = timeout(config.timeout(), connector.connect(server_name, tcp))
        .await
        .map_err(|_| ConnectError::Timeout)??;
    tracing::info!(
        host = config.host(),
        port = config.port(),
        "gateway session established"
    );
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use camino::Utf8PathBuf;

    use super::*;

    fn utf8_path(file: &tempfile::NamedTempFile) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(file.path().to_path_buf()).expect("utf-8 temp path")
    }

    #[tokio::test]
    async fn missing_file_reports_cert_file_error() {
        let err = load_identity(Utf8Path::new("/nonexistent/apns.pem"))
            .await
            .expect_err("should fail");
        assert!(matches!(err, ConnectError::CertFile { .. }));
    }

    #[tokio::test]
    async fn file_without_certificates_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"not a pem file").expect("write");
        let err = load_identity(&utf8_path(&file))
            .await
            .expect_err("should fail");
        assert!(matches!(err, ConnectError::MissingCertificate(_)));
    }

    #[tokio::test]
    async fn certificate_without_key_is_rejected() {
        // PEM block with syntactically valid base64; the DER inside is never
        // inspected here, only the missing key is.
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(
            b"-----BEGIN CERTIFICATE-----\nMIIBszCCAVM=\n-----END CERTIFICATE-----\n",
        )
        .expect("write");
        let err = load_identity(&utf8_path(&file))
            .await
            .expect_err("should fail");
        assert!(matches!(err, ConnectError::MissingKey(_)));
    }
}
