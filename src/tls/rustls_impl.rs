use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::RootCertStore;
use rustls::pki_types::{CertificateDer, ServerName};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::ClientConfig;

#[derive(Debug)]
pub enum TlsError {
    Io(std::io::Error),
    Configuration(String),
    NoCertificatesFound,
    InvalidDnsName(String),
    Handshake(std::io::Error),
}

impl std::fmt::Display for TlsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TlsError::Io(e) => write!(f, "TLS I/O error: {}", e),
            TlsError::Configuration(msg) => write!(f, "TLS configuration error: {}", msg),
            TlsError::NoCertificatesFound => write!(f, "no certificates found in file"),
            TlsError::InvalidDnsName(name) => write!(f, "invalid DNS name: {}", name),
            TlsError::Handshake(e) => write!(f, "TLS handshake error: {}", e),
        }
    }
}

impl std::error::Error for TlsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TlsError::Io(e) | TlsError::Handshake(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TlsError {
    fn from(err: std::io::Error) -> Self {
        TlsError::Io(err)
    }
}

impl From<TlsError> for crate::Error {
    fn from(err: TlsError) -> Self {
        crate::Error::Tls(err.to_string())
    }
}

/// Client side of the TLS layer; the trust context is fixed at construction.
#[derive(Clone)]
pub struct TlsConnector {
    inner: tokio_rustls::TlsConnector,
}

impl TlsConnector {
    pub fn new(config: Arc<ClientConfig>) -> Self {
        Self {
            inner: tokio_rustls::TlsConnector::from(config),
        }
    }

    /// Run the client handshake over `stream`, verifying the peer as `domain`.
    pub async fn connect<S>(&self, domain: &str, stream: S) -> Result<TlsStream<S>, TlsError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let server_name = ServerName::try_from(domain.to_string())
            .map_err(|_| TlsError::InvalidDnsName(domain.to_string()))?;

        self.inner
            .connect(server_name, stream)
            .await
            .map_err(TlsError::Handshake)
    }
}

impl std::fmt::Debug for TlsConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConnector").finish_non_exhaustive()
    }
}

pub fn client_config_from_certs(
    certs: impl IntoIterator<Item = CertificateDer<'static>>,
) -> Result<Arc<ClientConfig>, TlsError> {
    let mut root_store = RootCertStore::empty();
    for cert in certs {
        root_store
            .add(cert)
            .map_err(|e| TlsError::Configuration(e.to_string()))?;
    }

    if root_store.is_empty() {
        return Err(TlsError::NoCertificatesFound);
    }

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Ok(Arc::new(config))
}

pub fn client_config_from_pem_file(path: &Path) -> Result<Arc<ClientConfig>, TlsError> {
    client_config_from_certs(load_certs_from_file(path)?)
}

pub fn load_certs_from_file(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let certs: Vec<CertificateDer<'static>> =
        rustls_pemfile::certs(&mut reader).collect::<Result<Vec<_>, _>>()?;

    if certs.is_empty() {
        return Err(TlsError::NoCertificatesFound);
    }

    Ok(certs)
}
