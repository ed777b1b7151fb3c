//! TLS trust context and client handshake.
//!
//! The session consumes a rustls [`ClientConfig`] as an opaque trust
//! context. The helpers here build one from the bundled Mozilla roots
//! (feature `bundled-roots`), from DER certificates, or from a PEM file.

mod rustls_impl;

pub use rustls_impl::{
    TlsConnector, TlsError, client_config_from_certs, client_config_from_pem_file,
    load_certs_from_file,
};

pub use tokio_rustls::client::TlsStream;
pub use tokio_rustls::rustls::ClientConfig;

#[cfg(feature = "bundled-roots")]
use std::sync::Arc;

/// Trust context backed by the bundled `webpki-roots` certificate set.
#[cfg(feature = "bundled-roots")]
pub fn webpki_client_config() -> Arc<ClientConfig> {
    let root_store =
        rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Arc::new(config)
}
