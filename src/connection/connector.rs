//! Connection setup pipeline: resolve, TCP, TLS, WebSocket upgrade.

use std::borrow::Cow;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tracing::{debug, instrument};

use crate::config::{Endpoint, SessionConfig};
use crate::connection::{SessionState, StateReporter};
use crate::error::{Error, Result};
use crate::tls::{ClientConfig, TlsConnector, TlsStream};

/// Establishes upgraded WebSocket streams for a session.
///
/// A single call runs the whole setup pipeline once. Implementations report
/// each stage through `progress` and must not retry internally; the session
/// restarts from scratch on failure.
pub trait Connect: Send + Sync {
    /// Stream under the WebSocket framing.
    type Io: AsyncRead + AsyncWrite + Unpin + Send;

    /// Run the setup pipeline against `endpoint`.
    fn connect(
        &self,
        endpoint: &Endpoint,
        progress: &StateReporter,
    ) -> impl Future<Output = Result<WebSocketStream<Self::Io>>> + Send;
}

/// Connector for `wss://` endpoints.
///
/// Holds the caller's trust context and the fixed upgrade path; the
/// endpoint itself is supplied per attempt.
#[derive(Debug, Clone)]
pub struct WssConnector {
    tls: TlsConnector,
    resource_path: String,
    ws_config: WebSocketConfig,
}

impl WssConnector {
    /// Create a connector using `trust` for certificate verification.
    pub fn new(trust: Arc<ClientConfig>, config: &SessionConfig) -> Self {
        let mut ws_config = WebSocketConfig::default();
        ws_config.max_message_size = Some(config.limits.max_message_size);
        ws_config.max_frame_size = Some(config.limits.max_frame_size);

        Self {
            tls: TlsConnector::new(trust),
            resource_path: config.resource_path.clone(),
            ws_config,
        }
    }

    /// URL requested during the upgrade, omitting the default port.
    ///
    /// IPv6 literal hosts are bracketed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolve`] if the endpoint port is not usable.
    pub fn request_url(&self, endpoint: &Endpoint) -> Result<String> {
        let port = endpoint.port_number()?;
        let host = endpoint.host();
        let host = if host.contains(':') && !host.starts_with('[') {
            Cow::Owned(format!("[{host}]"))
        } else {
            Cow::Borrowed(host)
        };

        if port == 443 {
            Ok(format!("wss://{}{}", host, self.resource_path))
        } else {
            Ok(format!("wss://{}:{}{}", host, port, self.resource_path))
        }
    }
}

impl Connect for WssConnector {
    type Io = TlsStream<TcpStream>;

    #[instrument(name = "connect", skip_all, fields(endpoint = %endpoint))]
    async fn connect(
        &self,
        endpoint: &Endpoint,
        progress: &StateReporter,
    ) -> Result<WebSocketStream<Self::Io>> {
        progress.set(SessionState::Resolving);
        let url = self.request_url(endpoint)?;
        let addrs = resolve(endpoint).await?;

        progress.set(SessionState::Connecting);
        let tcp = connect_tcp(&addrs).await?;

        progress.set(SessionState::TlsHandshake);
        let tls = self.tls.connect(endpoint.host(), tcp).await?;
        debug!("TLS handshake complete");

        progress.set(SessionState::WsHandshake);
        let (ws, response) =
            tokio_tungstenite::client_async_with_config(url, tls, Some(self.ws_config))
                .await
                .map_err(|e| Error::Handshake(e.to_string()))?;
        debug!(status = %response.status(), "WebSocket handshake complete");

        Ok(ws)
    }
}

/// Look up every candidate address for `endpoint`.
///
/// # Errors
///
/// Returns [`Error::Resolve`] if the lookup fails or yields nothing.
pub async fn resolve(endpoint: &Endpoint) -> Result<Vec<SocketAddr>> {
    let port = endpoint.port_number()?;
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((endpoint.host(), port))
        .await
        .map_err(|e| Error::Resolve(format!("{}: {}", endpoint.host(), e)))?
        .collect();

    if addrs.is_empty() {
        return Err(Error::Resolve(format!(
            "{}: no addresses found",
            endpoint.host()
        )));
    }

    debug!(candidates = addrs.len(), "resolved endpoint");
    Ok(addrs)
}

/// Connect to the first candidate that accepts, trying them in order.
///
/// # Errors
///
/// Returns [`Error::Connect`] carrying the last failure if every candidate
/// refuses.
pub async fn connect_tcp(addrs: &[SocketAddr]) -> Result<TcpStream> {
    let mut last_error = None;

    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                stream
                    .set_nodelay(true)
                    .map_err(|e| Error::Connect(format!("{addr}: {e}")))?;
                debug!(%addr, "TCP connected");
                return Ok(stream);
            }
            Err(e) => {
                debug!(%addr, error = %e, "TCP candidate failed");
                last_error = Some(format!("{addr}: {e}"));
            }
        }
    }

    Err(Error::Connect(
        last_error.unwrap_or_else(|| "no candidate addresses".to_string()),
    ))
}
