//! Local TLS WebSocket feed server for integration tests.
//!
//! Binds a random loopback port and serves one connection per `accept_*`
//! call, so a test can script each connection a session makes.

#![allow(dead_code)]

use std::sync::Arc;

use futures_util::StreamExt;
use rcgen::{CertifiedKey, generate_simple_self_signed};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor;
use tokio_rustls::rustls::{ClientConfig, ServerConfig};
use tokio_rustls::server::TlsStream;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use wsfeed::Endpoint;
use wsfeed::codec::gzip_compress;

pub type FeedStream = WebSocketStream<TlsStream<TcpStream>>;

fn self_signed() -> (CertificateDer<'static>, Arc<ServerConfig>) {
    let CertifiedKey { cert, key_pair } =
        generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();

    let cert_der = CertificateDer::from(cert.der().to_vec());
    let key_der = PrivateKeyDer::Pkcs8(key_pair.serialize_der().into());

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(vec![cert_der.clone()], key_der)
        .unwrap();

    (cert_der, Arc::new(config))
}

pub struct FeedServer {
    listener: TcpListener,
    acceptor: TlsAcceptor,
    root: CertificateDer<'static>,
}

impl FeedServer {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (root, config) = self_signed();

        Self {
            listener,
            acceptor: TlsAcceptor::from(config),
            root,
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        let port = self.listener.local_addr().unwrap().port();
        Endpoint::new("localhost", port.to_string())
    }

    /// Trust context that accepts this server's certificate.
    pub fn trust(&self) -> Arc<ClientConfig> {
        wsfeed::tls::client_config_from_certs(vec![self.root.clone()]).unwrap()
    }

    async fn accept_tls(&self) -> TlsStream<TcpStream> {
        let (stream, _) = self.listener.accept().await.unwrap();
        self.acceptor.accept(stream).await.unwrap()
    }

    /// Accept one connection through the WebSocket upgrade, returning the
    /// upgraded stream and the requested path.
    pub async fn accept(&self) -> (FeedStream, String) {
        let tls = self.accept_tls().await;
        let mut path = String::new();
        let record_path =
            |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
                path = request.uri().path().to_string();
                Ok(response)
            };
        let ws = tokio_tungstenite::accept_hdr_async(tls, record_path)
            .await
            .unwrap();
        (ws, path)
    }

    /// Accept one connection presenting a certificate the client does not
    /// trust. The client is expected to abort the handshake.
    pub async fn accept_untrusted(&self) {
        let (_, config) = self_signed();
        let (stream, _) = self.listener.accept().await.unwrap();
        let _ = TlsAcceptor::from(config).accept(stream).await;
    }

    /// Accept one connection, complete TLS, and refuse the upgrade.
    pub async fn accept_and_refuse_upgrade(&self) {
        let mut tls = self.accept_tls().await;

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = tls.read(&mut buf).await.unwrap();
            assert!(n > 0, "client hung up mid-request");
            request.extend_from_slice(&buf[..n]);
        }

        tls.write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n")
            .await
            .unwrap();
        tls.flush().await.unwrap();
    }
}

pub async fn next_text(ws: &mut FeedStream) -> String {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return text.as_str().to_owned(),
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
            other => panic!("expected a text frame, got {other:?}"),
        }
    }
}

pub fn gz(text: &str) -> Message {
    Message::binary(gzip_compress(text.as_bytes()).unwrap())
}
