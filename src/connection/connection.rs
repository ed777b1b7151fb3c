use std::time::Duration;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::error::{Error, Result};

/// One established WebSocket connection.
///
/// Created fresh for every connect attempt and dropped on teardown; a
/// connection is never reused across reconnects. Every read and write races
/// against the connection's cancellation token, so cancelling the token
/// aborts whatever operation is in flight.
///
/// ## Type Parameters
///
/// - `S`: The stream under the WebSocket framing (e.g. a TLS stream)
pub struct Connection<S> {
    ws: WebSocketStream<S>,
    cancel: CancellationToken,
}

impl<S> Connection<S> {
    /// Wrap an upgraded WebSocket stream.
    ///
    /// `cancel` should be scoped to this connection, usually a child of the
    /// session's shutdown token.
    pub fn new(ws: WebSocketStream<S>, cancel: CancellationToken) -> Self {
        Self { ws, cancel }
    }

    /// Cancel any in-flight and future read or write.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Check if the connection has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Connection<S> {
    /// Write one text message and wait until it is flushed.
    ///
    /// ## Errors
    ///
    /// - `Error::Cancelled` if the connection token fires first
    /// - `Error::Write` on any transport failure
    pub async fn send_text(&mut self, text: String) -> Result<()> {
        trace!(len = text.len(), "sending text frame");
        let cancel = &self.cancel;
        let ws = &mut self.ws;

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(Error::Cancelled),
            sent = ws.send(Message::text(text)) => {
                sent.map_err(|e| Error::Write(e.to_string()))
            }
        }
    }

    /// Wait for the next data frame and return its raw payload.
    ///
    /// Transport-level ping/pong control frames are skipped; the WebSocket
    /// layer answers transport pings on its own.
    ///
    /// ## Errors
    ///
    /// - `Error::Cancelled` if the connection token fires first
    /// - `Error::Read` on transport failure, a close frame, or end of stream
    pub async fn recv(&mut self) -> Result<Bytes> {
        let cancel = &self.cancel;
        let ws = &mut self.ws;

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                next = ws.next() => next,
            };

            match next {
                Some(Ok(Message::Binary(data))) => {
                    trace!(len = data.len(), "received binary frame");
                    return Ok(data);
                }
                Some(Ok(Message::Text(text))) => {
                    trace!(len = text.len(), "received text frame");
                    return Ok(Bytes::copy_from_slice(text.as_str().as_bytes()));
                }
                Some(Ok(Message::Close(frame))) => {
                    let reason = match frame {
                        Some(frame) => format!(
                            "closed by peer: {} {}",
                            u16::from(frame.code),
                            frame.reason.as_str()
                        ),
                        None => "closed by peer".to_string(),
                    };
                    return Err(Error::Read(reason));
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Err(e)) => return Err(Error::Read(e.to_string())),
                None => return Err(Error::Read("stream ended".into())),
            }
        }
    }

    /// Send a normal close frame, waiting at most `timeout`.
    ///
    /// Ignores the cancellation token so it can run during teardown.
    ///
    /// ## Errors
    ///
    /// `Error::Close` if the close frame cannot be written in time. A stream
    /// that is already closed is not an error.
    pub async fn close(&mut self, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, self.ws.close(None)).await {
            Ok(Ok(())) | Ok(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => Ok(()),
            Ok(Err(e)) => Err(Error::Close(e.to_string())),
            Err(_) => Err(Error::Close(format!(
                "timed out after {}ms",
                timeout.as_millis()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{DuplexStream, duplex};
    use tokio_tungstenite::tungstenite::protocol::Role;

    async fn pair() -> (Connection<DuplexStream>, WebSocketStream<DuplexStream>) {
        let (client, server) = duplex(64 * 1024);
        let client = WebSocketStream::from_raw_socket(client, Role::Client, None).await;
        let server = WebSocketStream::from_raw_socket(server, Role::Server, None).await;
        (Connection::new(client, CancellationToken::new()), server)
    }

    #[tokio::test]
    async fn test_send_text() {
        let (mut conn, mut server) = pair().await;

        conn.send_text("hello".into()).await.unwrap();

        let msg = server.next().await.unwrap().unwrap();
        assert_eq!(msg, Message::text("hello"));
    }

    #[tokio::test]
    async fn test_recv_binary_and_text() {
        let (mut conn, mut server) = pair().await;

        server
            .send(Message::binary(vec![0x1f, 0x8b, 0x08]))
            .await
            .unwrap();
        server.send(Message::text("plain")).await.unwrap();

        assert_eq!(conn.recv().await.unwrap().as_ref(), &[0x1f, 0x8b, 0x08]);
        assert_eq!(conn.recv().await.unwrap().as_ref(), b"plain");
    }

    #[tokio::test]
    async fn test_recv_skips_transport_ping() {
        let (mut conn, mut server) = pair().await;

        server.send(Message::Ping(Bytes::from_static(b"hb"))).await.unwrap();
        server.send(Message::text("data")).await.unwrap();

        assert_eq!(conn.recv().await.unwrap().as_ref(), b"data");
    }

    #[tokio::test]
    async fn test_recv_close_is_read_error() {
        let (mut conn, mut server) = pair().await;

        server.close(None).await.unwrap();

        assert!(matches!(conn.recv().await, Err(Error::Read(_))));
    }

    #[tokio::test]
    async fn test_recv_after_peer_drop_is_read_error() {
        let (mut conn, server) = pair().await;
        drop(server);

        assert!(matches!(conn.recv().await, Err(Error::Read(_))));
    }

    #[tokio::test]
    async fn test_cancel_aborts_pending_recv() {
        let (mut conn, _server) = pair().await;
        let token = conn.cancel.clone();

        let canceller = tokio::spawn(async move {
            tokio::task::yield_now().await;
            token.cancel();
        });

        assert_eq!(conn.recv().await, Err(Error::Cancelled));
        assert!(conn.is_cancelled());
        canceller.await.unwrap();
    }

    #[tokio::test]
    async fn test_send_after_cancel_fails() {
        let (mut conn, _server) = pair().await;
        conn.cancel();

        assert_eq!(conn.send_text("late".into()).await, Err(Error::Cancelled));
    }

    #[tokio::test]
    async fn test_close_sends_close_frame() {
        let (mut conn, mut server) = pair().await;

        conn.close(Duration::from_secs(1)).await.unwrap();

        let msg = server.next().await.unwrap().unwrap();
        assert!(matches!(msg, Message::Close(_)));
    }
}
