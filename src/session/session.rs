use std::convert::Infallible;
use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::codec::{Decompress, Gzip};
use crate::config::{Endpoint, SessionConfig};
use crate::connection::{Connect, Connection, SessionState, StateReporter, WssConnector};
use crate::error::{Error, Result};
use crate::session::dispatch::{Action, Dispatcher};
use crate::session::queue::OutboundQueue;
use crate::session::supervisor::{ReconnectPolicy, Supervisor};
use crate::tls::ClientConfig;

/// Consumer callback for decompressed non-ping messages.
pub type MessageHandler = Box<dyn FnMut(&str) + Send>;

/// Counters accumulated over the lifetime of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Completed WebSocket handshakes.
    pub connects: u64,
    /// Failures that tore a connection down or aborted an attempt.
    pub failures: u64,
    /// Inbound data frames read.
    pub frames_received: u64,
    /// Decompressed messages handed to the consumer.
    pub messages_delivered: u64,
    /// Keep-alive replies written.
    pub pongs_sent: u64,
    /// Queued messages written.
    pub messages_sent: u64,
}

enum Step {
    Send(String),
    Reply(String),
    Receive,
}

/// A self-reconnecting WebSocket session.
///
/// Connects to a fixed endpoint, sends the queued messages one at a time
/// with a read after each write, answers keep-alive pings, and hands every
/// other message to the consumer. Any failure tears the connection down,
/// waits the reconnect delay, restores the queue from its template and
/// starts over.
///
/// # Example
///
/// ```no_run
/// use wsfeed::{Endpoint, Session, SessionConfig, Subscribe};
///
/// # async fn example(trust: std::sync::Arc<wsfeed::tls::ClientConfig>) -> wsfeed::Result<()> {
/// let messages = [Subscribe::new("market.btcusdt.detail", "id1").to_text()?];
/// let mut session = Session::wss(
///     Endpoint::new("api.huobi.br.com", "https"),
///     messages,
///     trust,
///     SessionConfig::new(),
/// )?
/// .on_message(|text| println!("{text}"));
///
/// session.run().await
/// # }
/// ```
pub struct Session<C: Connect> {
    endpoint: Endpoint,
    config: SessionConfig,
    connector: C,
    queue: OutboundQueue,
    dispatcher: Dispatcher,
    handler: MessageHandler,
    supervisor: Supervisor,
    state: StateReporter,
    shutdown: CancellationToken,
    stats: SessionStats,
}

impl Session<WssConnector> {
    /// Create a session over TLS, verifying servers against `trust`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `config` fails validation.
    pub fn wss<I, T>(
        endpoint: Endpoint,
        messages: I,
        trust: Arc<ClientConfig>,
        config: SessionConfig,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let connector = WssConnector::new(trust, &config);
        Self::new(endpoint, messages, connector, config)
    }
}

impl<C: Connect> Session<C> {
    /// Create a session that connects through `connector`.
    ///
    /// `messages` becomes the outbound template replayed on every
    /// connection. Frames are gunzipped and delivered to a handler that
    /// logs them until [`on_message`](Self::on_message) replaces it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `config` fails validation.
    pub fn new<I, T>(
        endpoint: Endpoint,
        messages: I,
        connector: C,
        config: SessionConfig,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        config.validate()?;

        Ok(Self {
            endpoint,
            connector,
            queue: OutboundQueue::new(messages),
            dispatcher: Dispatcher::new(
                Gzip::with_max_output(config.limits.max_message_size),
                config.ping.clone(),
            ),
            handler: Box::new(|text: &str| info!(payload = text, "message")),
            supervisor: Supervisor::new(ReconnectPolicy::from(&config)),
            state: StateReporter::new(),
            shutdown: CancellationToken::new(),
            stats: SessionStats::default(),
            config,
        })
    }

    /// Deliver non-ping messages to `handler`.
    #[must_use]
    pub fn on_message(mut self, handler: impl FnMut(&str) + Send + 'static) -> Self {
        self.handler = Box::new(handler);
        self
    }

    /// Decompress inbound frames with `decompressor` instead of gzip.
    #[must_use]
    pub fn with_decompressor(mut self, decompressor: impl Decompress + 'static) -> Self {
        self.dispatcher.set_decompressor(decompressor);
        self
    }

    /// Token that stops the session when cancelled.
    ///
    /// Cancelling aborts any in-flight read, write, connect or backoff,
    /// closes the connection gracefully, and makes [`run`](Self::run)
    /// return `Ok(())`.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Watch lifecycle transitions.
    #[must_use]
    pub fn state_watcher(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.current()
    }

    #[must_use]
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Outbound queue as currently drained.
    #[must_use]
    pub fn queue(&self) -> &OutboundQueue {
        &self.queue
    }

    /// Drive the session until shutdown or until retries run out.
    ///
    /// Failures never escape while retries remain; each one is logged and
    /// followed by a fresh attempt after the reconnect delay.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RetriesExhausted`] once `max_reconnect_attempts`
    /// consecutive attempts have failed. Never returns otherwise, except
    /// `Ok(())` after shutdown.
    #[instrument(name = "session", skip_all, fields(endpoint = %self.endpoint))]
    pub async fn run(&mut self) -> Result<()> {
        let result = self.supervise().await;
        self.state.set(SessionState::Closed);

        match result {
            Err(Error::Cancelled) => {
                info!("session shut down");
                Ok(())
            }
            other => other,
        }
    }

    async fn supervise(&mut self) -> Result<()> {
        loop {
            let error = self.connect_and_serve().await;
            if error.is_cancelled() {
                return Err(error);
            }

            self.stats.failures += 1;
            self.state.set(SessionState::Backoff);
            self.supervisor.backoff(&error, &self.shutdown).await?;
            self.queue.reseed();
        }
    }

    // One connection attempt, served until it fails. Returns the error that
    // ended it.
    async fn connect_and_serve(&mut self) -> Error {
        self.state.set(SessionState::Resolving);

        let ws = tokio::select! {
            biased;
            () = self.shutdown.cancelled() => return Error::Cancelled,
            connected = self.connector.connect(&self.endpoint, &self.state) => match connected {
                Ok(ws) => ws,
                Err(e) => return e,
            },
        };

        self.stats.connects += 1;
        self.supervisor.reset();
        info!(queued = self.queue.remaining(), "session established");

        let mut conn = Connection::new(ws, self.shutdown.child_token());
        let error = match self.serve(&mut conn).await {
            Ok(never) => match never {},
            Err(e) => e,
        };

        conn.cancel();
        if let Err(close_error) = conn.close(self.config.close_timeout).await {
            warn!(error = %close_error, "graceful close failed");
        }
        error
    }

    // Half-duplex exchange: at most one write or read is outstanding.
    async fn serve(&mut self, conn: &mut Connection<C::Io>) -> Result<Infallible> {
        let mut step = self.next_outbound();

        loop {
            step = match step {
                Step::Send(text) => {
                    self.state.set(SessionState::Draining);
                    conn.send_text(text).await?;
                    self.stats.messages_sent += 1;
                    debug!(remaining = self.queue.remaining(), "sent queued message");
                    Step::Receive
                }
                Step::Reply(text) => {
                    self.state.set(SessionState::Draining);
                    conn.send_text(text).await?;
                    self.stats.pongs_sent += 1;
                    Step::Receive
                }
                Step::Receive => {
                    self.state.set(SessionState::Receiving);
                    let frame = conn.recv().await?;
                    self.stats.frames_received += 1;

                    match self.dispatcher.on_receive(&frame)? {
                        Action::ReplyPong(pong) => Step::Reply(pong.to_text()),
                        Action::ContinueDraining(text) => {
                            self.stats.messages_delivered += 1;
                            (self.handler)(&text);
                            self.next_outbound()
                        }
                    }
                }
            };
        }
    }

    fn next_outbound(&mut self) -> Step {
        self.queue.pop_next().map_or(Step::Receive, Step::Send)
    }
}

impl<C: Connect + std::fmt::Debug> std::fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint)
            .field("connector", &self.connector)
            .field("state", &self.state.current())
            .field("queued", &self.queue.remaining())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
