//! Session lifecycle states.

use tokio::sync::watch;
use tracing::trace;

/// Where a session currently is in its connect/serve/reconnect cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum SessionState {
    /// Looking up candidate addresses for the endpoint.
    #[default]
    Resolving,
    /// Opening a TCP connection to one of the candidates.
    Connecting,
    /// Running the TLS client handshake.
    TlsHandshake,
    /// Running the WebSocket upgrade.
    WsHandshake,
    /// Writing an outbound message.
    Draining,
    /// Waiting for an inbound frame.
    Receiving,
    /// Waiting out the reconnect delay after a failure.
    Backoff,
    /// Shut down or gave up; no further attempts.
    Closed,
}

impl SessionState {
    /// Check if a connection attempt is in progress.
    #[must_use]
    #[inline]
    pub const fn is_connecting(&self) -> bool {
        matches!(
            self,
            SessionState::Resolving
                | SessionState::Connecting
                | SessionState::TlsHandshake
                | SessionState::WsHandshake
        )
    }

    /// Check if the WebSocket handshake has completed on the current
    /// connection.
    #[must_use]
    #[inline]
    pub const fn is_established(&self) -> bool {
        matches!(self, SessionState::Draining | SessionState::Receiving)
    }

    /// Check if the session has stopped for good.
    #[must_use]
    #[inline]
    pub const fn is_closed(&self) -> bool {
        matches!(self, SessionState::Closed)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Resolving => write!(f, "Resolving"),
            SessionState::Connecting => write!(f, "Connecting"),
            SessionState::TlsHandshake => write!(f, "TlsHandshake"),
            SessionState::WsHandshake => write!(f, "WsHandshake"),
            SessionState::Draining => write!(f, "Draining"),
            SessionState::Receiving => write!(f, "Receiving"),
            SessionState::Backoff => write!(f, "Backoff"),
            SessionState::Closed => write!(f, "Closed"),
        }
    }
}

/// Publishes state transitions to any number of watchers.
///
/// Publishing never fails, even with no watcher attached.
#[derive(Debug)]
pub struct StateReporter {
    tx: watch::Sender<SessionState>,
}

impl StateReporter {
    /// Create a reporter starting in [`SessionState::Resolving`].
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SessionState::default());
        Self { tx }
    }

    /// Record a transition.
    pub fn set(&self, state: SessionState) {
        let previous = self.tx.send_replace(state);
        if previous != state {
            trace!(from = %previous, to = %state, "session state");
        }
    }

    /// Current state.
    #[must_use]
    pub fn current(&self) -> SessionState {
        *self.tx.borrow()
    }

    /// Subscribe to transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }
}

impl Default for StateReporter {
    fn default() -> Self {
        Self::new()
    }
}
