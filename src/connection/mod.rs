//! Connection setup and the per-connection transport.
//!
//! ## Connection Lifecycle
//!
//! 1. **Resolving** - host/service lookup
//! 2. **Connecting** - TCP connect to the first reachable candidate
//! 3. **TlsHandshake** - client handshake against the trust context
//! 4. **WsHandshake** - upgrade on the fixed resource path
//! 5. **Draining / Receiving** - half-duplex exchange on the [`Connection`]
//!
//! Any failure discards the connection; the next attempt starts again at
//! step 1 with a new one.

mod connector;
mod state;

#[allow(clippy::module_inception)]
mod connection;

pub use connection::Connection;
pub use connector::{Connect, WssConnector, connect_tcp, resolve};
pub use state::{SessionState, StateReporter};
