//! # wsfeed - Self-reconnecting WebSocket feed client
//!
//! `wsfeed` keeps a long-lived TLS WebSocket session to a market-data style
//! feed: it sends a fixed list of subscription messages, decompresses every
//! inbound frame, answers application-level pings, and reconnects after any
//! failure with the subscriptions replayed from the start.
//!
//! ## Features
//!
//! - **Strictly half-duplex exchange** with one outstanding read or write
//! - **Gzip payloads** decoded through a pluggable [`Decompress`] codec
//! - **Keep-alive replies** that preempt queued messages
//! - **Fixed-delay reconnects** with an optional retry cap
//! - **Cancellable** via a shutdown token, with a graceful close
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wsfeed::{Endpoint, Session, SessionConfig, Subscribe};
//!
//! let trust = wsfeed::tls::webpki_client_config();
//! let messages = [Subscribe::new("market.btcusdt.detail", "id1").to_text()?];
//! let mut session = Session::wss(
//!     Endpoint::new("api.huobi.br.com", "https"),
//!     messages,
//!     trust,
//!     SessionConfig::new(),
//! )?;
//! session.run().await?;
//! ```

pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod message;
pub mod session;
pub mod tls;

pub use codec::{Decompress, Gzip, Identity};
pub use config::{Endpoint, Limits, PingConfig, PingMatch, SessionConfig};
pub use connection::{Connect, Connection, SessionState, StateReporter, WssConnector};
pub use error::{Error, Result};
pub use message::{Pong, Subscribe};
pub use session::{Action, Dispatcher, OutboundQueue, PingDetector, Session, SessionStats};
