//! The self-reconnecting session and its parts.
//!
//! - [`OutboundQueue`] holds the messages replayed on every connection
//! - [`Dispatcher`] turns inbound frames into pong replies or consumer text
//! - [`Supervisor`] waits out the reconnect delay and enforces the retry cap
//! - [`Session`] drives all of them over one connection at a time

mod dispatch;
mod queue;
mod supervisor;

#[allow(clippy::module_inception)]
mod session;

pub use dispatch::{Action, Dispatcher, PingDetector};
pub use queue::OutboundQueue;
pub use session::{MessageHandler, Session, SessionStats};
pub use supervisor::{ReconnectPolicy, Supervisor};
