//! Inbound frame dispatch: decompress, detect keep-alive pings, route.

use std::collections::HashMap;

use serde_json::value::RawValue;
use tracing::debug;

use crate::codec::Decompress;
use crate::config::{PingConfig, PingMatch};
use crate::error::Result;
use crate::message::Pong;

/// What the session does after a frame has been dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Write this reply before anything else.
    ReplyPong(Pong),
    /// Hand the text to the consumer, then send the next queued message or
    /// read.
    ContinueDraining(String),
}

/// Recognises keep-alive pings in decompressed text.
#[derive(Debug, Clone)]
pub struct PingDetector {
    config: PingConfig,
}

impl PingDetector {
    /// Create a detector for the given keys and mode.
    #[must_use]
    pub fn new(config: PingConfig) -> Self {
        Self { config }
    }

    /// Return the reply if `text` is a ping.
    #[must_use]
    pub fn detect(&self, text: &str) -> Option<Pong> {
        if !text.contains(self.config.key.as_str()) {
            return None;
        }

        let value = match self.config.matching {
            PingMatch::Structured => self.structured_value(text)?,
            PingMatch::Substring => Self::substring_value(text)?,
        };
        Some(Pong::new(self.config.reply_key.as_str(), value))
    }

    // Top-level scalar under the ping key, echoed exactly as it was sent.
    fn structured_value(&self, text: &str) -> Option<String> {
        let fields: HashMap<String, &RawValue> = serde_json::from_str(text).ok()?;
        let raw = fields.get(&self.config.key)?.get();

        match raw.as_bytes().first()? {
            b'{' | b'[' => None,
            _ if raw == "null" => None,
            _ => Some(raw.to_string()),
        }
    }

    // Text after the first ':', minus surrounding blanks and closing braces.
    fn substring_value(text: &str) -> Option<String> {
        let (_, rest) = text.split_once(':')?;
        let value = rest.trim().trim_end_matches('}').trim_end();
        (!value.is_empty()).then(|| value.to_string())
    }
}

/// Turns raw inbound frames into session actions.
pub struct Dispatcher {
    decompressor: Box<dyn Decompress>,
    detector: PingDetector,
}

impl Dispatcher {
    /// Create a dispatcher using `decompressor` for every frame.
    pub fn new(decompressor: impl Decompress + 'static, ping: PingConfig) -> Self {
        Self {
            decompressor: Box::new(decompressor),
            detector: PingDetector::new(ping),
        }
    }

    /// Replace the decompressor.
    pub fn set_decompressor(&mut self, decompressor: impl Decompress + 'static) {
        self.decompressor = Box::new(decompressor);
    }

    /// Dispatch one raw frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`](crate::Error::Decode) if the payload does
    /// not decompress into text.
    pub fn on_receive(&self, frame: &[u8]) -> Result<Action> {
        let text = self.decompressor.decompress(frame)?;

        match self.detector.detect(&text) {
            Some(pong) => {
                debug!(value = pong.value(), "keep-alive ping");
                Ok(Action::ReplyPong(pong))
            }
            None => Ok(Action::ContinueDraining(text)),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("detector", &self.detector)
            .finish_non_exhaustive()
    }
}
