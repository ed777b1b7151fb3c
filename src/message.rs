//! Outbound payloads: topic subscriptions and keep-alive replies.

use serde::Serialize;

use crate::error::{Error, Result};

/// A topic subscription request, `{"sub": "<topic>", "id": "<id>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subscribe {
    /// Topic to subscribe to, e.g. `market.btcusdt.detail`.
    pub sub: String,
    /// Client-chosen correlation id echoed by the server.
    pub id: String,
}

impl Subscribe {
    /// Create a subscription for `topic` tagged with `id`.
    #[must_use]
    pub fn new(topic: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            sub: topic.into(),
            id: id.into(),
        }
    }

    /// Serialize into the text frame body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if serialization fails.
    pub fn to_text(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

/// Reply to an application-level ping.
///
/// Rendered as `{"<key>": <value>}` where `value` is the raw text captured
/// from the ping, inserted without quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pong {
    key: String,
    value: String,
}

impl Pong {
    /// Create a reply under `key` carrying `value` verbatim.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// The captured ping value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Render the text frame body.
    #[must_use]
    pub fn to_text(&self) -> String {
        format!("{{\"{}\": {}}}", self.key, self.value)
    }
}

impl std::fmt::Display for Pong {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_to_text() {
        let sub = Subscribe::new("market.btcusdt.detail", "id1");
        assert_eq!(
            sub.to_text().unwrap(),
            r#"{"sub":"market.btcusdt.detail","id":"id1"}"#
        );
    }

    #[test]
    fn test_subscribe_escapes_topic() {
        let sub = Subscribe::new("a\"b", "1");
        let value: serde_json::Value = serde_json::from_str(&sub.to_text().unwrap()).unwrap();
        assert_eq!(value["sub"], "a\"b");
    }

    #[test]
    fn test_pong_to_text() {
        let pong = Pong::new("pong", "1690000000000");
        assert_eq!(pong.to_text(), r#"{"pong": 1690000000000}"#);
        assert_eq!(pong.to_string(), pong.to_text());
        assert_eq!(pong.value(), "1690000000000");
    }
}
