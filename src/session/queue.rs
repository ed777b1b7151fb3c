//! Outbound message queue with a replayable template.

use std::collections::VecDeque;

/// FIFO of outbound text messages.
///
/// Keeps the original messages as an immutable template next to the working
/// queue that draining consumes. The working queue is never longer than the
/// template, and [`reseed`](Self::reseed) restores it to a full copy no
/// matter how much was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundQueue {
    template: Vec<String>,
    working: VecDeque<String>,
}

impl OutboundQueue {
    /// Create a queue whose working copy starts full.
    pub fn new<I, T>(messages: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let template: Vec<String> = messages.into_iter().map(Into::into).collect();
        let working = template.iter().cloned().collect();
        Self { template, working }
    }

    /// Take the next pending message.
    pub fn pop_next(&mut self) -> Option<String> {
        self.working.pop_front()
    }

    /// Refill the working queue from the template.
    pub fn reseed(&mut self) {
        self.working.clear();
        self.working.extend(self.template.iter().cloned());
    }

    /// Messages still waiting to be sent.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.working.len()
    }

    /// Check if everything has been sent since the last reseed.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.working.is_empty()
    }

    /// The original messages, in order.
    #[must_use]
    pub fn template(&self) -> &[String] {
        &self.template
    }

    /// Pending messages, front first.
    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.working.iter().map(String::as_str)
    }
}
