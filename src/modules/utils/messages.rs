use std::time::{Duration, Instant};

use crate::MESSAGE_TTL;

/// Identifier handed out for every message, strictly increasing per board
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Error,
}

/// A user-facing message that disappears once its TTL has elapsed
#[derive(Debug, Clone)]
pub struct TimedMessage {
    pub id: MessageId,
    pub kind: MessageKind,
    pub text: String,
    pub expires_at: Instant,
}

impl TimedMessage {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Ephemeral message list. Several messages can be live at once; ids never repeat.
#[derive(Debug)]
pub struct MessageBoard {
    next_id: u64,
    ttl: Duration,
    messages: Vec<TimedMessage>,
}

impl Default for MessageBoard {
    fn default() -> Self {
        Self::new(MESSAGE_TTL)
    }
}

impl MessageBoard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            next_id: 0,
            ttl,
            messages: Vec::new(),
        }
    }

    pub fn info(&mut self, text: impl Into<String>) -> MessageId {
        self.push_at(MessageKind::Info, text, Instant::now())
    }

    pub fn error(&mut self, text: impl Into<String>) -> MessageId {
        self.push_at(MessageKind::Error, text, Instant::now())
    }

    /// Push a message as if it had been posted at `now`
    pub fn push_at(&mut self, kind: MessageKind, text: impl Into<String>, now: Instant) -> MessageId {
        self.next_id += 1;
        let id = MessageId(self.next_id);
        self.messages.push(TimedMessage {
            id,
            kind,
            text: text.into(),
            expires_at: now + self.ttl,
        });
        id
    }

    /// Remove and return every live message, for front ends that print once
    pub fn drain(&mut self, now: Instant) -> Vec<TimedMessage> {
        self.messages.retain(|m| !m.is_expired(now));
        std::mem::take(&mut self.messages)
    }
}
