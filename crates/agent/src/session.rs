//! Per-channel conversation sessions.
//!
//! Each `(channel, user)` pair owns one session holding its transcript and
//! a derived customer id. History is capped so a long-lived session cannot
//! grow without bound; the oldest messages are dropped first.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::llm::ChatMessage;

/// Upper bound on retained messages per session (user and assistant
/// messages both count).
pub const MAX_SESSION_MESSAGES: usize = 40;

#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub history: Vec<ChatMessage>,
    pub customer_id: String,
}

#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<(String, String), Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Customer id derived from the channel and user identity, so the same
    /// person gets the same cart across turns on one channel.
    pub fn customer_id(channel: &str, user_id: &str) -> String {
        format!("client_{channel}_{user_id}")
    }

    /// Snapshot of the session for `(channel, user_id)`, creating it lazily.
    pub fn snapshot(&self, channel: &str, user_id: &str) -> Session {
        let mut sessions = self.sessions.lock().expect("session store lock poisoned");
        sessions
            .entry((channel.to_string(), user_id.to_string()))
            .or_insert_with(|| Session {
                history: Vec::new(),
                customer_id: Self::customer_id(channel, user_id),
            })
            .clone()
    }

    /// Appends one user/assistant exchange and trims to the history cap.
    pub fn record_exchange(
        &self,
        channel: &str,
        user_id: &str,
        user_message: &str,
        assistant_reply: &str,
    ) {
        let mut sessions = self.sessions.lock().expect("session store lock poisoned");
        let session = sessions
            .entry((channel.to_string(), user_id.to_string()))
            .or_insert_with(|| Session {
                history: Vec::new(),
                customer_id: Self::customer_id(channel, user_id),
            });

        session.history.push(ChatMessage::user(user_message));
        session.history.push(ChatMessage::assistant(assistant_reply));

        let excess = session.history.len().saturating_sub(MAX_SESSION_MESSAGES);
        if excess > 0 {
            session.history.drain(..excess);
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().expect("session store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
