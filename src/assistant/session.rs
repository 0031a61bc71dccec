//! Per-session conversation memory.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use rand::Rng;
use serde::Serialize;
use strum::{Display, EnumString};
use time::OffsetDateTime;
use tracing::debug;

/// Who wrote a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Speaker {
    /// The operator.
    User,
    /// The assistant.
    Assistant,
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatTurn {
    /// Author.
    pub speaker: Speaker,
    /// Message text.
    pub text: String,
    /// When the turn was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
}

impl ChatTurn {
    /// Create a turn stamped now.
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
            at: OffsetDateTime::now_utc(),
        }
    }
}

#[derive(Debug, Default)]
struct Session {
    turns: VecDeque<ChatTurn>,
    last_used: u64,
}

/// Conversation store keyed by session id.
///
/// Holds at most `max_sessions` sessions; the least recently used one is
/// evicted when a new session would exceed the limit.
#[derive(Debug)]
pub struct ChatSessions {
    sessions: DashMap<String, Session>,
    clock: AtomicU64,
    turn_limit: usize,
    max_sessions: usize,
}

impl ChatSessions {
    /// Create a store keeping at most `turn_limit` turns per session and
    /// `max_sessions` sessions (minimum 1 each).
    pub fn new(turn_limit: usize, max_sessions: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            clock: AtomicU64::new(0),
            turn_limit: turn_limit.max(1),
            max_sessions: max_sessions.max(1),
        }
    }

    /// Generate a fresh session id.
    pub fn new_session_id() -> String {
        format!("{:016x}", rand::thread_rng().gen::<u64>())
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Append turns to a session, creating it if needed and dropping the oldest
    /// turns beyond the limit.
    pub fn append(&self, session_id: &str, turns: impl IntoIterator<Item = ChatTurn>) {
        {
            let mut session = self.sessions.entry(session_id.to_string()).or_default();
            session.last_used = self.tick();
            for turn in turns {
                if session.turns.len() == self.turn_limit {
                    session.turns.pop_front();
                }
                session.turns.push_back(turn);
            }
        }
        self.evict_excess(session_id);
    }

    fn evict_excess(&self, keep: &str) {
        while self.sessions.len() > self.max_sessions {
            let oldest = self
                .sessions
                .iter()
                .filter(|entry| entry.key() != keep)
                .min_by_key(|entry| entry.value().last_used)
                .map(|entry| entry.key().clone());
            match oldest {
                Some(id) => {
                    self.sessions.remove(&id);
                    debug!(session = %id, "Evicted least recently used chat session");
                }
                None => break,
            }
        }
    }

    /// Turns of a session, oldest first. Counts as a use of the session.
    pub fn history(&self, session_id: &str) -> Option<Vec<ChatTurn>> {
        let mut session = self.sessions.get_mut(session_id)?;
        session.last_used = self.tick();
        Some(session.turns.iter().cloned().collect())
    }

    /// Forget a session. Returns `true` if it existed.
    pub fn remove(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    /// Whether a session exists.
    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// Number of active sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
