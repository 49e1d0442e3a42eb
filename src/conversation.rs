//! Transient conversation sessions.
//!
//! Process-local, in-memory message history keyed by session id. Nothing
//! here is durable: a restart loses every session, which is acceptable for
//! a chat UI that only uses the history to give the LLM short-range context.
//! Expired sessions are pruned opportunistically on write.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

/// Messages kept per session; older ones are dropped.
const MAX_MESSAGES: usize = 20;

/// Sessions untouched for this long are pruned.
const SESSION_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    fn label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone)]
struct Message {
    role: Role,
    content: String,
}

#[derive(Debug)]
struct Session {
    messages: Vec<Message>,
    last_updated: SystemTime,
}

/// Shared in-memory store of all active sessions.
#[derive(Debug, Default)]
pub struct ConversationStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message, trimming the session to [`MAX_MESSAGES`] and
    /// pruning expired sessions while the lock is held.
    pub fn push(&self, session_id: &str, role: Role, content: &str) {
        let mut sessions = self.sessions.lock().unwrap();

        sessions.retain(|_, s| {
            s.last_updated
                .elapsed()
                .map(|age| age < SESSION_TIMEOUT)
                .unwrap_or(true)
        });

        let session = sessions.entry(session_id.to_string()).or_insert(Session {
            messages: Vec::new(),
            last_updated: SystemTime::now(),
        });

        session.messages.push(Message {
            role,
            content: content.to_string(),
        });
        session.last_updated = SystemTime::now();

        if session.messages.len() > MAX_MESSAGES {
            let excess = session.messages.len() - MAX_MESSAGES;
            session.messages.drain(..excess);
        }
    }

    /// Formats the last `max_messages` messages for inclusion in a prompt.
    /// Returns an empty string for unknown or empty sessions.
    pub fn context(&self, session_id: &str, max_messages: usize) -> String {
        let sessions = self.sessions.lock().unwrap();
        let Some(session) = sessions.get(session_id) else {
            return String::new();
        };

        let skip = session.messages.len().saturating_sub(max_messages);
        session.messages[skip..]
            .iter()
            .map(|m| format!("{}: {}", m.role.label(), m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Drops a session's history. Returns whether the session existed.
    pub fn clear(&self, session_id: &str) -> bool {
        self.sessions.lock().unwrap().remove(session_id).is_some()
    }

    /// Number of messages currently held for a session.
    pub fn message_count(&self, session_id: &str) -> usize {
        self.sessions
            .lock()
            .unwrap()
            .get(session_id)
            .map(|s| s.messages.len())
            .unwrap_or(0)
    }

    #[cfg(test)]
    fn backdate(&self, session_id: &str, age: Duration) {
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(session) = sessions.get_mut(session_id) {
            session.last_updated = SystemTime::now() - age;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_context() {
        let store = ConversationStore::new();
        store.push("s1", Role::User, "Show Labor earmarks");
        store.push("s1", Role::Assistant, "Found 12 earmarks.");

        let context = store.context("s1", 6);
        assert_eq!(
            context,
            "User: Show Labor earmarks\nAssistant: Found 12 earmarks."
        );
    }

    #[test]
    fn test_context_limited_to_last_k() {
        let store = ConversationStore::new();
        for i in 0..10 {
            store.push("s1", Role::User, &format!("question {}", i));
        }

        let context = store.context("s1", 3);
        assert_eq!(
            context,
            "User: question 7\nUser: question 8\nUser: question 9"
        );
    }

    #[test]
    fn test_messages_trimmed_to_cap() {
        let store = ConversationStore::new();
        for i in 0..50 {
            store.push("s1", Role::User, &format!("q{}", i));
        }
        assert_eq!(store.message_count("s1"), MAX_MESSAGES);

        // Oldest messages are the ones dropped
        let context = store.context("s1", MAX_MESSAGES);
        assert!(context.starts_with("User: q30"));
    }

    #[test]
    fn test_clear() {
        let store = ConversationStore::new();
        store.push("s1", Role::User, "hello");
        assert!(store.clear("s1"));
        assert!(!store.clear("s1"));
        assert_eq!(store.context("s1", 6), "");
    }

    #[test]
    fn test_unknown_session_empty_context() {
        let store = ConversationStore::new();
        assert_eq!(store.context("nope", 6), "");
    }

    #[test]
    fn test_expired_sessions_pruned_on_write() {
        let store = ConversationStore::new();
        store.push("old", Role::User, "stale");
        store.backdate("old", SESSION_TIMEOUT + Duration::from_secs(1));

        store.push("fresh", Role::User, "hello");
        assert_eq!(store.message_count("old"), 0);
        assert_eq!(store.message_count("fresh"), 1);
    }
}
