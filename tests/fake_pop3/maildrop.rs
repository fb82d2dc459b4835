//! Test data model for the fake POP3 server
//!
//! Provides a builder-style API for constructing maildrop state:
//!
//! ```ignore
//! let maildrop = MaildropBuilder::new()
//!     .credentials("testuser", "testpass")
//!     .message("uid-1", raw_rfc5322_bytes)
//!     .message("uid-2", raw_rfc5322_bytes)
//!     .build();
//! ```
//!
//! The `Maildrop` is shared with the fake server via `Arc<Mutex<_>>`
//! so deletions committed by one session's QUIT are visible to the
//! next session.

use std::collections::BTreeSet;

/// Capabilities advertised unless a test overrides them.
pub const DEFAULT_CAPABILITIES: &[&str] = &[
    "TOP",
    "USER",
    "UIDL",
    "SASL LOGIN",
    "STLS",
    "IMPLEMENTATION FakePop3",
];

/// A single user's maildrop plus the server's advertised features.
#[derive(Debug, Clone)]
pub struct Maildrop {
    pub username: String,
    pub password: String,
    pub capabilities: Vec<String>,
    pub messages: Vec<TestMessage>,
}

/// A message in the maildrop.
///
/// - `uid`: the UIDL unique id, stable across sessions.
/// - `raw`: the complete message (headers + body) as bytes. Its
///   length is the size reported by STAT and LIST.
#[derive(Debug, Clone)]
pub struct TestMessage {
    pub uid: String,
    pub raw: Vec<u8>,
}

impl Maildrop {
    /// Look up message number `id` (1-based), skipping messages the
    /// current session has marked as deleted.
    pub fn visible(&self, id: u32, deleted: &BTreeSet<u32>) -> Option<&TestMessage> {
        if deleted.contains(&id) {
            return None;
        }
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.messages.get(index)
    }

    /// All visible messages with their message numbers.
    pub fn listing<'a>(
        &'a self,
        deleted: &'a BTreeSet<u32>,
    ) -> impl Iterator<Item = (u32, &'a TestMessage)> + 'a {
        (1u32..)
            .zip(self.messages.iter())
            .filter(move |(id, _)| !deleted.contains(id))
    }

    /// Remove the messages marked as deleted (the UPDATE state).
    pub fn expunge(&mut self, deleted: &BTreeSet<u32>) {
        let mut id = 0u32;
        self.messages.retain(|_| {
            id += 1;
            !deleted.contains(&id)
        });
    }
}

/// Builder for constructing a `Maildrop` step by step.
pub struct MaildropBuilder {
    maildrop: Maildrop,
}

impl MaildropBuilder {
    pub fn new() -> Self {
        Self {
            maildrop: Maildrop {
                username: "testuser".to_string(),
                password: "testpass".to_string(),
                capabilities: DEFAULT_CAPABILITIES
                    .iter()
                    .map(|c| (*c).to_string())
                    .collect(),
                messages: Vec::new(),
            },
        }
    }

    /// Set the credentials the server accepts.
    pub fn credentials(mut self, username: &str, password: &str) -> Self {
        self.maildrop.username = username.to_string();
        self.maildrop.password = password.to_string();
        self
    }

    /// Replace the advertised capability list.
    pub fn capabilities(mut self, caps: &[&str]) -> Self {
        self.maildrop.capabilities = caps.iter().map(|c| (*c).to_string()).collect();
        self
    }

    /// Append a message; it gets the next message number.
    pub fn message(mut self, uid: &str, raw: &[u8]) -> Self {
        self.maildrop.messages.push(TestMessage {
            uid: uid.to_string(),
            raw: raw.to_vec(),
        });
        self
    }

    /// Consume the builder and return the finished `Maildrop`.
    pub fn build(self) -> Maildrop {
        self.maildrop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Maildrop {
        MaildropBuilder::new()
            .message("a", b"one")
            .message("b", b"two")
            .message("c", b"three")
            .build()
    }

    #[test]
    fn numbers_are_one_based() {
        let drop = sample();
        let none = BTreeSet::new();
        assert!(drop.visible(0, &none).is_none());
        assert_eq!(drop.visible(1, &none).unwrap().uid, "a");
        assert!(drop.visible(4, &none).is_none());
    }

    #[test]
    fn deleted_messages_are_hidden_then_expunged() {
        let mut drop = sample();
        let deleted = BTreeSet::from([2]);
        assert!(drop.visible(2, &deleted).is_none());
        let ids: Vec<u32> = drop.listing(&deleted).map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1, 3]);

        drop.expunge(&deleted);
        let uids: Vec<&str> = drop.messages.iter().map(|m| m.uid.as_str()).collect();
        assert_eq!(uids, vec!["a", "c"]);
    }
}
