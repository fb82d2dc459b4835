//! Parsed POP3 replies

use serde::Serialize;

/// Maildrop summary from STAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MailboxStatus {
    pub message_count: u32,
    pub mailbox_size: u64,
}

/// A scan listing from LIST: message number and size in octets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MessageSize {
    pub id: u32,
    pub size: u64,
}

/// A unique-id listing from UIDL.
///
/// Unlike message numbers, which are only valid for one session, the
/// unique id identifies a message across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageUid {
    pub id: u32,
    pub uid: String,
}
