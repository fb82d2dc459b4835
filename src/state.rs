//! POP3 session states
//!
//! RFC 1939 moves a session through AUTHORIZATION, TRANSACTION and
//! UPDATE. `NotConnected` covers the time before `connect()` and after
//! the transport has been closed.

use crate::error::{Error, Result, StateSet};
use std::fmt;

/// The state a [`Pop3Session`](crate::Pop3Session) is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// No transport is open.
    #[default]
    NotConnected,
    /// Greeting received, credentials not yet accepted.
    Authorization,
    /// Authenticated; the maildrop is locked and can be inspected.
    Transaction,
    /// QUIT has been sent; the server commits deletions.
    Update,
}

impl SessionState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotConnected => "NOT CONNECTED",
            Self::Authorization => "AUTHORIZATION",
            Self::Transaction => "TRANSACTION",
            Self::Update => "UPDATE",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check that `current` is one of the states `command` is permitted in.
///
/// # Errors
///
/// Returns [`Error::State`] naming the command, the permitted states
/// and the current state.
pub fn validate_state(
    current: SessionState,
    allowed: &'static [SessionState],
    command: &'static str,
) -> Result<()> {
    if allowed.contains(&current) {
        Ok(())
    } else {
        Err(Error::State {
            command,
            required: StateSet(allowed),
            current,
        })
    }
}
