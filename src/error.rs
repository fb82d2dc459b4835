//! Error types for pop3-client

use crate::state::SessionState;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("{command} is not valid in the {current} state (requires {required})")]
    State {
        command: &'static str,
        required: StateSet,
        current: SessionState,
    },

    #[error("{command} failed: {message}")]
    Protocol {
        command: &'static str,
        message: String,
    },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Server does not support {0}")]
    Capability(String),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn protocol(command: &'static str, message: impl Into<String>) -> Self {
        Self::Protocol {
            command,
            message: message.into(),
        }
    }

    /// Whether this failure came from the underlying connection
    /// rather than from the server's replies.
    ///
    /// After a transport failure the session state is indeterminate;
    /// the caller should close and discard the session.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Io(_) | Self::Tls(_))
    }
}

/// The states a command is permitted in, rendered as `A or B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSet(pub &'static [SessionState]);

impl fmt::Display for StateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, state) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" or ")?;
            }
            write!(f, "{state}")?;
        }
        Ok(())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
