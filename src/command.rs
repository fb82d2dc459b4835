//! POP3 commands
//!
//! Each command knows its wire form and the session states it may be
//! issued in. `Display` renders a log-safe form with secrets masked.

use crate::state::SessionState;
use std::fmt;

const AUTHORIZATION: &[SessionState] = &[SessionState::Authorization];
const TRANSACTION: &[SessionState] = &[SessionState::Transaction];
const CONNECTED: &[SessionState] = &[SessionState::Authorization, SessionState::Transaction];

/// A client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Capa,
    Stls,
    User(String),
    Pass(String),
    AuthLogin,
    /// A base64 payload answering an AUTH continuation prompt.
    AuthResponse(String),
    Stat,
    List(Option<u32>),
    Retr(u32),
    Dele(u32),
    Rset,
    Noop,
    Top { id: u32, lines: u32 },
    Uidl(Option<u32>),
    Quit,
}

impl Command {
    /// The command keyword, used in logs and errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Capa => "CAPA",
            Self::Stls => "STLS",
            Self::User(_) => "USER",
            Self::Pass(_) => "PASS",
            Self::AuthLogin | Self::AuthResponse(_) => "AUTH",
            Self::Stat => "STAT",
            Self::List(_) => "LIST",
            Self::Retr(_) => "RETR",
            Self::Dele(_) => "DELE",
            Self::Rset => "RSET",
            Self::Noop => "NOOP",
            Self::Top { .. } => "TOP",
            Self::Uidl(_) => "UIDL",
            Self::Quit => "QUIT",
        }
    }

    /// The session states this command may be sent in.
    #[must_use]
    pub const fn allowed_states(&self) -> &'static [SessionState] {
        match self {
            Self::Capa | Self::Quit => CONNECTED,
            Self::Stls | Self::User(_) | Self::Pass(_) | Self::AuthLogin | Self::AuthResponse(_) => {
                AUTHORIZATION
            }
            Self::Stat
            | Self::List(_)
            | Self::Retr(_)
            | Self::Dele(_)
            | Self::Rset
            | Self::Noop
            | Self::Top { .. }
            | Self::Uidl(_) => TRANSACTION,
        }
    }

    /// The line sent to the server, without the trailing CRLF.
    #[must_use]
    pub fn to_line(&self) -> String {
        match self {
            Self::User(name) => format!("USER {name}"),
            Self::Pass(password) => format!("PASS {password}"),
            Self::AuthLogin => "AUTH LOGIN".to_string(),
            Self::AuthResponse(payload) => payload.clone(),
            Self::List(Some(id)) => format!("LIST {id}"),
            Self::Uidl(Some(id)) => format!("UIDL {id}"),
            Self::Retr(id) => format!("RETR {id}"),
            Self::Dele(id) => format!("DELE {id}"),
            Self::Top { id, lines } => format!("TOP {id} {lines}"),
            _ => self.name().to_string(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass(_) => f.write_str("PASS ****"),
            Self::AuthResponse(_) => f.write_str("****"),
            other => f.write_str(&other.to_line()),
        }
    }
}
