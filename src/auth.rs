//! Authentication mechanisms

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;
use std::str::FromStr;

/// How credentials are presented to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMechanism {
    /// RFC 1939 `USER` / `PASS`.
    #[default]
    Plain,
    /// `AUTH LOGIN`: username and password sent base64-encoded in
    /// answer to two continuation prompts.
    Login,
}

impl AuthMechanism {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Login => "login",
        }
    }
}

impl fmt::Display for AuthMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMechanism {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("plain") || s.eq_ignore_ascii_case("user") {
            Ok(Self::Plain)
        } else if s.eq_ignore_ascii_case("login") {
            Ok(Self::Login)
        } else {
            Err(Error::Config(format!(
                "Unsupported authentication mechanism: {s}"
            )))
        }
    }
}

/// Base64-encode a SASL payload.
pub(crate) fn encode(value: &str) -> String {
    STANDARD.encode(value.as_bytes())
}
