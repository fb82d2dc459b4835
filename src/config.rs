//! POP3 connection configuration

use crate::auth::AuthMechanism;
use crate::error::{Error, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How the connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecurityMode {
    /// Cleartext for the whole session.
    Plain,
    /// Connect in cleartext, then upgrade with STLS before
    /// authenticating.
    #[default]
    StartTls,
    /// TLS from the first byte (POP3S).
    Tls,
}

impl SecurityMode {
    /// The IANA-assigned port for this mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Plain | Self::StartTls => 110,
            Self::Tls => 995,
        }
    }

    /// Whether the transport itself must open a TLS stream.
    #[must_use]
    pub const fn is_implicit_tls(self) -> bool {
        matches!(self, Self::Tls)
    }
}

impl FromStr for SecurityMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "plain" | "none" => Ok(Self::Plain),
            "starttls" | "stls" => Ok(Self::StartTls),
            "tls" | "ssl" | "pop3s" => Ok(Self::Tls),
            other => Err(Error::Config(format!("Unknown security mode: {other}"))),
        }
    }
}

/// POP3 connection configuration
#[derive(Debug, Clone)]
pub struct Pop3Config {
    pub host: String,
    pub port: u16,
    pub security: SecurityMode,
    /// Bound on every connect, read, write and TLS handshake.
    pub timeout: Duration,
    /// Skip certificate verification (self-signed servers only).
    pub accept_invalid_certs: bool,
}

impl Pop3Config {
    /// A configuration for `host` using STLS on port 110.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        let security = SecurityMode::default();
        Self {
            host: host.into(),
            port: security.default_port(),
            security,
            timeout: DEFAULT_TIMEOUT,
            accept_invalid_certs: false,
        }
    }

    /// Switch the security mode, moving the port to that mode's
    /// default.
    #[must_use]
    pub const fn with_security(mut self, security: SecurityMode) -> Self {
        self.security = security;
        self.port = security.default_port();
        self
    }

    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Load POP3 configuration from environment variables
    ///
    /// Reads from `.env` file if present. All variables are optional:
    /// - `POP3_HOST` (default: `127.0.0.1`)
    /// - `POP3_SECURITY` (`plain`, `starttls` or `tls`; default: `starttls`)
    /// - `POP3_PORT` (default: 110, or 995 for `tls`)
    /// - `POP3_TIMEOUT_SECS` (default: `30`)
    /// - `POP3_ACCEPT_INVALID_CERTS` (default: `false`)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is set to an invalid
    /// value.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let security = match env::var("POP3_SECURITY") {
            Ok(value) => value.parse()?,
            Err(_) => SecurityMode::default(),
        };
        let port = match env::var("POP3_PORT") {
            Ok(value) => value
                .parse()
                .map_err(|e| Error::Config(format!("Invalid POP3_PORT: {e}")))?,
            Err(_) => security.default_port(),
        };
        let timeout = match env::var("POP3_TIMEOUT_SECS") {
            Ok(value) => Duration::from_secs(
                value
                    .parse()
                    .map_err(|e| Error::Config(format!("Invalid POP3_TIMEOUT_SECS: {e}")))?,
            ),
            Err(_) => DEFAULT_TIMEOUT,
        };
        let accept_invalid_certs = match env::var("POP3_ACCEPT_INVALID_CERTS") {
            Ok(value) => parse_bool(&value)
                .ok_or_else(|| Error::Config(format!("Invalid POP3_ACCEPT_INVALID_CERTS: {value}")))?,
            Err(_) => false,
        };

        Ok(Self {
            host: env::var("POP3_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port,
            security,
            timeout,
            accept_invalid_certs,
        })
    }
}

/// Login credentials for the CLI.
///
/// The session itself never keeps these; they are passed to
/// [`Pop3Session::authenticate`](crate::Pop3Session::authenticate)
/// for the duration of one call.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub mechanism: AuthMechanism,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"****")
            .field("mechanism", &self.mechanism)
            .finish()
    }
}

impl Credentials {
    /// Load credentials from environment variables
    ///
    /// Reads from `.env` file if present. Required variables:
    /// - `POP3_USERNAME`
    /// - `POP3_PASSWORD`
    ///
    /// Optional: `POP3_AUTH` (`plain` or `login`; default: `plain`)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a required variable is missing or
    /// the mechanism is not recognized.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            username: env::var("POP3_USERNAME")
                .map_err(|_| Error::Config("POP3_USERNAME not set".into()))?,
            password: env::var("POP3_PASSWORD")
                .map_err(|_| Error::Config("POP3_PASSWORD not set".into()))?,
            mechanism: match env::var("POP3_AUTH") {
                Ok(value) => value.parse()?,
                Err(_) => AuthMechanism::default(),
            },
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
