//! Server capabilities (RFC 2449 CAPA)
//!
//! Each CAPA line is a capability name optionally followed by
//! arguments, e.g. `SASL PLAIN LOGIN` or `EXPIRE 30`. Lines are kept
//! verbatim (right-trimmed) in server order; lookups match the name
//! case-insensitively.

use serde::Serialize;

/// The capability lines advertised by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Capabilities {
    lines: Vec<String>,
}

impl Capabilities {
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add a capability line. Lines already present are ignored.
    pub fn insert(&mut self, line: &str) {
        let line = line.trim_end();
        if line.is_empty() || self.lines.iter().any(|l| l == line) {
            return;
        }
        self.lines.push(line.to_string());
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Whether a capability with this name is advertised.
    #[must_use]
    pub fn supports(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// The arguments following a capability name, if advertised.
    #[must_use]
    pub fn arguments(&self, name: &str) -> Option<Vec<&str>> {
        self.find(name)
            .map(|line| line.split_whitespace().skip(1).collect())
    }

    /// SASL mechanisms listed on the `SASL` line.
    #[must_use]
    pub fn sasl_mechanisms(&self) -> Vec<&str> {
        self.arguments("SASL").unwrap_or_default()
    }

    /// The server's `IMPLEMENTATION` string, if given.
    #[must_use]
    pub fn implementation(&self) -> Option<&str> {
        self.find("IMPLEMENTATION")
            .and_then(|line| line.split_once(' '))
            .map(|(_, rest)| rest.trim())
    }

    /// The capability lines in server order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The lines joined with CRLF, as the server sent them.
    #[must_use]
    pub fn to_raw(&self) -> String {
        self.lines.join("\r\n")
    }

    fn find(&self, name: &str) -> Option<&str> {
        self.lines().find(|line| {
            line.split_whitespace()
                .next()
                .is_some_and(|first| first.eq_ignore_ascii_case(name))
        })
    }
}

/// How [`Pop3Session::capabilities`](crate::Pop3Session::capabilities)
/// should return its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapabilityFormat {
    /// The capability lines joined with CRLF.
    Raw,
    /// A parsed [`Capabilities`] set.
    #[default]
    Structured,
}

/// Result of a CAPA exchange in the requested [`CapabilityFormat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerCapabilities {
    Raw(String),
    Structured(Capabilities),
}
