//! POP3 response classification and parsing
//!
//! Replies are either a single status line (`+OK ...` / `-ERR ...`)
//! or a multiline block: a positive status line, zero or more content
//! lines, and a terminator line consisting of a single period.
//!
//! The functions here work on raw lines as returned by
//! [`Transport::receive_line`](crate::Transport::receive_line), i.e.
//! with their line terminator still attached.

use crate::error::{Error, Result};
use crate::types::{MailboxStatus, MessageSize, MessageUid};

const POSITIVE: &str = "+OK";
const NEGATIVE: &str = "-ERR";
const CONTINUATION: &str = "+ ";

/// Strip a trailing CRLF (or bare LF).
#[must_use]
pub fn strip_terminator(line: &str) -> &str {
    line.strip_suffix('\n')
        .map_or(line, |l| l.strip_suffix('\r').unwrap_or(l))
}

/// True iff the line begins with the positive status marker.
#[must_use]
pub fn is_positive(line: &str) -> bool {
    line.starts_with(POSITIVE)
}

/// True iff the line begins with the negative status marker.
#[must_use]
pub fn is_negative(line: &str) -> bool {
    line.starts_with(NEGATIVE)
}

/// True iff the line is a SASL continuation prompt (`+ <challenge>`).
///
/// Some servers send a bare `+` with no challenge text.
#[must_use]
pub fn is_continuation(line: &str) -> bool {
    let line = strip_terminator(line);
    line == "+" || line.starts_with(CONTINUATION)
}

/// True iff the line, without its terminator, is exactly `.`.
///
/// A content line that merely starts with a period (`.signature`)
/// is not a terminator.
#[must_use]
pub fn is_terminator(line: &str) -> bool {
    strip_terminator(line) == "."
}

/// The human-readable text following the status marker.
#[must_use]
pub fn status_text(line: &str) -> &str {
    let line = strip_terminator(line);
    let rest = line
        .strip_prefix(POSITIVE)
        .or_else(|| line.strip_prefix(NEGATIVE))
        .unwrap_or(line);
    rest.trim_start()
}

/// Turn a status line into `Ok(text)` or a protocol error.
///
/// Anything that is not `+OK` counts as a failure. A line with no
/// status marker at all is reported as an unexpected reply.
///
/// # Errors
///
/// Returns [`Error::Protocol`] carrying the server's text.
pub fn expect_positive<'a>(command: &'static str, line: &'a str) -> Result<&'a str> {
    if is_positive(line) {
        Ok(status_text(line))
    } else if is_negative(line) {
        Err(Error::protocol(command, status_text(line)))
    } else {
        Err(Error::protocol(
            command,
            format!("unexpected reply: {}", strip_terminator(line)),
        ))
    }
}

fn field<T: std::str::FromStr>(
    command: &'static str,
    line: &str,
    value: Option<&str>,
) -> Result<T> {
    value
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| Error::protocol(command, format!("malformed reply: {}", line.trim_end())))
}

/// Parse the text of a `+OK <count> <octets>` STAT reply.
///
/// # Errors
///
/// Returns [`Error::Protocol`] if either field is missing or not a
/// non-negative integer.
pub fn parse_stat(text: &str) -> Result<MailboxStatus> {
    let mut parts = text.split_whitespace();
    Ok(MailboxStatus {
        message_count: field("STAT", text, parts.next())?,
        mailbox_size: field("STAT", text, parts.next())?,
    })
}

/// Parse a `<id> <size>` scan listing, either a LIST block line or
/// the text of a single-message `+OK <id> <size>` reply.
///
/// # Errors
///
/// Returns [`Error::Protocol`] if the line is malformed.
pub fn parse_scan_listing(line: &str) -> Result<MessageSize> {
    let mut parts = line.split_whitespace();
    Ok(MessageSize {
        id: field("LIST", line, parts.next())?,
        size: field("LIST", line, parts.next())?,
    })
}

/// Parse a `<id> <uid>` unique-id listing.
///
/// # Errors
///
/// Returns [`Error::Protocol`] if the line is malformed.
pub fn parse_uid_listing(line: &str) -> Result<MessageUid> {
    let mut parts = line.split_whitespace();
    let id = field("UIDL", line, parts.next())?;
    let uid = parts
        .next()
        .ok_or_else(|| Error::protocol("UIDL", format!("malformed reply: {}", line.trim_end())))?;
    Ok(MessageUid {
        id,
        uid: uid.to_string(),
    })
}
