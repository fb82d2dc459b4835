//! TOP command handler.
//!
//! Sends the message headers, the blank separator line, and the first
//! N lines of the body.

use crate::fake_pop3::io::{write_line, write_multiline};
use crate::fake_pop3::maildrop::Maildrop;
use crate::fake_pop3::server::message_number;
use std::collections::BTreeSet;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Handle the TOP command.
pub async fn handle_top<S: AsyncRead + AsyncWrite + Unpin>(
    args: &[&str],
    snap: &Maildrop,
    deleted: &BTreeSet<u32>,
    stream: &mut BufReader<S>,
) -> std::io::Result<()> {
    let msg = message_number(args, 0).and_then(|id| snap.visible(id, deleted));
    let (Some(msg), Some(lines)) = (msg, message_number(args, 1)) else {
        return write_line(stream, "-ERR no such message\r\n").await;
    };

    let text = String::from_utf8_lossy(&msg.raw).into_owned();
    let (headers, body) = text
        .split_once("\r\n\r\n")
        .unwrap_or((text.as_str(), ""));
    let mut out = format!("{headers}\r\n\r\n");
    for line in body.split_inclusive("\r\n").take(lines as usize) {
        out.push_str(line);
    }
    write_multiline(stream, "top of message follows", out.as_bytes()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_pop3::MaildropBuilder;
    use tokio::io::BufReader;

    async fn run(args: &[&str]) -> String {
        let (client, server) = tokio::io::duplex(1024);
        let mut stream = BufReader::new(server);
        let snap = MaildropBuilder::new()
            .message("a", b"Subject: hi\r\n\r\nline 1\r\nline 2\r\nline 3\r\n")
            .build();

        handle_top(args, &snap, &BTreeSet::new(), &mut stream)
            .await
            .unwrap();
        drop(stream);

        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut BufReader::new(client), &mut buf)
            .await
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn headers_only() {
        let output = run(&["1", "0"]).await;
        assert_eq!(output, "+OK top of message follows\r\nSubject: hi\r\n\r\n.\r\n");
    }

    #[tokio::test]
    async fn first_body_lines() {
        let output = run(&["1", "2"]).await;
        assert!(output.contains("line 2\r\n"));
        assert!(!output.contains("line 3"));
    }

    #[tokio::test]
    async fn missing_line_count_is_error() {
        assert!(run(&["1"]).await.starts_with("-ERR"));
    }
}
