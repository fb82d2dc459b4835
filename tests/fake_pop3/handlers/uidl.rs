//! UIDL command handler.
//!
//! Like LIST, but reports each message's persistent unique id instead
//! of its size.

use crate::fake_pop3::io::{write_line, write_multiline};
use crate::fake_pop3::maildrop::Maildrop;
use crate::fake_pop3::server::message_number;
use std::collections::BTreeSet;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Handle the UIDL command.
pub async fn handle_uidl<S: AsyncRead + AsyncWrite + Unpin>(
    args: &[&str],
    snap: &Maildrop,
    deleted: &BTreeSet<u32>,
    stream: &mut BufReader<S>,
) -> std::io::Result<()> {
    if args.is_empty() {
        let body: String = snap
            .listing(deleted)
            .map(|(id, msg)| format!("{id} {}\r\n", msg.uid))
            .collect();
        return write_multiline(stream, "unique-id listing follows", body.as_bytes()).await;
    }

    let resp = match message_number(args, 0)
        .and_then(|id| snap.visible(id, deleted).map(|msg| (id, msg)))
    {
        Some((id, msg)) => format!("+OK {id} {}\r\n", msg.uid),
        None => "-ERR no such message\r\n".to_string(),
    };
    write_line(stream, &resp).await
}
