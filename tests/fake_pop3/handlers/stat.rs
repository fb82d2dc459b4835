//! STAT command handler.
//!
//! Replies `+OK <count> <octets>` over the messages not marked as
//! deleted.

use crate::fake_pop3::io::write_line;
use crate::fake_pop3::maildrop::Maildrop;
use std::collections::BTreeSet;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Handle the STAT command.
pub async fn handle_stat<S: AsyncRead + AsyncWrite + Unpin>(
    snap: &Maildrop,
    deleted: &BTreeSet<u32>,
    stream: &mut BufReader<S>,
) -> std::io::Result<()> {
    let (count, octets) = snap
        .listing(deleted)
        .fold((0, 0), |(count, octets), (_, msg)| {
            (count + 1, octets + msg.raw.len())
        });
    write_line(stream, &format!("+OK {count} {octets}\r\n")).await
}
