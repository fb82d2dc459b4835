//! CAPA command handler.
//!
//! Returns the capability list (RFC 2449). STLS is only offered on a
//! connection that is not already encrypted.

use crate::fake_pop3::io::write_multiline;
use crate::fake_pop3::maildrop::Maildrop;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Handle the CAPA command.
pub async fn handle_capa<S: AsyncRead + AsyncWrite + Unpin>(
    snap: &Maildrop,
    tls: bool,
    stream: &mut BufReader<S>,
) -> std::io::Result<()> {
    let body: String = snap
        .capabilities
        .iter()
        .filter(|cap| !(tls && cap.eq_ignore_ascii_case("STLS")))
        .map(|cap| format!("{cap}\r\n"))
        .collect();
    write_multiline(stream, "Capability list follows", body.as_bytes()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_pop3::MaildropBuilder;
    use tokio::io::BufReader;

    async fn run(tls: bool) -> String {
        let (client, server) = tokio::io::duplex(1024);
        let mut stream = BufReader::new(server);
        let snap = MaildropBuilder::new().capabilities(&["TOP", "STLS"]).build();

        handle_capa(&snap, tls, &mut stream).await.unwrap();
        drop(stream);

        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut BufReader::new(client), &mut buf)
            .await
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn sends_capability_list() {
        let output = run(false).await;
        assert_eq!(output, "+OK Capability list follows\r\nTOP\r\nSTLS\r\n.\r\n");
    }

    #[tokio::test]
    async fn hides_stls_over_tls() {
        let output = run(true).await;
        assert!(!output.contains("STLS"));
    }
}
