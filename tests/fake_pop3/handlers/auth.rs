//! USER, PASS and AUTH LOGIN handlers.
//!
//! USER/PASS (RFC 1939) sends the credentials in two commands. AUTH
//! LOGIN prompts for the base64-encoded username and password with
//! `+ ` continuation lines; the client's answers arrive as bare lines
//! that are not commands.

use crate::fake_pop3::io::write_line;
use crate::fake_pop3::maildrop::Maildrop;
use crate::fake_pop3::server::Conn;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Where an AUTH LOGIN exchange stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthStep {
    #[default]
    Idle,
    Username,
    Password(String),
}

/// Handle the USER command.
pub async fn handle_user<S: AsyncRead + AsyncWrite + Unpin>(
    args: &[&str],
    conn: &mut Conn,
    stream: &mut BufReader<S>,
) -> std::io::Result<()> {
    match args.first() {
        Some(name) => {
            conn.user = Some((*name).to_string());
            write_line(stream, "+OK send PASS\r\n").await
        }
        None => write_line(stream, "-ERR missing username\r\n").await,
    }
}

/// Handle the PASS command.
pub async fn handle_pass<S: AsyncRead + AsyncWrite + Unpin>(
    args: &[&str],
    conn: &mut Conn,
    snap: &Maildrop,
    stream: &mut BufReader<S>,
) -> std::io::Result<()> {
    let user = conn.user.take();
    let password = args.join(" ");
    if user.as_deref() == Some(snap.username.as_str()) && password == snap.password {
        conn.authenticated = true;
        write_line(stream, "+OK maildrop locked and ready\r\n").await
    } else {
        write_line(stream, "-ERR invalid password\r\n").await
    }
}

/// Handle `AUTH LOGIN`.
pub async fn handle_auth_login<S: AsyncRead + AsyncWrite + Unpin>(
    args: &[&str],
    conn: &mut Conn,
    stream: &mut BufReader<S>,
) -> std::io::Result<()> {
    if args.first().is_some_and(|m| m.eq_ignore_ascii_case("LOGIN")) {
        conn.auth = AuthStep::Username;
        // "Username:"
        write_line(stream, "+ VXNlcm5hbWU6\r\n").await
    } else {
        write_line(stream, "-ERR unsupported mechanism\r\n").await
    }
}

/// Handle one base64 answer during AUTH LOGIN.
pub async fn handle_auth_payload<S: AsyncRead + AsyncWrite + Unpin>(
    line: &str,
    conn: &mut Conn,
    snap: &Maildrop,
    stream: &mut BufReader<S>,
) -> std::io::Result<()> {
    let decoded = STANDARD
        .decode(line)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok());

    match (std::mem::take(&mut conn.auth), decoded) {
        (AuthStep::Username, Some(user)) => {
            conn.auth = AuthStep::Password(user);
            // "Password:"
            write_line(stream, "+ UGFzc3dvcmQ6\r\n").await
        }
        (AuthStep::Password(user), Some(password))
            if user == snap.username && password == snap.password =>
        {
            conn.authenticated = true;
            write_line(stream, "+OK maildrop locked and ready\r\n").await
        }
        _ => write_line(stream, "-ERR authentication failed\r\n").await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_pop3::MaildropBuilder;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn auth_login_walks_both_prompts() {
        let (client, server) = tokio::io::duplex(1024);
        let mut stream = BufReader::new(server);
        let snap = MaildropBuilder::new().build();
        let mut conn = Conn::default();

        handle_auth_login(&["LOGIN"], &mut conn, &mut stream)
            .await
            .unwrap();
        handle_auth_payload("dGVzdHVzZXI=", &mut conn, &snap, &mut stream)
            .await
            .unwrap();
        handle_auth_payload("dGVzdHBhc3M=", &mut conn, &snap, &mut stream)
            .await
            .unwrap();
        drop(stream);

        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut BufReader::new(client), &mut buf)
            .await
            .unwrap();
        let output = String::from_utf8(buf).unwrap();
        assert_eq!(
            output,
            "+ VXNlcm5hbWU6\r\n+ UGFzc3dvcmQ6\r\n+OK maildrop locked and ready\r\n"
        );
        assert!(conn.authenticated);
        assert_eq!(conn.auth, AuthStep::Idle);
    }

    #[tokio::test]
    async fn pass_without_user_fails() {
        let (_client, server) = tokio::io::duplex(1024);
        let mut stream = BufReader::new(server);
        let snap = MaildropBuilder::new().build();
        let mut conn = Conn::default();

        handle_pass(&["testpass"], &mut conn, &snap, &mut stream)
            .await
            .unwrap();
        assert!(!conn.authenticated);
    }
}
