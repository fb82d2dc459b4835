//! Line transport for POP3 sessions
//!
//! [`Transport`] is the byte-stream seam under
//! [`Pop3Session`](crate::Pop3Session): open a connection, exchange
//! CRLF-terminated lines, upgrade to TLS in place, close.
//! [`TcpTransport`] implements it over `tokio` TCP with `rustls`.

use crate::config::Pop3Config;
use crate::error::{Error, Result};
use rustls::pki_types::ServerName;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, ReadBuf,
};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tracing::{debug, info};

/// Longest line accepted from the server, terminator included.
const MAX_LINE_LEN: usize = 1024 * 1024;

/// A line-oriented connection to a POP3 server.
///
/// Implementations report failures as transport-class errors
/// ([`Error::is_transport`]).
pub trait Transport: Send {
    /// Open a connection to `config.host:config.port`, with TLS from
    /// the start if the security mode is implicit TLS.
    fn connect(&mut self, config: &Pop3Config) -> impl Future<Output = Result<()>> + Send;

    fn is_connected(&self) -> bool;

    /// Write `line` followed by CRLF.
    fn send(&mut self, line: &str) -> impl Future<Output = Result<()>> + Send;

    /// Read the next line, including its terminator.
    fn receive_line(&mut self) -> impl Future<Output = Result<String>> + Send;

    /// Upgrade the open plaintext stream to TLS.
    fn start_tls(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Close the connection. Closing a closed transport is a no-op.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// A stream that can be either plaintext or TLS.
enum Pop3Stream {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl AsyncRead for Pop3Stream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Pop3Stream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Self::Tls(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Tls(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

/// TCP transport with optional TLS.
pub struct TcpTransport {
    stream: Option<BufReader<Pop3Stream>>,
    host: String,
    timeout: Duration,
    accept_invalid_certs: bool,
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl TcpTransport {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stream: None,
            host: String::new(),
            timeout: Duration::from_secs(30),
            accept_invalid_certs: false,
        }
    }

    /// Whether the open stream is TLS-encrypted.
    #[must_use]
    pub fn is_tls(&self) -> bool {
        self.stream
            .as_ref()
            .is_some_and(|reader| matches!(reader.get_ref(), Pop3Stream::Tls(_)))
    }

    fn stream_mut(&mut self) -> Result<&mut BufReader<Pop3Stream>> {
        self.stream
            .as_mut()
            .ok_or_else(|| Error::Transport("not connected".into()))
    }

    fn handshake(&self, tcp: TcpStream) -> impl Future<Output = Result<TlsStream<TcpStream>>> + Send {
        handshake(
            self.host.clone(),
            self.timeout,
            self.accept_invalid_certs,
            tcp,
        )
    }
}

async fn handshake(
    host: String,
    limit: Duration,
    accept_invalid_certs: bool,
    tcp: TcpStream,
) -> Result<TlsStream<TcpStream>> {
    let connector = tls_connector(accept_invalid_certs)?;
    let server_name = ServerName::try_from(host)
        .map_err(|e| Error::Tls(format!("Invalid server name: {e}")))?;

    tokio::time::timeout(limit, connector.connect(server_name, tcp))
        .await
        .map_err(|_| Error::Transport(format!("TLS handshake timed out after {limit:?}")))?
        .map_err(|e| Error::Tls(e.to_string()))
}

impl Transport for TcpTransport {
    async fn connect(&mut self, config: &Pop3Config) -> Result<()> {
        self.host.clone_from(&config.host);
        self.timeout = config.timeout;
        self.accept_invalid_certs = config.accept_invalid_certs;

        let addr = format!("{}:{}", config.host, config.port);
        debug!("Connecting to POP3 server at {}", addr);

        let tcp = bounded(self.timeout, "connect", TcpStream::connect(&addr)).await?;
        let stream = if config.security.is_implicit_tls() {
            Pop3Stream::Tls(Box::new(self.handshake(tcp).await?))
        } else {
            Pop3Stream::Plain(tcp)
        };

        self.stream = Some(BufReader::new(stream));
        info!("Connected to POP3 server at {}", addr);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn send(&mut self, line: &str) -> Result<()> {
        let timeout = self.timeout;
        let writer = self.stream_mut()?.get_mut();
        let data = format!("{line}\r\n");
        bounded(timeout, "write", async {
            writer.write_all(data.as_bytes()).await?;
            writer.flush().await
        })
        .await
    }

    async fn receive_line(&mut self) -> Result<String> {
        let timeout = self.timeout;
        let reader = self.stream_mut()?;
        let mut buf = Vec::new();
        let mut limited = reader.take(MAX_LINE_LEN as u64);
        let n = bounded(timeout, "read", limited.read_until(b'\n', &mut buf)).await?;
        if n == 0 {
            return Err(Error::Transport("connection closed by server".into()));
        }
        if buf.last() != Some(&b'\n') && n == MAX_LINE_LEN {
            return Err(Error::Transport(format!(
                "server line exceeds {MAX_LINE_LEN} bytes"
            )));
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    async fn start_tls(&mut self) -> Result<()> {
        let mut reader = self
            .stream
            .take()
            .ok_or_else(|| Error::Transport("not connected".into()))?;
        if !reader.buffer().is_empty() {
            if let Err(e) = reader.get_mut().shutdown().await {
                debug!("Error shutting down POP3 stream: {}", e);
            }
            return Err(Error::Tls("server sent data before the TLS handshake".into()));
        }

        match reader.into_inner() {
            Pop3Stream::Plain(tcp) => {
                let tls = self.handshake(tcp).await?;
                self.stream = Some(BufReader::new(Pop3Stream::Tls(Box::new(tls))));
                info!("Upgraded connection to TLS");
                Ok(())
            }
            tls @ Pop3Stream::Tls(_) => {
                self.stream = Some(BufReader::new(tls));
                Err(Error::Tls("stream is already TLS".into()))
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut reader) = self.stream.take() {
            if let Err(e) = reader.get_mut().shutdown().await {
                debug!("Error shutting down POP3 stream: {}", e);
            }
            debug!("Closed POP3 connection to {}", self.host);
        }
        Ok(())
    }
}

async fn bounded<T: Send>(
    limit: Duration,
    what: &str,
    fut: impl Future<Output = io::Result<T>> + Send,
) -> Result<T> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| Error::Transport(format!("{what} timed out after {limit:?}")))?
        .map_err(Error::from)
}

/// Build a TLS connector, verifying against the webpki roots unless
/// `accept_invalid_certs` is set.
fn tls_connector(accept_invalid_certs: bool) -> Result<TlsConnector> {
    let builder = rustls::ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .map_err(|e| Error::Tls(e.to_string()))?;

    let config = if accept_invalid_certs {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(DangerousVerifier))
            .with_no_client_auth()
    } else {
        let roots = rustls::RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };
        builder.with_root_certificates(roots).with_no_client_auth()
    };
    Ok(TlsConnector::from(Arc::new(config)))
}

/// Certificate verifier that accepts all certificates
/// (for self-signed servers).
#[derive(Debug)]
struct DangerousVerifier;

impl rustls::client::danger::ServerCertVerifier for DangerousVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}
