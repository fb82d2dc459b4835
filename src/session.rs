//! POP3 protocol session
//!
//! A [`Pop3Session`] owns one connection and walks it through the
//! RFC 1939 states:
//!
//! ```text
//!   NotConnected --connect--> Authorization --authenticate--> Transaction
//!        ^                          |                              |
//!        +-------- close <-- Update <------------- quit -----------+
//! ```
//!
//! Every command is checked against the states it is permitted in
//! before anything is written to the transport. Commands that depend
//! on an optional server feature (STLS, TOP, UIDL) fetch the CAPA list
//! on first use and fail with [`Error::Capability`] if the feature is
//! not advertised.

use crate::auth::{self, AuthMechanism};
use crate::capability::{Capabilities, CapabilityFormat, ServerCapabilities};
use crate::command::Command;
use crate::config::{Pop3Config, SecurityMode};
use crate::error::{Error, Result};
use crate::response::{
    expect_positive, is_continuation, is_positive, is_terminator, parse_scan_listing, parse_stat,
    parse_uid_listing, status_text, strip_terminator,
};
use crate::state::{SessionState, validate_state};
use crate::transport::{TcpTransport, Transport};
use crate::types::{MailboxStatus, MessageSize, MessageUid};
use tracing::{debug, info, warn};

const NOT_CONNECTED: &[SessionState] = &[SessionState::NotConnected];

/// A POP3 client session over a [`Transport`].
///
/// Operations take `&mut self`, so at most one command is in flight
/// at a time. After a transport error the session state is
/// indeterminate; call [`close`](Self::close) and start over.
pub struct Pop3Session<T: Transport = TcpTransport> {
    transport: T,
    state: SessionState,
    capabilities: Capabilities,
    greeting: Option<String>,
}

impl Pop3Session<TcpTransport> {
    /// A disconnected session over TCP.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_transport(TcpTransport::new())
    }
}

impl Default for Pop3Session<TcpTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Pop3Session<T> {
    /// A disconnected session over a caller-supplied transport.
    #[must_use]
    pub const fn with_transport(transport: T) -> Self {
        Self {
            transport,
            state: SessionState::NotConnected,
            capabilities: Capabilities::new(),
            greeting: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// The text of the server greeting, once connected.
    #[must_use]
    pub fn greeting(&self) -> Option<&str> {
        self.greeting.as_deref()
    }

    /// The capabilities fetched so far, without contacting the server.
    #[must_use]
    pub const fn cached_capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Open the connection and read the server greeting.
    ///
    /// With [`SecurityMode::StartTls`] the connection is upgraded via
    /// STLS before this returns. If the upgrade fails the connection is
    /// closed, so no credentials can follow in plaintext.
    ///
    /// # Errors
    ///
    /// Returns a state error if already connected, a transport error
    /// if the connection or TLS handshake fails, and a protocol error
    /// if the server greets with `-ERR` or refuses STLS.
    pub async fn connect(&mut self, config: &Pop3Config) -> Result<()> {
        validate_state(self.state, NOT_CONNECTED, "CONNECT")?;

        self.transport.connect(config).await?;
        let greeting = match self.transport.receive_line().await {
            Ok(line) => line,
            Err(e) => {
                self.close().await;
                return Err(e);
            }
        };
        debug!("S: {}", strip_terminator(&greeting));

        if !is_positive(&greeting) {
            self.close().await;
            return Err(Error::protocol("CONNECT", status_text(&greeting)));
        }

        self.greeting = Some(status_text(&greeting).to_string());
        self.state = SessionState::Authorization;
        info!("POP3 session open at {}:{}", config.host, config.port);

        if config.security == SecurityMode::StartTls
            && let Err(e) = self.start_tls().await
        {
            warn!("STLS upgrade failed, closing connection: {}", e);
            self.close().await;
            return Err(e);
        }
        Ok(())
    }

    /// Upgrade the connection to TLS with STLS (RFC 2595).
    ///
    /// The cached capability set is discarded afterwards since the
    /// server may advertise different capabilities over TLS. Once the
    /// server has accepted STLS a failed handshake leaves the stream
    /// unusable, so the session is closed.
    ///
    /// # Errors
    ///
    /// Returns a capability error if the server does not advertise
    /// STLS, a protocol error if it refuses the command, and a
    /// transport or TLS error if the handshake fails.
    pub async fn start_tls(&mut self) -> Result<()> {
        validate_state(self.state, Command::Stls.allowed_states(), "STLS")?;
        self.require_capability("STLS").await?;

        self.command(&Command::Stls).await?;
        if let Err(e) = self.transport.start_tls().await {
            self.close().await;
            return Err(e);
        }
        self.capabilities.clear();
        Ok(())
    }

    /// Log in, moving the session to the TRANSACTION state.
    ///
    /// # Errors
    ///
    /// Returns a state error outside AUTHORIZATION, an argument error
    /// for an empty username, and an auth error if the server rejects
    /// the username or password.
    pub async fn authenticate(
        &mut self,
        username: &str,
        password: &str,
        mechanism: AuthMechanism,
    ) -> Result<()> {
        validate_state(self.state, Command::AuthLogin.allowed_states(), "AUTHENTICATE")?;
        if username.is_empty() {
            return Err(Error::Argument("username must not be empty".into()));
        }

        match mechanism {
            AuthMechanism::Plain => self.login_user_pass(username, password).await?,
            AuthMechanism::Login => self.login_sasl(username, password).await?,
        }

        self.state = SessionState::Transaction;
        info!("Authenticated as {} ({})", username, mechanism);
        Ok(())
    }

    async fn login_user_pass(&mut self, username: &str, password: &str) -> Result<()> {
        let reply = self.send_command(&Command::User(username.to_string())).await?;
        if !is_positive(&reply) {
            return Err(auth_error("invalid username", &reply));
        }

        let reply = self.send_command(&Command::Pass(password.to_string())).await?;
        if !is_positive(&reply) {
            return Err(auth_error("invalid password", &reply));
        }
        Ok(())
    }

    async fn login_sasl(&mut self, username: &str, password: &str) -> Result<()> {
        let reply = self.send_command(&Command::AuthLogin).await?;
        if !is_continuation(&reply) {
            return Err(auth_error("AUTH LOGIN refused", &reply));
        }

        let reply = self
            .send_command(&Command::AuthResponse(auth::encode(username)))
            .await?;
        if !is_continuation(&reply) {
            return Err(auth_error("invalid username", &reply));
        }

        let reply = self
            .send_command(&Command::AuthResponse(auth::encode(password)))
            .await?;
        if !is_positive(&reply) {
            return Err(auth_error("invalid password", &reply));
        }
        Ok(())
    }

    /// Fetch the server's capability list with CAPA.
    ///
    /// The cached set is replaced, never appended to.
    ///
    /// # Errors
    ///
    /// Returns a state error unless in AUTHORIZATION or TRANSACTION,
    /// and a protocol error if the server rejects CAPA.
    pub async fn capabilities(&mut self, format: CapabilityFormat) -> Result<ServerCapabilities> {
        self.fetch_capabilities().await?;
        Ok(match format {
            CapabilityFormat::Raw => ServerCapabilities::Raw(self.capabilities.to_raw()),
            CapabilityFormat::Structured => ServerCapabilities::Structured(self.capabilities.clone()),
        })
    }

    /// Fetch capabilities if none have been fetched yet.
    ///
    /// # Errors
    ///
    /// Propagates any failure of the CAPA exchange.
    pub async fn ensure_capabilities_loaded(&mut self) -> Result<()> {
        if self.capabilities.is_empty() {
            self.fetch_capabilities().await?;
        }
        Ok(())
    }

    async fn fetch_capabilities(&mut self) -> Result<()> {
        self.command(&Command::Capa).await?;
        self.capabilities.clear();
        for line in self.read_block().await? {
            self.capabilities.insert(&line);
        }
        debug!("Server capabilities: {:?}", self.capabilities);
        Ok(())
    }

    async fn require_capability(&mut self, name: &str) -> Result<()> {
        self.ensure_capabilities_loaded().await?;
        if self.capabilities.supports(name) {
            Ok(())
        } else {
            Err(Error::Capability(name.to_string()))
        }
    }

    /// Message count and maildrop size from STAT.
    ///
    /// # Errors
    ///
    /// Returns a state error outside TRANSACTION and a protocol error
    /// on a negative or malformed reply.
    pub async fn status(&mut self) -> Result<MailboxStatus> {
        let text = self.command(&Command::Stat).await?;
        parse_stat(&text)
    }

    /// Sizes of all messages not marked as deleted, in server order.
    ///
    /// # Errors
    ///
    /// Returns a state error outside TRANSACTION and a protocol error
    /// on a negative or malformed reply.
    pub async fn list(&mut self) -> Result<Vec<MessageSize>> {
        self.command(&Command::List(None)).await?;
        self.read_block()
            .await?
            .iter()
            .map(String::as_str)
            .map(parse_scan_listing)
            .collect()
    }

    /// Size of a single message.
    ///
    /// # Errors
    ///
    /// Returns a state error outside TRANSACTION, an argument error for
    /// message number 0, and a protocol error if there is no such
    /// message.
    pub async fn list_message(&mut self, id: u32) -> Result<MessageSize> {
        validate_state(self.state, Command::List(None).allowed_states(), "LIST")?;
        check_id(id)?;
        let text = self.command(&Command::List(Some(id))).await?;
        parse_scan_listing(&text)
    }

    /// Download a message.
    ///
    /// The lines of the reply are returned verbatim, CRLFs included.
    ///
    /// # Errors
    ///
    /// Returns a state error outside TRANSACTION, an argument error for
    /// message number 0, and a protocol error if there is no such
    /// message.
    pub async fn retrieve(&mut self, id: u32) -> Result<String> {
        validate_state(self.state, Command::Retr(id).allowed_states(), "RETR")?;
        check_id(id)?;
        self.command(&Command::Retr(id)).await?;
        Ok(self.read_block().await?.concat())
    }

    /// Mark a message for deletion when the session is quit.
    ///
    /// # Errors
    ///
    /// Returns a state error outside TRANSACTION, an argument error for
    /// message number 0, and a protocol error if the message does not
    /// exist or is already deleted.
    pub async fn delete(&mut self, id: u32) -> Result<()> {
        validate_state(self.state, Command::Dele(id).allowed_states(), "DELE")?;
        check_id(id)?;
        self.command(&Command::Dele(id)).await?;
        Ok(())
    }

    /// Unmark all messages marked for deletion.
    ///
    /// # Errors
    ///
    /// Returns a state error outside TRANSACTION and a protocol error
    /// on a negative reply.
    pub async fn reset(&mut self) -> Result<()> {
        self.command(&Command::Rset).await?;
        Ok(())
    }

    /// Keep the connection alive.
    ///
    /// # Errors
    ///
    /// Returns a state error outside TRANSACTION and a protocol error
    /// on a negative reply.
    pub async fn noop(&mut self) -> Result<()> {
        self.command(&Command::Noop).await?;
        Ok(())
    }

    /// Headers of a message plus its first `lines` body lines.
    ///
    /// # Errors
    ///
    /// Returns a state error outside TRANSACTION, an argument error for
    /// message number 0, a capability error if the server does not
    /// advertise TOP, and a protocol error on a negative reply.
    pub async fn top(&mut self, id: u32, lines: u32) -> Result<String> {
        let command = Command::Top { id, lines };
        validate_state(self.state, command.allowed_states(), "TOP")?;
        check_id(id)?;
        self.require_capability("TOP").await?;

        self.command(&command).await?;
        Ok(self.read_block().await?.concat())
    }

    /// Unique ids of all messages not marked as deleted, in server
    /// order.
    ///
    /// # Errors
    ///
    /// Returns a state error outside TRANSACTION, a capability error if
    /// the server does not advertise UIDL, and a protocol error on a
    /// negative or malformed reply.
    pub async fn uidl(&mut self) -> Result<Vec<MessageUid>> {
        validate_state(self.state, Command::Uidl(None).allowed_states(), "UIDL")?;
        self.require_capability("UIDL").await?;

        self.command(&Command::Uidl(None)).await?;
        self.read_block()
            .await?
            .iter()
            .map(String::as_str)
            .map(parse_uid_listing)
            .collect()
    }

    /// Unique id of a single message.
    ///
    /// # Errors
    ///
    /// Returns a state error outside TRANSACTION, an argument error for
    /// message number 0, a capability error if the server does not
    /// advertise UIDL, and a protocol error if there is no such
    /// message.
    pub async fn uidl_message(&mut self, id: u32) -> Result<MessageUid> {
        validate_state(self.state, Command::Uidl(None).allowed_states(), "UIDL")?;
        check_id(id)?;
        self.require_capability("UIDL").await?;

        let text = self.command(&Command::Uidl(Some(id))).await?;
        parse_uid_listing(&text)
    }

    /// End the session.
    ///
    /// The session enters UPDATE as soon as QUIT is sent. Whatever the
    /// server replies, the transport is then closed and the session
    /// returns to NOT CONNECTED.
    ///
    /// # Errors
    ///
    /// Returns a state error unless in AUTHORIZATION or TRANSACTION.
    /// A negative reply or transport failure is reported after the
    /// connection has been closed.
    pub async fn quit(&mut self) -> Result<()> {
        validate_state(self.state, Command::Quit.allowed_states(), "QUIT")?;
        self.state = SessionState::Update;

        let outcome = self.exchange(&Command::Quit).await;
        self.close().await;

        let reply = outcome?;
        if let Err(e) = expect_positive("QUIT", &reply) {
            warn!("Server rejected QUIT: {}", e);
            return Err(e);
        }
        info!("POP3 session closed");
        Ok(())
    }

    /// Drop the connection without sending QUIT.
    ///
    /// Messages marked for deletion are not removed. Use this to
    /// discard a session after a transport error.
    pub async fn close(&mut self) {
        if let Err(e) = self.transport.close().await {
            warn!("Failed to close POP3 transport: {}", e);
        }
        self.state = SessionState::NotConnected;
        self.capabilities.clear();
        self.greeting = None;
    }

    // -- private helpers --

    /// Send a command after checking the session state; returns the
    /// raw status line.
    async fn send_command(&mut self, command: &Command) -> Result<String> {
        validate_state(self.state, command.allowed_states(), command.name())?;
        self.exchange(command).await
    }

    /// Send a command and require a positive reply; returns the text
    /// after `+OK`.
    async fn command(&mut self, command: &Command) -> Result<String> {
        let reply = self.send_command(command).await?;
        expect_positive(command.name(), &reply).map(ToOwned::to_owned)
    }

    async fn exchange(&mut self, command: &Command) -> Result<String> {
        debug!("C: {}", command);
        self.transport.send(&command.to_line()).await?;
        let reply = self.transport.receive_line().await?;
        debug!("S: {}", strip_terminator(&reply));
        Ok(reply)
    }

    /// Read the body of a multiline reply up to, not including, the
    /// terminator line.
    async fn read_block(&mut self) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        loop {
            let line = self.transport.receive_line().await?;
            if is_terminator(&line) {
                return Ok(lines);
            }
            lines.push(line);
        }
    }
}

fn check_id(id: u32) -> Result<()> {
    if id == 0 {
        Err(Error::Argument("message number must be 1 or greater".into()))
    } else {
        Ok(())
    }
}

fn auth_error(what: &str, reply: &str) -> Error {
    let text = status_text(reply);
    if text.is_empty() {
        Error::Auth(what.to_string())
    } else {
        Error::Auth(format!("{what}: {text}"))
    }
}
