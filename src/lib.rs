//! POP3 client library
//!
//! An async client for the Post Office Protocol version 3
//! (RFC 1939) with the CAPA (RFC 2449) and STLS (RFC 2595)
//! extensions. A [`Pop3Session`] connects over plain TCP, implicit
//! TLS, or STLS-upgraded TCP, authenticates with `USER`/`PASS` or
//! `AUTH LOGIN`, and exposes the maildrop commands: STAT, LIST, RETR,
//! DELE, RSET, NOOP, TOP, UIDL and QUIT.
//!
//! Messages are returned as opaque text; no MIME parsing is done.
//!
//! ```no_run
//! use pop3_client::{AuthMechanism, Pop3Config, Pop3Session};
//!
//! # async fn run() -> pop3_client::Result<()> {
//! let config = Pop3Config::new("pop.example.com");
//! let mut session = Pop3Session::new();
//! session.connect(&config).await?;
//! session.authenticate("alice", "secret", AuthMechanism::Plain).await?;
//!
//! let status = session.status().await?;
//! for listing in session.list().await? {
//!     let raw = session.retrieve(listing.id).await?;
//!     println!("{} bytes", raw.len());
//! }
//! println!("{} messages", status.message_count);
//!
//! session.quit().await?;
//! # Ok(())
//! # }
//! ```

mod auth;
mod capability;
mod command;
mod config;
mod error;
pub mod response;
mod session;
mod state;
mod transport;
mod types;

pub use auth::AuthMechanism;
pub use capability::{Capabilities, CapabilityFormat, ServerCapabilities};
pub use command::Command;
pub use config::{Credentials, Pop3Config, SecurityMode};
pub use error::{Error, Result, StateSet};
pub use session::Pop3Session;
pub use state::{SessionState, validate_state};
pub use transport::{TcpTransport, Transport};
pub use types::{MailboxStatus, MessageSize, MessageUid};
