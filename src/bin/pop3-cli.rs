#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI for inspecting a POP3 maildrop

use clap::{Parser, Subcommand};
use pop3_client::{
    CapabilityFormat, Credentials, MessageSize, MessageUid, Pop3Config, Pop3Session,
    ServerCapabilities,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pop3-cli")]
#[command(about = "Inspect and retrieve mail from a POP3 server")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Show the server's capabilities
    Capa,

    /// Show message count and maildrop size
    Stat,

    /// List message sizes
    List {
        /// Message number (all messages if omitted)
        id: Option<u32>,
    },

    /// Print a whole message
    Retr {
        /// Message number
        id: u32,
    },

    /// Print a message's headers and first body lines
    Top {
        /// Message number
        id: u32,

        /// Number of body lines
        #[arg(default_value = "0")]
        lines: u32,
    },

    /// List unique message ids
    Uidl {
        /// Message number (all messages if omitted)
        id: Option<u32>,
    },

    /// Delete a message (committed when the session ends)
    Dele {
        /// Message number
        id: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Pop3Config::from_env()?;
    let credentials = Credentials::from_env()?;

    let mut session = Pop3Session::new();
    session.connect(&config).await?;

    if let Err(e) = session
        .authenticate(
            &credentials.username,
            &credentials.password,
            credentials.mechanism,
        )
        .await
    {
        session.quit().await.ok();
        return Err(e.into());
    }

    let outcome = run(&mut session, &args).await;
    let quit = session.quit().await;
    outcome?;
    quit?;

    Ok(())
}

async fn run(session: &mut Pop3Session, args: &Args) -> anyhow::Result<()> {
    match &args.command {
        Command::Capa => cmd_capa(session, args).await,
        Command::Stat => {
            let status = session.status().await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!(
                    "{} message(s), {} octets",
                    status.message_count, status.mailbox_size
                );
            }
            Ok(())
        }
        Command::List { id } => {
            let listings = match id {
                Some(id) => vec![session.list_message(*id).await?],
                None => session.list().await?,
            };
            print_sizes(&listings, args.json)
        }
        Command::Retr { id } => {
            print!("{}", session.retrieve(*id).await?);
            Ok(())
        }
        Command::Top { id, lines } => {
            print!("{}", session.top(*id, *lines).await?);
            Ok(())
        }
        Command::Uidl { id } => {
            let uids = match id {
                Some(id) => vec![session.uidl_message(*id).await?],
                None => session.uidl().await?,
            };
            print_uids(&uids, args.json)
        }
        Command::Dele { id } => {
            session.delete(*id).await?;
            println!("Message {id} marked for deletion");
            Ok(())
        }
    }
}

async fn cmd_capa(session: &mut Pop3Session, args: &Args) -> anyhow::Result<()> {
    match session.capabilities(CapabilityFormat::Structured).await? {
        ServerCapabilities::Structured(caps) if args.json => {
            println!("{}", serde_json::to_string_pretty(&caps)?);
        }
        ServerCapabilities::Structured(caps) => {
            for line in caps.lines() {
                println!("{line}");
            }
        }
        ServerCapabilities::Raw(raw) => println!("{raw}"),
    }
    Ok(())
}

fn print_sizes(listings: &[MessageSize], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(listings)?);
        return Ok(());
    }
    if listings.is_empty() {
        println!("No messages.");
        return Ok(());
    }

    println!("{:<8} {:>12}", "ID", "Octets");
    println!("{}", "-".repeat(21));
    for listing in listings {
        println!("{:<8} {:>12}", listing.id, listing.size);
    }
    println!("\n{} message(s)", listings.len());
    Ok(())
}

fn print_uids(uids: &[MessageUid], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(uids)?);
        return Ok(());
    }
    if uids.is_empty() {
        println!("No messages.");
        return Ok(());
    }

    for entry in uids {
        println!("{:<8} {}", entry.id, entry.uid);
    }
    Ok(())
}
