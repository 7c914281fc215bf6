//! amsel command-line tool.
//!
//! # Usage
//!
//! ```bash
//! export AMSEL_PROFILE=~/.amsel/user.profile AMSEL_PIN=012345678901
//!
//! # Secret files
//! amsel-tool note seal todo.amsn --text "buy milk"
//! amsel-tool note open todo.amsn
//! amsel-tool system seal state.amss --set relay=wss://relay.example
//!
//! # Conversation log (stored in $AMSEL_DATA_DIR/history.redb)
//! amsel-tool log append alice --direction in "hello"
//! amsel-tool log dump alice
//! ```
//!
//! Diagnostics go to stderr; stdout carries only command output.

mod commands;
mod config;

use std::io;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = config::Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    let (config, command) = args.into_parts();
    tracing::debug!(?config, "starting");

    let session = commands::open_session(&config)?;
    let result = commands::run(&session, command, &mut io::stdout().lock());
    session.lock();

    Ok(result?)
}
