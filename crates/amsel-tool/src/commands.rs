//! Subcommand execution against an unlocked session.

use std::{
    fs,
    io::{self, Write},
};

use amsel_client::{
    ClientError, Environment, LogBody, LogStore, RedbLogStore, Session, SystemEnv, SystemPayload,
};
use thiserror::Error;

use crate::config::{Command, LogCommand, NoteCommand, SystemCommand, ToolConfig};

/// Errors surfaced to the user.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Session operation failed
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Reading input or writing output failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Session type the binary runs with.
pub type ToolSession = Session<SystemEnv, RedbLogStore>;

/// Open the log database under the data directory and unlock the profile.
pub fn open_session(config: &ToolConfig) -> Result<ToolSession, ToolError> {
    fs::create_dir_all(&config.data_dir)?;
    let store = RedbLogStore::open(config.log_path()).map_err(ClientError::from)?;

    let session = Session::new(SystemEnv::new(), store);
    session.unlock_from_file(config.profile(), &config.pin)?;

    tracing::info!(data_dir = %config.data_dir.display(), "session unlocked");
    Ok(session)
}

/// Run `command`, writing user-facing output to `out`.
pub fn run<E: Environment, S: LogStore>(
    session: &Session<E, S>,
    command: Command,
    out: &mut impl Write,
) -> Result<(), ToolError> {
    match command {
        Command::Note(NoteCommand::Seal { path, text }) => {
            let text = match text {
                Some(text) => text,
                None => io::read_to_string(io::stdin())?,
            };
            session.save_note(&path, &text)?;
            tracing::info!(path = %path.display(), "note sealed");
        },
        Command::Note(NoteCommand::Open { path }) => {
            writeln!(out, "{}", session.load_note(&path)?)?;
        },
        Command::System(SystemCommand::Seal { path, entries }) => {
            let payload: SystemPayload = entries.into_iter().collect();
            session.create_system_container(&path, &payload)?;
            tracing::info!(
                path = %path.display(),
                entries = payload.len(),
                "system container sealed"
            );
        },
        Command::System(SystemCommand::Open { path }) => {
            for (key, value) in session.load_system_container(&path)?.iter() {
                writeln!(out, "{key}={value}")?;
            }
        },
        Command::Log(LogCommand::Append { conversation, direction, text }) => {
            let entry = session.append_to_log(&conversation, direction.into(), &text)?;
            writeln!(out, "{}", entry.counter)?;
        },
        Command::Log(LogCommand::Dump { conversation }) => {
            for record in session.read_log(&conversation)? {
                match record.body {
                    LogBody::Text(text) => {
                        writeln!(out, "{}\t{}\t{text}", record.direction, record.counter)?;
                    },
                    LogBody::Unreadable => {
                        writeln!(out, "{}\t{}\t<unreadable>", record.direction, record.counter)?;
                    },
                }
            }
        },
        Command::Log(LogCommand::List) => {
            for conversation in session.conversations()? {
                writeln!(out, "{conversation}")?;
            }
        },
    }
    Ok(())
}
