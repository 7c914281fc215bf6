//! Command-line configuration.
//!
//! Every secret input can come from the environment (`AMSEL_PROFILE`,
//! `AMSEL_PIN`, `AMSEL_DATA_DIR`) so the PIN does not have to appear in shell
//! history.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use amsel_client::Direction;
use clap::{Parser, Subcommand, ValueEnum};

/// File name of the conversation log database inside the data directory.
pub const LOG_DATABASE: &str = "history.redb";

/// amsel secret file and log tool
#[derive(Parser)]
#[command(name = "amsel-tool")]
#[command(about = "Seal and open amsel notes, system containers and conversation logs")]
#[command(version)]
pub struct Args {
    /// Profile file the master key is derived from
    #[arg(long, env = "AMSEL_PROFILE")]
    profile: PathBuf,

    /// 12-character PIN
    #[arg(long, env = "AMSEL_PIN", hide_env_values = true)]
    pin: String,

    /// Directory holding the conversation log database
    #[arg(long, env = "AMSEL_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    /// Split into session configuration and the command to run.
    pub fn into_parts(self) -> (ToolConfig, Command) {
        let config = ToolConfig { profile: self.profile, pin: self.pin, data_dir: self.data_dir };
        (config, self.command)
    }
}

/// Where the session's key material and log live.
#[derive(Clone, PartialEq, Eq)]
pub struct ToolConfig {
    /// Profile file
    pub profile: PathBuf,
    /// PIN paired with the profile
    pub pin: String,
    /// Directory for the log database
    pub data_dir: PathBuf,
}

impl ToolConfig {
    /// Path of the conversation log database.
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_DATABASE)
    }

    /// Profile file path.
    pub fn profile(&self) -> &Path {
        &self.profile
    }
}

impl fmt::Debug for ToolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolConfig")
            .field("profile", &self.profile)
            .field("pin", &"[REDACTED]")
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Notes containers (AMSN)
    #[command(subcommand)]
    Note(NoteCommand),

    /// System containers (AMSS)
    #[command(subcommand)]
    System(SystemCommand),

    /// Conversation log
    #[command(subcommand)]
    Log(LogCommand),
}

/// Notes container operations.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum NoteCommand {
    /// Seal text into a notes file, reading stdin when `--text` is absent
    Seal {
        /// Destination file
        path: PathBuf,
        /// Note text
        #[arg(long)]
        text: Option<String>,
    },
    /// Print the text of a notes file
    Open {
        /// Notes file
        path: PathBuf,
    },
}

/// System container operations.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SystemCommand {
    /// Seal `key=value` entries into a system file
    Seal {
        /// Destination file
        path: PathBuf,
        /// Entry as `key=value`; repeatable
        #[arg(long = "set", value_parser = parse_entry)]
        entries: Vec<(String, String)>,
    },
    /// Print the entries of a system file as `key=value` lines
    Open {
        /// System file
        path: PathBuf,
    },
}

/// Conversation log operations.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum LogCommand {
    /// Seal and append a message, printing its counter
    Append {
        /// Conversation id
        conversation: String,
        /// Who wrote the message
        #[arg(long, value_enum, default_value = "out")]
        direction: DirectionArg,
        /// Message text
        text: String,
    },
    /// Replay and print a conversation
    Dump {
        /// Conversation id
        conversation: String,
    },
    /// List conversations with stored entries
    List,
}

/// Log direction as spelled on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionArg {
    /// Written by the local user
    Out,
    /// Received from the peer
    In,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Out => Direction::Outgoing,
            DirectionArg::In => Direction::Incoming,
        }
    }
}

fn parse_entry(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got {raw:?}")),
    }
}
