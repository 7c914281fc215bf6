//! Client
//!
//! The session layer of amsel. A [`Session`] owns the master key while
//! unlocked and every secret derived from it, and exposes the operations the
//! UI and network layers call into.
//!
//! # Components
//!
//! - [`Session`]: unlock/lock lifecycle and all encrypt/decrypt call sites
//! - Room transport: [`Session::join_room`], [`Session::send_text`],
//!   [`Session::receive_text`]
//! - Conversation log: [`Session::append_to_log`], [`Session::load_log`],
//!   [`Session::read_log`]
//! - Ad-hoc channel: [`Session::seal_direct`], [`Session::open_direct`]
//! - Secret files: [`Session::save_note`], [`Session::load_note`],
//!   [`Session::create_system_container`], [`Session::load_system_container`]
//! - [`LogStore`]: where sealed log entries live ([`MemoryLogStore`],
//!   [`RedbLogStore`])
//! - [`Environment`]: where nonces and salts come from
//!
//! # Errors
//!
//! Integrity failures of any kind (tag mismatch, bad magic, unknown
//! container version) surface as the single [`ClientError::Unreadable`].
//! The cause is logged at debug level and nowhere else.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod direct;
pub mod env;
mod error;
mod files;
mod history;
mod room;
mod session;
pub mod storage;

pub use amsel_crypto::{ContainerFormat, PIN_LENGTH};
pub use amsel_proto::{
    ChatMessage, DirectEnvelope, Direction, LogEnvelope, SystemPayload, WireFrame,
};
pub use env::{DeterministicEnv, Environment, SystemEnv};
pub use error::ClientError;
pub use history::{LogBody, LogRecord};
pub use session::Session;
pub use storage::{LogStore, MemoryLogStore, RedbLogStore, StorageError};
