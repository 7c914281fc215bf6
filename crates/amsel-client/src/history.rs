//! Conversation log: append, load and replay.
//!
//! Entries are sealed with the storage ratchet, a different key chain from
//! the one used on the wire. The ratchet is never persisted. On first use in a
//! session it is rebuilt from (master key, conversation id) and walked forward
//! over the stored counters in append order, so counters never repeat across
//! restarts.
//!
//! Reading replays a fresh ratchet from counter 0 over the stored entries in
//! append order.
//!
//! # Security
//!
//! Stored counters are not authenticated. A chain never moves more than
//! [`amsel_crypto::MAX_SKIP`] positions for one entry, and replay only
//! commits a position once the entry at it authenticates. A corrupted
//! counter costs that entry, never the session or the entries after it.

use std::sync::{Arc, Mutex};

use amsel_crypto::{ChainDirection, CipherError, StorageRatchet, aead};
use amsel_proto::{Direction, LogEnvelope};

use crate::{
    env::Environment,
    error::ClientError,
    session::{Session, Unlocked, get_or_insert, lock},
    storage::LogStore,
};

/// One replayed log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Who wrote the entry
    pub direction: Direction,
    /// Chain counter the entry was sealed at
    pub counter: u64,
    /// Decrypted text, or `Unreadable` if the entry failed authentication
    pub body: LogBody,
}

/// Content of a replayed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogBody {
    /// Entry decrypted to this text
    Text(String),
    /// Entry could not be authenticated or decoded
    Unreadable,
}

impl<E: Environment, S: LogStore> Session<E, S> {
    /// Seal `message` with the next key for `direction` and append it to the
    /// conversation's log.
    ///
    /// # Errors
    ///
    /// - `Entropy` if no nonce could be drawn
    /// - `Storage` if the entry could not be persisted; the chain counter
    ///   is consumed regardless, so it is never reused
    pub fn append_to_log(
        &self,
        conversation: &str,
        direction: Direction,
        message: &str,
    ) -> Result<LogEnvelope, ClientError> {
        self.with_unlocked(|unlocked| {
            let ratchet = self.storage_ratchet(unlocked, conversation)?;
            let mut ratchet = lock(&ratchet);

            let nonce = self.env.random_array()?;
            let (key, counter) = ratchet
                .next_key(chain_direction(direction))
                .map_err(|_| ClientError::CounterExhausted)?;

            let envelope = LogEnvelope {
                direction,
                counter,
                sealed_bytes: aead::seal_combined(key.key(), nonce, message.as_bytes()),
            };
            let position = self.store.append(conversation, &envelope)?;

            tracing::debug!(conversation, %direction, counter, position, "appended log entry");
            Ok(envelope)
        })
    }

    /// Stored (still sealed) entries of a conversation in append order.
    pub fn load_log(&self, conversation: &str) -> Result<Vec<LogEnvelope>, ClientError> {
        self.with_unlocked(|_| Ok(self.store.load(conversation)?))
    }

    /// Replay and decrypt a conversation's log.
    ///
    /// Entries that fail authentication, or whose counter is behind its chain
    /// or more than [`amsel_crypto::MAX_SKIP`] ahead of it, are reported as
    /// [`LogBody::Unreadable`]; replay continues with the next entry.
    pub fn read_log(&self, conversation: &str) -> Result<Vec<LogRecord>, ClientError> {
        self.with_unlocked(|unlocked| {
            let entries = self.store.load(conversation)?;
            let mut replay = StorageRatchet::new(&unlocked.master, conversation);

            let records: Vec<LogRecord> = entries
                .into_iter()
                .map(|entry| LogRecord {
                    direction: entry.direction,
                    counter: entry.counter,
                    body: open_entry(&mut replay, &entry),
                })
                .collect();

            let unreadable = records.iter().filter(|r| r.body == LogBody::Unreadable).count();
            if unreadable > 0 {
                tracing::warn!(conversation, unreadable, "log entries failed to open");
            }
            Ok(records)
        })
    }

    /// Conversations with stored entries.
    pub fn conversations(&self) -> Result<Vec<String>, ClientError> {
        self.with_unlocked(|_| Ok(self.store.conversations()?))
    }

    fn storage_ratchet(
        &self,
        unlocked: &Unlocked,
        conversation: &str,
    ) -> Result<Arc<Mutex<StorageRatchet>>, ClientError> {
        get_or_insert(&unlocked.logs, conversation, || {
            let mut ratchet = StorageRatchet::new(&unlocked.master, conversation);
            for entry in self.store.load(conversation)? {
                match ratchet.fast_forward(chain_direction(entry.direction), entry.counter) {
                    Ok(()) => {},
                    Err(CipherError::SkipLimitExceeded { current, requested }) => {
                        tracing::warn!(conversation, current, requested, "ignoring stored counter");
                    },
                    Err(_) => return Err(ClientError::CounterExhausted),
                }
            }
            tracing::debug!(
                conversation,
                sending = ratchet.sending_counter(),
                receiving = ratchet.receiving_counter(),
                "storage ratchet resumed"
            );
            Ok(ratchet)
        })
    }
}

fn chain_direction(direction: Direction) -> ChainDirection {
    match direction {
        Direction::Outgoing => ChainDirection::Sending,
        Direction::Incoming => ChainDirection::Receiving,
    }
}

fn open_entry(replay: &mut StorageRatchet, entry: &LogEnvelope) -> LogBody {
    let opened =
        replay.open_at(chain_direction(entry.direction), entry.counter, &entry.sealed_bytes);

    match opened.map(String::from_utf8) {
        Ok(Ok(text)) => LogBody::Text(text),
        Ok(Err(_)) => {
            tracing::debug!(counter = entry.counter, "log entry is not UTF-8");
            LogBody::Unreadable
        },
        Err(e) => {
            tracing::debug!(counter = entry.counter, error = %e, "log entry failed to open");
            LogBody::Unreadable
        },
    }
}
