//! Redb-backed durable log store.
//!
//! Uses Redb's ACID transactions with Copy-on-Write for crash safety. Entries
//! survive restarts; the session replays them with a freshly derived ratchet.

use std::{path::Path, sync::Arc};

use amsel_proto::LogEnvelope;
use redb::{Database, ReadableTable, TableDefinition};

use super::{LogStore, StorageError};

/// Table: log_entries
/// Key: conversation id length (u32 BE) + conversation id + position (u64 BE)
/// Value: JSON-encoded `LogEnvelope`
const LOG_ENTRIES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("log_entries");

/// Durable log store backed by Redb.
///
/// Thread-safe through Redb's internal locking. Clone is cheap (Arc).
#[derive(Clone)]
pub struct RedbLogStore {
    db: Arc<Database>,
}

impl RedbLogStore {
    /// Open or create a Redb database at the given path.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database::create(path.as_ref()).map_err(|e| StorageError::Io(e.to_string()))?;

        let txn = db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        {
            let _ = txn.open_table(LOG_ENTRIES).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        tracing::debug!(path = %path.as_ref().display(), "opened log store");
        Ok(Self { db: Arc::new(db) })
    }

    /// Position the next entry of `conversation` will be stored at.
    fn next_position<T: ReadableTable<&'static [u8], &'static [u8]>>(
        table: &T,
        conversation: &str,
    ) -> Result<u64, StorageError> {
        let start_key = encode_entry_key(conversation, 0)?;
        let end_key = encode_entry_key(conversation, u64::MAX)?;

        let mut range = table
            .range(start_key.as_slice()..=end_key.as_slice())
            .map_err(|e| StorageError::Io(e.to_string()))?;

        match range.next_back() {
            Some(result) => {
                let (key, _) = result.map_err(|e| StorageError::Io(e.to_string()))?;
                let (_, position) = decode_entry_key(key.value())?;
                position
                    .checked_add(1)
                    .ok_or_else(|| StorageError::Serialization("log position overflow".into()))
            },
            None => Ok(0),
        }
    }
}

impl LogStore for RedbLogStore {
    fn append(&self, conversation: &str, envelope: &LogEnvelope) -> Result<u64, StorageError> {
        let value = envelope.encode()?;

        let txn = self.db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        let position = {
            let mut table =
                txn.open_table(LOG_ENTRIES).map_err(|e| StorageError::Io(e.to_string()))?;

            let position = Self::next_position(&table, conversation)?;
            let key = encode_entry_key(conversation, position)?;
            table
                .insert(key.as_slice(), value.as_slice())
                .map_err(|e| StorageError::Io(e.to_string()))?;
            position
        };
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(position)
    }

    fn load(&self, conversation: &str) -> Result<Vec<LogEnvelope>, StorageError> {
        let txn = self.db.begin_read().map_err(|e| StorageError::Io(e.to_string()))?;
        let table = txn.open_table(LOG_ENTRIES).map_err(|e| StorageError::Io(e.to_string()))?;

        let start_key = encode_entry_key(conversation, 0)?;
        let end_key = encode_entry_key(conversation, u64::MAX)?;

        let results = table
            .range(start_key.as_slice()..=end_key.as_slice())
            .map_err(|e| StorageError::Io(e.to_string()))?;

        let mut entries = Vec::new();
        for result in results {
            let (_, value) = result.map_err(|e| StorageError::Io(e.to_string()))?;
            entries.push(LogEnvelope::decode(value.value())?);
        }

        Ok(entries)
    }

    fn conversations(&self) -> Result<Vec<String>, StorageError> {
        let txn = self.db.begin_read().map_err(|e| StorageError::Io(e.to_string()))?;
        let table = txn.open_table(LOG_ENTRIES).map_err(|e| StorageError::Io(e.to_string()))?;

        let mut ids: Vec<String> = Vec::new();
        for result in table.iter().map_err(|e| StorageError::Io(e.to_string()))? {
            let (key, _) = result.map_err(|e| StorageError::Io(e.to_string()))?;
            let (conversation, _) = decode_entry_key(key.value())?;
            // Keys sort by conversation first, so duplicates are adjacent
            if ids.last().map(String::as_str) != Some(conversation) {
                ids.push(conversation.to_owned());
            }
        }

        ids.sort();
        Ok(ids)
    }
}

fn encode_entry_key(conversation: &str, position: u64) -> Result<Vec<u8>, StorageError> {
    let len = u32::try_from(conversation.len())
        .map_err(|_| StorageError::Serialization("conversation id too long".into()))?;

    let mut key = Vec::with_capacity(4 + conversation.len() + 8);
    key.extend_from_slice(&len.to_be_bytes());
    key.extend_from_slice(conversation.as_bytes());
    key.extend_from_slice(&position.to_be_bytes());
    Ok(key)
}

fn decode_entry_key(key: &[u8]) -> Result<(&str, u64), StorageError> {
    let corrupt = || StorageError::Serialization("corrupt log key".into());

    let (len_bytes, rest) = key.split_first_chunk::<4>().ok_or_else(corrupt)?;
    let len = u32::from_be_bytes(*len_bytes) as usize;
    if rest.len() != len + 8 {
        return Err(corrupt());
    }

    let (id_bytes, position_bytes) = rest.split_at(len);
    let conversation = std::str::from_utf8(id_bytes).map_err(|_| corrupt())?;
    let position_bytes: [u8; 8] = position_bytes.try_into().map_err(|_| corrupt())?;

    Ok((conversation, u64::from_be_bytes(position_bytes)))
}
