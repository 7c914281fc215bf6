use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use amsel_proto::LogEnvelope;

use super::{LogStore, StorageError};

/// In-memory log store for tests and ephemeral sessions
///
/// All state is wrapped in `Arc<Mutex<>>` so clones share entries. Lost when
/// the last clone is dropped.
#[derive(Clone, Default)]
pub struct MemoryLogStore {
    inner: Arc<Mutex<HashMap<String, Vec<LogEnvelope>>>>,
}

impl MemoryLogStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of entries across all conversations.
    pub fn total_entry_count(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.values().map(Vec::len).sum()
    }
}

impl LogStore for MemoryLogStore {
    fn append(&self, conversation: &str, envelope: &LogEnvelope) -> Result<u64, StorageError> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let entries = inner.entry(conversation.to_owned()).or_default();

        let position = entries.len() as u64;
        entries.push(envelope.clone());

        Ok(position)
    }

    fn load(&self, conversation: &str) -> Result<Vec<LogEnvelope>, StorageError> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.get(conversation).cloned().unwrap_or_default())
    }

    fn conversations(&self) -> Result<Vec<String>, StorageError> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<String> =
            inner.iter().filter(|(_, e)| !e.is_empty()).map(|(id, _)| id.clone()).collect();
        ids.sort();
        Ok(ids)
    }
}
