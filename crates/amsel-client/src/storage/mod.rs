//! Conversation log persistence
//!
//! Trait-based abstraction over an append-only store of sealed
//! [`LogEnvelope`]s, keyed by conversation id. The trait is synchronous; the
//! session calls it while holding the conversation's ratchet lock, so appends
//! for one conversation are already serialized.
//!
//! Stores never see plaintext or keys.

mod error;
mod memory;
mod redb;

use amsel_proto::LogEnvelope;

pub use error::StorageError;
pub use memory::MemoryLogStore;

pub use self::redb::RedbLogStore;

/// Append-only storage for conversation logs.
///
/// Must be Clone (shared by every session that opens the same store), Send +
/// Sync, and synchronous. Implementations share internal state via Arc, so
/// clones see the same entries.
pub trait LogStore: Clone + Send + Sync + 'static {
    /// Append `envelope` to the conversation's log.
    ///
    /// Returns the position the entry was stored at (0 for the first entry).
    ///
    /// # Invariants
    ///
    /// - Post: [`load`](Self::load) returns the entry last, after every
    ///   entry appended before it
    fn append(&self, conversation: &str, envelope: &LogEnvelope) -> Result<u64, StorageError>;

    /// All entries of a conversation in append order.
    ///
    /// Returns an empty list for unknown conversations.
    fn load(&self, conversation: &str) -> Result<Vec<LogEnvelope>, StorageError>;

    /// Ids of all conversations with at least one entry, sorted.
    fn conversations(&self) -> Result<Vec<String>, StorageError>;
}
