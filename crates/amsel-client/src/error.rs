//! Client error types

use amsel_crypto::MasterKeyError;
use amsel_proto::ProtocolError;
use thiserror::Error;

use crate::storage::StorageError;

/// Errors returned by [`crate::Session`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Session has no master key (never unlocked, or locked since)
    #[error("session is locked")]
    Locked,

    /// `unlock` called on a session that already holds a key
    #[error("session is already unlocked")]
    AlreadyUnlocked,

    /// Master key derivation failed
    #[error(transparent)]
    MasterKey(#[from] MasterKeyError),

    /// Operation names a room that is not joined
    #[error("room not joined: {code}")]
    NotJoined {
        /// Room code
        code: String,
    },

    /// Incoming message uses a cipher label this client does not implement
    #[error("unsupported cipher: {0}")]
    UnsupportedCipher(String),

    /// Content failed an integrity check.
    ///
    /// Covers tag mismatch, bad magic and unsupported container versions. The
    /// cause is only logged at debug level.
    #[error("content cannot be read")]
    Unreadable,

    /// Direct envelope position is behind the channel or too far ahead of it
    #[error("message out of sequence: channel at {current}, message at {requested}")]
    OutOfSequence {
        /// Receiver's chain position
        current: u64,
        /// Position carried by the envelope
        requested: u64,
    },

    /// A message index or chain counter is exhausted
    #[error("counter exhausted")]
    CounterExhausted,

    /// Authenticated content did not have the expected shape
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The OS random number generator failed
    #[error("entropy source failed: {0}")]
    Entropy(String),

    /// Encoding or decoding a schema failed
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Log store failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Filesystem failure reading or writing a secret file
    #[error("I/O error: {0}")]
    Io(String),
}

impl ClientError {
    /// Whether the session can keep operating after this error.
    ///
    /// Entropy and storage failures are fatal. Everything else concerns a
    /// single message or file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Entropy(_) | Self::Storage(_))
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Collapse an integrity failure into [`ClientError::Unreadable`].
///
/// The detailed cause is recorded at debug level only.
pub(crate) fn unreadable(context: &'static str, cause: &dyn std::fmt::Display) -> ClientError {
    tracing::debug!(context, %cause, "integrity check failed");
    ClientError::Unreadable
}
