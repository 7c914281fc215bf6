//! Error types for key derivation, ciphers and containers

use thiserror::Error;

/// Errors from deriving the master key at unlock time.
///
/// A wrong PIN is deliberately NOT an error: it produces a different, equally
/// valid-looking key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MasterKeyError {
    /// No profile bytes were supplied (empty buffer or absent file)
    #[error("no profile material supplied")]
    MissingProfile,

    /// PIN does not have exactly the required number of characters
    #[error("PIN must be {expected} characters, got {actual}")]
    InvalidPin {
        /// Required PIN length in characters
        expected: usize,
        /// Actual PIN length in characters
        actual: usize,
    },

    /// The profile source could not be read
    #[error("profile could not be read: {reason}")]
    ReadFailure {
        /// Description of the underlying I/O failure
        reason: String,
    },
}

/// Errors from transport and ratchet encryption.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipherError {
    /// Authentication tag check failed.
    ///
    /// Wrong key, corrupted payload and index desync are indistinguishable by
    /// construction; no reason is attached.
    #[error("decryption failed")]
    DecryptFailure,

    /// Ratchet counter would overflow
    #[error("ratchet counter overflow at {current}")]
    CounterOverflow {
        /// Counter value when overflow was detected
        current: u64,
    },

    /// Requested chain position has already been passed.
    ///
    /// Chains are one-way; the key for an earlier position no longer exists.
    #[error("ratchet already at {current}, cannot derive position {requested}")]
    PositionPassed {
        /// Current chain position
        current: u64,
        /// Requested position
        requested: u64,
    },

    /// Requested chain position is too far ahead of the current one
    #[error("ratchet at {current}, position {requested} exceeds skip limit")]
    SkipLimitExceeded {
        /// Current chain position
        current: u64,
        /// Requested position
        requested: u64,
    },
}

impl CipherError {
    /// Returns true if the error means the ciphertext could not be trusted.
    ///
    /// Integrity failures must be reported to the user as a generic
    /// "cannot read" without further detail.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, Self::DecryptFailure)
    }
}

/// Errors from opening a secret container.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    /// Container is shorter than header plus tag
    #[error("container too short: need at least {expected} bytes, got {actual}")]
    FileTooShort {
        /// Minimum container size
        expected: usize,
        /// Actual container size
        actual: usize,
    },

    /// Magic bytes do not name a known (or the expected) format
    #[error("invalid container magic")]
    InvalidMagic,

    /// Container version is not supported
    #[error("unsupported container version: {0}")]
    UnsupportedVersion(u8),

    /// Authentication tag check failed
    #[error("container decryption failed")]
    DecryptionFailure,
}

impl ContainerError {
    /// Returns true if this error is a cryptographic-integrity failure.
    ///
    /// Bad magic, unknown version and tag mismatch are all treated as security
    /// events. Only a truncated file is an ordinary input error.
    pub fn is_integrity_failure(&self) -> bool {
        match self {
            Self::InvalidMagic | Self::UnsupportedVersion(_) | Self::DecryptionFailure => true,
            Self::FileTooShort { .. } => false,
        }
    }
}
