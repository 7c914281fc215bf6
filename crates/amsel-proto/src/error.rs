//! Protocol error types

use thiserror::Error;

/// Result alias for schema encoding and decoding.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding protocol schemas.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Input exceeds [`crate::MAX_MESSAGE_SIZE`]
    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge {
        /// Size of the rejected input
        size: usize,
        /// Configured maximum
        max: usize,
    },

    /// JSON did not match the expected schema
    #[error("JSON decode failed: {0}")]
    JsonDecode(String),

    /// Value could not be serialized
    #[error("JSON encode failed: {0}")]
    JsonEncode(String),
}

impl ProtocolError {
    /// Whether the input came from outside and was malformed.
    ///
    /// Encode failures indicate a local bug and are not counted.
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, Self::MessageTooLarge { .. } | Self::JsonDecode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_input_classification() {
        assert!(ProtocolError::MessageTooLarge { size: 2, max: 1 }.is_malformed_input());
        assert!(ProtocolError::JsonDecode("x".into()).is_malformed_input());
        assert!(!ProtocolError::JsonEncode("x".into()).is_malformed_input());
    }

    #[test]
    fn display_includes_limits() {
        let err = ProtocolError::MessageTooLarge { size: 10, max: 4 };
        assert_eq!(err.to_string(), "message too large: 10 bytes (max 4)");
    }
}
