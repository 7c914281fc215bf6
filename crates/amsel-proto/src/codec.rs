//! Shared JSON encode/decode with a size guard.

use serde::{Serialize, de::DeserializeOwned};

use crate::error::{ProtocolError, Result};

/// Largest accepted serialized message (1 MiB).
///
/// Checked before parsing so an oversized frame never reaches the JSON
/// parser.
pub const MAX_MESSAGE_SIZE: usize = 1 << 20;

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| ProtocolError::JsonEncode(e.to_string()))
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    if bytes.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge { size: bytes.len(), max: MAX_MESSAGE_SIZE });
    }
    serde_json::from_slice(bytes).map_err(|e| ProtocolError::JsonDecode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_input_rejected_before_parsing() {
        let bytes = vec![b' '; MAX_MESSAGE_SIZE + 1];
        let err = decode::<u64>(&bytes).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::MessageTooLarge { size: MAX_MESSAGE_SIZE + 1, max: MAX_MESSAGE_SIZE }
        );
    }

    #[test]
    fn invalid_json_is_decode_error() {
        assert!(matches!(decode::<u64>(b"{"), Err(ProtocolError::JsonDecode(_))));
    }
}
