//! Relay wire frames.
//!
//! Every frame is a JSON object whose `type` field selects the variant:
//!
//! ```text
//! {"type":"join","code":"room-7"}
//! {"type":"leave","code":"room-7"}
//! {"type":"msg","code":"room-7","body":"<base64>","k":1,"enc":"chacha20poly1305"}
//! {"type":"error","message":"room closed"}
//! ```
//!
//! For `msg`, `body` is `nonce || ciphertext || tag` and `k` is the sender's
//! message index. The relay only ever sees sealed bodies.

use serde::{Deserialize, Serialize};

use crate::{codec, error::Result};

/// A frame exchanged with the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WireFrame {
    /// Join a room
    Join(RoomRef),
    /// Leave a room
    Leave(RoomRef),
    /// Sealed chat message
    Msg(ChatMessage),
    /// Relay-side error report
    Error(ErrorFrame),
}

/// Room reference carried by `join` and `leave`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoomRef {
    /// Room code
    pub code: String,
}

/// Sealed chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatMessage {
    /// Room code the message belongs to
    pub code: String,

    /// `nonce || ciphertext || tag`
    #[serde(with = "crate::b64")]
    pub body: Vec<u8>,

    /// Sender's message index. Selects the transport key.
    pub k: u64,

    /// Cipher label. Receivers reject anything they do not implement.
    pub enc: String,
}

/// Error reported by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorFrame {
    /// Human-readable reason
    pub message: String,
}

impl WireFrame {
    /// `join` frame for `code`.
    pub fn join(code: impl Into<String>) -> Self {
        Self::Join(RoomRef { code: code.into() })
    }

    /// `leave` frame for `code`.
    pub fn leave(code: impl Into<String>) -> Self {
        Self::Leave(RoomRef { code: code.into() })
    }

    /// Room code the frame refers to, if any.
    pub fn room_code(&self) -> Option<&str> {
        match self {
            Self::Join(room) | Self::Leave(room) => Some(&room.code),
            Self::Msg(msg) => Some(&msg.code),
            Self::Error(_) => None,
        }
    }

    /// Serialize to JSON bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        codec::encode(self)
    }

    /// Parse JSON bytes.
    ///
    /// # Errors
    ///
    /// - `MessageTooLarge` if the input exceeds [`crate::MAX_MESSAGE_SIZE`]
    /// - `JsonDecode` for unknown `type` values, unknown or missing fields,
    ///   and invalid base64 bodies
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        codec::decode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProtocolError;

    fn sample_msg() -> WireFrame {
        WireFrame::Msg(ChatMessage {
            code: "room-7".into(),
            body: vec![0, 1, 2, 0xFF],
            k: 3,
            enc: "chacha20poly1305".into(),
        })
    }

    #[test]
    fn msg_json_shape() {
        let json = String::from_utf8(sample_msg().encode().unwrap()).unwrap();
        assert_eq!(
            json,
            r#"{"type":"msg","code":"room-7","body":"AAEC/w==","k":3,"enc":"chacha20poly1305"}"#
        );
    }

    #[test]
    fn join_and_leave_json_shape() {
        assert_eq!(WireFrame::join("r").encode().unwrap(), br#"{"type":"join","code":"r"}"#);
        assert_eq!(WireFrame::leave("r").encode().unwrap(), br#"{"type":"leave","code":"r"}"#);
    }

    #[test]
    fn decode_accepts_any_field_order() {
        let frame = WireFrame::decode(
            br#"{"k":3,"enc":"chacha20poly1305","body":"AAEC/w==","code":"room-7","type":"msg"}"#,
        )
        .unwrap();
        assert_eq!(frame, sample_msg());
    }

    #[test]
    fn error_frame_decodes() {
        let frame = WireFrame::decode(br#"{"type":"error","message":"room closed"}"#).unwrap();
        assert_eq!(frame, WireFrame::Error(ErrorFrame { message: "room closed".into() }));
        assert_eq!(frame.room_code(), None);
    }

    #[test]
    fn unknown_type_rejected() {
        let err = WireFrame::decode(br#"{"type":"typing","code":"r"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::JsonDecode(_)));
    }

    #[test]
    fn missing_type_rejected() {
        assert!(WireFrame::decode(br#"{"code":"r"}"#).is_err());
    }

    #[test]
    fn unknown_field_rejected() {
        assert!(WireFrame::decode(br#"{"type":"join","code":"r","extra":1}"#).is_err());
        assert!(
            WireFrame::decode(
                br#"{"type":"msg","code":"r","body":"","k":1,"enc":"chacha20poly1305","n":2}"#
            )
            .is_err()
        );
    }

    #[test]
    fn missing_field_rejected() {
        assert!(WireFrame::decode(br#"{"type":"msg","code":"r","body":"","enc":"x"}"#).is_err());
    }

    #[test]
    fn invalid_base64_body_rejected() {
        let err = WireFrame::decode(br#"{"type":"msg","code":"r","body":"!!","k":1,"enc":"x"}"#)
            .unwrap_err();
        assert!(err.is_malformed_input());
    }

    #[test]
    fn negative_index_rejected() {
        let negative = br#"{"type":"msg","code":"r","body":"","k":-1,"enc":"x"}"#;
        assert!(WireFrame::decode(negative).is_err());
    }

    #[test]
    fn room_code_accessor() {
        assert_eq!(sample_msg().room_code(), Some("room-7"));
        assert_eq!(WireFrame::join("a").room_code(), Some("a"));
    }
}
