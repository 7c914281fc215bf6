//! Room transport cipher: stateless per-index message keys
//!
//! The sender advances a per-room index and transmits it next to the
//! ciphertext. The receiver derives the same key from the index alone, so
//! retried and reordered deliveries decrypt. The price is that a leaked
//! transport root exposes every message of the room session.

use crate::{
    aead::{self, NONCE_SIZE},
    error::CipherError,
    kdf::{KeyPurpose, derive_key},
    keys::{MasterKey, MessageKey, TransportRootKey},
};

/// Algorithm tag transmitted with every transport message.
pub const ALGORITHM_LABEL: &str = "chacha20poly1305";

/// Derive the transport root for a room.
///
/// Recomputed on every join; the same (master key, room code) always yields
/// the same root.
pub fn derive_transport_root(master: &MasterKey, room_code: &str) -> TransportRootKey {
    TransportRootKey::new(derive_key(
        master.as_bytes(),
        Some(room_code.as_bytes()),
        KeyPurpose::RoomTransportRoot,
        b"",
    ))
}

/// Derive the message key for `index`.
///
/// Pure function of (root, index). Calling it twice with the same inputs
/// yields the same key.
pub fn key_for_index(root: &TransportRootKey, index: u64) -> MessageKey {
    let key = derive_key(root.as_bytes(), None, KeyPurpose::TransportMessage, &index.to_be_bytes());
    MessageKey::new(key, index)
}

/// Seal `plaintext` for `index`, returning `nonce || ciphertext || tag`.
///
/// Caller MUST provide a fresh random nonce.
pub fn seal_for_index(
    root: &TransportRootKey,
    index: u64,
    plaintext: &[u8],
    nonce: [u8; NONCE_SIZE],
) -> Vec<u8> {
    let key = key_for_index(root, index);
    aead::seal_combined(key.key(), nonce, plaintext)
}

/// Open a transport payload that was sealed for `index`.
///
/// # Errors
///
/// - `DecryptFailure` if the tag does not verify (wrong room, wrong index,
///   corrupted or forged payload)
pub fn open_at_index(
    root: &TransportRootKey,
    index: u64,
    combined: &[u8],
) -> Result<Vec<u8>, CipherError> {
    let key = key_for_index(root, index);
    aead::open_combined(key.key(), combined)
}
