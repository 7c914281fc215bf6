//! Key newtypes that zeroize on drop and never print their bytes

use std::fmt;

use zeroize::Zeroize;

/// Size of every symmetric key in the hierarchy (256 bits)
pub const KEY_SIZE: usize = 32;

/// 256-bit symmetric secret.
///
/// Zeroized on drop. `Debug` is redacted. There is no `PartialEq`; tests
/// compare [`as_bytes`](Self::as_bytes) explicitly.
#[derive(Clone)]
pub struct SymmetricKey([u8; KEY_SIZE]);

impl SymmetricKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey([REDACTED])")
    }
}

/// Root secret of an unlocked session.
///
/// Derived once per unlock from profile and PIN. Owned by the session and
/// never persisted.
#[derive(Clone, Debug)]
pub struct MasterKey(SymmetricKey);

impl MasterKey {
    /// Wrap raw key bytes (tests and fixtures).
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(SymmetricKey::from_bytes(bytes))
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        self.0.as_bytes()
    }
}

/// Per-room transport root, derived from (master key, room code).
#[derive(Clone, Debug)]
pub struct TransportRootKey(SymmetricKey);

impl TransportRootKey {
    pub(crate) fn new(key: SymmetricKey) -> Self {
        Self(key)
    }

    /// Wrap raw key bytes (tests and fixtures).
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(SymmetricKey::from_bytes(bytes))
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        self.0.as_bytes()
    }
}

/// A single-message AEAD key.
///
/// `position` is the transport index or ratchet counter the key belongs to.
#[derive(Clone, Debug)]
pub struct MessageKey {
    key: SymmetricKey,
    position: u64,
}

impl MessageKey {
    pub(crate) fn new(key: SymmetricKey, position: u64) -> Self {
        Self { key, position }
    }

    /// 32-byte key for ChaCha20-Poly1305.
    pub fn key(&self) -> &[u8; KEY_SIZE] {
        self.key.as_bytes()
    }

    /// Transport index or ratchet counter this key was derived for.
    pub fn position(&self) -> u64 {
        self.position
    }
}
