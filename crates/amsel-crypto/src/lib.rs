//! amsel Cryptographic Core
//!
//! Key derivation and authenticated encryption for amsel. Pure functions with
//! deterministic outputs. Callers provide salts and nonces so every operation
//! can be tested deterministically; the session layer draws them from the OS
//! RNG.
//!
//! # Key Hierarchy
//!
//! Everything descends from one master key, which is derived from the user's
//! profile blob and PIN when the session is unlocked. Each purpose derives its
//! own subkey through HKDF with a distinct info label, so no two purposes ever
//! share a key.
//!
//! ```text
//! Profile bytes + PIN
//!        │
//!        ▼ SHA-256, 10 000 rounds
//! Master Key
//!        │
//!        ├─ HKDF(room code)        → Transport Root ─ HKDF(index) → Message Key
//!        ├─ HKDF(conversation id)  → Log Root ─┬─ send chain (HMAC ratchet)
//!        │                                     └─ recv chain (HMAC ratchet)
//!        ├─ HKDF(room code)        → Ad-hoc chain (HMAC ratchet)
//!        └─ HKDF(random salt)      → Container file key
//! ```
//!
//! # Security
//!
//! Transport keys:
//! - Stateless per index: any (root, index) pair always yields the same key
//! - Retried or reordered messages decrypt; there is no forward secrecy within
//!   a room session
//!
//! Storage and ad-hoc ratchets:
//! - Chain keys are replaced and zeroized on every step
//! - A later chain key never reveals an earlier one
//!
//! Containers:
//! - Fresh salt and nonce per write, so every file gets its own key
//! - The header is bound as associated data
//!
//! Master key:
//! - Unsalted iterated SHA-256. This is weaker than a memory-hard KDF and is
//!   kept bit-for-bit for compatibility with existing profiles

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod aead;
pub mod container;
pub mod error;
pub mod kdf;
pub mod keys;
pub mod master;
pub mod ratchet;
pub mod transport;

pub use aead::{NONCE_SIZE, TAG_SIZE};
pub use container::{
    ContainerFormat, HEADER_SIZE, MIN_CONTAINER_SIZE, SALT_SIZE, open_container, open_container_as,
    seal_container, sealed_len,
};
pub use error::{CipherError, ContainerError, MasterKeyError};
pub use kdf::{KeyPurpose, derive_key, derive_subkey};
pub use keys::{KEY_SIZE, MasterKey, MessageKey, SymmetricKey, TransportRootKey};
pub use master::{PIN_LENGTH, STRETCH_ROUNDS, derive_master_key, derive_master_key_from_reader};
pub use ratchet::{AdHocRatchet, ChainDirection, HashChain, MAX_SKIP, StorageRatchet};
pub use transport::{
    ALGORITHM_LABEL, derive_transport_root, key_for_index, open_at_index, seal_for_index,
};
