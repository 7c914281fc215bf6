//! Purpose-scoped subkey derivation using HKDF-SHA256
//!
//! Every subkey in the hierarchy is derived here. Each purpose has exactly one
//! literal info label, listed in [`KeyPurpose`], so the domain-separation
//! guarantee can be audited in this file alone.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::keys::{KEY_SIZE, SymmetricKey};

/// Maximum HKDF-SHA256 output (255 blocks of 32 bytes)
pub const MAX_OUTPUT_LEN: usize = 255 * 32;

/// Every purpose a key in the hierarchy can be derived for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyPurpose {
    /// Per-room transport root (salt: room code)
    RoomTransportRoot,
    /// Per-message transport key (context: message index)
    TransportMessage,
    /// Per-conversation log ratchet root (salt: conversation id)
    LogRatchetRoot,
    /// Sending chain of the log ratchet
    LogRatchetSend,
    /// Receiving chain of the log ratchet
    LogRatchetRecv,
    /// Per-file key of a notes container (salt: random)
    NoteContainer,
    /// Per-file key of a system container (salt: random)
    SystemContainer,
    /// Ad-hoc message chain root (salt: room code)
    AdHocMessageRoot,
}

impl KeyPurpose {
    /// All purposes, for exhaustive checks.
    pub const ALL: [Self; 8] = [
        Self::RoomTransportRoot,
        Self::TransportMessage,
        Self::LogRatchetRoot,
        Self::LogRatchetSend,
        Self::LogRatchetRecv,
        Self::NoteContainer,
        Self::SystemContainer,
        Self::AdHocMessageRoot,
    ];

    /// Literal HKDF info label for this purpose.
    ///
    /// No label is a prefix of another, so `label || context` stays unique
    /// across purposes for any context bytes.
    pub const fn label(self) -> &'static [u8] {
        match self {
            Self::RoomTransportRoot => b"amsel room-transport-root v1",
            Self::TransportMessage => b"amsel room-transport-message v1",
            Self::LogRatchetRoot => b"amsel log-ratchet-root v1",
            Self::LogRatchetSend => b"amsel log-ratchet-send v1",
            Self::LogRatchetRecv => b"amsel log-ratchet-recv v1",
            Self::NoteContainer => b"amsel per-file-container notes v1",
            Self::SystemContainer => b"amsel per-file-container system v1",
            Self::AdHocMessageRoot => b"amsel ad-hoc-message-root v1",
        }
    }
}

/// HKDF extract-and-expand with an explicit info string.
///
/// `N` must not exceed [`MAX_OUTPUT_LEN`]; this is checked at compile time.
pub fn derive_subkey<const N: usize>(ikm: &[u8], salt: Option<&[u8]>, info: &[u8]) -> [u8; N] {
    const { assert!(N <= MAX_OUTPUT_LEN, "HKDF-SHA256 output is limited to 8160 bytes") };

    let hkdf = Hkdf::<Sha256>::new(salt, ikm);

    let mut okm = [0u8; N];
    let Ok(()) = hkdf.expand(info, &mut okm) else {
        unreachable!("output length is bounded by MAX_OUTPUT_LEN");
    };
    okm
}

/// Derive a 256-bit key for `purpose`.
///
/// The info string is `purpose.label() || context`. Context carries
/// per-derivation data that is not already in the salt, such as a message
/// index.
pub fn derive_key(
    ikm: &[u8],
    salt: Option<&[u8]>,
    purpose: KeyPurpose,
    context: &[u8],
) -> SymmetricKey {
    let label = purpose.label();
    let mut info = Vec::with_capacity(label.len() + context.len());
    info.extend_from_slice(label);
    info.extend_from_slice(context);

    let mut okm = derive_subkey::<KEY_SIZE>(ikm, salt, &info);
    let key = SymmetricKey::from_bytes(okm);
    okm.zeroize();
    key
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn labels_are_unique() {
        let labels: HashSet<&[u8]> = KeyPurpose::ALL.iter().map(|p| p.label()).collect();
        assert_eq!(labels.len(), KeyPurpose::ALL.len());
    }

    #[test]
    fn no_label_is_a_prefix_of_another() {
        for a in KeyPurpose::ALL {
            for b in KeyPurpose::ALL {
                if a != b {
                    assert!(
                        !b.label().starts_with(a.label()),
                        "{a:?} label is a prefix of {b:?} label"
                    );
                }
            }
        }
    }

    #[test]
    fn derive_is_deterministic() {
        let a = derive_key(b"master", Some(b"salt"), KeyPurpose::LogRatchetRoot, b"");
        let b = derive_key(b"master", Some(b"salt"), KeyPurpose::LogRatchetRoot, b"");
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn purposes_never_collide() {
        let vectors: [(&[u8], &[u8]); 4] = [
            (&[0u8; 32], b"room-1"),
            (&[0xFFu8; 32], b""),
            (b"profile-fixture-master-key-bytes", b"conversation-42"),
            (&[7u8; 64], &[0u8; 16]),
        ];

        for (ikm, salt) in vectors {
            let keys: HashSet<[u8; KEY_SIZE]> = KeyPurpose::ALL
                .iter()
                .map(|&p| *derive_key(ikm, Some(salt), p, b"").as_bytes())
                .collect();
            assert_eq!(keys.len(), KeyPurpose::ALL.len(), "collision for salt {salt:?}");
        }
    }

    #[test]
    fn different_salts_produce_different_keys() {
        let a = derive_key(b"master", Some(b"room-a"), KeyPurpose::RoomTransportRoot, b"");
        let b = derive_key(b"master", Some(b"room-b"), KeyPurpose::RoomTransportRoot, b"");
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn context_separates_keys() {
        let a = derive_key(b"root", None, KeyPurpose::TransportMessage, &1u64.to_be_bytes());
        let b = derive_key(b"root", None, KeyPurpose::TransportMessage, &2u64.to_be_bytes());
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn subkey_supports_other_lengths() {
        let short: [u8; 16] = derive_subkey(b"ikm", None, b"info");
        let long: [u8; 64] = derive_subkey(b"ikm", None, b"info");
        // HKDF output is a prefix-stable stream
        assert_eq!(&long[..16], &short);
    }

    #[test]
    fn works_with_empty_input_key() {
        let key = derive_key(&[], None, KeyPurpose::AdHocMessageRoot, b"");
        assert_eq!(key.as_bytes().len(), KEY_SIZE);
    }
}
