//! Master key derivation from profile material and PIN
//!
//! The profile blob is hashed whole (any byte layout is accepted), the PIN is
//! appended to the digest, and the result is re-hashed a fixed number of
//! times. The final digest is the master key.
//!
//! This is the only place the PIN is used. A wrong PIN or a substituted
//! profile produces a different but valid-looking key; the failure surfaces
//! later as undecryptable data.

use std::io::{self, Read};

use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::{error::MasterKeyError, keys::MasterKey};

/// Number of sequential SHA-256 rounds applied to `digest || pin`.
///
/// Changing this changes every master key; existing notes and logs become
/// unreadable.
pub const STRETCH_ROUNDS: u32 = 10_000;

/// Required PIN length in characters
pub const PIN_LENGTH: usize = 12;

/// Read buffer for streaming profile sources
const READ_CHUNK: usize = 8 * 1024;

/// Derive the master key from in-memory profile bytes.
///
/// # Errors
///
/// - `MissingProfile` if `profile` is empty
/// - `InvalidPin` if `pin` is not exactly [`PIN_LENGTH`] characters
pub fn derive_master_key(profile: &[u8], pin: &str) -> Result<MasterKey, MasterKeyError> {
    if profile.is_empty() {
        return Err(MasterKeyError::MissingProfile);
    }
    validate_pin(pin)?;

    let digest: [u8; 32] = Sha256::digest(profile).into();
    Ok(stretch(digest, pin))
}

/// Derive the master key from a streaming profile source.
///
/// The source is read to the end and hashed incrementally; it is never
/// buffered whole.
///
/// # Errors
///
/// - `ReadFailure` if reading from `source` fails
/// - `MissingProfile` if `source` yields no bytes
/// - `InvalidPin` if `pin` is not exactly [`PIN_LENGTH`] characters
pub fn derive_master_key_from_reader<R: Read>(
    mut source: R,
    pin: &str,
) -> Result<MasterKey, MasterKeyError> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; READ_CHUNK];
    let mut total = 0usize;

    loop {
        let read = match source.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                buffer.zeroize();
                return Err(MasterKeyError::ReadFailure { reason: e.to_string() });
            },
        };
        hasher.update(&buffer[..read]);
        total += read;
    }
    buffer.zeroize();

    if total == 0 {
        return Err(MasterKeyError::MissingProfile);
    }
    validate_pin(pin)?;

    Ok(stretch(hasher.finalize().into(), pin))
}

fn validate_pin(pin: &str) -> Result<(), MasterKeyError> {
    let actual = pin.chars().count();
    if actual != PIN_LENGTH {
        return Err(MasterKeyError::InvalidPin { expected: PIN_LENGTH, actual });
    }
    Ok(())
}

/// `state = digest || pin`, then `state = SHA-256(state)` for every round.
fn stretch(mut digest: [u8; 32], pin: &str) -> MasterKey {
    let mut seed = Vec::with_capacity(digest.len() + pin.len());
    seed.extend_from_slice(&digest);
    seed.extend_from_slice(pin.as_bytes());
    digest.zeroize();

    let mut state: [u8; 32] = Sha256::digest(&seed).into();
    seed.zeroize();

    for _ in 1..STRETCH_ROUNDS {
        let next: [u8; 32] = Sha256::digest(state).into();
        state.zeroize();
        state = next;
    }

    let key = MasterKey::from_bytes(state);
    state.zeroize();
    key
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const FIXTURE_PROFILE: &[u8] = b"profile-fixture";
    const FIXTURE_PIN: &str = "012345678901";
    const FIXTURE_MASTER_KEY: &str =
        "b15309fc1577a89f80c8d33358a89c66ba4c0377920df3eeacbb7bd4464cefe0";

    #[test]
    fn golden_master_key() {
        let key = derive_master_key(FIXTURE_PROFILE, FIXTURE_PIN).unwrap();
        assert_eq!(hex::encode(key.as_bytes()), FIXTURE_MASTER_KEY);
    }

    #[test]
    fn reader_matches_slice() {
        let from_slice = derive_master_key(FIXTURE_PROFILE, FIXTURE_PIN).unwrap();
        let from_reader =
            derive_master_key_from_reader(Cursor::new(FIXTURE_PROFILE), FIXTURE_PIN).unwrap();
        assert_eq!(from_slice.as_bytes(), from_reader.as_bytes());
    }

    #[test]
    fn reader_handles_multi_chunk_profiles() {
        let profile = vec![0x5Au8; READ_CHUNK * 3 + 17];
        let from_slice = derive_master_key(&profile, FIXTURE_PIN).unwrap();
        let from_reader =
            derive_master_key_from_reader(Cursor::new(&profile), FIXTURE_PIN).unwrap();
        assert_eq!(from_slice.as_bytes(), from_reader.as_bytes());
    }

    #[test]
    fn wrong_pin_yields_different_key_not_error() {
        let a = derive_master_key(FIXTURE_PROFILE, "111111111111").unwrap();
        let b = derive_master_key(FIXTURE_PROFILE, "222222222222").unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn substituted_profile_yields_different_key() {
        let a = derive_master_key(b"profile-a", FIXTURE_PIN).unwrap();
        let b = derive_master_key(b"profile-b", FIXTURE_PIN).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn empty_profile_is_missing() {
        assert_eq!(
            derive_master_key(&[], FIXTURE_PIN).unwrap_err(),
            MasterKeyError::MissingProfile
        );
        assert_eq!(
            derive_master_key_from_reader(Cursor::new(Vec::new()), FIXTURE_PIN).unwrap_err(),
            MasterKeyError::MissingProfile
        );
    }

    #[test]
    fn pin_length_is_enforced() {
        for pin in ["", "01234567890", "0123456789012"] {
            let err = derive_master_key(FIXTURE_PROFILE, pin).unwrap_err();
            assert_eq!(
                err,
                MasterKeyError::InvalidPin { expected: PIN_LENGTH, actual: pin.chars().count() }
            );
        }
    }

    #[test]
    fn pin_length_counts_characters_not_bytes() {
        // 12 characters, 24 bytes
        let pin = "ääääääääääää";
        assert_eq!(pin.len(), 24);
        assert!(derive_master_key(FIXTURE_PROFILE, pin).is_ok());
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
    }

    #[test]
    fn unreadable_source_is_read_failure() {
        let err = derive_master_key_from_reader(FailingReader, FIXTURE_PIN).unwrap_err();
        assert!(matches!(err, MasterKeyError::ReadFailure { .. }));
    }
}
