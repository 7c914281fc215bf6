//! ChaCha20-Poly1305 sealing shared by transport, log and container paths
//!
//! All functions are pure - nonces must be provided by the caller.

use chacha20poly1305::{
    ChaCha20Poly1305, Nonce,
    aead::{Aead, KeyInit, Payload},
};

use crate::error::CipherError;

/// ChaCha20-Poly1305 nonce size (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Poly1305 tag size
pub const TAG_SIZE: usize = 16;

/// Encrypt `plaintext`, returning `ciphertext || tag`.
pub fn encrypt(key: &[u8; 32], nonce: &[u8; NONCE_SIZE], plaintext: &[u8], aad: &[u8]) -> Vec<u8> {
    let cipher = ChaCha20Poly1305::new(key.into());

    let Ok(ciphertext) = cipher.encrypt(Nonce::from_slice(nonce), Payload { msg: plaintext, aad })
    else {
        unreachable!("ChaCha20-Poly1305 encryption cannot fail with valid inputs");
    };
    ciphertext
}

/// Decrypt `ciphertext || tag`.
///
/// # Errors
///
/// - `DecryptFailure` if the tag does not verify
pub fn decrypt(
    key: &[u8; 32],
    nonce: &[u8; NONCE_SIZE],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, CipherError> {
    let cipher = ChaCha20Poly1305::new(key.into());
    cipher
        .decrypt(Nonce::from_slice(nonce), Payload { msg: ciphertext, aad })
        .map_err(|_| CipherError::DecryptFailure)
}

/// Seal into the combined layout `nonce || ciphertext || tag`.
pub fn seal_combined(key: &[u8; 32], nonce: [u8; NONCE_SIZE], plaintext: &[u8]) -> Vec<u8> {
    let ciphertext = encrypt(key, &nonce, plaintext, &[]);

    let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    combined.extend_from_slice(&nonce);
    combined.extend_from_slice(&ciphertext);
    combined
}

/// Open the combined layout `nonce || ciphertext || tag`.
///
/// # Errors
///
/// - `DecryptFailure` if the input is shorter than nonce plus tag, or the tag
///   does not verify
pub fn open_combined(key: &[u8; 32], combined: &[u8]) -> Result<Vec<u8>, CipherError> {
    if combined.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CipherError::DecryptFailure);
    }

    let (nonce, ciphertext) = combined.split_at(NONCE_SIZE);
    let Ok(nonce) = <[u8; NONCE_SIZE]>::try_from(nonce) else {
        unreachable!("split_at returned exactly NONCE_SIZE bytes");
    };
    decrypt(key, &nonce, ciphertext, &[])
}

/// Plaintext length of a combined buffer.
pub fn plaintext_len(combined_len: usize) -> usize {
    combined_len.saturating_sub(NONCE_SIZE + TAG_SIZE)
}
