//! Randomness abstraction.
//!
//! Every nonce and salt the session uses comes from an [`Environment`].
//! Production uses [`SystemEnv`] (the OS RNG); tests use
//! [`DeterministicEnv`] so sealed output is reproducible.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use crate::error::ClientError;

/// Source of cryptographic randomness.
///
/// # Invariants
///
/// - Production implementations MUST use a cryptographically secure RNG
/// - Failure is reported, never papered over with a weaker fallback
pub trait Environment: Clone + Send + Sync + 'static {
    /// Fill `buffer` with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), ClientError>;

    /// Random fixed-size array (nonces, salts).
    fn random_array<const N: usize>(&self) -> Result<[u8; N], ClientError> {
        let mut bytes = [0u8; N];
        self.random_bytes(&mut bytes)?;
        Ok(bytes)
    }
}

/// Production environment backed by the OS RNG.
///
/// # Security
///
/// Uses getrandom (`getrandom(2)` on Linux, `BCryptGenRandom` on Windows).
/// An RNG failure surfaces as [`ClientError::Entropy`]; the operation that
/// needed the bytes fails and nothing is sealed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), ClientError> {
        getrandom::fill(buffer).map_err(|e| {
            tracing::error!(error = %e, "OS RNG failure");
            ClientError::Entropy(e.to_string())
        })
    }
}

/// Reproducible environment for tests and tooling.
///
/// Each call writes a big-endian call counter followed by a repeating seed
/// byte, so successive buffers never repeat. NOT suitable for real secrets.
/// Clones share the counter.
#[derive(Debug, Clone)]
pub struct DeterministicEnv {
    seed: u8,
    calls: Arc<AtomicU64>,
}

impl DeterministicEnv {
    /// Environment whose filler byte is `seed`.
    pub fn new(seed: u8) -> Self {
        Self { seed, calls: Arc::new(AtomicU64::new(0)) }
    }
}

impl Environment for DeterministicEnv {
    fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), ClientError> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed).to_be_bytes();
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = call.get(i).copied().unwrap_or(self.seed);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_env_random_bytes_differ() {
        let env = SystemEnv::new();
        let a: [u8; 32] = env.random_array().unwrap();
        let b: [u8; 32] = env.random_array().unwrap();
        assert_ne!(a, b, "Random bytes should differ");
    }

    #[test]
    fn deterministic_env_never_repeats() {
        let env = DeterministicEnv::new(0xAB);
        let a: [u8; 12] = env.random_array().unwrap();
        let b: [u8; 12] = env.clone().random_array().unwrap();

        assert_ne!(a, b);
        assert_eq!(&a[..8], &0u64.to_be_bytes());
        assert_eq!(&b[..8], &1u64.to_be_bytes());
        assert_eq!(&a[8..], &[0xAB; 4]);
    }

    #[test]
    fn deterministic_env_is_reproducible() {
        let first: [u8; 16] = DeterministicEnv::new(1).random_array().unwrap();
        let second: [u8; 16] = DeterministicEnv::new(1).random_array().unwrap();
        assert_eq!(first, second);
    }
}
