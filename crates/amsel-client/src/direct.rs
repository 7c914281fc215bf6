//! Ad-hoc channel for direct and system payloads.
//!
//! Both ends seed the same chain from (master key, room code). Sealing takes
//! the next key of the local sending chain and records its position in the
//! envelope. Opening steps a separate receiving chain to exactly that
//! position, so envelopes may be skipped but never replayed.

use amsel_crypto::{AdHocRatchet, CipherError, MasterKey};
use amsel_proto::DirectEnvelope;

use crate::{
    env::Environment,
    error::{ClientError, unreadable},
    session::{Session, get_or_insert, lock},
    storage::LogStore,
};

/// Sending and receiving chains of one ad-hoc channel.
pub(crate) struct DirectChannel {
    sending: AdHocRatchet,
    receiving: AdHocRatchet,
}

impl DirectChannel {
    fn new(master: &MasterKey, code: &str) -> Self {
        Self {
            sending: AdHocRatchet::new(master, code),
            receiving: AdHocRatchet::new(master, code),
        }
    }
}

impl<E: Environment, S: LogStore> Session<E, S> {
    /// Seal `payload` for the ad-hoc channel of `code`.
    pub fn seal_direct(&self, code: &str, payload: &[u8]) -> Result<DirectEnvelope, ClientError> {
        self.with_unlocked(|unlocked| {
            let channel = get_or_insert(&unlocked.direct, code, || {
                Ok(DirectChannel::new(&unlocked.master, code))
            })?;
            let mut channel = lock(&channel);

            let nonce = self.env.random_array()?;
            let (n, body) = channel
                .sending
                .seal_next(payload, nonce)
                .map_err(|_| ClientError::CounterExhausted)?;

            tracing::trace!(room = code, n, "sealed direct payload");
            Ok(DirectEnvelope { n, body })
        })
    }

    /// Open an envelope received on the ad-hoc channel of `code`.
    ///
    /// # Errors
    ///
    /// - `OutOfSequence` if `n` is at or behind the receiving chain, or more
    ///   than [`amsel_crypto::MAX_SKIP`] ahead of it
    /// - `Unreadable` if the body fails authentication; the chain does not
    ///   move
    pub fn open_direct(
        &self,
        code: &str,
        envelope: &DirectEnvelope,
    ) -> Result<Vec<u8>, ClientError> {
        self.with_unlocked(|unlocked| {
            let channel = get_or_insert(&unlocked.direct, code, || {
                Ok(DirectChannel::new(&unlocked.master, code))
            })?;
            let mut channel = lock(&channel);

            channel.receiving.open_at(envelope.n, &envelope.body).map_err(|e| match e {
                CipherError::PositionPassed { current, requested }
                | CipherError::SkipLimitExceeded { current, requested } => {
                    tracing::warn!(room = code, current, requested, "direct payload out of order");
                    ClientError::OutOfSequence { current, requested }
                },
                CipherError::CounterOverflow { .. } => ClientError::CounterExhausted,
                CipherError::DecryptFailure => unreadable("direct payload", &e),
            })
        })
    }
}
