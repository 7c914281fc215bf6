//! One-way HMAC chains for log storage and ad-hoc messages
//!
//! Each step:
//! 1. `new_chain_key = HMAC(chain_key, "chain-step")`
//! 2. `message_key = HMAC(new_chain_key, "msg-key")`
//! 3. The old chain key is overwritten and zeroized
//! 4. The counter is incremented; the returned key carries the new counter
//!
//! # Security Properties
//!
//! - Forward Secrecy: there is no accessor for a previous chain key, and the
//!   step function cannot be inverted
//! - Key Uniqueness: every counter yields its own message key
//! - Determinism: the same seed always produces the same key sequence, which
//!   is what allows a stored log to be replayed from counter 0

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::{
    aead::{self, NONCE_SIZE},
    error::CipherError,
    kdf::{KeyPurpose, derive_key},
    keys::{KEY_SIZE, MasterKey, MessageKey, SymmetricKey},
};

type HmacSha256 = Hmac<Sha256>;

/// Label for deriving the next chain key
const CHAIN_STEP_LABEL: &[u8] = b"chain-step";

/// Label for deriving a message key from the new chain key
const MESSAGE_KEY_LABEL: &[u8] = b"msg-key";

/// Maximum number of positions a chain may skip in one move.
///
/// Bounds the work an untrusted counter (wire position or stored log counter)
/// can cause.
pub const MAX_SKIP: u64 = 1000;

/// Forward-only HMAC chain.
///
/// Counter 0 is the seed. The first [`step()`](Self::step) yields the key for
/// counter 1.
pub struct HashChain {
    /// Current chain key
    chain_key: [u8; KEY_SIZE],
    /// Number of steps taken
    counter: u64,
}

impl HashChain {
    /// Start a chain from a seed key (counter 0).
    pub fn new(seed: &SymmetricKey) -> Self {
        Self { chain_key: *seed.as_bytes(), counter: 0 }
    }

    /// Number of steps taken so far (the counter of the last key produced).
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Advance one step and return the message key for the new counter.
    pub fn step(&mut self) -> Result<MessageKey, CipherError> {
        if self.counter == u64::MAX {
            return Err(CipherError::CounterOverflow { current: self.counter });
        }

        let next_chain_key = hmac(&self.chain_key, CHAIN_STEP_LABEL);
        let mut message_key = hmac(&next_chain_key, MESSAGE_KEY_LABEL);

        // Zeroize and replace the old chain key for forward secrecy
        self.chain_key.zeroize();
        self.chain_key = next_chain_key;
        self.counter += 1;

        let key = MessageKey::new(SymmetricKey::from_bytes(message_key), self.counter);
        message_key.zeroize();
        Ok(key)
    }

    /// Step forward until the chain reaches `target` and return that key.
    ///
    /// Intervening keys are derived and discarded.
    ///
    /// # Errors
    ///
    /// - `PositionPassed` if `target` is not ahead of the current counter
    /// - `SkipLimitExceeded` if `target` is more than [`MAX_SKIP`] ahead; the
    ///   chain does not move
    pub fn advance_to(&mut self, target: u64) -> Result<MessageKey, CipherError> {
        self.check_ahead(target)?;

        loop {
            let key = self.step()?;
            if key.position() == target {
                return Ok(key);
            }
        }
    }

    /// Step forward until the counter is at least `counter`, discarding keys.
    ///
    /// No-op if the chain is already there.
    ///
    /// # Errors
    ///
    /// - `SkipLimitExceeded` if `counter` is more than [`MAX_SKIP`] ahead; the
    ///   chain does not move
    pub fn fast_forward(&mut self, counter: u64) -> Result<(), CipherError> {
        if counter <= self.counter {
            return Ok(());
        }
        self.advance_to(counter).map(drop)
    }

    /// Check that `target` lies ahead of the chain, within [`MAX_SKIP`].
    pub fn check_ahead(&self, target: u64) -> Result<(), CipherError> {
        let current = self.counter;
        if target <= current {
            return Err(CipherError::PositionPassed { current, requested: target });
        }
        if target - current > MAX_SKIP {
            return Err(CipherError::SkipLimitExceeded { current, requested: target });
        }
        Ok(())
    }

    fn fork(&self) -> Self {
        Self { chain_key: self.chain_key, counter: self.counter }
    }
}

impl Drop for HashChain {
    fn drop(&mut self) {
        self.chain_key.zeroize();
    }
}

fn hmac(key: &[u8; KEY_SIZE], label: &[u8]) -> [u8; KEY_SIZE] {
    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        unreachable!("HMAC-SHA256 accepts any key size");
    };
    mac.update(label);
    mac.finalize().into_bytes().into()
}

/// Which chain of a [`StorageRatchet`] to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainDirection {
    /// Entries written by the local user
    Sending,
    /// Entries received from peers
    Receiving,
}

/// Two independent chains sealing the local conversation log.
///
/// Rebuilt from (master key, conversation id) every session and never
/// persisted. The intermediate root key is dropped as soon as both chains are
/// seeded, so holding the state does not allow re-deriving earlier keys.
pub struct StorageRatchet {
    sending: HashChain,
    receiving: HashChain,
}

impl StorageRatchet {
    /// Seed both chains for a conversation.
    pub fn new(master: &MasterKey, conversation_id: &str) -> Self {
        let root = derive_key(
            master.as_bytes(),
            Some(conversation_id.as_bytes()),
            KeyPurpose::LogRatchetRoot,
            b"",
        );
        let send_seed = derive_key(root.as_bytes(), None, KeyPurpose::LogRatchetSend, b"");
        let recv_seed = derive_key(root.as_bytes(), None, KeyPurpose::LogRatchetRecv, b"");

        Self { sending: HashChain::new(&send_seed), receiving: HashChain::new(&recv_seed) }
    }

    /// Next key of the sending chain and its counter.
    pub fn next_sending_key(&mut self) -> Result<(MessageKey, u64), CipherError> {
        self.next_key(ChainDirection::Sending)
    }

    /// Next key of the receiving chain and its counter.
    pub fn next_receiving_key(&mut self) -> Result<(MessageKey, u64), CipherError> {
        self.next_key(ChainDirection::Receiving)
    }

    /// Next key of the chain for `direction` and its counter.
    pub fn next_key(
        &mut self,
        direction: ChainDirection,
    ) -> Result<(MessageKey, u64), CipherError> {
        let key = self.chain_mut(direction).step()?;
        let counter = key.position();
        Ok((key, counter))
    }

    /// Key for a stored entry at `counter`, stepping the chain forward.
    ///
    /// # Errors
    ///
    /// As [`HashChain::advance_to`].
    pub fn key_at(
        &mut self,
        direction: ChainDirection,
        counter: u64,
    ) -> Result<MessageKey, CipherError> {
        self.chain_mut(direction).advance_to(counter)
    }

    /// Open a stored entry sealed at `counter`.
    ///
    /// Used when replaying a log in append order. The chain only moves when
    /// the entry authenticates, so an entry with a corrupted counter cannot
    /// push the chain past the entries that follow it.
    ///
    /// # Errors
    ///
    /// As [`key_at`](Self::key_at), plus `DecryptFailure` if the tag does not
    /// verify.
    pub fn open_at(
        &mut self,
        direction: ChainDirection,
        counter: u64,
        combined: &[u8],
    ) -> Result<Vec<u8>, CipherError> {
        let chain = self.chain_mut(direction);
        let mut scratch = chain.fork();
        let key = scratch.advance_to(counter)?;
        let plaintext = aead::open_combined(key.key(), combined)?;

        *chain = scratch;
        Ok(plaintext)
    }

    /// Skip the chain past a counter already used by a stored entry.
    ///
    /// # Errors
    ///
    /// As [`HashChain::fast_forward`].
    pub fn fast_forward(
        &mut self,
        direction: ChainDirection,
        counter: u64,
    ) -> Result<(), CipherError> {
        self.chain_mut(direction).fast_forward(counter)
    }

    /// Counter of the last key produced by the sending chain.
    pub fn sending_counter(&self) -> u64 {
        self.sending.counter()
    }

    /// Counter of the last key produced by the receiving chain.
    pub fn receiving_counter(&self) -> u64 {
        self.receiving.counter()
    }

    fn chain_mut(&mut self, direction: ChainDirection) -> &mut HashChain {
        match direction {
            ChainDirection::Sending => &mut self.sending,
            ChainDirection::Receiving => &mut self.receiving,
        }
    }
}

/// Single chain for channel-agnostic payloads (direct and system messages).
///
/// Both parties seed the same chain from (master key, room code). The
/// position of every key travels with the message so a receiver never has to
/// infer it.
pub struct AdHocRatchet {
    chain: HashChain,
}

impl AdHocRatchet {
    /// Seed the chain for a room.
    pub fn new(master: &MasterKey, room_code: &str) -> Self {
        let seed = derive_key(
            master.as_bytes(),
            Some(room_code.as_bytes()),
            KeyPurpose::AdHocMessageRoot,
            b"",
        );
        Self { chain: HashChain::new(&seed) }
    }

    /// Next encryption key. Its position must be sent with the message.
    pub fn next_encryption_key(&mut self) -> Result<MessageKey, CipherError> {
        self.chain.step()
    }

    /// Position of the last key produced.
    pub fn position(&self) -> u64 {
        self.chain.counter()
    }

    /// Key for an incoming message at `position`.
    ///
    /// # Errors
    ///
    /// - `PositionPassed` for positions at or behind the chain (replays or
    ///   messages that arrived after a later one)
    /// - `SkipLimitExceeded` if `position` is more than [`MAX_SKIP`] ahead
    pub fn key_at(&mut self, position: u64) -> Result<MessageKey, CipherError> {
        self.chain.advance_to(position)
    }

    /// Seal `plaintext` with the next key, returning its position and
    /// `nonce || ciphertext || tag`.
    pub fn seal_next(
        &mut self,
        plaintext: &[u8],
        nonce: [u8; NONCE_SIZE],
    ) -> Result<(u64, Vec<u8>), CipherError> {
        let key = self.chain.step()?;
        Ok((key.position(), aead::seal_combined(key.key(), nonce, plaintext)))
    }

    /// Open a payload sealed at `position`.
    ///
    /// The chain only moves when the payload authenticates. A forged payload
    /// claiming a far position leaves the receiver where it was.
    ///
    /// # Errors
    ///
    /// As [`key_at`](Self::key_at), plus `DecryptFailure` if the tag does not
    /// verify.
    pub fn open_at(&mut self, position: u64, combined: &[u8]) -> Result<Vec<u8>, CipherError> {
        let mut scratch = self.chain.fork();
        let key = scratch.advance_to(position)?;
        let plaintext = aead::open_combined(key.key(), combined)?;

        self.chain = scratch;
        Ok(plaintext)
    }
}
