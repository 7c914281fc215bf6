//! Ad-hoc (direct and system) payload envelope.
//!
//! `n` is the sender's ad-hoc chain position for the sealing key. Receivers
//! step their own chain to exactly that position instead of assuming the
//! next key, so a dropped envelope never desynchronizes the channel.

use serde::{Deserialize, Serialize};

use crate::{codec, error::Result};

/// Sealed ad-hoc payload with its chain position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectEnvelope {
    /// Chain position of the sealing key (first key is 1)
    pub n: u64,

    /// `nonce || ciphertext || tag`
    #[serde(with = "crate::b64")]
    pub body: Vec<u8>,
}

impl DirectEnvelope {
    /// Serialize to JSON bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        codec::encode(self)
    }

    /// Parse JSON bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        codec::decode(bytes)
    }
}
