//! Persisted conversation log entries.
//!
//! Each entry is sealed with the next key of the storage ratchet chain that
//! matches its direction. The envelope records which chain and which counter,
//! so a reader can replay the chain from the start and find every key again.
//!
//! ```text
//! {"direction":"out","counter":1,"sealedBytes":"<base64 nonce||ciphertext||tag>"}
//! ```

use serde::{Deserialize, Serialize};

use crate::{codec, error::Result};

/// Which chain sealed a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Written by this user
    #[serde(rename = "out")]
    Outgoing,
    /// Received from a peer
    #[serde(rename = "in")]
    Incoming,
}

impl Direction {
    /// Both directions, outgoing first.
    pub const ALL: [Self; 2] = [Self::Outgoing, Self::Incoming];

    /// Wire label (`"out"` or `"in"`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Outgoing => "out",
            Self::Incoming => "in",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sealed entry of a conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LogEnvelope {
    /// Chain that sealed the entry
    pub direction: Direction,

    /// Chain counter of the sealing key. The first entry per direction is 1.
    pub counter: u64,

    /// `nonce || ciphertext || tag`
    #[serde(with = "crate::b64")]
    pub sealed_bytes: Vec<u8>,
}

impl LogEnvelope {
    /// Serialize to JSON bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        codec::encode(self)
    }

    /// Parse JSON bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        codec::decode(bytes)
    }
}
