//! amsel Protocol Schemas
//!
//! JSON shapes exchanged with the relay and written to disk. Nothing in this
//! crate touches key material: bodies arrive here already sealed and leave
//! still sealed.
//!
//! # Schemas
//!
//! - [`WireFrame`]: relay frames, discriminated by a `type` field
//! - [`LogEnvelope`]: one sealed entry of a persisted conversation log
//! - [`DirectEnvelope`]: an ad-hoc payload with its explicit chain position
//! - [`SystemPayload`]: the flat string map stored in system containers
//!
//! # Invariants
//!
//! Decoding is strict. Unknown `type` values, unknown fields and nested
//! values where a string is expected are errors, never silently dropped.
//! Binary fields are standard base64 with padding.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod b64;
mod codec;
pub mod direct;
pub mod error;
pub mod log;
pub mod system;
pub mod wire;

pub use codec::MAX_MESSAGE_SIZE;
pub use direct::DirectEnvelope;
pub use error::{ProtocolError, Result};
pub use log::{Direction, LogEnvelope};
pub use system::SystemPayload;
pub use wire::{ChatMessage, ErrorFrame, RoomRef, WireFrame};
