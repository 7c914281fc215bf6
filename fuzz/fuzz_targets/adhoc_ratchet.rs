//! Fuzz target for the ad-hoc channel ratchet
//!
//! Drives a sender and a receiver chain seeded from the same master key with
//! arbitrary seal, deliver, drop and forge operations.
//!
//! # Invariants
//!
//! - Never panics
//! - A delivered envelope ahead of the receiver (within the skip limit)
//!   opens to the sealed plaintext
//! - An envelope at or behind the receiver never opens
//! - A forged envelope never moves the receiver

#![no_main]

use amsel_crypto::{AdHocRatchet, CipherError, MasterKey, MAX_SKIP};
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Scenario {
    master: [u8; 32],
    room: String,
    operations: Vec<Operation>,
}

#[derive(Debug, Arbitrary)]
enum Operation {
    /// Seal a message and queue it
    Seal { message: Vec<u8>, nonce: [u8; 12] },
    /// Deliver a queued envelope to the receiver
    Deliver { pick: u8 },
    /// Drop a queued envelope
    Drop { pick: u8 },
    /// Deliver garbage at an arbitrary position
    Forge { position: u64, body: Vec<u8> },
}

fuzz_target!(|scenario: Scenario| {
    let master = MasterKey::from_bytes(scenario.master);
    let mut sender = AdHocRatchet::new(&master, &scenario.room);
    let mut receiver = AdHocRatchet::new(&master, &scenario.room);
    let mut queue: Vec<(u64, Vec<u8>, Vec<u8>)> = Vec::new();

    for operation in scenario.operations.into_iter().take(256) {
        match operation {
            Operation::Seal { message, nonce } => {
                let (position, body) = sender.seal_next(&message, nonce).expect("sender chain");
                queue.push((position, message, body));
            },
            Operation::Deliver { pick } => {
                if queue.is_empty() {
                    continue;
                }
                let (position, message, body) = queue.remove(usize::from(pick) % queue.len());
                let before = receiver.position();

                match receiver.open_at(position, &body) {
                    Ok(opened) => {
                        assert!(position > before);
                        assert_eq!(opened, message);
                        assert_eq!(receiver.position(), position);
                    },
                    Err(CipherError::PositionPassed { .. }) => assert!(position <= before),
                    Err(CipherError::SkipLimitExceeded { .. }) => {
                        assert!(position - before > MAX_SKIP)
                    },
                    Err(e) => panic!("genuine envelope failed: {e}"),
                }
            },
            Operation::Drop { pick } => {
                if !queue.is_empty() {
                    queue.remove(usize::from(pick) % queue.len());
                }
            },
            Operation::Forge { position, body } => {
                let before = receiver.position();
                assert!(receiver.open_at(position, &body).is_err());
                assert_eq!(receiver.position(), before);
            },
        }
    }
});
