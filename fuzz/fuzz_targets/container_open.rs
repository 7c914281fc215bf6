//! Fuzz target for secret container parsing
//!
//! # Strategy
//!
//! - Raw arbitrary bytes as a container
//! - A valid container with one mutated byte
//! - A valid container truncated at an arbitrary length
//!
//! # Invariants
//!
//! - Opening never panics
//! - Any mutation of a valid container fails to open
//! - Truncation below the full length fails to open

#![no_main]

use amsel_crypto::{open_container, seal_container, ContainerFormat, MasterKey};
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Input {
    Raw(Vec<u8>),
    Mutated { payload: Vec<u8>, notes: bool, offset: u16, xor: u8 },
    Truncated { payload: Vec<u8>, notes: bool, keep: u16 },
}

fn sealed(payload: &[u8], notes: bool, master: &MasterKey) -> Vec<u8> {
    let format = if notes { ContainerFormat::Notes } else { ContainerFormat::System };
    seal_container(format, payload, master, [3; 16], [4; 12])
}

fuzz_target!(|input: Input| {
    let master = MasterKey::from_bytes([0x42; 32]);

    match input {
        Input::Raw(bytes) => {
            let _ = open_container(&bytes, &master);
        },
        Input::Mutated { payload, notes, offset, xor } => {
            let mut container = sealed(&payload, notes, &master);
            if xor == 0 {
                return;
            }
            let index = usize::from(offset) % container.len();
            container[index] ^= xor;
            assert!(open_container(&container, &master).is_err(), "mutated byte {index} opened");
        },
        Input::Truncated { payload, notes, keep } => {
            let container = sealed(&payload, notes, &master);
            let keep = usize::from(keep) % container.len();
            assert!(open_container(&container[..keep], &master).is_err());
        },
    }
});
