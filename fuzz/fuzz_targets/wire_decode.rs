//! Fuzz target for the JSON schemas
//!
//! Decodes arbitrary bytes as every externally supplied schema: relay frames,
//! log envelopes, direct envelopes and system payloads.
//!
//! The fuzzer should NEVER panic. Anything that decodes must re-encode and
//! decode to the same value.

#![no_main]

use amsel_proto::{DirectEnvelope, LogEnvelope, SystemPayload, WireFrame};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(frame) = WireFrame::decode(data) {
        let encoded = frame.encode().expect("decoded frame re-encodes");
        assert_eq!(WireFrame::decode(&encoded).expect("re-encoded frame decodes"), frame);
    }

    if let Ok(entry) = LogEnvelope::decode(data) {
        let encoded = entry.encode().expect("decoded entry re-encodes");
        assert_eq!(LogEnvelope::decode(&encoded).expect("re-encoded entry decodes"), entry);
    }

    let _ = DirectEnvelope::decode(data);
    let _ = SystemPayload::decode(data);
});
