//! End-to-end session tests.
//!
//! These tests drive the public `Session` API the way the UI and network
//! layers do:
//! - Two sessions exchanging JSON wire frames
//! - A conversation log that outlives the process (redb on disk)
//! - Locking while other threads are mid-operation
//! - RNG failure surfacing as an error instead of a weak nonce

use std::{sync::Barrier, thread};

use amsel_client::{
    ClientError, Direction, Environment, LogBody, LogStore, MemoryLogStore, RedbLogStore, Session,
    SystemEnv, SystemPayload, WireFrame,
};
use tempfile::tempdir;

const PROFILE: &[u8] = b"profile-fixture";
const PIN: &str = "012345678901";

fn unlocked<S: LogStore>(store: S) -> Session<SystemEnv, S> {
    let session = Session::new(SystemEnv::new(), store);
    session.unlock(PROFILE, PIN).expect("unlock");
    session
}

/// Environment whose RNG always fails.
#[derive(Clone)]
struct BrokenRng;

impl Environment for BrokenRng {
    fn random_bytes(&self, _buffer: &mut [u8]) -> Result<(), ClientError> {
        Err(ClientError::Entropy("device unavailable".into()))
    }
}

/// Alice and Bob share a profile (the same user on two devices) and talk
/// through the relay's JSON frames.
#[test]
fn two_sessions_exchange_wire_frames() {
    let alice = unlocked(MemoryLogStore::new());
    let bob = unlocked(MemoryLogStore::new());

    alice.join_room("room-7").expect("alice joins");
    bob.join_room("room-7").expect("bob joins");

    let mut received = Vec::new();
    for text in ["first", "second", "third"] {
        let frame = alice.send_text("room-7", text).expect("send");
        let bytes = frame.encode().expect("encode");

        let decoded = WireFrame::decode(&bytes).expect("decode");
        received.push(bob.receive_frame(&decoded).expect("receive").expect("text frame"));
    }

    assert_eq!(received, vec!["first", "second", "third"]);
}

/// Retried and reordered deliveries decrypt: transport keys depend only on
/// the index.
#[test]
fn reordered_and_retried_delivery() {
    let alice = unlocked(MemoryLogStore::new());
    let bob = unlocked(MemoryLogStore::new());
    alice.join_room("r").expect("join");
    bob.join_room("r").expect("join");

    let frames: Vec<_> = (1..=3)
        .map(|i| match alice.send_text("r", &format!("m{i}")).expect("send") {
            WireFrame::Msg(message) => message,
            other => panic!("unexpected frame {other:?}"),
        })
        .collect();

    assert_eq!(bob.receive_text(&frames[2]).expect("third"), "m3");
    assert_eq!(bob.receive_text(&frames[0]).expect("first"), "m1");
    assert_eq!(bob.receive_text(&frames[0]).expect("retried first"), "m1");
    assert_eq!(bob.receive_text(&frames[1]).expect("second"), "m2");
}

/// A different profile never reads another user's room traffic.
#[test]
fn other_profile_cannot_read_room() {
    let alice = unlocked(MemoryLogStore::new());
    let eve = Session::new(SystemEnv::new(), MemoryLogStore::new());
    eve.unlock(b"some-other-profile", PIN).expect("unlock");

    alice.join_room("r").expect("join");
    eve.join_room("r").expect("join");

    let WireFrame::Msg(message) = alice.send_text("r", "private").expect("send") else {
        panic!("expected msg frame");
    };
    assert_eq!(eve.receive_text(&message), Err(ClientError::Unreadable));
}

/// The log written in one process is readable after a restart, and the
/// restarted session continues the counters instead of reusing them.
///
/// WHY THIS TEST IS NEEDED:
/// Ratchet state is never persisted. If the resumed session did not
/// fast-forward past stored counters it would seal new entries under keys
/// that were already used.
#[test]
fn log_survives_restart() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("history.redb");

    {
        let session = unlocked(RedbLogStore::open(&path).expect("open"));
        session.append_to_log("alice", Direction::Outgoing, "hi alice").expect("append");
        session.append_to_log("alice", Direction::Incoming, "hi there").expect("append");
        session.append_to_log("alice", Direction::Outgoing, "how are you").expect("append");
        session.lock();
    }

    let session = unlocked(RedbLogStore::open(&path).expect("reopen"));
    let next = session.append_to_log("alice", Direction::Outgoing, "still there?").expect("append");
    assert_eq!(next.counter, 3);

    let records = session.read_log("alice").expect("read");
    let summary: Vec<_> =
        records.iter().map(|r| (r.direction, r.counter, r.body.clone())).collect();
    assert_eq!(
        summary,
        vec![
            (Direction::Outgoing, 1, LogBody::Text("hi alice".into())),
            (Direction::Incoming, 1, LogBody::Text("hi there".into())),
            (Direction::Outgoing, 2, LogBody::Text("how are you".into())),
            (Direction::Outgoing, 3, LogBody::Text("still there?".into())),
        ]
    );
    assert_eq!(session.conversations().expect("list"), vec!["alice".to_string()]);
}

/// Stored envelopes never contain plaintext.
#[test]
fn stored_log_is_sealed() {
    let store = MemoryLogStore::new();
    let session = unlocked(store.clone());
    session.append_to_log("c", Direction::Outgoing, "plaintext-marker").expect("append");

    let stored = store.load("c").expect("load");
    let encoded = stored[0].encode().expect("encode");
    let json = String::from_utf8(encoded).expect("utf8");
    assert!(!json.contains("plaintext-marker"));
    assert!(json.contains("\"sealedBytes\""));
}

/// Every operation fails with `Locked` once the session is locked, and no
/// state from before the lock is reused after a fresh unlock.
#[test]
fn lock_revokes_everything() {
    let dir = tempdir().expect("tempdir");
    let session = unlocked(MemoryLogStore::new());
    session.join_room("r").expect("join");
    let envelope = session.seal_direct("r", b"x").expect("seal");

    session.lock();

    assert_eq!(session.join_room("r"), Err(ClientError::Locked));
    assert_eq!(session.send_text("r", "x"), Err(ClientError::Locked));
    assert_eq!(session.append_to_log("c", Direction::Outgoing, "x"), Err(ClientError::Locked));
    assert_eq!(session.read_log("c"), Err(ClientError::Locked));
    assert_eq!(session.seal_direct("r", b"x"), Err(ClientError::Locked));
    assert_eq!(session.open_direct("r", &envelope), Err(ClientError::Locked));
    assert_eq!(session.save_note(dir.path().join("n"), "x"), Err(ClientError::Locked));
    assert_eq!(session.joined_rooms(), Err(ClientError::Locked));

    session.unlock(PROFILE, PIN).expect("unlock again");
    assert!(session.joined_rooms().expect("rooms").is_empty());
    assert_eq!(session.send_text("r", "x"), Err(ClientError::NotJoined { code: "r".into() }));
}

/// Appends racing a lock either complete entirely or fail with `Locked`;
/// none is half-written and counters stay unique.
#[test]
fn concurrent_appends_race_lock_cleanly() {
    const WRITERS: usize = 4;
    const APPENDS: usize = 50;

    let store = MemoryLogStore::new();
    let session = unlocked(store.clone());
    let start = Barrier::new(WRITERS + 1);

    let outcomes: Vec<Vec<Result<u64, ClientError>>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..WRITERS)
            .map(|w| {
                let session = &session;
                let start = &start;
                scope.spawn(move || {
                    start.wait();
                    (0..APPENDS)
                        .map(|i| {
                            session
                                .append_to_log("shared", Direction::Outgoing, &format!("{w}-{i}"))
                                .map(|e| e.counter)
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        start.wait();
        session.lock();

        handles.into_iter().map(|h| h.join().expect("writer thread")).collect()
    });

    let mut counters: Vec<u64> = Vec::new();
    for result in outcomes.into_iter().flatten() {
        match result {
            Ok(counter) => counters.push(counter),
            Err(err) => assert_eq!(err, ClientError::Locked),
        }
    }

    // Every successful append is stored exactly once with a unique counter
    assert_eq!(store.load("shared").expect("load").len(), counters.len());
    counters.sort_unstable();
    counters.dedup();
    assert_eq!(counters.len(), store.total_entry_count());

    session.unlock(PROFILE, PIN).expect("unlock");
    let records = session.read_log("shared").expect("read");
    assert!(records.iter().all(|r| matches!(r.body, LogBody::Text(_))));
}

/// Notes and system containers written by one session open in another
/// session with the same profile and PIN.
#[test]
fn secret_files_roundtrip_across_sessions() {
    let dir = tempdir().expect("tempdir");
    let note = dir.path().join("notes.amsn");
    let system = dir.path().join("system.amss");

    let writer = unlocked(MemoryLogStore::new());
    writer.save_note(&note, "buy milk").expect("save note");
    let mut payload = SystemPayload::new();
    payload.insert("relay", "wss://relay.example");
    writer.create_system_container(&system, &payload).expect("save system");
    drop(writer);

    let reader = unlocked(MemoryLogStore::new());
    assert_eq!(reader.load_note(&note).expect("load note"), "buy milk");
    assert_eq!(reader.load_system_container(&system).expect("load system"), payload);
}

/// Unlocking from a profile file matches unlocking from its bytes.
#[test]
fn unlock_from_profile_file() {
    let dir = tempdir().expect("tempdir");
    let profile = dir.path().join("user.profile");
    std::fs::write(&profile, PROFILE).expect("write profile");
    let note = dir.path().join("n.amsn");

    unlocked(MemoryLogStore::new()).save_note(&note, "from bytes").expect("save");

    let session = Session::new(SystemEnv::new(), MemoryLogStore::new());
    session.unlock_from_file(&profile, PIN).expect("unlock from file");
    assert_eq!(session.load_note(&note).expect("load"), "from bytes");
}

/// RNG failure aborts the operation and consumes nothing.
#[test]
fn entropy_failure_is_reported() {
    let session = Session::new(BrokenRng, MemoryLogStore::new());
    session.unlock(PROFILE, PIN).expect("unlock");
    session.join_room("r").expect("join");

    let err = session.send_text("r", "x").unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, ClientError::Entropy(_)));
    assert!(matches!(session.seal_direct("r", b"x"), Err(ClientError::Entropy(_))));
    assert!(matches!(
        session.append_to_log("c", Direction::Outgoing, "x"),
        Err(ClientError::Entropy(_))
    ));
    assert!(session.load_log("c").expect("load").is_empty());
}

/// Encryption overhead is a fixed 28 bytes (nonce + tag) at every size.
#[test]
fn transport_overhead_is_constant() {
    let session = unlocked(MemoryLogStore::new());
    session.join_room("r").expect("join");

    for size in [0, 1, 1_000, 100_000] {
        let text = "x".repeat(size);
        let WireFrame::Msg(message) = session.send_text("r", &text).expect("send") else {
            panic!("expected msg frame");
        };
        assert_eq!(message.body.len(), size + 28);
        assert_eq!(session.receive_text(&message).expect("receive").len(), size);
    }
}
