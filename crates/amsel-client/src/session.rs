//! Session lifecycle: unlock, lock and access to the unlocked state.
//!
//! # Locking
//!
//! ```text
//! state: RwLock<Option<Unlocked>>
//!          │ read guard held for a whole operation
//!          ▼
//!        Unlocked { master, rooms, logs, direct }
//!                     │ map Mutex held only to look up / insert
//!                     ▼
//!                  Arc<Mutex<per-room / per-conversation / per-channel state>>
//! ```
//!
//! `lock()` takes the write guard, so it waits for every in-flight operation
//! and then drops the whole `Unlocked` value at once. Key material zeroizes on
//! drop. An operation either runs entirely against unlocked state or fails
//! with [`ClientError::Locked`].

use std::{
    collections::HashMap,
    fs::File,
    io,
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock},
};

use amsel_crypto::{MasterKey, MasterKeyError, StorageRatchet, derive_master_key};

use crate::{
    direct::DirectChannel,
    env::Environment,
    error::ClientError,
    room::RoomState,
    storage::LogStore,
};

/// An amsel session.
///
/// Owns the master key while unlocked, together with every piece of state
/// derived from it. Generic over the randomness source and the log store so
/// tests can run deterministically against memory.
pub struct Session<E: Environment, S: LogStore> {
    pub(crate) env: E,
    pub(crate) store: S,
    state: RwLock<Option<Unlocked>>,
}

/// Secrets that exist only while the session is unlocked.
pub(crate) struct Unlocked {
    pub(crate) master: MasterKey,
    /// Joined rooms by room code
    pub(crate) rooms: StateMap<RoomState>,
    /// Storage ratchets by conversation id
    pub(crate) logs: StateMap<StorageRatchet>,
    /// Ad-hoc channels by room code
    pub(crate) direct: StateMap<DirectChannel>,
}

pub(crate) type StateMap<T> = Mutex<HashMap<String, Arc<Mutex<T>>>>;

impl<E: Environment, S: LogStore> Session<E, S> {
    /// Create a locked session.
    pub fn new(env: E, store: S) -> Self {
        Self { env, store, state: RwLock::new(None) }
    }

    /// Derive the master key from profile bytes and a PIN and unlock.
    ///
    /// A wrong PIN unlocks successfully with a different key; nothing stored
    /// under the right key will open.
    ///
    /// # Errors
    ///
    /// - `MasterKey(MissingProfile)` for an empty profile
    /// - `MasterKey(InvalidPin)` if the PIN is not 12 characters
    /// - `AlreadyUnlocked` if the session holds a key
    pub fn unlock(&self, profile: &[u8], pin: &str) -> Result<(), ClientError> {
        let master = derive_master_key(profile, pin)?;
        self.install(master)
    }

    /// Unlock from a profile file, hashing it as a stream.
    ///
    /// # Errors
    ///
    /// - `MasterKey(MissingProfile)` if the file does not exist or is empty
    /// - `MasterKey(ReadFailure)` if it exists but cannot be read
    /// - as [`unlock`](Self::unlock) otherwise
    pub fn unlock_from_file(&self, path: impl AsRef<Path>, pin: &str) -> Result<(), ClientError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => MasterKeyError::MissingProfile,
            _ => MasterKeyError::ReadFailure { reason: e.to_string() },
        })?;

        let master = amsel_crypto::derive_master_key_from_reader(file, pin)?;
        self.install(master)
    }

    /// Drop the master key and all derived state.
    ///
    /// Waits for in-flight operations. Idempotent.
    pub fn lock(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.take().is_some() {
            tracing::info!("session locked");
        }
    }

    /// Whether the session currently holds a master key.
    pub fn is_unlocked(&self) -> bool {
        self.state.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// The log store this session writes to.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn install(&self, master: MasterKey) -> Result<(), ClientError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.is_some() {
            return Err(ClientError::AlreadyUnlocked);
        }

        *state = Some(Unlocked {
            master,
            rooms: Mutex::default(),
            logs: Mutex::default(),
            direct: Mutex::default(),
        });
        tracing::info!("session unlocked");
        Ok(())
    }

    /// Run `f` against the unlocked state, holding the read guard throughout.
    pub(crate) fn with_unlocked<T>(
        &self,
        f: impl FnOnce(&Unlocked) -> Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let unlocked = state.as_ref().ok_or(ClientError::Locked)?;
        f(unlocked)
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Existing entry for `key`, or a new one from `init`.
pub(crate) fn get_or_insert<T>(
    map: &StateMap<T>,
    key: &str,
    init: impl FnOnce() -> Result<T, ClientError>,
) -> Result<Arc<Mutex<T>>, ClientError> {
    let mut map = lock(map);
    if let Some(entry) = map.get(key) {
        return Ok(Arc::clone(entry));
    }

    let entry = Arc::new(Mutex::new(init()?));
    map.insert(key.to_owned(), Arc::clone(&entry));
    Ok(entry)
}

/// Existing entry for `key`.
pub(crate) fn get<T>(map: &StateMap<T>, key: &str) -> Option<Arc<Mutex<T>>> {
    lock(map).get(key).map(Arc::clone)
}
