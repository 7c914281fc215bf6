//! Room transport: join, leave, send and receive chat messages.
//!
//! Each joined room holds its transport root and the local sender's message
//! index. Sending increments the index first, so the first message carries
//! `k = 1`. Receiving is stateless per index.

use amsel_crypto::{
    ALGORITHM_LABEL, TransportRootKey, derive_transport_root, open_at_index, seal_for_index,
};
use amsel_proto::{ChatMessage, WireFrame};

use crate::{
    env::Environment,
    error::{ClientError, unreadable},
    session::{Session, get, get_or_insert, lock},
    storage::LogStore,
};

/// Transport state of one joined room.
pub(crate) struct RoomState {
    root: TransportRootKey,
    /// Index of the last message sent (0 before the first send)
    last_index: u64,
}

impl<E: Environment, S: LogStore> Session<E, S> {
    /// Join `code`, deriving its transport root.
    ///
    /// Joining a room that is already joined keeps its current message index.
    pub fn join_room(&self, code: &str) -> Result<WireFrame, ClientError> {
        self.with_unlocked(|unlocked| {
            get_or_insert(&unlocked.rooms, code, || {
                tracing::info!(room = code, "joined room");
                Ok(RoomState { root: derive_transport_root(&unlocked.master, code), last_index: 0 })
            })?;
            Ok(WireFrame::join(code))
        })
    }

    /// Leave `code`, discarding its transport root.
    ///
    /// # Errors
    ///
    /// - `NotJoined` if the room is not joined
    pub fn leave_room(&self, code: &str) -> Result<WireFrame, ClientError> {
        self.with_unlocked(|unlocked| {
            if lock(&unlocked.rooms).remove(code).is_none() {
                return Err(ClientError::NotJoined { code: code.to_owned() });
            }
            tracing::info!(room = code, "left room");
            Ok(WireFrame::leave(code))
        })
    }

    /// Rooms currently joined, sorted.
    pub fn joined_rooms(&self) -> Result<Vec<String>, ClientError> {
        self.with_unlocked(|unlocked| {
            let mut codes: Vec<String> = lock(&unlocked.rooms).keys().cloned().collect();
            codes.sort();
            Ok(codes)
        })
    }

    /// Seal `plaintext` for `code` under the next message index.
    ///
    /// # Errors
    ///
    /// - `NotJoined` if the room is not joined
    /// - `Entropy` if no nonce could be drawn; the index is not consumed
    /// - `CounterExhausted` if the index would overflow
    pub fn send_text(&self, code: &str, plaintext: &str) -> Result<WireFrame, ClientError> {
        self.with_unlocked(|unlocked| {
            let room = get(&unlocked.rooms, code)
                .ok_or_else(|| ClientError::NotJoined { code: code.to_owned() })?;
            let mut room = lock(&room);

            let nonce = self.env.random_array()?;
            let index = room.last_index.checked_add(1).ok_or(ClientError::CounterExhausted)?;
            room.last_index = index;

            let body = seal_for_index(&room.root, index, plaintext.as_bytes(), nonce);
            tracing::trace!(room = code, index, "sealed message");

            Ok(WireFrame::Msg(ChatMessage {
                code: code.to_owned(),
                body,
                k: index,
                enc: ALGORITHM_LABEL.to_owned(),
            }))
        })
    }

    /// Open a received chat message.
    ///
    /// # Errors
    ///
    /// - `UnsupportedCipher` if `enc` is not the implemented cipher
    /// - `NotJoined` if the message's room is not joined
    /// - `Unreadable` if the body fails authentication
    /// - `InvalidPayload` if the authenticated body is not UTF-8
    pub fn receive_text(&self, message: &ChatMessage) -> Result<String, ClientError> {
        if message.enc != ALGORITHM_LABEL {
            tracing::warn!(room = %message.code, enc = %message.enc, "unsupported cipher");
            return Err(ClientError::UnsupportedCipher(message.enc.clone()));
        }

        self.with_unlocked(|unlocked| {
            let room = get(&unlocked.rooms, &message.code)
                .ok_or_else(|| ClientError::NotJoined { code: message.code.clone() })?;
            let room = lock(&room);

            let plaintext = open_at_index(&room.root, message.k, &message.body)
                .map_err(|e| unreadable("room message", &e))?;

            String::from_utf8(plaintext)
                .map_err(|_| ClientError::InvalidPayload("message is not UTF-8".into()))
        })
    }

    /// Open any received frame that carries a chat message.
    ///
    /// Returns `None` for frames without text (`join`, `leave`, `error`).
    pub fn receive_frame(&self, frame: &WireFrame) -> Result<Option<String>, ClientError> {
        match frame {
            WireFrame::Msg(message) => self.receive_text(message).map(Some),
            WireFrame::Error(error) => {
                tracing::warn!(message = %error.message, "relay reported an error");
                Ok(None)
            },
            WireFrame::Join(_) | WireFrame::Leave(_) => Ok(None),
        }
    }
}
