//! Client session state shared by the render/input loops.
//!
//! DESIGN
//! ======
//! One struct owns everything the client remembers between events: the
//! transport lifecycle, the last decoded snapshot and a pair of counters.
//! Exactly one writer (the inbound message handler) replaces the snapshot,
//! and it does so completely before returning, so a reader on the same
//! thread only ever sees a whole snapshot or none.
//!
//! Input gating lives here too: auto-repeat key events and anything that
//! arrives while the transport is not open are dropped before encoding.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use crate::ProtocolError;
use crate::input::{CLICK_MESSAGE_LEN, KEY_MESSAGE_LEN, Key, encode_click, encode_key_transition};
use crate::snapshot::{Snapshot, decode_snapshot};

/// Transport lifecycle as observed by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Connection requested, not yet open.
    #[default]
    Connecting,
    /// Messages may flow in both directions.
    Open,
    /// The transport closed; no further inbound messages will arrive.
    Closed,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    state: ConnectionState,
    snapshot: Option<Snapshot>,
    received: u64,
    rejected: u64,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Transport lifecycle ---

    pub fn opened(&mut self) {
        self.state = ConnectionState::Open;
    }

    /// Mark the transport closed. The last snapshot stays readable.
    pub fn closed(&mut self) {
        self.state = ConnectionState::Closed;
    }

    // --- Inbound ---

    /// Decode an inbound message and make it the current snapshot.
    ///
    /// A rejected message clears the slot, so the next render tick has
    /// nothing to draw until a valid message arrives.
    ///
    /// # Errors
    ///
    /// Propagates the [`ProtocolError`] from [`decode_snapshot`].
    pub fn receive(&mut self, bytes: &[u8]) -> Result<&Snapshot, ProtocolError> {
        self.received += 1;
        match decode_snapshot(bytes) {
            Ok(snapshot) => Ok(self.snapshot.insert(snapshot)),
            Err(err) => {
                self.rejected += 1;
                self.snapshot = None;
                Err(err)
            }
        }
    }

    // --- Outbound ---

    /// Encode a key transition, or `None` when it must not be sent.
    #[must_use]
    pub fn key_transition(&self, key: Key, pressed: bool, repeat: bool) -> Option<[u8; KEY_MESSAGE_LEN]> {
        if repeat || !self.is_open() {
            return None;
        }
        Some(encode_key_transition(key, pressed))
    }

    /// Encode a click, or `None` while the transport is not open.
    #[must_use]
    pub fn click(&self, x: u16, y: u16) -> Option<[u8; CLICK_MESSAGE_LEN]> {
        self.is_open().then(|| encode_click(x, y))
    }

    // --- Queries ---

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    /// Footer id of the current snapshot.
    #[must_use]
    pub fn local_entity_id(&self) -> Option<u8> {
        self.snapshot.as_ref().map(|snapshot| snapshot.local_entity_id)
    }

    /// Inbound messages seen, valid or not.
    #[must_use]
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Inbound messages that failed to decode.
    #[must_use]
    pub fn rejected(&self) -> u64 {
        self.rejected
    }
}
