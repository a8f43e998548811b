//! Binary wire protocol for the skirmish game client.
//!
//! This crate owns both directions of the wire: the snapshot stream pushed by
//! the server on every tick and the fixed-size input messages the client sends
//! back. Everything here is pure byte manipulation with no I/O, so the browser
//! client (`canvas`) and the native client share one codec.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`snapshot`] | Entity records, the per-tag length table, snapshot decode/encode |
//! | [`input`] | Key and click events and their one/five byte encodings |
//! | [`session`] | Explicit client state: connection lifecycle, last snapshot, input gating |

pub mod input;
pub mod session;
pub mod snapshot;

pub use input::{InputEvent, Key, decode_input, encode_click, encode_key_transition};
pub use session::{ConnectionState, Session};
pub use snapshot::{Entity, EntityKind, Snapshot, decode_snapshot, encode_snapshot};

/// Error raised for any malformed message in either direction.
///
/// Decoding never reads past the end of the buffer; every length problem is
/// reported through one of these variants instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The message has no bytes at all, so not even the footer is present.
    #[error("empty snapshot message: missing footer byte")]
    Empty,
    /// A record starts with a tag outside the known entity set.
    #[error("unknown entity tag {tag} at offset {offset}")]
    UnknownTag { tag: u8, offset: usize },
    /// A record's fixed length runs past the footer.
    #[error("truncated {kind:?} record at offset {offset}: needs {needed} bytes, {available} left")]
    Truncated {
        kind: EntityKind,
        offset: usize,
        needed: usize,
        available: usize,
    },
    /// A sprite index that does not name a palette entry.
    #[error("sprite index {sprite} is outside the palette")]
    InvalidSprite { sprite: u8 },
    /// An upstream input message with a length no input event has.
    #[error("invalid input message length {len}")]
    InvalidInput { len: usize },
    /// An upstream input message with an unassigned leading code.
    #[error("unknown input code {code}")]
    UnknownInputCode { code: u8 },
}
