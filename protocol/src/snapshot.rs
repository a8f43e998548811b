//! Snapshot stream: the world state pushed by the server every tick.
//!
//! DESIGN
//! ======
//! A message is `record* footer`. Each record opens with a one-byte tag and
//! has a fixed length determined by that tag alone; no entity count is sent,
//! so the decoder walks records until it reaches the footer. The footer is a
//! single byte naming the entity id of the receiving player.
//!
//! | tag | kind | len | fields after the tag |
//! |-----|------|-----|----------------------|
//! | 0 | User | 10 | sprite, animation, entity_id, width, height: u8; x, y: u16 |
//! | 1 | Platform | 8 | sprite, width, height: u8; x, y: u16 |
//! | 3 | Bullet | 10 | sprite: u8; origin_x, origin_y, end_x, end_y: u16 |
//!
//! All `u16` fields are big-endian and are read through byte offsets, never by
//! reinterpreting the buffer as wider words. Adding an entity kind means adding
//! one row to [`EntityKind`]; the decode loop itself does not change.

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod snapshot_test;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Number of trailing bytes after the last record.
pub const FOOTER_LEN: usize = 1;

/// The closed set of record kinds the server emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    User,
    Platform,
    Bullet,
}

impl EntityKind {
    /// Every kind, in tag order.
    pub const ALL: [Self; 3] = [Self::User, Self::Platform, Self::Bullet];

    /// Leading byte that identifies this record kind on the wire.
    #[must_use]
    pub fn tag(self) -> u8 {
        match self {
            Self::User => 0,
            Self::Platform => 1,
            Self::Bullet => 3,
        }
    }

    /// Full record length in bytes, tag included.
    #[must_use]
    pub fn record_len(self) -> usize {
        match self {
            Self::User | Self::Bullet => 10,
            Self::Platform => 8,
        }
    }

    /// Look up the kind for a wire tag.
    #[must_use]
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

/// One decoded record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Entity {
    /// A player avatar.
    User {
        sprite: u8,
        animation: u8,
        entity_id: u8,
        width: u8,
        height: u8,
        x: u16,
        y: u16,
    },
    /// Static level geometry.
    Platform {
        sprite: u8,
        width: u8,
        height: u8,
        x: u16,
        y: u16,
    },
    /// A shot drawn as a segment from its origin to where it stopped.
    Bullet {
        sprite: u8,
        origin_x: u16,
        origin_y: u16,
        end_x: u16,
        end_y: u16,
    },
}

impl Entity {
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::User { .. } => EntityKind::User,
            Self::Platform { .. } => EntityKind::Platform,
            Self::Bullet { .. } => EntityKind::Bullet,
        }
    }

    /// Sprite index as transmitted.
    #[must_use]
    pub fn sprite(&self) -> u8 {
        match self {
            Self::User { sprite, .. } | Self::Platform { sprite, .. } | Self::Bullet { sprite, .. } => *sprite,
        }
    }

    /// Parse a record whose length has already been checked against its kind.
    fn read(kind: EntityKind, record: &[u8]) -> Self {
        let mut fields = Fields { bytes: record, at: 1 };
        match kind {
            EntityKind::User => Self::User {
                sprite: fields.u8(),
                animation: fields.u8(),
                entity_id: fields.u8(),
                width: fields.u8(),
                height: fields.u8(),
                x: fields.u16(),
                y: fields.u16(),
            },
            EntityKind::Platform => Self::Platform {
                sprite: fields.u8(),
                width: fields.u8(),
                height: fields.u8(),
                x: fields.u16(),
                y: fields.u16(),
            },
            EntityKind::Bullet => Self::Bullet {
                sprite: fields.u8(),
                origin_x: fields.u16(),
                origin_y: fields.u16(),
                end_x: fields.u16(),
                end_y: fields.u16(),
            },
        }
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.push(self.kind().tag());
        match *self {
            Self::User { sprite, animation, entity_id, width, height, x, y } => {
                out.extend_from_slice(&[sprite, animation, entity_id, width, height]);
                out.extend_from_slice(&x.to_be_bytes());
                out.extend_from_slice(&y.to_be_bytes());
            }
            Self::Platform { sprite, width, height, x, y } => {
                out.extend_from_slice(&[sprite, width, height]);
                out.extend_from_slice(&x.to_be_bytes());
                out.extend_from_slice(&y.to_be_bytes());
            }
            Self::Bullet { sprite, origin_x, origin_y, end_x, end_y } => {
                out.push(sprite);
                for word in [origin_x, origin_y, end_x, end_y] {
                    out.extend_from_slice(&word.to_be_bytes());
                }
            }
        }
    }
}

/// Sequential field reader over one length-checked record.
struct Fields<'a> {
    bytes: &'a [u8],
    at: usize,
}

impl Fields<'_> {
    fn u8(&mut self) -> u8 {
        let value = self.bytes[self.at];
        self.at += 1;
        value
    }

    fn u16(&mut self) -> u16 {
        let value = u16::from_be_bytes([self.bytes[self.at], self.bytes[self.at + 1]]);
        self.at += 2;
        value
    }
}

/// The decoded content of one server message.
///
/// Entity order is stream order, which is also draw order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub entities: Vec<Entity>,
    /// Entity id of the receiving player, taken from the footer.
    pub local_entity_id: u8,
}

impl Snapshot {
    #[must_use]
    pub fn new(entities: Vec<Entity>, local_entity_id: u8) -> Self {
        Self { entities, local_entity_id }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether `entity` is the user the footer names.
    #[must_use]
    pub fn is_local(&self, entity: &Entity) -> bool {
        matches!(entity, Entity::User { entity_id, .. } if *entity_id == self.local_entity_id)
    }

    /// The first user record matching the footer, if the server sent one.
    #[must_use]
    pub fn local_user(&self) -> Option<&Entity> {
        self.entities.iter().find(|entity| self.is_local(entity))
    }

    /// Count of records of the given kind.
    #[must_use]
    pub fn count(&self, kind: EntityKind) -> usize {
        self.entities.iter().filter(|entity| entity.kind() == kind).count()
    }
}

/// Decode one server message into a [`Snapshot`].
///
/// # Errors
///
/// Returns [`ProtocolError::Empty`] when there is no footer byte,
/// [`ProtocolError::UnknownTag`] for a tag outside [`EntityKind`], and
/// [`ProtocolError::Truncated`] when a record would overlap the footer.
pub fn decode_snapshot(bytes: &[u8]) -> Result<Snapshot, ProtocolError> {
    let Some((&local_entity_id, body)) = bytes.split_last() else {
        return Err(ProtocolError::Empty);
    };

    let mut entities = Vec::new();
    let mut offset = 0;
    while let Some(&tag) = body.get(offset) {
        let kind = EntityKind::from_tag(tag).ok_or(ProtocolError::UnknownTag { tag, offset })?;
        let needed = kind.record_len();
        let Some(record) = body.get(offset..offset + needed) else {
            return Err(ProtocolError::Truncated {
                kind,
                offset,
                needed,
                available: body.len() - offset,
            });
        };
        entities.push(Entity::read(kind, record));
        offset += needed;
    }

    Ok(Snapshot { entities, local_entity_id })
}

/// Encode a snapshot the way the server lays it out: records in order, then the footer.
#[must_use]
pub fn encode_snapshot(snapshot: &Snapshot) -> Vec<u8> {
    let body_len: usize = snapshot.entities.iter().map(|e| e.kind().record_len()).sum();
    let mut out = Vec::with_capacity(body_len + FOOTER_LEN);
    for entity in &snapshot.entities {
        entity.write(&mut out);
    }
    out.push(snapshot.local_entity_id);
    out
}
