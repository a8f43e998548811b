//! Fixed five-color palette indexed by sprite.

#[cfg(test)]
#[path = "palette_test.rs"]
mod palette_test;

use protocol::{Entity, ProtocolError, Snapshot};

use crate::consts::SELF_SPRITE;

/// CSS color names, indexed by sprite.
pub const COLORS: [&str; 5] = ["red", "blue", "green", "yellow", "purple"];

/// Look up the color for a sprite index.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidSprite`] for an index past the palette.
pub fn color(sprite: u8) -> Result<&'static str, ProtocolError> {
    COLORS
        .get(usize::from(sprite))
        .copied()
        .ok_or(ProtocolError::InvalidSprite { sprite })
}

/// Sprite to draw `entity` with: the local player is always [`SELF_SPRITE`].
#[must_use]
pub fn render_sprite(snapshot: &Snapshot, entity: &Entity) -> u8 {
    if snapshot.is_local(entity) { SELF_SPRITE } else { entity.sprite() }
}
