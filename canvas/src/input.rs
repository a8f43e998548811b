//! Input model: how raw browser events become wire input.
//!
//! Keyboard events carry the browser key name and the OS auto-repeat flag;
//! only the first `keydown` of a held key may reach the encoder. Pointer clicks
//! carry a surface-relative offset, and [`ClickMode`] decides whether that
//! offset is sent as is or mapped back into world units first.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use protocol::Key;
use protocol::input::surface_to_click;

/// Whether a key went down or came up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPhase {
    Down,
    Up,
}

/// A keyboard event as delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    /// `KeyboardEvent.key`, e.g. `"w"`.
    pub key: String,
    pub phase: KeyPhase,
    /// Set on OS auto-repeat while the key stays held.
    pub repeat: bool,
}

impl KeyInput {
    #[must_use]
    pub fn down(key: &str, repeat: bool) -> Self {
        Self { key: key.to_owned(), phase: KeyPhase::Down, repeat }
    }

    #[must_use]
    pub fn up(key: &str) -> Self {
        Self { key: key.to_owned(), phase: KeyPhase::Up, repeat: false }
    }

    /// The tracked key this event refers to, if any.
    #[must_use]
    pub fn tracked(&self) -> Option<Key> {
        Key::from_browser_key(&self.key)
    }

    #[must_use]
    pub fn pressed(&self) -> bool {
        self.phase == KeyPhase::Down
    }
}

/// Coordinate space used for outbound clicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClickMode {
    /// Raw surface offset; the server applies any inverse scaling.
    #[default]
    Surface,
    /// Surface offset divided by the display factor.
    World,
}

impl ClickMode {
    /// Convert a surface offset into the coordinates placed on the wire.
    #[must_use]
    pub fn to_wire(self, offset_x: f64, offset_y: f64, factor: f64) -> (u16, u16) {
        match self {
            Self::Surface => surface_to_click(offset_x, offset_y),
            Self::World => surface_to_click(offset_x / factor, offset_y / factor),
        }
    }
}
