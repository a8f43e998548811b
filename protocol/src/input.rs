//! Upstream input messages.
//!
//! Key transitions are a single byte: each tracked key owns an even "pressed"
//! code and the odd code right after it for "released". A pointer click is five
//! bytes: tag `8` followed by the big-endian `x` and `y` surface offsets.
//! Messages are fire-and-forget; nothing here buffers or retries.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Length of a key transition message.
pub const KEY_MESSAGE_LEN: usize = 1;

/// Length of a click message.
pub const CLICK_MESSAGE_LEN: usize = 5;

/// Leading byte of a click message.
pub const CLICK_TAG: u8 = 8;

/// The movement keys the server understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Key {
    W,
    S,
    A,
    D,
}

impl Key {
    pub const ALL: [Self; 4] = [Self::W, Self::S, Self::A, Self::D];

    /// Wire code sent when the key goes down. The release code is this plus one.
    #[must_use]
    pub fn pressed_code(self) -> u8 {
        match self {
            Self::W => 0,
            Self::S => 2,
            Self::A => 4,
            Self::D => 6,
        }
    }

    #[must_use]
    pub fn released_code(self) -> u8 {
        self.pressed_code() + 1
    }

    #[must_use]
    pub fn code(self, pressed: bool) -> u8 {
        if pressed { self.pressed_code() } else { self.released_code() }
    }

    /// Map a browser `KeyboardEvent.key` value to a tracked key.
    ///
    /// Matching ignores ASCII case so caps lock or shift does not swallow movement.
    #[must_use]
    pub fn from_browser_key(name: &str) -> Option<Self> {
        match name {
            "w" | "W" => Some(Self::W),
            "s" | "S" => Some(Self::S),
            "a" | "A" => Some(Self::A),
            "d" | "D" => Some(Self::D),
            _ => None,
        }
    }

    /// Inverse of [`Key::code`].
    #[must_use]
    pub fn from_code(code: u8) -> Option<(Self, bool)> {
        Self::ALL.into_iter().find_map(|key| {
            if code == key.pressed_code() {
                Some((key, true))
            } else if code == key.released_code() {
                Some((key, false))
            } else {
                None
            }
        })
    }
}

/// One discrete input event headed upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InputEvent {
    Key { key: Key, pressed: bool },
    /// Raw surface offset in pixels, not divided by any display factor.
    Click { x: u16, y: u16 },
}

impl InputEvent {
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        match *self {
            Self::Key { key, pressed } => encode_key_transition(key, pressed).to_vec(),
            Self::Click { x, y } => encode_click(x, y).to_vec(),
        }
    }
}

/// Encode a key press or release.
#[must_use]
pub fn encode_key_transition(key: Key, pressed: bool) -> [u8; KEY_MESSAGE_LEN] {
    [key.code(pressed)]
}

/// Encode a pointer click at a surface offset.
#[must_use]
pub fn encode_click(x: u16, y: u16) -> [u8; CLICK_MESSAGE_LEN] {
    let [x_hi, x_lo] = x.to_be_bytes();
    let [y_hi, y_lo] = y.to_be_bytes();
    [CLICK_TAG, x_hi, x_lo, y_hi, y_lo]
}

/// Decode an upstream message, as the server does.
///
/// # Errors
///
/// Returns [`ProtocolError::UnknownInputCode`] for an unassigned leading byte
/// and [`ProtocolError::InvalidInput`] when the length does not fit the code.
pub fn decode_input(bytes: &[u8]) -> Result<InputEvent, ProtocolError> {
    match *bytes {
        [CLICK_TAG, x_hi, x_lo, y_hi, y_lo] => Ok(InputEvent::Click {
            x: u16::from_be_bytes([x_hi, x_lo]),
            y: u16::from_be_bytes([y_hi, y_lo]),
        }),
        [CLICK_TAG, ..] => Err(ProtocolError::InvalidInput { len: bytes.len() }),
        [code] => Key::from_code(code)
            .map(|(key, pressed)| InputEvent::Key { key, pressed })
            .ok_or(ProtocolError::UnknownInputCode { code }),
        [code, ..] if Key::from_code(code).is_some() => Err(ProtocolError::InvalidInput { len: bytes.len() }),
        [code, ..] => Err(ProtocolError::UnknownInputCode { code }),
        [] => Err(ProtocolError::InvalidInput { len: 0 }),
    }
}

/// Floor a pointer offset into click coordinates.
///
/// Float-to-int casts saturate, so negative offsets become `0`, offsets past
/// `u16::MAX` clamp to it, and `NaN` maps to `0`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn surface_to_click(x: f64, y: f64) -> (u16, u16) {
    (x.floor() as u16, y.floor() as u16)
}
