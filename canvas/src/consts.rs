//! Shared numeric constants for the canvas crate.

// ── Surface ─────────────────────────────────────────────────────

/// Edge length of the square play field in world pixels.
pub const SURFACE_SIZE: f64 = 255.0;

/// Display scale applied when the host does not pick one.
pub const DEFAULT_FACTOR: f64 = 1.0;

// ── Palette ─────────────────────────────────────────────────────

/// Palette slot used to draw the local player regardless of its sprite.
pub const SELF_SPRITE: u8 = 2;
