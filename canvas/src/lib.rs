//! Browser client for the skirmish game.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It owns the
//! render/input loop: decoding server snapshots through [`protocol`], drawing
//! them on a 2D canvas every animation frame, and turning keyboard and pointer
//! events into upstream input messages. The host page only constructs a
//! [`web::Client`] with a canvas element, a server URL and a display factor.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Testable [`engine::EngineCore`]: session state plus the three trigger points |
//! | [`render`] | Frame planning, the [`render::Surface`] boundary and the canvas surface |
//! | [`palette`] | Sprite colors and the self-highlight rule |
//! | [`input`] | Keyboard event model and click coordinate modes |
//! | [`consts`] | Shared numeric constants (surface size, default factor, self sprite) |
//! | `web` | wasm32-only DOM wiring (WebSocket, keyboard, pointer, animation frames) |

pub mod consts;
pub mod engine;
pub mod input;
pub mod palette;
pub mod render;
#[cfg(target_arch = "wasm32")]
pub mod web;
