use protocol::{ProtocolError, Session, Snapshot};

use crate::input::{ClickMode, KeyInput};
use crate::render::{self, RenderConfig, Surface};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Outcome of one render tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// No snapshot to draw; the surface was left untouched.
    Skipped,
    /// The snapshot was drawn with this many entities.
    Drawn { entities: usize },
    /// The snapshot could not be drawn; the surface was left untouched.
    /// `repeated` is set once the same message has already failed a tick.
    Failed { error: ProtocolError, repeated: bool },
}

/// Core engine state: all logic that doesn't depend on the browser.
///
/// The three trigger points (inbound message, input event, render tick) each
/// map to one method here. Outbound bytes are returned to the host, which
/// owns the transport.
#[derive(Debug, Default)]
pub struct EngineCore {
    pub session: Session,
    pub render: RenderConfig,
    pub click_mode: ClickMode,
    /// `Session::received` count of the last message that failed to render.
    failed_at: Option<u64>,
}

impl EngineCore {
    #[must_use]
    pub fn new(render: RenderConfig) -> Self {
        Self { render, ..Self::default() }
    }

    #[must_use]
    pub fn with_click_mode(mut self, click_mode: ClickMode) -> Self {
        self.click_mode = click_mode;
        self
    }

    // --- Transport events ---

    pub fn on_open(&mut self) {
        self.session.opened();
    }

    pub fn on_close(&mut self) {
        self.session.closed();
    }

    /// Replace the current snapshot with a freshly decoded message.
    ///
    /// # Errors
    ///
    /// Returns the decode error; the next render tick will then skip.
    pub fn on_message(&mut self, bytes: &[u8]) -> Result<&Snapshot, ProtocolError> {
        self.session.receive(bytes)
    }

    // --- Input events ---

    /// Bytes to send for a keyboard event, if any.
    #[must_use]
    pub fn on_key(&self, input: &KeyInput) -> Option<Vec<u8>> {
        let key = input.tracked()?;
        self.session
            .key_transition(key, input.pressed(), input.repeat)
            .map(|bytes| bytes.to_vec())
    }

    #[must_use]
    pub fn on_key_down(&self, key: &str, repeat: bool) -> Option<Vec<u8>> {
        self.on_key(&KeyInput::down(key, repeat))
    }

    #[must_use]
    pub fn on_key_up(&self, key: &str) -> Option<Vec<u8>> {
        self.on_key(&KeyInput::up(key))
    }

    /// Bytes to send for a click at a surface-relative offset, if any.
    #[must_use]
    pub fn on_click(&self, offset_x: f64, offset_y: f64) -> Option<Vec<u8>> {
        let (x, y) = self.click_mode.to_wire(offset_x, offset_y, self.render.factor);
        self.session.click(x, y).map(|bytes| bytes.to_vec())
    }

    // --- Render ---

    /// Draw the current snapshot, or skip if there is nothing valid to draw.
    pub fn render(&mut self, surface: &mut dyn Surface) -> Frame {
        let Some(snapshot) = self.session.snapshot() else {
            return Frame::Skipped;
        };
        match render::plan_frame(snapshot, &self.render) {
            Ok(commands) => {
                render::draw(surface, &commands);
                Frame::Drawn { entities: snapshot.len() }
            }
            Err(error) => {
                let seq = self.session.received();
                let repeated = self.failed_at.replace(seq) == Some(seq);
                Frame::Failed { error, repeated }
            }
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn local_entity_id(&self) -> Option<u8> {
        self.session.local_entity_id()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.session.is_open()
    }
}
