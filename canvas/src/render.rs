//! Rendering: turns a snapshot into draw calls on a 2D surface.
//!
//! A frame is planned first and drawn second. [`plan_frame`] resolves every
//! palette lookup, applies the self-highlight and the display factor, and
//! fails before anything touches the surface, so a bad sprite index never
//! leaves a half-drawn frame behind. [`draw`] then replays the plan.
//!
//! [`CanvasSurface`] is the only place that touches
//! [`web_sys::CanvasRenderingContext2d`].

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use protocol::{Entity, ProtocolError, Snapshot};
use web_sys::CanvasRenderingContext2d;

use crate::consts::{DEFAULT_FACTOR, SURFACE_SIZE};
use crate::palette;

/// The drawing operations the renderer needs from its host.
pub trait Surface {
    /// Erase the whole surface.
    fn clear(&mut self);
    /// Fill an axis-aligned rectangle.
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: &str);
    /// Stroke a single line segment.
    fn stroke_line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: &str);
}

/// One planned surface call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    FillRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: &'static str,
    },
    StrokeLine {
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        color: &'static str,
    },
}

/// Display configuration for the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderConfig {
    /// Multiplier applied to every position and size before drawing.
    pub factor: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { factor: DEFAULT_FACTOR }
    }
}

impl RenderConfig {
    /// A config with the given display factor. Non-finite or non-positive
    /// factors fall back to [`DEFAULT_FACTOR`].
    #[must_use]
    pub fn new(factor: f64) -> Self {
        if factor.is_finite() && factor > 0.0 {
            Self { factor }
        } else {
            Self::default()
        }
    }

    /// Edge length of the drawing surface in device pixels.
    #[must_use]
    pub fn surface_size(&self) -> f64 {
        SURFACE_SIZE * self.factor
    }

    fn scale(&self, value: impl Into<f64>) -> f64 {
        value.into() * self.factor
    }
}

/// Plan one frame: a clear followed by every entity in stream order.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidSprite`] if any entity (other than the
/// local player, which is always recolored) names a sprite past the palette.
pub fn plan_frame(snapshot: &Snapshot, config: &RenderConfig) -> Result<Vec<DrawCommand>, ProtocolError> {
    let mut commands = Vec::with_capacity(snapshot.len() + 1);
    commands.push(DrawCommand::Clear);

    for entity in &snapshot.entities {
        let color = palette::color(palette::render_sprite(snapshot, entity))?;
        let command = match *entity {
            Entity::User { width, height, x, y, .. } | Entity::Platform { width, height, x, y, .. } => {
                DrawCommand::FillRect {
                    x: config.scale(x),
                    y: config.scale(y),
                    width: config.scale(width),
                    height: config.scale(height),
                    color,
                }
            }
            Entity::Bullet { origin_x, origin_y, end_x, end_y, .. } => DrawCommand::StrokeLine {
                x0: config.scale(origin_x),
                y0: config.scale(origin_y),
                x1: config.scale(end_x),
                y1: config.scale(end_y),
                color,
            },
        };
        commands.push(command);
    }

    Ok(commands)
}

/// Replay a planned frame onto a surface.
pub fn draw(surface: &mut dyn Surface, commands: &[DrawCommand]) {
    for command in commands {
        match *command {
            DrawCommand::Clear => surface.clear(),
            DrawCommand::FillRect { x, y, width, height, color } => surface.fill_rect(x, y, width, height, color),
            DrawCommand::StrokeLine { x0, y0, x1, y1, color } => surface.stroke_line(x0, y0, x1, y1, color),
        }
    }
}

/// A surface that records every call, for headless hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    pub commands: Vec<DrawCommand>,
}

impl Surface for CommandLog {
    fn clear(&mut self) {
        self.commands.push(DrawCommand::Clear);
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: &str) {
        self.commands.push(DrawCommand::FillRect { x, y, width, height, color: palette_name(color) });
    }

    fn stroke_line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: &str) {
        self.commands.push(DrawCommand::StrokeLine { x0, y0, x1, y1, color: palette_name(color) });
    }
}

/// Intern a color back to its palette entry; unknown names record as `""`.
fn palette_name(color: &str) -> &'static str {
    palette::COLORS.iter().copied().find(|name| *name == color).unwrap_or("")
}

/// A browser canvas 2D context sized to the play field.
pub struct CanvasSurface {
    ctx: CanvasRenderingContext2d,
    width: f64,
    height: f64,
}

impl CanvasSurface {
    #[must_use]
    pub fn new(ctx: CanvasRenderingContext2d, width: f64, height: f64) -> Self {
        Self { ctx, width, height }
    }
}

impl Surface for CanvasSurface {
    fn clear(&mut self) {
        self.ctx.clear_rect(0.0, 0.0, self.width, self.height);
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: &str) {
        self.ctx.set_fill_style_str(color);
        self.ctx.fill_rect(x, y, width, height);
    }

    fn stroke_line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: &str) {
        self.ctx.set_stroke_style_str(color);
        self.ctx.begin_path();
        self.ctx.move_to(x0, y0);
        self.ctx.line_to(x1, y1);
        self.ctx.stroke();
    }
}
