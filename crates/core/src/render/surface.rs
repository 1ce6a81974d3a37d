//! Drawing surface abstraction.
//!
//! `Surface` is the subset of a 2D canvas context the renderer needs. Hosts
//! back it with a real canvas; `RecordingSurface` captures the calls as
//! [`DrawCommand`]s for tests, diagnostics and the terminal demo.

use crate::core_types::{Color, Vec2};
use serde::Serialize;

/// Stroke parameters for lines and circle outlines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
    /// `[dash, gap]` pattern, solid when `None`
    pub dash: Option<[f32; 2]>,
}

impl Stroke {
    #[must_use]
    pub const fn solid(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            dash: None,
        }
    }
}

/// Two-stop radial gradient centred on a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RadialGradient {
    pub center: Vec2,
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub inner: Color,
    pub outer: Color,
}

/// Fill paint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Paint {
    Solid(Color),
    Radial(RadialGradient),
}

/// Blurred glow applied to subsequent fills.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Shadow {
    pub blur: f32,
    pub color: Color,
}

/// Horizontally centred text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextStyle {
    pub color: Color,
    /// Font size in pixels
    pub size: f32,
}

/// 2D drawing context.
pub trait Surface {
    /// Reset the whole buffer to transparent.
    fn clear(&mut self, width: f32, height: f32);

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Color);

    fn stroke_line(&mut self, from: Vec2, to: Vec2, stroke: &Stroke);

    fn fill_circle(&mut self, center: Vec2, radius: f32, paint: &Paint);

    fn stroke_circle(&mut self, center: Vec2, radius: f32, stroke: &Stroke);

    /// Set or clear the glow applied to later fills.
    fn set_shadow(&mut self, shadow: Option<Shadow>);

    fn fill_text(&mut self, text: &str, position: Vec2, style: &TextStyle);
}

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Clear {
        width: f32,
        height: f32,
    },
    FillRect {
        origin: Vec2,
        size: Vec2,
        color: Color,
    },
    Line {
        from: Vec2,
        to: Vec2,
        stroke: Stroke,
    },
    FillCircle {
        center: Vec2,
        radius: f32,
        paint: Paint,
    },
    StrokeCircle {
        center: Vec2,
        radius: f32,
        stroke: Stroke,
    },
    Shadow {
        shadow: Option<Shadow>,
    },
    Text {
        text: String,
        position: Vec2,
        style: TextStyle,
    },
}

/// Surface that records every call.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn reset(&mut self) {
        self.commands.clear();
    }
}

impl Surface for RecordingSurface {
    fn clear(&mut self, width: f32, height: f32) {
        // Only the latest frame is kept.
        self.commands.clear();
        self.commands.push(DrawCommand::Clear { width, height });
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Color) {
        self.commands.push(DrawCommand::FillRect {
            origin,
            size,
            color,
        });
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, stroke: &Stroke) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            stroke: *stroke,
        });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, paint: &Paint) {
        self.commands.push(DrawCommand::FillCircle {
            center,
            radius,
            paint: *paint,
        });
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, stroke: &Stroke) {
        self.commands.push(DrawCommand::StrokeCircle {
            center,
            radius,
            stroke: *stroke,
        });
    }

    fn set_shadow(&mut self, shadow: Option<Shadow>) {
        self.commands.push(DrawCommand::Shadow { shadow });
    }

    fn fill_text(&mut self, text: &str, position: Vec2, style: &TextStyle) {
        self.commands.push(DrawCommand::Text {
            text: text.to_owned(),
            position,
            style: *style,
        });
    }
}
