//! Vector type alias for 2D canvas positions.

use nalgebra::Vector2;

/// 2D vector type for canvas-buffer positions.
///
/// This is a simple alias for `nalgebra::Vector2<f32>`, used throughout
/// the engine for node centres, pointer positions and particle positions.
pub type Vec2 = Vector2<f32>;

/// Linear interpolation between two points, `t` in `[0, 1]`.
#[inline]
#[must_use]
pub fn lerp(from: Vec2, to: Vec2, t: f32) -> Vec2 {
    from + (to - from) * t
}
