//! Colour mapping for hazards and communities.

use super::feature::HazardType;
use serde::Serialize;
use std::fmt;

/// An sRGB colour with straight alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Opacity in `[0, 1]`
    pub a: f32,
}

impl Color {
    pub const BACKGROUND_LIGHT: Color = Color::rgb(0xf8, 0xfa, 0xfc);
    pub const BACKGROUND_DARK: Color = Color::rgb(0x0b, 0x10, 0x20);
    pub const GRID: Color = Color::rgba(0x94, 0xa3, 0xb8, 0.25);
    pub const LABEL: Color = Color::rgb(0xe2, 0xe8, 0xf0);
    pub const LABEL_DARK: Color = Color::rgb(0x1e, 0x29, 0x3b);
    pub const SELECTION: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const STAR: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const GRAY: Color = Color::rgb(0x9c, 0xa3, 0xaf);

    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Same colour with a different opacity, clamped into `[0, 1]`.
    #[must_use]
    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }
}

impl fmt::Display for Color {
    /// CSS `rgba(...)` notation, as accepted by a 2D canvas context.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {:.3})", self.r, self.g, self.b, self.a)
    }
}

/// Colour for a hazard category.
#[must_use]
pub const fn hazard_color(hazard_type: HazardType) -> Color {
    match hazard_type {
        HazardType::Heat => Color::rgb(0xf9, 0x73, 0x16),
        HazardType::Flood => Color::rgb(0x3b, 0x82, 0xf6),
        HazardType::Fire => Color::rgb(0xef, 0x44, 0x44),
        HazardType::Air => Color::GRAY,
    }
}

/// Linear green-to-red interpolation on a vulnerability index in `[0, 1]`.
#[must_use]
pub fn vulnerability_color(vulnerability_index: f32) -> Color {
    let v = if vulnerability_index.is_finite() {
        vulnerability_index.clamp(0.0, 1.0)
    } else {
        0.0
    };
    Color::rgb((255.0 * v).round() as u8, (255.0 * (1.0 - v)).round() as u8, 0x50)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hazard_palette() {
        assert_eq!(hazard_color(HazardType::Flood), Color::rgb(0x3b, 0x82, 0xf6));
        assert_eq!(hazard_color(HazardType::Air), Color::GRAY);
        assert_ne!(
            hazard_color(HazardType::Heat),
            hazard_color(HazardType::Fire)
        );
    }

    #[test]
    fn test_vulnerability_interpolation() {
        assert_eq!(vulnerability_color(0.0), Color::rgb(0, 255, 0x50));
        assert_eq!(vulnerability_color(1.0), Color::rgb(255, 0, 0x50));
        let mid = vulnerability_color(0.5);
        assert_eq!(mid.r, 128);
        assert_eq!(mid.g, 128);
        // Out-of-range input saturates
        assert_eq!(vulnerability_color(3.0), vulnerability_color(1.0));
    }

    #[test]
    fn test_css_notation() {
        let c = Color::rgba(1, 2, 3, 0.5);
        assert_eq!(c.to_string(), "rgba(1, 2, 3, 0.500)");
    }
}
