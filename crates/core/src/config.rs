//! Tunable engine constants.
//!
//! Every magic number of the layout, link, render and interaction stages lives
//! here so hosts can retune the visualisation without touching the pipeline.
//! Position scaling (`orbit_time_scale`) and particle scaling (`flow_speed`,
//! multiplied by the view's simulation speed) are independent.

use serde::Deserialize;

/// Engine configuration.
///
/// Deserialises from JSON with every field optional; missing fields take the
/// defaults below.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Spatial mode: hazard row height as a fraction of canvas height
    pub hazard_row: f32,
    /// Spatial mode: community row height as a fraction of canvas height
    pub community_row: f32,

    /// Network mode: hazard ring radius as a fraction of `min(width, height)`
    pub outer_ring: f32,
    /// Network mode: community ring radius as a fraction of `min(width, height)`
    pub inner_ring: f32,
    /// Angular speed of the hazard ring (rad per scaled second)
    pub outer_angular_speed: f64,
    /// Angular speed of the community ring (rad per scaled second).
    /// Opposite sign to the outer ring so the two counter-rotate.
    pub inner_angular_speed: f64,
    /// Multiplier from wall-clock seconds to layout time
    pub orbit_time_scale: f64,

    /// Link distance threshold as a fraction of `min(width, height)`
    pub link_threshold: f32,
    /// Particle cycles per second along a link at simulation speed 1
    pub flow_speed: f64,

    /// Halo pulse angular frequency (rad/s)
    pub pulse_frequency: f64,
    /// Halo pulse amplitude relative to node radius
    pub pulse_amplitude: f32,
    /// Glow shadow blur in pixels
    pub glow_blur: f32,
    /// Spatial mode grid spacing in pixels
    pub grid_spacing: f32,
    /// Number of decorative stars in network mode
    pub star_count: usize,
    /// Seed for the decorative starfield
    pub star_seed: u64,
    /// Screen radius of the selection ring in CSS pixels
    pub selection_ring_radius: f32,
    /// Label font size in pixels
    pub label_size: f32,

    /// Extra hit-test tolerance around a node radius, in pixels
    pub hit_margin: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hazard_row: 0.3,
            community_row: 0.7,
            outer_ring: 0.25,
            inner_ring: 0.15,
            outer_angular_speed: 0.2,
            inner_angular_speed: -0.35,
            orbit_time_scale: 1.0,
            link_threshold: 0.4,
            flow_speed: 0.5,
            pulse_frequency: 3.0,
            pulse_amplitude: 0.25,
            glow_blur: 15.0,
            grid_spacing: 40.0,
            star_count: 120,
            star_seed: 0x5eed_57a5,
            selection_ring_radius: 28.0,
            label_size: 11.0,
            hit_margin: 5.0,
        }
    }
}

impl EngineConfig {
    /// Parse a (possibly partial) configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rings_counter_rotate() {
        let config = EngineConfig::default();
        assert!(config.outer_angular_speed * config.inner_angular_speed < 0.0);
        assert_ne!(
            config.outer_angular_speed.abs(),
            config.inner_angular_speed.abs()
        );
        assert!(config.inner_ring < config.outer_ring);
    }

    #[test]
    fn test_partial_json_overrides() {
        let config = EngineConfig::from_json_str(r#"{ "hit_margin": 8.0, "star_count": 0 }"#)
            .unwrap();
        assert_eq!(config.hit_margin, 8.0);
        assert_eq!(config.star_count, 0);
        assert_eq!(config.outer_ring, EngineConfig::default().outer_ring);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(EngineConfig::from_json_str(r#"{ "gravity": 9.8 }"#).is_err());
    }
}
