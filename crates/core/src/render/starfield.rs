//! Decorative starfield behind the network view.
//!
//! Stars are generated once from a fixed seed and cached in normalised canvas
//! coordinates, so resizing rescales them instead of re-rolling. They never take
//! part in hit-testing.

use crate::core_types::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    /// Position in `[0, 1]²`
    pub position: Vec2,
    pub radius: f32,
    /// Base opacity before twinkle
    pub brightness: f32,
    /// Twinkle phase offset in radians
    pub phase: f32,
}

#[derive(Debug, Clone, Default)]
pub struct Starfield {
    stars: Vec<Star>,
    key: Option<(u64, usize)>,
}

impl Starfield {
    #[must_use]
    pub fn new(seed: u64, count: usize) -> Self {
        let mut field = Self::default();
        field.ensure(seed, count);
        field
    }

    /// Regenerate only when the seed or count changed.
    pub fn ensure(&mut self, seed: u64, count: usize) {
        if self.key == Some((seed, count)) {
            return;
        }
        let mut rng = StdRng::seed_from_u64(seed);
        self.stars.clear();
        self.stars.extend((0..count).map(|_| Star {
            position: Vec2::new(rng.random::<f32>(), rng.random::<f32>()),
            radius: rng.random_range(0.4..1.6),
            brightness: rng.random_range(0.3..0.9),
            phase: rng.random_range(0.0..std::f32::consts::TAU),
        }));
        self.key = Some((seed, count));
    }

    #[must_use]
    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    /// Opacity of `star` at `time` seconds.
    #[must_use]
    pub fn twinkle(star: &Star, time: f64) -> f32 {
        let wave = ((time * 1.5).rem_euclid(std::f64::consts::TAU) as f32 + star.phase).sin();
        star.brightness * (0.7 + 0.3 * wave)
    }
}
