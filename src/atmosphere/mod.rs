//! World-space particle and fog layers, projected through the scene camera.

pub mod fog;
pub mod snow;
pub mod sparks;

pub use fog::FogSystem;
pub use snow::SnowSystem;
pub use sparks::SparkSystem;

use glam::Vec2;

/// LCG hash of `seed` to `[0, 1)`. Uses the top 24 bits, which are the
/// well-mixed ones and fit an `f32` mantissa exactly.
pub fn pseudo_rand(seed: u64) -> f32 {
    let x = seed
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    (x >> 40) as f32 / 16_777_216.0
}

/// Sequential stream over [`pseudo_rand`].
#[derive(Clone, Debug)]
pub(crate) struct Rng {
    state: u64,
}

impl Rng {
    pub(crate) fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub(crate) fn next(&mut self) -> f32 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        pseudo_rand(self.state)
    }

    pub(crate) fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next()
    }
}

/// Axis-aligned grid-space box: the map plus padding.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WorldBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl WorldBounds {
    pub fn padded(map_width: u32, map_height: u32, padding: f32) -> Self {
        Self {
            min: Vec2::splat(-padding),
            max: Vec2::new(map_width as f32 + padding, map_height as f32 + padding),
        }
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Wrap `v` into `[lo, hi]` along one axis.
    pub(crate) fn wrap(v: f32, lo: f32, hi: f32) -> f32 {
        let span = hi - lo;
        if span <= 0.0 {
            return lo;
        }
        if v < lo || v > hi {
            lo + (v - lo).rem_euclid(span)
        } else {
            v
        }
    }
}
