use glam::Vec2;

use super::Rng;
use crate::camera::Camera;
use crate::color::Color;
use crate::surface::{BlendMode, Surface};

/// Sparks emitted per second per emitter.
const EMIT_RATE: f32 = 14.0;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Spark {
    /// World pixels.
    pub position: Vec2,
    pub velocity: Vec2,
    pub life: f32,
    pub max_life: f32,
    pub size: f32,
}

impl Spark {
    pub fn alive(&self) -> bool {
        self.life > 0.0
    }
}

/// Fixed pool of rising embers. Dead slots are reused; when every slot is
/// alive new sparks are simply not emitted.
pub struct SparkSystem {
    pool: Vec<Spark>,
    rng: Rng,
    accumulator: f32,
}

impl SparkSystem {
    pub fn new(capacity: usize) -> Self {
        let dead = Spark { position: Vec2::ZERO, velocity: Vec2::ZERO, life: 0.0, max_life: 1.0, size: 1.0 };
        Self { pool: vec![dead; capacity], rng: Rng::new(0xE3BE), accumulator: 0.0 }
    }

    pub fn alive_count(&self) -> usize {
        self.pool.iter().filter(|s| s.alive()).count()
    }

    pub fn sparks(&self) -> impl Iterator<Item = &Spark> {
        self.pool.iter().filter(|s| s.alive())
    }

    fn emit(&mut self, origin: Vec2) {
        let Some(index) = self.pool.iter().position(|s| !s.alive()) else { return };
        let life = self.rng.range(0.6, 1.4);
        self.pool[index] = Spark {
            position: origin + Vec2::new(self.rng.range(-6.0, 6.0), self.rng.range(-4.0, 0.0)),
            velocity: Vec2::new(self.rng.range(-18.0, 18.0), self.rng.range(-70.0, -35.0)),
            life,
            max_life: life,
            size: self.rng.range(0.8, 1.8),
        };
    }

    /// Advance live sparks and emit from each world-pixel `emitter`.
    pub fn update(&mut self, dt: f32, emitters: &[Vec2]) {
        for s in self.pool.iter_mut().filter(|s| s.alive()) {
            s.life -= dt;
            let drag = (1.0 - 0.8 * dt).max(0.0);
            s.velocity *= drag;
            s.velocity.y -= 20.0 * dt;
            s.position += s.velocity * dt;
        }

        if emitters.is_empty() {
            self.accumulator = 0.0;
            return;
        }
        self.accumulator += dt * EMIT_RATE;
        let count = self.accumulator.floor() as usize;
        self.accumulator -= count as f32;
        for _ in 0..count {
            for &origin in emitters {
                self.emit(origin);
            }
        }
    }

    pub fn draw(&self, surface: &mut Surface, camera: &Camera, opacity: f32) {
        if opacity <= 0.0 {
            return;
        }
        for s in self.sparks() {
            let fade = (s.life / s.max_life).clamp(0.0, 1.0);
            let screen = camera.world_to_screen(s.position);
            let c = Color::EMBER.with_alpha(fade * opacity);
            surface.fill_circle(screen, s.size * camera.zoom, c, BlendMode::Additive);
        }
    }
}
