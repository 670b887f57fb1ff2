use glam::Vec2;
use image::RgbaImage;

use super::{Rng, WorldBounds};
use crate::assets::Rect;
use crate::camera::Camera;
use crate::color::Color;
use crate::config::SnowConfig;
use crate::iso::IsoMetrics;
use crate::surface::{BlendMode, BlitOptions, Surface};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Snowflake {
    /// Ground position in grid units.
    pub gx: f32,
    pub gy: f32,
    /// Pixels above the ground plane.
    pub height: f32,
    /// 0 = farthest.
    pub layer: usize,
    pub phase: f32,
    pub opacity: f32,
}

/// Fixed pool of falling flakes over a few parallax layers.
pub struct SnowSystem {
    config: SnowConfig,
    flakes: Vec<Snowflake>,
    stamps: Vec<RgbaImage>,
    bounds: Option<WorldBounds>,
    rng: Rng,
    time: f32,
}

impl SnowSystem {
    pub fn new(config: SnowConfig) -> Self {
        let layers = config.layers.max(1);
        let stamps = (0..layers).map(|l| build_stamp(layer_radius(l, layers))).collect();
        Self { config, flakes: Vec::new(), stamps, bounds: None, rng: Rng::new(0x5eed), time: 0.0 }
    }

    pub fn flakes(&self) -> &[Snowflake] {
        &self.flakes
    }

    pub fn flakes_mut(&mut self) -> &mut [Snowflake] {
        &mut self.flakes
    }

    pub fn bounds(&self) -> Option<WorldBounds> {
        self.bounds
    }

    fn layers(&self) -> usize {
        self.config.layers.max(1)
    }

    /// Relative speed of a layer; far layers fall slower.
    pub fn layer_speed(&self, layer: usize) -> f32 {
        0.35 + 0.65 * (layer + 1) as f32 / self.layers() as f32
    }

    fn spawn(&mut self, index: usize, bounds: WorldBounds, anywhere_in_air: bool) -> Snowflake {
        let layers = self.layers();
        let layer = index % layers;
        let top = self.config.spawn_height.max(1.0);
        let height = if anywhere_in_air {
            self.rng.range(1.0, top)
        } else {
            self.rng.range(top * 0.6, top)
        };
        Snowflake {
            gx: self.rng.range(bounds.min.x, bounds.max.x),
            gy: self.rng.range(bounds.min.y, bounds.max.y),
            height,
            layer,
            phase: self.rng.range(0.0, std::f32::consts::TAU),
            opacity: (0.35 + 0.65 * (layer + 1) as f32 / layers as f32) * self.rng.range(0.75, 1.0),
        }
    }

    /// Fill the pool for `bounds`. Called automatically on first update and
    /// whenever the bounds change.
    pub fn populate(&mut self, bounds: WorldBounds) {
        self.bounds = Some(bounds);
        self.flakes.clear();
        for i in 0..self.config.count {
            let flake = self.spawn(i, bounds, true);
            self.flakes.push(flake);
        }
    }

    pub fn update(&mut self, dt: f32, bounds: WorldBounds) {
        if self.bounds != Some(bounds) || self.flakes.len() != self.config.count {
            self.populate(bounds);
        }
        self.time += dt;
        let time = self.time;
        let base = self.config.base_fall_speed;
        let wind = self.config.wind;
        let wobble = self.config.wobble;

        for i in 0..self.flakes.len() {
            let speed = self.layer_speed(self.flakes[i].layer);
            let f = &mut self.flakes[i];
            f.height -= speed * base * dt;
            // Lateral drift moves along screen X: +gx and -gy in equal parts.
            let drift = (wind + wobble * (time * 1.7 + f.phase).sin()) * speed * dt;
            f.gx += drift * 0.5;
            f.gy -= drift * 0.5;

            if f.height <= 0.0 {
                let fresh = self.spawn(i, bounds, false);
                self.flakes[i] = fresh;
                continue;
            }
            if !bounds.contains(Vec2::new(f.gx, f.gy)) {
                f.gx = WorldBounds::wrap(f.gx, bounds.min.x, bounds.max.x);
                f.gy = WorldBounds::wrap(f.gy, bounds.min.y, bounds.max.y);
            }
        }
    }

    pub fn draw(&self, surface: &mut Surface, iso: &IsoMetrics, camera: &Camera, opacity: f32) {
        if opacity <= 0.0 {
            return;
        }
        let view = surface.size();
        for f in &self.flakes {
            let Some(stamp) = self.stamps.get(f.layer) else { continue };
            let world = iso.grid_to_screen(f.gx, f.gy) - Vec2::new(0.0, f.height);
            let screen = camera.world_to_screen(world);
            let size = Vec2::new(stamp.width() as f32, stamp.height() as f32) * camera.zoom;
            let pos = screen - size * 0.5;
            if pos.x > view.x || pos.y > view.y || pos.x + size.x < 0.0 || pos.y + size.y < 0.0 {
                continue;
            }
            let opts = BlitOptions { opacity: f.opacity * opacity, ..Default::default() };
            surface.blit(stamp, Rect::new(0, 0, stamp.width(), stamp.height()), pos, size, &opts);
        }
    }
}

fn layer_radius(layer: usize, layers: usize) -> f32 {
    1.0 + 2.0 * layer as f32 / layers.saturating_sub(1).max(1) as f32
}

/// Soft round flake image, drawn once per layer.
fn build_stamp(radius: f32) -> RgbaImage {
    let side = (radius * 2.0).ceil() as u32 + 2;
    let mut s = Surface::new(side, side);
    let c = Vec2::splat(side as f32 * 0.5);
    s.fill_radial(c, radius + 0.5, radius + 0.5, Color::SNOW, BlendMode::SourceOver);
    s.fill_circle(c, radius * 0.45, Color::SNOW, BlendMode::SourceOver);
    s.to_rgba8()
}
