//! Screen-space lighting post-process.
//!
//! The pass rewrites a fully composited [`Surface`] in place: every pixel is
//! multiplied by ambient plus the shadowed contribution of each light. Work is
//! split across rows on a dedicated rayon pool. If that pool cannot be built
//! the orchestrator keeps no pipeline at all and frames stay unlit.

pub mod shading;

use glam::{Vec2, Vec3};
use rayon::prelude::*;

use crate::assets::SpriteView;
use crate::config::LightingConfig;
use crate::error::{Error, Result};
use crate::surface::Surface;

pub const MAX_LIGHTS: usize = 16;
pub const MAX_OCCLUDERS: usize = 32;
pub const MAX_ZONES: usize = 8;

// ── Per-frame inputs ─────────────────────────────────────────────────────────

/// A radial light in screen space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LightSource {
    pub position: Vec2,
    pub radius: f32,
    pub color: Vec3,
    pub intensity: f32,
    /// 0 = steady.
    pub flicker: f32,
}

impl LightSource {
    pub fn new(position: Vec2, radius: f32, color: Vec3, intensity: f32) -> Self {
        Self { position, radius, color, intensity, flicker: 0.0 }
    }

    pub fn with_flicker(mut self, flicker: f32) -> Self {
        self.flicker = flicker;
        self
    }
}

/// A shadow-casting point in screen space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Occluder {
    pub position: Vec2,
    pub radius: f32,
    /// Screen pixels. Taller occluders reach further.
    pub height: f32,
}

impl Occluder {
    pub fn max_reach(&self, shadow_length_mult: f32) -> f32 {
        self.height.max(0.0) * shadow_length_mult
    }
}

/// Region over which ground shadow is lifted from feet to head.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HeightFadeZone {
    /// Bottom centre of the sprite on screen.
    pub foot: Vec2,
    /// Sprite width and height on screen.
    pub size: Vec2,
    pub strength: f32,
    /// Restrict to opaque pixels of the hero mask.
    pub alpha_only: bool,
}

/// Alpha of one sprite frame, placed on screen.
///
/// Copied out of the atlas so the pass never samples outside the frame.
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteMask {
    /// Top-left corner on screen.
    pub origin: Vec2,
    /// Destination size on screen.
    pub size: Vec2,
    width: u32,
    height: u32,
    alpha: Vec<f32>,
}

impl SpriteMask {
    /// Build from an alpha buffer of `width × height` texels (row-major).
    pub fn new(origin: Vec2, size: Vec2, width: u32, height: u32, alpha: Vec<f32>) -> Option<Self> {
        if width == 0 || height == 0 || alpha.len() != (width * height) as usize {
            return None;
        }
        if size.x <= 0.0 || size.y <= 0.0 {
            return None;
        }
        Some(Self { origin, size, width, height, alpha })
    }

    /// Sample the frame of `view`, mirrored when `flip_x`.
    pub fn from_view(view: &SpriteView<'_>, origin: Vec2, size: Vec2, flip_x: bool) -> Option<Self> {
        let (w, h) = (view.rect.w, view.rect.h);
        let mut alpha = Vec::with_capacity((w * h) as usize);
        for y in 0..h {
            for x in 0..w {
                let u = (x as f32 + 0.5) / w as f32;
                let v = (y as f32 + 0.5) / h as f32;
                alpha.push(view.alpha_at(u, v, flip_x));
            }
        }
        Self::new(origin, size, w, h, alpha)
    }

    fn texel(&self, p: Vec2) -> Option<(i32, i32)> {
        let local = (p - self.origin) / self.size;
        if !(0.0..1.0).contains(&local.x) || !(0.0..1.0).contains(&local.y) {
            return None;
        }
        Some(((local.x * self.width as f32) as i32, (local.y * self.height as f32) as i32))
    }

    fn alpha_texel(&self, x: i32, y: i32) -> f32 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return 0.0;
        }
        self.alpha[(y as u32 * self.width + x as u32) as usize]
    }

    pub fn alpha_at(&self, p: Vec2) -> f32 {
        match self.texel(p) {
            Some((x, y)) => self.alpha_texel(x, y),
            None => 0.0,
        }
    }

    /// Opaque texel with at least one transparent 4-neighbour.
    pub fn is_edge(&self, p: Vec2) -> bool {
        let Some((x, y)) = self.texel(p) else { return false };
        if self.alpha_texel(x, y) < 0.5 {
            return false;
        }
        [(1, 0), (-1, 0), (0, 1), (0, -1)]
            .iter()
            .any(|(dx, dy)| self.alpha_texel(x + dx, y + dy) < 0.5)
    }
}

/// Everything the pass reads for one frame. Capped lists drop overflow.
#[derive(Clone, Debug)]
pub struct LightingInputs {
    pub ambient: Vec3,
    pub shadow_length_mult: f32,
    pub shadow_opacity: f32,
    pub rim_color: Vec3,
    /// Tile width / tile height.
    pub iso_ratio: f32,
    /// Seconds, drives flicker.
    pub time: f32,
    /// Hero sprite for volumetric shading and alpha-only fade zones.
    pub hero: Option<SpriteMask>,
    lights: Vec<LightSource>,
    occluders: Vec<Occluder>,
    zones: Vec<HeightFadeZone>,
    dropped: usize,
}

impl Default for LightingInputs {
    fn default() -> Self {
        Self {
            ambient: Vec3::ONE,
            shadow_length_mult: 1.0,
            shadow_opacity: 1.0,
            rim_color: Vec3::ZERO,
            iso_ratio: 2.0,
            time: 0.0,
            hero: None,
            lights: Vec::with_capacity(MAX_LIGHTS),
            occluders: Vec::with_capacity(MAX_OCCLUDERS),
            zones: Vec::with_capacity(MAX_ZONES),
            dropped: 0,
        }
    }
}

impl LightingInputs {
    pub fn new(ambient: Vec3) -> Self {
        Self { ambient, ..Default::default() }
    }

    /// Empty the lists, keeping their storage.
    pub fn clear(&mut self) {
        self.lights.clear();
        self.occluders.clear();
        self.zones.clear();
        self.hero = None;
        self.dropped = 0;
    }

    /// Returns `false` when the light was dropped by the cap.
    pub fn push_light(&mut self, light: LightSource) -> bool {
        push_capped(&mut self.lights, light, MAX_LIGHTS, &mut self.dropped)
    }

    pub fn push_occluder(&mut self, occluder: Occluder) -> bool {
        push_capped(&mut self.occluders, occluder, MAX_OCCLUDERS, &mut self.dropped)
    }

    pub fn push_zone(&mut self, zone: HeightFadeZone) -> bool {
        push_capped(&mut self.zones, zone, MAX_ZONES, &mut self.dropped)
    }

    pub fn lights(&self) -> &[LightSource] {
        &self.lights
    }

    pub fn occluders(&self) -> &[Occluder] {
        &self.occluders
    }

    pub fn zones(&self) -> &[HeightFadeZone] {
        &self.zones
    }

    /// Entries discarded by the caps since the last `clear`.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

fn push_capped<T>(list: &mut Vec<T>, item: T, cap: usize, dropped: &mut usize) -> bool {
    if list.len() >= cap {
        *dropped += 1;
        return false;
    }
    list.push(item);
    true
}

// ── Pipeline ─────────────────────────────────────────────────────────────────

pub struct LightingPipeline {
    pool: rayon::ThreadPool,
    bloom_ceiling: f32,
}

impl LightingPipeline {
    /// Build the worker pool. Fails with [`Error::AccelerationUnavailable`]
    /// when lighting is disabled in config or the pool cannot start.
    pub fn new(config: &LightingConfig) -> Result<Self> {
        if !config.enabled {
            return Err(Error::AccelerationUnavailable("disabled in config".to_string()));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|i| format!("isoglow-light-{i}"))
            .build()
            .map_err(|e| Error::AccelerationUnavailable(e.to_string()))?;
        Ok(Self { pool, bloom_ceiling: config.bloom_ceiling })
    }

    pub fn bloom_ceiling(&self) -> f32 {
        self.bloom_ceiling
    }

    /// Light `frame` in place.
    pub fn apply(&self, frame: &mut Surface, inputs: &LightingInputs) {
        let width = frame.width() as usize;
        if width == 0 {
            return;
        }
        let flickers: Vec<f32> = inputs
            .lights()
            .iter()
            .enumerate()
            .map(|(i, l)| shading::flicker(i, inputs.time, l.flicker))
            .collect();
        let bloom = self.bloom_ceiling;

        self.pool.install(|| {
            frame.pixels_mut().par_chunks_mut(width).enumerate().for_each(|(y, row)| {
                let py = y as f32 + 0.5;
                for (x, px) in row.iter_mut().enumerate() {
                    if px[3] <= 0.0 {
                        continue;
                    }
                    let p = Vec2::new(x as f32 + 0.5, py);
                    *px = shading::shade_pixel(*px, p, inputs, &flickers, bloom);
                }
            });
        });
    }
}
