// ── Fog vignette and drifting wisps ──────────────────────────────────────────
//
// The vignette frames the diamond map. The two edges at the top of the screen
// (row 0, column 0) are drawn before objects, the two bottom edges after, so
// scenery standing on the far edges sinks into the fog while the near fog
// covers anything in front.

use std::f32::consts::TAU;

use glam::Vec2;
use rayon::prelude::*;

use crate::camera::Camera;
use crate::color::Color;
use crate::config::FogConfig;
use crate::iso::IsoMetrics;
use crate::lighting::shading::{hash01, smoothstep};
use crate::profile::LightingProfile;
use crate::surface::{BlendMode, Surface, blend_into};

/// One side of the diamond map, in grid terms.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MapEdge {
    /// `gy = 0`
    Row0,
    /// `gx = 0`
    Col0,
    /// `gy = height`
    RowMax,
    /// `gx = width`
    ColMax,
}

impl MapEdge {
    pub const ALL: [MapEdge; 4] = [MapEdge::Row0, MapEdge::Col0, MapEdge::RowMax, MapEdge::ColMax];

    /// Back edges sit behind the map on screen.
    pub fn is_back(self) -> bool {
        matches!(self, MapEdge::Row0 | MapEdge::Col0)
    }

    /// Point at `t ∈ [0, 1]` along the edge and its outward normal.
    fn frame(self, w: f32, h: f32, t: f32) -> (Vec2, Vec2) {
        match self {
            MapEdge::Row0 => (Vec2::new(w * t, 0.0), Vec2::new(0.0, -1.0)),
            MapEdge::Col0 => (Vec2::new(0.0, h * t), Vec2::new(-1.0, 0.0)),
            MapEdge::RowMax => (Vec2::new(w * t, h), Vec2::new(0.0, 1.0)),
            MapEdge::ColMax => (Vec2::new(w, h * t), Vec2::new(1.0, 0.0)),
        }
    }

    /// Signed grid distance of `g` outside this edge (positive = outside).
    fn outside(self, g: Vec2, w: f32, h: f32) -> f32 {
        match self {
            MapEdge::Row0 => -g.y,
            MapEdge::Col0 => -g.x,
            MapEdge::RowMax => g.y - h,
            MapEdge::ColMax => g.x - w,
        }
    }
}

/// Where wisp `index` sits at `time`, in grid units, and its opacity scale.
pub fn wisp_state(edge: MapEdge, index: usize, per_edge: usize, map: Vec2, time: f32) -> (Vec2, f32) {
    let global = edge as usize * per_edge.max(1) + index;
    let phase = hash01(global as u32 ^ 0xF06) * TAU;
    let speed = 0.01 + 0.02 * hash01(global as u32 ^ 0xA11);
    let base = (index as f32 + 0.5) / per_edge.max(1) as f32;
    let t = (base + time * speed).rem_euclid(1.0);
    let (on_edge, normal) = edge.frame(map.x, map.y, t);
    let out = 0.4 + 0.5 * (time * 0.3 + phase).sin();
    let breathe = 0.55 + 0.45 * (time * 0.7 + phase * 1.3).sin();
    (on_edge + normal * out, breathe)
}

pub struct FogSystem {
    config: FogConfig,
    time: f32,
}

impl FogSystem {
    pub fn new(config: FogConfig) -> Self {
        Self { config, time: 0.0 }
    }

    pub fn update(&mut self, dt: f32) {
        self.time += dt;
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn draw_back(&self, surface: &mut Surface, iso: &IsoMetrics, camera: &Camera, map: Vec2, profile: &LightingProfile) {
        self.draw_pass(surface, iso, camera, map, profile, true);
    }

    pub fn draw_front(&self, surface: &mut Surface, iso: &IsoMetrics, camera: &Camera, map: Vec2, profile: &LightingProfile) {
        self.draw_pass(surface, iso, camera, map, profile, false);
    }

    fn draw_pass(&self, surface: &mut Surface, iso: &IsoMetrics, camera: &Camera, map: Vec2, profile: &LightingProfile, back: bool) {
        let opacity = profile.fog_opacity.clamp(0.0, 1.0);
        if opacity <= 0.0 || map.x <= 0.0 || map.y <= 0.0 {
            return;
        }
        let color = Color::from(profile.fog_color);
        self.draw_vignette(surface, iso, camera, map, color, opacity, back);

        let mode = if profile.fog_wisp_additive { BlendMode::Additive } else { BlendMode::SourceOver };
        let per_edge = self.config.wisps_per_edge;
        let radius = self.config.band_width * camera.zoom;
        for edge in MapEdge::ALL.into_iter().filter(|e| e.is_back() == back) {
            for i in 0..per_edge {
                let (g, breathe) = wisp_state(edge, i, per_edge, map, self.time);
                let screen = camera.world_to_screen(iso.grid_to_screen(g.x, g.y));
                let c = color.with_alpha(opacity * 0.45 * breathe);
                surface.fill_radial(screen, radius, radius * 0.5, c, mode);
            }
        }
    }

    /// Per-pixel edge fog, split across rows on the global rayon pool.
    #[allow(clippy::too_many_arguments)]
    fn draw_vignette(&self, surface: &mut Surface, iso: &IsoMetrics, camera: &Camera, map: Vec2, color: Color, opacity: f32, back: bool) {
        let width = surface.width() as usize;
        if width == 0 {
            return;
        }
        let band = (self.config.band_width / iso.tile_height).max(0.1);
        let center = map * 0.5;
        let inner = center.length();

        surface.pixels_mut().par_chunks_mut(width).enumerate().for_each(|(py, row)| {
            for (px, pixel) in row.iter_mut().enumerate() {
                let screen = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
                let g = iso.screen_to_grid(camera.screen_to_world(screen));
                let mut a = 0.0f32;
                for edge in MapEdge::ALL.into_iter().filter(|e| e.is_back() == back) {
                    let d = edge.outside(g, map.x, map.y);
                    a = a.max(smoothstep(-band, band * 0.75, d));
                }
                if back {
                    // Radial ring outside the map's circumscribed circle.
                    let r = g.distance(center);
                    a = a.max(smoothstep(inner, inner + band * 2.0, r));
                }
                if a > 0.0 {
                    blend_into(pixel, color.with_alpha(a * opacity).0, BlendMode::SourceOver);
                }
            }
        });
    }
}
