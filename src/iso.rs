// =============================================================================
// ISO.RS — Isometric projection
//
// Pure, stateless mapping between the orthogonal tile grid and "world pixels"
// (the isometric plane before the camera transform):
// - grid → world and its exact inverse (pointer picking)
// - depth keys that order same-layer draws back to front
// =============================================================================

use glam::Vec2;

/// Tile dimensions of a 2:1-style diamond grid.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IsoMetrics {
    pub tile_width: f32,
    pub tile_height: f32,
}

impl IsoMetrics {
    pub const fn new(tile_width: f32, tile_height: f32) -> Self {
        Self { tile_width, tile_height }
    }

    /// Width-to-height ratio used to stretch screen-space Y back onto the
    /// ground plane (2.0 for a 64×32 tile).
    #[inline]
    pub fn ratio(&self) -> f32 {
        self.tile_width / self.tile_height
    }

    /// `((gx - gy) * TW/2, (gx + gy) * TH/2)`.
    #[inline]
    pub fn grid_to_screen(&self, gx: f32, gy: f32) -> Vec2 {
        Vec2::new(
            (gx - gy) * self.tile_width * 0.5,
            (gx + gy) * self.tile_height * 0.5,
        )
    }

    /// Same as [`grid_to_screen`](Self::grid_to_screen) with a height above
    /// the ground plane, in grid units, pushing the point up-screen.
    #[inline]
    pub fn grid_to_screen_z(&self, gx: f32, gy: f32, gz: f32) -> Vec2 {
        let p = self.grid_to_screen(gx, gy);
        Vec2::new(p.x, p.y - gz * self.tile_height)
    }

    /// Exact inverse of [`grid_to_screen`](Self::grid_to_screen).
    #[inline]
    pub fn screen_to_grid(&self, p: Vec2) -> Vec2 {
        let a = p.x / (self.tile_width * 0.5);
        let b = p.y / (self.tile_height * 0.5);
        Vec2::new((a + b) * 0.5, (b - a) * 0.5)
    }

    /// Integer tile under a world-pixel position. Tile `(c, r)` covers the
    /// grid square `[c, c+1) × [r, r+1)`.
    pub fn pick_tile(&self, p: Vec2) -> (i32, i32) {
        let g = self.screen_to_grid(p);
        (g.x.floor() as i32, g.y.floor() as i32)
    }

    /// `(gx + gy) * TH + gz`. Larger keys are further toward the viewer and
    /// paint later.
    #[inline]
    pub fn depth_key(&self, gx: f32, gy: f32, gz: f32) -> f32 {
        (gx + gy) * self.tile_height + gz
    }
}
