use glam::Vec2;

use crate::config::RenderConfig;

/// 2D camera over the isometric world plane: smoothed follow and zoom.
///
/// Positions are world pixels (the output of [`IsoMetrics::grid_to_screen`]).
/// The displayed position and zoom always relax toward their targets with a
/// frame-rate independent exponential decay; only [`Camera::snap`] jumps.
///
/// [`IsoMetrics::grid_to_screen`]: crate::iso::IsoMetrics::grid_to_screen
#[derive(Clone, Debug)]
pub struct Camera {
    /// World-space pixel position the camera is centred on.
    pub position: Vec2,
    /// Current zoom level (1.0 = 1:1, >1 zooms in, <1 zooms out).
    pub zoom: f32,
    /// Viewport size in screen pixels.
    pub viewport: Vec2,
    pub(crate) target_position: Vec2,
    pub(crate) target_zoom: f32,
    follow_rate: f32,
    zoom_rate: f32,
    zoom_min: f32,
    zoom_max: f32,
}

impl Camera {
    pub fn new(viewport_width: f32, viewport_height: f32) -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 1.0,
            viewport: Vec2::new(viewport_width, viewport_height),
            target_position: Vec2::ZERO,
            target_zoom: 1.0,
            follow_rate: 6.0,
            zoom_rate: 8.0,
            zoom_min: 0.5,
            zoom_max: 3.0,
        }
    }

    pub fn from_config(config: &RenderConfig) -> Self {
        let mut cam = Self::new(config.viewport_width as f32, config.viewport_height as f32);
        cam.follow_rate = config.follow_rate;
        cam.zoom_rate = config.zoom_rate;
        cam.zoom_min = config.zoom_min;
        cam.zoom_max = config.zoom_max;
        cam.zoom = 1.0_f32.clamp(cam.zoom_min, cam.zoom_max);
        cam.target_zoom = cam.zoom;
        cam
    }

    pub fn target_position(&self) -> Vec2 {
        self.target_position
    }

    pub fn target_zoom(&self) -> f32 {
        self.target_zoom
    }

    /// Set a soft follow target; `update` eases toward it.
    pub fn follow(&mut self, x: f32, y: f32) {
        self.target_position = Vec2::new(x, y);
    }

    /// Advance position and zoom toward their targets by `dt` seconds
    /// using `1 - exp(-k·dt)` smoothing.
    pub fn update(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        let a = 1.0 - (-self.follow_rate * dt).exp();
        self.position += (self.target_position - self.position) * a;

        let z = 1.0 - (-self.zoom_rate * dt).exp();
        self.zoom += (self.target_zoom - self.zoom) * z;
    }

    /// Jump straight to the targets (scene entry).
    pub fn snap(&mut self) {
        self.position = self.target_position;
        self.zoom = self.target_zoom;
    }

    /// Change zoom immediately, clamped to the configured range. Current and
    /// target move together so wheel input never fights the smoother.
    pub fn adjust_zoom(&mut self, delta: f32) {
        let z = (self.zoom + delta).clamp(self.zoom_min, self.zoom_max);
        self.zoom = z;
        self.target_zoom = z;
    }

    /// Ease toward a new zoom level instead of jumping.
    pub fn set_zoom_target(&mut self, zoom: f32) {
        self.target_zoom = zoom.clamp(self.zoom_min, self.zoom_max);
    }

    pub fn zoom_bounds(&self) -> (f32, f32) {
        (self.zoom_min, self.zoom_max)
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width, height);
    }

    /// World pixels → screen pixels (zoom about the viewport centre).
    #[inline]
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        (world - self.position) * self.zoom + self.viewport * 0.5
    }

    /// Screen pixels → world pixels.
    #[inline]
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        (screen - self.viewport * 0.5) / self.zoom.max(0.01) + self.position
    }
}
