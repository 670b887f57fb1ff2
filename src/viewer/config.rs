// ── Window configuration and letterboxing ────────────────────────────────────
//
// The renderer always produces a frame of fixed logical size. The window can
// be any physical size; the frame is scaled uniformly and centred inside it.

use winit::dpi::PhysicalSize;
use winit::window::{Fullscreen, Window};

// ── WindowMode ───────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum WindowMode {
    #[default]
    Windowed,
    /// Exclusive fullscreen at the video mode closest to the physical size.
    Fullscreen,
    /// Borderless window covering the current monitor.
    Borderless,
}

// ── WindowConfig ─────────────────────────────────────────────────────────────

/// Physical window size versus logical frame size.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowConfig {
    pub physical_width: u32,
    pub physical_height: u32,
    /// Size of the rendered frame.
    pub logical_width: u32,
    pub logical_height: u32,
    pub mode: WindowMode,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            physical_width: 960,
            physical_height: 540,
            logical_width: 960,
            logical_height: 540,
            mode: WindowMode::Windowed,
        }
    }
}

impl WindowConfig {
    pub fn new(physical_width: u32, physical_height: u32, logical_width: u32, logical_height: u32) -> Self {
        Self { physical_width, physical_height, logical_width, logical_height, mode: WindowMode::Windowed }
    }

    /// `logical_width / logical_height`, or `0.0` for a zero height.
    pub fn aspect_ratio(&self) -> f32 {
        if self.logical_height == 0 {
            return 0.0;
        }
        self.logical_width as f32 / self.logical_height as f32
    }
}

/// Apply `config.mode` to a live window.
pub fn apply_window_settings(window: &Window, config: &WindowConfig) {
    match config.mode {
        WindowMode::Windowed => {
            window.set_fullscreen(None);
            window.set_decorations(true);
            // A later `Resized` event reconciles the final size.
            let _ = window.request_inner_size(PhysicalSize::new(config.physical_width, config.physical_height));
        }
        WindowMode::Fullscreen => {
            let fullscreen = match window.current_monitor() {
                Some(monitor) => {
                    let target = config.physical_width as u64 * config.physical_height as u64;
                    let best = monitor.video_modes().min_by_key(|vm| {
                        let s = vm.size();
                        (s.width as u64 * s.height as u64).abs_diff(target)
                    });
                    match best {
                        Some(vm) => Fullscreen::Exclusive(vm),
                        None => Fullscreen::Borderless(Some(monitor)),
                    }
                }
                None => Fullscreen::Borderless(None),
            };
            window.set_fullscreen(Some(fullscreen));
        }
        WindowMode::Borderless => {
            window.set_fullscreen(Some(Fullscreen::Borderless(None)));
        }
    }
}

// ── Letterbox ────────────────────────────────────────────────────────────────

/// Rectangle in physical pixels where the frame is drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Largest uniformly scaled, centred rectangle of the logical aspect that
/// fits the physical window.
///
/// ```text
/// scale = min(pw / lw, ph / lh)
/// x = (pw - lw * scale) / 2,  y = (ph - lh * scale) / 2
/// ```
///
/// A zero logical dimension yields a zero-sized viewport at the origin.
pub fn letterbox_viewport(config: &WindowConfig) -> Viewport {
    if config.logical_width == 0 || config.logical_height == 0 {
        return Viewport { x: 0.0, y: 0.0, width: 0.0, height: 0.0 };
    }
    let pw = config.physical_width as f32;
    let ph = config.physical_height as f32;
    let lw = config.logical_width as f32;
    let lh = config.logical_height as f32;

    let scale = (pw / lw).min(ph / lh);
    let width = lw * scale;
    let height = lh * scale;
    Viewport { x: (pw - width) / 2.0, y: (ph - height) / 2.0, width, height }
}

/// Map a physical cursor position into frame pixels, or `None` when it
/// falls on the letterbox bars.
pub fn physical_to_frame(config: &WindowConfig, x: f32, y: f32) -> Option<(f32, f32)> {
    let vp = letterbox_viewport(config);
    if vp.width <= 0.0 || vp.height <= 0.0 {
        return None;
    }
    let u = (x - vp.x) / vp.width;
    let v = (y - vp.y) / vp.height;
    if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
        return None;
    }
    Some((u * config.logical_width as f32, v * config.logical_height as f32))
}
