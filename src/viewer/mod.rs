//! Desktop window that shows rendered frames.
//!
//! The renderer itself is CPU-side; this module only owns the winit event
//! loop, a fixed-timestep update clock and a wgpu [`Presenter`].

mod app;
pub mod config;
pub mod presenter;

pub use app::ViewerBuilder;
pub use config::{Viewport, WindowConfig, WindowMode, letterbox_viewport, physical_to_frame};
pub use presenter::Presenter;
pub use winit::keyboard::KeyCode;

use crate::surface::Surface;

/// Something the viewer can drive: a fixed-step update and a frame to show.
pub trait Scene {
    fn update(&mut self, dt: f32);
    fn render(&mut self) -> &Surface;

    fn key_pressed(&mut self, _key: KeyCode) {}
    fn key_released(&mut self, _key: KeyCode) {}
    /// Mouse wheel, in lines; positive zooms in.
    fn zoom(&mut self, _delta: f32) {}
}
