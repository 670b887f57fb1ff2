use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use super::Scene;
use super::config::{WindowConfig, WindowMode, apply_window_settings};
use super::presenter::Presenter;
use crate::error::{Error, Result};

// ── ViewerBuilder ────────────────────────────────────────────────────────────

pub struct ViewerBuilder {
    title: String,
    width: u32,
    height: u32,
    mode: WindowMode,
    target_ups: u32,
    debug_enabled: bool,
}

impl Default for ViewerBuilder {
    fn default() -> Self {
        Self {
            title: "isoglow".into(),
            width: 960,
            height: 540,
            mode: WindowMode::Windowed,
            target_ups: 60,
            debug_enabled: false,
        }
    }
}

impl ViewerBuilder {
    pub fn with_title(mut self, title: &str) -> Self { self.title = title.into(); self }
    pub fn with_size(mut self, width: u32, height: u32) -> Self { self.width = width; self.height = height; self }
    pub fn with_mode(mut self, mode: WindowMode) -> Self { self.mode = mode; self }
    pub fn with_ups(mut self, ups: u32) -> Self { self.target_ups = ups.max(1); self }

    /// Log frame timings every second.
    pub fn debug(mut self, enabled: bool) -> Self { self.debug_enabled = enabled; self }

    /// Open the window and block until it closes.
    pub fn run(mut self, scene: impl Scene + 'static) -> Result<()> {
        if std::env::args().any(|arg| arg == "--debug") {
            self.debug_enabled = true;
        }
        let event_loop = EventLoop::new().map_err(|e| Error::Surface(e.to_string()))?;
        let fixed_dt = 1.0 / self.target_ups as f32;
        let mut app = App {
            config: self,
            scene: Box::new(scene),
            presenter: None,
            last_instant: None,
            accumulator: 0.0,
            fixed_dt,
            frame_times: Vec::with_capacity(60),
        };
        event_loop.run_app(&mut app).map_err(|e| Error::Surface(e.to_string()))
    }
}

// ── App (winit ApplicationHandler) ───────────────────────────────────────────

struct App {
    config: ViewerBuilder,
    scene: Box<dyn Scene>,
    presenter: Option<Presenter>,
    last_instant: Option<Instant>,
    accumulator: f32,
    fixed_dt: f32,
    frame_times: Vec<f32>,
}

impl App {
    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let elapsed = match self.last_instant {
            Some(prev) => now.duration_since(prev).as_secs_f32().min(0.25),
            None => self.fixed_dt,
        };
        self.last_instant = Some(now);
        self.accumulator += elapsed;

        while self.accumulator >= self.fixed_dt {
            self.scene.update(self.fixed_dt);
            self.accumulator -= self.fixed_dt;
        }

        let Some(presenter) = self.presenter.as_mut() else { return };
        let frame = self.scene.render();
        match presenter.present(frame) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost) => {
                let size = presenter.window.inner_size();
                presenter.resize(size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("GPU out of memory; closing viewer");
                event_loop.exit();
            }
            Err(e) => error!(error = %e, "present failed"),
        }

        if self.config.debug_enabled {
            self.frame_times.push(elapsed);
            if self.frame_times.len() >= 60 {
                let avg = self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32;
                debug!(avg_ms = avg * 1000.0, fps = 1.0 / avg.max(1e-6), "frame timing");
                self.frame_times.clear();
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.presenter.is_some() {
            return;
        }
        let attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(winit::dpi::PhysicalSize::new(self.config.width, self.config.height));
        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                error!(error = %e, "failed to create window");
                event_loop.exit();
                return;
            }
        };

        let mut window_config = WindowConfig::new(self.config.width, self.config.height, self.config.width, self.config.height);
        window_config.mode = self.config.mode;
        if window_config.mode != WindowMode::Windowed {
            apply_window_settings(&window, &window_config);
        }

        let frame = self.scene.render();
        let (lw, lh) = (frame.width(), frame.height());
        match pollster::block_on(Presenter::new(window, lw, lh)) {
            Ok(presenter) => {
                info!(logical_w = lw, logical_h = lh, "viewer started");
                self.presenter = Some(presenter);
            }
            Err(e) => {
                error!(error = %e, "failed to initialise presenter");
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(presenter) = self.presenter.as_ref() {
            presenter.window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(size) => {
                if let Some(presenter) = self.presenter.as_mut() {
                    presenter.resize(size);
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => (pos.y / 100.0) as f32,
                };
                self.scene.zoom(lines);
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            WindowEvent::KeyboardInput {
                event: KeyEvent { physical_key: PhysicalKey::Code(code), state, repeat, .. },
                ..
            } => match state {
                ElementState::Pressed if code == KeyCode::Escape => event_loop.exit(),
                ElementState::Pressed if !repeat => self.scene.key_pressed(code),
                ElementState::Pressed => {}
                ElementState::Released => self.scene.key_released(code),
            },

            _ => {}
        }
    }
}
