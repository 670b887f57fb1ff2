//! Interaction markers floating over entities.
//!
//! Markers live on their own overlay so they stay unlit. Markers belonging to
//! entities behind the hero are drawn first, the hero silhouette is then cut
//! out of the overlay, and the remaining markers are drawn on top.

use glam::Vec2;

use crate::color::Color;
use crate::lighting::SpriteMask;
use crate::surface::{BlendMode, Surface};
use crate::world::MarkerKind;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Marker {
    /// Screen position of the marker's centre.
    pub screen: Vec2,
    pub kind: MarkerKind,
    /// Owner sorts before the hero and may be hidden by it.
    pub behind_hero: bool,
}

pub struct MarkerOverlay {
    surface: Surface,
    size: f32,
}

impl MarkerOverlay {
    pub fn new(width: u32, height: u32, size: f32) -> Self {
        Self { surface: Surface::new(width, height), size }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.surface.resize(width, height);
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Redraw the overlay for this frame. `time` drives the bob animation.
    pub fn render(&mut self, markers: &[Marker], hero: Option<&SpriteMask>, zoom: f32, time: f32) {
        self.surface.clear(Color::TRANSPARENT);
        if markers.is_empty() {
            return;
        }

        for m in markers.iter().filter(|m| m.behind_hero) {
            self.draw_marker(m, zoom, time);
        }
        if let Some(mask) = hero {
            self.erase_silhouette(mask);
        }
        for m in markers.iter().filter(|m| !m.behind_hero) {
            self.draw_marker(m, zoom, time);
        }
    }

    /// Source-over the overlay onto `frame`.
    pub fn composite_onto(&self, frame: &mut Surface) {
        frame.composite(&self.surface, BlendMode::SourceOver);
    }

    fn draw_marker(&mut self, marker: &Marker, zoom: f32, time: f32) {
        let s = self.size * zoom;
        let bob = (time * 3.0 + marker.screen.x * 0.05).sin() * s * 0.35;
        let c = marker.screen + Vec2::new(0.0, bob);
        match marker.kind {
            MarkerKind::Interact => {
                self.surface.fill_circle(c, s, Color::BLACK.with_alpha(0.6), BlendMode::SourceOver);
                self.surface.fill_circle(c, s * 0.7, Color::MARKER, BlendMode::SourceOver);
            }
            MarkerKind::Quest => {
                let w = (s * 0.5).max(1.0);
                self.surface.fill_rect(
                    (c.x - w * 0.5) as i32,
                    (c.y - s * 1.6) as i32,
                    w.ceil() as i32,
                    (s * 1.8) as i32,
                    Color::MARKER,
                    BlendMode::SourceOver,
                );
                self.surface.fill_circle(c + Vec2::new(0.0, s * 0.8), w * 0.7, Color::MARKER, BlendMode::SourceOver);
            }
        }
    }

    fn erase_silhouette(&mut self, mask: &SpriteMask) {
        let x0 = mask.origin.x.floor().max(0.0) as i32;
        let y0 = mask.origin.y.floor().max(0.0) as i32;
        let x1 = ((mask.origin.x + mask.size.x).ceil() as i32).min(self.surface.width() as i32);
        let y1 = ((mask.origin.y + mask.size.y).ceil() as i32).min(self.surface.height() as i32);
        for y in y0..y1 {
            for x in x0..x1 {
                let a = mask.alpha_at(Vec2::new(x as f32 + 0.5, y as f32 + 0.5));
                if a > 0.0 {
                    self.surface.blend(x, y, Color::BLACK.with_alpha(a), BlendMode::DestinationOut);
                }
            }
        }
    }
}
