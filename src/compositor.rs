use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::assets::{AssetProvider, Rect, SpriteId};
use crate::color::Color;
use crate::error::WarnOnce;
use crate::surface::{BlitOptions, Surface};

// ── Layer ────────────────────────────────────────────────────────────────────

/// Paint layer. Ground items are fully resolved before anything on the
/// object layer is drawn.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Layer {
    Ground = 0,
    Object = 1,
}

// ── RenderItem ───────────────────────────────────────────────────────────────

/// What a queued item draws.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum DrawSource {
    /// A sprite, optionally narrowed to a frame relative to the asset.
    Sprite { id: SpriteId, frame: Option<Rect> },
    /// Index into the queue's custom draw callbacks.
    Custom(usize),
}

/// Parameters for one sprite draw, in screen pixels.
#[derive(Copy, Clone, Debug)]
pub struct SpriteDraw {
    pub sprite: SpriteId,
    pub frame: Option<Rect>,
    /// Projected anchor point (usually the foot / tile centre).
    pub anchor: Vec2,
    /// Offset from the anchor to the destination's top-left corner.
    pub offset: Vec2,
    pub size: Vec2,
    pub opacity: f32,
    pub rotation: f32,
    pub flip_x: bool,
}

impl SpriteDraw {
    /// Bottom-centre anchored draw of `size` pixels.
    pub fn anchored(sprite: SpriteId, anchor: Vec2, size: Vec2) -> Self {
        Self {
            sprite,
            frame: None,
            anchor,
            offset: Vec2::new(-size.x * 0.5, -size.y),
            size,
            opacity: 1.0,
            rotation: 0.0,
            flip_x: false,
        }
    }
}

/// One per-frame draw request. Rebuilt from scratch every frame.
#[derive(Copy, Clone, Debug)]
pub struct RenderItem {
    pub layer: Layer,
    pub depth: f32,
    pub anchor: Vec2,
    pub offset: Vec2,
    pub size: Vec2,
    pub opacity: f32,
    pub rotation: f32,
    pub flip_x: bool,
    pub source: DrawSource,
}

impl RenderItem {
    fn from_draw(layer: Layer, depth: f32, d: SpriteDraw) -> Self {
        Self {
            layer,
            depth,
            anchor: d.anchor,
            offset: d.offset,
            size: d.size,
            opacity: d.opacity,
            rotation: d.rotation,
            flip_x: d.flip_x,
            source: DrawSource::Sprite { id: d.sprite, frame: d.frame },
        }
    }

    /// Conservative screen-space bounds `(min, max)`, rotation included.
    fn bounds(&self) -> (Vec2, Vec2) {
        let pos = self.anchor + self.offset;
        if self.rotation == 0.0 {
            return (pos, pos + self.size);
        }
        let center = pos + self.size * 0.5;
        let r = self.size.length() * 0.5;
        (center - Vec2::splat(r), center + Vec2::splat(r))
    }
}

type CustomDraw = Box<dyn Fn(&mut Surface)>;

// ── RenderQueue ──────────────────────────────────────────────────────────────

/// Depth-sorted compositor.
///
/// Items are appended with a layer and depth key, then drawn one layer at a
/// time with [`flush_layer`](Self::flush_layer). The item storage is reused
/// across frames; `clear` only resets lengths.
#[derive(Default)]
pub struct RenderQueue {
    items: Vec<RenderItem>,
    custom: Vec<CustomDraw>,
    sorted: bool,
    warned: WarnOnce,
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the queue and paint the background.
    pub fn clear(&mut self, surface: &mut Surface, background: Color) {
        self.items.clear();
        self.custom.clear();
        self.sorted = false;
        surface.clear(background);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[RenderItem] {
        &self.items
    }

    fn push(&mut self, item: RenderItem) {
        self.items.push(item);
        self.sorted = false;
    }

    pub fn enqueue_tile(&mut self, draw: SpriteDraw, depth: f32) {
        self.push(RenderItem::from_draw(Layer::Ground, depth, draw));
    }

    pub fn enqueue_object(&mut self, layer: Layer, draw: SpriteDraw, depth: f32) {
        self.push(RenderItem::from_draw(layer, depth, draw));
    }

    pub fn enqueue_entity(&mut self, layer: Layer, draw: SpriteDraw, depth: f32) {
        self.push(RenderItem::from_draw(layer, depth, draw));
    }

    /// Queue an arbitrary raster callback at a depth.
    pub fn enqueue_custom_draw(&mut self, layer: Layer, depth: f32, draw: impl Fn(&mut Surface) + 'static) {
        let index = self.custom.len();
        self.custom.push(Box::new(draw));
        self.push(RenderItem {
            layer,
            depth,
            anchor: Vec2::ZERO,
            offset: Vec2::ZERO,
            size: Vec2::ZERO,
            opacity: 1.0,
            rotation: 0.0,
            flip_x: false,
            source: DrawSource::Custom(index),
        });
    }

    fn sort(&mut self) {
        if self.sorted {
            return;
        }
        // Stable: equal keys keep their enqueue order.
        self.items
            .sort_by(|a, b| a.layer.cmp(&b.layer).then(a.depth.total_cmp(&b.depth)));
        self.sorted = true;
    }

    /// Draw every item of `layer` in depth order, culled to the surface.
    /// Returns the number of items drawn.
    pub fn flush_layer(&mut self, layer: Layer, surface: &mut Surface, assets: &dyn AssetProvider) -> usize {
        self.sort();
        let start = self.items.partition_point(|i| i.layer < layer);
        let end = self.items.partition_point(|i| i.layer <= layer);
        let screen = surface.size();
        let mut drawn = 0;

        for item in &self.items[start..end] {
            match item.source {
                DrawSource::Custom(index) => {
                    if let Some(draw) = self.custom.get(index) {
                        draw(surface);
                        drawn += 1;
                    }
                }
                DrawSource::Sprite { id, frame } => {
                    let (min, max) = item.bounds();
                    if max.x < 0.0 || max.y < 0.0 || min.x > screen.x || min.y > screen.y {
                        continue;
                    }
                    let Some(view) = assets.sprite(id) else {
                        if self.warned.first(&format!("sprite:{}", id.0)) {
                            warn!(sprite = id.0, "missing sprite; draw skipped");
                        }
                        continue;
                    };
                    let view = match frame {
                        Some(f) => match view.frame(f) {
                            Some(v) => v,
                            None => continue,
                        },
                        None => view,
                    };
                    let opts = BlitOptions {
                        opacity: item.opacity,
                        rotation: item.rotation,
                        flip_x: item.flip_x,
                        ..Default::default()
                    };
                    surface.blit(view.image, view.rect, item.anchor + item.offset, item.size, &opts);
                    drawn += 1;
                }
            }
        }
        drawn
    }
}
