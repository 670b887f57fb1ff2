//! Read-only views of the world the renderer draws.
//!
//! The tile map and the entity list are owned by the surrounding application;
//! the renderer reads a fresh snapshot every frame and never mutates either.
//! [`GridMap`] and [`EntityList`] are plain in-memory implementations used by
//! the demo and the tests.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::assets::Rect;
use crate::compositor::Layer;
use crate::error::Result;

// ── Tiles and static objects ────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileDef {
    pub asset: String,
    #[serde(default = "default_true")]
    pub walkable: bool,
}

fn default_true() -> bool {
    true
}

fn default_one() -> f32 {
    1.0
}

/// One shadow-casting point of a static object, relative to its grid position.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShadowPoint {
    pub dx: f32,
    pub dy: f32,
    /// Casting radius in world pixels.
    pub radius: f32,
    /// Height in world pixels; controls shadow reach.
    pub height: f32,
}

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub enum ShadowShape {
    #[default]
    None,
    /// Single occluder at the object's anchor.
    Point { radius: f32, height: f32 },
    /// Several occluders along a long object (fence, wall run).
    Footprint(Vec<ShadowPoint>),
}

/// A light fixed to a static object, e.g. a lit window.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectLight {
    /// Offset above the object's ground anchor, in world pixels.
    #[serde(default)]
    pub lift: f32,
    pub radius: f32,
    pub color: [f32; 3],
    pub intensity: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldObject {
    pub asset: String,
    /// Grid position of the ground anchor.
    pub gx: f32,
    pub gy: f32,
    /// Destination size in world pixels; `None` uses the asset's own size.
    #[serde(default)]
    pub draw_size: Option<[f32; 2]>,
    /// Anchor inside the sprite, normalised (0.5, 1.0 = bottom centre).
    #[serde(default = "default_anchor")]
    pub anchor: [f32; 2],
    /// Solidity footprint in tiles.
    #[serde(default)]
    pub footprint: [f32; 2],
    #[serde(default)]
    pub solid: bool,
    #[serde(default)]
    pub shadow: ShadowShape,
    #[serde(default = "default_object_layer")]
    pub layer: Layer,
    #[serde(default)]
    pub light: Option<ObjectLight>,
}

fn default_anchor() -> [f32; 2] {
    [0.5, 1.0]
}

fn default_object_layer() -> Layer {
    Layer::Object
}

/// Read access to a tile grid and its static objects.
pub trait TileMap {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn tile(&self, col: u32, row: u32) -> Option<&TileDef>;
    fn objects(&self) -> &[WorldObject];
}

/// Row-major tile grid, loadable from JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridMap {
    pub width: u32,
    pub height: u32,
    /// `width * height` entries, row-major; `None` cells are holes.
    pub tiles: Vec<Option<TileDef>>,
    #[serde(default)]
    pub objects: Vec<WorldObject>,
}

impl GridMap {
    /// A `width × height` map with every cell set to `asset`.
    pub fn filled(width: u32, height: u32, asset: &str) -> Self {
        let tile = TileDef { asset: asset.to_string(), walkable: true };
        Self {
            width,
            height,
            tiles: vec![Some(tile); (width * height) as usize],
            objects: Vec::new(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn set_tile(&mut self, col: u32, row: u32, tile: Option<TileDef>) {
        if col < self.width && row < self.height {
            self.tiles[(row * self.width + col) as usize] = tile;
        }
    }
}

impl TileMap for GridMap {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn tile(&self, col: u32, row: u32) -> Option<&TileDef> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.tiles.get((row * self.width + col) as usize)?.as_ref()
    }

    fn objects(&self) -> &[WorldObject] {
        &self.objects
    }
}

// ── Entities ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct AnimationState {
    pub asset: String,
    /// Current frame, relative to the asset's own rect.
    pub frame: Rect,
    pub flip_x: bool,
}

/// Soft dark ellipse drawn under an entity on the ground.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BlobShadow {
    /// Radii in world pixels.
    pub radius: Vec2,
    pub opacity: f32,
}

/// Additive radial glow around an entity (campfire embers, lantern halo).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Glow {
    pub radius: f32,
    pub color: Vec3,
    pub intensity: f32,
    /// Vertical offset above the foot point, world pixels.
    pub lift: f32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LightKind {
    /// Steady lamp, gated by the profile's point-light opacity.
    Point,
    /// Flickering fire, gated by the profile's fire opacity.
    Fire,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EntityLight {
    pub kind: LightKind,
    pub radius: f32,
    pub color: Vec3,
    pub intensity: f32,
    pub lift: f32,
}

/// Shadow-casting descriptor for a dynamic entity.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Solidity {
    pub radius: f32,
    pub height: f32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MarkerKind {
    Interact,
    Quest,
}

/// Snapshot of one dynamic entity. Optional capabilities are explicit
/// `Option`s so the renderer can match on what an entity provides.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub id: u32,
    /// Grid units; `z` is height above the ground plane.
    pub position: Vec3,
    pub animation: Option<AnimationState>,
    pub blob_shadow: Option<BlobShadow>,
    pub glow: Option<Glow>,
    pub light: Option<EntityLight>,
    pub solidity: Option<Solidity>,
    /// Strength of the feet-to-head shadow lift. Solid and hero entities
    /// without one use 1.0; other entities get no lift.
    pub height_fade: Option<f32>,
    pub marker: Option<MarkerKind>,
    pub opacity: f32,
    pub scale: f32,
    pub layer: Layer,
    /// Hero entities receive volumetric shading and mask markers.
    pub hero: bool,
    /// External multiplier for glow and light (e.g. a campfire that was fed).
    pub light_multiplier: f32,
    /// Emits sparks from its foot point.
    pub sparks: bool,
}

impl Entity {
    pub fn new(id: u32, position: Vec3) -> Self {
        Self {
            id,
            position,
            animation: None,
            blob_shadow: None,
            glow: None,
            light: None,
            solidity: None,
            height_fade: None,
            marker: None,
            opacity: 1.0,
            scale: default_one(),
            layer: Layer::Object,
            hero: false,
            light_multiplier: 1.0,
            sparks: false,
        }
    }

    pub fn with_animation(mut self, asset: &str, frame: Rect) -> Self {
        self.animation = Some(AnimationState { asset: asset.to_string(), frame, flip_x: false });
        self
    }

    pub fn with_height_fade(mut self, strength: f32) -> Self {
        self.height_fade = Some(strength.clamp(0.0, 1.0));
        self
    }

    pub fn as_hero(mut self) -> Self {
        self.hero = true;
        self
    }
}

/// Snapshot list of entities for this frame.
pub trait EntitySource {
    fn entities(&self) -> &[Entity];

    fn hero(&self) -> Option<&Entity> {
        self.entities().iter().find(|e| e.hero)
    }
}

#[derive(Clone, Debug, Default)]
pub struct EntityList(pub Vec<Entity>);

impl EntitySource for EntityList {
    fn entities(&self) -> &[Entity] {
        &self.0
    }
}
