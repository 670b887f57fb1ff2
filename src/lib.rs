pub mod assets;
pub mod atmosphere;
pub mod camera;
pub mod color;
pub mod compositor;
pub mod config;
pub mod error;
pub mod iso;
pub mod lighting;
pub mod markers;
pub mod orchestrator;
pub mod profile;
pub mod surface;
pub mod viewer;
pub mod world;

pub use assets::{AssetProvider, Rect, SpriteAtlas, SpriteId};
pub use camera::Camera;
pub use color::Color;
pub use compositor::{Layer, RenderQueue};
pub use config::RenderConfig;
pub use error::{Error, Result};
pub use iso::IsoMetrics;
pub use lighting::{LightingInputs, LightingPipeline};
pub use orchestrator::SceneRenderer;
pub use profile::{LightingProfile, ProfileTransition, TimeOfDay, lerp_profile};
pub use surface::Surface;
pub use world::{Entity, EntityList, EntitySource, GridMap, TileMap};
