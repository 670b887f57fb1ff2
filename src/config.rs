use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

// ── LightingConfig ───────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Master switch. `false` renders the scene unlit, same as a failed pool.
    pub enabled: bool,
    /// Worker threads for the per-pixel pass; `0` lets rayon pick.
    pub threads: usize,
    /// Upper bound on `ambient + directional` before it multiplies the scene.
    pub bloom_ceiling: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self { enabled: true, threads: 0, bloom_ceiling: 1.6 }
    }
}

// ── SnowConfig ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnowConfig {
    /// Fixed pool size, spread evenly over the depth layers.
    pub count: usize,
    pub layers: usize,
    /// Fall speed in screen pixels per second for the nearest layer.
    pub base_fall_speed: f32,
    /// Constant lateral drift in tiles per second (grid X axis).
    pub wind: f32,
    /// Maximum spawn height above the ground plane, in pixels.
    pub spawn_height: f32,
    /// Amplitude of the per-flake sinusoidal wobble, in tiles per second.
    pub wobble: f32,
}

impl Default for SnowConfig {
    fn default() -> Self {
        Self {
            count: 360,
            layers: 3,
            base_fall_speed: 60.0,
            wind: 0.35,
            spawn_height: 260.0,
            wobble: 0.25,
        }
    }
}

// ── FogConfig ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FogConfig {
    pub wisps_per_edge: usize,
    /// Width in world pixels of the linear fog band along each map edge.
    pub band_width: f32,
}

impl Default for FogConfig {
    fn default() -> Self {
        Self { wisps_per_edge: 5, band_width: 72.0 }
    }
}

// ── RenderConfig ─────────────────────────────────────────────────────────────

/// Every tunable of the renderer that is not part of a lighting profile.
///
/// Loadable from JSON; missing keys fall back to [`RenderConfig::default`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub tile_width: f32,
    pub tile_height: f32,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub zoom_min: f32,
    pub zoom_max: f32,
    /// Exponential follow rate `k` in `1 - exp(-k·dt)`.
    pub follow_rate: f32,
    pub zoom_rate: f32,
    /// Seconds for a full day/night blend.
    pub transition_duration: f32,
    /// Padding in tiles around the map for particle bounds.
    pub world_padding: f32,
    /// Half-size of an interaction marker, in screen pixels.
    pub marker_size: f32,
    pub lighting: LightingConfig,
    pub snow: SnowConfig,
    pub fog: FogConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            tile_width: 64.0,
            tile_height: 32.0,
            viewport_width: 960,
            viewport_height: 540,
            zoom_min: 0.5,
            zoom_max: 3.0,
            follow_rate: 6.0,
            zoom_rate: 8.0,
            transition_duration: 1.5,
            world_padding: 2.0,
            marker_size: 6.0,
            lighting: LightingConfig::default(),
            snow: SnowConfig::default(),
            fog: FogConfig::default(),
        }
    }
}

impl RenderConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        info!(?path, "loaded render config");
        Ok(config)
    }

    /// Reject values the renderer cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.tile_width <= 0.0 || self.tile_height <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "tile size must be positive, got {}x{}",
                self.tile_width, self.tile_height
            )));
        }
        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(Error::InvalidConfig("viewport must be at least 1x1".into()));
        }
        if !(self.zoom_min > 0.0 && self.zoom_min <= self.zoom_max) {
            return Err(Error::InvalidConfig(format!(
                "zoom bounds must satisfy 0 < min <= max, got [{}, {}]",
                self.zoom_min, self.zoom_max
            )));
        }
        if self.transition_duration <= 0.0 {
            return Err(Error::InvalidConfig("transition_duration must be positive".into()));
        }
        if self.snow.layers == 0 {
            return Err(Error::InvalidConfig("snow needs at least one depth layer".into()));
        }
        Ok(())
    }

    /// Horizontal-to-vertical compression of the ground plane.
    pub fn iso_ratio(&self) -> f32 {
        self.tile_width / self.tile_height
    }
}
