//! Time-of-day lighting profiles and the eased transition between them.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::color::Color;
use crate::error::Result;

/// Every tunable visual parameter for one time of day.
///
/// All fields are required so any two profiles can be interpolated
/// field-by-field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LightingProfile {
    pub name: String,
    pub ambient: [f32; 3],
    pub background: [f32; 3],
    /// Sky light offset from the map centre, world pixels.
    pub sky_light_offset: [f32; 2],
    pub sky_light_radius: f32,
    pub sky_light_color: [f32; 3],
    pub sky_light_intensity: f32,
    pub shadow_length_mult: f32,
    pub shadow_opacity: f32,
    pub point_light_opacity: f32,
    pub fire_opacity: f32,
    pub volumetric_rim_color: [f32; 3],
    pub fog_color: [f32; 3],
    pub fog_opacity: f32,
    pub particle_opacity: f32,
    /// Fog wisps blend additively instead of source-over.
    pub fog_wisp_additive: bool,
}

impl LightingProfile {
    pub fn night() -> Self {
        Self {
            name: "Night".to_string(),
            ambient: [0.18, 0.22, 0.38],
            background: [0.04, 0.05, 0.10],
            sky_light_offset: [-120.0, -260.0],
            sky_light_radius: 520.0,
            sky_light_color: [0.55, 0.65, 1.0],
            sky_light_intensity: 0.55,
            shadow_length_mult: 2.2,
            shadow_opacity: 1.0,
            point_light_opacity: 1.0,
            fire_opacity: 1.0,
            volumetric_rim_color: [0.45, 0.55, 1.0],
            fog_color: [0.10, 0.13, 0.24],
            fog_opacity: 0.85,
            particle_opacity: 1.0,
            fog_wisp_additive: true,
        }
    }

    pub fn day() -> Self {
        Self {
            name: "Day".to_string(),
            ambient: [0.92, 0.90, 0.86],
            background: [0.55, 0.70, 0.85],
            sky_light_offset: [180.0, -320.0],
            sky_light_radius: 900.0,
            sky_light_color: [1.0, 0.95, 0.85],
            sky_light_intensity: 0.35,
            shadow_length_mult: 1.2,
            shadow_opacity: 0.35,
            point_light_opacity: 0.0,
            fire_opacity: 0.25,
            volumetric_rim_color: [1.0, 0.95, 0.85],
            fog_color: [0.80, 0.86, 0.92],
            fog_opacity: 0.45,
            particle_opacity: 0.6,
            fog_wisp_additive: false,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn background_color(&self) -> Color {
        let [r, g, b] = self.background;
        Color([r, g, b, 1.0])
    }
}

// ── Interpolation ────────────────────────────────────────────────────────────

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

fn lerp3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [lerp(a[0], b[0], t), lerp(a[1], b[1], t), lerp(a[2], b[2], t)]
}

/// Field-wise linear blend. `name` and the wisp blend flag switch at `t = 0.5`.
pub fn lerp_profile(a: &LightingProfile, b: &LightingProfile, t: f32) -> LightingProfile {
    let t = t.clamp(0.0, 1.0);
    let late = t >= 0.5;
    LightingProfile {
        name: if late { b.name.clone() } else { a.name.clone() },
        ambient: lerp3(a.ambient, b.ambient, t),
        background: lerp3(a.background, b.background, t),
        sky_light_offset: [
            lerp(a.sky_light_offset[0], b.sky_light_offset[0], t),
            lerp(a.sky_light_offset[1], b.sky_light_offset[1], t),
        ],
        sky_light_radius: lerp(a.sky_light_radius, b.sky_light_radius, t),
        sky_light_color: lerp3(a.sky_light_color, b.sky_light_color, t),
        sky_light_intensity: lerp(a.sky_light_intensity, b.sky_light_intensity, t),
        shadow_length_mult: lerp(a.shadow_length_mult, b.shadow_length_mult, t),
        shadow_opacity: lerp(a.shadow_opacity, b.shadow_opacity, t),
        point_light_opacity: lerp(a.point_light_opacity, b.point_light_opacity, t),
        fire_opacity: lerp(a.fire_opacity, b.fire_opacity, t),
        volumetric_rim_color: lerp3(a.volumetric_rim_color, b.volumetric_rim_color, t),
        fog_color: lerp3(a.fog_color, b.fog_color, t),
        fog_opacity: lerp(a.fog_opacity, b.fog_opacity, t),
        particle_opacity: lerp(a.particle_opacity, b.particle_opacity, t),
        fog_wisp_additive: if late { b.fog_wisp_additive } else { a.fog_wisp_additive },
    }
}

/// Cubic ease-in-out on `[0, 1]`.
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) * 0.5
    }
}

// ── Time of day ──────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeOfDay {
    #[default]
    Night,
    Day,
}

impl TimeOfDay {
    pub fn toggle(self) -> Self {
        match self {
            TimeOfDay::Night => TimeOfDay::Day,
            TimeOfDay::Day => TimeOfDay::Night,
        }
    }

    pub fn profile(self) -> LightingProfile {
        match self {
            TimeOfDay::Night => LightingProfile::night(),
            TimeOfDay::Day => LightingProfile::day(),
        }
    }
}

// ── Transition ───────────────────────────────────────────────────────────────

/// Eased blend from one profile to another.
///
/// Retargeting mid-transition starts from the currently blended profile so
/// the visuals never pop.
#[derive(Clone, Debug)]
pub struct ProfileTransition {
    from: LightingProfile,
    to: LightingProfile,
    active: LightingProfile,
    progress: f32,
    duration: f32,
}

impl ProfileTransition {
    /// Idle at `initial`.
    pub fn new(initial: LightingProfile, duration: f32) -> Self {
        Self {
            from: initial.clone(),
            to: initial.clone(),
            active: initial,
            progress: 1.0,
            duration: duration.max(f32::EPSILON),
        }
    }

    pub fn set_target(&mut self, target: LightingProfile) {
        info!(from = %self.active.name, to = %target.name, duration = self.duration, "profile transition");
        self.from = self.active.clone();
        self.to = target;
        self.progress = 0.0;
    }

    pub fn update(&mut self, dt: f32) {
        if !self.is_active() {
            return;
        }
        self.progress = (self.progress + dt.max(0.0) / self.duration).min(1.0);
        self.active = lerp_profile(&self.from, &self.to, ease_in_out_cubic(self.progress));
    }

    pub fn is_active(&self) -> bool {
        self.progress < 1.0
    }

    /// Linear progress in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn target(&self) -> &LightingProfile {
        &self.to
    }

    pub fn active(&self) -> &LightingProfile {
        &self.active
    }
}
