// ── Per-pixel lighting math ──────────────────────────────────────────────────
//
// Pure functions of one fragment position and the frame's light inputs. The
// pipeline calls `shade_pixel` for every pixel; tests call the pieces.

use glam::{Vec2, Vec3};

use super::{HeightFadeZone, LightSource, LightingInputs, Occluder, SpriteMask};

/// Darkest a single occluder can make a fragment (1 - this).
pub const SHADOW_CORE: f32 = 0.85;

/// Light offsets shorter than this are replaced by a straight-down vector.
pub const MIN_LIGHT_OFFSET: f32 = 8.0;

/// Flicker noise changes this many times per second.
pub const FLICKER_RATE: f32 = 12.0;

#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge0 == edge1 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[inline]
pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Integer hash to `[0, 1)`.
pub fn hash01(n: u32) -> f32 {
    let mut x = n.wrapping_mul(0x9E37_79B9);
    x ^= x >> 16;
    x = x.wrapping_mul(0x85EB_CA6B);
    x ^= x >> 13;
    x = x.wrapping_mul(0xC2B2_AE35);
    x ^= x >> 16;
    (x & 0x00FF_FFFF) as f32 / 16_777_216.0
}

/// Multiplicative flicker for light `index` at `time` seconds.
pub fn flicker(index: usize, time: f32, strength: f32) -> f32 {
    if strength <= 0.0 {
        return 1.0;
    }
    let step = (time.max(0.0) * FLICKER_RATE).floor() as u32;
    let n = hash01((index as u32).wrapping_mul(7919) ^ step);
    1.0 - strength.min(1.0) * n
}

/// Elliptical `1 - d²` attenuation. The vertical offset is scaled by the
/// isometric ratio so pools are squashed like the ground plane.
pub fn falloff(p: Vec2, light: &LightSource, iso_ratio: f32) -> f32 {
    if light.radius <= 0.0 {
        return 0.0;
    }
    let d = Vec2::new(p.x - light.position.x, (p.y - light.position.y) * iso_ratio);
    let dist = d.length() / light.radius;
    if dist >= 1.0 { 0.0 } else { 1.0 - dist * dist }
}

/// Shadow factor (1 = lit) of one occluder on the fragment→light segment.
pub fn occluder_shadow(p: Vec2, light_pos: Vec2, occ: &Occluder, shadow_length_mult: f32) -> f32 {
    let seg = light_pos - p;
    let len2 = seg.length_squared();
    if len2 < 1e-6 || occ.radius <= 0.0 {
        return 1.0;
    }
    let max_reach = occ.max_reach(shadow_length_mult);
    if max_reach <= 0.0 {
        return 1.0;
    }

    let to_occ = occ.position - p;
    let t = to_occ.dot(seg) / len2;
    if t <= 0.0 || t >= 1.0 {
        return 1.0;
    }
    let len = len2.sqrt();
    let perp = occ.position.distance(p + seg * t);
    let coverage = 1.0 - smoothstep(occ.radius * 0.5, occ.radius, perp);
    if coverage <= 0.0 {
        return 1.0;
    }

    let edge = occ.radius / len;
    let end_fade = smoothstep(0.0, edge, t) * smoothstep(1.0, 1.0 - edge, t);

    let rr = to_occ.length() / max_reach;
    let reach = (1.0 - rr).max(0.0) / (1.0 + 4.0 * rr * rr);

    1.0 - coverage * end_fade * reach * SHADOW_CORE
}

/// Minimum over all occluders; overlapping shadows do not stack.
pub fn combined_shadow(p: Vec2, light_pos: Vec2, occluders: &[Occluder], shadow_length_mult: f32) -> f32 {
    occluders
        .iter()
        .map(|o| occluder_shadow(p, light_pos, o, shadow_length_mult))
        .fold(1.0, f32::min)
}

/// How much `zone` lifts shadow at `p`, in `[0, 1]`.
pub fn height_fade_lift(p: Vec2, light_pos: Vec2, zone: &HeightFadeZone, mask: Option<&SpriteMask>) -> f32 {
    if zone.size.y <= 0.0 || zone.strength <= 0.0 {
        return 0.0;
    }
    let top = zone.foot.y - zone.size.y;
    if p.y < top || p.y > zone.foot.y {
        return 0.0;
    }

    let containment = match (zone.alpha_only, mask) {
        (true, Some(mask)) => mask.alpha_at(p),
        _ => {
            let half_w = (zone.size.x * 0.5).max(1e-3);
            let dx = (p.x - zone.foot.x).abs() / half_w;
            1.0 - smoothstep(0.7, 1.0, dx)
        }
    };
    if containment <= 0.0 {
        return 0.0;
    }

    let v = ((zone.foot.y - p.y) / zone.size.y).clamp(0.0, 1.0);
    // Light below the foot on screen sits in front of the sprite.
    let dir = (light_pos - zone.foot).normalize_or_zero();
    let facing = 1.0 - 0.5 * dir.y.max(0.0);

    (v * containment * facing * zone.strength).clamp(0.0, 1.0)
}

/// Full shadow term for one light: occluders, height fade, global opacity.
pub fn shadow_for_light(p: Vec2, light_pos: Vec2, inputs: &LightingInputs) -> f32 {
    let occluders = inputs.occluders();
    let mut shadow = if occluders.is_empty() {
        1.0
    } else {
        combined_shadow(p, light_pos, occluders, inputs.shadow_length_mult)
    };

    if shadow < 1.0 {
        let lift = inputs
            .zones()
            .iter()
            .map(|z| height_fade_lift(p, light_pos, z, inputs.hero.as_ref()))
            .fold(0.0, f32::max);
        shadow = mix(shadow, 1.0, lift);
    }

    mix(1.0, shadow, inputs.shadow_opacity.clamp(0.0, 1.0))
}

/// Half-Lambert diffuse and rim term for the hero sprite at `p`, or `None`
/// when `p` is outside the sprite.
pub fn volumetric(p: Vec2, mask: &SpriteMask, light_pos: Vec2, iso_ratio: f32) -> Option<(f32, f32)> {
    let alpha = mask.alpha_at(p);
    if alpha <= 0.0 {
        return None;
    }
    let u = ((p.x - mask.origin.x) / mask.size.x).clamp(0.0, 1.0);
    let nx = u * 2.0 - 1.0;
    let nz = (1.0 - nx * nx).max(0.0).sqrt();

    let center = mask.origin + mask.size * 0.5;
    let offset = light_pos - center;
    // Screen-down is toward the viewer; the vertical offset becomes depth.
    let mut l = Vec2::new(offset.x, offset.y * iso_ratio);
    if l.length() < MIN_LIGHT_OFFSET {
        l = Vec2::new(0.0, MIN_LIGHT_OFFSET);
    }
    let l = l.normalize();

    let ndotl = nx * l.x + nz * l.y;
    let diffuse = (ndotl * 0.5 + 0.5).powi(2);

    let rim = if mask.is_edge(p) { (1.0 - nz).powi(3) * alpha } else { 0.0 };
    Some((diffuse, rim))
}

/// Light one straight-alpha pixel. `flickers[i]` belongs to `inputs.lights()[i]`.
pub fn shade_pixel(scene: [f32; 4], p: Vec2, inputs: &LightingInputs, flickers: &[f32], bloom_ceiling: f32) -> [f32; 4] {
    let mut directional = Vec3::ZERO;

    for (i, light) in inputs.lights().iter().enumerate() {
        let att = falloff(p, light, inputs.iso_ratio);
        if att <= 0.0 {
            continue;
        }
        let shadow = shadow_for_light(p, light.position, inputs);
        let flick = flickers.get(i).copied().unwrap_or(1.0);
        directional += light.color * (light.intensity * att * flick * shadow);
    }

    if let (Some(mask), Some(first)) = (inputs.hero.as_ref(), inputs.lights().first()) {
        if let Some((diffuse, rim)) = volumetric(p, mask, first.position, inputs.iso_ratio) {
            directional = directional * diffuse + inputs.rim_color * rim;
        }
    }

    let total = (inputs.ambient + directional).min(Vec3::splat(bloom_ceiling));
    [scene[0] * total.x, scene[1] * total.y, scene[2] * total.z, scene[3]]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occ(x: f32, y: f32, radius: f32, height: f32) -> Occluder {
        Occluder { position: Vec2::new(x, y), radius, height }
    }

    #[test]
    fn smoothstep_handles_reversed_edges() {
        assert_eq!(smoothstep(1.0, 0.5, 1.0), 0.0);
        assert_eq!(smoothstep(1.0, 0.5, 0.5), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn falloff_is_elliptical() {
        let light = LightSource::new(Vec2::ZERO, 100.0, Vec3::ONE, 1.0);
        let side = falloff(Vec2::new(50.0, 0.0), &light, 2.0);
        let below = falloff(Vec2::new(0.0, 50.0), &light, 2.0);
        assert!((side - 0.75).abs() < 1e-6);
        assert_eq!(below, 0.0);
    }

    #[test]
    fn occluder_behind_fragment_casts_nothing() {
        let p = Vec2::new(100.0, 100.0);
        let light = Vec2::new(300.0, 100.0);
        assert_eq!(occluder_shadow(p, light, &occ(60.0, 100.0, 10.0, 60.0), 2.0), 1.0);
        assert_eq!(occluder_shadow(p, light, &occ(340.0, 100.0, 10.0, 60.0), 2.0), 1.0);
    }

    #[test]
    fn occluder_between_is_soft() {
        let p = Vec2::new(100.0, 100.0);
        let light = Vec2::new(300.0, 100.0);
        let s = occluder_shadow(p, light, &occ(140.0, 100.0, 10.0, 60.0), 2.2);
        assert!(s > 0.0 && s < 1.0, "shadow {s}");
    }

    #[test]
    fn occluder_beyond_reach_casts_nothing() {
        let p = Vec2::new(100.0, 100.0);
        let light = Vec2::new(300.0, 100.0);
        assert_eq!(occluder_shadow(p, light, &occ(200.0, 100.0, 10.0, 10.0), 1.0), 1.0);
    }

    #[test]
    fn shadows_take_minimum() {
        let p = Vec2::new(100.0, 100.0);
        let light = Vec2::new(300.0, 100.0);
        let a = occ(140.0, 100.0, 10.0, 60.0);
        let single = occluder_shadow(p, light, &a, 2.2);
        let both = combined_shadow(p, light, &[a, a], 2.2);
        assert_eq!(single, both);
    }

    #[test]
    fn flicker_is_steady_within_a_step() {
        let a = flicker(3, 1.00, 0.4);
        let b = flicker(3, 1.00 + 0.5 / FLICKER_RATE, 0.4);
        assert_eq!(a, b);
        assert!((0.6..=1.0).contains(&a));
        assert_eq!(flicker(3, 1.0, 0.0), 1.0);
    }

    // 4x4 opaque frame stretched over 40x40 pixels: border texels are edges.
    fn solid_mask() -> SpriteMask {
        SpriteMask::new(Vec2::ZERO, Vec2::splat(40.0), 4, 4, vec![1.0; 16]).expect("mask")
    }

    fn hero_inputs(ambient: f32) -> LightingInputs {
        let mut inputs = LightingInputs::new(Vec3::splat(ambient));
        inputs.hero = Some(solid_mask());
        inputs
    }

    #[test]
    fn side_light_brightens_the_near_edge() {
        let mask = solid_mask();
        let light = Vec2::new(200.0, 20.0);
        let (right, _) = volumetric(Vec2::new(38.0, 20.0), &mask, light, 2.0).expect("inside");
        let (left, _) = volumetric(Vec2::new(2.0, 20.0), &mask, light, 2.0).expect("inside");
        assert!(right > left, "right {right} left {left}");
        assert!(volumetric(Vec2::new(50.0, 20.0), &mask, light, 2.0).is_none());
    }

    #[test]
    fn back_lit_hero_keeps_ambient() {
        let mut inputs = hero_inputs(0.3);
        inputs.push_light(LightSource::new(Vec2::new(200.0, 20.0), 500.0, Vec3::ONE, 1.0));
        // Far side of the cylinder: diffuse is zero and no rim colour is set.
        let p = Vec2::new(0.0, 20.0);
        let (diffuse, _) = volumetric(p, inputs.hero.as_ref().expect("mask"), Vec2::new(200.0, 20.0), 2.0).expect("inside");
        assert_eq!(diffuse, 0.0);
        let out = shade_pixel([0.5, 0.5, 0.5, 1.0], p, &inputs, &[1.0], 2.0);
        for c in &out[..3] {
            assert!((c - 0.15).abs() < 1e-6, "{c}");
        }
        assert_eq!(out[3], 1.0);
    }

    #[test]
    fn hero_without_lights_is_ambient_only() {
        let mut inputs = hero_inputs(0.4);
        inputs.rim_color = Vec3::ONE;
        let out = shade_pixel([1.0, 0.5, 0.25, 1.0], Vec2::new(2.0, 20.0), &inputs, &[], 2.0);
        assert_eq!(out, [0.4, 0.2, 0.1, 1.0]);
    }

    #[test]
    fn rim_only_on_silhouette_edge() {
        let mask = solid_mask();
        let light = Vec2::new(200.0, 20.0);
        let mut lit_edges = 0;
        for y in 0..4 {
            for x in 0..4 {
                let p = Vec2::new(x as f32 * 10.0 + 5.0, y as f32 * 10.0 + 5.0);
                let (_, rim) = volumetric(p, &mask, light, 2.0).expect("inside");
                if rim > 0.0 {
                    assert!(mask.is_edge(p), "rim at interior texel ({x}, {y})");
                    lit_edges += 1;
                }
            }
        }
        assert!(lit_edges > 0);
        assert!(!mask.is_edge(Vec2::new(15.0, 15.0)));
    }

    #[test]
    fn light_at_sprite_centre_stays_finite() {
        let mask = solid_mask();
        let centre = Vec2::splat(20.0);
        for p in [Vec2::new(2.0, 20.0), centre, Vec2::new(38.0, 38.0)] {
            let (diffuse, rim) = volumetric(p, &mask, centre, 2.0).expect("inside");
            assert!(diffuse.is_finite() && rim.is_finite());
            assert!((0.0..=1.0).contains(&diffuse));
        }
    }
}
