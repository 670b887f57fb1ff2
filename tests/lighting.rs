use glam::{Vec2, Vec3};
use isoglow::color::Color;
use isoglow::config::LightingConfig;
use isoglow::error::Error;
use isoglow::lighting::shading::{combined_shadow, flicker, height_fade_lift, occluder_shadow, shadow_for_light};
use isoglow::lighting::{
    HeightFadeZone, LightSource, LightingInputs, LightingPipeline, MAX_LIGHTS, MAX_OCCLUDERS, Occluder, SpriteMask,
};
use isoglow::surface::Surface;

fn pipeline() -> LightingPipeline {
    LightingPipeline::new(&LightingConfig { enabled: true, threads: 1, bloom_ceiling: 1.6 })
        .expect("single-thread pool")
}

fn occ(x: f32, y: f32, radius: f32, height: f32) -> Occluder {
    Occluder { position: Vec2::new(x, y), radius, height }
}

// ── Pipeline ────────────────────────────────────────────────────────────────

#[test]
fn ambient_only_multiplies_scene() {
    let mut frame = Surface::new(6, 4);
    frame.clear(Color::rgba(0.8, 0.4, 0.2, 1.0));
    let inputs = LightingInputs::new(Vec3::new(0.5, 0.25, 1.0));
    pipeline().apply(&mut frame, &inputs);
    for px in frame.pixels() {
        assert_eq!(*px, [0.8 * 0.5, 0.4 * 0.25, 0.2 * 1.0, 1.0]);
    }
}

#[test]
fn transparent_pixels_are_untouched() {
    let mut frame = Surface::new(4, 4);
    frame.put(1, 1, Color::rgba(1.0, 1.0, 1.0, 1.0));
    let mut inputs = LightingInputs::new(Vec3::splat(0.3));
    inputs.push_light(LightSource::new(Vec2::new(2.0, 2.0), 50.0, Vec3::ONE, 1.0));
    pipeline().apply(&mut frame, &inputs);
    assert_eq!(frame.get(0, 0), Some(Color([0.0; 4])));
    assert!(frame.get(1, 1).map(|c| c.0[0]).unwrap_or(0.0) > 0.3);
}

#[test]
fn light_at_pixel_centre_adds_full_intensity() {
    let mut frame = Surface::new(9, 9);
    frame.clear(Color::rgba(0.5, 0.5, 0.5, 1.0));
    let mut inputs = LightingInputs::new(Vec3::splat(0.2));
    inputs.push_light(LightSource::new(Vec2::new(4.5, 4.5), 40.0, Vec3::ONE, 1.0));
    pipeline().apply(&mut frame, &inputs);
    let c = frame.get(4, 4).map(|c| c.0).unwrap_or_default();
    assert!((c[0] - 0.6).abs() < 1e-5, "{c:?}");
}

#[test]
fn bloom_ceiling_caps_total_light() {
    let mut frame = Surface::new(3, 3);
    frame.clear(Color::rgba(0.5, 0.5, 0.5, 1.0));
    let mut inputs = LightingInputs::new(Vec3::splat(0.2));
    inputs.push_light(LightSource::new(Vec2::new(1.5, 1.5), 40.0, Vec3::ONE, 5.0));
    pipeline().apply(&mut frame, &inputs);
    let c = frame.get(1, 1).map(|c| c.0).unwrap_or_default();
    assert!((c[0] - 0.8).abs() < 1e-5, "{c:?}");
}

#[test]
fn disabled_pipeline_reports_unavailable() {
    let result = LightingPipeline::new(&LightingConfig { enabled: false, ..Default::default() });
    assert!(matches!(result, Err(Error::AccelerationUnavailable(_))));
}

// ── Shadows ─────────────────────────────────────────────────────────────────

#[test]
fn occluder_between_fragment_and_light_softly_shadows() {
    let s = occluder_shadow(Vec2::new(100.0, 100.0), Vec2::new(300.0, 100.0), &occ(140.0, 100.0, 10.0, 60.0), 2.2);
    assert!(s > 0.0 && s < 1.0, "shadow {s}");
}

#[test]
fn occluder_out_of_reach_casts_nothing() {
    // Reach is 10 px; the occluder sits 40 px from the fragment.
    let s = occluder_shadow(Vec2::new(100.0, 100.0), Vec2::new(300.0, 100.0), &occ(140.0, 100.0, 10.0, 5.0), 2.0);
    assert_eq!(s, 1.0);
}

#[test]
fn overlapping_occluders_take_the_darkest() {
    let p = Vec2::new(100.0, 100.0);
    let light = Vec2::new(300.0, 100.0);
    let near = occ(130.0, 100.0, 10.0, 60.0);
    let far = occ(160.0, 100.0, 10.0, 60.0);
    let a = occluder_shadow(p, light, &near, 2.0);
    let b = occluder_shadow(p, light, &far, 2.0);
    assert_eq!(combined_shadow(p, light, &[near, far], 2.0), a.min(b));
}

#[test]
fn max_reach_grows_with_height() {
    let mut last = 0.0;
    for h in [0.0, 10.0, 40.0, 90.0] {
        let reach = occ(0.0, 0.0, 5.0, h).max_reach(2.0);
        assert!(reach >= last);
        last = reach;
    }
    assert_eq!(occ(0.0, 0.0, 5.0, -3.0).max_reach(2.0), 0.0);
}

#[test]
fn height_fade_lifts_head_not_feet() {
    let light = Vec2::new(200.0, 50.0);
    let zone = HeightFadeZone { foot: Vec2::new(200.0, 200.0), size: Vec2::new(40.0, 80.0), strength: 1.0, alpha_only: false };
    let head = Vec2::new(200.0, 120.0);
    let foot = Vec2::new(200.0, 200.0);

    assert_eq!(height_fade_lift(foot, light, &zone, None), 0.0);
    assert!((height_fade_lift(head, light, &zone, None) - 1.0).abs() < 1e-6);

    let mut plain = LightingInputs::new(Vec3::splat(0.2));
    plain.push_occluder(occ(200.0, 90.0, 10.0, 60.0));
    plain.shadow_length_mult = 2.0;
    let mut faded = plain.clone();
    faded.push_zone(zone);

    assert!(shadow_for_light(head, light, &plain) < 0.9);
    assert!((shadow_for_light(head, light, &faded) - 1.0).abs() < 1e-5);
    assert_eq!(shadow_for_light(foot, light, &faded), shadow_for_light(foot, light, &plain));
}

#[test]
fn alpha_only_zone_follows_mask() {
    // Left half opaque.
    let alpha: Vec<f32> = (0..16).map(|i| if i % 4 < 2 { 1.0 } else { 0.0 }).collect();
    let mask = SpriteMask::new(Vec2::new(180.0, 120.0), Vec2::new(40.0, 80.0), 4, 4, alpha);
    let zone = HeightFadeZone { foot: Vec2::new(200.0, 200.0), size: Vec2::new(40.0, 80.0), strength: 1.0, alpha_only: true };
    let light = Vec2::new(200.0, 50.0);
    assert!(height_fade_lift(Vec2::new(185.0, 130.0), light, &zone, mask.as_ref()) > 0.5);
    assert_eq!(height_fade_lift(Vec2::new(215.0, 130.0), light, &zone, mask.as_ref()), 0.0);
}

#[test]
fn zero_shadow_opacity_disables_shadows() {
    let mut inputs = LightingInputs::new(Vec3::ONE);
    inputs.push_occluder(occ(140.0, 100.0, 10.0, 60.0));
    inputs.shadow_length_mult = 2.2;
    inputs.shadow_opacity = 0.0;
    assert_eq!(shadow_for_light(Vec2::new(100.0, 100.0), Vec2::new(300.0, 100.0), &inputs), 1.0);
}

// ── Inputs ──────────────────────────────────────────────────────────────────

#[test]
fn caps_drop_overflow() {
    let mut inputs = LightingInputs::default();
    for i in 0..MAX_LIGHTS + 4 {
        let kept = inputs.push_light(LightSource::new(Vec2::splat(i as f32), 10.0, Vec3::ONE, 1.0));
        assert_eq!(kept, i < MAX_LIGHTS);
    }
    for _ in 0..MAX_OCCLUDERS + 1 {
        inputs.push_occluder(occ(0.0, 0.0, 1.0, 1.0));
    }
    assert_eq!(inputs.lights().len(), MAX_LIGHTS);
    assert_eq!(inputs.occluders().len(), MAX_OCCLUDERS);
    assert_eq!(inputs.dropped(), 5);
    // First ones win.
    assert_eq!(inputs.lights()[0].position, Vec2::ZERO);

    inputs.clear();
    assert!(inputs.lights().is_empty());
    assert_eq!(inputs.dropped(), 0);
}

#[test]
fn flicker_stays_in_range() {
    for step in 0..50 {
        let f = flicker(3, step as f32 / 10.0, 0.3);
        assert!((0.7..=1.0).contains(&f), "{f}");
    }
    assert_eq!(flicker(0, 1.0, 0.0), 1.0);
}

#[test]
fn sprite_mask_rejects_bad_buffers() {
    assert!(SpriteMask::new(Vec2::ZERO, Vec2::ONE, 2, 2, vec![1.0; 3]).is_none());
    assert!(SpriteMask::new(Vec2::ZERO, Vec2::ZERO, 1, 1, vec![1.0]).is_none());
}
