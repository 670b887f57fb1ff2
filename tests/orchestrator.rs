use glam::{Vec2, Vec3};
use image::{Rgba, RgbaImage};
use isoglow::assets::{Rect, SpriteAtlas};
use isoglow::color::Color;
use isoglow::config::{LightingConfig, RenderConfig, SnowConfig};
use isoglow::orchestrator::SceneRenderer;
use isoglow::profile::{LightingProfile, TimeOfDay};
use isoglow::compositor::Layer;
use isoglow::world::{Entity, EntityList, GridMap, ShadowShape, Solidity, WorldObject};

const GRASS: [u8; 4] = [40, 120, 60, 255];

fn config(lit: bool) -> RenderConfig {
    RenderConfig {
        viewport_width: 96,
        viewport_height: 64,
        lighting: LightingConfig { enabled: lit, threads: 1, ..Default::default() },
        snow: SnowConfig { count: 0, ..Default::default() },
        ..Default::default()
    }
}

fn assets() -> SpriteAtlas {
    let mut hero = RgbaImage::from_pixel(16, 24, Rgba([220, 200, 180, 255]));
    // Transparent corners so the hero mask has edges.
    for y in 0..4 {
        hero.put_pixel(0, y, Rgba([0, 0, 0, 0]));
        hero.put_pixel(15, y, Rgba([0, 0, 0, 0]));
    }
    SpriteAtlas::from_images(vec![
        ("grass".to_string(), RgbaImage::from_pixel(64, 32, Rgba(GRASS))),
        ("hero".to_string(), hero),
    ])
}

fn centre_camera(r: &mut SceneRenderer) {
    let c = r.iso().grid_to_screen(3.0, 3.0);
    r.camera_mut().follow(c.x, c.y);
    r.camera_mut().snap();
}

fn centre_pixel(r: &SceneRenderer) -> [f32; 4] {
    r.frame().get(48, 32).map(|c| c.0).unwrap_or_default()
}

#[test]
fn unlit_ground_shows_tile_colour() {
    let map = GridMap::filled(6, 6, "grass");
    let entities = EntityList::default();
    let mut r = SceneRenderer::new(config(false)).expect("renderer");
    assert!(!r.lighting_enabled());
    centre_camera(&mut r);
    r.render(&map, &entities, &assets());
    assert_eq!(centre_pixel(&r), Color::from_rgba8(GRASS).0);
}

#[test]
fn lit_ground_is_scaled_by_ambient() {
    let map = GridMap::filled(6, 6, "grass");
    let entities = EntityList::default();
    let mut r = SceneRenderer::new(config(true)).expect("renderer");
    assert!(r.lighting_enabled());
    centre_camera(&mut r);
    r.render(&map, &entities, &assets());

    let base = Color::from_rgba8(GRASS).0;
    let ambient = LightingProfile::night().ambient;
    let px = centre_pixel(&r);
    for c in 0..3 {
        assert!((px[c] - base[c] * ambient[c]).abs() < 1e-4, "channel {c}: {}", px[c]);
    }
    // Sky light always leads the list.
    assert!(!r.lighting_inputs().lights().is_empty());
}

#[test]
fn missing_tiles_leave_background() {
    let mut map = GridMap::filled(6, 6, "nowhere");
    map.set_tile(0, 0, None);
    let entities = EntityList::default();
    let mut r = SceneRenderer::new(config(false)).expect("renderer");
    centre_camera(&mut r);
    r.render(&map, &entities, &assets());
    assert_eq!(centre_pixel(&r), LightingProfile::night().background_color().0);
}

#[test]
fn camera_snaps_to_hero_on_entry() {
    let map = GridMap::filled(6, 6, "grass");
    let hero = Entity::new(1, Vec3::new(4.0, 2.0, 0.0)).with_animation("hero", Rect::new(0, 0, 16, 24)).as_hero();
    let entities = EntityList(vec![hero]);
    let mut r = SceneRenderer::new(config(true)).expect("renderer");
    r.update(1.0 / 60.0, &map, &entities);
    assert_eq!(r.camera().position, r.iso().grid_to_screen(4.0, 2.0));
}

#[test]
fn hero_gets_fade_zone_and_mask() {
    let map = GridMap::filled(6, 6, "grass");
    let hero = Entity::new(1, Vec3::new(3.0, 3.0, 0.0)).with_animation("hero", Rect::new(0, 0, 16, 24)).as_hero();
    let entities = EntityList(vec![hero]);
    let mut r = SceneRenderer::new(config(true)).expect("renderer");
    r.update(1.0 / 60.0, &map, &entities);
    r.render(&map, &entities, &assets());
    let inputs = r.lighting_inputs();
    assert_eq!(inputs.zones().len(), 1);
    assert!(inputs.zones()[0].alpha_only);
    assert!(inputs.hero.is_some());
    // Hero foot is the frame centre; its sprite stands above it.
    assert!(r.frame().get(48, 25).is_some_and(|c| c.alpha() == 1.0));
}

#[test]
fn fade_zone_carries_entity_strength() {
    let map = GridMap::filled(6, 6, "grass");
    let statue = Entity::new(1, Vec3::new(3.0, 3.0, 0.0))
        .with_animation("hero", Rect::new(0, 0, 16, 24))
        .with_height_fade(0.4);
    let bystander = Entity::new(2, Vec3::new(2.0, 3.0, 0.0)).with_animation("hero", Rect::new(0, 0, 16, 24));
    let entities = EntityList(vec![statue, bystander]);
    let mut r = SceneRenderer::new(config(true)).expect("renderer");
    centre_camera(&mut r);
    r.render(&map, &entities, &assets());
    let zones = r.lighting_inputs().zones();
    // Only the entity that asked for a fade gets one, even though neither is solid.
    assert_eq!(zones.len(), 1);
    assert_eq!(zones[0].strength, 0.4);
    assert!(!zones[0].alpha_only);
}

#[test]
fn solid_entity_fades_at_full_strength_by_default() {
    let map = GridMap::filled(6, 6, "grass");
    let post = Entity {
        solidity: Some(Solidity { radius: 4.0, height: 20.0 }),
        ..Entity::new(1, Vec3::new(3.0, 3.0, 0.0)).with_animation("hero", Rect::new(0, 0, 16, 24))
    };
    let entities = EntityList(vec![post]);
    let mut r = SceneRenderer::new(config(true)).expect("renderer");
    centre_camera(&mut r);
    r.render(&map, &entities, &assets());
    assert_eq!(r.lighting_inputs().zones().len(), 1);
    assert_eq!(r.lighting_inputs().zones()[0].strength, 1.0);
}

#[test]
fn ground_object_without_footprint_covers_tiles_it_spans() {
    // Large enough that edge fog stays clear of the rug.
    let mut map = GridMap::filled(10, 10, "grass");
    map.objects.push(WorldObject {
        asset: "rug".to_string(),
        gx: 3.0,
        gy: 3.0,
        draw_size: Some([64.0, 48.0]),
        anchor: [0.5, 0.0],
        footprint: [0.0, 0.0],
        solid: false,
        shadow: ShadowShape::None,
        layer: Layer::Ground,
        light: None,
    });
    let red = [200, 30, 30, 255];
    let atlas = SpriteAtlas::from_images(vec![
        ("grass".to_string(), RgbaImage::from_pixel(64, 32, Rgba(GRASS))),
        ("rug".to_string(), RgbaImage::from_pixel(64, 48, Rgba(red))),
    ]);
    let mut r = SceneRenderer::new(config(false)).expect("renderer");
    let c = r.iso().grid_to_screen(4.0, 4.0);
    r.camera_mut().follow(c.x, c.y);
    r.camera_mut().snap();
    r.render(&map, &EntityList::default(), &atlas);
    // (48, 40) lies over tile (4, 4), one tile diagonally past the rug's anchor.
    assert_eq!(r.frame().get(48, 40).map(|c| c.0), Some(Color::from_rgba8(red).0));
}

#[test]
fn malformed_frames_and_missing_assets_are_skipped() {
    let map = GridMap::filled(6, 6, "grass");
    let entities = EntityList(vec![
        Entity::new(1, Vec3::new(3.0, 3.0, 0.0)).with_animation("hero", Rect::new(8, 0, 16, 24)),
        Entity::new(2, Vec3::new(2.0, 3.0, 0.0)).with_animation("ghost", Rect::new(0, 0, 4, 4)),
    ]);
    let mut r = SceneRenderer::new(config(false)).expect("renderer");
    centre_camera(&mut r);
    r.render(&map, &entities, &assets());
    assert_eq!(centre_pixel(&r), Color::from_rgba8(GRASS).0);
    // Stable on later frames too.
    r.render(&map, &entities, &assets());
    assert_eq!(centre_pixel(&r), Color::from_rgba8(GRASS).0);
}

#[test]
fn occluder_overflow_is_dropped() {
    let map = GridMap::filled(6, 6, "grass");
    let crowd: Vec<Entity> = (0..40)
        .map(|i| Entity {
            solidity: Some(Solidity { radius: 4.0, height: 20.0 }),
            ..Entity::new(i, Vec3::new((i % 6) as f32, (i / 6) as f32 * 0.5, 0.0))
        })
        .collect();
    let entities = EntityList(crowd);
    let mut r = SceneRenderer::new(config(true)).expect("renderer");
    r.render(&map, &entities, &assets());
    assert_eq!(r.lighting_inputs().occluders().len(), isoglow::lighting::MAX_OCCLUDERS);
    assert_eq!(r.lighting_inputs().dropped(), 40 - isoglow::lighting::MAX_OCCLUDERS);
}

#[test]
fn toggle_blends_toward_day() {
    let map = GridMap::filled(6, 6, "grass");
    let entities = EntityList::default();
    let mut r = SceneRenderer::new(config(false)).expect("renderer");
    assert_eq!(r.time_of_day(), TimeOfDay::Night);
    r.toggle_time_of_day();
    assert_eq!(r.time_of_day(), TimeOfDay::Day);
    assert!(r.transition().is_active());

    for _ in 0..3 {
        r.update(0.25, &map, &entities);
    }
    let (night, day) = (LightingProfile::night(), LightingProfile::day());
    let bg = r.active_profile().background;
    for c in 0..3 {
        assert!(bg[c] > night.background[c] && bg[c] < day.background[c]);
    }

    for _ in 0..10 {
        r.update(0.25, &map, &entities);
    }
    assert!(!r.transition().is_active());
    assert_eq!(r.active_profile(), &day);
}

#[test]
fn viewport_resize_applies_on_next_render() {
    let map = GridMap::filled(6, 6, "grass");
    let entities = EntityList::default();
    let mut r = SceneRenderer::new(config(false)).expect("renderer");
    r.set_viewport(40, 30);
    let frame = r.render(&map, &entities, &assets());
    assert_eq!((frame.width(), frame.height()), (40, 30));
}

#[test]
fn zoom_is_clamped() {
    let mut r = SceneRenderer::new(config(false)).expect("renderer");
    r.adjust_zoom(100.0);
    assert_eq!(r.camera().zoom, r.config().zoom_max);
}

#[test]
fn invalid_config_is_rejected() {
    let bad = RenderConfig { tile_height: 0.0, ..config(false) };
    assert!(SceneRenderer::new(bad).is_err());
}

#[test]
fn snow_pool_follows_map_bounds() {
    let map = GridMap::filled(6, 6, "grass");
    let entities = EntityList::default();
    let cfg = RenderConfig { snow: SnowConfig { count: 50, ..Default::default() }, ..config(false) };
    let mut r = SceneRenderer::new(cfg).expect("renderer");
    r.update(0.1, &map, &entities);
    assert_eq!(r.snow().flakes().len(), 50);
    let bounds = r.snow().bounds().expect("populated");
    assert_eq!(bounds.min, Vec2::splat(-2.0));
}
