// Demo scene: a small snowy clearing with trees, a fence, a lamp post, a
// campfire and a hero you can walk around.
//
//   cargo run                          open a window
//   cargo run -- --snapshot out.png    render headless and write one frame
//   cargo run -- --config cfg.json     load a RenderConfig
//   cargo run -- --day                 start in daylight
//   cargo run -- --debug               log frame timings
//
// Keys: arrows move, T toggles day/night, F feeds the fire, wheel zooms.

use glam::{Vec2, Vec3};
use image::{Rgba, RgbaImage};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use isoglow::assets::{Rect, SpriteAtlas};
use isoglow::config::RenderConfig;
use isoglow::error::Error;
use isoglow::orchestrator::SceneRenderer;
use isoglow::profile::TimeOfDay;
use isoglow::surface::Surface;
use isoglow::viewer::{KeyCode, Scene, ViewerBuilder};
use isoglow::world::{
    BlobShadow, Entity, EntityLight, EntityList, Glow, GridMap, LightKind, MarkerKind, ObjectLight, ShadowPoint,
    ShadowShape, Solidity, TileDef, WorldObject,
};
use isoglow::Layer;

const MAP_SIZE: u32 = 12;
const HERO_ID: u32 = 1;
const FIRE_ID: u32 = 3;
const HERO_SPEED: f32 = 3.0;
const SNAPSHOT_FRAMES: u32 = 90;

// ── Procedural sprites ───────────────────────────────────────────────────────

fn shade(c: [u8; 4], f: f32) -> Rgba<u8> {
    let s = |v: u8| (v as f32 * f).clamp(0.0, 255.0) as u8;
    Rgba([s(c[0]), s(c[1]), s(c[2]), c[3]])
}

/// Diamond tile with a darker skirt below it.
fn draw_tile(base: [u8; 4], seed: u32) -> RgbaImage {
    let (w, top_h, skirt) = (64u32, 32u32, 8u32);
    let mut img = RgbaImage::new(w, top_h + skirt);
    for y in 0..top_h + skirt {
        for x in 0..w {
            let fx = (x as f32 + 0.5 - 32.0).abs() / 32.0;
            let in_top = y < top_h && (y as f32 + 0.5 - 16.0).abs() / 16.0 + fx <= 1.0;
            let in_skirt = y >= 16 && (y as f32 + 0.5 - 16.0 - skirt as f32) / 16.0 + fx <= 1.0 && !in_top;
            if in_top {
                let speck = (x.wrapping_mul(73) ^ y.wrapping_mul(151) ^ seed) % 17 == 0;
                img.put_pixel(x, y, shade(base, if speck { 0.88 } else { 1.0 }));
            } else if in_skirt {
                img.put_pixel(x, y, shade(base, 0.55));
            }
        }
    }
    img
}

fn draw_tree() -> RgbaImage {
    let (w, h) = (48u32, 96u32);
    let mut img = RgbaImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let cx = x as f32 + 0.5 - 24.0;
            if y >= 78 && cx.abs() < 4.0 {
                img.put_pixel(x, y, Rgba([0x5A, 0x3E, 0x2B, 0xFF]));
                continue;
            }
            // Three stacked cones.
            for (top, bottom) in [(4.0, 40.0), (22.0, 62.0), (40.0, 82.0)] {
                let fy = y as f32 + 0.5;
                if fy >= top && fy < bottom {
                    let half = 22.0 * (fy - top) / (bottom - top);
                    if cx.abs() <= half {
                        let snow = fy - top < 5.0;
                        let c = if snow { [0xE8, 0xEE, 0xF5, 0xFF] } else { [0x2E, 0x5E, 0x3C, 0xFF] };
                        img.put_pixel(x, y, shade(c, if cx < 0.0 { 0.85 } else { 1.0 }));
                    }
                }
            }
        }
    }
    img
}

fn draw_fence() -> RgbaImage {
    let (w, h) = (64u32, 44u32);
    let mut img = RgbaImage::new(w, h);
    let wood = [0x8B, 0x65, 0x42, 0xFF];
    for x in 0..w {
        // Rails follow the tile's down-right edge: 1 px down per 4 px across.
        let base = 6 + x / 4;
        for rail in [base, base + 10] {
            for dy in 0..3 {
                img.put_pixel(x, rail + dy, shade(wood, 0.9));
            }
        }
        if x % 20 < 4 {
            for y in base.saturating_sub(10)..(base + 16).min(h) {
                img.put_pixel(x, y, shade(wood, 1.0));
            }
        }
    }
    img
}

fn draw_lamp() -> RgbaImage {
    let (w, h) = (12u32, 56u32);
    let mut img = RgbaImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let post = (5..7).contains(&x) && y >= 10;
            let head = y < 10 && (2..10).contains(&x);
            if head {
                let lit = (3..9).contains(&x) && (2..8).contains(&y);
                img.put_pixel(x, y, if lit { Rgba([0xFF, 0xE2, 0x9A, 0xFF]) } else { Rgba([0x30, 0x30, 0x36, 0xFF]) });
            } else if post {
                img.put_pixel(x, y, Rgba([0x30, 0x30, 0x36, 0xFF]));
            }
        }
    }
    img
}

fn draw_rug() -> RgbaImage {
    let mut img = RgbaImage::new(96, 48);
    for y in 0..48 {
        for x in 0..96 {
            let d = (x as f32 + 0.5 - 48.0).abs() / 48.0 + (y as f32 + 0.5 - 24.0).abs() / 24.0;
            if d <= 1.0 {
                let border = d > 0.82;
                img.put_pixel(x, y, if border { Rgba([0xD9, 0xB2, 0x4C, 0xFF]) } else { Rgba([0x8E, 0x23, 0x2B, 0xFF]) });
            }
        }
    }
    img
}

/// Two-frame walk sheet, `frame_w × frame_h` per frame.
fn draw_character(frame_w: u32, frame_h: u32, coat: [u8; 4]) -> RgbaImage {
    let mut img = RgbaImage::new(frame_w * 2, frame_h);
    let skin = [0xF0, 0xC8, 0xA0, 0xFF];
    for frame in 0..2 {
        let ox = frame * frame_w;
        let cx = frame_w as f32 * 0.5;
        for y in 0..frame_h {
            for x in 0..frame_w {
                let fx = x as f32 + 0.5 - cx;
                let fy = y as f32 + 0.5;
                let head = (fx * fx + (fy - 8.0) * (fy - 8.0)) <= 36.0;
                let body = fy >= 13.0 && fy < frame_h as f32 - 8.0 && fx.abs() <= 7.0 - (fy - 13.0) * 0.05;
                let stride = if frame == 0 { 2.0 } else { -2.0 };
                let legs = fy >= frame_h as f32 - 8.0
                    && ((fx + 3.0 + stride * 0.5).abs() < 1.5 || (fx - 3.0 - stride * 0.5).abs() < 1.5);
                if head {
                    img.put_pixel(ox + x, y, shade(skin, 1.0));
                } else if body {
                    img.put_pixel(ox + x, y, shade(coat, 1.0));
                } else if legs {
                    img.put_pixel(ox + x, y, Rgba([0x2A, 0x24, 0x30, 0xFF]));
                }
            }
        }
    }
    img
}

fn draw_campfire() -> RgbaImage {
    let mut img = RgbaImage::new(32, 24);
    for y in 0..24u32 {
        for x in 0..32u32 {
            let fx = x as f32 + 0.5 - 16.0;
            let fy = y as f32 + 0.5;
            let log = fy > 17.0 && ((fx - (fy - 17.0) * 2.0).abs() < 2.5 || (fx + (fy - 17.0) * 2.0).abs() < 2.5);
            let flame_h = 16.0 - fx.abs() * 1.6;
            let flame = fy < 19.0 && fy > 19.0 - flame_h;
            if log {
                img.put_pixel(x, y, Rgba([0x5A, 0x3A, 0x22, 0xFF]));
            } else if flame {
                let core = fy > 19.0 - flame_h * 0.5;
                img.put_pixel(x, y, if core { Rgba([0xFF, 0xE0, 0x70, 0xFF]) } else { Rgba([0xF0, 0x70, 0x20, 0xE0]) });
            }
        }
    }
    img
}

fn build_atlas() -> SpriteAtlas {
    SpriteAtlas::from_images(vec![
        ("snow_a".to_string(), draw_tile([0xDC, 0xE4, 0xEE, 0xFF], 1)),
        ("snow_b".to_string(), draw_tile([0xCF, 0xD8, 0xE4, 0xFF], 7)),
        ("tree".to_string(), draw_tree()),
        ("fence".to_string(), draw_fence()),
        ("lamp".to_string(), draw_lamp()),
        ("rug".to_string(), draw_rug()),
        ("hero".to_string(), draw_character(24, 40, [0x3A, 0x6E, 0xC8, 0xFF])),
        ("villager".to_string(), draw_character(24, 40, [0x9A, 0x4A, 0x8C, 0xFF])),
        ("campfire".to_string(), draw_campfire()),
    ])
}

// ── World ────────────────────────────────────────────────────────────────────

fn build_map() -> GridMap {
    let mut map = GridMap::filled(MAP_SIZE, MAP_SIZE, "snow_a");
    for row in 0..MAP_SIZE {
        for col in 0..MAP_SIZE {
            if (col * 7 + row * 3) % 5 == 0 {
                map.set_tile(col, row, Some(TileDef { asset: "snow_b".to_string(), walkable: true }));
            }
        }
    }

    let tree = |gx: f32, gy: f32| WorldObject {
        asset: "tree".to_string(),
        gx,
        gy,
        draw_size: None,
        anchor: [0.5, 0.95],
        footprint: [1.0, 1.0],
        solid: true,
        shadow: ShadowShape::Point { radius: 10.0, height: 80.0 },
        layer: Layer::Object,
        light: None,
    };
    map.objects = vec![
        tree(2.5, 3.5),
        tree(3.5, 9.0),
        tree(9.5, 2.5),
        tree(10.0, 8.5),
        WorldObject {
            asset: "fence".to_string(),
            gx: 7.0,
            gy: 9.5,
            draw_size: Some([64.0, 44.0]),
            anchor: [0.5, 0.7],
            footprint: [2.0, 0.2],
            solid: true,
            shadow: ShadowShape::Footprint(vec![
                ShadowPoint { dx: -0.6, dy: 0.0, radius: 6.0, height: 24.0 },
                ShadowPoint { dx: 0.0, dy: 0.0, radius: 6.0, height: 24.0 },
                ShadowPoint { dx: 0.6, dy: 0.0, radius: 6.0, height: 24.0 },
            ]),
            layer: Layer::Object,
            light: None,
        },
        WorldObject {
            asset: "lamp".to_string(),
            gx: 4.5,
            gy: 5.5,
            draw_size: None,
            anchor: [0.5, 1.0],
            footprint: [0.3, 0.3],
            solid: true,
            shadow: ShadowShape::Point { radius: 4.0, height: 56.0 },
            layer: Layer::Object,
            light: Some(ObjectLight { lift: 50.0, radius: 150.0, color: [1.0, 0.85, 0.55], intensity: 0.9 }),
        },
        WorldObject {
            asset: "rug".to_string(),
            gx: 6.5,
            gy: 4.5,
            draw_size: None,
            anchor: [0.5, 0.5],
            footprint: [1.5, 1.5],
            solid: false,
            shadow: ShadowShape::None,
            layer: Layer::Ground,
            light: None,
        },
    ];
    map
}

fn build_entities() -> EntityList {
    let mut hero = Entity::new(HERO_ID, Vec3::new(6.0, 6.5, 0.0))
        .with_animation("hero", Rect::new(0, 0, 24, 40))
        .as_hero();
    hero.blob_shadow = Some(BlobShadow { radius: Vec2::new(11.0, 5.5), opacity: 0.45 });
    hero.solidity = Some(Solidity { radius: 7.0, height: 40.0 });

    let mut villager = Entity::new(2, Vec3::new(4.0, 7.5, 0.0)).with_animation("villager", Rect::new(0, 0, 24, 40));
    villager.blob_shadow = Some(BlobShadow { radius: Vec2::new(11.0, 5.5), opacity: 0.45 });
    villager.solidity = Some(Solidity { radius: 7.0, height: 40.0 });
    villager.height_fade = Some(0.8);
    villager.marker = Some(MarkerKind::Quest);

    let mut fire = Entity::new(FIRE_ID, Vec3::new(7.5, 6.0, 0.0)).with_animation("campfire", Rect::new(0, 0, 32, 24));
    fire.glow = Some(Glow { radius: 46.0, color: Vec3::new(1.0, 0.55, 0.2), intensity: 0.5, lift: 8.0 });
    fire.light = Some(EntityLight {
        kind: LightKind::Fire,
        radius: 190.0,
        color: Vec3::new(1.0, 0.6, 0.3),
        intensity: 1.1,
        lift: 10.0,
    });
    fire.marker = Some(MarkerKind::Interact);
    fire.sparks = true;

    EntityList(vec![hero, villager, fire])
}

// ── Demo scene ───────────────────────────────────────────────────────────────

struct Demo {
    renderer: SceneRenderer,
    map: GridMap,
    entities: EntityList,
    atlas: SpriteAtlas,
    held: Vec<KeyCode>,
    walk_clock: f32,
}

impl Demo {
    fn new(config: RenderConfig, start: TimeOfDay) -> isoglow::Result<Self> {
        let mut renderer = SceneRenderer::new(config)?;
        if start == TimeOfDay::Day {
            renderer.set_time_of_day(TimeOfDay::Day);
        }
        Ok(Self {
            renderer,
            map: build_map(),
            entities: build_entities(),
            atlas: build_atlas(),
            held: Vec::new(),
            walk_clock: 0.0,
        })
    }

    fn move_hero(&mut self, dt: f32) {
        let mut dir = Vec2::ZERO;
        for key in &self.held {
            match key {
                KeyCode::ArrowUp => dir += Vec2::new(-1.0, -1.0),
                KeyCode::ArrowDown => dir += Vec2::new(1.0, 1.0),
                KeyCode::ArrowLeft => dir += Vec2::new(-1.0, 1.0),
                KeyCode::ArrowRight => dir += Vec2::new(1.0, -1.0),
                _ => {}
            }
        }
        let Some(hero) = self.entities.0.iter_mut().find(|e| e.id == HERO_ID) else { return };
        let Some(anim) = hero.animation.as_mut() else { return };
        if dir == Vec2::ZERO {
            anim.frame.x = 0;
            return;
        }
        let step = dir.normalize() * HERO_SPEED * dt;
        let max = MAP_SIZE as f32 - 0.5;
        hero.position.x = (hero.position.x + step.x).clamp(0.5, max);
        hero.position.y = (hero.position.y + step.y).clamp(0.5, max);
        anim.flip_x = dir.x - dir.y < 0.0;

        self.walk_clock += dt;
        anim.frame.x = if (self.walk_clock * 5.0) as u32 % 2 == 0 { 0 } else { 24 };
    }
}

impl Scene for Demo {
    fn update(&mut self, dt: f32) {
        self.move_hero(dt);
        self.renderer.update(dt, &self.map, &self.entities);
    }

    fn render(&mut self) -> &Surface {
        self.renderer.render(&self.map, &self.entities, &self.atlas)
    }

    fn key_pressed(&mut self, key: KeyCode) {
        match key {
            KeyCode::KeyT => self.renderer.toggle_time_of_day(),
            KeyCode::KeyF => {
                if let Some(fire) = self.entities.0.iter_mut().find(|e| e.id == FIRE_ID) {
                    fire.light_multiplier = if fire.light_multiplier > 1.0 { 1.0 } else { 1.6 };
                    info!(multiplier = fire.light_multiplier, "campfire fed");
                }
            }
            k if !self.held.contains(&k) => self.held.push(k),
            _ => {}
        }
    }

    fn key_released(&mut self, key: KeyCode) {
        self.held.retain(|k| *k != key);
    }

    fn zoom(&mut self, delta: f32) {
        self.renderer.adjust_zoom(delta * 0.1);
    }
}

// ── Entry ────────────────────────────────────────────────────────────────────

/// Value following `flag`, if the flag is present. A flag with no value is an error.
fn arg_value(args: &[String], flag: &str) -> isoglow::Result<Option<String>> {
    let Some(i) = args.iter().position(|a| a == flag) else { return Ok(None) };
    match args.get(i + 1) {
        Some(value) if !value.starts_with("--") => Ok(Some(value.clone())),
        _ => Err(Error::InvalidConfig(format!("{flag} expects a path"))),
    }
}

fn main() -> isoglow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "isoglow=info".into()))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config = match arg_value(&args, "--config")? {
        Some(path) => RenderConfig::from_json_file(path)?,
        None => RenderConfig::default(),
    };
    let start = if args.iter().any(|a| a == "--day") { TimeOfDay::Day } else { TimeOfDay::Night };
    let (w, h) = (config.viewport_width, config.viewport_height);
    let mut demo = Demo::new(config, start)?;

    if let Some(path) = arg_value(&args, "--snapshot")? {
        for _ in 0..SNAPSHOT_FRAMES {
            demo.update(1.0 / 60.0);
        }
        demo.render().to_rgba8().save(&path)?;
        info!(%path, "snapshot written");
        return Ok(());
    }

    ViewerBuilder::default()
        .with_title("isoglow")
        .with_size(w, h)
        .run(demo)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn flag_value_is_read() {
        let a = args(&["isoglow", "--snapshot", "out.png", "--day"]);
        assert_eq!(arg_value(&a, "--snapshot").ok().flatten().as_deref(), Some("out.png"));
        assert!(matches!(arg_value(&a, "--config"), Ok(None)));
    }

    #[test]
    fn flag_without_value_is_rejected() {
        assert!(matches!(arg_value(&args(&["isoglow", "--snapshot"]), "--snapshot"), Err(Error::InvalidConfig(_))));
        assert!(matches!(
            arg_value(&args(&["isoglow", "--config", "--day"]), "--config"),
            Err(Error::InvalidConfig(_))
        ));
    }
}
