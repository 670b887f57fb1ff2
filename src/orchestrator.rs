// =============================================================================
// ORCHESTRATOR.RS — Per-frame render glue
//
// `SceneRenderer` owns every per-scene piece of renderer state (camera, queue,
// frame buffers, particle pools, lighting) and runs one frame in a fixed order:
//
//   clear → enqueue tiles/objects/entities → ground → back fog → blob shadows
//   and glows → sparks → objects → front fog → snow → lights → lighting pass
//   → markers
//
// Each stage reads the fully resolved raster of the previous one.
// =============================================================================

use glam::{Vec2, Vec3};
use tracing::{debug, info, warn};

use crate::assets::{AssetProvider, SpriteId};
use crate::atmosphere::{FogSystem, SnowSystem, SparkSystem, WorldBounds};
use crate::camera::Camera;
use crate::color::Color;
use crate::compositor::{Layer, RenderQueue, SpriteDraw};
use crate::config::RenderConfig;
use crate::error::{Result, WarnOnce};
use crate::iso::IsoMetrics;
use crate::lighting::{HeightFadeZone, LightSource, LightingInputs, LightingPipeline, Occluder, SpriteMask};
use crate::markers::{Marker, MarkerOverlay};
use crate::profile::{LightingProfile, ProfileTransition, TimeOfDay};
use crate::surface::{BlendMode, Surface};
use crate::world::{Entity, EntitySource, LightKind, ShadowShape, TileMap};

const SPARK_POOL: usize = 256;
const FIRE_FLICKER: f32 = 0.35;

/// Screen geometry of an entity that made it into this frame's queue.
#[derive(Copy, Clone, Debug)]
struct PlacedEntity {
    index: usize,
    sprite: SpriteId,
    foot: Vec2,
    top_left: Vec2,
    size: Vec2,
    depth: f32,
}

pub struct SceneRenderer {
    config: RenderConfig,
    iso: IsoMetrics,
    camera: Camera,
    queue: RenderQueue,
    frame: Surface,
    markers: MarkerOverlay,
    snow: SnowSystem,
    fog: FogSystem,
    sparks: SparkSystem,
    lighting: Option<LightingPipeline>,
    inputs: LightingInputs,
    transition: ProfileTransition,
    time_of_day: TimeOfDay,
    time: f32,
    entered: bool,
    placed: Vec<PlacedEntity>,
    marker_list: Vec<Marker>,
    warned: WarnOnce,
}

impl SceneRenderer {
    /// Starts at night. A lighting pipeline that cannot start is logged once
    /// and the renderer continues unlit.
    pub fn new(config: RenderConfig) -> Result<Self> {
        config.validate()?;
        let lighting = match LightingPipeline::new(&config.lighting) {
            Ok(pipeline) => Some(pipeline),
            Err(e) => {
                warn!(error = %e, "lighting pass disabled; rendering unlit");
                None
            }
        };
        let (w, h) = (config.viewport_width, config.viewport_height);
        info!(width = w, height = h, lit = lighting.is_some(), "scene renderer ready");

        Ok(Self {
            iso: IsoMetrics::new(config.tile_width, config.tile_height),
            camera: Camera::from_config(&config),
            queue: RenderQueue::new(),
            frame: Surface::new(w, h),
            markers: MarkerOverlay::new(w, h, config.marker_size),
            snow: SnowSystem::new(config.snow.clone()),
            fog: FogSystem::new(config.fog.clone()),
            sparks: SparkSystem::new(SPARK_POOL),
            lighting,
            inputs: LightingInputs::default(),
            transition: ProfileTransition::new(TimeOfDay::Night.profile(), config.transition_duration),
            time_of_day: TimeOfDay::Night,
            time: 0.0,
            entered: false,
            placed: Vec::new(),
            marker_list: Vec::new(),
            warned: WarnOnce::default(),
            config,
        })
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn iso(&self) -> &IsoMetrics {
        &self.iso
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn frame(&self) -> &Surface {
        &self.frame
    }

    pub fn lighting_enabled(&self) -> bool {
        self.lighting.is_some()
    }

    /// Inputs handed to the lighting pass on the last rendered frame.
    pub fn lighting_inputs(&self) -> &LightingInputs {
        &self.inputs
    }

    pub fn snow(&self) -> &SnowSystem {
        &self.snow
    }

    pub fn sparks(&self) -> &SparkSystem {
        &self.sparks
    }

    pub fn active_profile(&self) -> &LightingProfile {
        self.transition.active()
    }

    pub fn transition(&self) -> &ProfileTransition {
        &self.transition
    }

    pub fn time_of_day(&self) -> TimeOfDay {
        self.time_of_day
    }

    // ── Control ──────────────────────────────────────────────────────────────

    /// Blend toward `profile` from whatever is currently displayed.
    pub fn set_profile_target(&mut self, profile: LightingProfile) {
        self.transition.set_target(profile);
    }

    pub fn set_time_of_day(&mut self, tod: TimeOfDay) {
        self.time_of_day = tod;
        self.transition.set_target(tod.profile());
    }

    pub fn toggle_time_of_day(&mut self) {
        self.set_time_of_day(self.time_of_day.toggle());
    }

    /// New output size; surfaces follow on the next `render`.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(width as f32, height as f32);
    }

    pub fn adjust_zoom(&mut self, delta: f32) {
        self.camera.adjust_zoom(delta);
    }

    // ── Update ───────────────────────────────────────────────────────────────

    pub fn update(&mut self, dt: f32, map: &dyn TileMap, entities: &dyn EntitySource) {
        let dt = dt.max(0.0);
        self.time += dt;

        if let Some(hero) = entities.hero() {
            let p = self.iso.grid_to_screen(hero.position.x, hero.position.y);
            self.camera.follow(p.x, p.y);
            if !self.entered {
                self.camera.snap();
                self.entered = true;
            }
        }
        self.camera.update(dt);
        self.transition.update(dt);
        self.fog.update(dt);

        let bounds = WorldBounds::padded(map.width(), map.height(), self.config.world_padding);
        self.snow.update(dt, bounds);

        let emitters: Vec<Vec2> = entities
            .entities()
            .iter()
            .filter(|e| e.sparks)
            .map(|e| self.iso.grid_to_screen_z(e.position.x, e.position.y, e.position.z) - Vec2::new(0.0, 6.0))
            .collect();
        self.sparks.update(dt, &emitters);
    }

    // ── Render ───────────────────────────────────────────────────────────────

    pub fn render(&mut self, map: &dyn TileMap, entities: &dyn EntitySource, assets: &dyn AssetProvider) -> &Surface {
        self.sync_viewport();
        let profile = self.transition.active().clone();
        let map_size = Vec2::new(map.width() as f32, map.height() as f32);

        self.queue.clear(&mut self.frame, profile.background_color());
        self.enqueue_map(map, assets);
        self.enqueue_entities(entities.entities(), assets);

        self.queue.flush_layer(Layer::Ground, &mut self.frame, assets);
        self.fog.draw_back(&mut self.frame, &self.iso, &self.camera, map_size, &profile);
        self.draw_shadows_and_glows(entities.entities(), &profile);
        self.sparks.draw(&mut self.frame, &self.camera, profile.fire_opacity);
        self.queue.flush_layer(Layer::Object, &mut self.frame, assets);
        self.fog.draw_front(&mut self.frame, &self.iso, &self.camera, map_size, &profile);
        self.snow.draw(&mut self.frame, &self.iso, &self.camera, profile.particle_opacity);

        self.build_lighting_inputs(map, entities.entities(), assets, &profile);
        if let Some(pipeline) = &self.lighting {
            pipeline.apply(&mut self.frame, &self.inputs);
        }

        self.draw_markers(entities.entities());
        &self.frame
    }

    fn sync_viewport(&mut self) {
        let w = self.camera.viewport.x.max(0.0) as u32;
        let h = self.camera.viewport.y.max(0.0) as u32;
        if w != self.frame.width() || h != self.frame.height() {
            debug!(width = w, height = h, "viewport resized");
            self.frame.resize(w, h);
            self.markers.resize(w, h);
        }
    }

    fn project(&self, world: Vec2) -> Vec2 {
        self.camera.world_to_screen(world)
    }

    fn resolve(&mut self, assets: &dyn AssetProvider, name: &str) -> Option<(SpriteId, Vec2)> {
        let found = assets
            .lookup(name)
            .and_then(|id| assets.sprite(id).map(|v| (id, Vec2::new(v.rect.w as f32, v.rect.h as f32))));
        if found.is_none() && self.warned.first(name) {
            warn!(asset = name, "missing sprite asset; draw skipped");
        }
        found
    }

    fn enqueue_map(&mut self, map: &dyn TileMap, assets: &dyn AssetProvider) {
        let zoom = self.camera.zoom;
        let tw = self.iso.tile_width;
        let th = self.iso.tile_height;

        for row in 0..map.height() {
            for col in 0..map.width() {
                let Some(tile) = map.tile(col, row) else { continue };
                let Some((id, dims)) = self.resolve(assets, &tile.asset) else { continue };
                let (cx, cy) = (col as f32 + 0.5, row as f32 + 0.5);
                let w = tw * zoom;
                let h = dims.y * tw / dims.x.max(1.0) * zoom;
                let draw = SpriteDraw {
                    offset: Vec2::new(-w * 0.5, -th * 0.5 * zoom),
                    ..SpriteDraw::anchored(id, self.project(self.iso.grid_to_screen(cx, cy)), Vec2::new(w, h))
                };
                self.queue.enqueue_tile(draw, self.iso.depth_key(col as f32, row as f32, 0.0));
            }
        }

        for obj in map.objects() {
            let Some((id, dims)) = self.resolve(assets, &obj.asset) else { continue };
            let world_size = obj.draw_size.map(Vec2::from).unwrap_or(dims);
            let size = world_size * zoom;
            let anchor = self.project(self.iso.grid_to_screen(obj.gx, obj.gy));
            let draw = SpriteDraw {
                offset: -Vec2::from(obj.anchor) * size,
                ..SpriteDraw::anchored(id, anchor, size)
            };
            let mut depth = self.iso.depth_key(obj.gx, obj.gy, 0.0);
            if obj.layer == Layer::Ground {
                let [fw, fh] = if obj.footprint[0] > 0.0 || obj.footprint[1] > 0.0 {
                    obj.footprint
                } else {
                    // No footprint: treat the sprite as a square of its width in tiles.
                    let span = world_size.x / tw;
                    [span, span]
                };
                depth += (fw + fh) * 0.5 * th + 1.0;
            }
            self.queue.enqueue_object(obj.layer, draw, depth);
        }
    }

    fn enqueue_entities(&mut self, entities: &[Entity], assets: &dyn AssetProvider) {
        self.placed.clear();
        let zoom = self.camera.zoom;

        for (index, e) in entities.iter().enumerate() {
            let Some(anim) = &e.animation else { continue };
            let Some((id, _)) = self.resolve(assets, &anim.asset) else { continue };
            let well_formed = assets.sprite(id).and_then(|v| v.frame(anim.frame)).is_some();
            if !well_formed {
                if self.warned.first(&format!("frame:{}", e.id)) {
                    warn!(entity = e.id, asset = %anim.asset, frame = ?anim.frame, "malformed animation frame; entity skipped");
                }
                continue;
            }

            let size = Vec2::new(anim.frame.w as f32, anim.frame.h as f32) * e.scale * zoom;
            let foot = self.project(self.iso.grid_to_screen_z(e.position.x, e.position.y, e.position.z));
            let depth = self.iso.depth_key(e.position.x, e.position.y, 0.0);
            let draw = SpriteDraw {
                frame: Some(anim.frame),
                opacity: e.opacity,
                flip_x: anim.flip_x,
                ..SpriteDraw::anchored(id, foot, size)
            };
            self.queue.enqueue_entity(e.layer, draw, depth);
            self.placed.push(PlacedEntity {
                index,
                sprite: id,
                foot,
                top_left: foot + draw.offset,
                size,
                depth,
            });
        }
    }

    fn draw_shadows_and_glows(&mut self, entities: &[Entity], profile: &LightingProfile) {
        let zoom = self.camera.zoom;
        for e in entities {
            let foot = self.project(self.iso.grid_to_screen(e.position.x, e.position.y));
            if let Some(blob) = e.blob_shadow {
                let c = Color::BLACK.with_alpha(blob.opacity * e.opacity);
                self.frame.fill_radial(foot, blob.radius.x * zoom, blob.radius.y * zoom, c, BlendMode::SourceOver);
            }
            if let Some(glow) = e.glow {
                let strength = glow.intensity * profile.fire_opacity * e.light_multiplier;
                if strength > 0.0 {
                    let center = foot - Vec2::new(0.0, glow.lift * zoom);
                    let r = glow.radius * zoom * e.light_multiplier.sqrt().max(0.0);
                    let c = Color::from_rgb(glow.color, strength.min(1.0));
                    self.frame.fill_radial(center, r, r * 0.75, c, BlendMode::Additive);
                }
            }
        }
    }

    fn build_lighting_inputs(
        &mut self,
        map: &dyn TileMap,
        entities: &[Entity],
        assets: &dyn AssetProvider,
        profile: &LightingProfile,
    ) {
        let zoom = self.camera.zoom;
        let inputs = &mut self.inputs;
        inputs.clear();
        inputs.ambient = Vec3::from(profile.ambient);
        inputs.shadow_length_mult = profile.shadow_length_mult;
        inputs.shadow_opacity = profile.shadow_opacity;
        inputs.rim_color = Vec3::from(profile.volumetric_rim_color);
        inputs.iso_ratio = self.iso.ratio();
        inputs.time = self.time;

        // Sky light is always first; the hero's volumetric shading keys off it.
        let center = self.iso.grid_to_screen(map.width() as f32 * 0.5, map.height() as f32 * 0.5);
        let sky = self.camera.world_to_screen(center + Vec2::from(profile.sky_light_offset));
        inputs.push_light(LightSource::new(
            sky,
            profile.sky_light_radius * zoom,
            Vec3::from(profile.sky_light_color),
            profile.sky_light_intensity,
        ));

        for obj in map.objects() {
            let anchor = self.iso.grid_to_screen(obj.gx, obj.gy);
            if let Some(light) = obj.light {
                if profile.point_light_opacity > 0.0 {
                    let pos = self.camera.world_to_screen(anchor - Vec2::new(0.0, light.lift));
                    inputs.push_light(LightSource::new(
                        pos,
                        light.radius * zoom,
                        Vec3::from(light.color),
                        light.intensity * profile.point_light_opacity,
                    ));
                }
            }
            match &obj.shadow {
                ShadowShape::None => {}
                ShadowShape::Point { radius, height } => {
                    inputs.push_occluder(Occluder {
                        position: self.camera.world_to_screen(anchor),
                        radius: radius * zoom,
                        height: height * zoom,
                    });
                }
                ShadowShape::Footprint(points) => {
                    for p in points {
                        let world = self.iso.grid_to_screen(obj.gx + p.dx, obj.gy + p.dy);
                        inputs.push_occluder(Occluder {
                            position: self.camera.world_to_screen(world),
                            radius: p.radius * zoom,
                            height: p.height * zoom,
                        });
                    }
                }
            }
        }

        for e in entities {
            let foot = self.camera.world_to_screen(self.iso.grid_to_screen(e.position.x, e.position.y));
            if let Some(light) = e.light {
                let (gate, flicker) = match light.kind {
                    LightKind::Point => (profile.point_light_opacity, 0.0),
                    LightKind::Fire => (profile.fire_opacity * e.light_multiplier, FIRE_FLICKER),
                };
                if gate > 0.0 {
                    let pos = foot - Vec2::new(0.0, light.lift * zoom);
                    inputs.push_light(
                        LightSource::new(pos, light.radius * zoom, light.color, light.intensity * gate)
                            .with_flicker(flicker),
                    );
                }
            }
            if let Some(solid) = e.solidity {
                inputs.push_occluder(Occluder {
                    position: foot,
                    radius: solid.radius * zoom,
                    height: solid.height * zoom,
                });
            }
        }

        for placed in &self.placed {
            let e = &entities[placed.index];
            let strength = match e.height_fade {
                Some(strength) => strength,
                None if e.hero || e.solidity.is_some() => 1.0,
                None => continue,
            };
            inputs.push_zone(HeightFadeZone {
                foot: placed.foot,
                size: placed.size,
                strength,
                alpha_only: e.hero,
            });
            if e.hero && inputs.hero.is_none() {
                let flip = e.animation.as_ref().is_some_and(|a| a.flip_x);
                inputs.hero = e
                    .animation
                    .as_ref()
                    .and_then(|a| assets.sprite(placed.sprite)?.frame(a.frame))
                    .and_then(|view| SpriteMask::from_view(&view, placed.top_left, placed.size, flip));
            }
        }

        if inputs.dropped() > 0 && self.warned.first("lighting-caps") {
            debug!(dropped = inputs.dropped(), "lighting caps exceeded; extra entries dropped");
        }
    }

    fn draw_markers(&mut self, entities: &[Entity]) {
        self.marker_list.clear();
        let hero_depth = self
            .placed
            .iter()
            .find(|p| entities[p.index].hero)
            .map(|p| p.depth);

        for placed in &self.placed {
            let e = &entities[placed.index];
            let Some(kind) = e.marker else { continue };
            let gap = self.config.marker_size * 2.0 * self.camera.zoom;
            self.marker_list.push(Marker {
                screen: Vec2::new(placed.foot.x, placed.top_left.y - gap),
                kind,
                behind_hero: hero_depth.is_some_and(|d| placed.depth < d) && !e.hero,
            });
        }
        if self.marker_list.is_empty() {
            return;
        }

        self.markers
            .render(&self.marker_list, self.inputs.hero.as_ref(), self.camera.zoom, self.time);
        self.markers.composite_onto(&mut self.frame);
    }
}
