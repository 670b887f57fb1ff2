use std::collections::{HashMap, HashSet};
use std::path::Path;

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};

// ── Rect ─────────────────────────────────────────────────────────────────────

/// Integer pixel rectangle inside an image.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// True if `inner`, given relative to this rect's origin, lies entirely inside it.
    pub fn contains_relative(&self, inner: &Rect) -> bool {
        inner.w > 0
            && inner.h > 0
            && inner.x.checked_add(inner.w).is_some_and(|r| r <= self.w)
            && inner.y.checked_add(inner.h).is_some_and(|b| b <= self.h)
    }
}

// ── Sprite lookup ────────────────────────────────────────────────────────────

/// Stable handle to a named sprite inside an [`AssetProvider`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SpriteId(pub u32);

/// A borrowed region of a sprite image.
#[derive(Copy, Clone, Debug)]
pub struct SpriteView<'a> {
    pub image: &'a RgbaImage,
    pub rect: Rect,
}

impl<'a> SpriteView<'a> {
    /// Narrow to an animation frame given relative to this view.
    /// Returns `None` when the frame does not fit (malformed animation data).
    pub fn frame(&self, frame: Rect) -> Option<SpriteView<'a>> {
        if !self.rect.contains_relative(&frame) {
            return None;
        }
        Some(SpriteView {
            image: self.image,
            rect: Rect::new(self.rect.x + frame.x, self.rect.y + frame.y, frame.w, frame.h),
        })
    }

    /// Alpha at normalised `(u, v)` within this view, clamped to the rect so
    /// neighbouring frames in the same sheet are never sampled.
    pub fn alpha_at(&self, u: f32, v: f32, flip_x: bool) -> f32 {
        if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
            return 0.0;
        }
        let u = if flip_x { 1.0 - u } else { u };
        let sx = self.rect.x + ((u * self.rect.w as f32) as u32).min(self.rect.w.saturating_sub(1));
        let sy = self.rect.y + ((v * self.rect.h as f32) as u32).min(self.rect.h.saturating_sub(1));
        if sx >= self.image.width() || sy >= self.image.height() {
            return 0.0;
        }
        self.image.get_pixel(sx, sy).0[3] as f32 / 255.0
    }
}

/// Resolves asset ids to drawable images. Lookups are side-effect free; a
/// missing id makes the caller skip that draw.
pub trait AssetProvider {
    fn lookup(&self, name: &str) -> Option<SpriteId>;
    fn sprite(&self, id: SpriteId) -> Option<SpriteView<'_>>;

    fn has(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Pixel dimensions of a named asset.
    fn dimensions(&self, name: &str) -> Option<(u32, u32)> {
        let view = self.sprite(self.lookup(name)?)?;
        Some((view.rect.w, view.rect.h))
    }
}

// ── Shelf packing (pure) ─────────────────────────────────────────────────────

/// One sprite's position inside the packed atlas.
#[derive(Debug, PartialEq)]
pub struct PlacedSprite {
    pub name: String,
    pub atlas_x: u32,
    pub atlas_y: u32,
    pub pixel_w: u32,
    pub pixel_h: u32,
}

/// Shelf-pack `(name, w, h)` items into rows of at most `max_width` pixels,
/// leaving `gutter` transparent pixels right of and below every sprite.
///
/// Tallest sprites go first. Duplicate names keep their first (tallest)
/// occurrence; sprites wider than `max_width` are skipped. Returns
/// `(placements, atlas_w, atlas_h)` with both dimensions powers of two.
pub fn pack(items: &[(String, u32, u32)], max_width: u32, gutter: u32) -> (Vec<PlacedSprite>, u32, u32) {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| items[b].2.cmp(&items[a].2));

    let mut placed_names: HashSet<&str> = HashSet::new();
    let mut placements = Vec::new();
    let mut cur_x = 0u32;
    let mut cur_y = 0u32;
    let mut row_h = 0u32;

    for &i in &order {
        let (ref name, w, h) = items[i];
        if !placed_names.insert(name.as_str()) {
            continue;
        }
        if w > max_width {
            warn!(sprite = %name, width = w, max_width, "sprite wider than atlas row; skipping");
            continue;
        }
        if cur_x + w > max_width {
            cur_y += row_h;
            cur_x = 0;
            row_h = 0;
        }
        placements.push(PlacedSprite {
            name: name.clone(),
            atlas_x: cur_x,
            atlas_y: cur_y,
            pixel_w: w,
            pixel_h: h,
        });
        cur_x += w + gutter;
        row_h = row_h.max(h + gutter);
    }

    let atlas_h = (cur_y + row_h).next_power_of_two().max(1);
    let atlas_w = max_width.next_power_of_two();
    (placements, atlas_w, atlas_h)
}

// ── SpriteAtlas ──────────────────────────────────────────────────────────────

/// All named sprites packed into one RGBA image.
pub struct SpriteAtlas {
    image: RgbaImage,
    ids: HashMap<String, SpriteId>,
    rects: Vec<Rect>,
}

impl SpriteAtlas {
    const ATLAS_WIDTH: u32 = 1024;
    const GUTTER: u32 = 1;

    pub fn empty() -> Self {
        Self { image: RgbaImage::new(1, 1), ids: HashMap::new(), rects: Vec::new() }
    }

    /// Pack already-decoded images. Later duplicates of a name are dropped.
    pub fn from_images(images: Vec<(String, RgbaImage)>) -> Self {
        let mut seen = HashSet::new();
        let images: Vec<(String, RgbaImage)> = images
            .into_iter()
            .filter(|(name, _)| {
                let fresh = seen.insert(name.clone());
                if !fresh {
                    warn!(sprite = %name, "duplicate sprite name; skipping");
                }
                fresh
            })
            .collect();
        if images.is_empty() {
            return Self::empty();
        }

        let dims: Vec<(String, u32, u32)> =
            images.iter().map(|(n, img)| (n.clone(), img.width(), img.height())).collect();
        let (placements, atlas_w, atlas_h) = pack(&dims, Self::ATLAS_WIDTH, Self::GUTTER);

        let lookup: HashMap<&str, &RgbaImage> = images.iter().map(|(n, i)| (n.as_str(), i)).collect();
        let mut atlas = RgbaImage::new(atlas_w, atlas_h);
        let mut ids = HashMap::new();
        let mut rects = Vec::with_capacity(placements.len());

        for p in &placements {
            let Some(img) = lookup.get(p.name.as_str()) else { continue };
            image::imageops::replace(&mut atlas, *img, p.atlas_x as i64, p.atlas_y as i64);
            ids.insert(p.name.clone(), SpriteId(rects.len() as u32));
            rects.push(Rect::new(p.atlas_x, p.atlas_y, p.pixel_w, p.pixel_h));
        }

        info!(sprites = rects.len(), atlas_w, atlas_h, "sprite atlas packed");
        Self { image: atlas, ids, rects }
    }

    /// Scan `path` recursively for `.png` files keyed by file stem.
    /// Unreadable files are skipped with a warning.
    pub fn load_folder(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(Error::Asset(format!("sprite folder {path:?} does not exist")));
        }
        let mut loaded = Vec::new();
        for entry in walkdir::WalkDir::new(path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let file_path = entry.path();
            if file_path.extension().and_then(|s| s.to_str()) != Some("png") {
                continue;
            }
            let name = match file_path.file_stem().and_then(|s| s.to_str()) {
                Some(n) if !n.is_empty() => n.to_string(),
                _ => continue,
            };
            match image::open(file_path) {
                Ok(img) => loaded.push((name, img.to_rgba8())),
                Err(e) => warn!(?file_path, error = %e, "failed to load sprite"),
            }
        }
        Ok(Self::from_images(loaded))
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

impl AssetProvider for SpriteAtlas {
    fn lookup(&self, name: &str) -> Option<SpriteId> {
        self.ids.get(name).copied()
    }

    fn sprite(&self, id: SpriteId) -> Option<SpriteView<'_>> {
        let rect = *self.rects.get(id.0 as usize)?;
        Some(SpriteView { image: &self.image, rect })
    }
}
