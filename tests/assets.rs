use std::fs;
use std::path::PathBuf;

use image::{Rgba, RgbaImage};
use isoglow::assets::{AssetProvider, SpriteAtlas, SpriteId};
use isoglow::error::Error;

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("isoglow-{tag}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

#[test]
fn packed_sprites_keep_their_pixels() {
    let atlas = SpriteAtlas::from_images(vec![
        ("tile".to_string(), RgbaImage::from_pixel(64, 32, Rgba([10, 20, 30, 255]))),
        ("tree".to_string(), RgbaImage::from_pixel(24, 80, Rgba([0, 200, 0, 255]))),
    ]);
    assert_eq!(atlas.len(), 2);

    let id = atlas.lookup("tree").expect("tree packed");
    let view = atlas.sprite(id).expect("tree view");
    assert_eq!((view.rect.w, view.rect.h), (24, 80));
    assert_eq!(view.image.get_pixel(view.rect.x + 3, view.rect.y + 70).0, [0, 200, 0, 255]);
    assert_eq!(atlas.dimensions("tile"), Some((64, 32)));
}

#[test]
fn unknown_names_and_ids_resolve_to_nothing() {
    let atlas = SpriteAtlas::from_images(vec![("a".to_string(), RgbaImage::new(4, 4))]);
    assert!(!atlas.has("b"));
    assert!(atlas.sprite(SpriteId(7)).is_none());
    assert_eq!(atlas.dimensions("b"), None);
}

#[test]
fn duplicate_names_keep_the_first() {
    let atlas = SpriteAtlas::from_images(vec![
        ("a".to_string(), RgbaImage::new(4, 4)),
        ("a".to_string(), RgbaImage::new(9, 9)),
    ]);
    assert_eq!(atlas.len(), 1);
    assert_eq!(atlas.dimensions("a"), Some((4, 4)));
}

#[test]
fn empty_atlas_has_no_sprites() {
    let atlas = SpriteAtlas::from_images(Vec::new());
    assert!(atlas.is_empty());
    assert!(atlas.lookup("anything").is_none());
}

#[test]
fn load_folder_reads_pngs_recursively() {
    let dir = scratch_dir("atlas");
    fs::create_dir_all(dir.join("props")).expect("subdir");
    RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 255])).save(dir.join("grass.png")).expect("save grass");
    RgbaImage::from_pixel(6, 12, Rgba([0, 0, 255, 255])).save(dir.join("props/lamp.png")).expect("save lamp");
    fs::write(dir.join("notes.txt"), "not a sprite").expect("write txt");
    fs::write(dir.join("broken.png"), b"garbage").expect("write broken");

    let atlas = SpriteAtlas::load_folder(&dir).expect("load folder");
    assert_eq!(atlas.len(), 2);
    assert_eq!(atlas.dimensions("lamp"), Some((6, 12)));
    assert!(!atlas.has("broken"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn load_folder_rejects_missing_path() {
    let missing = std::env::temp_dir().join("isoglow-definitely-missing-dir");
    assert!(matches!(SpriteAtlas::load_folder(missing), Err(Error::Asset(_))));
}
