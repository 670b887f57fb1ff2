use glam::Vec2;
use image::{Rgba, RgbaImage};
use isoglow::assets::Rect;
use isoglow::color::Color;
use isoglow::surface::{BlendMode, BlitOptions, Surface};

#[test]
fn new_surface_is_transparent() {
    let s = Surface::new(3, 2);
    assert_eq!(s.pixels().len(), 6);
    assert!(s.pixels().iter().all(|p| *p == [0.0; 4]));
}

#[test]
fn out_of_bounds_writes_are_dropped() {
    let mut s = Surface::new(2, 2);
    s.put(-1, 0, Color::WHITE);
    s.put(2, 1, Color::WHITE);
    s.blend(0, 5, Color::WHITE, BlendMode::Additive);
    assert!(s.pixels().iter().all(|p| *p == [0.0; 4]));
    assert_eq!(s.get(2, 0), None);
}

#[test]
fn half_alpha_source_over_mixes() {
    let mut s = Surface::new(1, 1);
    s.clear(Color::BLACK);
    s.blend(0, 0, Color::rgba(1.0, 1.0, 1.0, 0.5), BlendMode::SourceOver);
    let c = s.get(0, 0).map(|c| c.0).unwrap_or_default();
    assert!((c[0] - 0.5).abs() < 1e-6);
    assert_eq!(c[3], 1.0);
}

#[test]
fn additive_saturates() {
    let mut s = Surface::new(1, 1);
    s.clear(Color::rgba(0.8, 0.1, 0.0, 1.0));
    s.blend(0, 0, Color::rgba(0.5, 0.5, 0.5, 1.0), BlendMode::Additive);
    let c = s.get(0, 0).map(|c| c.0).unwrap_or_default();
    assert_eq!(c[0], 1.0);
    assert!((c[1] - 0.6).abs() < 1e-6);
}

#[test]
fn destination_out_erases() {
    let mut s = Surface::new(1, 1);
    s.clear(Color::WHITE);
    s.blend(0, 0, Color::rgba(0.0, 0.0, 0.0, 1.0), BlendMode::DestinationOut);
    assert_eq!(s.get(0, 0).map(|c| c.alpha()), Some(0.0));
}

#[test]
fn blit_scales_and_flips() {
    // Left column red, right column blue.
    let mut img = RgbaImage::new(2, 1);
    img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
    img.put_pixel(1, 0, Rgba([0, 0, 255, 255]));
    let mut s = Surface::new(8, 4);
    s.blit(&img, Rect::new(0, 0, 2, 1), Vec2::ZERO, Vec2::new(8.0, 4.0), &BlitOptions::default());
    assert_eq!(s.get(0, 3).map(|c| c.0), Some([1.0, 0.0, 0.0, 1.0]));
    assert_eq!(s.get(7, 0).map(|c| c.0), Some([0.0, 0.0, 1.0, 1.0]));

    let flipped = BlitOptions { flip_x: true, ..Default::default() };
    s.blit(&img, Rect::new(0, 0, 2, 1), Vec2::ZERO, Vec2::new(8.0, 4.0), &flipped);
    assert_eq!(s.get(0, 0).map(|c| c.0), Some([0.0, 0.0, 1.0, 1.0]));
}

#[test]
fn blit_rejects_source_outside_image() {
    let img = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
    let mut s = Surface::new(4, 4);
    s.blit(&img, Rect::new(1, 1, 2, 2), Vec2::ZERO, Vec2::splat(4.0), &BlitOptions::default());
    assert!(s.pixels().iter().all(|p| p[3] == 0.0));
}

#[test]
fn radial_fill_fades_outward() {
    let mut s = Surface::new(21, 21);
    s.fill_radial(Vec2::splat(10.5), 10.0, 10.0, Color::WHITE, BlendMode::SourceOver);
    let a = |x, y| s.get(x, y).map(|c| c.alpha()).unwrap_or(0.0);
    assert!(a(10, 10) > a(14, 10));
    assert!(a(14, 10) > a(19, 10));
    assert_eq!(a(0, 0), 0.0);
}

#[test]
fn composite_skips_transparent_top() {
    let mut base = Surface::new(2, 1);
    base.clear(Color::BLACK);
    let mut top = Surface::new(2, 1);
    top.put(1, 0, Color::WHITE);
    base.composite(&top, BlendMode::SourceOver);
    assert_eq!(base.get(0, 0), Some(Color::BLACK));
    assert_eq!(base.get(1, 0), Some(Color::WHITE));
}

#[test]
fn resize_clears_to_transparent() {
    let mut s = Surface::new(2, 2);
    s.clear(Color::WHITE);
    s.resize(3, 1);
    assert_eq!((s.width(), s.height()), (3, 1));
    assert!(s.pixels().iter().all(|p| *p == [0.0; 4]));
}

#[test]
fn to_rgba8_quantises() {
    let mut s = Surface::new(1, 1);
    s.clear(Color::rgba(1.0, 0.0, 0.5, 1.0));
    let px = s.to_rgba8().get_pixel(0, 0).0;
    assert_eq!(px[0], 255);
    assert_eq!(px[1], 0);
    assert!(px[2] == 127 || px[2] == 128);
}
