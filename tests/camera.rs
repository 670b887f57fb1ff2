use glam::Vec2;
use isoglow::camera::Camera;
use isoglow::config::RenderConfig;

#[test]
fn follow_converges_within_hundredth_of_a_pixel() {
    let mut cam = Camera::new(800.0, 600.0);
    cam.follow(420.0, -310.0);
    for _ in 0..300 {
        cam.update(1.0 / 60.0);
    }
    assert!((cam.position.x - 420.0).abs() < 0.01, "x {}", cam.position.x);
    assert!((cam.position.y + 310.0).abs() < 0.01, "y {}", cam.position.y);
}

#[test]
fn follow_never_teleports() {
    let mut cam = Camera::new(800.0, 600.0);
    cam.follow(1000.0, 0.0);
    cam.update(1.0 / 60.0);
    assert!(cam.position.x > 0.0 && cam.position.x < 1000.0);
}

#[test]
fn smoothing_is_frame_rate_independent() {
    let mut a = Camera::new(800.0, 600.0);
    let mut b = Camera::new(800.0, 600.0);
    a.follow(100.0, 0.0);
    b.follow(100.0, 0.0);
    a.update(0.1);
    for _ in 0..10 {
        b.update(0.01);
    }
    assert!((a.position.x - b.position.x).abs() < 1e-3);
}

#[test]
fn snap_jumps_exactly() {
    let mut cam = Camera::new(800.0, 600.0);
    cam.follow(12.5, 99.0);
    cam.snap();
    assert_eq!(cam.position, Vec2::new(12.5, 99.0));
}

#[test]
fn adjust_zoom_clamps_and_moves_target() {
    let mut cam = Camera::new(800.0, 600.0);
    cam.adjust_zoom(10.0);
    assert_eq!(cam.zoom, 3.0);
    assert_eq!(cam.target_zoom(), 3.0);
    cam.adjust_zoom(-10.0);
    assert_eq!(cam.zoom, 0.5);
    // Smoother has nothing left to do.
    cam.update(1.0);
    assert_eq!(cam.zoom, 0.5);
}

#[test]
fn world_screen_round_trip() {
    let mut cam = Camera::new(960.0, 540.0);
    cam.follow(300.0, 120.0);
    cam.snap();
    cam.adjust_zoom(0.5);
    let w = Vec2::new(340.0, 90.0);
    let back = cam.screen_to_world(cam.world_to_screen(w));
    assert!((back - w).length() < 1e-3);
}

#[test]
fn focus_maps_to_viewport_centre() {
    let mut cam = Camera::new(960.0, 540.0);
    cam.follow(-50.0, 75.0);
    cam.snap();
    assert_eq!(cam.world_to_screen(Vec2::new(-50.0, 75.0)), Vec2::new(480.0, 270.0));
}

#[test]
fn from_config_uses_configured_bounds() {
    let config = RenderConfig { zoom_min: 1.5, zoom_max: 2.0, ..Default::default() };
    let cam = Camera::from_config(&config);
    assert_eq!(cam.zoom_bounds(), (1.5, 2.0));
    assert_eq!(cam.zoom, 1.5);
}
