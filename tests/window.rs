use isoglow::viewer::{Viewport, WindowConfig, WindowMode, letterbox_viewport, physical_to_frame};

#[test]
fn default_is_windowed_960x540() {
    let c = WindowConfig::default();
    assert_eq!((c.physical_width, c.physical_height), (960, 540));
    assert_eq!((c.logical_width, c.logical_height), (960, 540));
    assert_eq!(c.mode, WindowMode::Windowed);
}

#[test]
fn matching_aspect_fills_the_window() {
    let vp = letterbox_viewport(&WindowConfig::new(1920, 1080, 960, 540));
    assert_eq!(vp, Viewport { x: 0.0, y: 0.0, width: 1920.0, height: 1080.0 });
}

#[test]
fn wider_window_gets_pillarbox() {
    let vp = letterbox_viewport(&WindowConfig::new(2000, 540, 960, 540));
    assert_eq!(vp.height, 540.0);
    assert_eq!(vp.width, 960.0);
    assert_eq!(vp.x, 520.0);
    assert_eq!(vp.y, 0.0);
}

#[test]
fn taller_window_gets_letterbox() {
    let vp = letterbox_viewport(&WindowConfig::new(960, 1000, 960, 540));
    assert_eq!(vp.width, 960.0);
    assert_eq!(vp.y, 230.0);
}

#[test]
fn zero_logical_size_gives_empty_viewport() {
    let vp = letterbox_viewport(&WindowConfig::new(800, 600, 0, 540));
    assert_eq!((vp.width, vp.height), (0.0, 0.0));
    assert_eq!(WindowConfig::new(800, 600, 10, 0).aspect_ratio(), 0.0);
}

#[test]
fn cursor_maps_into_frame_or_bars() {
    let c = WindowConfig::new(2000, 540, 960, 540);
    assert_eq!(physical_to_frame(&c, 520.0 + 480.0, 270.0), Some((480.0, 270.0)));
    assert_eq!(physical_to_frame(&c, 100.0, 270.0), None);
}
