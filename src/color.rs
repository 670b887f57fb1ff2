use glam::Vec3;

/// Straight (non-premultiplied) RGBA color, each channel in `0.0..=1.0`.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct Color(pub [f32; 4]);

impl Color {
    pub const WHITE: Self = Self([1.0, 1.0, 1.0, 1.0]);
    pub const BLACK: Self = Self([0.0, 0.0, 0.0, 1.0]);
    pub const TRANSPARENT: Self = Self([0.0, 0.0, 0.0, 0.0]);
    pub const SNOW: Self = Self([0.94, 0.96, 1.0, 1.0]);
    pub const EMBER: Self = Self([1.0, 0.62, 0.18, 1.0]);
    pub const MARKER: Self = Self([1.0, 0.86, 0.25, 1.0]);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self([r, g, b, a])
    }

    pub fn from_rgb(rgb: Vec3, alpha: f32) -> Self {
        Self([rgb.x, rgb.y, rgb.z, alpha])
    }

    pub fn rgb(self) -> Vec3 {
        Vec3::new(self.0[0], self.0[1], self.0[2])
    }

    pub fn alpha(self) -> f32 {
        self.0[3]
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        Self([self.0[0], self.0[1], self.0[2], alpha])
    }

    /// Decode an 8-bit sRGB-encoded pixel as stored in sprite images.
    /// Values are kept in display space; the lighting model works there too.
    pub fn from_rgba8(p: [u8; 4]) -> Self {
        Self([
            p[0] as f32 / 255.0,
            p[1] as f32 / 255.0,
            p[2] as f32 / 255.0,
            p[3] as f32 / 255.0,
        ])
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
        [q(self.0[0]), q(self.0[1]), q(self.0[2]), q(self.0[3])]
    }
}

impl From<[f32; 3]> for Color {
    fn from(rgb: [f32; 3]) -> Self {
        Self([rgb[0], rgb[1], rgb[2], 1.0])
    }
}
