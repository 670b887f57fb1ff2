// ── CPU raster surface ────────────────────────────────────────────────────────
//
// Straight-alpha RGBA f32 framebuffer. Every stage of a frame (ground, fog,
// objects, snow) rasterises into one of these; the lighting pass then rewrites
// it in place and the viewer uploads `to_rgba8()` to the GPU.

use glam::Vec2;
use image::RgbaImage;

use crate::assets::Rect;
use crate::color::Color;

/// Compositing mode for every write into a [`Surface`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Standard source-over alpha blending.
    #[default]
    SourceOver,
    /// `dst.rgb += src.rgb * src.a`, destination alpha untouched.
    Additive,
    /// Erase: `dst.a *= 1 - src.a`. Colour is ignored.
    DestinationOut,
}

/// Per-blit modifiers.
#[derive(Copy, Clone, Debug)]
pub struct BlitOptions {
    pub opacity: f32,
    /// Radians, clockwise on screen, about the destination centre.
    pub rotation: f32,
    pub flip_x: bool,
    pub blend: BlendMode,
    /// Multiplied into every sampled texel.
    pub tint: Color,
}

impl Default for BlitOptions {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            rotation: 0.0,
            flip_x: false,
            blend: BlendMode::SourceOver,
            tint: Color::WHITE,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 4]>,
}

impl Surface {
    /// Fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0.0; 4]; (width as usize) * (height as usize)],
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    pub fn pixels(&self) -> &[[f32; 4]] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [[f32; 4]] {
        &mut self.pixels
    }

    /// Reallocate if the size changed; a new buffer starts transparent.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![[0.0; 4]; (width as usize) * (height as usize)];
    }

    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color.0);
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Color> {
        self.index(x, y).map(|i| Color(self.pixels[i]))
    }

    pub fn put(&mut self, x: i32, y: i32, color: Color) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color.0;
        }
    }

    /// Blend one pixel. Out-of-bounds writes are dropped.
    #[inline]
    pub fn blend(&mut self, x: i32, y: i32, src: Color, mode: BlendMode) {
        if let Some(i) = self.index(x, y) {
            blend_into(&mut self.pixels[i], src.0, mode);
        }
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color, mode: BlendMode) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w).min(self.width as i32);
        let y1 = (y + h).min(self.height as i32);
        for py in y0..y1 {
            for px in x0..x1 {
                let i = py as usize * self.width as usize + px as usize;
                blend_into(&mut self.pixels[i], color.0, mode);
            }
        }
    }

    /// Soft ellipse whose alpha falls off as `(1 - d²)²` from the centre.
    /// Used for blob shadows, glows and fog wisps.
    pub fn fill_radial(&mut self, center: Vec2, rx: f32, ry: f32, color: Color, mode: BlendMode) {
        if rx <= 0.0 || ry <= 0.0 || color.alpha() <= 0.0 {
            return;
        }
        let x0 = ((center.x - rx).floor() as i32).max(0);
        let x1 = ((center.x + rx).ceil() as i32).min(self.width as i32);
        let y0 = ((center.y - ry).floor() as i32).max(0);
        let y1 = ((center.y + ry).ceil() as i32).min(self.height as i32);
        for py in y0..y1 {
            let dy = (py as f32 + 0.5 - center.y) / ry;
            for px in x0..x1 {
                let dx = (px as f32 + 0.5 - center.x) / rx;
                let d2 = dx * dx + dy * dy;
                if d2 >= 1.0 {
                    continue;
                }
                let f = (1.0 - d2) * (1.0 - d2);
                let i = py as usize * self.width as usize + px as usize;
                blend_into(&mut self.pixels[i], color.with_alpha(color.alpha() * f).0, mode);
            }
        }
    }

    /// Solid disc with a one-pixel anti-aliased rim.
    pub fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color, mode: BlendMode) {
        if radius <= 0.0 {
            return;
        }
        let x0 = ((center.x - radius - 1.0).floor() as i32).max(0);
        let x1 = ((center.x + radius + 1.0).ceil() as i32).min(self.width as i32);
        let y0 = ((center.y - radius - 1.0).floor() as i32).max(0);
        let y1 = ((center.y + radius + 1.0).ceil() as i32).min(self.height as i32);
        for py in y0..y1 {
            for px in x0..x1 {
                let d = Vec2::new(px as f32 + 0.5, py as f32 + 0.5).distance(center);
                let cover = (radius + 0.5 - d).clamp(0.0, 1.0);
                if cover <= 0.0 {
                    continue;
                }
                let i = py as usize * self.width as usize + px as usize;
                blend_into(&mut self.pixels[i], color.with_alpha(color.alpha() * cover).0, mode);
            }
        }
    }

    /// Draw the `src` region of `image` into the destination rectangle
    /// `pos .. pos + size` (screen pixels), nearest-neighbour sampled.
    pub fn blit(&mut self, image: &RgbaImage, src: Rect, pos: Vec2, size: Vec2, opts: &BlitOptions) {
        if src.w == 0 || src.h == 0 || size.x <= 0.0 || size.y <= 0.0 || opts.opacity <= 0.0 {
            return;
        }
        if src.x + src.w > image.width() || src.y + src.h > image.height() {
            return;
        }

        let center = pos + size * 0.5;
        let (sin, cos) = opts.rotation.sin_cos();
        let half = size * 0.5;
        let extent = if opts.rotation == 0.0 {
            half
        } else {
            Vec2::new(
                half.x * cos.abs() + half.y * sin.abs(),
                half.x * sin.abs() + half.y * cos.abs(),
            )
        };

        let x0 = ((center.x - extent.x).floor() as i32).max(0);
        let x1 = ((center.x + extent.x).ceil() as i32).min(self.width as i32);
        let y0 = ((center.y - extent.y).floor() as i32).max(0);
        let y1 = ((center.y + extent.y).ceil() as i32).min(self.height as i32);

        let tint = opts.tint.0;
        for py in y0..y1 {
            for px in x0..x1 {
                let d = Vec2::new(px as f32 + 0.5, py as f32 + 0.5) - center;
                // Inverse-rotate into the sprite's local frame.
                let local = Vec2::new(d.x * cos + d.y * sin, -d.x * sin + d.y * cos) + half;
                if local.x < 0.0 || local.y < 0.0 || local.x >= size.x || local.y >= size.y {
                    continue;
                }
                let mut u = local.x / size.x;
                if opts.flip_x {
                    u = 1.0 - u;
                }
                let v = local.y / size.y;
                let sx = src.x + ((u * src.w as f32) as u32).min(src.w - 1);
                let sy = src.y + ((v * src.h as f32) as u32).min(src.h - 1);
                let texel = image.get_pixel(sx, sy).0;
                if texel[3] == 0 {
                    continue;
                }
                let c = Color::from_rgba8(texel).0;
                let out = [
                    c[0] * tint[0],
                    c[1] * tint[1],
                    c[2] * tint[2],
                    c[3] * tint[3] * opts.opacity,
                ];
                let i = py as usize * self.width as usize + px as usize;
                blend_into(&mut self.pixels[i], out, opts.blend);
            }
        }
    }

    /// Composite another surface of the same size on top of this one.
    pub fn composite(&mut self, top: &Surface, mode: BlendMode) {
        if top.width != self.width || top.height != self.height {
            return;
        }
        for (dst, src) in self.pixels.iter_mut().zip(top.pixels.iter()) {
            if src[3] > 0.0 {
                blend_into(dst, *src, mode);
            }
        }
    }

    pub fn to_rgba8(&self) -> RgbaImage {
        let mut img = RgbaImage::new(self.width, self.height);
        for (dst, src) in img.pixels_mut().zip(self.pixels.iter()) {
            dst.0 = Color(*src).to_rgba8();
        }
        img
    }
}

#[inline]
pub(crate) fn blend_into(dst: &mut [f32; 4], src: [f32; 4], mode: BlendMode) {
    let a = src[3].clamp(0.0, 1.0);
    match mode {
        BlendMode::SourceOver => {
            let out_a = a + dst[3] * (1.0 - a);
            if out_a <= 0.0 {
                *dst = [0.0; 4];
                return;
            }
            for c in 0..3 {
                dst[c] = (src[c] * a + dst[c] * dst[3] * (1.0 - a)) / out_a;
            }
            dst[3] = out_a;
        }
        BlendMode::Additive => {
            for c in 0..3 {
                dst[c] = (dst[c] + src[c] * a).min(1.0);
            }
        }
        BlendMode::DestinationOut => {
            dst[3] *= 1.0 - a;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_over_opaque_replaces() {
        let mut p = [0.2, 0.2, 0.2, 1.0];
        blend_into(&mut p, [1.0, 0.0, 0.0, 1.0], BlendMode::SourceOver);
        assert_eq!(p, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn source_over_half_alpha_mixes() {
        let mut p = [0.0, 0.0, 0.0, 1.0];
        blend_into(&mut p, [1.0, 1.0, 1.0, 0.5], BlendMode::SourceOver);
        assert!((p[0] - 0.5).abs() < 1e-6);
        assert!((p[3] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn additive_saturates() {
        let mut p = [0.8, 0.0, 0.0, 1.0];
        blend_into(&mut p, [1.0, 0.5, 0.0, 1.0], BlendMode::Additive);
        assert_eq!(p, [1.0, 0.5, 0.0, 1.0]);
    }

    #[test]
    fn destination_out_erases_alpha_only() {
        let mut p = [0.3, 0.4, 0.5, 1.0];
        blend_into(&mut p, [0.0, 0.0, 0.0, 1.0], BlendMode::DestinationOut);
        assert_eq!(p[3], 0.0);
        assert_eq!(p[0], 0.3);
    }
}
