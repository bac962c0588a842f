//! Eager RGBA raster surface.

use super::{glyphs, Canvas, Color, Paint, Path, TextPaint};

/// An RGBA8 pixel buffer with source-over blending.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Bitmap {
    /// Creates a fully transparent bitmap.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Raw RGBA bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        let p = &self.pixels[i..i + 4];
        Some(Color::argb(p[3], p[0], p[1], p[2]))
    }

    /// Overwrites every pixel with `color`.
    pub fn clear(&mut self, color: Color) {
        for p in self.pixels.chunks_exact_mut(4) {
            p.copy_from_slice(&[color.r, color.g, color.b, color.a]);
        }
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Blends `color` over the pixel at (x, y); out-of-bounds writes are dropped.
    pub fn blend_pixel(&mut self, x: i64, y: i64, color: Color) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 || color.a == 0 {
            return;
        }
        let i = self.offset(x as u32, y as u32);
        let dst = &mut self.pixels[i..i + 4];
        if color.a == 255 {
            dst.copy_from_slice(&[color.r, color.g, color.b, 255]);
            return;
        }

        let src_a = color.a as u32;
        let dst_a = dst[3] as u32;
        let out_a = src_a * 255 + dst_a * (255 - src_a);
        if out_a == 0 {
            return;
        }
        let mix = |s: u8, d: u8| {
            ((s as u32 * src_a * 255 + d as u32 * dst_a * (255 - src_a)) / out_a) as u8
        };
        dst[0] = mix(color.r, dst[0]);
        dst[1] = mix(color.g, dst[1]);
        dst[2] = mix(color.b, dst[2]);
        dst[3] = (out_a / 255) as u8;
    }

    fn fill_rect(&mut self, x: i64, y: i64, size: u32, color: Color) {
        for dy in 0..size as i64 {
            for dx in 0..size as i64 {
                self.blend_pixel(x + dx, y + dy, color);
            }
        }
    }
}

impl Canvas for Bitmap {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    /// Even-odd scanline fill sampled at pixel centers.
    fn fill_path(&mut self, path: &Path, paint: &Paint) {
        if path.points().len() < 3 {
            return;
        }
        let first = path.points()[0];
        let last = path.points()[path.points().len() - 1];
        // Filling always treats the outline as closed.
        let edges: Vec<_> = path
            .points()
            .windows(2)
            .map(|pair| (pair[0], pair[1]))
            .chain(std::iter::once((last, first)))
            .collect();

        let mut crossings = Vec::new();
        for row in 0..self.height {
            let yc = row as f32 + 0.5;
            crossings.clear();
            for &((x0, y0), (x1, y1)) in &edges {
                if (y0 <= yc) != (y1 <= yc) {
                    crossings.push(x0 + (yc - y0) / (y1 - y0) * (x1 - x0));
                }
            }
            crossings.sort_by(|a, b| a.total_cmp(b));
            for span in crossings.chunks_exact(2) {
                let start = (span[0] - 0.5).ceil().max(0.0) as i64;
                let end = (span[1] - 0.5).floor().min(self.width as f32 - 1.0) as i64;
                for x in start..=end {
                    self.blend_pixel(x, row as i64, paint.color);
                }
            }
        }
    }

    fn stroke_path(&mut self, path: &Path, paint: &Paint) {
        for ((x0, y0), (x1, y1)) in path.segments() {
            self.draw_line(x0, y0, x1, y1, paint);
        }
    }

    fn draw_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, paint: &Paint) {
        let brush = paint.stroke_width.round().max(1.0) as u32;
        let half = (brush / 2) as f32;
        let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as u32;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = x0 + (x1 - x0) * t - half;
            let y = y0 + (y1 - y0) * t - half;
            self.fill_rect(x.floor() as i64, y.floor() as i64, brush, paint.color);
        }
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, paint: &TextPaint) {
        let width = glyphs::text_width(text, paint.size);
        let scale = glyphs::scale_for(paint.size);
        let top = y - (glyphs::GLYPH_HEIGHT * scale) as f32;
        glyphs::layout(text, x - width / 2.0, top, paint.size, |cx, cy, size| {
            self.fill_rect(cx.floor() as i64, cy.floor() as i64, size, paint.color);
        });
    }

    fn draw_bitmap(&mut self, bitmap: &Bitmap) {
        if bitmap.width == 0 || bitmap.height == 0 {
            return;
        }
        for y in 0..self.height {
            let src_y = (y as u64 * bitmap.height as u64 / self.height as u64) as u32;
            for x in 0..self.width {
                let src_x = (x as u64 * bitmap.width as u64 / self.width as u64) as u32;
                if let Some(color) = bitmap.pixel(src_x, src_y) {
                    self.blend_pixel(x as i64, y as i64, color);
                }
            }
        }
    }
}
