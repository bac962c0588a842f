//! Drawing surfaces the waveform is rendered onto.
//!
//! The waveform code only talks to the [`Canvas`] trait. Two surfaces ship with
//! the crate: [`Bitmap`], an eager RGBA raster target, and [`Recording`], which
//! records draw operations once and replays them cheaply onto another canvas.

pub mod bitmap;
pub mod glyphs;
pub mod recording;

pub use bitmap::Bitmap;
pub use recording::{DrawOp, Recording};

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const TRANSPARENT: Color = Color::argb(0, 0, 0, 0);

    /// Opaque color from red, green and blue components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Color with an explicit alpha channel.
    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Returns the same color with its alpha replaced.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Parses `#RRGGBB` or `#AARRGGBB` hex notation.
    pub fn from_hex(value: &str) -> Option<Self> {
        let digits = value.trim().strip_prefix('#')?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        match digits.len() {
            6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self::argb(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    /// Formats the color as `#AARRGGBB`.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.a, self.r, self.g, self.b)
    }
}

/// Stroke/fill settings for shapes and lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub color: Color,
    /// Line thickness in pixels; zero means a hairline.
    pub stroke_width: f32,
}

impl Paint {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            stroke_width: 0.0,
        }
    }

    pub fn with_stroke_width(self, stroke_width: f32) -> Self {
        Self {
            stroke_width,
            ..self
        }
    }

    pub fn with_alpha(self, alpha: u8) -> Self {
        Self {
            color: self.color.with_alpha(alpha),
            ..self
        }
    }
}

/// Settings for text drawing. Text is horizontally centered on its x position
/// and `y` is the baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextPaint {
    pub color: Color,
    /// Glyph height in pixels.
    pub size: f32,
}

/// A polyline outline, optionally closed back to its first point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    points: Vec<(f32, f32)>,
    closed: bool,
}

impl Path {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            closed: false,
        }
    }

    /// Starts a new outline. Any previous points are discarded.
    pub fn move_to(&mut self, x: f32, y: f32) {
        self.points.clear();
        self.closed = false;
        self.points.push((x, y));
    }

    pub fn line_to(&mut self, x: f32, y: f32) {
        self.points.push((x, y));
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn points(&self) -> &[(f32, f32)] {
        &self.points
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Iterates over the outline's segments, including the closing one.
    pub fn segments(&self) -> impl Iterator<Item = ((f32, f32), (f32, f32))> + '_ {
        let closing = match (self.closed, self.points.first(), self.points.last()) {
            (true, Some(&first), Some(&last)) if self.points.len() > 2 => Some((last, first)),
            _ => None,
        };
        self.points
            .windows(2)
            .map(|pair| (pair[0], pair[1]))
            .chain(closing)
    }
}

/// Which cached representations the host's drawing surface can replay cheaply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceCapabilities {
    /// The surface can replay a recorded list of draw operations.
    pub recording: bool,
}

/// A 2D drawing surface.
pub trait Canvas {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn fill_path(&mut self, path: &Path, paint: &Paint);

    fn stroke_path(&mut self, path: &Path, paint: &Paint);

    fn draw_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, paint: &Paint);

    /// Draws independent segments packed as `x1, y1, x2, y2` quadruples.
    fn draw_lines(&mut self, points: &[f32], paint: &Paint) {
        for segment in points.chunks_exact(4) {
            self.draw_line(segment[0], segment[1], segment[2], segment[3], paint);
        }
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, paint: &TextPaint);

    /// Rendered width of `text` in pixels.
    fn measure_text(&self, text: &str, paint: &TextPaint) -> f32 {
        glyphs::text_width(text, paint.size)
    }

    /// Blits `bitmap` scaled to cover the whole canvas.
    fn draw_bitmap(&mut self, bitmap: &Bitmap);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_colors() {
        assert_eq!(Color::from_hex("#102030"), Some(Color::rgb(0x10, 0x20, 0x30)));
        assert_eq!(
            Color::from_hex("#80102030"),
            Some(Color::argb(0x80, 0x10, 0x20, 0x30))
        );
        assert_eq!(Color::from_hex("102030"), None);
        assert_eq!(Color::from_hex("#1020"), None);
        assert_eq!(Color::from_hex("#zz2030"), None);
        assert_eq!(Color::argb(1, 2, 3, 4).to_hex(), "#01020304");
    }

    #[test]
    fn test_closed_path_segments() {
        let mut path = Path::default();
        path.move_to(0.0, 0.0);
        path.line_to(1.0, 0.0);
        path.line_to(1.0, 1.0);
        assert_eq!(path.segments().count(), 2);
        path.close();
        let segments: Vec<_> = path.segments().collect();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[2], ((1.0, 1.0), (0.0, 0.0)));
    }
}
