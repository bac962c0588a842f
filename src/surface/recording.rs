//! Record-once, replay-cheaply vector surface.

use super::{Bitmap, Canvas, Paint, Path, TextPaint};

/// One recorded drawing primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    FillPath(Path, Paint),
    StrokePath(Path, Paint),
    Line {
        from: (f32, f32),
        to: (f32, f32),
        paint: Paint,
    },
    Lines(Vec<f32>, Paint),
    Text {
        text: String,
        x: f32,
        y: f32,
        paint: TextPaint,
    },
    Bitmap(Bitmap),
}

/// A canvas that stores draw operations instead of executing them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recording {
    width: u32,
    height: u32,
    ops: Vec<DrawOp>,
}

impl Recording {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Re-issues every recorded operation, in order, on `target`.
    pub fn replay(&self, target: &mut dyn Canvas) {
        for op in &self.ops {
            match op {
                DrawOp::FillPath(path, paint) => target.fill_path(path, paint),
                DrawOp::StrokePath(path, paint) => target.stroke_path(path, paint),
                DrawOp::Line { from, to, paint } => {
                    target.draw_line(from.0, from.1, to.0, to.1, paint)
                }
                DrawOp::Lines(points, paint) => target.draw_lines(points, paint),
                DrawOp::Text { text, x, y, paint } => target.draw_text(text, *x, *y, paint),
                DrawOp::Bitmap(bitmap) => target.draw_bitmap(bitmap),
            }
        }
    }
}

impl Canvas for Recording {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn fill_path(&mut self, path: &Path, paint: &Paint) {
        self.ops.push(DrawOp::FillPath(path.clone(), *paint));
    }

    fn stroke_path(&mut self, path: &Path, paint: &Paint) {
        self.ops.push(DrawOp::StrokePath(path.clone(), *paint));
    }

    fn draw_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, paint: &Paint) {
        self.ops.push(DrawOp::Line {
            from: (x0, y0),
            to: (x1, y1),
            paint: *paint,
        });
    }

    fn draw_lines(&mut self, points: &[f32], paint: &Paint) {
        self.ops.push(DrawOp::Lines(points.to_vec(), *paint));
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, paint: &TextPaint) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            x,
            y,
            paint: *paint,
        });
    }

    fn draw_bitmap(&mut self, bitmap: &Bitmap) {
        self.ops.push(DrawOp::Bitmap(bitmap.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Color;

    #[test]
    fn test_replay_matches_direct_drawing() {
        let paint = Paint::new(Color::rgb(0, 200, 0)).with_stroke_width(2.0);
        let text = TextPaint {
            color: Color::rgb(255, 255, 255),
            size: 5.0,
        };

        let mut direct = Bitmap::new(16, 16);
        direct.draw_line(0.0, 8.0, 15.0, 8.0, &paint);
        direct.draw_text("1.00", 8.0, 6.0, &text);

        let mut recording = Recording::new(16, 16);
        recording.draw_line(0.0, 8.0, 15.0, 8.0, &paint);
        recording.draw_text("1.00", 8.0, 6.0, &text);
        assert_eq!(recording.ops().len(), 2);

        let mut replayed = Bitmap::new(16, 16);
        recording.replay(&mut replayed);
        assert_eq!(replayed, direct);
    }
}
