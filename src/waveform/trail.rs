//! Fading multi-frame trail for the live recording waveform.

use std::collections::VecDeque;

use super::path::amplitude_to_y;
use crate::surface::{Canvas, Paint};

/// Number of frames kept in the trail.
pub const HISTORY_SIZE: usize = 6;

/// Alpha increment between consecutive trail frames, oldest first.
pub const ALPHA_STEP: u8 = (255 / (HISTORY_SIZE + 1)) as u8;

/// Line segments for one frame, packed as `x1, y1, x2, y2`.
#[derive(Debug, Clone)]
pub struct TrailFrame {
    points: Vec<f32>,
    segments: usize,
}

impl TrailFrame {
    /// The backing array; always `width * 4` long for the width it was built at.
    pub fn points(&self) -> &[f32] {
        &self.points
    }

    /// The populated segments.
    pub fn segments(&self) -> &[f32] {
        &self.points[..self.segments * 4]
    }
}

/// Bounded history of the most recent recording frames.
#[derive(Debug, Default)]
pub struct Trail {
    frames: VecDeque<TrailFrame>,
}

impl Trail {
    pub fn new() -> Self {
        Self {
            frames: VecDeque::with_capacity(HISTORY_SIZE),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames from oldest to newest.
    pub fn frames(&self) -> impl Iterator<Item = &TrailFrame> {
        self.frames.iter()
    }

    /// Drops every frame.
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Appends a frame sampled from `samples` at one sample per pixel column.
    ///
    /// Once the trail is full the oldest frame's array is reused for the new
    /// frame. Nothing is appended for an empty buffer or zero width.
    pub fn push(&mut self, samples: &[i16], width: u32, center_y: f32) {
        if samples.is_empty() || width == 0 {
            return;
        }

        let mut points = if self.frames.len() == HISTORY_SIZE {
            self.frames
                .pop_front()
                .map(|frame| frame.points)
                .unwrap_or_default()
        } else {
            Vec::new()
        };
        points.resize(width as usize * 4, 0.0);

        let segments = trace(samples, width, center_y, &mut points);
        self.frames.push_back(TrailFrame { points, segments });
    }

    /// Draws every frame oldest to newest with increasing opacity.
    pub fn draw(&self, canvas: &mut dyn Canvas, paint: &Paint) {
        let mut alpha = ALPHA_STEP;
        for frame in &self.frames {
            canvas.draw_lines(frame.segments(), &paint.with_alpha(alpha));
            alpha = alpha.saturating_add(ALPHA_STEP);
        }
    }
}

/// Writes segments joining the sample picked for each column to its
/// predecessor. Returns the number of segments written.
fn trace(samples: &[i16], width: u32, center_y: f32, points: &mut [f32]) -> usize {
    let len = samples.len() as u64;
    let mut last: Option<(f32, f32)> = None;
    let mut index = 0;

    for x in 0..width {
        let sample = samples[(x as u64 * len / width as u64) as usize];
        let y = amplitude_to_y(sample, center_y);
        if let Some((last_x, last_y)) = last {
            points[index..index + 4].copy_from_slice(&[last_x, last_y, x as f32, y]);
            index += 4;
        }
        last = Some((x as f32, y));
    }
    index / 4
}
