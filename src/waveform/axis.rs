//! Time axis labels drawn along the top of the cached waveform.

use crate::surface::{Canvas, TextPaint};

/// Widest label expected in practice; used to size label spacing.
const SAMPLE_LABEL: &str = "10.00";

/// A positioned time label.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisLabel {
    pub text: String,
    pub x: f32,
}

/// Seconds between consecutive labels so that labels of `glyph_width` pixels
/// roughly do not overlap across `width` pixels. Never less than one.
pub fn label_step(glyph_width: f32, total_seconds: u64, width: u32) -> u64 {
    if width == 0 {
        return 1;
    }
    let step = (glyph_width * total_seconds as f32 * 2.0 / width as f32).floor();
    (step as u64).max(1)
}

/// Computes one label per step from 0 to the whole-second length of the audio.
pub fn labels(width: u32, audio_length_ms: u64, glyph_width: f32) -> Vec<AxisLabel> {
    if width == 0 || audio_length_ms == 0 {
        return Vec::new();
    }
    let seconds = audio_length_ms / 1000;
    let x_step = width as f32 / (audio_length_ms as f32 / 1000.0);
    let step = label_step(glyph_width, seconds, width);

    (0..=seconds)
        .step_by(step as usize)
        .map(|second| AxisLabel {
            text: format!("{:.2}", second as f32),
            x: second as f32 * x_step,
        })
        .collect()
}

/// Draws the time axis labels onto `canvas`.
pub fn draw_axis(canvas: &mut dyn Canvas, width: u32, audio_length_ms: u64, paint: &TextPaint) {
    let glyph_width = canvas.measure_text(SAMPLE_LABEL, paint);
    for label in labels(width, audio_length_ms, glyph_width) {
        canvas.draw_text(&label.text, label.x, paint.size, paint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_formula() {
        // 20px labels, 60s over 600px: floor(20 * 60 * 2 / 600) = 4
        assert_eq!(label_step(20.0, 60, 600), 4);
        assert_eq!(label_step(20.0, 5, 600), 1);
        assert_eq!(label_step(20.0, 0, 600), 1);
        assert_eq!(label_step(20.0, 60, 0), 1);
    }

    #[test]
    fn test_labels_are_evenly_placed() {
        let labels = labels(600, 10_000, 19.0);
        assert_eq!(labels.len(), 11);
        assert_eq!(labels[0].text, "0.00");
        assert_eq!(labels[3].text, "3.00");
        assert_eq!(labels[3].x, 180.0);
        assert_eq!(labels[10].x, 600.0);
    }

    #[test]
    fn test_step_skips_labels_when_crowded() {
        // floor(19 * 60 * 2 / 300) = 7 -> 0, 7, 14, ... 56
        let labels = labels(300, 60_000, 19.0);
        let texts: Vec<&str> = labels.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts.first(), Some(&"0.00"));
        assert_eq!(texts.get(1), Some(&"7.00"));
        assert_eq!(labels.len(), 9);
    }

    #[test]
    fn test_guards() {
        assert!(labels(0, 10_000, 19.0).is_empty());
        assert!(labels(600, 0, 19.0).is_empty());
        // Under one second still gets the origin label.
        assert_eq!(labels(600, 500, 19.0).len(), 1);
    }
}
