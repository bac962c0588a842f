//! Paints used by the waveform view.

use crate::surface::{Color, Paint, TextPaint};

/// The colors and sizes the waveform view draws with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveformStyle {
    /// Outline of the playback waveform and the recording trail lines.
    pub stroke: Paint,
    /// Interior of the playback waveform.
    pub fill: Paint,
    /// Playback position line.
    pub marker: Paint,
    /// Time axis labels.
    pub timecode: TextPaint,
}

impl Default for WaveformStyle {
    fn default() -> Self {
        Self {
            stroke: Paint::new(Color::rgb(206, 224, 220)).with_stroke_width(1.0),
            fill: Paint::new(Color::argb(0x80, 185, 207, 212)),
            marker: Paint::new(Color::rgb(224, 64, 64)),
            timecode: TextPaint {
                color: Color::rgb(185, 207, 212),
                size: 5.0,
            },
        }
    }
}
