//! The waveform view: a cached playback waveform with a position marker, or
//! a fading live trail while recording.

use std::sync::Arc;

use super::cache::{CacheScene, RenderCache};
use super::style::WaveformStyle;
use super::trail::Trail;
use crate::surface::{Canvas, SurfaceCapabilities};

/// What the view is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Live input; every sample update adds a trail frame.
    Recording,
    /// A whole buffer drawn once into the render cache.
    #[default]
    Playback,
}

/// Length of an interleaved buffer in milliseconds, or `None` when the
/// format is unknown.
pub fn audio_length_ms(sample_count: usize, sample_rate: u32, channels: u16) -> Option<u64> {
    if sample_rate == 0 || channels == 0 {
        return None;
    }
    let frames = sample_count as u64 / channels as u64;
    Some(frames * 1000 / sample_rate as u64)
}

/// A waveform widget that draws onto any [`Canvas`].
pub struct WaveformView {
    mode: Mode,
    style: WaveformStyle,
    show_text_axis: bool,
    width: u32,
    height: u32,
    center_y: f32,
    x_step: f32,
    sample_rate: u32,
    channels: u16,
    audio_length: u64,
    marker_position: Option<u64>,
    samples: Option<Arc<[i16]>>,
    trail: Trail,
    cache: RenderCache,
}

impl WaveformView {
    pub fn new(mode: Mode, style: WaveformStyle, capabilities: SurfaceCapabilities) -> Self {
        Self {
            mode,
            style,
            show_text_axis: true,
            width: 0,
            height: 0,
            center_y: 0.0,
            x_step: 0.0,
            sample_rate: 0,
            channels: 0,
            audio_length: 0,
            marker_position: None,
            samples: None,
            trail: Trail::new(),
            cache: RenderCache::new(capabilities),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switches mode, dropping the trail and the cached waveform.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        self.trail.clear();
        self.cache.invalidate();
        self.marker_position = None;
        if mode == Mode::Playback {
            self.create_playback_waveform();
        }
    }

    pub fn style(&self) -> &WaveformStyle {
        &self.style
    }

    pub fn set_style(&mut self, style: WaveformStyle) {
        self.style = style;
        self.refresh_playback_waveform();
    }

    pub fn show_text_axis(&self) -> bool {
        self.show_text_axis
    }

    pub fn set_show_text_axis(&mut self, show: bool) {
        if self.show_text_axis != show {
            self.show_text_axis = show;
            self.refresh_playback_waveform();
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
        self.update_audio_length();
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn set_channels(&mut self, channels: u16) {
        self.channels = channels;
        self.update_audio_length();
    }

    /// Length of the current buffer in milliseconds.
    pub fn audio_length(&self) -> u64 {
        self.audio_length
    }

    pub fn samples(&self) -> Option<&Arc<[i16]>> {
        self.samples.as_ref()
    }

    /// Replaces the sample buffer.
    ///
    /// While recording this appends a trail frame. During playback it hides
    /// the marker and rebuilds the cached waveform.
    pub fn set_samples(&mut self, samples: Arc<[i16]>) {
        self.samples = Some(samples);
        self.audio_length = self.compute_audio_length();

        match self.mode {
            Mode::Recording => {
                if let Some(samples) = &self.samples {
                    self.trail.push(samples, self.width, self.center_y);
                }
            }
            Mode::Playback => {
                self.marker_position = None;
                self.recompute_x_step();
                self.cache.invalidate();
                self.create_playback_waveform();
            }
        }
    }

    pub fn marker_position(&self) -> Option<u64> {
        self.marker_position
    }

    /// Moves the playback marker, in milliseconds. `None` hides it.
    pub fn set_marker_position(&mut self, position: Option<u64>) {
        self.marker_position = position;
    }

    /// Horizontal position of the marker, if it should be drawn.
    pub fn marker_x(&self) -> Option<f32> {
        self.marker_position
            .filter(|&position| position < self.audio_length)
            .map(|position| position as f32 * self.x_step)
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    /// Adopts new surface geometry. Clears the trail, and during playback
    /// rebuilds the cached waveform for the new size.
    pub fn on_size_changed(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.center_y = height as f32 / 2.0;
        self.recompute_x_step();
        self.trail.clear();

        if self.mode == Mode::Playback {
            self.create_playback_waveform();
        }
    }

    /// Draws the current frame.
    ///
    /// During playback nothing is drawn until a waveform has been cached.
    pub fn on_draw(&self, canvas: &mut dyn Canvas) {
        match self.mode {
            Mode::Recording => self.trail.draw(canvas, &self.style.stroke),
            Mode::Playback => {
                if !self.cache.draw(canvas) {
                    return;
                }
                if let Some(x) = self.marker_x() {
                    canvas.draw_line(x, 0.0, x, self.height as f32, &self.style.marker);
                }
            }
        }
    }

    fn compute_audio_length(&self) -> u64 {
        let count = self.samples.as_ref().map_or(0, |samples| samples.len());
        audio_length_ms(count, self.sample_rate, self.channels).unwrap_or(0)
    }

    fn update_audio_length(&mut self) {
        let length = self.compute_audio_length();
        if length != self.audio_length {
            self.audio_length = length;
            self.recompute_x_step();
            self.refresh_playback_waveform();
        }
    }

    fn recompute_x_step(&mut self) {
        self.x_step = if self.audio_length == 0 {
            0.0
        } else {
            self.width as f32 / self.audio_length as f32
        };
    }

    fn refresh_playback_waveform(&mut self) {
        if self.mode == Mode::Playback && self.cache.is_built() {
            self.cache.invalidate();
            self.create_playback_waveform();
        }
    }

    fn create_playback_waveform(&mut self) {
        let scene = CacheScene {
            style: &self.style,
            audio_length_ms: self.audio_length,
            show_text_axis: self.show_text_axis,
        };
        self.cache
            .ensure(self.width, self.height, self.samples.as_ref(), &scene);
    }
}
