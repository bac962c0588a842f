//! Memoized rendering of the playback waveform.
//!
//! Building the waveform means downsampling the whole buffer, tracing the
//! outline and laying out the time axis. The result is kept in one of two
//! representations, chosen once from the host surface's capabilities: a
//! recorded list of draw operations, or an eagerly rasterized bitmap. Every
//! frame then only replays or blits the cached result.

use std::sync::Arc;

use super::axis::draw_axis;
use super::extrema::extremes;
use super::path::outline;
use super::style::WaveformStyle;
use crate::surface::{Bitmap, Canvas, Recording, SurfaceCapabilities};

/// Storage for one pre-rendered waveform.
pub trait CacheBackend {
    /// Discards the current representation and returns a fresh surface of
    /// the given size to draw the new one on.
    fn begin(&mut self, width: u32, height: u32) -> &mut dyn Canvas;

    /// Draws the cached representation onto `target`. Returns `false` when
    /// nothing is cached.
    fn draw(&self, target: &mut dyn Canvas) -> bool;

    /// Drops the cached representation.
    fn clear(&mut self);
}

/// Keeps the waveform as replayable draw operations.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    recording: Option<Recording>,
}

impl CacheBackend for RecordingBackend {
    fn begin(&mut self, width: u32, height: u32) -> &mut dyn Canvas {
        self.recording.insert(Recording::new(width, height))
    }

    fn draw(&self, target: &mut dyn Canvas) -> bool {
        match &self.recording {
            Some(recording) => {
                recording.replay(target);
                true
            }
            None => false,
        }
    }

    fn clear(&mut self) {
        self.recording = None;
    }
}

/// Keeps the waveform as a rasterized bitmap.
#[derive(Debug, Default)]
pub struct BitmapBackend {
    bitmap: Option<Bitmap>,
}

impl CacheBackend for BitmapBackend {
    fn begin(&mut self, width: u32, height: u32) -> &mut dyn Canvas {
        self.bitmap.insert(Bitmap::new(width, height))
    }

    fn draw(&self, target: &mut dyn Canvas) -> bool {
        match &self.bitmap {
            Some(bitmap) => {
                target.draw_bitmap(bitmap);
                true
            }
            None => false,
        }
    }

    fn clear(&mut self) {
        self.bitmap = None;
    }
}

/// Picks the cache representation the host surface prefers.
pub fn backend_for(capabilities: SurfaceCapabilities) -> Box<dyn CacheBackend> {
    if capabilities.recording {
        Box::new(RecordingBackend::default())
    } else {
        Box::new(BitmapBackend::default())
    }
}

/// Everything besides geometry and samples that goes into a cached waveform.
#[derive(Debug, Clone, Copy)]
pub struct CacheScene<'a> {
    pub style: &'a WaveformStyle,
    pub audio_length_ms: u64,
    pub show_text_axis: bool,
}

struct CacheKey {
    samples: Arc<[i16]>,
    width: u32,
    height: u32,
}

impl CacheKey {
    fn matches(&self, samples: &Arc<[i16]>, width: u32, height: u32) -> bool {
        Arc::ptr_eq(&self.samples, samples) && self.width == width && self.height == height
    }
}

/// The single live pre-rendered waveform.
pub struct RenderCache {
    backend: Box<dyn CacheBackend>,
    key: Option<CacheKey>,
    rebuilds: u64,
}

impl RenderCache {
    pub fn new(capabilities: SurfaceCapabilities) -> Self {
        Self {
            backend: backend_for(capabilities),
            key: None,
            rebuilds: 0,
        }
    }

    /// Drops the cached waveform; the next `ensure` rebuilds it.
    pub fn invalidate(&mut self) {
        self.key = None;
        self.backend.clear();
    }

    pub fn is_built(&self) -> bool {
        self.key.is_some()
    }

    /// How many times the waveform has been rendered into the cache.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    /// Builds the cached waveform unless one already exists for this sample
    /// buffer and size. Zero-sized geometry or a missing/empty buffer is a
    /// no-op. Returns whether a rebuild happened.
    pub fn ensure(
        &mut self,
        width: u32,
        height: u32,
        samples: Option<&Arc<[i16]>>,
        scene: &CacheScene<'_>,
    ) -> bool {
        let Some(samples) = samples.filter(|s| !s.is_empty()) else {
            return false;
        };
        if width == 0 || height == 0 {
            return false;
        }
        if self
            .key
            .as_ref()
            .is_some_and(|key| key.matches(samples, width, height))
        {
            return false;
        }

        let canvas = self.backend.begin(width, height);
        render_waveform(canvas, width, height, samples, scene);

        self.key = Some(CacheKey {
            samples: Arc::clone(samples),
            width,
            height,
        });
        self.rebuilds += 1;
        tracing::debug!(
            "Waveform cache rebuilt: {}x{}, {} samples",
            width,
            height,
            samples.len()
        );
        true
    }

    /// Draws the cached waveform. Returns `false`, drawing nothing, when no
    /// waveform has been built yet.
    pub fn draw(&self, target: &mut dyn Canvas) -> bool {
        self.key.is_some() && self.backend.draw(target)
    }
}

fn render_waveform(
    canvas: &mut dyn Canvas,
    width: u32,
    height: u32,
    samples: &[i16],
    scene: &CacheScene<'_>,
) {
    let extrema = extremes(samples, width as usize);
    let path = outline(&extrema, height as f32 / 2.0);
    canvas.fill_path(&path, &scene.style.fill);
    canvas.stroke_path(&path, &scene.style.stroke);
    if scene.show_text_axis {
        draw_axis(canvas, width, scene.audio_length_ms, &scene.style.timecode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::DrawOp;

    fn samples(len: usize) -> Arc<[i16]> {
        (0..len).map(|i| ((i % 200) as i16 - 100) * 300).collect()
    }

    fn scene(style: &WaveformStyle) -> CacheScene<'_> {
        CacheScene {
            style,
            audio_length_ms: 2000,
            show_text_axis: true,
        }
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let style = WaveformStyle::default();
        let buffer = samples(4000);
        let mut cache = RenderCache::new(SurfaceCapabilities::default());

        assert!(cache.ensure(100, 40, Some(&buffer), &scene(&style)));
        assert!(!cache.ensure(100, 40, Some(&buffer), &scene(&style)));
        assert_eq!(cache.rebuild_count(), 1);
    }

    #[test]
    fn test_changes_trigger_exactly_one_rebuild() {
        let style = WaveformStyle::default();
        let buffer = samples(4000);
        let mut cache = RenderCache::new(SurfaceCapabilities::default());
        cache.ensure(100, 40, Some(&buffer), &scene(&style));

        cache.ensure(120, 40, Some(&buffer), &scene(&style));
        cache.ensure(120, 40, Some(&buffer), &scene(&style));
        assert_eq!(cache.rebuild_count(), 2);

        // Same contents, different buffer.
        let replacement = samples(4000);
        cache.ensure(120, 40, Some(&replacement), &scene(&style));
        cache.ensure(120, 40, Some(&replacement), &scene(&style));
        assert_eq!(cache.rebuild_count(), 3);

        cache.invalidate();
        assert!(!cache.is_built());
        cache.ensure(120, 40, Some(&replacement), &scene(&style));
        assert_eq!(cache.rebuild_count(), 4);
    }

    #[test]
    fn test_invalid_geometry_never_builds() {
        let style = WaveformStyle::default();
        let buffer = samples(100);
        let empty: Arc<[i16]> = Arc::from(Vec::new());
        let mut cache = RenderCache::new(SurfaceCapabilities::default());

        assert!(!cache.ensure(0, 40, Some(&buffer), &scene(&style)));
        assert!(!cache.ensure(100, 0, Some(&buffer), &scene(&style)));
        assert!(!cache.ensure(100, 40, None, &scene(&style)));
        assert!(!cache.ensure(100, 40, Some(&empty), &scene(&style)));
        assert_eq!(cache.rebuild_count(), 0);

        let mut target = Bitmap::new(10, 10);
        assert!(!cache.draw(&mut target));
    }

    #[test]
    fn test_recording_backend_replays_fill_stroke_and_axis() {
        let style = WaveformStyle::default();
        let buffer = samples(4000);
        let mut cache = RenderCache::new(SurfaceCapabilities { recording: true });
        cache.ensure(100, 40, Some(&buffer), &scene(&style));

        let mut target = Recording::new(100, 40);
        assert!(cache.draw(&mut target));
        let ops = target.ops();
        assert!(matches!(ops[0], DrawOp::FillPath(..)));
        assert!(matches!(ops[1], DrawOp::StrokePath(..)));
        let labels = ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Text { .. }))
            .count();
        assert_eq!(labels, 3);
    }

    #[test]
    fn test_bitmap_backend_matches_direct_render() {
        let style = WaveformStyle::default();
        let buffer = samples(4000);
        let mut cache = RenderCache::new(SurfaceCapabilities { recording: false });
        cache.ensure(64, 32, Some(&buffer), &scene(&style));

        let mut blitted = Bitmap::new(64, 32);
        assert!(cache.draw(&mut blitted));

        let mut direct = Bitmap::new(64, 32);
        render_waveform(&mut direct, 64, 32, &buffer, &scene(&style));
        assert_eq!(blitted, direct);
    }
}
