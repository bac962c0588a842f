//! Waveform rendering: per-column extrema, the filled outline, the time axis,
//! the recording trail, the render cache and the view tying them together.

pub mod axis;
pub mod cache;
pub mod extrema;
pub mod path;
pub mod style;
pub mod trail;
pub mod view;

pub use cache::RenderCache;
pub use extrema::{extremes, Extrema};
pub use style::WaveformStyle;
pub use trail::Trail;
pub use view::{audio_length_ms, Mode, WaveformView};
