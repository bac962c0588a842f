//! Waveform rendering and synchronized PCM playback.
//!
//! - [`waveform`]: extrema downsampling, outline paths, the render cache,
//!   the recording trail and the [`waveform::WaveformView`] tying them together
//! - [`playback`]: the streaming [`playback::PlaybackEngine`] and its audio sinks
//! - [`surface`]: the drawing surface abstraction with raster and recording canvases
//! - [`config`]: the TOML configuration file
//! - [`host`]: audio device lookup

pub mod config;
pub mod host;
pub mod playback;
pub mod surface;
pub mod waveform;
