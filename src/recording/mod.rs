//! Live recording: audio capture feeding the waveform trail.

pub mod capture;

pub use capture::InputCapture;
