//! Audio playback: the streaming engine and the sinks it writes to.

pub mod engine;
pub mod sink;

pub use engine::{PlaybackEngine, PlaybackListener, DEFAULT_NOTIFICATIONS_PER_SECOND};
pub use sink::{AudioSink, ClockSink, CpalSink, SinkError, SinkFormat, SinkState};
