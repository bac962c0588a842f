//! Audio output sinks.
//!
//! A sink accepts interleaved 16-bit PCM through a blocking `write`, plays it
//! out at the sample rate it was opened with and reports its progress through
//! position notifications sent to a [`SinkNotifier`].
//!
//! Two implementations share the [`SinkBuffer`] core:
//! - [`CpalSink`] plays through an output device
//! - [`ClockSink`] drains the buffer on a software clock, used for dry runs

pub mod buffer;
pub mod clock;
pub mod device;

pub use buffer::SinkBuffer;
pub use clock::ClockSink;
pub use device::CpalSink;

use crossbeam::channel::Sender;
use thiserror::Error;

/// Sample rate and channel layout of a sink. Samples are always 16-bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl SinkFormat {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.sample_rate > 0 && self.channels > 0
    }

    /// Number of whole frames in `samples` interleaved samples.
    pub fn frames(&self, samples: usize) -> u64 {
        if self.channels == 0 {
            return 0;
        }
        samples as u64 / self.channels as u64
    }

    /// Number of interleaved samples in one second of audio.
    pub fn samples_per_second(&self) -> usize {
        self.sample_rate as usize * self.channels as usize
    }
}

/// Whether a sink finished initializing and can be played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkState {
    Uninitialized,
    Initialized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkEventKind {
    /// The playback head crossed a notification period boundary.
    Periodic,
    /// The playback head reached the notification marker.
    MarkerReached,
}

/// A position notification, tagged with the session that registered the
/// notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkEvent {
    pub session: u64,
    pub kind: SinkEventKind,
}

/// Delivers position notifications to whoever registered for them.
#[derive(Debug, Clone)]
pub struct SinkNotifier {
    session: u64,
    tx: Sender<SinkEvent>,
}

impl SinkNotifier {
    pub fn new(session: u64, tx: Sender<SinkEvent>) -> Self {
        Self { session, tx }
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn notify(&self, kind: SinkEventKind) {
        if self
            .tx
            .send(SinkEvent {
                session: self.session,
                kind,
            })
            .is_err()
        {
            tracing::trace!("Dropped {:?} notification, receiver is gone", kind);
        }
    }
}

/// A streaming PCM output.
///
/// All methods take `&self`; a sink is shared between the thread that
/// controls playback and the thread that writes samples.
pub trait AudioSink: Send + Sync {
    fn format(&self) -> SinkFormat;

    fn state(&self) -> SinkState;

    /// Preferred write size in samples, if the sink has one.
    fn min_buffer_size(&self) -> Option<usize>;

    /// Queues `samples` for output, blocking while the sink is full and
    /// playing or paused. Returns how many samples were accepted.
    fn write(&self, samples: &[i16]) -> usize;

    fn play(&self);

    fn pause(&self);

    /// Stops output and wakes any blocked writer.
    fn stop(&self);

    /// Drops queued audio. Unless playing, also rewinds the head.
    fn flush(&self);

    /// Frees the output. The sink reports [`SinkState::Uninitialized`]
    /// afterwards.
    fn release(&self);

    /// Frames played since the last rewind.
    fn playback_head_position(&self) -> u64;

    fn set_position_notification_period(&self, frames: u32);

    fn set_notification_marker_position(&self, frame: u64);

    fn set_notifier(&self, notifier: Option<SinkNotifier>);
}

/// Errors raised while opening audio devices.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Invalid sink format: {sample_rate}Hz, {channels} channels")]
    InvalidFormat { sample_rate: u32, channels: u16 },

    #[error("No default audio {0} device available")]
    NoDefaultDevice(&'static str),

    #[error("Audio device '{0}' not found. Use 'waveplay list-devices' to see available devices.")]
    DeviceNotFound(String),

    #[error("Device index {index} is out of range (0-{max})")]
    DeviceIndexOutOfRange { index: usize, max: usize },

    #[error("Failed to enumerate audio devices: {0}")]
    Devices(String),

    #[error("Failed to get device config: {0}")]
    Config(String),

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to build audio stream: {0}")]
    StreamBuild(String),

    #[error("Failed to start audio stream: {0}")]
    StreamPlay(String),

    #[error("Failed to spawn audio thread: {0}")]
    Thread(#[from] std::io::Error),

    #[error("Audio thread exited before the stream was ready")]
    ThreadExited,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_frames() {
        let stereo = SinkFormat::new(44_100, 2);
        assert_eq!(stereo.frames(88_200), 44_100);
        assert_eq!(stereo.frames(3), 1);
        assert_eq!(stereo.samples_per_second(), 88_200);
        assert_eq!(SinkFormat::new(44_100, 0).frames(100), 0);
        assert!(!SinkFormat::new(0, 2).is_valid());
    }

    #[test]
    fn test_notifier_tags_session() {
        let (tx, rx) = crossbeam::channel::unbounded();
        let notifier = SinkNotifier::new(7, tx);
        notifier.notify(SinkEventKind::MarkerReached);
        assert_eq!(
            rx.try_recv().ok(),
            Some(SinkEvent {
                session: 7,
                kind: SinkEventKind::MarkerReached
            })
        );

        drop(rx);
        // A vanished receiver is not an error.
        notifier.notify(SinkEventKind::Periodic);
    }
}
