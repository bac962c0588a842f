//! A sink that plays into nowhere at a configurable speed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::buffer::SinkBuffer;
use super::{AudioSink, SinkFormat, SinkNotifier, SinkState};

const TICK: Duration = Duration::from_millis(5);

/// Drains its buffer from a timer thread at `speed` times real time.
///
/// Behaves like a device sink without needing audio hardware, which makes
/// it the sink for dry runs and tests.
pub struct ClockSink {
    format: SinkFormat,
    buffer: Arc<SinkBuffer>,
    min_buffer: usize,
    running: Arc<AtomicBool>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl ClockSink {
    /// Starts the clock. An invalid format yields an uninitialized sink.
    pub fn new(format: SinkFormat, speed: f64) -> Self {
        let min_buffer = (format.sample_rate as usize / 10).max(1) * format.channels as usize;
        let buffer = Arc::new(SinkBuffer::new(min_buffer * 2, format.channels));
        let running = Arc::new(AtomicBool::new(false));

        let mut sink = Self {
            format,
            buffer,
            min_buffer,
            running,
            thread: Mutex::new(None),
        };

        if !format.is_valid() {
            tracing::warn!(
                "Clock sink not initialized: {}Hz, {} channels",
                format.sample_rate,
                format.channels
            );
            return sink;
        }

        sink.running.store(true, Ordering::Release);
        let buffer = Arc::clone(&sink.buffer);
        let running = Arc::clone(&sink.running);
        let spawned = thread::Builder::new()
            .name("waveplay-clock".to_string())
            .spawn(move || run_clock(&buffer, &running, format, speed));

        match spawned {
            Ok(handle) => {
                sink.thread = Mutex::new(Some(handle));
                tracing::debug!("Clock sink started at {}x", speed);
            }
            Err(e) => {
                sink.running.store(false, Ordering::Release);
                tracing::warn!("Failed to start clock sink: {}", e);
            }
        }
        sink
    }
}

fn run_clock(buffer: &SinkBuffer, running: &AtomicBool, format: SinkFormat, speed: f64) {
    let channels = format.channels as usize;
    let frames_per_second = format.sample_rate as f64 * speed.max(0.0);
    let mut scratch = Vec::new();
    let mut carry = 0.0;
    let mut last = Instant::now();

    while running.load(Ordering::Acquire) {
        thread::sleep(TICK);
        let now = Instant::now();
        let due = now.duration_since(last).as_secs_f64() * frames_per_second + carry;
        last = now;

        let frames = due.floor();
        carry = due - frames;
        scratch.resize(frames as usize * channels, 0i16);
        buffer.render(&mut scratch, 0, |sample| sample);
    }
}

impl AudioSink for ClockSink {
    fn format(&self) -> SinkFormat {
        self.format
    }

    fn state(&self) -> SinkState {
        if self.running.load(Ordering::Acquire) && !self.buffer.is_released() {
            SinkState::Initialized
        } else {
            SinkState::Uninitialized
        }
    }

    fn min_buffer_size(&self) -> Option<usize> {
        Some(self.min_buffer)
    }

    fn write(&self, samples: &[i16]) -> usize {
        self.buffer.write(samples)
    }

    fn play(&self) {
        self.buffer.play();
    }

    fn pause(&self) {
        self.buffer.pause();
    }

    fn stop(&self) {
        self.buffer.stop();
    }

    fn flush(&self) {
        self.buffer.flush();
    }

    fn release(&self) {
        self.buffer.release();
        self.running.store(false, Ordering::Release);
        let handle = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::warn!("Clock sink thread panicked");
            }
        }
    }

    fn playback_head_position(&self) -> u64 {
        self.buffer.head()
    }

    fn set_position_notification_period(&self, frames: u32) {
        self.buffer.set_period(frames);
    }

    fn set_notification_marker_position(&self, frame: u64) {
        self.buffer.set_marker(frame);
    }

    fn set_notifier(&self, notifier: Option<SinkNotifier>) {
        self.buffer.set_notifier(notifier);
    }
}

impl Drop for ClockSink {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_format_is_uninitialized() {
        let sink = ClockSink::new(SinkFormat::new(0, 1), 1.0);
        assert_eq!(sink.state(), SinkState::Uninitialized);
        let sink = ClockSink::new(SinkFormat::new(8000, 0), 1.0);
        assert_eq!(sink.state(), SinkState::Uninitialized);
    }

    #[test]
    fn test_buffer_sizes_follow_format() {
        let sink = ClockSink::new(SinkFormat::new(44_100, 2), 1.0);
        assert_eq!(sink.state(), SinkState::Initialized);
        assert_eq!(sink.min_buffer_size(), Some(8820));
        assert_eq!(sink.buffer.capacity(), 17_640);
    }

    #[test]
    fn test_clock_drains_while_playing() {
        let sink = ClockSink::new(SinkFormat::new(8000, 1), 4.0);
        sink.write(&[1; 800]);
        sink.play();

        let deadline = Instant::now() + Duration::from_secs(5);
        while sink.playback_head_position() < 800 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(sink.playback_head_position(), 800);
    }

    #[test]
    fn test_release_uninitializes() {
        let sink = ClockSink::new(SinkFormat::new(8000, 1), 1.0);
        sink.release();
        assert_eq!(sink.state(), SinkState::Uninitialized);
        assert_eq!(sink.write(&[1; 10]), 0);
    }
}
