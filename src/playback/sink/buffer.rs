//! Bounded sample queue shared by a sink's writer and its output clock.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use super::{SinkEventKind, SinkNotifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Stopped,
    Paused,
    Playing,
}

struct Inner {
    queue: VecDeque<i16>,
    capacity: usize,
    channels: u64,
    state: PlayState,
    /// Samples handed to the output since the last rewind.
    consumed: u64,
    period: u64,
    next_period: u64,
    marker: Option<u64>,
    marker_fired: bool,
    notifier: Option<SinkNotifier>,
    released: bool,
}

impl Inner {
    fn head(&self) -> u64 {
        self.consumed / self.channels
    }

    fn room(&self) -> usize {
        self.capacity.saturating_sub(self.queue.len())
    }

    fn rewind(&mut self) {
        self.consumed = 0;
        self.next_period = self.period;
        self.marker_fired = false;
    }

    fn check_notifications(&mut self) {
        let head = self.head();
        let Some(notifier) = &self.notifier else {
            return;
        };

        if self.period > 0 && head >= self.next_period {
            notifier.notify(SinkEventKind::Periodic);
            while self.next_period <= head {
                self.next_period += self.period;
            }
        }

        if let Some(marker) = self.marker {
            if !self.marker_fired && head >= marker {
                self.marker_fired = true;
                notifier.notify(SinkEventKind::MarkerReached);
            }
        }
    }
}

/// Interleaved sample queue with play state, head position and position
/// notification bookkeeping.
///
/// Writers block while the queue is full and the buffer is playing or
/// paused. Stopping or releasing wakes them.
pub struct SinkBuffer {
    inner: Mutex<Inner>,
    space: Condvar,
}

impl SinkBuffer {
    /// Creates a stopped buffer holding at most `capacity` samples.
    pub fn new(capacity: usize, channels: u16) -> Self {
        Self {
            inner: Mutex::new(Inner {
                queue: VecDeque::with_capacity(capacity),
                capacity: capacity.max(1),
                channels: channels.max(1) as u64,
                state: PlayState::Stopped,
                consumed: 0,
                period: 0,
                next_period: 0,
                marker: None,
                marker_fired: false,
                notifier: None,
                released: false,
            }),
            space: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> PlayState {
        self.lock().state
    }

    pub fn queued(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    pub fn is_released(&self) -> bool {
        self.lock().released
    }

    /// Queues `samples`, waiting for room while playing or paused. When
    /// stopped only what fits is queued. Returns the number accepted.
    pub fn write(&self, samples: &[i16]) -> usize {
        let mut inner = self.lock();
        let mut written = 0;

        while written < samples.len() {
            if inner.released {
                break;
            }

            let room = inner.room();
            if room == 0 {
                if inner.state == PlayState::Stopped {
                    break;
                }
                inner = self
                    .space
                    .wait(inner)
                    .unwrap_or_else(PoisonError::into_inner);
                continue;
            }

            let take = room.min(samples.len() - written);
            inner
                .queue
                .extend(samples[written..written + take].iter().copied());
            written += take;
        }

        written
    }

    /// Fills `out` from the queue while playing, converting each sample, and
    /// pads the remainder with `silence`. Returns the number of queued samples
    /// consumed.
    pub fn render<T, F>(&self, out: &mut [T], silence: T, convert: F) -> usize
    where
        T: Copy,
        F: Fn(i16) -> T,
    {
        let mut inner = self.lock();
        if inner.state != PlayState::Playing || inner.released {
            out.fill(silence);
            return 0;
        }

        let take = out.len().min(inner.queue.len());
        for (slot, sample) in out.iter_mut().zip(inner.queue.drain(..take)) {
            *slot = convert(sample);
        }
        out[take..].fill(silence);

        inner.consumed += take as u64;
        inner.check_notifications();
        if take > 0 {
            self.space.notify_all();
        }
        take
    }

    pub fn play(&self) {
        let mut inner = self.lock();
        if !inner.released {
            inner.state = PlayState::Playing;
        }
    }

    pub fn pause(&self) {
        let mut inner = self.lock();
        if inner.state == PlayState::Playing {
            inner.state = PlayState::Paused;
        }
    }

    pub fn stop(&self) {
        self.lock().state = PlayState::Stopped;
        self.space.notify_all();
    }

    pub fn flush(&self) {
        let mut inner = self.lock();
        inner.queue.clear();
        if inner.state != PlayState::Playing {
            inner.rewind();
        }
        self.space.notify_all();
    }

    pub fn release(&self) {
        let mut inner = self.lock();
        inner.released = true;
        inner.state = PlayState::Stopped;
        inner.queue.clear();
        inner.notifier = None;
        self.space.notify_all();
    }

    pub fn head(&self) -> u64 {
        self.lock().head()
    }

    /// Notifies every `frames` frames from the current head; zero disables.
    pub fn set_period(&self, frames: u32) {
        let mut inner = self.lock();
        inner.period = frames as u64;
        inner.next_period = inner.head() + inner.period;
    }

    pub fn set_marker(&self, frame: u64) {
        let mut inner = self.lock();
        inner.marker = Some(frame);
        inner.marker_fired = false;
    }

    pub fn set_notifier(&self, notifier: Option<SinkNotifier>) {
        self.lock().notifier = notifier;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::sink::SinkEvent;
    use crossbeam::channel::{unbounded, Receiver};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn notified(buffer: &SinkBuffer) -> Receiver<SinkEvent> {
        let (tx, rx) = unbounded();
        buffer.set_notifier(Some(SinkNotifier::new(1, tx)));
        rx
    }

    fn kinds(rx: &Receiver<SinkEvent>) -> Vec<SinkEventKind> {
        rx.try_iter().map(|event| event.kind).collect()
    }

    #[test]
    fn test_render_consumes_and_pads() {
        let buffer = SinkBuffer::new(16, 1);
        assert_eq!(buffer.write(&[1, 2, 3]), 3);

        let mut out = [9i16; 5];
        // Stopped output renders silence without consuming.
        assert_eq!(buffer.render(&mut out, 0, |s| s), 0);
        assert_eq!(out, [0; 5]);

        buffer.play();
        assert_eq!(buffer.render(&mut out, 0, |s| s * 10), 3);
        assert_eq!(out, [10, 20, 30, 0, 0]);
        assert_eq!(buffer.head(), 3);
    }

    #[test]
    fn test_head_counts_frames() {
        let buffer = SinkBuffer::new(16, 2);
        buffer.write(&[1; 8]);
        buffer.play();
        let mut out = [0i16; 8];
        buffer.render(&mut out, 0, |s| s);
        assert_eq!(buffer.head(), 4);
    }

    #[test]
    fn test_stopped_write_queues_what_fits() {
        let buffer = SinkBuffer::new(4, 1);
        assert_eq!(buffer.write(&[1; 10]), 4);
        assert_eq!(buffer.queued(), 4);
    }

    #[test]
    fn test_write_blocks_until_rendered() {
        let buffer = Arc::new(SinkBuffer::new(4, 1));
        buffer.play();

        let writer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || buffer.write(&[7; 10]))
        };

        let mut out = [0i16; 4];
        let mut drained = 0;
        while drained < 10 {
            drained += buffer.render(&mut out, 0, |s| s);
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(writer.join().unwrap(), 10);
    }

    #[test]
    fn test_stop_wakes_blocked_writer() {
        let buffer = Arc::new(SinkBuffer::new(4, 1));
        buffer.play();

        let writer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || buffer.write(&[7; 10]))
        };
        thread::sleep(Duration::from_millis(20));
        buffer.stop();
        assert_eq!(writer.join().unwrap(), 4);
    }

    #[test]
    fn test_periodic_and_marker_notifications() {
        let buffer = SinkBuffer::new(100, 1);
        let rx = notified(&buffer);
        buffer.set_period(10);
        buffer.set_marker(25);
        buffer.write(&[1; 30]);
        buffer.play();

        let mut out = [0i16; 5];
        buffer.render(&mut out, 0, |s| s);
        assert!(kinds(&rx).is_empty());

        buffer.render(&mut out, 0, |s| s);
        assert_eq!(kinds(&rx), vec![SinkEventKind::Periodic]);

        // Two boundaries crossed in one render still notify once.
        let mut wide = [0i16; 20];
        buffer.render(&mut wide, 0, |s| s);
        assert_eq!(
            kinds(&rx),
            vec![SinkEventKind::Periodic, SinkEventKind::MarkerReached]
        );

        // The marker fires once.
        buffer.render(&mut wide, 0, |s| s);
        assert!(!kinds(&rx).contains(&SinkEventKind::MarkerReached));
    }

    #[test]
    fn test_flush_rewinds_unless_playing() {
        let buffer = SinkBuffer::new(100, 1);
        buffer.write(&[1; 20]);
        buffer.play();
        let mut out = [0i16; 10];
        buffer.render(&mut out, 0, |s| s);

        buffer.flush();
        assert_eq!(buffer.queued(), 0);
        assert_eq!(buffer.head(), 10);

        buffer.pause();
        buffer.flush();
        assert_eq!(buffer.head(), 0);
    }

    #[test]
    fn test_released_buffer_rejects_writes() {
        let buffer = SinkBuffer::new(100, 1);
        buffer.release();
        buffer.play();
        assert_eq!(buffer.write(&[1; 10]), 0);
        assert_eq!(buffer.state(), PlayState::Stopped);
        assert!(buffer.is_released());
    }
}
