//! Streams a sample buffer to an audio sink on its own thread.
//!
//! The engine is driven from a single control thread (the UI loop). Each
//! `start()` opens a playback session: the sink is armed with a position
//! notification period and an end-of-stream marker, and a streaming thread
//! writes the buffer to the sink in fixed-size chunks. Notifications arrive
//! on a channel tagged with the session id and are delivered to a
//! [`PlaybackListener`] by [`PlaybackEngine::dispatch_events`]; events from a
//! session that has since been stopped are discarded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{unbounded, Receiver, Sender};

use super::sink::{AudioSink, SinkEvent, SinkEventKind, SinkFormat, SinkNotifier, SinkState};

/// Default number of progress notifications per second.
pub const DEFAULT_NOTIFICATIONS_PER_SECOND: u32 = 30;

/// Receives playback progress on the control thread.
pub trait PlaybackListener {
    /// Current position in milliseconds.
    fn on_progress(&mut self, millis: u64);

    /// The whole buffer has played. Playback is already stopped.
    fn on_completion(&mut self);
}

struct Session {
    id: u64,
    should_continue: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

/// Plays one sample buffer through one sink.
pub struct PlaybackEngine {
    samples: Arc<[i16]>,
    format: SinkFormat,
    sink: Arc<dyn AudioSink>,
    chunk_len: usize,
    notifications_per_second: u32,
    session: Option<Session>,
    retired: Option<JoinHandle<()>>,
    next_session: u64,
    events_tx: Sender<SinkEvent>,
    events_rx: Receiver<SinkEvent>,
}

impl PlaybackEngine {
    /// Creates an idle engine for `samples`, interleaved in the sink's format.
    ///
    /// Chunks default to the sink's minimum buffer size, or one second of
    /// audio when the sink has none.
    pub fn new(samples: Arc<[i16]>, sink: Arc<dyn AudioSink>) -> Self {
        let format = sink.format();
        let chunk_len = sink
            .min_buffer_size()
            .filter(|&size| size > 0)
            .unwrap_or_else(|| format.samples_per_second().max(1));
        let (events_tx, events_rx) = unbounded();

        Self {
            samples,
            format,
            sink,
            chunk_len,
            notifications_per_second: DEFAULT_NOTIFICATIONS_PER_SECOND,
            session: None,
            retired: None,
            next_session: 0,
            events_tx,
            events_rx,
        }
    }

    /// Overrides the write chunk size, in samples.
    pub fn with_chunk_size(mut self, chunk_size: Option<usize>) -> Self {
        if let Some(size) = chunk_size.filter(|&size| size > 0) {
            self.chunk_len = size;
        }
        self
    }

    pub fn with_notifications_per_second(mut self, per_second: u32) -> Self {
        self.notifications_per_second = per_second.max(1);
        self
    }

    pub fn samples(&self) -> &Arc<[i16]> {
        &self.samples
    }

    pub fn format(&self) -> SinkFormat {
        self.format
    }

    pub fn chunk_len(&self) -> usize {
        self.chunk_len
    }

    /// Whether the sink initialized. An engine whose sink is not ready never
    /// starts.
    pub fn is_ready(&self) -> bool {
        self.sink.state() == SinkState::Initialized
    }

    pub fn is_playing(&self) -> bool {
        self.session.is_some()
    }

    /// Starts a play-through from the beginning.
    ///
    /// Does nothing while already playing or when the sink is not ready.
    pub fn start(&mut self) {
        if self.session.is_some() {
            tracing::debug!("Playback already running");
            return;
        }
        if !self.is_ready() {
            tracing::warn!("Audio sink not initialized, cannot start playback");
            return;
        }

        // A superseded streaming thread must not write into the new session.
        if let Some(handle) = self.retired.take() {
            if handle.join().is_err() {
                tracing::warn!("Previous streaming thread panicked");
            }
        }

        self.sink.flush();

        self.next_session += 1;
        let id = self.next_session;
        self.sink
            .set_notifier(Some(SinkNotifier::new(id, self.events_tx.clone())));
        let period = (self.format.sample_rate / self.notifications_per_second).max(1);
        self.sink.set_position_notification_period(period);
        self.sink
            .set_notification_marker_position(self.format.frames(self.samples.len()));
        self.sink.play();

        let should_continue = Arc::new(AtomicBool::new(true));
        let spawned = {
            let sink = Arc::clone(&self.sink);
            let samples = Arc::clone(&self.samples);
            let should_continue = Arc::clone(&should_continue);
            let chunk_len = self.chunk_len;
            thread::Builder::new()
                .name("waveplay-stream".to_string())
                .spawn(move || stream_samples(sink.as_ref(), &samples, chunk_len, &should_continue))
        };

        match spawned {
            Ok(thread) => {
                self.session = Some(Session {
                    id,
                    should_continue,
                    thread,
                });
                tracing::debug!("Playback session {} started", id);
            }
            Err(e) => {
                tracing::error!("Failed to spawn streaming thread: {}", e);
                self.halt_sink();
            }
        }
    }

    /// Stops playback. Does nothing when idle.
    ///
    /// Returns without waiting for the streaming thread; it exits once its
    /// pending write is released by the sink.
    pub fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        session.should_continue.store(false, Ordering::Release);
        // Joined by the next start(); start() always empties this slot first.
        self.retired = Some(session.thread);
        self.halt_sink();
        tracing::debug!("Playback session {} stopped", session.id);
    }

    /// Releases the sink. The engine cannot start again afterwards.
    pub fn release(&mut self) {
        self.sink.release();
        tracing::debug!("Audio sink released");
    }

    /// Delivers every pending notification of the active session to
    /// `listener`. Returns how many were delivered.
    ///
    /// Progress is read from the sink head when delivered, so a backlog of
    /// periodic notifications yields a single `on_progress` per call.
    pub fn dispatch_events(&mut self, listener: &mut dyn PlaybackListener) -> usize {
        self.drain(None, listener)
    }

    /// Waits up to `timeout` for a notification, then delivers it and
    /// everything else pending as one batch.
    pub fn wait_events(&mut self, listener: &mut dyn PlaybackListener, timeout: Duration) -> usize {
        match self.events_rx.recv_timeout(timeout) {
            Ok(event) => self.drain(Some(event), listener),
            Err(_) => 0,
        }
    }

    fn drain(&mut self, first: Option<SinkEvent>, listener: &mut dyn PlaybackListener) -> usize {
        let mut delivered = 0;
        let mut progressed = false;
        let mut next = first;
        while let Some(event) = next.take().or_else(|| self.events_rx.try_recv().ok()) {
            if self.handle_event(event, listener, &mut progressed) {
                delivered += 1;
            }
        }
        delivered
    }

    fn handle_event(
        &mut self,
        event: SinkEvent,
        listener: &mut dyn PlaybackListener,
        progressed: &mut bool,
    ) -> bool {
        if self.session.as_ref().map(|session| session.id) != Some(event.session) {
            tracing::trace!("Discarding {:?} from session {}", event.kind, event.session);
            return false;
        }

        match event.kind {
            SinkEventKind::Periodic => {
                if *progressed {
                    return false;
                }
                *progressed = true;
                let head = self.sink.playback_head_position();
                listener.on_progress(head * 1000 / self.format.sample_rate.max(1) as u64);
            }
            SinkEventKind::MarkerReached => {
                tracing::info!("Playback completed");
                self.stop();
                listener.on_completion();
            }
        }
        true
    }

    fn halt_sink(&self) {
        self.sink.pause();
        self.sink.stop();
        self.sink.flush();
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.stop();
        if let Some(handle) = self.retired.take() {
            let _ = handle.join();
        }
    }
}

/// Writes `samples` to `sink` in chunks of `chunk_len`, zero-padding the last
/// one, until done or `should_continue` is cleared.
fn stream_samples(
    sink: &dyn AudioSink,
    samples: &[i16],
    chunk_len: usize,
    should_continue: &AtomicBool,
) {
    tracing::info!("Audio streaming started");
    let mut chunk = vec![0i16; chunk_len];
    let mut offset = 0;
    let mut written = 0;

    while should_continue.load(Ordering::Acquire) && offset < samples.len() {
        let take = chunk_len.min(samples.len() - offset);
        chunk[..take].copy_from_slice(&samples[offset..offset + take]);
        chunk[take..].fill(0);
        offset += take;
        written += sink.write(&chunk);
    }

    tracing::info!("Audio streaming finished. Samples written: {}", written);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::sink::ClockSink;
    use std::sync::atomic::{AtomicU64, AtomicUsize};
    use std::sync::Mutex;
    use std::time::Instant;

    #[derive(Default)]
    struct Recorder {
        progress: Vec<u64>,
        completions: usize,
    }

    impl PlaybackListener for Recorder {
        fn on_progress(&mut self, millis: u64) {
            self.progress.push(millis);
        }

        fn on_completion(&mut self) {
            self.completions += 1;
        }
    }

    #[derive(Default)]
    struct MockSink {
        plays: AtomicUsize,
        stops: AtomicUsize,
        written: AtomicUsize,
        head: AtomicU64,
        released: AtomicBool,
        notifier: Mutex<Option<SinkNotifier>>,
    }

    impl MockSink {
        fn notifier(&self) -> SinkNotifier {
            self.notifier.lock().unwrap().clone().unwrap()
        }
    }

    impl AudioSink for MockSink {
        fn format(&self) -> SinkFormat {
            SinkFormat::new(44_100, 1)
        }

        fn state(&self) -> SinkState {
            if self.released.load(Ordering::SeqCst) {
                SinkState::Uninitialized
            } else {
                SinkState::Initialized
            }
        }

        fn min_buffer_size(&self) -> Option<usize> {
            None
        }

        fn write(&self, samples: &[i16]) -> usize {
            self.written.fetch_add(samples.len(), Ordering::SeqCst);
            samples.len()
        }

        fn play(&self) {
            self.plays.fetch_add(1, Ordering::SeqCst);
        }

        fn pause(&self) {}

        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }

        fn flush(&self) {}

        fn release(&self) {
            self.released.store(true, Ordering::SeqCst);
        }

        fn playback_head_position(&self) -> u64 {
            self.head.load(Ordering::SeqCst)
        }

        fn set_position_notification_period(&self, _frames: u32) {}

        fn set_notification_marker_position(&self, _frame: u64) {}

        fn set_notifier(&self, notifier: Option<SinkNotifier>) {
            *self.notifier.lock().unwrap() = notifier;
        }
    }

    fn clock_engine(seconds: usize, speed: f64) -> PlaybackEngine {
        clock_engine_with_channels(seconds, 1, speed)
    }

    fn clock_engine_with_channels(seconds: usize, channels: u16, speed: f64) -> PlaybackEngine {
        let samples: Arc<[i16]> = (0..44_100 * channels as usize * seconds)
            .map(|i| (i % 1000) as i16)
            .collect();
        let sink = Arc::new(ClockSink::new(SinkFormat::new(44_100, channels), speed));
        PlaybackEngine::new(samples, sink)
    }

    fn run_until<F>(engine: &mut PlaybackEngine, recorder: &mut Recorder, limit: Duration, done: F)
    where
        F: Fn(&Recorder) -> bool,
    {
        let deadline = Instant::now() + limit;
        while !done(recorder) && Instant::now() < deadline {
            engine.wait_events(recorder, Duration::from_millis(20));
        }
    }

    #[test]
    fn test_one_second_plays_to_completion_once() {
        let mut engine = clock_engine(1, 8.0);
        let mut recorder = Recorder::default();
        engine.start();
        assert!(engine.is_playing());

        run_until(&mut engine, &mut recorder, Duration::from_secs(10), |r| {
            r.completions > 0
        });
        // Nothing more arrives after completion.
        run_until(&mut engine, &mut recorder, Duration::from_millis(200), |_| false);

        assert_eq!(recorder.completions, 1);
        assert!(!engine.is_playing());
        assert!(!recorder.progress.is_empty());
        assert!(recorder.progress.windows(2).all(|w| w[0] <= w[1]));
        let last = *recorder.progress.last().unwrap();
        assert!((900..=1000).contains(&last), "last progress {last}");
    }

    #[test]
    fn test_stereo_completes_after_one_second_of_frames() {
        let mut engine = clock_engine_with_channels(1, 2, 8.0);
        assert_eq!(engine.samples().len(), 88_200);
        let mut recorder = Recorder::default();
        engine.start();

        run_until(&mut engine, &mut recorder, Duration::from_secs(10), |r| {
            r.completions > 0
        });
        run_until(&mut engine, &mut recorder, Duration::from_millis(200), |_| false);

        assert_eq!(recorder.completions, 1);
        assert!(!engine.is_playing());
        let last = *recorder.progress.last().unwrap();
        assert!((900..=1000).contains(&last), "last progress {last}");
        assert!(recorder.progress.iter().all(|&ms| ms <= 1000));
    }

    #[test]
    fn test_backlog_of_periodic_events_reports_progress_once() {
        let sink = Arc::new(MockSink::default());
        let mut engine = PlaybackEngine::new(vec![0i16; 1000].into(), sink.clone());
        let mut recorder = Recorder::default();
        engine.start();

        let notifier = sink.notifier();
        sink.head.store(8_820, Ordering::SeqCst);
        for _ in 0..5 {
            notifier.notify(SinkEventKind::Periodic);
        }
        assert_eq!(engine.dispatch_events(&mut recorder), 1);
        assert_eq!(recorder.progress, vec![200]);

        // The next batch reports again.
        sink.head.store(13_230, Ordering::SeqCst);
        notifier.notify(SinkEventKind::Periodic);
        notifier.notify(SinkEventKind::Periodic);
        assert_eq!(
            engine.wait_events(&mut recorder, Duration::from_millis(100)),
            1
        );
        assert_eq!(recorder.progress, vec![200, 300]);
        engine.stop();
    }

    #[test]
    fn test_restart_joins_the_retired_thread() {
        let mut engine = clock_engine(10, 1.0);
        for _ in 0..20 {
            engine.start();
            assert!(engine.is_playing());
            engine.stop();
            assert!(engine.retired.is_some());
        }
        engine.start();
        assert!(engine.retired.is_none());
        engine.stop();
    }

    #[test]
    fn test_stop_mid_stream_returns_promptly_and_restarts() {
        let mut engine = clock_engine(10, 1.0);
        let mut recorder = Recorder::default();
        engine.start();
        thread::sleep(Duration::from_millis(100));

        let started = Instant::now();
        engine.stop();
        assert!(started.elapsed() < Duration::from_millis(500));
        assert!(!engine.is_playing());

        engine.start();
        assert!(engine.is_playing());
        run_until(&mut engine, &mut recorder, Duration::from_secs(5), |r| {
            !r.progress.is_empty()
        });
        assert!(!recorder.progress.is_empty());
        assert!(recorder.progress[0] < 1000);
        assert_eq!(recorder.completions, 0);
        engine.stop();
    }

    #[test]
    fn test_redundant_start_and_stop_are_noops() {
        let sink = Arc::new(MockSink::default());
        let mut engine = PlaybackEngine::new(vec![0i16; 1000].into(), sink.clone());

        engine.stop();
        assert_eq!(sink.stops.load(Ordering::SeqCst), 0);

        engine.start();
        engine.start();
        assert_eq!(sink.plays.load(Ordering::SeqCst), 1);

        engine.stop();
        engine.stop();
        assert_eq!(sink.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_chunk_falls_back_to_one_second() {
        let sink = Arc::new(MockSink::default());
        let engine = PlaybackEngine::new(vec![0i16; 10].into(), sink.clone());
        assert_eq!(engine.chunk_len(), 44_100);
        let engine = engine.with_chunk_size(Some(512));
        assert_eq!(engine.chunk_len(), 512);
    }

    #[test]
    fn test_last_chunk_is_zero_padded() {
        let sink = Arc::new(MockSink::default());
        let mut engine =
            PlaybackEngine::new(vec![1i16; 1000].into(), sink.clone()).with_chunk_size(Some(300));
        engine.start();
        engine.stop();
        drop(engine);
        assert_eq!(sink.written.load(Ordering::SeqCst) % 300, 0);
    }

    #[test]
    fn test_unready_sink_never_starts() {
        let sink = Arc::new(ClockSink::new(SinkFormat::new(0, 1), 1.0));
        let mut engine = PlaybackEngine::new(vec![0i16; 100].into(), sink);
        assert!(!engine.is_ready());
        engine.start();
        assert!(!engine.is_playing());
    }

    #[test]
    fn test_released_engine_cannot_start() {
        let mut engine = clock_engine(1, 1.0);
        assert!(engine.is_ready());
        engine.release();
        assert!(!engine.is_ready());
        engine.start();
        assert!(!engine.is_playing());
    }

    #[test]
    fn test_stale_session_events_are_ignored() {
        let sink = Arc::new(MockSink::default());
        let mut engine = PlaybackEngine::new(vec![0i16; 1000].into(), sink.clone());
        let mut recorder = Recorder::default();

        engine.start();
        let stale = sink.notifier();
        engine.stop();
        engine.start();
        let current = sink.notifier();
        assert_ne!(stale.session(), current.session());

        stale.notify(SinkEventKind::MarkerReached);
        stale.notify(SinkEventKind::Periodic);
        assert_eq!(engine.dispatch_events(&mut recorder), 0);
        assert!(engine.is_playing());

        sink.head.store(22_050, Ordering::SeqCst);
        current.notify(SinkEventKind::Periodic);
        assert_eq!(engine.dispatch_events(&mut recorder), 1);
        assert_eq!(recorder.progress, vec![500]);

        current.notify(SinkEventKind::MarkerReached);
        engine.dispatch_events(&mut recorder);
        assert_eq!(recorder.completions, 1);
        assert!(!engine.is_playing());
    }
}
