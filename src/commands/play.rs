//! WAV playback with a synchronized waveform marker.
//!
//! Shows the cached waveform of a WAV file in the terminal and moves the
//! position marker along with the audio actually leaving the sink.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use waveplay::config::WaveplayConfig;
use waveplay::playback::{AudioSink, ClockSink, CpalSink, PlaybackEngine, PlaybackListener, SinkFormat};
use waveplay::surface::SurfaceCapabilities;
use waveplay::waveform::{Mode, WaveformView};

use crate::ui::{Footer, FooterState, UiCommand, WaveformTui};
use crate::wav::load_wav;

const FRAME_INTERVAL: Duration = Duration::from_millis(33);
const HINT: &str = "Space play/stop   q quit";

/// Moves the view's marker as playback progresses.
struct MarkerListener<'a> {
    view: &'a mut WaveformView,
}

impl PlaybackListener for MarkerListener<'_> {
    fn on_progress(&mut self, millis: u64) {
        self.view.set_marker_position(Some(millis));
    }

    fn on_completion(&mut self) {
        tracing::debug!("Playback completed");
        self.view.set_marker_position(None);
    }
}

/// Plays a 16-bit WAV file with a moving waveform marker.
///
/// Playback starts immediately. Space stops and restarts from the beginning,
/// Escape/q quits. With `dry_run` no audio device is opened and a software
/// clock paces the marker instead.
///
/// # Errors
/// - If the configuration cannot be loaded
/// - If the file is not a 16-bit PCM WAV
/// - If the terminal cannot be driven
pub fn handle_play(file: &Path, dry_run: bool) -> Result<(), anyhow::Error> {
    tracing::info!("=== waveplay Player Started ===");

    let config = load_config()?;
    let audio = load_wav(file)?;

    let format = SinkFormat::new(audio.sample_rate, audio.channels);
    let sink: Arc<dyn AudioSink> = if dry_run {
        tracing::info!("Dry run: pacing playback with a software clock");
        Arc::new(ClockSink::new(format, 1.0))
    } else {
        Arc::new(CpalSink::open(&config.audio.device, format))
    };

    let mut engine = PlaybackEngine::new(Arc::clone(&audio.samples), sink)
        .with_chunk_size(config.audio.chunk_size)
        .with_notifications_per_second(config.audio.notifications_per_second);
    tracing::debug!("Streaming in chunks of {} samples", engine.chunk_len());

    let mut view = WaveformView::new(
        Mode::Playback,
        config.waveform.style(),
        config.waveform.capabilities(SurfaceCapabilities::default()),
    );
    view.set_show_text_axis(config.waveform.show_text_axis);
    view.set_sample_rate(audio.sample_rate);
    view.set_channels(audio.channels);
    view.set_samples(Arc::clone(&audio.samples));

    let mut tui = WaveformTui::new().map_err(|e| anyhow::anyhow!("Failed to initialize UI: {e}"))?;

    engine.start();
    let result = run_player(&mut tui, &mut engine, &mut view);

    engine.stop();
    engine.release();
    tui.cleanup()
        .map_err(|e| anyhow::anyhow!("Cleanup failed: {e}"))?;

    result?;
    tracing::info!("=== waveplay Player Exited Successfully ===");
    Ok(())
}

fn run_player(
    tui: &mut WaveformTui,
    engine: &mut PlaybackEngine,
    view: &mut WaveformView,
) -> Result<(), anyhow::Error> {
    loop {
        let (width, height) = tui.canvas_size()?;
        if width != view.width() || height != view.height() {
            view.on_size_changed(width, height);
        }

        engine.dispatch_events(&mut MarkerListener { view: &mut *view });

        let footer = Footer {
            state: footer_state(engine),
            position_ms: view.marker_position().unwrap_or(0),
            length_ms: Some(view.audio_length()),
            hint: HINT,
        };
        tui.draw(view, &footer)
            .map_err(|e| anyhow::anyhow!("Render failed: {e}"))?;

        match tui.handle_input(FRAME_INTERVAL)? {
            UiCommand::Continue => {}
            UiCommand::Toggle => {
                if engine.is_playing() {
                    engine.stop();
                    view.set_marker_position(None);
                } else {
                    engine.start();
                }
            }
            UiCommand::Quit => return Ok(()),
        }
    }
}

fn footer_state(engine: &PlaybackEngine) -> FooterState {
    if !engine.is_ready() {
        FooterState::Unavailable
    } else if engine.is_playing() {
        FooterState::Playing
    } else {
        FooterState::Stopped
    }
}

/// Loads the configuration, showing a full-screen error if it is invalid.
fn load_config() -> Result<WaveplayConfig, anyhow::Error> {
    match WaveplayConfig::load() {
        Ok(config) => Ok(config),
        Err(err) => {
            tracing::error!("Failed to load configuration: {err}");
            let message = format!(
                "Configuration Error:\n\n{err}\n\nPlease check your ~/.config/waveplay/waveplay.toml file and try again."
            );
            let mut tui = WaveformTui::new()?;
            tui.show_error(&message)?;
            tui.cleanup()?;
            Err(anyhow::anyhow!("Configuration error: {err}"))
        }
    }
}
