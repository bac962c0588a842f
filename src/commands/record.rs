//! Live recording with a fading waveform trail.

use std::path::PathBuf;
use std::time::Duration;

use waveplay::config::WaveplayConfig;
use waveplay::surface::SurfaceCapabilities;
use waveplay::waveform::{Mode, WaveformView};

use crate::recording::capture::{trail_window, InputCapture};
use crate::ui::{Footer, FooterState, UiCommand, WaveformTui};

const FRAME_INTERVAL: Duration = Duration::from_millis(33);
const HINT: &str = "Space pause/resume   q quit";

/// Records from the configured input device, drawing each captured window
/// as a frame of the trail.
///
/// Space pauses and resumes capture, Escape/q stops. With `output` the whole
/// take is saved as a mono WAV file on exit.
///
/// # Errors
/// - If the configuration cannot be loaded
/// - If the input device cannot be opened
/// - If the terminal cannot be driven
/// - If the recording cannot be saved
pub fn handle_record(output: Option<PathBuf>) -> Result<(), anyhow::Error> {
    tracing::info!("=== waveplay Recorder Started ===");

    let config = WaveplayConfig::load().map_err(|e| {
        tracing::error!("Failed to load configuration: {e}");
        anyhow::anyhow!("Configuration error: {e}")
    })?;

    let mut capture = InputCapture::new(config.audio.device.clone(), output.is_some());
    if let Err(e) = capture.start() {
        tracing::error!("Failed to start recording: {}", e);
        let message = format!(
            "Recording Error:\n\n{e}\n\nPlease check your audio configuration and try again."
        );
        let mut tui = WaveformTui::new()?;
        tui.show_error(&message)?;
        tui.cleanup()?;
        return Err(e);
    }

    let mut view = WaveformView::new(
        Mode::Recording,
        config.waveform.style(),
        config.waveform.capabilities(SurfaceCapabilities::default()),
    );
    view.set_sample_rate(capture.sample_rate());
    view.set_channels(1);

    let mut tui = WaveformTui::new().map_err(|e| anyhow::anyhow!("Failed to initialize UI: {e}"))?;

    tracing::debug!("Entering recording loop. Press Space to pause or 'Escape'/'q' to stop.");
    let result = run_recorder(&mut tui, &capture, &mut view);

    capture.stop();
    tui.cleanup()
        .map_err(|e| anyhow::anyhow!("Cleanup failed: {e}"))?;
    result?;

    if let Some(path) = output {
        capture.save(&path)?;
        println!("Recording saved to {}", path.display());
    }

    tracing::info!("=== waveplay Recorder Exited Successfully ===");
    Ok(())
}

fn run_recorder(
    tui: &mut WaveformTui,
    capture: &InputCapture,
    view: &mut WaveformView,
) -> Result<(), anyhow::Error> {
    let window = trail_window(capture.sample_rate());
    let mut frame_count = 0u64;
    let mut last_count = 0u64;

    loop {
        let (width, height) = tui.canvas_size()?;
        if width != view.width() || height != view.height() {
            view.on_size_changed(width, height);
        }

        // Only new audio advances the trail, so a paused take stays frozen
        let count = capture.captured();
        if count != last_count {
            last_count = count;
            view.set_samples(capture.recent(window));
        }

        frame_count += 1;
        if frame_count % 60 == 0 {
            tracing::debug!("Recording: {:.1}s recorded", capture.duration_ms() as f32 / 1000.0);
        }

        let footer = Footer {
            state: if capture.is_paused() {
                FooterState::Stopped
            } else {
                FooterState::Recording
            },
            position_ms: capture.duration_ms(),
            length_ms: None,
            hint: HINT,
        };
        tui.draw(view, &footer)
            .map_err(|e| anyhow::anyhow!("Render failed: {e}"))?;

        match tui.handle_input(FRAME_INTERVAL)? {
            UiCommand::Continue => {}
            UiCommand::Toggle => {
                capture.toggle_pause();
            }
            UiCommand::Quit => return Ok(()),
        }
    }
}
