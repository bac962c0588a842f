//! Headless export of a waveform image.

use anyhow::anyhow;
use std::fs;
use std::path::Path;

use waveplay::config::WaveplayConfig;
use waveplay::surface::{Bitmap, SurfaceCapabilities};
use waveplay::waveform::{Mode, WaveformView};

use crate::wav::{load_wav, WavAudio};

/// Renders the waveform of a WAV file to a QOI image.
///
/// # Errors
/// - If the configuration cannot be loaded
/// - If the file is not a 16-bit PCM WAV
/// - If the size is zero or the image cannot be written
pub fn handle_render(file: &Path, output: &Path, width: u32, height: u32) -> Result<(), anyhow::Error> {
    let config = WaveplayConfig::load().map_err(|e| anyhow!("Configuration error: {e}"))?;
    let audio = load_wav(file)?;

    let encoded = render_to_qoi(&audio, &config, width, height)?;
    fs::write(output, &encoded)
        .map_err(|e| anyhow!("Failed to write {}: {e}", output.display()))?;

    tracing::info!(
        "Rendered {} to {} ({}x{}, {} bytes)",
        file.display(),
        output.display(),
        width,
        height,
        encoded.len()
    );
    println!("Waveform written to {}", output.display());
    Ok(())
}

/// Draws the waveform into a transparent `width` x `height` bitmap and
/// encodes it as QOI.
fn render_to_qoi(
    audio: &WavAudio,
    config: &WaveplayConfig,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, anyhow::Error> {
    if width == 0 || height == 0 {
        return Err(anyhow!("Image size must be non-zero, got {width}x{height}"));
    }

    // Rasterized once, so replaying a recording would only add work
    let mut view = WaveformView::new(
        Mode::Playback,
        config.waveform.style(),
        SurfaceCapabilities { recording: false },
    );
    view.set_show_text_axis(config.waveform.show_text_axis);
    view.set_sample_rate(audio.sample_rate);
    view.set_channels(audio.channels);
    view.on_size_changed(width, height);
    view.set_samples(audio.samples.clone());

    let mut bitmap = Bitmap::new(width, height);
    view.on_draw(&mut bitmap);

    qoi::encode_to_vec(bitmap.pixels(), width, height)
        .map_err(|e| anyhow!("Failed to encode image: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn sine(sample_rate: u32, millis: u32) -> WavAudio {
        let count = (sample_rate * millis / 1000) as usize;
        let samples: Arc<[i16]> = (0..count)
            .map(|i| ((i as f32 * 0.05).sin() * 12_000.0) as i16)
            .collect();
        WavAudio {
            samples,
            sample_rate,
            channels: 1,
        }
    }

    #[test]
    fn test_rendered_image_decodes() {
        let config = WaveplayConfig::default();
        let encoded = render_to_qoi(&sine(8000, 2000), &config, 120, 60).unwrap();

        let (header, pixels) = qoi::decode_to_vec(&encoded).unwrap();
        assert_eq!((header.width, header.height), (120, 60));
        assert_eq!(header.channels, qoi::Channels::Rgba);
        assert_eq!(pixels.len(), 120 * 60 * 4);

        // Something was drawn; below the waveform stays transparent
        assert!(pixels.chunks_exact(4).any(|px| px[3] > 0));
        assert_eq!(pixels[pixels.len() - 1], 0);
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let config = WaveplayConfig::default();
        assert!(render_to_qoi(&sine(8000, 100), &config, 0, 60).is_err());
    }
}
