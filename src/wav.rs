//! WAV file loading and saving.

use anyhow::{anyhow, bail};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;
use std::sync::Arc;

/// Interleaved 16-bit PCM loaded from a WAV file.
#[derive(Debug, Clone)]
pub struct WavAudio {
    pub samples: Arc<[i16]>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl WavAudio {
    pub fn duration_ms(&self) -> u64 {
        waveplay::waveform::audio_length_ms(self.samples.len(), self.sample_rate, self.channels)
            .unwrap_or(0)
    }
}

/// Loads a 16-bit integer PCM WAV file.
///
/// # Errors
/// - If the file cannot be opened or is not a WAV file
/// - If the samples are not 16-bit integers
pub fn load_wav(path: &Path) -> Result<WavAudio, anyhow::Error> {
    let mut reader = WavReader::open(path)
        .map_err(|e| anyhow!("Failed to open {}: {e}", path.display()))?;
    let spec = reader.spec();

    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        bail!(
            "Unsupported WAV format in {}: {}-bit {:?}. Only 16-bit PCM is supported.",
            path.display(),
            spec.bits_per_sample,
            spec.sample_format
        );
    }

    let samples = reader
        .samples::<i16>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| anyhow!("Failed to read samples from {}: {e}", path.display()))?;

    let audio = WavAudio {
        samples: samples.into(),
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    };
    tracing::info!(
        "Loaded {}: {:.2}s, {}Hz, {} channels",
        path.display(),
        audio.duration_ms() as f32 / 1000.0,
        audio.sample_rate,
        audio.channels
    );
    Ok(audio)
}

/// Saves interleaved samples as a 16-bit PCM WAV file.
///
/// # Errors
/// - If the file cannot be created or written
pub fn save_wav(
    path: &Path,
    samples: &[i16],
    sample_rate: u32,
    channels: u16,
) -> Result<(), anyhow::Error> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)
        .map_err(|e| anyhow!("Failed to create {}: {e}", path.display()))?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    tracing::debug!("WAV written: {} ({} samples)", path.display(), samples.len());
    Ok(())
}
