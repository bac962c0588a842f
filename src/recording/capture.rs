//! Live audio capture for the recording trail.
//!
//! Captures from the configured input device at its native rate and mixes
//! every frame down to mono. Only the most recent trail window is retained
//! unless the whole take is wanted for saving.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, StreamConfig};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use waveplay::host::{find_device, quiet_stderr, Direction};

use crate::wav::save_wav;

/// Samples shown per trail frame: a twentieth of a second.
pub fn trail_window(sample_rate: u32) -> usize {
    (sample_rate as usize / 20).max(1)
}

/// Records mono 16-bit audio from an input device.
pub struct InputCapture {
    /// Device name, index, or "default"
    device_name: String,
    /// Actual capture rate, known once started
    sample_rate: u32,
    /// Retain every sample instead of only the latest trail window
    keep_take: bool,
    samples: Arc<Mutex<Vec<i16>>>,
    /// Mono samples captured since start, including any no longer retained
    captured: Arc<AtomicU64>,
    is_paused: Arc<AtomicBool>,
    /// Kept alive while capturing
    stream: Option<cpal::Stream>,
}

impl InputCapture {
    /// Creates an idle capture. With `keep_take` the whole recording is kept
    /// for [`InputCapture::save`]; otherwise memory stays bounded by the
    /// trail window.
    pub fn new(device_name: String, keep_take: bool) -> Self {
        Self {
            device_name,
            sample_rate: 0,
            keep_take,
            samples: Arc::new(Mutex::new(Vec::new())),
            captured: Arc::new(AtomicU64::new(0)),
            is_paused: Arc::new(AtomicBool::new(false)),
            stream: None,
        }
    }

    /// Starts capturing from the configured input device.
    ///
    /// # Errors
    /// - If the device is not available
    /// - If its configuration cannot be read or its sample format is unsupported
    /// - If the input stream cannot be created or started
    pub fn start(&mut self) -> Result<()> {
        let device =
            quiet_stderr(|| find_device(&cpal::default_host(), Direction::Input, &self.device_name))?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Recording device: {}", device_name);

        let device_config = device.default_input_config()?;
        let sample_format = device_config.sample_format();
        let channels = device_config.channels() as usize;
        self.sample_rate = device_config.sample_rate().0;

        tracing::debug!(
            "Device configuration: {}Hz, {} channels, {}",
            self.sample_rate,
            channels,
            sample_format
        );

        let config: StreamConfig = device_config.into();
        let stream = match sample_format {
            SampleFormat::I16 => self.build_stream::<i16>(&device, &config, channels)?,
            SampleFormat::F32 => self.build_stream::<f32>(&device, &config, channels)?,
            other => return Err(anyhow!("Unsupported input sample format: {other}")),
        };

        stream.play()?;
        self.stream = Some(stream);
        tracing::debug!("Input stream started");
        Ok(())
    }

    fn build_stream<T>(
        &self,
        device: &cpal::Device,
        config: &StreamConfig,
        channels: usize,
    ) -> Result<cpal::Stream>
    where
        T: SizedSample,
        i16: FromSample<T>,
    {
        let samples = Arc::clone(&self.samples);
        let captured = Arc::clone(&self.captured);
        let is_paused = Arc::clone(&self.is_paused);
        let limit = self.retain_limit();
        let mut scratch: Vec<i16> = Vec::new();

        let stream = device.build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                if is_paused.load(Ordering::Relaxed) {
                    return;
                }
                scratch.clear();
                scratch.extend(data.iter().map(|&sample| i16::from_sample(sample)));
                store(&samples, &captured, &scratch, channels, limit);
            },
            |err| {
                tracing::error!("Audio input stream error: {}", err);
            },
            None,
        )?;
        Ok(stream)
    }

    /// Stops capturing. Recorded samples are kept.
    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            let count = self.captured();
            tracing::info!(
                "Recording stopped: {:.2}s ({} samples at {}Hz)",
                count as f32 / self.sample_rate.max(1) as f32,
                count,
                self.sample_rate
            );
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// How many samples are retained, or `None` for the whole take.
    fn retain_limit(&self) -> Option<usize> {
        (!self.keep_take).then(|| trail_window(self.sample_rate))
    }

    fn lock_samples(&self) -> MutexGuard<'_, Vec<i16>> {
        self.samples.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Samples currently retained.
    pub fn sample_count(&self) -> usize {
        self.lock_samples().len()
    }

    /// Samples captured since start, retained or not.
    pub fn captured(&self) -> u64 {
        self.captured.load(Ordering::Relaxed)
    }

    /// Recorded length in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.captured() * 1000 / self.sample_rate as u64
    }

    /// The most recent `window` samples, or fewer if not that many were
    /// recorded yet.
    pub fn recent(&self, window: usize) -> Arc<[i16]> {
        let samples = self.lock_samples();
        let start = samples.len().saturating_sub(window);
        Arc::from(&samples[start..])
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused.load(Ordering::Relaxed)
    }

    /// Toggles between paused and capturing. Returns whether capture is now
    /// paused.
    pub fn toggle_pause(&self) -> bool {
        let paused = !self.is_paused.fetch_xor(true, Ordering::Relaxed);
        if paused {
            tracing::debug!("Recording paused");
        } else {
            tracing::debug!("Recording resumed");
        }
        paused
    }

    /// Writes the retained samples to a mono WAV file: the whole take when
    /// created with `keep_take`.
    ///
    /// # Errors
    /// - If nothing was recorded
    /// - If the file cannot be written
    pub fn save(&self, path: &Path) -> Result<()> {
        let samples = self.lock_samples();
        if samples.is_empty() {
            return Err(anyhow!("Nothing was recorded"));
        }
        save_wav(path, &samples, self.sample_rate, 1)?;
        tracing::info!("Recording saved: {}", path.display());
        Ok(())
    }
}

/// Appends one callback's worth of interleaved input to `samples`, then drops
/// the oldest samples beyond `limit`.
fn store(
    samples: &Mutex<Vec<i16>>,
    captured: &AtomicU64,
    data: &[i16],
    channels: usize,
    limit: Option<usize>,
) {
    let mut samples = samples.lock().unwrap_or_else(PoisonError::into_inner);
    let before = samples.len();
    downmix(data, channels, &mut samples);
    captured.fetch_add((samples.len() - before) as u64, Ordering::Relaxed);

    if let Some(limit) = limit {
        let excess = samples.len().saturating_sub(limit);
        samples.drain(..excess);
    }
}

/// Appends `data` to `out` mixed down to mono by averaging each frame.
fn downmix(data: &[i16], channels: usize, out: &mut Vec<i16>) {
    match channels {
        0 => {}
        1 => out.extend_from_slice(data),
        _ => out.extend(data.chunks_exact(channels).map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / channels as i32) as i16
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmix() {
        let mut out = Vec::new();
        downmix(&[1, 2, 3], 1, &mut out);
        assert_eq!(out, vec![1, 2, 3]);

        out.clear();
        downmix(&[100, 200, -100, -300], 2, &mut out);
        assert_eq!(out, vec![150, -200]);

        out.clear();
        downmix(&[i16::MAX, i16::MAX, i16::MAX, 7], 3, &mut out);
        assert_eq!(out, vec![i16::MAX]);
    }

    #[test]
    fn test_trail_window() {
        assert_eq!(trail_window(48_000), 2400);
        assert_eq!(trail_window(44_100), 2205);
        assert_eq!(trail_window(0), 1);
    }

    #[test]
    fn test_without_take_only_trail_window_is_retained() {
        let mut capture = InputCapture::new("default".to_string(), false);
        capture.sample_rate = 8000;
        let limit = capture.retain_limit();
        assert_eq!(limit, Some(400));

        let block: Vec<i16> = (0..1000).map(|i| i as i16).collect();
        for _ in 0..50 {
            store(&capture.samples, &capture.captured, &block, 2, limit);
        }

        assert_eq!(capture.sample_count(), 400);
        assert_eq!(capture.captured(), 25_000);
        assert_eq!(capture.duration_ms(), 3125);
        assert_eq!(capture.recent(400).len(), 400);
    }

    #[test]
    fn test_with_take_everything_is_retained() {
        let mut capture = InputCapture::new("default".to_string(), true);
        capture.sample_rate = 8000;
        let limit = capture.retain_limit();
        assert_eq!(limit, None);

        let block = vec![7i16; 1000];
        for _ in 0..50 {
            store(&capture.samples, &capture.captured, &block, 1, limit);
        }

        assert_eq!(capture.sample_count(), 50_000);
        assert_eq!(capture.captured(), 50_000);
    }

    #[test]
    fn test_recent_window_and_pause() {
        let capture = InputCapture::new("default".to_string(), true);
        capture.lock_samples().extend(0..100);

        assert_eq!(&capture.recent(10)[..], &(90..100).collect::<Vec<i16>>()[..]);
        assert_eq!(capture.recent(1000).len(), 100);

        assert!(!capture.is_paused());
        assert!(capture.toggle_pause());
        assert!(capture.is_paused());
        assert!(!capture.toggle_pause());
    }

    #[test]
    fn test_saving_empty_take_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let capture = InputCapture::new("default".to_string(), true);
        assert!(capture.save(&dir.path().join("take.wav")).is_err());
    }
}
