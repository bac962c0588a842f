//! Sink backed by a cpal output stream.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{BufferSize, FromSample, SampleFormat, SizedSample, StreamConfig};
use crossbeam::channel::{bounded, Sender};

use super::buffer::SinkBuffer;
use super::{AudioSink, SinkError, SinkFormat, SinkNotifier, SinkState};
use crate::host::{find_device, quiet_stderr, Direction};

/// Plays through an output device.
///
/// cpal streams cannot move between threads on every platform, so the stream
/// lives on a dedicated thread for the lifetime of the sink. The data
/// callback pulls from the shared [`SinkBuffer`].
pub struct CpalSink {
    format: SinkFormat,
    buffer: Arc<SinkBuffer>,
    min_buffer: usize,
    ready: bool,
    shutdown: Mutex<Option<Sender<()>>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl CpalSink {
    /// Opens `device_spec` ("default", an index, or a name) for output.
    ///
    /// Never fails outright: if the device cannot be opened the sink reports
    /// [`SinkState::Uninitialized`] and the reason is logged.
    pub fn open(device_spec: &str, format: SinkFormat) -> Self {
        let min_buffer = (format.sample_rate as usize / 10).max(1) * format.channels as usize;
        let mut sink = Self {
            format,
            buffer: Arc::new(SinkBuffer::new(min_buffer * 2, format.channels)),
            min_buffer,
            ready: false,
            shutdown: Mutex::new(None),
            thread: Mutex::new(None),
        };

        match sink.start_stream(device_spec) {
            Ok(()) => {
                sink.ready = true;
                tracing::info!(
                    "Audio output ready: {}Hz, {} channels",
                    format.sample_rate,
                    format.channels
                );
            }
            Err(e) => tracing::warn!("Audio output unavailable: {}", e),
        }
        sink
    }

    fn start_stream(&mut self, device_spec: &str) -> Result<(), SinkError> {
        if !self.format.is_valid() {
            return Err(SinkError::InvalidFormat {
                sample_rate: self.format.sample_rate,
                channels: self.format.channels,
            });
        }

        let (ready_tx, ready_rx) = bounded::<Result<(), SinkError>>(1);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let device_spec = device_spec.to_string();
        let format = self.format;
        let buffer = Arc::clone(&self.buffer);

        let handle = thread::Builder::new()
            .name("waveplay-output".to_string())
            .spawn(move || {
                let stream = match open_stream(&device_spec, format, buffer) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));
                // Hold the stream until the sink is released or dropped.
                let _ = shutdown_rx.recv();
                drop(stream);
                tracing::debug!("Audio output stream closed");
            })?;

        *self.thread.get_mut().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        *self.shutdown.get_mut().unwrap_or_else(PoisonError::into_inner) = Some(shutdown_tx);

        ready_rx.recv().map_err(|_| SinkError::ThreadExited)?
    }
}

fn open_stream(
    device_spec: &str,
    format: SinkFormat,
    buffer: Arc<SinkBuffer>,
) -> Result<cpal::Stream, SinkError> {
    let device = quiet_stderr(|| find_device(&cpal::default_host(), Direction::Output, device_spec))?;
    let device_name = device.name().unwrap_or_else(|_| "Unknown device".to_string());
    tracing::info!("Playback device: {}", device_name);

    let default_config = device
        .default_output_config()
        .map_err(|e| SinkError::Config(e.to_string()))?;
    let config = StreamConfig {
        channels: format.channels,
        sample_rate: cpal::SampleRate(format.sample_rate),
        buffer_size: BufferSize::Default,
    };

    tracing::debug!(
        "Output stream: {}Hz, {} channels, {} samples",
        format.sample_rate,
        format.channels,
        default_config.sample_format()
    );

    let stream = match default_config.sample_format() {
        SampleFormat::I16 => build_stream::<i16>(&device, &config, buffer)?,
        SampleFormat::F32 => build_stream::<f32>(&device, &config, buffer)?,
        SampleFormat::U16 => build_stream::<u16>(&device, &config, buffer)?,
        other => return Err(SinkError::UnsupportedFormat(other.to_string())),
    };

    stream
        .play()
        .map_err(|e| SinkError::StreamPlay(e.to_string()))?;
    Ok(stream)
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    buffer: Arc<SinkBuffer>,
) -> Result<cpal::Stream, SinkError>
where
    T: SizedSample + FromSample<i16>,
{
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                buffer.render(data, T::EQUILIBRIUM, |sample| T::from_sample(sample));
            },
            |err| {
                tracing::error!("Audio output stream error: {}", err);
            },
            None,
        )
        .map_err(|e| SinkError::StreamBuild(e.to_string()))
}

impl AudioSink for CpalSink {
    fn format(&self) -> SinkFormat {
        self.format
    }

    fn state(&self) -> SinkState {
        if self.ready && !self.buffer.is_released() {
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
        // Dropping the sender wakes the stream thread.
        self.shutdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let handle = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::warn!("Audio output thread panicked");
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

impl Drop for CpalSink {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_format_never_opens_a_device() {
        let sink = CpalSink::open("default", SinkFormat::new(0, 2));
        assert_eq!(sink.state(), SinkState::Uninitialized);
        assert_eq!(sink.write(&[1; 4]), 4);
        sink.release();
        assert_eq!(sink.write(&[1; 4]), 0);
    }
}
