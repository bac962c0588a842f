//! Audio host helpers: device lookup and ALSA noise suppression.

use cpal::traits::{DeviceTrait, HostTrait};

use crate::playback::sink::SinkError;

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Which side of the audio host a device is looked up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    fn label(self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
        }
    }
}

/// Lists the devices on one side of the host, skipping any whose name cannot
/// be queried.
///
/// # Errors
/// - If the host cannot enumerate devices
pub fn devices(host: &cpal::Host, direction: Direction) -> Result<Vec<cpal::Device>, SinkError> {
    let devices: Vec<cpal::Device> = match direction {
        Direction::Input => host
            .input_devices()
            .map_err(|e| SinkError::Devices(e.to_string()))?
            .collect(),
        Direction::Output => host
            .output_devices()
            .map_err(|e| SinkError::Devices(e.to_string()))?
            .collect(),
    };
    Ok(devices.into_iter().filter(|d| d.name().is_ok()).collect())
}

/// Finds a device by `"default"`, numeric index, or exact name.
///
/// # Errors
/// - If there is no default device
/// - If the index is out of range or no device has the given name
pub fn find_device(
    host: &cpal::Host,
    direction: Direction,
    device_spec: &str,
) -> Result<cpal::Device, SinkError> {
    if device_spec == "default" {
        let device = match direction {
            Direction::Input => host.default_input_device(),
            Direction::Output => host.default_output_device(),
        };
        return device.ok_or(SinkError::NoDefaultDevice(direction.label()));
    }

    let mut devices = devices(host, direction)?;

    if let Ok(index) = device_spec.parse::<usize>() {
        if index < devices.len() {
            return Ok(devices.swap_remove(index));
        }
        return Err(SinkError::DeviceIndexOutOfRange {
            index,
            max: devices.len().saturating_sub(1),
        });
    }

    devices
        .into_iter()
        .find(|device| device.name().is_ok_and(|name| name == device_spec))
        .ok_or_else(|| SinkError::DeviceNotFound(device_spec.to_string()))
}

/// Runs `f` with stderr redirected to /dev/null, hiding the warnings ALSA
/// prints while probing devices. If the redirect cannot be set up `f` runs
/// with stderr untouched.
#[cfg(target_os = "linux")]
pub fn quiet_stderr<F, T>(f: F) -> T
where
    F: FnOnce() -> T,
{
    let Ok(dev_null) = OpenOptions::new().write(true).open("/dev/null") else {
        return f();
    };

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return f();
    }

    if unsafe { libc::dup2(dev_null.as_raw_fd(), libc::STDERR_FILENO) } == -1 {
        unsafe { libc::close(old_stderr) };
        return f();
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

/// ALSA only exists on Linux; elsewhere this just runs `f`.
#[cfg(not(target_os = "linux"))]
pub fn quiet_stderr<F, T>(f: F) -> T
where
    F: FnOnce() -> T,
{
    f()
}
