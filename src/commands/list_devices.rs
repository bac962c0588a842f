//! List available audio output and input devices.

use anyhow::anyhow;
use cpal::traits::{DeviceTrait, HostTrait};

use waveplay::host::{devices, quiet_stderr, Direction};

/// Lists the playback and capture devices on the system.
///
/// # Errors
/// - If the audio host cannot enumerate devices
pub fn handle_list_devices() -> Result<(), anyhow::Error> {
    let host = cpal::default_host();

    println!();
    for direction in [Direction::Output, Direction::Input] {
        print_devices(&host, direction)?;
    }
    println!("Set `device` under [audio] in waveplay.toml to an ID or name.");

    Ok(())
}

fn print_devices(host: &cpal::Host, direction: Direction) -> Result<(), anyhow::Error> {
    let (label, found, default_name) = quiet_stderr(|| {
        let found = devices(host, direction);
        let (label, default_device) = match direction {
            Direction::Output => ("output", host.default_output_device()),
            Direction::Input => ("input", host.default_input_device()),
        };
        (label, found, default_device.and_then(|d| d.name().ok()))
    });
    let found = found.map_err(|e| anyhow!("Failed to enumerate {label} devices: {e}"))?;

    if found.is_empty() {
        println!("No audio {label} devices found on this system.");
        println!();
        return Ok(());
    }

    println!("Available audio {label} devices:");
    println!();

    for (index, device) in found.iter().enumerate() {
        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        let default_indicator = if default_name.as_ref() == Some(&device_name) {
            " [DEFAULT]"
        } else {
            ""
        };

        let config = match direction {
            Direction::Output => device.default_output_config(),
            Direction::Input => device.default_input_config(),
        };
        let config_info = match config {
            Ok(config) => format!(
                " ({}Hz, {} channels, {})",
                config.sample_rate().0,
                config.channels(),
                config.sample_format()
            ),
            Err(_) => " (configuration unavailable)".to_string(),
        };

        println!("  ID: {index}");
        println!("    Name: {device_name}{default_indicator}");
        println!("    Config:{config_info}");
        println!();
    }

    Ok(())
}
