//! Application command handlers for waveplay.
//!
//! Each submodule handles one command.
//!
//! # Commands
//! - `play`: WAV playback with a synchronized waveform marker
//! - `record`: Live capture shown as a fading waveform trail
//! - `render`: Export a waveform image without a terminal
//! - `config`: Open configuration file in user's preferred editor
//! - `list_devices`: List available audio output and input devices
//! - `logs`: Display recent log entries

pub mod config;
pub mod list_devices;
pub mod logs;
pub mod play;
pub mod record;
pub mod render;

pub use config::handle_config;
pub use list_devices::handle_list_devices;
pub use logs::handle_logs;
pub use play::handle_play;
pub use record::handle_record;
pub use render::handle_render;
