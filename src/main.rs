//! waveplay: a terminal waveform viewer with synchronized playback.

mod app;
mod commands;
mod logging;
mod recording;
mod ui;
mod wav;

fn main() {
    if let Err(e) = app::run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
