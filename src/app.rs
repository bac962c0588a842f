//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::commands;
use crate::logging;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

/// A terminal waveform viewer with synchronized audio playback
#[derive(Parser)]
#[command(name = "waveplay")]
#[command(version)]
#[command(about = "A terminal waveform viewer with synchronized audio playback")]
#[command(long_about = "A terminal waveform viewer with synchronized audio playback.\n\nShows the waveform of a 16-bit WAV file with a position marker that follows\nthe audio actually being played, or a live fading trail of microphone input.\n\nEXAMPLES:\n    # Play a file (Space stops and restarts, q quits)\n    $ waveplay play voice-memo.wav\n\n    # Watch the marker without an audio device\n    $ waveplay play voice-memo.wav --dry-run\n\n    # Record from the configured input and keep the take\n    $ waveplay record -o take.wav\n\n    # Export a waveform image\n    $ waveplay render voice-memo.wav -o voice-memo.qoi --width 1600 --height 300\n\n    # Edit configuration file\n    $ waveplay config")]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/waveplay/waveplay.toml\n    Logs:               ~/.local/state/waveplay/waveplay.log.*"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a WAV file with a moving waveform marker
    ///
    /// Playback starts right away. Space stops and restarts from the
    /// beginning, Escape/q quits. Only 16-bit PCM files are supported.
    #[command(visible_alias = "p")]
    Play {
        /// Path to the WAV file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Pace playback with a software clock instead of an audio device
        #[arg(long)]
        dry_run: bool,
    },

    /// Record from the input device with a live waveform trail
    ///
    /// Space pauses/resumes, Escape/q stops.
    #[command(visible_alias = "r")]
    Record {
        /// Save the recording as a WAV file when stopping
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Render the waveform of a WAV file to a QOI image
    Render {
        /// Path to the WAV file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Image to write
        #[arg(short, long, value_name = "OUTPUT")]
        output: PathBuf,

        /// Image width in pixels
        #[arg(long, default_value_t = 1200)]
        width: u32,

        /// Image height in pixels
        #[arg(long, default_value_t = 240)]
        height: u32,
    },

    /// Open configuration file in your preferred editor
    ///
    /// Edit the audio device, streaming and waveform appearance settings.
    /// Uses $EDITOR environment variable or falls back to nano/vi.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio output and input devices
    ///
    /// Shows device IDs, names, and configurations to help configure
    /// the correct device in waveplay.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    /// Useful for troubleshooting issues.
    Logs,

    /// Generate shell completion script
    ///
    /// Examples:
    ///   waveplay completions bash > waveplay.bash
    ///   waveplay completions zsh > _waveplay
    ///   waveplay completions fish > waveplay.fish
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Errors
/// - If logging initialization fails
/// - If command execution fails (e.g., loading audio, opening the terminal)
pub fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Commands that don't need logging
    match &cli.command {
        Commands::Completions { shell } => {
            generate(*shell, &mut Cli::command(), "waveplay", &mut io::stdout());
            return Ok(());
        }
        Commands::ListDevices => return commands::handle_list_devices(),
        Commands::Logs => return commands::handle_logs(),
        _ => {}
    }

    logging::init_logging()?;

    match cli.command {
        Commands::Play { file, dry_run } => commands::handle_play(&file, dry_run)?,
        Commands::Record { output } => commands::handle_record(output)?,
        Commands::Render {
            file,
            output,
            width,
            height,
        } => commands::handle_render(&file, &output, width, height)?,
        Commands::Config => commands::handle_config()?,
        Commands::Completions { .. } | Commands::ListDevices | Commands::Logs => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}
