//! Terminal user interface.

pub mod tui;

pub use tui::{Footer, FooterState, UiCommand, WaveformTui};
