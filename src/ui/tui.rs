//! Terminal host for the waveform view.
//!
//! The view draws into an RGBA bitmap sized to the terminal, which is then
//! shown with half-block characters: every cell carries two vertically
//! stacked pixels, the upper one as foreground and the lower one as
//! background. The last terminal row holds a status footer.

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    buffer::Buffer,
    prelude::*,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use std::io::{stdout, Stdout};
use std::time::Duration;

use waveplay::surface::{self, Bitmap, Canvas};
use waveplay::waveform::WaveformView;

const FOOTER_HEIGHT: u16 = 1;
const BACKGROUND: Color = Color::Rgb(0, 0, 0);
const FOOTER_TEXT: Color = Color::Rgb(185, 207, 212);

/// User input from the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    /// Nothing relevant was pressed
    Continue,
    /// Start/stop playback or pause/resume recording (Space)
    Toggle,
    /// Leave (Escape, 'q' or Ctrl+C)
    Quit,
}

/// What the footer indicator shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FooterState {
    Playing,
    Stopped,
    Recording,
    /// The audio device could not be opened
    Unavailable,
}

/// Contents of the status footer.
#[derive(Debug, Clone, Copy)]
pub struct Footer<'a> {
    pub state: FooterState,
    pub position_ms: u64,
    pub length_ms: Option<u64>,
    pub hint: &'a str,
}

/// Formats milliseconds as `m:ss`.
pub fn format_clock(millis: u64) -> String {
    let seconds = millis / 1000;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Pixel size of the waveform area for a terminal of `columns` x `rows`
/// cells, leaving room for the footer.
pub fn canvas_size(columns: u16, rows: u16) -> (u32, u32) {
    (
        columns as u32,
        rows.saturating_sub(FOOTER_HEIGHT) as u32 * 2,
    )
}

fn to_terminal_color(color: surface::Color) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

/// Shows a bitmap at two pixels per cell.
struct HalfBlocks<'a>(&'a Bitmap);

impl Widget for HalfBlocks<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for row in 0..area.height {
            for column in 0..area.width {
                let x = column as u32;
                let y = row as u32 * 2;
                let upper = self.0.pixel(x, y).unwrap_or(surface::Color::BLACK);
                let lower = self.0.pixel(x, y + 1).unwrap_or(surface::Color::BLACK);
                if let Some(cell) = buf.cell_mut((area.x + column, area.y + row)) {
                    cell.set_symbol("▀")
                        .set_fg(to_terminal_color(upper))
                        .set_bg(to_terminal_color(lower));
                }
            }
        }
    }
}

/// Terminal UI that hosts a [`WaveformView`].
pub struct WaveformTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    frame: Bitmap,
    active: bool,
}

impl WaveformTui {
    /// Creates a new TUI instance and enters alternate screen mode.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    /// - If raw mode cannot be enabled
    /// - If alternate screen cannot be entered
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(WaveformTui {
            terminal,
            frame: Bitmap::new(0, 0),
            active: true,
        })
    }

    /// Current pixel size of the waveform area.
    ///
    /// # Errors
    /// - If the terminal size cannot be queried
    pub fn canvas_size(&self) -> anyhow::Result<(u32, u32)> {
        let size = self.terminal.size()?;
        Ok(canvas_size(size.width, size.height))
    }

    /// Draws the view and the footer.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn draw(&mut self, view: &WaveformView, footer: &Footer<'_>) -> anyhow::Result<()> {
        let (width, height) = self.canvas_size()?;
        if self.frame.width() != width || self.frame.height() != height {
            self.frame = Bitmap::new(width, height);
        }
        self.frame.clear(surface::Color::BLACK);
        view.on_draw(&mut self.frame);

        let frame_bitmap = &self.frame;
        self.terminal.draw(|frame| {
            let area = frame.area();
            let content_area = Rect {
                height: area.height.saturating_sub(FOOTER_HEIGHT),
                ..area
            };
            let footer_area = Rect {
                y: area.y + content_area.height,
                height: area.height - content_area.height,
                ..area
            };

            frame.render_widget(HalfBlocks(frame_bitmap), content_area);
            frame.render_widget(footer_paragraph(footer), footer_area);
        })?;

        Ok(())
    }

    /// Waits up to `timeout` for a key press.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self, timeout: Duration) -> anyhow::Result<UiCommand> {
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    return Ok(UiCommand::Continue);
                }
                return Ok(match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => {
                        tracing::debug!("Escape or 'q' pressed: quitting");
                        UiCommand::Quit
                    }
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        tracing::debug!("Ctrl+C pressed: quitting");
                        UiCommand::Quit
                    }
                    KeyCode::Char(' ') => UiCommand::Toggle,
                    _ => UiCommand::Continue,
                });
            }
        }
        Ok(UiCommand::Continue)
    }

    /// Shows `message` on a full red screen until a key is pressed.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn show_error(&mut self, message: &str) -> anyhow::Result<()> {
        loop {
            self.terminal.draw(|frame| {
                let area = frame.area();
                let red = Style::default().fg(Color::Rgb(255, 255, 255)).bg(Color::Rgb(255, 0, 0));
                frame.buffer_mut().set_style(area, red);

                let lines = message.lines().count() as u16 + 2;
                let text_area = Rect {
                    x: area.x + area.width / 10,
                    y: area.y + area.height.saturating_sub(lines) / 2,
                    width: area.width * 8 / 10,
                    height: lines.min(area.height),
                };
                let body = Text::from(format!("{message}\n\nPress any key to exit"));
                frame.render_widget(
                    Paragraph::new(body)
                        .style(red)
                        .alignment(Alignment::Center)
                        .wrap(Wrap { trim: true }),
                    text_area,
                );
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Cleans up terminal state and exits alternate screen mode.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    /// - If cursor cannot be shown
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for WaveformTui {
    fn drop(&mut self) {
        if let Err(e) = self.cleanup() {
            tracing::warn!("Failed to restore terminal: {}", e);
        }
    }
}

fn footer_paragraph(footer: &Footer<'_>) -> Paragraph<'static> {
    let indicator = match footer.state {
        FooterState::Playing => Span::styled("▶ ", Style::default().fg(Color::Green)),
        FooterState::Stopped => Span::styled("■ ", Style::default().fg(FOOTER_TEXT)),
        FooterState::Recording => Span::styled("● ", Style::default().fg(Color::Red)),
        FooterState::Unavailable => Span::styled("✕ ", Style::default().fg(Color::Red)),
    };

    let clock = match footer.length_ms {
        Some(length) => format!(
            "{} / {}",
            format_clock(footer.position_ms),
            format_clock(length)
        ),
        None => format_clock(footer.position_ms),
    };

    let line = Line::from(vec![
        indicator,
        Span::raw(clock),
        Span::raw("   "),
        Span::styled(footer.hint.to_string(), Style::default().fg(Color::DarkGray)),
    ]);

    Paragraph::new(line).style(Style::default().fg(FOOTER_TEXT).bg(BACKGROUND))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(61_500), "1:01");
        assert_eq!(format_clock(600_000), "10:00");
    }

    #[test]
    fn test_canvas_size_leaves_footer_row() {
        assert_eq!(canvas_size(80, 24), (80, 46));
        assert_eq!(canvas_size(80, 1), (80, 0));
        assert_eq!(canvas_size(0, 0), (0, 0));
    }

    #[test]
    fn test_half_blocks_pack_two_rows_per_cell() {
        let mut bitmap = Bitmap::new(2, 4);
        bitmap.blend_pixel(0, 0, surface::Color::rgb(255, 0, 0));
        bitmap.blend_pixel(0, 1, surface::Color::rgb(0, 0, 255));

        let area = Rect::new(0, 0, 2, 2);
        let mut buf = Buffer::empty(area);
        HalfBlocks(&bitmap).render(area, &mut buf);

        let cell = &buf[(0, 0)];
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(255, 0, 0));
        assert_eq!(cell.bg, Color::Rgb(0, 0, 255));
        assert_eq!(buf[(1, 1)].fg, Color::Rgb(0, 0, 0));
    }
}
