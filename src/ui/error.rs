//! Full-screen error display for failures that end a run.

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Paragraph, Wrap},
};
use std::io::{self, Stdout};
use std::time::Duration;

const ERROR_BACKGROUND: Color = Color::Rgb(74, 20, 20);
const ERROR_FOREGROUND: Color = Color::Rgb(255, 205, 210);

/// Centers a block of `height` rows spanning 80% of the width.
fn centered(area: Rect, height: u16) -> Rect {
    let width = area.width * 4 / 5;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Error screen shown before exiting on a fatal error.
pub struct ErrorScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl ErrorScreen {
    /// Creates a new error screen and enters alternate screen mode.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    /// - If raw mode cannot be enabled
    /// - If alternate screen cannot be entered
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(ErrorScreen { terminal })
    }

    /// Shows `error_message` centered on a dark red screen until a key is pressed.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn show_error(&mut self, error_message: &str) -> anyhow::Result<()> {
        let mut text: Vec<Line> = error_message.lines().map(Line::from).collect();
        text.push(Line::default());
        text.push(Line::from(Span::styled(
            "Press any key to exit",
            Style::default().add_modifier(Modifier::DIM),
        )));

        loop {
            self.terminal.draw(|frame| {
                let area = frame.area();
                let style = Style::default().fg(ERROR_FOREGROUND).bg(ERROR_BACKGROUND);
                frame.render_widget(Block::default().style(style), area);

                let paragraph = Paragraph::new(text.clone())
                    .style(style)
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true });
                frame.render_widget(paragraph, centered(area, text.len() as u16 + 2));
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Cleans up terminal state and exits alternate screen mode.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    /// - If cursor cannot be shown
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for ErrorScreen {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_fits_inside() {
        let area = Rect::new(0, 0, 100, 40);
        let inner = centered(area, 6);
        assert_eq!(inner, Rect::new(10, 17, 80, 6));

        let tiny = centered(Rect::new(0, 0, 10, 3), 6);
        assert_eq!(tiny.height, 3);
        assert_eq!(tiny.y, 0);
    }
}
