//! Terminal user interface for the visualizer.
//!
//! Draws rendered frames on a Braille canvas with a one-line footer, and turns
//! terminal events into commands for the render loop.

use crossterm::{
    cursor::{Hide, Show},
    event::{self, DisableFocusChange, EnableFocusChange, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    style::{Color, Style},
    symbols::Marker,
    text::{Line as TextLine, Span},
    widgets::{
        canvas::{Canvas, Line, Painter, Shape},
        Paragraph,
    },
};
use std::io::{stdout, Stdout};
use std::time::Duration;

use crate::analysis::{Band, BandIntensities};
use crate::engine::VisualizerStatus;
use crate::visual::{ColorTheme, Point, Primitive, RenderedFrame, Rgb, ShapeFrame};

/// Virtual pixels per Braille dot. Shapes are sized in virtual pixels.
pub const PIXELS_PER_DOT: f32 = 8.0;

const FOOTER_HEIGHT: u16 = 1;

/// A terminal event translated for the render loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    Quit,
    TogglePause,
    ToggleBand(Band),
    CycleTheme,
    ScaleUp,
    ScaleDown,
    FocusLost,
    FocusGained,
    Resized,
}

/// Contents of the status line.
#[derive(Debug, Clone)]
pub struct Footer {
    pub status: VisualizerStatus,
    pub bands: BandIntensities,
    pub theme: ColorTheme,
    pub size_scale: f32,
}

/// Maps a key press to a command. Unbound keys yield `None`.
pub fn command_for_key(code: KeyCode, modifiers: KeyModifiers) -> Option<UiCommand> {
    let command = match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => UiCommand::Quit,
        KeyCode::Char('q') | KeyCode::Esc => UiCommand::Quit,
        KeyCode::Char(' ') | KeyCode::Char('p') => UiCommand::TogglePause,
        KeyCode::Char('b') => UiCommand::ToggleBand(Band::Bass),
        KeyCode::Char('m') => UiCommand::ToggleBand(Band::Mid),
        KeyCode::Char('t') => UiCommand::ToggleBand(Band::Treble),
        KeyCode::Char('c') => UiCommand::CycleTheme,
        KeyCode::Char('+') | KeyCode::Char('=') => UiCommand::ScaleUp,
        KeyCode::Char('-') => UiCommand::ScaleDown,
        _ => return None,
    };
    Some(command)
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// Paints every dot whose center lies inside a primitive.
struct FilledPrimitive<'a> {
    primitive: &'a Primitive,
    color: Color,
    /// Canvas height in virtual pixels, for flipping y
    height: f32,
}

impl Shape for FilledPrimitive<'_> {
    fn draw(&self, painter: &mut Painter) {
        let (min, max) = self.primitive.bounds();
        let half = PIXELS_PER_DOT / 2.0;
        let first = |v: f32| (v / PIXELS_PER_DOT).floor() * PIXELS_PER_DOT + half;

        let mut y = first(min.y);
        while y <= max.y {
            let mut x = first(min.x);
            while x <= max.x {
                if self.primitive.contains(Point::new(x, y)) {
                    if let Some((px, py)) = painter.get_point(x as f64, (self.height - y) as f64) {
                        painter.paint(px, py, self.color);
                    }
                }
                x += PIXELS_PER_DOT;
            }
            y += PIXELS_PER_DOT;
        }
    }
}

/// Trail segments, oldest first, fading from the background to the stroke color.
fn trail_segments(shape: &ShapeFrame, background: Rgb, height: f32) -> Vec<Line> {
    let count = shape.trail.len().saturating_sub(1);
    shape
        .trail
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            let age = 1.0 - (i + 1) as f32 / count as f32;
            Line {
                x1: pair[0].x as f64,
                y1: (height - pair[0].y) as f64,
                x2: pair[1].x as f64,
                y2: (height - pair[1].y) as f64,
                color: color(shape.stroke.mix(background, age)),
            }
        })
        .collect()
}

fn footer_line(footer: &Footer) -> TextLine<'static> {
    let indicator = match footer.status {
        VisualizerStatus::Running => Span::styled("● ", Style::default().fg(Color::Green)),
        VisualizerStatus::Paused => Span::styled("⏸ ", Style::default().fg(Color::Yellow)),
        VisualizerStatus::Unavailable(_) => Span::styled("✕ ", Style::default().fg(Color::Red)),
        VisualizerStatus::NotStarted | VisualizerStatus::Released => {
            Span::styled("○ ", Style::default().fg(Color::DarkGray))
        }
    };

    let status = match footer.status {
        VisualizerStatus::Running | VisualizerStatus::Paused => format!(
            "bass {:5.1}  mid {:5.1}  treble {:5.1}",
            footer.bands.bass, footer.bands.mid, footer.bands.treble
        ),
        ref other => other.to_string(),
    };

    TextLine::from(vec![
        indicator,
        Span::raw(status),
        Span::raw(format!("  │  {} ×{:.1}", footer.theme, footer.size_scale)),
        Span::styled(
            "  │  b m t bands · c theme · +/- size · space pause · q quit",
            Style::default().fg(Color::DarkGray),
        ),
    ])
}

/// Terminal UI for the visualizer.
pub struct VisualizerTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl VisualizerTui {
    /// Creates a new TUI instance and enters alternate screen mode.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    /// - If raw mode cannot be enabled
    /// - If alternate screen cannot be entered
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen, EnableFocusChange, Hide)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(VisualizerTui { terminal })
    }

    /// Size of the drawing area in virtual pixels.
    pub fn layout_size(&self) -> anyhow::Result<(f32, f32)> {
        let size = self.terminal.size()?;
        let rows = size.height.saturating_sub(FOOTER_HEIGHT);
        Ok((
            size.width as f32 * 2.0 * PIXELS_PER_DOT,
            rows as f32 * 4.0 * PIXELS_PER_DOT,
        ))
    }

    /// Draws one frame. Without a rendered frame only the footer is drawn.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn render(&mut self, rendered: Option<&RenderedFrame>, footer: &Footer) -> anyhow::Result<()> {
        let (width, height) = self.layout_size()?;
        let background = rendered
            .map(|frame| frame.background)
            .unwrap_or_else(|| footer.theme.palette().background);

        self.terminal.draw(|frame| {
            let area = frame.area();
            let canvas_area = Rect {
                height: area.height.saturating_sub(FOOTER_HEIGHT),
                ..area
            };
            let footer_area = Rect {
                y: area.y + canvas_area.height,
                height: area.height.min(FOOTER_HEIGHT),
                ..area
            };

            let canvas = Canvas::default()
                .marker(Marker::Braille)
                .background_color(color(background))
                .x_bounds([0.0, width as f64])
                .y_bounds([0.0, height as f64])
                .paint(|ctx| {
                    let Some(rendered) = rendered else {
                        return;
                    };
                    for shape in &rendered.shapes {
                        for segment in trail_segments(shape, background, height) {
                            ctx.draw(&segment);
                        }
                        ctx.draw(&FilledPrimitive {
                            primitive: &shape.primitive,
                            color: color(shape.fill),
                            height,
                        });
                        ctx.layer();
                    }
                });
            frame.render_widget(canvas, canvas_area);

            let footer_widget = Paragraph::new(footer_line(footer)).style(
                Style::default()
                    .fg(Color::Rgb(185, 207, 212))
                    .bg(Color::Rgb(0, 0, 0)),
            );
            frame.render_widget(footer_widget, footer_area);
        })?;

        Ok(())
    }

    /// Drains pending terminal events without blocking.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self) -> anyhow::Result<Vec<UiCommand>> {
        let mut commands = Vec::new();
        while event::poll(Duration::ZERO)? {
            let command = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    command_for_key(key.code, key.modifiers)
                }
                Event::FocusLost => Some(UiCommand::FocusLost),
                Event::FocusGained => Some(UiCommand::FocusGained),
                Event::Resize(_, _) => Some(UiCommand::Resized),
                _ => None,
            };
            if let Some(command) = command {
                tracing::debug!("Input: {:?}", command);
                commands.push(command);
            }
        }
        Ok(commands)
    }

    /// Cleans up terminal state and exits alternate screen mode.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    /// - If cursor cannot be shown
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            DisableFocusChange,
            LeaveAlternateScreen,
            Show
        )?;
        Ok(())
    }
}

impl Drop for VisualizerTui {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_bindings() {
        let none = KeyModifiers::NONE;
        assert_eq!(command_for_key(KeyCode::Char('c'), KeyModifiers::CONTROL), Some(UiCommand::Quit));
        assert_eq!(command_for_key(KeyCode::Char('c'), none), Some(UiCommand::CycleTheme));
        assert_eq!(command_for_key(KeyCode::Esc, none), Some(UiCommand::Quit));
        assert_eq!(command_for_key(KeyCode::Char(' '), none), Some(UiCommand::TogglePause));
        assert_eq!(
            command_for_key(KeyCode::Char('t'), none),
            Some(UiCommand::ToggleBand(Band::Treble))
        );
        assert_eq!(command_for_key(KeyCode::Char('-'), none), Some(UiCommand::ScaleDown));
        assert_eq!(command_for_key(KeyCode::Enter, none), None);
    }

    #[test]
    fn test_trail_fades_toward_background() {
        let shape = ShapeFrame {
            primitive: Primitive::Circle {
                center: Point::new(0.0, 0.0),
                radius: 1.0,
            },
            trail: vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(2.0, 0.0)],
            fill: Rgb(255, 0, 0),
            stroke: Rgb(200, 200, 200),
        };
        let segments = trail_segments(&shape, Rgb(0, 0, 0), 10.0);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].color, Color::Rgb(100, 100, 100));
        assert_eq!(segments[1].color, Color::Rgb(200, 200, 200));
        assert_eq!(segments[0].y1, 10.0);
    }

    #[test]
    fn test_short_trail_draws_nothing() {
        let shape = ShapeFrame {
            primitive: Primitive::Circle {
                center: Point::new(0.0, 0.0),
                radius: 1.0,
            },
            trail: vec![Point::new(0.0, 0.0)],
            fill: Rgb(255, 0, 0),
            stroke: Rgb(200, 200, 200),
        };
        assert!(trail_segments(&shape, Rgb(0, 0, 0), 10.0).is_empty());
    }

    #[test]
    fn test_filled_circle_paints_its_center() {
        let primitive = Primitive::Circle {
            center: Point::new(80.0, 80.0),
            radius: 20.0,
        };
        // 10x5 Braille cells = 20x20 dots = 160x160 virtual pixels
        let mut buffer = Buffer::empty(Rect::new(0, 0, 10, 5));
        let canvas = Canvas::default()
            .marker(Marker::Braille)
            .x_bounds([0.0, 160.0])
            .y_bounds([0.0, 160.0])
            .paint(|ctx| {
                ctx.draw(&FilledPrimitive {
                    primitive: &primitive,
                    color: Color::Red,
                    height: 160.0,
                });
            });
        canvas.render(buffer.area, &mut buffer);

        let painted = buffer.content().iter().filter(|cell| cell.fg == Color::Red).count();
        assert!(painted > 0);
        assert_eq!(buffer[(0, 0)].fg, Color::Reset);
    }

    #[test]
    fn test_footer_shows_status() {
        let footer = Footer {
            status: VisualizerStatus::Unavailable("no device".to_string()),
            bands: BandIntensities::default(),
            theme: ColorTheme::Green,
            size_scale: 1.5,
        };
        let text: String = footer_line(&footer)
            .spans
            .iter()
            .map(|span| span.content.as_ref())
            .collect();
        assert!(text.contains("audio unavailable: no device"));
        assert!(text.contains("green ×1.5"));
    }
}
