use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Points, Rectangle},
        Block, Borders, Paragraph, Widget,
    },
};
use unicode_width::UnicodeWidthStr;
use webbrowser::Browser;

use crate::app::{App, Mode};

const OPEN_FOLDER_LABEL: &str = "Open your Noita sessions folder";
const HORIZONTAL_MARGIN: u16 = 1;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(3), // button / folder prompt
                Constraint::Min(3),    // map
                Constraint::Length(1), // status
                Constraint::Length(1), // key help
            ])
            .split(area);

        render_button(self, chunks[0], buf);
        render_map_preview(self, chunks[1], buf);

        let status = match (&self.status, self.loaded_at) {
            (Some(status), Some(at)) => format!("{} ({})", status, at.format("%H:%M:%S")),
            (Some(status), None) => status.clone(),
            (None, _) => "no sessions loaded yet".to_string(),
        };
        Paragraph::new(Span::styled(status, bold_style)).render(chunks[2], buf);

        let help = match self.mode {
            Mode::Browse => {
                let mut keys = String::from("(o)pen folder");
                if self.view.is_painted() && Browser::is_available() {
                    keys.push_str(" / (v)iew png");
                }
                keys.push_str(" / (q)uit");
                keys
            }
            Mode::EnterFolder(_) => "(enter) load / (esc) cancel".to_string(),
        };
        Paragraph::new(Span::styled(help, dim_style))
            .alignment(Alignment::Right)
            .render(chunks[3], buf);
    }
}

fn render_button(app: &App, area: Rect, buf: &mut Buffer) {
    match &app.mode {
        Mode::Browse => {
            let line = Line::from(vec![
                Span::styled("[o] ", Style::default().fg(Color::Yellow)),
                Span::styled(OPEN_FOLDER_LABEL, Style::default().add_modifier(Modifier::BOLD)),
            ]);
            Paragraph::new(line)
                .block(Block::default().borders(Borders::ALL))
                .alignment(Alignment::Center)
                .render(area, buf);
        }
        Mode::EnterFolder(input) => {
            let inner_width = area.width.saturating_sub(3) as usize;
            let shown = tail_fitting(input, inner_width);
            Paragraph::new(Line::from(vec![
                Span::raw(shown),
                Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
            ]))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(OPEN_FOLDER_LABEL)
                    .border_style(Style::default().fg(Color::Yellow)),
            )
            .render(area, buf);
        }
    }
}

/// Keep the end of `text` that fits in `width` columns; the end of a path is
/// the part being edited.
fn tail_fitting(text: &str, width: usize) -> &str {
    if text.width() <= width {
        return text;
    }
    let mut start = 0;
    for (idx, _) in text.char_indices() {
        if text[idx..].width() <= width {
            start = idx;
            break;
        }
        start = text.len();
    }
    &text[start..]
}

fn render_map_preview(app: &App, area: Rect, buf: &mut Buffer) {
    let map = app.view.map();
    let (width, height) = (f64::from(map.width), f64::from(map.height));

    // the canvas y axis points up, image rows go down
    let coords: Vec<(f64, f64)> = app
        .store
        .sessions()
        .unwrap_or_default()
        .iter()
        .map(|rec| map.transform.apply(rec))
        .map(|p| (p.x, height - p.y))
        .collect();

    let title = match app.store.sessions() {
        Some(sessions) => format!("map ({} markers)", sessions.len()),
        None => "map".to_string(),
    };

    Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .marker(Marker::Braille)
        .x_bounds([0.0, width])
        .y_bounds([0.0, height])
        .paint(|ctx| {
            ctx.draw(&Rectangle {
                x: 0.0,
                y: 0.0,
                width,
                height,
                color: Color::DarkGray,
            });
            ctx.layer();
            ctx.draw(&Points {
                coords: &coords,
                color: Color::Red,
            });
        })
        .render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, MapConfig};
    use crate::session::SessionRecord;
    use ratatui::{backend::TestBackend, Terminal};

    fn small_app() -> App {
        App::new(Config {
            sessions_dir: None,
            background_image: None,
            output: None,
            map: MapConfig {
                width: 16,
                height: 16,
                ..MapConfig::default()
            },
        })
    }

    fn draw(app: &App) -> String {
        let backend = TestBackend::new(80, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| f.render_widget(app, f.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn idle_screen_shows_button() {
        let screen = draw(&small_app());
        assert!(screen.contains(OPEN_FOLDER_LABEL));
        assert!(screen.contains("no sessions loaded yet"));
        assert!(screen.contains("(o)pen folder"));
    }

    #[test]
    fn prompt_shows_typed_path() {
        let mut app = small_app();
        app.mode = Mode::EnterFolder("/home/me/sessions".into());
        let screen = draw(&app);
        assert!(screen.contains("/home/me/sessions_"));
        assert!(screen.contains("(enter) load"));
    }

    #[test]
    fn loaded_screen_counts_markers() {
        let mut app = small_app();
        app.store
            .replace(vec![SessionRecord::new(1.0, 1.0), SessionRecord::new(2.0, 2.0)]);
        let screen = draw(&app);
        assert!(screen.contains("map (2 markers)"));
    }

    #[test]
    fn tail_fitting_keeps_path_end() {
        assert_eq!(tail_fitting("abc", 5), "abc");
        assert_eq!(tail_fitting("/a/long/path", 4), "path");
        assert_eq!(tail_fitting("abc", 0), "");
    }
}
