use crate::app::App;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
    Frame,
};
use tui_choropleth::legend::LegendSection;
use tui_choropleth::map::MapFrame;
use tui_choropleth::style::Rgb;

/// Legend panel width in columns
const LEGEND_WIDTH: u16 = 38;

const POPUP_WIDTH: u16 = 52;

/// Map block, legend panel and status bar
fn split(area: Rect) -> (Rect, Rect, Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map + legend
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(LEGEND_WIDTH)])
        .split(rows[0]);

    (cols[0], cols[1], rows[1])
}

fn map_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

/// Drawable map area inside the border, in terminal cells
pub fn map_inner(area: Rect) -> Rect {
    map_block("").inner(split(area).0)
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let (map_area, legend_area, status_area) = split(frame.area());

    render_map(frame, app, map_area);
    render_legend(frame, app, legend_area);
    render_status_bar(frame, app, status_area);

    if let Some(text) = &app.popup {
        render_popup(frame, text, map_area);
    }
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = map_block("Map");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let map = app.map_renderer.render(inner.width as usize, inner.height as usize);
    frame.render_widget(MapWidget { frame: map }, inner);
}

/// Braille map with marker labels overlaid
struct MapWidget {
    frame: MapFrame,
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for (row_idx, row) in self.frame.canvas.rows().enumerate().take(area.height as usize) {
            let y = area.y + row_idx as u16;
            for (col_idx, cell) in row.iter().enumerate().take(area.width as usize) {
                // Skip empty braille characters
                let Some(rgb) = cell.color.filter(|_| !cell.is_empty()) else {
                    continue;
                };
                let x = area.x + col_idx as u16;
                buf[(x, y)].set_char(cell.glyph()).set_fg(color(rgb));
            }
        }

        for label in &self.frame.labels {
            if label.row >= area.height || label.col >= area.width {
                continue;
            }
            let style = Style::default()
                .fg(Color::White)
                .bg(color(label.fill))
                .add_modifier(Modifier::BOLD);
            let y = area.y + label.row;
            let max_len = (area.width - label.col) as usize;
            for (i, ch) in label.text.chars().take(max_len).enumerate() {
                buf[(area.x + label.col + i as u16, y)].set_char(ch).set_style(style);
            }
        }
    }
}

/// Glyph for a marker diameter in screen pixels
fn size_glyph(diameter: f64) -> &'static str {
    if diameter <= 40.0 {
        "·"
    } else if diameter <= 60.0 {
        "•"
    } else if diameter <= 80.0 {
        "●"
    } else {
        "⬤"
    }
}

fn section_lines(index: usize, section: &LegendSection) -> Vec<Line<'static>> {
    let toggle = &section.toggle;
    let (mark, mark_style) = if toggle.checked {
        ("[x]", Style::default().fg(Color::Green))
    } else {
        ("[ ]", Style::default().fg(Color::DarkGray))
    };

    let mut lines = vec![Line::from(vec![
        Span::styled(format!("{} ", index + 1), Style::default().fg(Color::Yellow)),
        Span::styled(mark, mark_style),
        Span::raw(" "),
        Span::styled(toggle.label.clone(), Style::default().add_modifier(Modifier::BOLD)),
    ])];

    if let Some(caption) = section.caption {
        lines.push(Line::styled(format!("  {caption}"), Style::default().fg(Color::Gray)));
    }
    for (label, rgb) in section.swatches() {
        lines.push(Line::from(vec![
            Span::styled("  ██ ", Style::default().fg(color(rgb))),
            Span::raw(label),
        ]));
    }
    for (label, diameter) in section.sizes() {
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<2} ", size_glyph(diameter)), Style::default().fg(Color::White)),
            Span::raw(format!("{label} ({diameter:.0}px)")),
        ]));
    }
    lines.push(Line::raw(""));
    lines
}

fn render_legend(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {} ", app.session.config().title),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let legend = app.session.legend();
    let mut lines: Vec<Line> = legend
        .iter()
        .enumerate()
        .flat_map(|(i, section)| section_lines(i, section))
        .collect();

    for failed in app.session.failed_layers() {
        let name = app
            .session
            .config()
            .layer(&failed.layer_id)
            .map_or(failed.layer_id.as_str(), |layer| layer.name.as_str());
        lines.push(Line::styled(format!("✗ {name} (unavailable)"), Style::default().fg(Color::Red)));
        lines.push(Line::styled(format!("  {}", failed.reason), Style::default().fg(Color::DarkGray)));
    }
    if lines.is_empty() {
        lines.push(Line::styled("Loading layers…", Style::default().fg(Color::DarkGray)));
    }

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_popup(frame: &mut Frame, text: &str, map_area: Rect) {
    let width = POPUP_WIDTH.min(map_area.width);
    let inner_width = width.saturating_sub(2).max(1) as usize;
    // Rough wrapped height
    let text_rows: usize = text
        .lines()
        .map(|line| line.chars().count().div_ceil(inner_width).max(1))
        .sum();
    let height = (text_rows as u16 + 2).min(map_area.height);

    let area = Rect::new(
        map_area.x + (map_area.width - width) / 2,
        map_area.y + (map_area.height - height) / 2,
        width,
        height,
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(Span::styled(" Feature ", Style::default().fg(Color::Yellow)))
        .title_bottom(Span::styled(" Esc ", Style::default().fg(Color::DarkGray)));

    let paragraph = Paragraph::new(text.to_string()).block(block).wrap(Wrap { trim: true });
    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
    ];

    let load_status = app.load_status();
    if !load_status.is_empty() {
        spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(load_status, Style::default().fg(Color::Magenta)));
    }

    spans.push(Span::styled(
        " | hjkl:pan +/-:zoom 1-9:layers click:info r:reset q:quit",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_inner_leaves_room_for_legend_and_status() {
        let inner = map_inner(Rect::new(0, 0, 120, 40));
        assert_eq!(inner, Rect::new(1, 1, 120 - LEGEND_WIDTH - 2, 40 - 1 - 2));
    }

    #[test]
    fn test_size_glyph_grows() {
        let glyphs: Vec<_> = [40.0, 60.0, 80.0, 120.0].into_iter().map(size_glyph).collect();
        assert_eq!(glyphs, vec!["·", "•", "●", "⬤"]);
    }
}
