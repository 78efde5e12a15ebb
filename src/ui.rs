use crate::app::{App, Focus};
use crate::braille;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 24;

/// Max scroll for help content (generous to account for text wrapping on small screens)
pub const HELP_CONTENT_LINES: u16 = 40;

/// Number of lines in controls content
pub const CONTROLS_CONTENT_LINES: u16 = 12;

const HIGHLIGHT_COLOR: Color = Color::Yellow;
const DIM_TEXT_COLOR: Color = Color::Gray;

/// Creates a standard styled block with rounded borders
fn styled_block(title: &str, accent: Color) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(accent))
        .title(title)
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if app.fullscreen_mode {
        render_canvas(frame, area, app);
    } else {
        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(area);

        render_sidebar(frame, layout[0], app);
        render_canvas(frame, layout[1], app);
    }

    if app.show_help {
        render_help_overlay(frame, area, app);
    }
}

/// Canvas area inside its border for a terminal of `frame_area`
pub fn get_canvas_area(frame_area: Rect, fullscreen: bool) -> Rect {
    let left = if fullscreen { 0 } else { SIDEBAR_WIDTH.min(frame_area.width) };
    let outer = Rect {
        x: frame_area.x + left,
        y: frame_area.y,
        width: frame_area.width - left,
        height: frame_area.height,
    };
    Block::default().borders(Borders::ALL).inner(outer)
}

/// Visible lines of the controls box for a terminal of the given height
pub fn get_controls_visible_lines(terminal_height: u16) -> u16 {
    // Status (7) and parameters (5) above, borders (2) around
    terminal_height.saturating_sub(7 + 5 + 2)
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Status
            Constraint::Length(5), // Parameters
            Constraint::Min(6),    // Controls
        ])
        .split(area);

    render_status_box(frame, sections[0], app);
    render_params_box(frame, sections[1], app);
    render_controls_box(frame, sections[2], app);
}

fn render_status_box(frame: &mut Frame, area: Rect, app: &App) {
    let accent = app.theme.accent();
    let text = app.theme.text();
    let block = styled_block(" Architectural Grid ", accent);

    let (status_text, status_color) = if !app.is_mounted() {
        ("UNMOUNTED", Color::DarkGray)
    } else if app.paused {
        ("PAUSED", HIGHLIGHT_COLOR)
    } else {
        ("RUNNING", accent)
    };

    let stats = app.last_stats();
    let mut content = vec![
        Line::from(Span::styled(status_text, Style::default().fg(status_color))),
        Line::from(Span::styled(format!("Frame {}", app.frames()), Style::default().fg(text))),
        Line::from(Span::styled(format!("{} particles", stats.particles), Style::default().fg(text))),
        Line::from(Span::styled(
            format!("{} links / {} pairs", stats.connections, app.settings.pair_checks()),
            Style::default().fg(DIM_TEXT_COLOR),
        )),
    ];
    if let Some(message) = &app.status_message {
        content.push(Line::from(Span::styled(message.clone(), Style::default().fg(HIGHLIGHT_COLOR))));
    }

    let paragraph = Paragraph::new(content).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_params_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Parameters ", app.theme.accent());
    let text = app.theme.text();

    let make_line = |label: &str, value: String, focused: bool| {
        let prefix = if focused { "> " } else { "  " };
        let style = if focused {
            Style::default().fg(HIGHLIGHT_COLOR)
        } else {
            Style::default().fg(text)
        };
        Line::from(Span::styled(format!("{}{}: {}", prefix, label, value), style))
    };

    let content = vec![
        make_line(
            "Particles",
            format!("{}", app.settings.particle_count),
            app.focus == Focus::Particles,
        ),
        make_line("Scale", format!("{}px/dot", app.pixels_per_dot), app.focus == Focus::Scale),
        make_line("Theme", app.theme.name().to_string(), app.focus == Focus::Theme),
    ];

    // Calculate scroll to keep focused item visible based on actual area
    let focus_line = app.focus.line_index();
    let visible_height = area.height.saturating_sub(2); // minus borders
    let content_height = content.len() as u16;

    let scroll = if visible_height == 0 || visible_height >= content_height || focus_line < visible_height {
        0
    } else {
        focus_line.saturating_sub(visible_height - 1)
    };

    let paragraph = Paragraph::new(content).block(block).scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_controls_box(frame: &mut Frame, area: Rect, app: &App) {
    let key_style = Style::default().fg(HIGHLIGHT_COLOR);
    let desc_style = Style::default().fg(DIM_TEXT_COLOR);

    let make_control = |key: &str, desc: &str| -> Line<'_> {
        Line::from(vec![
            Span::styled(format!("{:>5}", key), key_style),
            Span::styled(format!(" {}", desc), desc_style),
        ])
    };

    let content = vec![
        make_control("Space", "pause/resume"),
        make_control("H/?", "help"),
        make_control("M", if app.is_mounted() { "unmount" } else { "mount" }),
        make_control("R", "respawn all"),
        make_control("T", "theme"),
        make_control("+/-", "particles"),
        make_control("[/]", "dot scale"),
        make_control("Tab", "select param"),
        make_control("↑/↓", "adjust param"),
        make_control("V", "fullscreen"),
        make_control("P", "save PNG"),
        make_control("Q", "quit"),
    ];

    let content_height = content.len() as u16;
    let visible_height = area.height.saturating_sub(2); // minus borders
    let max_scroll = content_height.saturating_sub(visible_height);

    let title = if max_scroll > 0 { " Controls (↑↓) " } else { " Controls " };
    let block = styled_block(title, app.theme.accent());

    let paragraph = Paragraph::new(content)
        .block(block)
        .scroll((app.controls_scroll.min(max_scroll), 0));
    frame.render_widget(paragraph, area);
}

fn render_canvas(frame: &mut Frame, area: Rect, app: &App) {
    let [r, g, b] = app.theme.background();
    let background = Color::Rgb(r, g, b);
    let block = styled_block("", app.theme.accent()).style(Style::default().bg(background));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(raster) = app.raster() else {
        return;
    };

    let cells = braille::render_to_braille(raster, inner.width, inner.height, app.theme.background());
    let buffer = frame.buffer_mut();
    for cell in cells {
        let x = inner.x + cell.x;
        let y = inner.y + cell.y;

        if x < inner.x + inner.width && y < inner.y + inner.height {
            if let Some(target) = buffer.cell_mut((x, y)) {
                target.set_char(cell.char).set_fg(cell.color).set_bg(background);
            }
        }
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect, app: &App) {
    let accent = app.theme.accent();
    let text = app.theme.text();

    // Center the help dialog within the canvas
    let canvas = get_canvas_area(area, app.fullscreen_mode);
    let help_width = 56.min(canvas.width.saturating_sub(2));
    let help_height = area.height.saturating_sub(4).min(30);
    let x = canvas.x + canvas.width.saturating_sub(help_width) / 2;
    let y = area.y + area.height.saturating_sub(help_height) / 2;

    let help_area = Rect {
        x,
        y,
        width: help_width,
        height: help_height,
    };

    frame.render_widget(Clear, help_area);

    let heading = |s: &'static str| Line::from(Span::styled(s, Style::default().fg(HIGHLIGHT_COLOR)));
    let content = vec![
        Line::from(""),
        Line::from(Span::styled("ARCHITECTURAL GRID", Style::default().fg(accent))),
        Line::from(""),
        Line::from(
            "Drifting particles over a static blueprint grid. Particles near the pointer get pulled, nearby particles are linked, and each fades out and respawns as it ages.",
        ),
        Line::from(""),
        heading("POINTER:"),
        Line::from("Move the mouse over the canvas. Particles within 150px are drawn toward it."),
        Line::from(""),
        heading("LIFECYCLE:"),
        Line::from("M unmounts the background, stopping its frame loop. Pressing M again mounts a fresh one. R respawns every particle."),
        Line::from(""),
        heading("THEMES:"),
        Line::from("Light, Dark and Matrix. Matrix draws in green. The choice is remembered between runs."),
        Line::from(""),
        heading("SCALE:"),
        Line::from("[ and ] change how many logical pixels each braille dot covers. Larger scales show more of the field."),
        Line::from(""),
        heading("BASIC CONTROLS:"),
        Line::from("Space=Pause, T=Theme, +/-=Particles, V=Fullscreen, P=Snapshot, Tab/Arrows=Adjust, Q=Quit"),
        Line::from(""),
    ];

    let content_height = content.len() as u16;
    let visible_height = help_height.saturating_sub(2); // minus borders
    let max_scroll = content_height.saturating_sub(visible_height);

    let title = if max_scroll > 0 {
        " Help (J/K scroll, H to close) "
    } else {
        " Help (H to close) "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(HIGHLIGHT_COLOR))
        .title(title);

    let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(text))
        .wrap(Wrap { trim: true })
        .scroll((app.help_scroll, 0));

    frame.render_widget(paragraph, help_area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canvas_area_excludes_sidebar_and_border() {
        let canvas = get_canvas_area(Rect::new(0, 0, 100, 30), false);
        assert_eq!(canvas, Rect::new(SIDEBAR_WIDTH + 1, 1, 100 - SIDEBAR_WIDTH - 2, 28));
    }

    #[test]
    fn test_fullscreen_canvas() {
        let canvas = get_canvas_area(Rect::new(0, 0, 80, 24), true);
        assert_eq!(canvas, Rect::new(1, 1, 78, 22));
    }

    #[test]
    fn test_tiny_terminal_gives_empty_canvas() {
        let canvas = get_canvas_area(Rect::new(0, 0, 10, 1), false);
        assert_eq!(canvas.width, 0);
        assert_eq!(canvas.height, 0);
    }
}
