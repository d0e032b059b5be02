use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::model::{LogLevel, RunState, TaskStatus};
use crate::{App, InputMode};

#[derive(Clone, Copy)]
pub struct PulseTheme {
    bg: Color,
    surface: Color,
    border: Color,
    title: Color,
    text: Color,
    muted: Color,
    accent: Color,
    ok: Color,
    warn: Color,
    critical: Color,
}

pub fn pulse_theme() -> PulseTheme {
    PulseTheme {
        bg: Color::Rgb(11, 18, 32),
        surface: Color::Rgb(17, 26, 46),
        border: Color::Rgb(71, 85, 105),
        title: Color::Rgb(191, 219, 254),
        text: Color::Rgb(226, 232, 240),
        muted: Color::Rgb(148, 163, 184),
        accent: Color::Rgb(56, 189, 248),
        ok: Color::Rgb(34, 197, 94),
        warn: Color::Rgb(245, 158, 11),
        critical: Color::Rgb(239, 68, 68),
    }
}

pub fn render_ui(frame: &mut Frame, app: &App) {
    let size = frame.size();
    let theme = pulse_theme();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(size);
    frame.render_widget(render_header(app, theme, size.width), layout[0]);
    render_panels(frame, app, theme, layout[1]);
    frame.render_widget(render_footer(app, theme, size.width), layout[2]);
}

fn render_header(app: &App, theme: PulseTheme, width: u16) -> Paragraph<'static> {
    let inner_width = width.saturating_sub(4) as usize;
    let status = app.store.status();
    let backend = status.map(|s| s.status).unwrap_or(RunState::Stopped);
    let backend_color = if backend.is_running() {
        theme.ok
    } else {
        theme.critical
    };
    let (feed_label, feed_color) = if app.store.connected() {
        ("online", theme.ok)
    } else {
        ("offline", theme.warn)
    };

    let mut fields = vec![
        format!(
            "Uptime: {}",
            status
                .map(|s| format_uptime(s.uptime))
                .unwrap_or_else(|| "-".to_string())
        ),
        format!(
            "Agents: {}",
            status.map(|s| s.active_agents).unwrap_or(0)
        ),
        format!(
            "Completed: {}",
            status.map(|s| s.tasks_completed).unwrap_or(0)
        ),
    ];
    if let Some(current) = status.and_then(|s| s.current_task.as_deref()) {
        fields.push(format!("Current: {}", ellipsize(current, 32)));
    }
    let tail = format!("  |  {}", fields.join("  |  "));

    let status_line = Line::from(vec![
        Span::styled("Backend: ", Style::default().fg(theme.muted)),
        Span::styled(backend.to_string(), Style::default().fg(backend_color)),
        Span::styled("  |  ".to_string(), Style::default().fg(theme.muted)),
        Span::styled("Feed: ", Style::default().fg(theme.muted)),
        Span::styled(feed_label.to_string(), Style::default().fg(feed_color)),
        Span::styled(
            ellipsize(&tail, inner_width.max(12)),
            Style::default().fg(theme.text),
        ),
    ]);

    let snapshot_line = match app.store.last_snapshot_at() {
        Some(at) => format!("Last snapshot: {}", at.format("%H:%M:%S")),
        None => "Last snapshot: none yet".to_string(),
    };

    Paragraph::new(Text::from(vec![
        status_line,
        Line::from(Span::styled(
            ellipsize(&snapshot_line, inner_width.max(12)),
            Style::default().fg(theme.muted),
        )),
    ]))
    .style(Style::default().fg(theme.text).bg(theme.bg))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border))
            .style(Style::default().bg(theme.bg))
            .title(Span::styled(
                "Nexus Pulse",
                Style::default()
                    .fg(theme.title)
                    .add_modifier(Modifier::BOLD),
            )),
    )
}

fn render_panels(frame: &mut Frame, app: &App, theme: PulseTheme, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);
    frame.render_widget(render_tasks(app, theme), columns[0]);
    frame.render_widget(render_logs(app, theme, columns[1]), columns[1]);
}

fn render_tasks(app: &App, theme: PulseTheme) -> List<'static> {
    let items: Vec<ListItem> = app
        .store
        .tasks()
        .iter()
        .map(|task| {
            let marker_color = match task.status {
                TaskStatus::Running => theme.accent,
                TaskStatus::Completed => theme.ok,
                TaskStatus::Failed => theme.critical,
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:>9} ", task.status.as_str()),
                    Style::default().fg(marker_color),
                ),
                Span::styled(
                    format!("#{} ", task.id),
                    Style::default().fg(theme.muted),
                ),
                Span::styled(
                    ellipsize(&task.name, 48),
                    Style::default().fg(theme.text),
                ),
            ]))
        })
        .collect();
    let active = app
        .store
        .tasks()
        .iter()
        .filter(|task| !task.status.is_done())
        .count();
    List::new(items)
        .style(Style::default().fg(theme.text).bg(theme.surface))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border))
                .style(Style::default().bg(theme.surface))
                .title(Span::styled(
                    format!("Tasks ({active} active / {})", app.store.tasks().len()),
                    Style::default()
                        .fg(theme.title)
                        .add_modifier(Modifier::BOLD),
                )),
        )
}

fn render_logs(app: &App, theme: PulseTheme, area: Rect) -> Paragraph<'static> {
    let visible = area.height.saturating_sub(2) as usize;
    let total = app.store.logs().len();
    if app.store.logs().is_empty() {
        return Paragraph::new(Line::from(Span::styled(
            "waiting for logs".to_string(),
            Style::default().fg(theme.muted),
        )))
        .style(Style::default().fg(theme.text).bg(theme.surface))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border))
                .style(Style::default().bg(theme.surface))
                .title(Span::styled(
                    "Logs",
                    Style::default()
                        .fg(theme.title)
                        .add_modifier(Modifier::BOLD),
                )),
        );
    }
    let lines: Vec<Line> = app
        .store
        .logs()
        .iter()
        .skip(total.saturating_sub(visible))
        .map(|entry| {
            let level_color = match entry.level {
                LogLevel::Info => theme.text,
                LogLevel::Warning => theme.warn,
                LogLevel::Error => theme.critical,
            };
            Line::from(vec![
                Span::styled(
                    format!("{:>7} ", entry.level.as_str()),
                    Style::default().fg(level_color),
                ),
                Span::styled(entry.message.clone(), Style::default().fg(theme.text)),
            ])
        })
        .collect();
    Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(theme.text).bg(theme.surface))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border))
                .style(Style::default().bg(theme.surface))
                .title(Span::styled(
                    format!("Logs ({total})"),
                    Style::default()
                        .fg(theme.title)
                        .add_modifier(Modifier::BOLD),
                )),
        )
}

fn render_footer(app: &App, theme: PulseTheme, width: u16) -> Paragraph<'static> {
    let inner_width = width.saturating_sub(4) as usize;
    let line = match app.input {
        InputMode::Submit => Line::from(vec![
            Span::styled("task> ", Style::default().fg(theme.accent)),
            Span::styled(
                format!("{}_", app.input_buffer),
                Style::default().fg(theme.text),
            ),
        ]),
        InputMode::None => {
            let text = match app.status_note.as_deref() {
                Some(note) => format!("Last action: {}", ellipsize(note, inner_width.max(12))),
                None => "s start  x stop  i submit task  r refresh  q quit".to_string(),
            };
            Line::from(Span::styled(text, Style::default().fg(theme.muted)))
        }
    };
    Paragraph::new(line)
        .style(Style::default().fg(theme.text).bg(theme.bg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border))
                .style(Style::default().bg(theme.bg)),
        )
}

pub fn format_uptime(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{hours}h {minutes:02}m {secs:02}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs:02}s")
    } else {
        format!("{secs}s")
    }
}

pub fn ellipsize(input: &str, max: usize) -> String {
    if input.chars().count() <= max {
        return input.to_string();
    }
    let mut out: String = input.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
