use crate::app::App;
use crate::config::ThemeConfig;
use crate::domain::{CommandEntry, ShellKind, ViewMode};
use crate::filter::FilterState;
use crate::paths;
use crate::tree::TreeRow;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::{Alignment, Color, Line, Modifier, Span, Style};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub accent: Color,
    pub selection_fg: Color,
    pub selection_bg: Color,
    pub muted: Color,
    pub error: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Cyan,
            selection_fg: Color::Black,
            selection_bg: Color::LightGreen,
            muted: Color::DarkGray,
            error: Color::LightRed,
        }
    }
}

impl Theme {
    pub fn from_config(config: &ThemeConfig) -> Self {
        let fallback = Self::default();
        Self {
            accent: parse_color(&config.accent, fallback.accent),
            selection_fg: parse_color(&config.selection_fg, fallback.selection_fg),
            selection_bg: parse_color(&config.selection_bg, fallback.selection_bg),
            muted: parse_color(&config.muted, fallback.muted),
            error: parse_color(&config.error, fallback.error),
        }
    }

    fn selection(&self) -> Style {
        Style::default()
            .fg(self.selection_fg)
            .bg(self.selection_bg)
            .add_modifier(Modifier::BOLD)
    }
}

fn parse_color(name: &str, fallback: Color) -> Color {
    name.trim().parse().unwrap_or(fallback)
}

pub fn draw(frame: &mut Frame, app: &App, theme: &Theme) {
    if let Some(message) = &app.last_error {
        draw_error(frame, message, theme);
        return;
    }

    let mut constraints = vec![Constraint::Length(1), Constraint::Length(1)];
    if app.show_filters {
        constraints.push(Constraint::Length(3));
    }
    constraints.push(Constraint::Min(3));
    constraints.push(Constraint::Length(1));

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(frame.area());

    draw_header(frame, app, rows[0], theme);
    draw_breadcrumbs(frame, app, rows[1], theme);
    let mut next = 2;
    if app.show_filters {
        draw_filter_panel(frame, app.filter(), rows[2], theme);
        next = 3;
    }

    let body = rows[next];
    if app.show_preview {
        let split = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(body);
        draw_list(frame, app, split[0], theme);
        draw_preview(frame, app, split[1], theme);
    } else {
        draw_list(frame, app, body, theme);
    }

    draw_footer(frame, app, rows[next + 1], theme);
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let mut spans = vec![
        Span::styled(
            " dirhist ",
            Style::default()
                .fg(theme.selection_fg)
                .bg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            app.view.title(),
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            format!("{} shown", app.visible_len()),
            Style::default().fg(theme.muted),
        ),
    ];
    if app.busy {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            " loading ",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_breadcrumbs(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let last = app.breadcrumbs.len().saturating_sub(1);
    let mut spans = Vec::new();
    for (idx, crumb) in app.breadcrumbs.iter().enumerate() {
        if idx > 1 || (idx == 1 && !app.breadcrumbs[0].ends_with('/')) {
            spans.push(Span::styled("/", Style::default().fg(theme.muted)));
        }
        let label = if idx == 0 {
            crumb.as_str()
        } else {
            paths::last_segment(crumb)
        };
        let style = if idx == last {
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        spans.push(Span::styled(label.to_string(), style));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_filter_panel(frame: &mut Frame, filter: &FilterState, area: Rect, theme: &Theme) {
    let paragraph = Paragraph::new(Line::from(filter_summary(filter))).block(
        Block::default()
            .title(" Filters ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.muted)),
    );
    frame.render_widget(paragraph, area);
}

fn filter_summary(filter: &FilterState) -> String {
    let query = if filter.query().is_empty() {
        "-".to_string()
    } else {
        format!("\"{}\"", filter.query())
    };
    let shell = match filter.shell() {
        ShellKind::Unknown => "all",
        other => other.label(),
    };
    let date = filter.date();
    let date = if !date.enabled {
        "off".to_string()
    } else {
        match (date.start, date.end) {
            (Some(start), Some(end)) => format!(
                "{} ({} .. {})",
                date.preset.label(),
                start.format("%m-%d"),
                end.format("%m-%d")
            ),
            _ => date.preset.label().to_string(),
        }
    };
    format!("query: {query}   shell: {shell} [s]   date: {date} [d/D/1-6]   clear [c]")
}

fn draw_list(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let block = Block::default()
        .title(format!(" {} ", app.view.title()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent));

    if app.visible_len() == 0 {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            empty_message(app),
            Style::default().fg(theme.muted),
        )))
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let start = app.scroll_offset();
    let end = (start + app.visible_lines()).min(app.visible_len());
    let items: Vec<ListItem> = match app.view {
        ViewMode::Tree => app.tree_rows()[start..end]
            .iter()
            .map(|row| tree_item(row, theme))
            .collect(),
        ViewMode::History | ViewMode::Search => app.filtered[start..end]
            .iter()
            .map(|entry| history_item(entry, theme))
            .collect(),
    };

    let list = List::new(items)
        .block(block)
        .highlight_style(theme.selection())
        .highlight_symbol("▶ ");

    let mut state = ListState::default();
    state.select(Some(app.selected_index.saturating_sub(start)));
    frame.render_stateful_widget(list, area, &mut state);
}

fn empty_message(app: &App) -> String {
    if app.busy {
        return "Loading...".to_string();
    }
    match app.view {
        ViewMode::Tree => "No directories with recorded history yet.".to_string(),
        ViewMode::History | ViewMode::Search if app.commands.is_empty() => {
            format!("No commands recorded in {}.", app.current_dir)
        }
        ViewMode::History | ViewMode::Search => {
            "No commands match the current filters. Press c to clear them.".to_string()
        }
    }
}

fn history_item(entry: &CommandEntry, theme: &Theme) -> ListItem<'static> {
    let mut spans = vec![
        Span::styled(
            entry.timestamp.format(TIME_FORMAT).to_string(),
            Style::default().fg(theme.muted),
        ),
        Span::raw("  "),
        Span::styled(
            format!("{:<10}", entry.shell.label()),
            Style::default().fg(theme.accent),
        ),
        Span::raw(entry.command.clone()),
    ];
    if entry.exit_code != 0 {
        spans.push(Span::styled(
            format!("  [{}]", entry.exit_code),
            Style::default().fg(theme.error),
        ));
    }
    ListItem::new(Line::from(spans))
}

fn tree_label(row: &TreeRow) -> String {
    let marker = match (row.has_children, row.expanded) {
        (true, true) => "[-] ",
        (true, false) => "[+] ",
        (false, _) => "    ",
    };
    let name = if row.level == 0 {
        row.stat.path.as_str()
    } else {
        paths::last_segment(&row.stat.path)
    };
    format!(
        "{}{marker}{name}  ({})",
        "  ".repeat(row.level),
        row.stat.command_count
    )
}

fn tree_item(row: &TreeRow, theme: &Theme) -> ListItem<'static> {
    let style = if row.stat.active {
        Style::default()
    } else {
        Style::default()
            .fg(theme.muted)
            .add_modifier(Modifier::DIM)
    };
    ListItem::new(Line::from(Span::styled(tree_label(row), style)))
}

fn draw_preview(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let label = |text: &'static str| Span::styled(text, Style::default().fg(theme.muted));

    let lines = if let Some(entry) = app.selected_entry() {
        let tags = if entry.tags.is_empty() {
            "-".to_string()
        } else {
            entry.tags.iter().cloned().collect::<Vec<_>>().join(", ")
        };
        vec![
            Line::from(Span::styled(
                entry.command.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(vec![label("dir:      "), Span::raw(entry.directory.clone())]),
            Line::from(vec![
                label("time:     "),
                Span::raw(entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()),
            ]),
            Line::from(vec![label("shell:    "), Span::raw(entry.shell.label())]),
            Line::from(vec![
                label("exit:     "),
                Span::raw(entry.exit_code.to_string()),
            ]),
            Line::from(vec![
                label("duration: "),
                Span::raw(format!("{} ms", entry.duration_ms)),
            ]),
            Line::from(vec![label("tags:     "), Span::raw(tags)]),
        ]
    } else if let Some(row) = app.selected_row() {
        vec![
            Line::from(Span::styled(
                row.stat.path.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(vec![
                label("commands: "),
                Span::raw(row.stat.command_count.to_string()),
            ]),
            Line::from(vec![
                label("last use: "),
                Span::raw(row.stat.last_used.format(TIME_FORMAT).to_string()),
            ]),
            Line::from(vec![
                label("on disk:  "),
                Span::raw(if row.stat.active { "yes" } else { "no" }),
            ]),
        ]
    } else {
        vec![Line::from(label("Nothing selected."))]
    };

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(" Preview ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.muted)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let line = if app.search_mode {
        Line::from(vec![
            Span::styled("/", Style::default().fg(theme.accent)),
            Span::raw(app.filter().query().to_string()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
            Span::styled(
                "   enter keep  esc cancel",
                Style::default().fg(theme.muted),
            ),
        ])
    } else {
        Line::from(Span::styled(
            key_hints(app.view, app.show_filters),
            Style::default().fg(theme.muted),
        ))
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn key_hints(view: ViewMode, show_filters: bool) -> String {
    let base = match view {
        ViewMode::Tree => {
            "j/k move  enter open  →/← expand/collapse  tab view  f filters  space preview  r reload  q quit"
        }
        ViewMode::History | ViewMode::Search => {
            "j/k move  enter select  ← parent  / search  tab view  f filters  space preview  r reload  q quit"
        }
    };
    if show_filters {
        format!("d date on/off  D next range  1-6 pick range  s shell  c clear  |  {base}")
    } else {
        base.to_string()
    }
}

fn draw_error(frame: &mut Frame, message: &str, theme: &Theme) {
    let lines = vec![
        Line::from(Span::styled(
            "Failed to load history",
            Style::default()
                .fg(theme.error)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(message.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "r: retry  q: quit",
            Style::default().fg(theme.muted),
        )),
    ];
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(" Error ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.error)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, frame.area());
}
