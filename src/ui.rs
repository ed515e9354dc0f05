use chrono::{DateTime, Local};
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::app::{App, Mode};
use crate::launch::{
    LaunchOptions, NO_PERMISSIONS_FLAG, PRINT_FLAG, ROW_COUNT, ROW_CUSTOM, ROW_LAUNCH, ROW_MODEL,
    ROW_NO_PERMISSIONS, ROW_PRINT, ROW_VERBOSE, VERBOSE_FLAG,
};
use crate::layout::{self, AGE_COLS, RowColumns, TIMESTAMP_COLS};
use crate::session::Session;
use crate::text::{pad, truncate, truncate_with, width, wrap};

const TITLE: &str = " ◆ ccs · Session Browser ";
const SIZE_WARNING: &str = "Terminal too small (need 40x10)";
const TOPIC_LIMIT: usize = 6;

const HELP_KEYS: &[(&str, &str)] = &[
    ("Enter", "Resume selected session"),
    ("o", "Resume with launch options"),
    ("R", "Resume most recent session"),
    ("n", "Start a named session"),
    ("e", "Start an ephemeral session"),
    ("Space", "Mark / unmark, then move down"),
    ("u", "Clear all marks"),
    ("p", "Pin / unpin (every marked session)"),
    ("t / T", "Set tag / remove tag"),
    ("d", "Delete (every marked session)"),
    ("D", "Delete empty sessions"),
    ("/", "Search"),
    ("s", "Cycle sort mode"),
    ("r / F5", "Refresh"),
    ("↑ ↓ j k", "Move"),
    ("S-↑ S-↓", "Move 10 rows"),
    ("PgUp PgDn", "Page"),
    ("g G", "First / last"),
    ("Esc", "Clear filter, or quit"),
    ("q  Ctrl-C", "Quit"),
];

fn selected_style() -> Style {
    Style::default()
        .bg(Color::Rgb(39, 62, 84))
        .fg(Color::White)
        .add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn heading() -> Style {
    Style::default().fg(Color::Cyan)
}

/// Draws one full frame. Reads `app`, never mutates it.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let Some(regions) = layout::compute(area) else {
        let warning = Paragraph::new(Line::styled(
            truncate(SIZE_WARNING, area.width as usize),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
        frame.render_widget(warning, Rect { height: area.height.min(1), ..area });
        return;
    };

    let now = Local::now();
    render_header(frame, regions.header, app);
    render_info(frame, regions.info, app);
    render_list(frame, regions.list, app, now);
    render_separator(frame, regions.separator);
    render_preview(frame, regions.preview, app.selected(), now);
    render_footer(frame, regions.footer, app);

    match app.mode() {
        Mode::Help => render_help(frame, area),
        Mode::DeleteConfirm { label, .. } => {
            let question = if app.marked().is_empty() {
                format!("Delete \"{label}\"?")
            } else {
                format!("Delete {label}?")
            };
            render_confirm(
                frame,
                area,
                " Delete Session ",
                &[question, String::from("This cannot be undone.")],
            )
        }
        Mode::DeleteEmptyConfirm { targets } => {
            let plural = if targets.len() == 1 { "" } else { "s" };
            render_confirm(
                frame,
                area,
                " Delete Empty Sessions ",
                &[
                    format!("Delete {} empty session{plural}?", targets.len()),
                    String::from("Sessions with no messages will be removed."),
                ],
            )
        }
        Mode::LaunchOptions(opts) => render_launch_options(frame, area, opts, app.selected()),
        _ => {}
    }
}

fn hint(mode: &Mode) -> &'static str {
    match mode {
        Mode::Normal => "⏎ resume  o options  p pin  t tag  d delete  n new  / search  ? help",
        Mode::Search => "type to filter  ·  ↑↓ move  ·  ⏎ done  ·  Esc back",
        Mode::TagEdit { .. } => "type a tag  ·  ⏎ apply  ·  Esc cancel",
        Mode::DeleteConfirm { .. } | Mode::DeleteEmptyConfirm { .. } => {
            "y confirm  ·  any other key cancels"
        }
        Mode::NewSession { .. } => "type a session name  ·  ⏎ create  ·  Esc cancel",
        Mode::LaunchOptions(_) => "↑↓ row  ·  space toggle  ·  ⏎ select  ·  Esc back",
        Mode::Help => "press any key to close",
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(heading())
        .title(Span::styled(
            TITLE,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let text = truncate_with(hint(app.mode()), inner.width as usize, "...");
    frame.render_widget(
        Paragraph::new(Line::styled(text, dim())).alignment(Alignment::Center),
        inner,
    );
}

fn render_info(frame: &mut Frame, area: Rect, app: &App) {
    let prompt = |name: &'static str, value: &str| {
        Line::from(vec![
            Span::styled(
                name,
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::raw(value.to_string()),
            Span::styled("▏", Style::default().fg(Color::Yellow)),
        ])
    };

    let line = match app.mode() {
        Mode::Search => prompt(" Search: ", app.query()),
        Mode::TagEdit { input } => prompt(" Tag: ", input.as_str()),
        Mode::NewSession { input } => prompt(" Session name: ", input.as_str()),
        _ => {
            let total = app.sessions().len();
            let noun = if total == 1 { "session" } else { "sessions" };
            let sort = app.sort().label();
            let text = if app.query().is_empty() {
                format!(" {total} {noun}  ·  sort: {sort}")
            } else {
                format!(
                    " filter: {}  ·  {}/{total} {noun}  ·  sort: {sort}",
                    app.query(),
                    app.filtered().len()
                )
            };
            Line::styled(truncate(&text, area.width as usize), dim())
        }
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_list(frame: &mut Frame, area: Rect, app: &App, now: DateTime<Local>) {
    let sessions = app.filtered();
    if sessions.is_empty() {
        let message = if app.sessions().is_empty() {
            "No sessions found."
        } else {
            "No matching sessions."
        };
        let row = Rect {
            y: area.y + area.height / 2,
            height: 1,
            ..area
        };
        frame.render_widget(
            Paragraph::new(Line::styled(message, dim())).alignment(Alignment::Center),
            row,
        );
        return;
    }

    let cursor = app.cursor();
    let height = area.height as usize;
    let end = (cursor.scroll() + height).min(sessions.len());
    let visible = &sessions[cursor.scroll()..end];
    let widest_tag = visible
        .iter()
        .filter_map(|s| s.tag.as_deref())
        .map(|t| width(t) + 3)
        .max()
        .unwrap_or(0);
    let columns = layout::row_columns(area.width as usize, widest_tag);

    let lines: Vec<Line> = visible
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let selected = cursor.scroll() + i == cursor.selected();
            session_row(s, selected, app.marked().contains(&s.id), &columns, now)
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), area);

    let marker = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let x = area.right().saturating_sub(3);
    if cursor.scroll() > 0 {
        frame.buffer_mut().set_string(x, area.y, " ▲ ", marker);
    }
    if end < sessions.len() {
        frame
            .buffer_mut()
            .set_string(x, area.bottom().saturating_sub(1), " ▼ ", marker);
    }
}

fn age_color(modified: DateTime<Local>, now: DateTime<Local>) -> Color {
    if modified.date_naive() == now.date_naive() {
        Color::Green
    } else if now.signed_duration_since(modified).num_days() < 7 {
        Color::Yellow
    } else {
        Color::DarkGray
    }
}

/// One list row as styled spans. The selected row carries its highlight as
/// the line style; mark, pin, tag and project keep their own colors on top.
pub fn session_row(
    session: &Session,
    selected: bool,
    marked: bool,
    columns: &RowColumns,
    now: DateTime<Local>,
) -> Line<'static> {
    let quiet = |style: Style| if selected { Style::default() } else { style };

    let indicator = match (marked, selected) {
        (true, _) => " ● ",
        (false, true) => " ▸ ",
        (false, false) => "   ",
    };
    let pin = if session.pinned { "★ " } else { "  " };
    let tag = match session.tag.as_deref() {
        Some(tag) => pad(
            &truncate(&format!("[{tag}]"), columns.tag.saturating_sub(1)),
            columns.tag,
        ),
        None => pad("", columns.tag),
    };
    let timestamp = pad(&session.timestamp(), TIMESTAMP_COLS);
    let age = pad(&session.age_at(now), AGE_COLS);
    let project = pad(
        &truncate(&session.project_display, columns.project),
        columns.project + 1,
    );
    let description = pad(
        &truncate(session.label(), columns.description),
        columns.description,
    );

    let spans = vec![
        Span::styled(
            indicator,
            if marked {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            },
        ),
        Span::styled(
            pin,
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            tag,
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            timestamp,
            quiet(Style::default().fg(age_color(session.modified, now))),
        ),
        Span::styled(age, quiet(dim())),
        Span::styled(project, Style::default().fg(Color::Magenta)),
        Span::raw(description),
    ];

    let line = Line::from(spans);
    if selected {
        line.style(selected_style())
    } else {
        line
    }
}

fn render_separator(frame: &mut Frame, area: Rect) {
    let rule = "─".repeat(area.width as usize);
    frame.buffer_mut().set_string(area.x, area.y, rule, dim());
    frame
        .buffer_mut()
        .set_string(area.x + 2, area.y, " Preview ", heading().add_modifier(Modifier::BOLD));
}

fn render_preview(frame: &mut Frame, area: Rect, session: Option<&Session>, now: DateTime<Local>) {
    let Some(session) = session else {
        frame.render_widget(
            Paragraph::new(Line::styled(" No session selected", dim())),
            area,
        );
        return;
    };

    let cols = area.width.saturating_sub(2) as usize;
    let mut lines = Vec::new();

    let mut badges = vec![Span::raw(" ")];
    if session.pinned {
        badges.push(Span::styled(
            "★ PINNED ",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
    }
    if let Some(tag) = session.tag.as_deref() {
        badges.push(Span::styled(
            format!("[{tag}] "),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ));
    }
    badges.push(Span::styled(session.id.clone(), dim()));
    lines.push(Line::from(badges));

    let field = |name: &'static str, value: String| {
        Line::from(vec![
            Span::styled(name, heading()),
            Span::raw(truncate(&value, cols.saturating_sub(name.len()))),
        ])
    };
    lines.push(field(" Project:   ", session.project_display.clone()));
    let cwd = if session.cwd.is_empty() {
        String::from("(unknown)")
    } else {
        session.cwd.clone()
    };
    lines.push(field(" Directory: ", cwd));
    lines.push(field(
        " Modified:  ",
        format!(
            "{} ({})  ·  {} messages",
            session.timestamp(),
            session.age_at(now),
            session.msg_count
        ),
    ));
    lines.push(Line::raw(""));

    if session.is_empty() {
        lines.push(Line::styled(" (empty session, nothing recorded yet)", dim()));
    } else if session.first_msg_long.is_empty() {
        lines.push(Line::raw(format!(" {}", truncate(session.label(), cols))));
    } else {
        for row in wrap(&session.first_msg_long, cols) {
            lines.push(Line::raw(format!(" {row}")));
        }
    }

    if !session.topics.is_empty() {
        lines.push(Line::raw(""));
        lines.push(Line::styled(" Topics:", heading()));
        let skip = session.topics.len().saturating_sub(TOPIC_LIMIT);
        for topic in &session.topics[skip..] {
            lines.push(Line::raw(format!(
                "   • {}",
                truncate(topic, cols.saturating_sub(4))
            )));
        }
    }

    lines.truncate(area.height as usize);
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let left = match app.status() {
        Some(text) => Line::styled(
            format!(" {text}"),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        None => Line::from(vec![
            Span::styled(" ccs ", heading().add_modifier(Modifier::BOLD)),
            Span::styled(" ? help", dim()),
        ]),
    };
    frame.render_widget(Paragraph::new(left), area);

    if let Some(badge) = app.mode().badge() {
        let badge = Span::styled(
            format!(" {badge} "),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
        frame.render_widget(Paragraph::new(Line::from(badge)).alignment(Alignment::Center), area);
    }

    frame.render_widget(
        Paragraph::new(Line::styled(position(app), dim())).alignment(Alignment::Right),
        area,
    );
}

fn position(app: &App) -> String {
    let marked = match app.marked().len() {
        0 => String::new(),
        n => format!("{n} marked  ·  "),
    };
    let len = app.filtered().len();
    if len == 0 {
        return format!("{marked}0/0 ");
    }
    let page = app.page_size();
    let selected = app.cursor().selected();
    format!(
        "{marked}{}/{len}  pg {}/{} ",
        selected + 1,
        selected / page + 1,
        len.div_ceil(page)
    )
}

fn overlay_block(title: &'static str, border: Color) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(Span::styled(
            title,
            Style::default().fg(border).add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center)
}

fn render_help(frame: &mut Frame, area: Rect) {
    let mut lines: Vec<Line> = HELP_KEYS
        .iter()
        .map(|(keys, what)| {
            Line::from(vec![
                Span::styled(
                    format!(" {}", pad(keys, 11)),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ),
                Span::raw(*what),
            ])
        })
        .collect();
    lines.push(Line::raw(""));
    lines.push(Line::styled("press any key to close", dim()).alignment(Alignment::Center));

    let rect = layout::help_rect(area, lines.len());
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines).block(overlay_block(" Keys ", Color::Cyan)),
        rect,
    );
}

fn render_confirm(frame: &mut Frame, area: Rect, title: &'static str, message: &[String]) {
    let hint = "y confirm  ·  any other key cancels";
    let longest = message
        .iter()
        .map(String::as_str)
        .map(width)
        .chain([width(hint), width(title)])
        .max()
        .unwrap_or(0);
    let rect = layout::confirm_rect(area, longest, message.len() + 3);
    let inner = rect.width.saturating_sub(4) as usize;

    let mut lines = vec![Line::raw("")];
    for (i, text) in message.iter().enumerate() {
        let style = if i == 0 {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            dim()
        };
        lines.push(Line::styled(truncate(text, inner), style).alignment(Alignment::Center));
    }
    lines.push(Line::raw(""));
    lines.push(
        Line::styled(
            truncate(hint, inner),
            Style::default().fg(Color::Yellow),
        )
        .alignment(Alignment::Center),
    );

    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines).block(overlay_block(title, Color::Red)),
        rect,
    );
}

fn checkbox(on: bool, flag: &str) -> String {
    format!("[{}] {flag}", if on { "x" } else { " " })
}

fn render_launch_options(
    frame: &mut Frame,
    area: Rect,
    opts: &LaunchOptions,
    session: Option<&Session>,
) {
    let rect = layout::launch_rect(area, ROW_COUNT + 2);
    let inner = rect.width.saturating_sub(2) as usize;

    let mut lines: Vec<Line> = (0..ROW_COUNT)
        .map(|row| {
            let text = match row {
                ROW_MODEL => format!("Model        < {} >", opts.model_name()),
                ROW_VERBOSE => checkbox(opts.verbose, VERBOSE_FLAG),
                ROW_NO_PERMISSIONS => checkbox(opts.no_permissions, NO_PERMISSIONS_FLAG),
                ROW_PRINT => checkbox(opts.print, PRINT_FLAG),
                ROW_CUSTOM => {
                    let caret = if opts.editing { "▏" } else { "" };
                    format!("Custom args  {}{caret}", opts.custom)
                }
                ROW_LAUNCH => String::from("▶ Launch"),
                _ => String::new(),
            };
            let marker = if row == opts.row { " ▸ " } else { "   " };
            let style = if row == opts.row {
                selected_style()
            } else if row == ROW_LAUNCH {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::styled(pad(&format!("{marker}{text}"), inner), style)
        })
        .collect();

    let id = session.map(Session::short_id).unwrap_or("?");
    let mut preview = format!("--resume {id}");
    for arg in opts.args() {
        preview.push(' ');
        preview.push_str(&arg);
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled(format!(" {}", truncate(&preview, inner.saturating_sub(2))), dim()));

    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines).block(overlay_block(" Launch Options ", Color::Cyan)),
        rect,
    );
}
