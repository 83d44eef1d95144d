use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Tabs, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::form::{FieldKind, Form};
use super::{calendar, App, ErrorPopup, FilterField, Modal, ScheduleViewMode, Tab};
use crate::models::{EntityKind, Resource};
use chrono::Local;

pub(super) const ACCENT: Color = Color::Cyan;
pub(super) const HEADER_BG: Color = Color::DarkGray;
pub(super) const SELECTED_BG: Color = Color::Rgb(40, 40, 60);
pub(super) const DIM: Color = Color::DarkGray;
pub(super) const GOOD: Color = Color::Green;
pub(super) const WARN: Color = Color::Yellow;
pub(super) const BAD: Color = Color::Red;

/// Pad or cut `s` to exactly `width` terminal cells, marking cuts with `…`.
pub(super) fn fit(s: &str, width: usize) -> String {
    let w = s.width();
    if w <= width {
        return format!("{s}{}", " ".repeat(width - w));
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let cw = c.width().unwrap_or(0);
        if used + cw + 1 > width {
            break;
        }
        out.push(c);
        used += cw;
    }
    out.push('…');
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

// ─── Main render ────────────────────────────────────────────────────────────

pub fn render(f: &mut Frame, app: &mut App) {
    let banner_height = app.load_errors.len().min(3) as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(banner_height),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_tabs(f, app, chunks[0]);
    render_clock(f, chunks[0]);
    render_load_errors(f, app, chunks[1]);

    match app.active_tab {
        Tab::Schedule => match app.schedule_view {
            ScheduleViewMode::Calendar => calendar::render(f, app, chunks[2]),
            ScheduleViewMode::List => render_entity_table(f, app, chunks[2], EntityKind::Schedule),
        },
        tab => render_entity_table(f, app, chunks[2], tab.kind()),
    }

    render_status_bar(f, app, chunks[3]);

    match &app.modal {
        Modal::None => {}
        Modal::View { kind, id, loading } => render_view_modal(f, app, *kind, id, *loading),
        Modal::Form(form) => render_form_modal(f, form),
        Modal::ConfirmDelete {
            kind,
            label,
            deleting,
            ..
        } => render_confirm_modal(f, *kind, label, *deleting),
        Modal::Filter(focus) => render_filter_modal(f, app, *focus),
    }

    if let Some(popup) = &app.error {
        render_error_popup(f, popup);
    }
}

// ─── Tab Bar ────────────────────────────────────────────────────────────────

fn render_tabs(f: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| {
            Line::from(vec![
                Span::styled(format!(" {} ", i + 1), Style::default().fg(DIM)),
                Span::styled(format!("{} ", tab.title()), Style::default().fg(Color::White)),
            ])
        })
        .collect();

    let selected = Tab::ALL
        .iter()
        .position(|t| *t == app.active_tab)
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .title(" School Admin ")
                .title_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
        )
        .select(selected)
        .highlight_style(
            Style::default()
                .fg(ACCENT)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        );

    f.render_widget(tabs, area);
}

// ─── Clock ──────────────────────────────────────────────────────────────────

fn render_clock(f: &mut Frame, tab_area: Rect) {
    let time_str = format!(" {} ", Local::now().format("%a %b %d  %H:%M:%S"));
    let clock_width = time_str.len() as u16;
    let clock_area = Rect {
        x: tab_area.right().saturating_sub(clock_width),
        y: tab_area.y,
        width: clock_width.min(tab_area.width),
        height: 1,
    };
    f.render_widget(
        Paragraph::new(time_str).style(Style::default().fg(ACCENT)),
        clock_area,
    );
}

// ─── Load errors ────────────────────────────────────────────────────────────

fn render_load_errors(f: &mut Frame, app: &App, area: Rect) {
    if area.height == 0 {
        return;
    }
    let mut lines: Vec<Line> = app
        .load_errors
        .iter()
        .take(area.height as usize)
        .map(|e| Line::from(Span::styled(format!(" ! {e}"), Style::default().fg(BAD))))
        .collect();
    let hidden = app.load_errors.len().saturating_sub(area.height as usize);
    if hidden > 0 {
        if let Some(last) = lines.last_mut() {
            *last = Line::from(Span::styled(
                format!(" ! …and {} more failed collections", hidden + 1),
                Style::default().fg(BAD),
            ));
        }
    }
    f.render_widget(Paragraph::new(lines), area);
}

// ─── Status Bar ─────────────────────────────────────────────────────────────

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let sync_hint = app
        .fetched_at
        .map(|t| format!("  synced {}", t.format("%b %d %H:%M")))
        .unwrap_or_default();

    let edit_hint = if app.session.can_edit() {
        "  a:add  e:edit  d:delete"
    } else {
        ""
    };
    let tab_hint = match (app.active_tab, app.schedule_view) {
        (Tab::Schedule, ScheduleViewMode::Calendar) => "  h/l:day  v:list  f:filter  p/P:print",
        (Tab::Schedule, ScheduleViewMode::List) => "  v:calendar  f:filter  p/P:print",
        _ => "",
    };

    let status = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {} ({}) ", app.session.user_name, app.session.role.label()),
            Style::default().fg(ACCENT),
        ),
        Span::styled(
            &app.status_message,
            Style::default().fg(if app.loading { WARN } else { Color::White }),
        ),
        Span::styled(
            format!("  q:quit  Tab:switch  j/k:nav  Enter:view{edit_hint}{tab_hint}  r:refresh{sync_hint}  "),
            Style::default().fg(DIM),
        ),
    ]))
    .style(Style::default().bg(HEADER_BG));

    f.render_widget(status, area);
}

// ─── Entity tables ──────────────────────────────────────────────────────────

fn render_entity_table(f: &mut Frame, app: &mut App, area: Rect, kind: EntityKind) {
    let rows: Vec<Vec<String>> = match kind {
        EntityKind::Schedule => app.filtered_schedules().iter().map(|s| s.cells()).collect(),
        other => app.store.rows(other),
    };

    let title = if kind == EntityKind::Schedule && !app.filter.is_empty() {
        format!(" {} ({} of {}, filtered) ", kind.title(), rows.len(), app.store.schedules.len())
    } else {
        format!(" {} ({}) ", kind.title(), rows.len())
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(ACCENT));
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.height < 2 {
        return;
    }

    let columns = kind.columns();
    let col_width = (inner.width.saturating_sub(2) as usize / columns.len()).max(1);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let header: String = columns.iter().map(|c| fit(c, col_width)).collect();
    f.render_widget(
        Paragraph::new(format!("  {header}"))
            .style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
        chunks[0],
    );

    if rows.is_empty() {
        let message = if app.loading {
            "  Loading…".to_string()
        } else if app.store.failed.contains(&kind) {
            format!("  Could not load {}.", kind.title().to_lowercase())
        } else if kind == EntityKind::Schedule && !app.filter.is_empty() {
            "  No schedules match the current filters.".to_string()
        } else if app.session.can_edit() {
            format!("  No {} yet. Press a to add one.", kind.title().to_lowercase())
        } else {
            format!("  No {} yet.", kind.title().to_lowercase())
        };
        f.render_widget(Paragraph::new(message).style(Style::default().fg(DIM)), chunks[1]);
        return;
    }

    let state = app.table_state_mut(kind);
    let items: Vec<ListItem> = rows
        .iter()
        .enumerate()
        .map(|(i, cells)| {
            let is_selected = i == state.selected;
            let marker = if is_selected { "> " } else { "  " };
            let style = if is_selected {
                Style::default().bg(SELECTED_BG).fg(Color::White)
            } else {
                Style::default().fg(Color::White)
            };
            let line: String = cells.iter().map(|c| fit(c, col_width)).collect();
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(ACCENT)),
                Span::styled(line, style),
            ]))
        })
        .collect();

    state.inner.select(Some(state.selected));
    f.render_stateful_widget(List::new(items), chunks[1], &mut state.inner);
}

// ─── Modals ─────────────────────────────────────────────────────────────────

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn modal_block(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        .border_style(Style::default().fg(ACCENT))
}

fn render_view_modal(f: &mut Frame, app: &App, kind: EntityKind, id: &str, loading: bool) {
    let Some(details) = app.store.details(kind, id) else {
        return;
    };
    let label_width = details.iter().map(|(l, _)| l.width()).max().unwrap_or(0) + 2;
    let mut lines: Vec<Line> = details
        .into_iter()
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(fit(label, label_width), Style::default().fg(DIM)),
                Span::styled(
                    if value.is_empty() { "-".to_string() } else { value },
                    Style::default().fg(Color::White),
                ),
            ])
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        if loading { "Refreshing…  Esc: close" } else { "Esc: close" },
        Style::default().fg(if loading { WARN } else { DIM }),
    )));

    let area = centered(f.area(), 64, lines.len() as u16 + 2);
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(modal_block(format!(" {} details ", kind.singular()))),
        area,
    );
}

fn render_form_modal(f: &mut Frame, form: &Form) {
    let mut lines: Vec<Line> = Vec::new();
    if let Some(err) = &form.submit_error {
        lines.push(Line::from(Span::styled(
            format!(" {err}"),
            Style::default().fg(Color::White).bg(BAD),
        )));
        lines.push(Line::from(""));
    }

    for (i, field) in form.fields.iter().enumerate() {
        let focused = i == form.focus;
        let marker = if focused { "> " } else { "  " };
        let required = if field.spec.required { "*" } else { "" };
        let value = match &field.spec.kind {
            FieldKind::Choice(_) | FieldKind::Reference(_) => {
                let shown = field.display();
                let shown = if shown.is_empty() { "Select…".to_string() } else { shown };
                if focused {
                    format!("◀ {shown} ▶")
                } else {
                    shown
                }
            }
            _ if focused => format!("{}▏", field.value),
            _ => field.value.clone(),
        };
        let value_style = if focused {
            Style::default().fg(Color::White).bg(SELECTED_BG)
        } else {
            Style::default().fg(Color::White)
        };
        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(ACCENT)),
            Span::styled(
                fit(&format!("{}{required}", field.spec.label), 14),
                Style::default().fg(if focused { ACCENT } else { DIM }),
            ),
            Span::styled(value, value_style),
        ]));
        if let Some(err) = &field.error {
            lines.push(Line::from(Span::styled(
                format!("                {err}"),
                Style::default().fg(BAD),
            )));
        }
    }

    lines.push(Line::from(""));
    lines.push(if form.submitting {
        Line::from(Span::styled("Saving…", Style::default().fg(WARN)))
    } else {
        Line::from(Span::styled(
            "Tab/↑↓: field  ←/→: choose  Enter: save  Esc: cancel",
            Style::default().fg(DIM),
        ))
    });

    let area = centered(f.area(), 70, lines.len() as u16 + 2);
    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(lines).block(modal_block(form.title())), area);
}

fn render_confirm_modal(f: &mut Frame, kind: EntityKind, label: &str, deleting: bool) {
    let lines = vec![
        Line::from(format!("Delete {} \"{label}\"?", kind.singular().to_lowercase())),
        Line::from(Span::styled("This cannot be undone.", Style::default().fg(DIM))),
        Line::from(""),
        if deleting {
            Line::from(Span::styled("Deleting…", Style::default().fg(WARN)))
        } else {
            Line::from(vec![
                Span::styled("y", Style::default().fg(BAD).add_modifier(Modifier::BOLD)),
                Span::raw(": delete   "),
                Span::styled("n/Esc", Style::default().fg(GOOD).add_modifier(Modifier::BOLD)),
                Span::raw(": cancel"),
            ])
        },
    ];
    let area = centered(f.area(), 56, 6);
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(modal_block(format!(" Delete {} ", kind.singular()))),
        area,
    );
}

fn render_filter_modal(f: &mut Frame, app: &App, focus: FilterField) {
    let mut lines: Vec<Line> = FilterField::ALL
        .into_iter()
        .map(|field| {
            let focused = field == focus;
            let value = app.filter_display(field);
            let value = match field {
                FilterField::Search if focused => format!("{value}▏"),
                FilterField::Search => value,
                _ if focused => format!("◀ {value} ▶"),
                _ => value,
            };
            Line::from(vec![
                Span::styled(if focused { "> " } else { "  " }, Style::default().fg(ACCENT)),
                Span::styled(
                    fit(field.label(), 10),
                    Style::default().fg(if focused { ACCENT } else { DIM }),
                ),
                Span::styled(
                    value,
                    if focused {
                        Style::default().fg(Color::White).bg(SELECTED_BG)
                    } else {
                        Style::default().fg(Color::White)
                    },
                ),
            ])
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("{} matching  ·  ↑↓: field  ←/→: choose  Del: clear  Esc: close", app.filtered_schedules().len()),
        Style::default().fg(DIM),
    )));

    let area = centered(f.area(), 72, lines.len() as u16 + 2);
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines).block(modal_block(" Filter schedules ".into())),
        area,
    );
}

fn render_error_popup(f: &mut Frame, popup: &ErrorPopup) {
    let lines = vec![
        Line::from(Span::styled(popup.message.clone(), Style::default().fg(Color::White))),
        Line::from(""),
        Line::from(Span::styled("Enter/Esc: dismiss", Style::default().fg(DIM))),
    ];
    let area = centered(f.area(), 60, 7);
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: true }).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", popup.title))
                .title_style(Style::default().fg(BAD).add_modifier(Modifier::BOLD))
                .border_style(Style::default().fg(BAD)),
        ),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SchoolClient;
    use crate::config::{Role, Session};
    use crate::models::DayOfWeek;
    use crate::schedule::tests::schedule;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn fit_pads_and_truncates_by_display_width() {
        assert_eq!(fit("ab", 4), "ab  ");
        assert_eq!(fit("Mathematics", 6), "Mathe…");
        assert_eq!(fit("日本語", 5), "日本…");
        assert_eq!(fit("anything", 0), "");
    }

    fn draw(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn app() -> App {
        let client = SchoolClient::new("http://127.0.0.1:9/api/", None).unwrap();
        let mut app = App::new(
            client,
            Session {
                user_name: "Registrar".into(),
                role: Role::Admin,
            },
        );
        app.loading = false;
        app
    }

    #[test]
    fn wide_and_compact_calendars_render_their_days() {
        let mut app = app();
        let mut s = schedule("1", DayOfWeek::Monday, "08:00", "09:00");
        s.subject_name = Some("Algebra".into());
        app.store.upsert(s);

        let wide = draw(&mut app, 140, 40);
        assert!(wide.contains("Saturday"));
        assert!(wide.contains("Algebra"));
        assert!(wide.contains("07:00"));

        let compact = draw(&mut app, 80, 30);
        assert!(compact.contains("Algebra"));
        assert!(!compact.contains("Saturday"));

        app.select_day(DayOfWeek::Tuesday);
        let compact = draw(&mut app, 80, 30);
        assert!(compact.contains("No classes scheduled for Tuesday."));
    }

    #[test]
    fn failed_loads_show_as_banners() {
        let mut app = app();
        app.load_errors = vec!["Failed to load rooms: database offline".into()];
        let screen = draw(&mut app, 120, 30);
        assert!(screen.contains("Failed to load rooms: database offline"));
    }
}
