//! Weekly calendar: a day-column grid on wide terminals, a single-day list
//! behind day tabs on narrow ones.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs},
    Frame,
};

use super::ui::{fit, ACCENT, DIM, SELECTED_BG, WARN};
use super::App;
use crate::models::{DayOfWeek, Schedule};
use crate::schedule::{group_by_day, hour_label, hour_rows, palette_color, place, BASE_HOUR, END_HOUR};

/// Below this many columns the compact single-day layout is used.
pub const WIDE_MIN_WIDTH: u16 = 100;
const GUTTER: u16 = 6;
const HOURS: u16 = (END_HOUR - BASE_HOUR) as u16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayState {
    Loading,
    Empty,
    Loaded,
}

/// Records already on screen stay visible through a refresh.
pub fn day_state(loading: bool, count: usize) -> DayState {
    match (count, loading) {
        (0, true) => DayState::Loading,
        (0, false) => DayState::Empty,
        _ => DayState::Loaded,
    }
}

/// Grid rows covered by a block as `(first_row, rows)`, clipped to
/// `grid_rows`. `None` for unparseable times or blocks entirely off-grid.
pub fn block_rows(schedule: &Schedule, lines_per_hour: u16, grid_rows: u16) -> Option<(u16, u16)> {
    let p = place(&schedule.start_time, &schedule.end_time, f64::from(lines_per_hour))?;
    let top = p.top.round() as i64;
    let bottom = ((p.top + p.height).round() as i64).max(top + 1);
    let first = top.max(0);
    let last = bottom.min(i64::from(grid_rows));
    if last <= first {
        return None;
    }
    Some((first as u16, (last - first) as u16))
}

fn rgb(index: usize) -> Color {
    let (r, g, b) = palette_color(index);
    Color::Rgb(r, g, b)
}

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let filtered = app.filtered_schedules();
    let title = if app.filter.is_empty() {
        format!(" Weekly Schedule ({}) ", filtered.len())
    } else {
        format!(
            " Weekly Schedule ({} of {}, filtered) ",
            filtered.len(),
            app.store.schedules.len()
        )
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(ACCENT));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if area.width >= WIDE_MIN_WIDTH {
        render_week(f, app, &filtered, inner);
    } else {
        render_day(f, app, &filtered, inner);
    }
}

// ─── Wide grid ──────────────────────────────────────────────────────────────

fn render_week(f: &mut Frame, app: &App, filtered: &[&Schedule], area: Rect) {
    if area.width < GUTTER + 12 || area.height < 3 {
        return;
    }
    let buckets = group_by_day(filtered.iter().copied());
    let grid = Rect {
        y: area.y + 1,
        height: area.height - 1,
        ..area
    };
    let lines_per_hour = (grid.height / HOURS).max(1);
    let col_width = (grid.width - GUTTER) / DayOfWeek::WEEK.len() as u16;

    for (i, hour) in hour_rows().enumerate() {
        let y = grid.y + i as u16 * lines_per_hour;
        if y >= grid.bottom() {
            break;
        }
        f.render_widget(
            Paragraph::new(hour_label(hour)).style(Style::default().fg(DIM)),
            Rect::new(grid.x, y, GUTTER, 1),
        );
    }

    for (i, (day, bucket)) in buckets.iter().enumerate() {
        let x = grid.x + GUTTER + i as u16 * col_width;
        let is_selected_day = day == app.selected_day;

        let header_style = if is_selected_day {
            Style::default()
                .fg(ACCENT)
                .bg(SELECTED_BG)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        };
        f.render_widget(
            Paragraph::new(fit(day.label(), col_width as usize)).style(header_style),
            Rect::new(x, area.y, col_width, 1),
        );

        let cell_width = col_width.saturating_sub(1);
        match day_state(app.loading, bucket.len()) {
            DayState::Loading => f.render_widget(
                Paragraph::new(spinner(app.frame_count)).style(Style::default().fg(WARN)),
                Rect::new(x, grid.y, cell_width, 1),
            ),
            DayState::Empty => f.render_widget(
                Paragraph::new(fit("No classes", cell_width as usize)).style(Style::default().fg(DIM)),
                Rect::new(x, grid.y, cell_width, 1),
            ),
            DayState::Loaded => {
                for (index, schedule) in bucket.iter().enumerate() {
                    let Some((top, rows)) = block_rows(schedule, lines_per_hour, grid.height) else {
                        continue;
                    };
                    let rect = Rect::new(x, grid.y + top, cell_width, rows);
                    let mut style = Style::default().bg(rgb(index)).fg(Color::Black);
                    if is_selected_day && index == app.selected_block {
                        style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
                    }
                    let w = cell_width as usize;
                    let lines = vec![
                        Line::from(Span::styled(
                            fit(&schedule.subject_display(), w),
                            Style::default().add_modifier(Modifier::BOLD),
                        )),
                        Line::from(fit(&schedule.time_range(), w)),
                        Line::from(fit(&schedule.room_display(), w)),
                        Line::from(fit(&schedule.teacher_display(), w)),
                    ];
                    f.render_widget(Clear, rect);
                    f.render_widget(Paragraph::new(lines).style(style), rect);
                }
            }
        }
    }
}

// ─── Compact day list ───────────────────────────────────────────────────────

fn render_day(f: &mut Frame, app: &App, filtered: &[&Schedule], area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(area);

    let titles: Vec<Line> = DayOfWeek::WEEK
        .iter()
        .map(|d| Line::from(format!(" {} ", d.short())))
        .collect();
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::BOTTOM))
        .select(app.selected_day.index().unwrap_or(0))
        .style(Style::default().fg(DIM))
        .highlight_style(
            Style::default()
                .fg(ACCENT)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        );
    f.render_widget(tabs, chunks[0]);

    let buckets = group_by_day(filtered.iter().copied());
    let bucket = buckets.day(app.selected_day);
    let message = match day_state(app.loading, bucket.len()) {
        DayState::Loading => Some(format!("  {}", spinner(app.frame_count))),
        DayState::Empty => Some(format!("  No classes scheduled for {}.", app.selected_day.label())),
        DayState::Loaded => None,
    };
    if let Some(message) = message {
        f.render_widget(Paragraph::new(message).style(Style::default().fg(DIM)), chunks[1]);
        return;
    }

    let items: Vec<ListItem> = bucket
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let is_selected = i == app.selected_block;
            let bg = if is_selected { SELECTED_BG } else { Color::Reset };
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled("█ ", Style::default().fg(rgb(i))),
                    Span::styled(format!("{}  ", s.time_range()), Style::default().fg(DIM).bg(bg)),
                    Span::styled(
                        s.subject_display(),
                        Style::default().fg(Color::White).bg(bg).add_modifier(Modifier::BOLD),
                    ),
                ]),
                Line::from(Span::styled(
                    format!(
                        "    {} · {} · {}",
                        s.room_display(),
                        s.teacher_display(),
                        s.section_display()
                    ),
                    Style::default().fg(DIM),
                )),
            ])
        })
        .collect();

    let mut state = ListState::default().with_selected(Some(app.selected_block));
    f.render_stateful_widget(List::new(items), chunks[1], &mut state);
}

fn spinner(frame: u64) -> String {
    const FRAMES: [char; 4] = ['|', '/', '-', '\\'];
    format!("{} Loading…", FRAMES[(frame % 4) as usize])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::tests::schedule;

    #[test]
    fn blocks_scale_with_lines_per_hour() {
        let s = schedule("1", DayOfWeek::Monday, "09:00", "10:30");
        assert_eq!(block_rows(&s, 2, 28), Some((4, 3)));

        let s = schedule("2", DayOfWeek::Monday, "07:00", "08:00");
        assert_eq!(block_rows(&s, 2, 28), Some((0, 2)));
    }

    #[test]
    fn blocks_outside_the_window_are_clipped_not_moved() {
        let early = schedule("1", DayOfWeek::Monday, "06:00", "07:30");
        assert_eq!(block_rows(&early, 2, 28), Some((0, 1)));

        let late = schedule("2", DayOfWeek::Monday, "20:00", "22:00");
        assert_eq!(block_rows(&late, 2, 28), Some((26, 2)));

        let gone = schedule("3", DayOfWeek::Monday, "05:00", "06:00");
        assert_eq!(block_rows(&gone, 2, 28), None);
    }

    #[test]
    fn short_and_malformed_blocks() {
        let tiny = schedule("1", DayOfWeek::Monday, "08:00", "08:10");
        assert_eq!(block_rows(&tiny, 1, 14), Some((1, 1)));

        let broken = schedule("2", DayOfWeek::Monday, "8 o'clock", "09:00");
        assert_eq!(block_rows(&broken, 1, 14), None);
    }

    #[test]
    fn day_states() {
        assert_eq!(day_state(true, 0), DayState::Loading);
        assert_eq!(day_state(false, 0), DayState::Empty);
        assert_eq!(day_state(true, 3), DayState::Loaded);
        assert_eq!(day_state(false, 1), DayState::Loaded);
    }
}
