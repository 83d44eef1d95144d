//! Printable HTML renditions of the weekly schedule.
//!
//! The document opens the browser's print dialog on load. Grid geometry
//! comes from [`super::place`] with [`super::PRINT_ROW_HEIGHT_PX`] rows.

use maud::{html, Markup, PreEscaped, DOCTYPE};

use super::{group_by_day, hour_label, hour_rows, palette_color, place, PRINT_ROW_HEIGHT_PX};
use crate::models::{short_time, DayOfWeek, Schedule};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintLayout {
    Grid,
    Table,
}

/// Header text printed above the schedule.
#[derive(Debug, Clone, Default)]
pub struct PrintHeading {
    pub title: String,
    /// Human-readable summary of the active filters, if any.
    pub subtitle: Option<String>,
}

pub fn render(layout: PrintLayout, heading: &PrintHeading, schedules: &[&Schedule]) -> String {
    let content = match layout {
        PrintLayout::Grid => grid(schedules),
        PrintLayout::Table => table(schedules),
    };
    document(heading, content).into_string()
}

fn document(heading: &PrintHeading, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (heading.title) }
                style { (PreEscaped(CSS)) }
            }
            body {
                div.print-only {
                    h1 { (heading.title) }
                    @if let Some(subtitle) = &heading.subtitle {
                        p.filters { (subtitle) }
                    }
                    (content)
                }
                script { (PreEscaped(PRINT_ON_LOAD)) }
            }
        }
    }
}

// ─── Grid ───────────────────────────────────────────────────────────────────

fn grid(schedules: &[&Schedule]) -> Markup {
    let buckets = group_by_day(schedules.iter().copied());
    let row_height = format!("height:{PRINT_ROW_HEIGHT_PX}px;");
    let column_height = format!(
        "height:{}px;",
        hour_rows().count() as f64 * PRINT_ROW_HEIGHT_PX
    );

    html! {
        div.grid {
            div.gutter {
                div.head {}
                @for hour in hour_rows() {
                    div.hour style=(row_height) { (hour_label(hour)) }
                }
            }
            @for (day, bucket) in buckets.iter() {
                div.day {
                    div.head { (day.label()) }
                    div.blocks style=(column_height) {
                        @for (index, schedule) in bucket.iter().enumerate() {
                            @if let Some(style) = block_style(schedule, index) {
                                div.block style=(style) {
                                    strong { (schedule.subject_display()) }
                                    br;
                                    (schedule.time_range())
                                    br;
                                    (schedule.section_display())
                                    br;
                                    (schedule.teacher_display()) " · " (schedule.room_display())
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Absolute position and palette colour of one block, or `None` when its
/// times cannot be placed.
fn block_style(schedule: &Schedule, index: usize) -> Option<String> {
    let Some(p) = place(&schedule.start_time, &schedule.end_time, PRINT_ROW_HEIGHT_PX) else {
        tracing::debug!(
            schedule_id = %schedule.schedule_id,
            start = %schedule.start_time,
            end = %schedule.end_time,
            "block left out of print grid"
        );
        return None;
    };
    let (r, g, b) = palette_color(index);
    Some(format!(
        "top:{:.1}px;height:{:.1}px;background:rgb({r},{g},{b});",
        p.top, p.height
    ))
}

// ─── Table ──────────────────────────────────────────────────────────────────

const TABLE_HEADERS: [&str; 6] = ["Day", "Time", "Subject", "Section", "Teacher", "Room"];

fn table(schedules: &[&Schedule]) -> Markup {
    let buckets = group_by_day(schedules.iter().copied());

    html! {
        table {
            thead {
                tr {
                    @for head in TABLE_HEADERS {
                        th { (head) }
                    }
                }
            }
            tbody {
                @if buckets.is_empty() {
                    tr {
                        td.empty colspan="6" { "No schedules to print." }
                    }
                }
                @for (day, bucket) in buckets.iter() {
                    @for (index, schedule) in bucket.iter().enumerate() {
                        tr {
                            // Day name only on the first row of each day.
                            @if index == 0 {
                                (day_cell(day, bucket.len()))
                            }
                            td { (short_time(&schedule.start_time)) " – " (short_time(&schedule.end_time)) }
                            td { (schedule.subject_display()) }
                            td { (schedule.section_display()) }
                            td { (schedule.teacher_display()) }
                            td { (schedule.room_display()) }
                        }
                    }
                }
            }
        }
    }
}

fn day_cell(day: DayOfWeek, rows: usize) -> Markup {
    html! {
        td.day-name rowspan=(rows) { (day.label()) }
    }
}

const PRINT_ON_LOAD: &str = "window.addEventListener('load', function () { window.print(); });";

const CSS: &str = r#"
@page { size: landscape; margin: 10mm; }
body { font-family: sans-serif; margin: 16px; }
h1 { font-size: 16px; margin: 0 0 4px; }
.filters { margin: 0 0 8px; font-size: 11px; color: #555; }
.grid { display: flex; border: 1px solid #999; }
.gutter { width: 60px; flex: none; }
.head { height: 24px; border-bottom: 1px solid #999; text-align: center; font-weight: bold; font-size: 12px; line-height: 24px; }
.hour { box-sizing: border-box; border-bottom: 1px solid #ddd; font-size: 10px; padding: 2px; text-align: left; }
.day { flex: 1; border-left: 1px solid #999; }
.blocks { position: relative; }
.block { position: absolute; left: 2px; right: 2px; overflow: hidden; box-sizing: border-box; padding: 2px 4px; border-radius: 3px; color: #fff; font-size: 9px; -webkit-print-color-adjust: exact; print-color-adjust: exact; }
table { width: 100%; border-collapse: collapse; font-size: 11px; }
th, td { border: 1px solid #999; padding: 4px; text-align: left; }
th { background: #eee; }
td.day-name { font-weight: bold; vertical-align: top; }
td.empty { padding: 8px; text-align: center; }
@media print {
  body * { visibility: hidden; }
  .print-only, .print-only * { visibility: visible; }
  .print-only { position: absolute; left: 0; top: 0; width: 100%; }
}
"#;
