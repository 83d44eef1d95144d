//! Weekly schedule layout, day grouping and filtering.
//!
//! Both the interactive calendar and the print renderer are fed from this
//! module, so the time-to-position arithmetic lives in exactly one place.

pub mod print;

use crate::models::{DayOfWeek, Schedule};

/// First hour shown on the calendar grid.
pub const BASE_HOUR: u32 = 7;
/// The displayed window closes at this hour; the last row starts an hour earlier.
pub const END_HOUR: u32 = 21;
/// Row height, in pixels, used by the print layout.
pub const PRINT_ROW_HEIGHT_PX: f64 = 50.0;

/// Hour rows drawn down the left edge of the grid: 07:00 … 20:00.
pub fn hour_rows() -> impl Iterator<Item = u32> {
    BASE_HOUR..END_HOUR
}

pub fn hour_label(hour: u32) -> String {
    format!("{hour:02}:00")
}

// ─── Time layout ────────────────────────────────────────────────────────────

/// Minutes since midnight for an `HH:MM` or `HH:MM:SS` string.
pub fn minutes_of_day(time: &str) -> Option<u32> {
    let mut parts = time.trim().split(':');
    let hour: u32 = parts.next()?.parse().ok()?;
    let minute: u32 = parts.next()?.parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some(hour * 60 + minute)
}

/// Vertical placement of one block, in the caller's units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub top: f64,
    pub height: f64,
}

/// Offset from 07:00 and duration, scaled so one hour spans `row_height`.
///
/// Times outside the 07:00–21:00 window are not clamped: a 06:30 start
/// yields a negative `top`. Unparseable times yield `None`.
pub fn place(start_time: &str, end_time: &str, row_height: f64) -> Option<Placement> {
    let start = minutes_of_day(start_time)? as f64;
    let end = minutes_of_day(end_time)? as f64;
    let offset = start - (BASE_HOUR * 60) as f64;
    let duration = end - start;
    Some(Placement {
        top: offset / 60.0 * row_height,
        height: duration / 60.0 * row_height,
    })
}

// ─── Day grouping ───────────────────────────────────────────────────────────

/// Six weekday buckets, each ordered by start time.
#[derive(Debug, Clone)]
pub struct DayBuckets<'a> {
    buckets: [Vec<&'a Schedule>; 6],
}

impl<'a> DayBuckets<'a> {
    pub fn day(&self, day: DayOfWeek) -> &[&'a Schedule] {
        match day.index() {
            Some(i) => &self.buckets[i],
            None => &[],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (DayOfWeek, &[&'a Schedule])> + '_ {
        DayOfWeek::WEEK
            .iter()
            .zip(self.buckets.iter())
            .map(|(d, b)| (*d, b.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition schedules into weekday buckets sorted by `startTime`.
///
/// Start times are compared as strings; the zero-padded `HH:MM` format makes
/// that equivalent to chronological order. Records with an unrecognized day
/// have no bucket and are left out.
pub fn group_by_day<'a, I>(schedules: I) -> DayBuckets<'a>
where
    I: IntoIterator<Item = &'a Schedule>,
{
    let mut buckets: [Vec<&'a Schedule>; 6] = Default::default();
    for schedule in schedules {
        match schedule.day_of_week.index() {
            Some(i) => buckets[i].push(schedule),
            None => tracing::trace!(
                schedule_id = %schedule.schedule_id,
                "schedule has no recognized day; left off the calendar"
            ),
        }
    }
    for bucket in &mut buckets {
        bucket.sort_by(|a, b| a.start_time.cmp(&b.start_time));
    }
    DayBuckets { buckets }
}

// ─── Filtering ──────────────────────────────────────────────────────────────

/// Optional filters combined with AND. Empty fields match everything.
///
/// Teacher, room and subject are matched on ids in every view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleFilter {
    pub search: String,
    pub teacher_id: Option<String>,
    pub room_id: Option<String>,
    pub subject_id: Option<String>,
    pub day: Option<DayOfWeek>,
}

impl ScheduleFilter {
    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty()
            && self.teacher_id.is_none()
            && self.room_id.is_none()
            && self.subject_id.is_none()
            && self.day.is_none()
    }

    pub fn matches(&self, schedule: &Schedule) -> bool {
        let search = self.search.trim();
        if !search.is_empty() {
            let haystack = search_text(schedule).to_lowercase();
            if !haystack.contains(&search.to_lowercase()) {
                return false;
            }
        }
        id_matches(&self.teacher_id, &schedule.teacher_id)
            && id_matches(&self.room_id, &schedule.room_id)
            && id_matches(&self.subject_id, &schedule.subject_id)
            && self.day.map_or(true, |d| d == schedule.day_of_week)
    }

    /// Matching records in their original order.
    pub fn apply<'a>(&self, schedules: &'a [Schedule]) -> Vec<&'a Schedule> {
        schedules.iter().filter(|s| self.matches(s)).collect()
    }
}

fn id_matches(wanted: &Option<String>, actual: &Option<String>) -> bool {
    match wanted.as_deref() {
        None | Some("") => true,
        Some(w) => actual.as_deref() == Some(w),
    }
}

/// Text the free-text search runs against.
fn search_text(s: &Schedule) -> String {
    [
        s.subject_display(),
        s.teacher_display(),
        s.room_display(),
        s.section_display(),
        s.day_of_week.as_str().to_string(),
        s.start_time.clone(),
        s.end_time.clone(),
    ]
    .join(" ")
}

// ─── Palette ────────────────────────────────────────────────────────────────

/// Block colors as `(r, g, b)`. Assignment is positional within a day
/// bucket, not tied to subject or teacher.
pub const PALETTE: [(u8, u8, u8); 6] = [
    (59, 130, 246),
    (16, 185, 129),
    (245, 158, 11),
    (139, 92, 246),
    (236, 72, 153),
    (20, 184, 166),
];

pub fn palette_color(index: usize) -> (u8, u8, u8) {
    PALETTE[index % PALETTE.len()]
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::DayOfWeek;

    pub(crate) fn schedule(id: &str, day: DayOfWeek, start: &str, end: &str) -> Schedule {
        Schedule {
            schedule_id: id.into(),
            subject_id: Some(format!("sub-{id}")),
            subject_name: None,
            teacher_id: None,
            teacher_name: None,
            room_id: None,
            room_name: None,
            section_id: None,
            section_name: None,
            day_of_week: day,
            start_time: start.into(),
            end_time: end.into(),
            created_at: None,
            updated_at: None,
        }
    }

    fn fixture() -> Vec<Schedule> {
        let mut math = schedule("1", DayOfWeek::Monday, "08:00", "09:00");
        math.subject_name = Some("Mathematics".into());
        math.teacher_id = Some("t1".into());
        math.teacher_name = Some("Ada Lovelace".into());
        math.room_id = Some("r1".into());
        math.room_name = Some("Room 101".into());

        let mut physics = schedule("2", DayOfWeek::Monday, "07:00", "07:30");
        physics.subject_name = Some("Physics".into());
        physics.teacher_id = Some("t2".into());
        physics.room_id = Some("r1".into());

        let mut history = schedule("3", DayOfWeek::Wednesday, "13:00:00", "14:30:00");
        history.subject_name = Some("History".into());
        history.teacher_id = Some("t1".into());
        history.room_id = Some("r2".into());
        history.section_name = Some("BSCS 1-A".into());

        let stray = schedule("4", DayOfWeek::Unrecognized, "10:00", "11:00");

        vec![math, physics, history, stray]
    }

    #[test]
    fn layout_matches_reference_values() {
        let p = place("09:00", "10:30", PRINT_ROW_HEIGHT_PX).unwrap();
        assert_eq!(p, Placement { top: 100.0, height: 75.0 });

        let p = place("07:00", "08:00", PRINT_ROW_HEIGHT_PX).unwrap();
        assert_eq!(p, Placement { top: 0.0, height: 50.0 });

        let p = place("07:00:00", "08:00:00", 2.0).unwrap();
        assert_eq!(p, Placement { top: 0.0, height: 2.0 });
    }

    #[test]
    fn layout_is_not_clamped_to_the_window() {
        let early = place("06:30", "07:30", PRINT_ROW_HEIGHT_PX).unwrap();
        assert_eq!(early.top, -25.0);
        let late = place("20:30", "22:00", PRINT_ROW_HEIGHT_PX).unwrap();
        assert_eq!(late.top, 675.0);
        assert_eq!(late.height, 75.0);
    }

    #[test]
    fn malformed_times_have_no_placement() {
        assert!(place("nine", "10:00", 50.0).is_none());
        assert!(place("09:00", "", 50.0).is_none());
        assert!(place("25:00", "26:00", 50.0).is_none());
    }

    #[test]
    fn grouping_keeps_every_valid_record_exactly_once() {
        let all = fixture();
        let buckets = group_by_day(&all);
        let valid = all.iter().filter(|s| s.day_of_week.index().is_some()).count();
        assert_eq!(buckets.len(), valid);

        let mut seen: Vec<&str> = buckets
            .iter()
            .flat_map(|(_, b)| b.iter().map(|s| s.schedule_id.as_str()))
            .collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen, vec!["1", "2", "3"]);
        assert!(buckets.day(DayOfWeek::Unrecognized).is_empty());
    }

    #[test]
    fn buckets_are_sorted_by_start_time() {
        let all = fixture();
        let buckets = group_by_day(&all);
        for (_, bucket) in buckets.iter() {
            for pair in bucket.windows(2) {
                assert!(pair[0].start_time <= pair[1].start_time);
            }
        }
        let monday: Vec<&str> = buckets
            .day(DayOfWeek::Monday)
            .iter()
            .map(|s| s.start_time.as_str())
            .collect();
        assert_eq!(monday, vec!["07:00", "08:00"]);
    }

    #[test]
    fn empty_filter_is_identity() {
        let all = fixture();
        let out = ScheduleFilter::default().apply(&all);
        let ids: Vec<&str> = out.iter().map(|s| s.schedule_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn filters_are_conjunctive_subsets_and_idempotent() {
        let all = fixture();
        let filter = ScheduleFilter {
            teacher_id: Some("t1".into()),
            room_id: Some("r1".into()),
            ..Default::default()
        };
        let once = filter.apply(&all);
        assert_eq!(once.len(), 1);
        assert_eq!(once[0].schedule_id, "1");

        let owned: Vec<Schedule> = once.iter().map(|s| (*s).clone()).collect();
        let twice = filter.apply(&owned);
        assert_eq!(twice.len(), once.len());

        let by_day = ScheduleFilter {
            day: Some(DayOfWeek::Wednesday),
            ..Default::default()
        };
        let wed = by_day.apply(&all);
        assert!(wed.iter().all(|s| all.iter().any(|a| a.schedule_id == s.schedule_id)));
        assert_eq!(wed.len(), 1);
    }

    #[test]
    fn search_is_case_insensitive_across_display_fields() {
        let all = fixture();
        let math = ScheduleFilter {
            search: "math".into(),
            ..Default::default()
        };
        assert_eq!(math.apply(&all).len(), 1);

        let section = ScheduleFilter {
            search: "bscs".into(),
            ..Default::default()
        };
        assert_eq!(section.apply(&all)[0].schedule_id, "3");

        let by_day = ScheduleFilter {
            search: "monday".into(),
            ..Default::default()
        };
        assert_eq!(by_day.apply(&all).len(), 2);

        let none = ScheduleFilter {
            search: "zzz".into(),
            ..Default::default()
        };
        assert!(none.apply(&all).is_empty());
    }

    #[test]
    fn search_falls_back_to_ids_without_display_names() {
        let all = fixture();
        let f = ScheduleFilter {
            search: "SUB-4".into(),
            ..Default::default()
        };
        let out = f.apply(&all);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].schedule_id, "4");
    }

    #[test]
    fn palette_cycles_by_position() {
        assert_eq!(palette_color(0), palette_color(PALETTE.len()));
        assert_ne!(palette_color(0), palette_color(1));
    }

    #[test]
    fn hour_rows_cover_seven_to_eight_pm() {
        let rows: Vec<u32> = hour_rows().collect();
        assert_eq!(rows.first(), Some(&7));
        assert_eq!(rows.last(), Some(&20));
        assert_eq!(hour_label(7), "07:00");
    }
}
