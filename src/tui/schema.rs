use super::form::{end_after_start, FieldKind, FieldSpec};
use crate::models::*;
use crate::store::Store;

fn choices<I>(items: I) -> FieldKind
where
    I: IntoIterator<Item = (&'static str, &'static str)>,
{
    FieldKind::Choice(
        items
            .into_iter()
            .map(|(v, l)| (v.to_string(), l.to_string()))
            .collect(),
    )
}

fn status() -> FieldKind {
    choices(ActiveStatus::CHOICES.iter().map(|s| (s.as_str(), s.label())))
}

fn semester() -> FieldKind {
    choices(Semester::CHOICES.iter().map(|s| (s.as_str(), s.label())))
}

fn reference(store: &Store, kind: EntityKind) -> FieldKind {
    FieldKind::Reference(store.options(kind))
}

/// Field layout of the add/update form for `kind`. Reference pickers are
/// filled from whatever the store currently holds.
pub fn form_schema(kind: EntityKind, store: &Store) -> Vec<FieldSpec> {
    match kind {
        EntityKind::Department => vec![
            FieldSpec::new("departmentCode", "Code", FieldKind::Text),
            FieldSpec::new("departmentName", "Name", FieldKind::Text),
            FieldSpec::new("description", "Description", FieldKind::Text).optional(),
            FieldSpec::new("status", "Status", status()),
        ],
        EntityKind::Course => vec![
            FieldSpec::new("courseCode", "Code", FieldKind::Text),
            FieldSpec::new("courseName", "Name", FieldKind::Text),
            FieldSpec::new("description", "Description", FieldKind::Text).optional(),
            FieldSpec::new("departmentId", "Department", reference(store, EntityKind::Department)),
            FieldSpec::new("status", "Status", status()),
        ],
        EntityKind::Section => vec![
            FieldSpec::new("sectionName", "Name", FieldKind::Text),
            FieldSpec::new("courseId", "Course", reference(store, EntityKind::Course)),
            FieldSpec::new("yearLevel", "Year level", FieldKind::Number { min: 1 }),
            FieldSpec::new("semester", "Semester", semester()),
            FieldSpec::new("status", "Status", status()),
        ],
        EntityKind::Subject => vec![
            FieldSpec::new("subjectCode", "Code", FieldKind::Text),
            FieldSpec::new("subjectName", "Name", FieldKind::Text),
            FieldSpec::new("units", "Units", FieldKind::Number { min: 1 }),
            FieldSpec::new("courseId", "Course", reference(store, EntityKind::Course)),
            FieldSpec::new("semester", "Semester", semester()),
            FieldSpec::new("status", "Status", status()),
        ],
        EntityKind::Room => vec![
            FieldSpec::new("roomName", "Name", FieldKind::Text),
            FieldSpec::new("building", "Building", FieldKind::Text).optional(),
            FieldSpec::new("capacity", "Capacity", FieldKind::Number { min: 1 }),
            FieldSpec::new(
                "roomType",
                "Type",
                choices(RoomType::CHOICES.iter().map(|t| (t.as_str(), t.label()))),
            ),
            FieldSpec::new(
                "status",
                "Status",
                choices(RoomStatus::CHOICES.iter().map(|s| (s.as_str(), s.label()))),
            ),
        ],
        EntityKind::Teacher | EntityKind::Dean => vec![
            FieldSpec::new("firstName", "First name", FieldKind::Text),
            FieldSpec::new("lastName", "Last name", FieldKind::Text),
            FieldSpec::new("email", "Email", FieldKind::Email),
            FieldSpec::new("departmentId", "Department", reference(store, EntityKind::Department)),
            FieldSpec::new("status", "Status", status()),
        ],
        EntityKind::Schedule => vec![
            FieldSpec::new("subjectId", "Subject", reference(store, EntityKind::Subject)),
            FieldSpec::new("sectionId", "Section", reference(store, EntityKind::Section)),
            FieldSpec::new("teacherId", "Teacher", reference(store, EntityKind::Teacher)),
            FieldSpec::new("roomId", "Room", reference(store, EntityKind::Room)),
            FieldSpec::new(
                "dayOfWeek",
                "Day",
                choices(DayOfWeek::WEEK.iter().map(|d| (d.as_str(), d.label()))),
            ),
            FieldSpec::new("startTime", "Start time", FieldKind::Time),
            FieldSpec::new("endTime", "End time", FieldKind::Time).validate(end_after_start),
        ],
    }
}
