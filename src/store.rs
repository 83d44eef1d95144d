//! In-memory collections for every entity, patched locally after mutations.

use std::collections::HashSet;

use crate::models::*;

/// Run `$body` with `$T` aliased to the record type behind `$kind`.
macro_rules! dispatch {
    ($kind:expr, $T:ident => $body:expr) => {
        match $kind {
            $crate::models::EntityKind::Department => {
                type $T = $crate::models::Department;
                $body
            }
            $crate::models::EntityKind::Course => {
                type $T = $crate::models::Course;
                $body
            }
            $crate::models::EntityKind::Section => {
                type $T = $crate::models::Section;
                $body
            }
            $crate::models::EntityKind::Subject => {
                type $T = $crate::models::Subject;
                $body
            }
            $crate::models::EntityKind::Room => {
                type $T = $crate::models::Room;
                $body
            }
            $crate::models::EntityKind::Teacher => {
                type $T = $crate::models::Teacher;
                $body
            }
            $crate::models::EntityKind::Dean => {
                type $T = $crate::models::Dean;
                $body
            }
            $crate::models::EntityKind::Schedule => {
                type $T = $crate::models::Schedule;
                $body
            }
        }
    };
}
pub(crate) use dispatch;

/// A record of any kind, as returned by a create/update/get call.
#[derive(Debug, Clone)]
pub enum Record {
    Department(Department),
    Course(Course),
    Section(Section),
    Subject(Subject),
    Room(Room),
    Teacher(Teacher),
    Dean(Dean),
    Schedule(Schedule),
}

impl Record {
    pub fn kind(&self) -> EntityKind {
        match self {
            Record::Department(_) => EntityKind::Department,
            Record::Course(_) => EntityKind::Course,
            Record::Section(_) => EntityKind::Section,
            Record::Subject(_) => EntityKind::Subject,
            Record::Room(_) => EntityKind::Room,
            Record::Teacher(_) => EntityKind::Teacher,
            Record::Dean(_) => EntityKind::Dean,
            Record::Schedule(_) => EntityKind::Schedule,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Record::Department(r) => r.label(),
            Record::Course(r) => r.label(),
            Record::Section(r) => r.label(),
            Record::Subject(r) => r.label(),
            Record::Room(r) => r.label(),
            Record::Teacher(r) => r.label(),
            Record::Dean(r) => r.label(),
            Record::Schedule(r) => r.label(),
        }
    }
}

/// Ties a record type to its collection in [`Store`].
pub trait Stored: Resource {
    fn items(store: &Store) -> &Vec<Self>;
    fn items_mut(store: &mut Store) -> &mut Vec<Self>;
    fn into_record(self) -> Record;
}

macro_rules! stored {
    ($T:ident, $field:ident) => {
        impl Stored for $T {
            fn items(store: &Store) -> &Vec<Self> {
                &store.$field
            }

            fn items_mut(store: &mut Store) -> &mut Vec<Self> {
                &mut store.$field
            }

            fn into_record(self) -> Record {
                Record::$T(self)
            }
        }
    };
}

stored!(Department, departments);
stored!(Course, courses);
stored!(Section, sections);
stored!(Subject, subjects);
stored!(Room, rooms);
stored!(Teacher, teachers);
stored!(Dean, deans);
stored!(Schedule, schedules);

#[derive(Debug, Default)]
pub struct Store {
    pub departments: Vec<Department>,
    pub courses: Vec<Course>,
    pub sections: Vec<Section>,
    pub subjects: Vec<Subject>,
    pub rooms: Vec<Room>,
    pub teachers: Vec<Teacher>,
    pub deans: Vec<Dean>,
    pub schedules: Vec<Schedule>,
    /// Kinds whose last load failed; their pickers offer nothing.
    pub failed: HashSet<EntityKind>,
}

impl Store {
    /// Replace a whole collection after a load. `Err` clears it.
    pub fn set<T: Stored>(&mut self, loaded: Result<Vec<T>, String>) -> Option<String> {
        match loaded {
            Ok(items) => {
                self.failed.remove(&T::KIND);
                *T::items_mut(self) = items;
                None
            }
            Err(message) => {
                self.failed.insert(T::KIND);
                T::items_mut(self).clear();
                Some(message)
            }
        }
    }

    /// Insert a new record or replace the one with the same id in place.
    pub fn upsert<T: Stored>(&mut self, record: T) {
        let items = T::items_mut(self);
        match items.iter().position(|r| r.id() == record.id()) {
            Some(i) => items[i] = record,
            None => items.push(record),
        }
    }

    pub fn upsert_record(&mut self, record: Record) {
        match record {
            Record::Department(r) => self.upsert(r),
            Record::Course(r) => self.upsert(r),
            Record::Section(r) => self.upsert(r),
            Record::Subject(r) => self.upsert(r),
            Record::Room(r) => self.upsert(r),
            Record::Teacher(r) => self.upsert(r),
            Record::Dean(r) => self.upsert(r),
            Record::Schedule(r) => self.upsert(r),
        }
    }

    pub fn remove(&mut self, kind: EntityKind, id: &str) -> bool {
        dispatch!(kind, T => {
            let items = T::items_mut(self);
            let before = items.len();
            items.retain(|r| r.id() != id);
            items.len() != before
        })
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        dispatch!(kind, T => T::items(self).len())
    }

    pub fn rows(&self, kind: EntityKind) -> Vec<Vec<String>> {
        dispatch!(kind, T => T::items(self).iter().map(Resource::cells).collect())
    }

    pub fn id_at(&self, kind: EntityKind, index: usize) -> Option<String> {
        dispatch!(kind, T => T::items(self).get(index).map(|r| r.id().to_string()))
    }

    pub fn contains(&self, kind: EntityKind, id: &str) -> bool {
        dispatch!(kind, T => T::items(self).iter().any(|r| r.id() == id))
    }

    pub fn label(&self, kind: EntityKind, id: &str) -> Option<String> {
        dispatch!(kind, T => T::items(self).iter().find(|r| r.id() == id).map(Resource::label))
    }

    pub fn details(&self, kind: EntityKind, id: &str) -> Option<Vec<(&'static str, String)>> {
        dispatch!(kind, T => T::items(self).iter().find(|r| r.id() == id).map(Resource::details))
    }

    pub fn form_seed(&self, kind: EntityKind, id: &str) -> Option<Vec<(&'static str, String)>> {
        dispatch!(kind, T => T::items(self).iter().find(|r| r.id() == id).map(Resource::form_seed))
    }

    /// `(id, label)` pairs for reference pickers, sorted by label.
    pub fn options(&self, kind: EntityKind) -> Vec<(String, String)> {
        let mut options: Vec<(String, String)> = dispatch!(kind, T => T::items(self)
            .iter()
            .map(|r| (r.id().to_string(), r.label()))
            .collect());
        options.sort_by(|a, b| a.1.to_lowercase().cmp(&b.1.to_lowercase()));
        options
    }
}
