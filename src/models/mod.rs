mod de;

use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// ─── Entity kinds ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Department,
    Course,
    Section,
    Subject,
    Room,
    Teacher,
    Dean,
    Schedule,
}

impl EntityKind {
    pub const ALL: [EntityKind; 8] = [
        EntityKind::Department,
        EntityKind::Course,
        EntityKind::Section,
        EntityKind::Subject,
        EntityKind::Room,
        EntityKind::Teacher,
        EntityKind::Dean,
        EntityKind::Schedule,
    ];

    /// Collection path on the backend, without slashes.
    pub fn path(self) -> &'static str {
        match self {
            Self::Department => "departments",
            Self::Course => "courses",
            Self::Section => "sections",
            Self::Subject => "subjects",
            Self::Room => "rooms",
            Self::Teacher => "teachers",
            Self::Dean => "deans",
            Self::Schedule => "schedules",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Department => "Departments",
            Self::Course => "Courses",
            Self::Section => "Sections",
            Self::Subject => "Subjects",
            Self::Room => "Rooms",
            Self::Teacher => "Teachers",
            Self::Dean => "Deans",
            Self::Schedule => "Schedules",
        }
    }

    pub fn singular(self) -> &'static str {
        match self {
            Self::Department => "Department",
            Self::Course => "Course",
            Self::Section => "Section",
            Self::Subject => "Subject",
            Self::Room => "Room",
            Self::Teacher => "Teacher",
            Self::Dean => "Dean",
            Self::Schedule => "Schedule",
        }
    }

    /// Table header for the entity's list tab. `Resource::cells` yields one
    /// value per column, in this order.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Department => &["Code", "Name", "Description", "Status"],
            Self::Course => &["Code", "Name", "Department", "Status"],
            Self::Section => &["Name", "Course", "Year", "Semester", "Status"],
            Self::Subject => &["Code", "Name", "Units", "Course", "Semester", "Status"],
            Self::Room => &["Name", "Building", "Capacity", "Type", "Status"],
            Self::Teacher | Self::Dean => &["Name", "Email", "Department", "Status"],
            Self::Schedule => &["Day", "Time", "Subject", "Section", "Teacher", "Room"],
        }
    }
}

/// Common surface every CRUD record exposes to the client, store and views.
pub trait Resource: Clone + DeserializeOwned + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    /// Short human-readable name used in pickers and confirmation prompts.
    fn label(&self) -> String;

    fn cells(&self) -> Vec<String>;

    fn details(&self) -> Vec<(&'static str, String)>;

    /// Payload-keyed values used to seed the update form.
    fn form_seed(&self) -> Vec<(&'static str, String)>;
}

// ─── Closed wire enums ──────────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    /// Anything the backend sends outside the six school days, including
    /// a missing or `null` day.
    #[default]
    #[serde(other)]
    Unrecognized,
}

impl DayOfWeek {
    pub const WEEK: [DayOfWeek; 6] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "MONDAY",
            Self::Tuesday => "TUESDAY",
            Self::Wednesday => "WEDNESDAY",
            Self::Thursday => "THURSDAY",
            Self::Friday => "FRIDAY",
            Self::Saturday => "SATURDAY",
            Self::Unrecognized => "UNRECOGNIZED",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Unrecognized => "Unknown day",
        }
    }

    pub fn short(self) -> &'static str {
        match self {
            Self::Monday => "Mon",
            Self::Tuesday => "Tue",
            Self::Wednesday => "Wed",
            Self::Thursday => "Thu",
            Self::Friday => "Fri",
            Self::Saturday => "Sat",
            Self::Unrecognized => "???",
        }
    }

    /// Position within `WEEK`; `None` for an unrecognized day.
    pub fn index(self) -> Option<usize> {
        Self::WEEK.iter().position(|d| *d == self)
    }

    pub fn next(self) -> Self {
        match self.index() {
            Some(i) => Self::WEEK[(i + 1) % Self::WEEK.len()],
            None => Self::Monday,
        }
    }

    pub fn prev(self) -> Self {
        match self.index() {
            Some(0) | None => Self::WEEK[Self::WEEK.len() - 1],
            Some(i) => Self::WEEK[i - 1],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActiveStatus {
    #[default]
    Active,
    Inactive,
    #[serde(other)]
    Unknown,
}

impl ActiveStatus {
    pub const CHOICES: [ActiveStatus; 2] = [ActiveStatus::Active, ActiveStatus::Inactive];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Semester {
    #[default]
    First,
    Second,
    Summer,
    #[serde(other)]
    Unknown,
}

impl Semester {
    pub const CHOICES: [Semester; 3] = [Semester::First, Semester::Second, Semester::Summer];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::First => "FIRST",
            Self::Second => "SECOND",
            Self::Summer => "SUMMER",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::First => "1st Semester",
            Self::Second => "2nd Semester",
            Self::Summer => "Summer",
            Self::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomType {
    #[default]
    Lecture,
    Laboratory,
    Other,
    #[serde(other)]
    Unknown,
}

impl RoomType {
    pub const CHOICES: [RoomType; 3] = [RoomType::Lecture, RoomType::Laboratory, RoomType::Other];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lecture => "LECTURE",
            Self::Laboratory => "LABORATORY",
            Self::Other => "OTHER",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Lecture => "Lecture",
            Self::Laboratory => "Laboratory",
            Self::Other => "Other",
            Self::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    #[default]
    Available,
    Occupied,
    Maintenance,
    #[serde(other)]
    Unknown,
}

impl RoomStatus {
    pub const CHOICES: [RoomStatus; 3] = [
        RoomStatus::Available,
        RoomStatus::Occupied,
        RoomStatus::Maintenance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Occupied => "OCCUPIED",
            Self::Maintenance => "MAINTENANCE",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Occupied => "Occupied",
            Self::Maintenance => "Maintenance",
            Self::Unknown => "Unknown",
        }
    }
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".into())
}

fn stamp(value: &Option<NaiveDateTime>) -> String {
    value
        .map(|t| t.format("%b %d, %Y %H:%M").to_string())
        .unwrap_or_else(|| "-".into())
}

/// Display name when the backend denormalized one, else the raw id.
fn name_or_id(name: &Option<String>, id: &Option<String>) -> String {
    name.clone()
        .filter(|n| !n.is_empty())
        .or_else(|| id.clone())
        .unwrap_or_default()
}

// ─── Departments ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    #[serde(deserialize_with = "de::id")]
    pub department_id: String,
    #[serde(default, deserialize_with = "de::text")]
    pub department_code: String,
    #[serde(default, deserialize_with = "de::text")]
    pub department_name: String,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de::or_default")]
    pub status: ActiveStatus,
    #[serde(default, deserialize_with = "de::timestamp")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "de::timestamp")]
    pub updated_at: Option<NaiveDateTime>,
}

impl Resource for Department {
    const KIND: EntityKind = EntityKind::Department;

    fn id(&self) -> &str {
        &self.department_id
    }

    fn label(&self) -> String {
        self.department_name.clone()
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.department_code.clone(),
            self.department_name.clone(),
            opt(&self.description),
            self.status.label().into(),
        ]
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ID", self.department_id.clone()),
            ("Code", self.department_code.clone()),
            ("Name", self.department_name.clone()),
            ("Description", opt(&self.description)),
            ("Status", self.status.label().into()),
            ("Created", stamp(&self.created_at)),
            ("Updated", stamp(&self.updated_at)),
        ]
    }

    fn form_seed(&self) -> Vec<(&'static str, String)> {
        vec![
            ("departmentCode", self.department_code.clone()),
            ("departmentName", self.department_name.clone()),
            ("description", self.description.clone().unwrap_or_default()),
            ("status", self.status.as_str().into()),
        ]
    }
}

// ─── Courses ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(deserialize_with = "de::id")]
    pub course_id: String,
    #[serde(default, deserialize_with = "de::text")]
    pub course_code: String,
    #[serde(default, deserialize_with = "de::text")]
    pub course_name: String,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub department_id: Option<String>,
    pub department_name: Option<String>,
    #[serde(default, deserialize_with = "de::or_default")]
    pub status: ActiveStatus,
    #[serde(default, deserialize_with = "de::timestamp")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "de::timestamp")]
    pub updated_at: Option<NaiveDateTime>,
}

impl Resource for Course {
    const KIND: EntityKind = EntityKind::Course;

    fn id(&self) -> &str {
        &self.course_id
    }

    fn label(&self) -> String {
        format!("{} {}", self.course_code, self.course_name)
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.course_code.clone(),
            self.course_name.clone(),
            name_or_id(&self.department_name, &self.department_id),
            self.status.label().into(),
        ]
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ID", self.course_id.clone()),
            ("Code", self.course_code.clone()),
            ("Name", self.course_name.clone()),
            ("Description", opt(&self.description)),
            ("Department", name_or_id(&self.department_name, &self.department_id)),
            ("Status", self.status.label().into()),
            ("Created", stamp(&self.created_at)),
            ("Updated", stamp(&self.updated_at)),
        ]
    }

    fn form_seed(&self) -> Vec<(&'static str, String)> {
        vec![
            ("courseCode", self.course_code.clone()),
            ("courseName", self.course_name.clone()),
            ("description", self.description.clone().unwrap_or_default()),
            ("departmentId", self.department_id.clone().unwrap_or_default()),
            ("status", self.status.as_str().into()),
        ]
    }
}

// ─── Sections ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(deserialize_with = "de::id")]
    pub section_id: String,
    #[serde(default, deserialize_with = "de::text")]
    pub section_name: String,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub course_id: Option<String>,
    pub course_name: Option<String>,
    pub year_level: Option<u32>,
    #[serde(default, deserialize_with = "de::or_default")]
    pub semester: Semester,
    #[serde(default, deserialize_with = "de::or_default")]
    pub status: ActiveStatus,
    #[serde(default, deserialize_with = "de::timestamp")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "de::timestamp")]
    pub updated_at: Option<NaiveDateTime>,
}

impl Resource for Section {
    const KIND: EntityKind = EntityKind::Section;

    fn id(&self) -> &str {
        &self.section_id
    }

    fn label(&self) -> String {
        self.section_name.clone()
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.section_name.clone(),
            name_or_id(&self.course_name, &self.course_id),
            self.year_level.map(|y| y.to_string()).unwrap_or_else(|| "-".into()),
            self.semester.label().into(),
            self.status.label().into(),
        ]
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ID", self.section_id.clone()),
            ("Name", self.section_name.clone()),
            ("Course", name_or_id(&self.course_name, &self.course_id)),
            ("Year level", self.year_level.map(|y| y.to_string()).unwrap_or_else(|| "-".into())),
            ("Semester", self.semester.label().into()),
            ("Status", self.status.label().into()),
            ("Created", stamp(&self.created_at)),
            ("Updated", stamp(&self.updated_at)),
        ]
    }

    fn form_seed(&self) -> Vec<(&'static str, String)> {
        vec![
            ("sectionName", self.section_name.clone()),
            ("courseId", self.course_id.clone().unwrap_or_default()),
            ("yearLevel", self.year_level.map(|y| y.to_string()).unwrap_or_default()),
            ("semester", self.semester.as_str().into()),
            ("status", self.status.as_str().into()),
        ]
    }
}

// ─── Subjects ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    #[serde(deserialize_with = "de::id")]
    pub subject_id: String,
    #[serde(default, deserialize_with = "de::text")]
    pub subject_code: String,
    #[serde(default, deserialize_with = "de::text")]
    pub subject_name: String,
    pub units: Option<u32>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub course_id: Option<String>,
    pub course_name: Option<String>,
    #[serde(default, deserialize_with = "de::or_default")]
    pub semester: Semester,
    #[serde(default, deserialize_with = "de::or_default")]
    pub status: ActiveStatus,
    #[serde(default, deserialize_with = "de::timestamp")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "de::timestamp")]
    pub updated_at: Option<NaiveDateTime>,
}

impl Resource for Subject {
    const KIND: EntityKind = EntityKind::Subject;

    fn id(&self) -> &str {
        &self.subject_id
    }

    fn label(&self) -> String {
        format!("{} {}", self.subject_code, self.subject_name)
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.subject_code.clone(),
            self.subject_name.clone(),
            self.units.map(|u| u.to_string()).unwrap_or_else(|| "-".into()),
            name_or_id(&self.course_name, &self.course_id),
            self.semester.label().into(),
            self.status.label().into(),
        ]
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ID", self.subject_id.clone()),
            ("Code", self.subject_code.clone()),
            ("Name", self.subject_name.clone()),
            ("Units", self.units.map(|u| u.to_string()).unwrap_or_else(|| "-".into())),
            ("Course", name_or_id(&self.course_name, &self.course_id)),
            ("Semester", self.semester.label().into()),
            ("Status", self.status.label().into()),
            ("Created", stamp(&self.created_at)),
            ("Updated", stamp(&self.updated_at)),
        ]
    }

    fn form_seed(&self) -> Vec<(&'static str, String)> {
        vec![
            ("subjectCode", self.subject_code.clone()),
            ("subjectName", self.subject_name.clone()),
            ("units", self.units.map(|u| u.to_string()).unwrap_or_default()),
            ("courseId", self.course_id.clone().unwrap_or_default()),
            ("semester", self.semester.as_str().into()),
            ("status", self.status.as_str().into()),
        ]
    }
}

// ─── Rooms ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    #[serde(deserialize_with = "de::id")]
    pub room_id: String,
    #[serde(default, deserialize_with = "de::text")]
    pub room_name: String,
    pub building: Option<String>,
    pub capacity: Option<u32>,
    #[serde(default, deserialize_with = "de::or_default")]
    pub room_type: RoomType,
    #[serde(default, deserialize_with = "de::or_default")]
    pub status: RoomStatus,
    #[serde(default, deserialize_with = "de::timestamp")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "de::timestamp")]
    pub updated_at: Option<NaiveDateTime>,
}

impl Resource for Room {
    const KIND: EntityKind = EntityKind::Room;

    fn id(&self) -> &str {
        &self.room_id
    }

    fn label(&self) -> String {
        self.room_name.clone()
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.room_name.clone(),
            opt(&self.building),
            self.capacity.map(|c| c.to_string()).unwrap_or_else(|| "-".into()),
            self.room_type.label().into(),
            self.status.label().into(),
        ]
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ID", self.room_id.clone()),
            ("Name", self.room_name.clone()),
            ("Building", opt(&self.building)),
            ("Capacity", self.capacity.map(|c| c.to_string()).unwrap_or_else(|| "-".into())),
            ("Type", self.room_type.label().into()),
            ("Status", self.status.label().into()),
            ("Created", stamp(&self.created_at)),
            ("Updated", stamp(&self.updated_at)),
        ]
    }

    fn form_seed(&self) -> Vec<(&'static str, String)> {
        vec![
            ("roomName", self.room_name.clone()),
            ("building", self.building.clone().unwrap_or_default()),
            ("capacity", self.capacity.map(|c| c.to_string()).unwrap_or_default()),
            ("roomType", self.room_type.as_str().into()),
            ("status", self.status.as_str().into()),
        ]
    }
}

// ─── Teachers & Deans ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    #[serde(deserialize_with = "de::id")]
    pub teacher_id: String,
    #[serde(default, deserialize_with = "de::text")]
    pub first_name: String,
    #[serde(default, deserialize_with = "de::text")]
    pub last_name: String,
    #[serde(default, deserialize_with = "de::text")]
    pub email: String,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub department_id: Option<String>,
    pub department_name: Option<String>,
    #[serde(default, deserialize_with = "de::or_default")]
    pub status: ActiveStatus,
    #[serde(default, deserialize_with = "de::timestamp")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "de::timestamp")]
    pub updated_at: Option<NaiveDateTime>,
}

impl Resource for Teacher {
    const KIND: EntityKind = EntityKind::Teacher;

    fn id(&self) -> &str {
        &self.teacher_id
    }

    fn label(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.label(),
            self.email.clone(),
            name_or_id(&self.department_name, &self.department_id),
            self.status.label().into(),
        ]
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ID", self.teacher_id.clone()),
            ("First name", self.first_name.clone()),
            ("Last name", self.last_name.clone()),
            ("Email", self.email.clone()),
            ("Department", name_or_id(&self.department_name, &self.department_id)),
            ("Status", self.status.label().into()),
            ("Created", stamp(&self.created_at)),
            ("Updated", stamp(&self.updated_at)),
        ]
    }

    fn form_seed(&self) -> Vec<(&'static str, String)> {
        vec![
            ("firstName", self.first_name.clone()),
            ("lastName", self.last_name.clone()),
            ("email", self.email.clone()),
            ("departmentId", self.department_id.clone().unwrap_or_default()),
            ("status", self.status.as_str().into()),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dean {
    #[serde(deserialize_with = "de::id")]
    pub dean_id: String,
    #[serde(default, deserialize_with = "de::text")]
    pub first_name: String,
    #[serde(default, deserialize_with = "de::text")]
    pub last_name: String,
    #[serde(default, deserialize_with = "de::text")]
    pub email: String,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub department_id: Option<String>,
    pub department_name: Option<String>,
    #[serde(default, deserialize_with = "de::or_default")]
    pub status: ActiveStatus,
    #[serde(default, deserialize_with = "de::timestamp")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "de::timestamp")]
    pub updated_at: Option<NaiveDateTime>,
}

impl Resource for Dean {
    const KIND: EntityKind = EntityKind::Dean;

    fn id(&self) -> &str {
        &self.dean_id
    }

    fn label(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.label(),
            self.email.clone(),
            name_or_id(&self.department_name, &self.department_id),
            self.status.label().into(),
        ]
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ID", self.dean_id.clone()),
            ("First name", self.first_name.clone()),
            ("Last name", self.last_name.clone()),
            ("Email", self.email.clone()),
            ("Department", name_or_id(&self.department_name, &self.department_id)),
            ("Status", self.status.label().into()),
            ("Created", stamp(&self.created_at)),
            ("Updated", stamp(&self.updated_at)),
        ]
    }

    fn form_seed(&self) -> Vec<(&'static str, String)> {
        vec![
            ("firstName", self.first_name.clone()),
            ("lastName", self.last_name.clone()),
            ("email", self.email.clone()),
            ("departmentId", self.department_id.clone().unwrap_or_default()),
            ("status", self.status.as_str().into()),
        ]
    }
}

// ─── Schedules ──────────────────────────────────────────────────────────────

/// One weekly class meeting. `startTime`/`endTime` stay as the backend's
/// `HH:MM[:SS]` strings; layout code parses them on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(deserialize_with = "de::id")]
    pub schedule_id: String,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub subject_id: Option<String>,
    pub subject_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub teacher_id: Option<String>,
    pub teacher_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub room_id: Option<String>,
    pub room_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub section_id: Option<String>,
    pub section_name: Option<String>,
    #[serde(default, deserialize_with = "de::or_default")]
    pub day_of_week: DayOfWeek,
    #[serde(default, deserialize_with = "de::text")]
    pub start_time: String,
    #[serde(default, deserialize_with = "de::text")]
    pub end_time: String,
    #[serde(default, deserialize_with = "de::timestamp")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "de::timestamp")]
    pub updated_at: Option<NaiveDateTime>,
}

impl Schedule {
    pub fn subject_display(&self) -> String {
        name_or_id(&self.subject_name, &self.subject_id)
    }

    pub fn teacher_display(&self) -> String {
        name_or_id(&self.teacher_name, &self.teacher_id)
    }

    pub fn room_display(&self) -> String {
        name_or_id(&self.room_name, &self.room_id)
    }

    pub fn section_display(&self) -> String {
        name_or_id(&self.section_name, &self.section_id)
    }

    /// `HH:MM–HH:MM`, dropping any seconds component.
    pub fn time_range(&self) -> String {
        format!("{}–{}", short_time(&self.start_time), short_time(&self.end_time))
    }
}

/// `HH:MM` for display; times that do not parse are shown as sent.
pub fn short_time(time: &str) -> String {
    match crate::schedule::minutes_of_day(time) {
        Some(m) => format!("{:02}:{:02}", m / 60, m % 60),
        None => time.to_string(),
    }
}

impl Resource for Schedule {
    const KIND: EntityKind = EntityKind::Schedule;

    fn id(&self) -> &str {
        &self.schedule_id
    }

    fn label(&self) -> String {
        format!(
            "{} · {} {}",
            self.subject_display(),
            self.day_of_week.short(),
            self.time_range()
        )
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.day_of_week.label().into(),
            self.time_range(),
            self.subject_display(),
            self.section_display(),
            self.teacher_display(),
            self.room_display(),
        ]
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ID", self.schedule_id.clone()),
            ("Subject", self.subject_display()),
            ("Section", self.section_display()),
            ("Teacher", self.teacher_display()),
            ("Room", self.room_display()),
            ("Day", self.day_of_week.label().into()),
            ("Time", self.time_range()),
            ("Created", stamp(&self.created_at)),
            ("Updated", stamp(&self.updated_at)),
        ]
    }

    fn form_seed(&self) -> Vec<(&'static str, String)> {
        let day = match self.day_of_week {
            DayOfWeek::Unrecognized => String::new(),
            d => d.as_str().to_string(),
        };
        vec![
            ("subjectId", self.subject_id.clone().unwrap_or_default()),
            ("sectionId", self.section_id.clone().unwrap_or_default()),
            ("teacherId", self.teacher_id.clone().unwrap_or_default()),
            ("roomId", self.room_id.clone().unwrap_or_default()),
            ("dayOfWeek", day),
            ("startTime", short_time(&self.start_time)),
            ("endTime", short_time(&self.end_time)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_deserializes_numeric_ids_and_naive_timestamps() {
        let raw = serde_json::json!({
            "scheduleId": 42,
            "subjectId": 7,
            "subjectName": "Mathematics",
            "teacherId": "t-1",
            "dayOfWeek": "TUESDAY",
            "startTime": "09:00:00",
            "endTime": "10:30:00",
            "createdAt": "2024-06-01T08:15:00"
        });
        let s: Schedule = serde_json::from_value(raw).unwrap();
        assert_eq!(s.schedule_id, "42");
        assert_eq!(s.subject_id.as_deref(), Some("7"));
        assert_eq!(s.day_of_week, DayOfWeek::Tuesday);
        assert_eq!(s.time_range(), "09:00–10:30");
        assert!(s.created_at.is_some());
        assert_eq!(s.room_display(), "");
    }

    #[test]
    fn unknown_day_is_kept_as_unrecognized() {
        let raw = serde_json::json!({
            "scheduleId": "s1",
            "dayOfWeek": "SUNDAY",
            "startTime": "08:00",
            "endTime": "09:00"
        });
        let s: Schedule = serde_json::from_value(raw).unwrap();
        assert_eq!(s.day_of_week, DayOfWeek::Unrecognized);
        assert_eq!(s.day_of_week.index(), None);
    }

    #[test]
    fn unknown_status_does_not_break_the_record() {
        let raw = serde_json::json!({
            "roomId": "r1",
            "roomName": "Lab 1",
            "capacity": 30,
            "roomType": "LABORATORY",
            "status": "RENOVATING"
        });
        let room: Room = serde_json::from_value(raw).unwrap();
        assert_eq!(room.room_type, RoomType::Laboratory);
        assert_eq!(room.status, RoomStatus::Unknown);
    }

    #[test]
    fn short_time_pads_unpadded_hours() {
        assert_eq!(short_time("9:00:00"), "09:00");
        assert_eq!(short_time("13:45:00"), "13:45");
        assert_eq!(short_time("08:05"), "08:05");
        assert_eq!(short_time("noon"), "noon");
    }

    #[test]
    fn null_and_missing_fields_keep_the_record() {
        let rows: Vec<Schedule> = serde_json::from_value(serde_json::json!([
            { "scheduleId": "s1", "dayOfWeek": "MONDAY", "startTime": "08:00", "endTime": "09:00" },
            { "scheduleId": "s2", "dayOfWeek": null, "startTime": null },
            { "scheduleId": "s3" }
        ]))
        .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].day_of_week, DayOfWeek::Monday);
        assert_eq!(rows[1].day_of_week, DayOfWeek::Unrecognized);
        assert_eq!(rows[1].start_time, "");
        assert_eq!(rows[2].day_of_week, DayOfWeek::Unrecognized);

        let rooms: Vec<Room> = serde_json::from_value(serde_json::json!([
            { "roomId": "r1", "roomName": null, "status": null, "roomType": null }
        ]))
        .unwrap();
        assert_eq!(rooms[0].room_name, "");
        assert_eq!(rooms[0].status, RoomStatus::Available);
    }

    #[test]
    fn day_navigation_wraps_within_the_school_week() {
        assert_eq!(DayOfWeek::Saturday.next(), DayOfWeek::Monday);
        assert_eq!(DayOfWeek::Monday.prev(), DayOfWeek::Saturday);
    }

    #[test]
    fn every_kind_has_matching_cell_count() {
        let course: Course = serde_json::from_value(serde_json::json!({
            "courseId": "c1",
            "courseCode": "BSCS",
            "courseName": "Computer Science",
            "departmentId": 3
        }))
        .unwrap();
        assert_eq!(course.cells().len(), EntityKind::Course.columns().len());
        assert_eq!(course.cells()[2], "3");
    }
}
