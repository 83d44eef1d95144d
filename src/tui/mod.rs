pub mod calendar;
pub mod event;
pub mod form;
pub mod schema;
pub mod ui;

use crate::api::{ApiError, SchoolClient};
use crate::config::Session;
use crate::models::*;
use crate::schedule::print::{self, PrintHeading, PrintLayout};
use crate::schedule::{self as layout, ScheduleFilter};
use crate::store::{dispatch, Record, Store, Stored};
use chrono::{DateTime, Local};
use form::{Form, FormMode};
use ratatui::widgets::ListState as RListState;
use serde_json::Value;
use tokio::sync::oneshot;

// ─── Schedule View Mode ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleViewMode {
    Calendar,
    List,
}

impl ScheduleViewMode {
    pub fn toggle(self) -> Self {
        match self {
            Self::Calendar => Self::List,
            Self::List => Self::Calendar,
        }
    }
}

// ─── Background Results ─────────────────────────────────────────────────────

pub struct FetchResult {
    pub generation: u64,
    pub departments: Result<Vec<Department>, String>,
    pub courses: Result<Vec<Course>, String>,
    pub sections: Result<Vec<Section>, String>,
    pub subjects: Result<Vec<Subject>, String>,
    pub rooms: Result<Vec<Room>, String>,
    pub teachers: Result<Vec<Teacher>, String>,
    pub deans: Result<Vec<Dean>, String>,
    pub schedules: Result<Vec<Schedule>, String>,
    pub fetched_at: DateTime<Local>,
}

#[derive(Debug)]
pub enum Mutation {
    Saved(Record),
    Deleted { id: String },
}

pub struct MutationResult {
    pub kind: EntityKind,
    pub outcome: Result<Mutation, String>,
}

pub struct DetailResult {
    pub token: u64,
    pub outcome: Result<Record, String>,
}

// ─── Modals ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Search,
    Teacher,
    Room,
    Subject,
    Day,
}

impl FilterField {
    pub const ALL: [FilterField; 5] = [
        FilterField::Search,
        FilterField::Teacher,
        FilterField::Room,
        FilterField::Subject,
        FilterField::Day,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Search => "Search",
            Self::Teacher => "Teacher",
            Self::Room => "Room",
            Self::Subject => "Subject",
            Self::Day => "Day",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Default)]
pub enum Modal {
    #[default]
    None,
    /// Read-only detail of one record. `loading` is set while a fresh copy
    /// is being fetched.
    View {
        kind: EntityKind,
        id: String,
        loading: bool,
    },
    Form(Form),
    ConfirmDelete {
        kind: EntityKind,
        id: String,
        label: String,
        deleting: bool,
    },
    Filter(FilterField),
}

/// Drawn above whatever modal is open; dismissing it returns to that modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPopup {
    pub title: String,
    pub message: String,
}

// ─── Navigation ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Schedule,
    Departments,
    Courses,
    Sections,
    Subjects,
    Rooms,
    Teachers,
    Deans,
}

impl Tab {
    pub const ALL: [Tab; 8] = [
        Tab::Schedule,
        Tab::Departments,
        Tab::Courses,
        Tab::Sections,
        Tab::Subjects,
        Tab::Rooms,
        Tab::Teachers,
        Tab::Deans,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Schedule => "Schedule",
            other => other.kind().title(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Tab::Schedule => EntityKind::Schedule,
            Tab::Departments => EntityKind::Department,
            Tab::Courses => EntityKind::Course,
            Tab::Sections => EntityKind::Section,
            Tab::Subjects => EntityKind::Subject,
            Tab::Rooms => EntityKind::Room,
            Tab::Teachers => EntityKind::Teacher,
            Tab::Deans => EntityKind::Dean,
        }
    }

    pub fn next(&self) -> Tab {
        let idx = Tab::ALL.iter().position(|t| t == self).unwrap_or(0);
        Tab::ALL[(idx + 1) % Tab::ALL.len()]
    }

    pub fn prev(&self) -> Tab {
        let idx = Tab::ALL.iter().position(|t| t == self).unwrap_or(0);
        if idx == 0 {
            Tab::ALL[Tab::ALL.len() - 1]
        } else {
            Tab::ALL[idx - 1]
        }
    }
}

// ─── App State ──────────────────────────────────────────────────────────────

pub struct App {
    pub client: SchoolClient,
    pub session: Session,
    pub running: bool,
    pub active_tab: Tab,

    // Data
    pub store: Store,

    // UI state
    /// One per entity kind, in `EntityKind::ALL` order. The schedule entry
    /// tracks the filtered list view.
    pub table_states: [ListState; 8],
    pub schedule_view: ScheduleViewMode,
    pub selected_day: DayOfWeek,
    /// Index of the highlighted block within the selected day's bucket.
    pub selected_block: usize,
    pub filter: ScheduleFilter,
    pub modal: Modal,
    pub error: Option<ErrorPopup>,

    // Status
    pub status_message: String,
    pub loading: bool,
    pub needs_refresh: bool,
    pub fetched_at: Option<DateTime<Local>>,
    /// One line per collection whose last load failed.
    pub load_errors: Vec<String>,

    // Background channels
    fetch_generation: u64,
    pub fetch_rx: Option<oneshot::Receiver<FetchResult>>,
    pub mutation_rx: Option<oneshot::Receiver<MutationResult>>,
    detail_token: u64,
    pub detail_rx: Option<oneshot::Receiver<DetailResult>>,

    /// Set by the event handler; the main loop renders and hands off the
    /// print document after the next frame is drawn.
    pub print_requested: Option<PrintLayout>,

    // Incremented each frame; used to drive the loading spinner.
    pub frame_count: u64,
}

/// Tracks logical selection plus a persistent ratatui scroll offset.
///
/// `inner` carries the ratatui scroll offset; render functions sync
/// `inner.selected` before calling `render_stateful_widget`, so ratatui
/// adjusts the offset only when the cursor reaches a viewport edge.
pub struct ListState {
    pub inner: RListState,
    pub selected: usize,
    pub len: usize,
}

impl ListState {
    pub fn new() -> Self {
        let mut inner = RListState::default();
        inner.select(Some(0));
        Self { inner, selected: 0, len: 0 }
    }

    /// Move down, clamped at the last item.
    pub fn select_next(&mut self) {
        if self.len > 0 && self.selected + 1 < self.len {
            self.selected += 1;
        }
    }

    /// Move up, clamped at the first item.
    pub fn select_prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }
}

impl App {
    pub fn new(client: SchoolClient, session: Session) -> Self {
        Self {
            client,
            session,
            running: true,
            active_tab: Tab::Schedule,
            store: Store::default(),
            table_states: std::array::from_fn(|_| ListState::new()),
            schedule_view: ScheduleViewMode::Calendar,
            selected_day: DayOfWeek::Monday,
            selected_block: 0,
            filter: ScheduleFilter::default(),
            modal: Modal::None,
            error: None,
            status_message: "Loading...".into(),
            loading: true,
            needs_refresh: false,
            fetched_at: None,
            load_errors: Vec::new(),
            fetch_generation: 0,
            fetch_rx: None,
            mutation_rx: None,
            detail_token: 0,
            detail_rx: None,
            print_requested: None,
            frame_count: 0,
        }
    }

    // ── Loading ─────────────────────────────────────────────────────────

    /// Spawn a background task that loads every collection at once. Call
    /// `poll_fetch_result` each frame to collect the result. No-ops if a
    /// fetch is already running.
    pub fn start_fetch(&mut self) {
        if self.fetch_rx.is_some() {
            return;
        }
        self.fetch_generation += 1;
        let generation = self.fetch_generation;
        let client = self.client.clone();
        let (tx, rx) = oneshot::channel();
        self.fetch_rx = Some(rx);
        self.loading = true;
        self.status_message = "Syncing in background…".into();
        tracing::info!(generation, "loading all collections");
        tokio::spawn(async move {
            let result = fetch_all(client, generation).await;
            let _ = tx.send(result);
        });
    }

    /// Check the background fetch channel without blocking. Returns `true`
    /// and applies the result when data has arrived.
    pub fn poll_fetch_result(&mut self) -> bool {
        let result = match self.fetch_rx.as_mut() {
            None => return false,
            Some(rx) => match rx.try_recv() {
                Ok(r) => r,
                Err(oneshot::error::TryRecvError::Empty) => return false,
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.fetch_rx = None;
                    self.loading = false;
                    return false;
                }
            },
        };
        self.fetch_rx = None;
        if result.generation != self.fetch_generation {
            tracing::debug!(generation = result.generation, "discarding superseded fetch");
            return false;
        }
        self.apply_fetch_result(result);
        true
    }

    fn apply_fetch_result(&mut self, result: FetchResult) {
        self.load_errors = [
            (EntityKind::Department, self.store.set(result.departments)),
            (EntityKind::Course, self.store.set(result.courses)),
            (EntityKind::Section, self.store.set(result.sections)),
            (EntityKind::Subject, self.store.set(result.subjects)),
            (EntityKind::Room, self.store.set(result.rooms)),
            (EntityKind::Teacher, self.store.set(result.teachers)),
            (EntityKind::Dean, self.store.set(result.deans)),
            (EntityKind::Schedule, self.store.set(result.schedules)),
        ]
        .into_iter()
        .filter_map(|(kind, err)| {
            err.map(|e| {
                tracing::warn!(kind = kind.path(), error = %e, "collection failed to load");
                format!("Failed to load {}: {e}", kind.title().to_lowercase())
            })
        })
        .collect();

        for s in &self.store.schedules {
            if s.day_of_week.index().is_none() {
                tracing::warn!(schedule_id = %s.schedule_id, "schedule has an unrecognized day");
            } else if layout::place(&s.start_time, &s.end_time, 1.0).is_none() {
                tracing::warn!(
                    schedule_id = %s.schedule_id,
                    start = %s.start_time,
                    end = %s.end_time,
                    "schedule times cannot be placed on the grid"
                );
            }
        }

        self.sync_lengths();
        self.fetched_at = Some(result.fetched_at);
        self.loading = false;

        let synced = result.fetched_at.format("%b %d %H:%M");
        self.status_message = if self.load_errors.is_empty() {
            format!(
                "Welcome, {}! {} schedules loaded. Synced {synced}.",
                self.session.user_name,
                self.store.schedules.len()
            )
        } else {
            format!("Synced {synced} with {} failed collection(s).", self.load_errors.len())
        };
    }

    /// A load that started before a local patch would overwrite it with an
    /// older snapshot: drop it and queue a fresh one.
    fn supersede_fetch(&mut self) {
        if self.fetch_rx.take().is_none() {
            return;
        }
        self.fetch_generation += 1;
        self.needs_refresh = true;
        tracing::debug!(generation = self.fetch_generation, "in-flight fetch superseded by a mutation");
    }

    /// Re-clamp every table cursor against its current row count.
    pub fn sync_lengths(&mut self) {
        for (i, kind) in EntityKind::ALL.into_iter().enumerate() {
            let len = match kind {
                EntityKind::Schedule => self.filtered_schedules().len(),
                other => self.store.len(other),
            };
            self.table_states[i].set_len(len);
        }
        let in_day = self.day_schedules().len();
        if self.selected_block >= in_day {
            self.selected_block = in_day.saturating_sub(1);
        }
    }

    pub fn table_state(&self, kind: EntityKind) -> &ListState {
        &self.table_states[kind_index(kind)]
    }

    pub fn table_state_mut(&mut self, kind: EntityKind) -> &mut ListState {
        &mut self.table_states[kind_index(kind)]
    }

    // ── Schedule view ───────────────────────────────────────────────────

    /// Schedules passing the current filter, in backend order.
    pub fn filtered_schedules(&self) -> Vec<&Schedule> {
        self.filter.apply(&self.store.schedules)
    }

    /// Filtered schedules on the selected day, earliest first.
    pub fn day_schedules(&self) -> Vec<&Schedule> {
        let filtered = self.filtered_schedules();
        let buckets = layout::group_by_day(filtered.iter().copied());
        buckets.day(self.selected_day).to_vec()
    }

    pub fn selected_schedule(&self) -> Option<&Schedule> {
        match self.schedule_view {
            ScheduleViewMode::Calendar => self.day_schedules().get(self.selected_block).copied(),
            ScheduleViewMode::List => self
                .filtered_schedules()
                .get(self.table_state(EntityKind::Schedule).selected)
                .copied(),
        }
    }

    pub fn select_day(&mut self, day: DayOfWeek) {
        self.selected_day = day;
        self.selected_block = 0;
    }

    pub fn select_block_next(&mut self) {
        if self.selected_block + 1 < self.day_schedules().len() {
            self.selected_block += 1;
        }
    }

    pub fn select_block_prev(&mut self) {
        self.selected_block = self.selected_block.saturating_sub(1);
    }

    /// The calendar's selection callback: show the record in the view modal.
    pub fn on_schedule_selected(&mut self) {
        let Some(id) = self.selected_schedule().map(|s| s.schedule_id.clone()) else {
            return;
        };
        self.open_view(EntityKind::Schedule, id);
    }

    pub fn on_filter_changed(&mut self) {
        self.selected_block = 0;
        self.table_state_mut(EntityKind::Schedule).selected = 0;
        self.sync_lengths();
    }

    pub fn clear_filter(&mut self) {
        self.filter = ScheduleFilter::default();
        self.on_filter_changed();
        self.status_message = "Filters cleared.".into();
    }

    /// Step a picker filter through "All" and then each option.
    pub fn cycle_filter(&mut self, field: FilterField, forward: bool) {
        let ids = |app: &App, kind: EntityKind| -> Vec<String> {
            app.store.options(kind).into_iter().map(|(id, _)| id).collect()
        };
        match field {
            FilterField::Search => return,
            FilterField::Teacher => {
                let options = ids(self, EntityKind::Teacher);
                self.filter.teacher_id = step(&options, self.filter.teacher_id.as_ref(), forward);
            }
            FilterField::Room => {
                let options = ids(self, EntityKind::Room);
                self.filter.room_id = step(&options, self.filter.room_id.as_ref(), forward);
            }
            FilterField::Subject => {
                let options = ids(self, EntityKind::Subject);
                self.filter.subject_id = step(&options, self.filter.subject_id.as_ref(), forward);
            }
            FilterField::Day => {
                self.filter.day = step(&DayOfWeek::WEEK, self.filter.day.as_ref(), forward);
            }
        }
        self.on_filter_changed();
    }

    /// Human-readable value of one filter for the panel and print heading.
    pub fn filter_display(&self, field: FilterField) -> String {
        let named = |kind: EntityKind, id: &Option<String>| match id {
            None => "All".to_string(),
            Some(id) => self.store.label(kind, id).unwrap_or_else(|| id.clone()),
        };
        match field {
            FilterField::Search => self.filter.search.clone(),
            FilterField::Teacher => named(EntityKind::Teacher, &self.filter.teacher_id),
            FilterField::Room => named(EntityKind::Room, &self.filter.room_id),
            FilterField::Subject => named(EntityKind::Subject, &self.filter.subject_id),
            FilterField::Day => self
                .filter
                .day
                .map(|d| d.label().to_string())
                .unwrap_or_else(|| "All".into()),
        }
    }

    // ── Print ───────────────────────────────────────────────────────────

    pub fn request_print(&mut self, layout: PrintLayout) {
        self.print_requested = Some(layout);
        self.status_message = "Preparing print view…".into();
    }

    /// HTML for the filtered schedules, headed by the active filters.
    pub fn print_document(&self, layout: PrintLayout) -> String {
        let active: Vec<String> = FilterField::ALL
            .into_iter()
            .filter(|f| match f {
                FilterField::Search => !self.filter.search.trim().is_empty(),
                FilterField::Teacher => self.filter.teacher_id.is_some(),
                FilterField::Room => self.filter.room_id.is_some(),
                FilterField::Subject => self.filter.subject_id.is_some(),
                FilterField::Day => self.filter.day.is_some(),
            })
            .map(|f| format!("{}: {}", f.label(), self.filter_display(f)))
            .collect();
        let heading = PrintHeading {
            title: "Class Schedule".into(),
            subtitle: if active.is_empty() {
                None
            } else {
                Some(active.join(" · "))
            },
        };
        print::render(layout, &heading, &self.filtered_schedules())
    }

    // ── Modals ──────────────────────────────────────────────────────────

    /// Id of the highlighted record on the active tab.
    pub fn selected_id(&self) -> Option<String> {
        match self.active_tab {
            Tab::Schedule => self.selected_schedule().map(|s| s.schedule_id.clone()),
            tab => {
                let kind = tab.kind();
                self.store.id_at(kind, self.table_state(kind).selected)
            }
        }
    }

    pub fn close_modal(&mut self) {
        if matches!(self.modal, Modal::View { .. }) {
            // Invalidate any detail fetch still in flight.
            self.detail_token += 1;
            self.detail_rx = None;
        }
        self.modal = Modal::None;
    }

    fn ensure_can_edit(&mut self) -> bool {
        if self.session.can_edit() {
            return true;
        }
        self.status_message = format!("{} accounts are read-only.", self.session.role.label());
        false
    }

    pub fn open_view(&mut self, kind: EntityKind, id: String) {
        if !self.store.contains(kind, &id) {
            return;
        }
        self.detail_token += 1;
        self.detail_rx = None;
        let refresh = matches!(kind, EntityKind::Teacher | EntityKind::Dean);
        self.modal = Modal::View {
            kind,
            id: id.clone(),
            loading: refresh,
        };
        if !refresh {
            return;
        }

        let token = self.detail_token;
        let client = self.client.clone();
        let (tx, rx) = oneshot::channel();
        self.detail_rx = Some(rx);
        tokio::spawn(async move {
            let outcome = dispatch!(kind, T => client
                .get_by_id::<T>(&id)
                .await
                .map(Stored::into_record)
                .map_err(|e| failure(kind, e)));
            let _ = tx.send(DetailResult { token, outcome });
        });
    }

    /// Apply a finished detail fetch if its view modal is still the one open.
    pub fn poll_detail_result(&mut self) -> bool {
        let result = match self.detail_rx.as_mut() {
            None => return false,
            Some(rx) => match rx.try_recv() {
                Ok(r) => r,
                Err(oneshot::error::TryRecvError::Empty) => return false,
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.detail_rx = None;
                    return false;
                }
            },
        };
        self.detail_rx = None;

        let Modal::View { loading, .. } = &mut self.modal else {
            return false;
        };
        if result.token != self.detail_token {
            return false;
        }
        *loading = false;
        match result.outcome {
            Ok(record) => self.store.upsert_record(record),
            Err(message) => {
                tracing::warn!(%message, "detail refresh failed");
                self.status_message = format!("Could not refresh details: {message}");
            }
        }
        true
    }

    pub fn open_add_form(&mut self) {
        if !self.ensure_can_edit() {
            return;
        }
        let kind = self.active_tab.kind();
        let schema = schema::form_schema(kind, &self.store);
        self.modal = Modal::Form(Form::new(kind, FormMode::Add, schema, &[]));
    }

    pub fn open_update_form(&mut self) {
        if !self.ensure_can_edit() {
            return;
        }
        let kind = self.active_tab.kind();
        let Some(id) = self.selected_id() else {
            return;
        };
        let Some(seed) = self.store.form_seed(kind, &id) else {
            return;
        };
        let schema = schema::form_schema(kind, &self.store);
        self.modal = Modal::Form(Form::new(kind, FormMode::Update { id }, schema, &seed));
    }

    /// Validate the open form and, if clean, send it in the background.
    pub fn submit_form(&mut self) {
        if self.mutation_rx.is_some() || !self.ensure_can_edit() {
            return;
        }
        let Modal::Form(form) = &mut self.modal else {
            return;
        };
        let Some(payload) = form.begin_submit() else {
            return;
        };
        let kind = form.kind;
        let mode = form.mode.clone();
        let client = self.client.clone();
        let (tx, rx) = oneshot::channel();
        self.mutation_rx = Some(rx);
        self.status_message = format!("Saving {}…", kind.singular().to_lowercase());
        tokio::spawn(async move {
            let outcome = save(&client, kind, &mode, &payload).await;
            let _ = tx.send(MutationResult { kind, outcome });
        });
    }

    pub fn open_delete_confirm(&mut self) {
        if !self.ensure_can_edit() {
            return;
        }
        let kind = self.active_tab.kind();
        let Some(id) = self.selected_id() else {
            return;
        };
        let label = self.store.label(kind, &id).unwrap_or_else(|| id.clone());
        self.modal = Modal::ConfirmDelete {
            kind,
            id,
            label,
            deleting: false,
        };
    }

    pub fn confirm_delete(&mut self) {
        if self.mutation_rx.is_some() || !self.ensure_can_edit() {
            return;
        }
        let Modal::ConfirmDelete { kind, id, deleting, .. } = &mut self.modal else {
            return;
        };
        if *deleting {
            return;
        }
        *deleting = true;
        let kind = *kind;
        let id = id.clone();
        let client = self.client.clone();
        let (tx, rx) = oneshot::channel();
        self.mutation_rx = Some(rx);
        tokio::spawn(async move {
            let outcome = client
                .delete(kind, &id)
                .await
                .map(|()| Mutation::Deleted { id })
                .map_err(|e| failure(kind, e));
            let _ = tx.send(MutationResult { kind, outcome });
        });
    }

    /// Poll for a finished create/update/delete. Returns true when done.
    pub fn poll_mutation_result(&mut self) -> bool {
        let result = match self.mutation_rx.as_mut() {
            None => return false,
            Some(rx) => match rx.try_recv() {
                Ok(r) => r,
                Err(oneshot::error::TryRecvError::Empty) => return false,
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.mutation_rx = None;
                    return false;
                }
            },
        };
        self.mutation_rx = None;
        let noun = result.kind.singular();

        match result.outcome {
            Ok(Mutation::Saved(record)) => {
                tracing::info!(kind = record.kind().path(), "record saved");
                self.status_message = format!("{noun} \"{}\" saved.", record.label());
                self.store.upsert_record(record);
                self.supersede_fetch();
                if matches!(self.modal, Modal::Form(_)) {
                    self.modal = Modal::None;
                }
            }
            Ok(Mutation::Deleted { id }) => {
                tracing::info!(kind = result.kind.path(), %id, "record deleted");
                self.store.remove(result.kind, &id);
                self.supersede_fetch();
                self.status_message = format!("{noun} deleted.");
                if matches!(self.modal, Modal::ConfirmDelete { .. }) {
                    self.modal = Modal::None;
                }
            }
            Err(message) => {
                tracing::warn!(kind = result.kind.path(), %message, "mutation failed");
                match &mut self.modal {
                    Modal::Form(form) => form.fail(message),
                    Modal::ConfirmDelete { deleting, .. } => {
                        *deleting = false;
                        self.error = Some(ErrorPopup {
                            title: format!("Could not delete {}", noun.to_lowercase()),
                            message,
                        });
                    }
                    _ => {
                        self.error = Some(ErrorPopup {
                            title: format!("{noun} request failed"),
                            message,
                        });
                    }
                }
            }
        }
        self.sync_lengths();
        true
    }

    /// Cursor of whichever list the arrow keys drive on the active tab.
    pub fn active_list_state_mut(&mut self) -> &mut ListState {
        let kind = self.active_tab.kind();
        self.table_state_mut(kind)
    }
}

fn kind_index(kind: EntityKind) -> usize {
    EntityKind::ALL.iter().position(|k| *k == kind).unwrap_or(0)
}

/// Move through `None, options[0], …, options[n-1]` and wrap.
fn step<T: Clone + PartialEq>(options: &[T], current: Option<&T>, forward: bool) -> Option<T> {
    let slots = options.len() + 1;
    let pos = current
        .and_then(|c| options.iter().position(|o| o == c))
        .map_or(0, |i| i + 1);
    let next = if forward {
        (pos + 1) % slots
    } else {
        (pos + slots - 1) % slots
    };
    next.checked_sub(1).map(|i| options[i].clone())
}

// ─── Background tasks ───────────────────────────────────────────────────────

/// Flatten a request error into the message shown to the user.
fn failure(kind: EntityKind, e: ApiError) -> String {
    tracing::debug!(kind = kind.path(), status = ?e.status(), error = ?e, "request failed");
    e.user_message()
}

async fn fetch_all(client: SchoolClient, generation: u64) -> FetchResult {
    let (departments, courses, sections, subjects, rooms, teachers, deans, schedules) = tokio::join!(
        client.list::<Department>(),
        client.list::<Course>(),
        client.list::<Section>(),
        client.list::<Subject>(),
        client.list::<Room>(),
        client.list::<Teacher>(),
        client.list::<Dean>(),
        client.list::<Schedule>(),
    );
    FetchResult {
        generation,
        departments: departments.map_err(|e| failure(EntityKind::Department, e)),
        courses: courses.map_err(|e| failure(EntityKind::Course, e)),
        sections: sections.map_err(|e| failure(EntityKind::Section, e)),
        subjects: subjects.map_err(|e| failure(EntityKind::Subject, e)),
        rooms: rooms.map_err(|e| failure(EntityKind::Room, e)),
        teachers: teachers.map_err(|e| failure(EntityKind::Teacher, e)),
        deans: deans.map_err(|e| failure(EntityKind::Dean, e)),
        schedules: schedules.map_err(|e| failure(EntityKind::Schedule, e)),
        fetched_at: Local::now(),
    }
}

async fn save(
    client: &SchoolClient,
    kind: EntityKind,
    mode: &FormMode,
    payload: &Value,
) -> Result<Mutation, String> {
    dispatch!(kind, T => {
        let saved = match mode {
            FormMode::Add => client.create::<T>(payload).await,
            FormMode::Update { id } => client.update::<T>(id, payload).await,
        };
        saved
            .map(|r| Mutation::Saved(r.into_record()))
            .map_err(|e| failure(kind, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Role;
    use crate::schedule::tests::schedule;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    fn app_for(url: &str, role: Role) -> App {
        let client = SchoolClient::new(url, None).unwrap();
        App::new(
            client,
            Session {
                user_name: "Registrar".into(),
                role,
            },
        )
    }

    fn offline(role: Role) -> App {
        app_for("http://127.0.0.1:9/api/", role)
    }

    async fn wait_for(mut poll: impl FnMut() -> bool) {
        for _ in 0..200 {
            if poll() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("background task did not finish");
    }

    fn seed_references(app: &mut App) {
        let subject: Subject =
            serde_json::from_value(json!({ "subjectId": "sub-1", "subjectName": "Mathematics" }))
                .unwrap();
        let section: Section =
            serde_json::from_value(json!({ "sectionId": "sec-1", "sectionName": "BSCS-1A" }))
                .unwrap();
        let teacher: Teacher = serde_json::from_value(
            json!({ "teacherId": "t-1", "firstName": "Ada", "lastName": "Lovelace" }),
        )
        .unwrap();
        let room: Room =
            serde_json::from_value(json!({ "roomId": "r-1", "roomName": "Room 101" })).unwrap();
        app.store.upsert(subject);
        app.store.upsert(section);
        app.store.upsert(teacher);
        app.store.upsert(room);
    }

    #[tokio::test]
    async fn invalid_schedule_form_never_reaches_the_backend_then_saves() {
        let server = MockServer::start_async().await;
        let create = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/schedules").json_body(json!({
                    "subjectId": "sub-1",
                    "sectionId": "sec-1",
                    "teacherId": "t-1",
                    "roomId": "r-1",
                    "dayOfWeek": "MONDAY",
                    "startTime": "10:00:00",
                    "endTime": "11:00:00"
                }));
                then.status(201).json_body(json!({
                    "scheduleId": 77,
                    "subjectId": "sub-1",
                    "subjectName": "Mathematics",
                    "dayOfWeek": "MONDAY",
                    "startTime": "10:00:00",
                    "endTime": "11:00:00"
                }));
            })
            .await;

        let mut app = app_for(&server.url("/api/"), Role::Admin);
        seed_references(&mut app);
        app.open_add_form();
        let Modal::Form(form) = &mut app.modal else {
            panic!("form did not open");
        };
        form.set_value("subjectId", "sub-1");
        form.set_value("sectionId", "sec-1");
        form.set_value("teacherId", "t-1");
        form.set_value("roomId", "r-1");
        form.set_value("startTime", "10:00");
        form.set_value("endTime", "09:00");

        app.submit_form();
        assert!(app.mutation_rx.is_none());
        let Modal::Form(form) = &mut app.modal else {
            panic!("form closed on invalid input");
        };
        assert_eq!(form.error("endTime"), Some("End time must be after start time"));

        form.set_value("endTime", "11:00");
        app.submit_form();
        assert!(app.mutation_rx.is_some());
        wait_for(|| app.poll_mutation_result()).await;

        create.assert_async().await;
        assert!(matches!(app.modal, Modal::None));
        assert_eq!(app.store.schedules.len(), 1);
        assert_eq!(app.store.schedules[0].schedule_id, "77");
        assert_eq!(app.day_schedules().len(), 1);
    }

    #[tokio::test]
    async fn rejected_update_keeps_the_form_open_with_the_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PUT).path("/api/rooms/r-1");
                then.status(409).json_body(json!({ "error": "Room name already exists" }));
            })
            .await;

        let mut app = app_for(&server.url("/api/"), Role::Dean);
        seed_references(&mut app);
        app.active_tab = Tab::Rooms;
        app.sync_lengths();
        app.open_update_form();
        let Modal::Form(form) = &mut app.modal else {
            panic!("form did not open");
        };
        assert_eq!(form.value("roomName"), "Room 101");
        form.set_value("capacity", "40");

        app.submit_form();
        wait_for(|| app.poll_mutation_result()).await;

        let Modal::Form(form) = &app.modal else {
            panic!("form closed after a failed save");
        };
        assert!(!form.submitting);
        assert_eq!(form.submit_error.as_deref(), Some("Room name already exists"));
    }

    #[tokio::test]
    async fn failed_delete_raises_an_error_popup() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(DELETE).path("/api/teachers/t-1");
                then.status(500).body("");
            })
            .await;

        let mut app = app_for(&server.url("/api/"), Role::Admin);
        seed_references(&mut app);
        app.active_tab = Tab::Teachers;
        app.sync_lengths();
        app.open_delete_confirm();
        app.confirm_delete();
        wait_for(|| app.poll_mutation_result()).await;

        assert!(matches!(app.modal, Modal::ConfirmDelete { deleting: false, .. }));
        let popup = app.error.as_ref().unwrap();
        assert_eq!(popup.message, "Request failed with status code 500");
        assert_eq!(app.store.teachers.len(), 1);
    }

    #[tokio::test]
    async fn one_failed_collection_does_not_drop_the_others() {
        let server = MockServer::start_async().await;
        for kind in EntityKind::ALL {
            let path = format!("/api/{}", kind.path());
            if kind == EntityKind::Room {
                server
                    .mock_async(|when, then| {
                        when.method(GET).path(path);
                        then.status(500).json_body(json!("database offline"));
                    })
                    .await;
            } else if kind == EntityKind::Schedule {
                server
                    .mock_async(|when, then| {
                        when.method(GET).path(path);
                        then.status(200).json_body(json!([
                            { "scheduleId": "s1", "dayOfWeek": "MONDAY", "startTime": "08:00", "endTime": "09:00" },
                            { "scheduleId": "s2", "dayOfWeek": "MONDAY", "startTime": "07:00", "endTime": "08:00" }
                        ]));
                    })
                    .await;
            } else {
                server
                    .mock_async(|when, then| {
                        when.method(GET).path(path);
                        then.status(200).json_body(json!([]));
                    })
                    .await;
            }
        }

        let mut app = app_for(&server.url("/api/"), Role::Teacher);
        app.start_fetch();
        assert!(app.loading);
        wait_for(|| app.poll_fetch_result()).await;

        assert!(!app.loading);
        assert_eq!(app.load_errors, vec!["Failed to load rooms: database offline"]);
        assert!(app.store.failed.contains(&EntityKind::Room));
        let ids: Vec<&str> = app.day_schedules().iter().map(|s| s.schedule_id.as_str()).collect();
        assert_eq!(ids, vec!["s2", "s1"]);
    }

    #[tokio::test]
    async fn partial_schedule_records_do_not_fail_the_collection() {
        let server = MockServer::start_async().await;
        for kind in EntityKind::ALL {
            let path = format!("/api/{}", kind.path());
            let body = if kind == EntityKind::Schedule {
                json!([
                    { "scheduleId": "ok", "dayOfWeek": "MONDAY", "startTime": "08:00:00", "endTime": "09:00:00" },
                    { "scheduleId": "null-day", "dayOfWeek": null, "startTime": "09:00", "endTime": "10:00" },
                    { "scheduleId": "no-day", "startTime": null, "endTime": null },
                    { "scheduleId": "no-times", "dayOfWeek": "TUESDAY" },
                    { "scheduleId": "sunday", "dayOfWeek": "SUNDAY", "startTime": "10:00", "endTime": "11:00" },
                    { "scheduleId": null, "dayOfWeek": "MONDAY", "startTime": "07:00", "endTime": "08:00" }
                ])
            } else {
                json!([])
            };
            server
                .mock_async(|when, then| {
                    when.method(GET).path(path);
                    then.status(200).json_body(body);
                })
                .await;
        }

        let mut app = app_for(&server.url("/api/"), Role::Admin);
        app.start_fetch();
        wait_for(|| app.poll_fetch_result()).await;

        assert!(app.load_errors.is_empty());
        assert!(!app.store.failed.contains(&EntityKind::Schedule));
        // The record without an id is the only one skipped outright.
        assert_eq!(app.store.schedules.len(), 5);

        let buckets = layout::group_by_day(app.store.schedules.iter());
        let ids = |day: DayOfWeek| {
            buckets
                .day(day)
                .iter()
                .map(|s| s.schedule_id.as_str())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(DayOfWeek::Monday), vec!["ok"]);
        assert_eq!(ids(DayOfWeek::Tuesday), vec!["no-times"]);
        assert_eq!(buckets.len(), 2);

        let no_times = buckets.day(DayOfWeek::Tuesday)[0];
        assert!(layout::place(&no_times.start_time, &no_times.end_time, 1.0).is_none());
        assert_eq!(app.day_schedules().len(), 1);
    }

    fn empty_fetch(generation: u64) -> FetchResult {
        FetchResult {
            generation,
            departments: Ok(vec![]),
            courses: Ok(vec![]),
            sections: Ok(vec![]),
            subjects: Ok(vec![]),
            rooms: Ok(vec![]),
            teachers: Ok(vec![]),
            deans: Ok(vec![]),
            schedules: Ok(vec![]),
            fetched_at: Local::now(),
        }
    }

    #[test]
    fn saved_record_survives_a_fetch_started_before_the_save() {
        let mut app = offline(Role::Admin);
        app.fetch_generation = 1;
        let (_fetch_tx, fetch_rx) = oneshot::channel();
        app.fetch_rx = Some(fetch_rx);

        let room: Room =
            serde_json::from_value(json!({ "roomId": "r-9", "roomName": "Annex" })).unwrap();
        let (tx, rx) = oneshot::channel();
        app.mutation_rx = Some(rx);
        let _ = tx.send(MutationResult {
            kind: EntityKind::Room,
            outcome: Ok(Mutation::Saved(room.into_record())),
        });
        assert!(app.poll_mutation_result());
        assert!(app.fetch_rx.is_none());
        assert!(app.needs_refresh);

        // The pre-save snapshot arrives late and is ignored.
        let (tx, rx) = oneshot::channel();
        app.fetch_rx = Some(rx);
        let _ = tx.send(empty_fetch(1));
        assert!(!app.poll_fetch_result());
        assert_eq!(app.store.label(EntityKind::Room, "r-9").as_deref(), Some("Annex"));

        // A fetch issued after the save applies normally.
        let (tx, rx) = oneshot::channel();
        app.fetch_rx = Some(rx);
        let _ = tx.send(empty_fetch(app.fetch_generation));
        assert!(app.poll_fetch_result());
    }

    #[test]
    fn teachers_cannot_open_edit_modals() {
        let mut app = offline(Role::Teacher);
        app.store.upsert(schedule("s1", DayOfWeek::Monday, "08:00", "09:00"));
        app.sync_lengths();

        app.open_add_form();
        assert!(matches!(app.modal, Modal::None));
        app.open_delete_confirm();
        assert!(matches!(app.modal, Modal::None));
        assert_eq!(app.status_message, "Teacher accounts are read-only.");

        app.on_schedule_selected();
        assert!(matches!(app.modal, Modal::View { loading: false, .. }));
    }

    #[tokio::test]
    async fn stale_detail_results_are_dropped() {
        let mut app = offline(Role::Admin);
        seed_references(&mut app);
        app.open_view(EntityKind::Room, "r-1".into());
        let current = app.detail_token;

        let stale: Room =
            serde_json::from_value(json!({ "roomId": "r-1", "roomName": "Stale" })).unwrap();
        let (tx, rx) = oneshot::channel();
        app.detail_rx = Some(rx);
        let _ = tx.send(DetailResult {
            token: current - 1,
            outcome: Ok(stale.into_record()),
        });
        assert!(!app.poll_detail_result());
        assert_eq!(app.store.label(EntityKind::Room, "r-1").as_deref(), Some("Room 101"));

        let fresh: Room =
            serde_json::from_value(json!({ "roomId": "r-1", "roomName": "Room 101-A" })).unwrap();
        let (tx, rx) = oneshot::channel();
        app.detail_rx = Some(rx);
        let _ = tx.send(DetailResult {
            token: current,
            outcome: Ok(fresh.into_record()),
        });
        assert!(app.poll_detail_result());
        assert_eq!(app.store.label(EntityKind::Room, "r-1").as_deref(), Some("Room 101-A"));

        app.close_modal();
        let late: Room =
            serde_json::from_value(json!({ "roomId": "r-1", "roomName": "Late" })).unwrap();
        let (tx, rx) = oneshot::channel();
        app.detail_rx = Some(rx);
        let _ = tx.send(DetailResult {
            token: current,
            outcome: Ok(late.into_record()),
        });
        assert!(!app.poll_detail_result());
        assert_eq!(app.store.label(EntityKind::Room, "r-1").as_deref(), Some("Room 101-A"));
    }

    #[test]
    fn filter_cycling_runs_through_all_and_back() {
        let mut app = offline(Role::Admin);
        seed_references(&mut app);
        app.cycle_filter(FilterField::Teacher, true);
        assert_eq!(app.filter.teacher_id.as_deref(), Some("t-1"));
        assert_eq!(app.filter_display(FilterField::Teacher), "Ada Lovelace");
        app.cycle_filter(FilterField::Teacher, true);
        assert_eq!(app.filter.teacher_id, None);

        app.cycle_filter(FilterField::Day, false);
        assert_eq!(app.filter.day, Some(DayOfWeek::Saturday));
        assert_eq!(app.filter_display(FilterField::Day), "Saturday");
    }

    #[test]
    fn print_document_reflects_the_active_filter() {
        let mut app = offline(Role::Admin);
        app.store.upsert(schedule("s1", DayOfWeek::Monday, "08:00", "09:00"));
        app.store.upsert(schedule("s2", DayOfWeek::Friday, "10:00", "11:00"));
        app.filter.day = Some(DayOfWeek::Friday);

        let html = app.print_document(PrintLayout::Table);
        assert!(html.contains("Day: Friday"));
        assert!(html.contains("Friday"));
        assert!(!html.contains("Monday"));
    }

    #[test]
    fn calendar_selection_stays_inside_the_day() {
        let mut app = offline(Role::Admin);
        app.store.upsert(schedule("a", DayOfWeek::Tuesday, "09:00", "10:00"));
        app.store.upsert(schedule("b", DayOfWeek::Tuesday, "08:00", "09:00"));
        app.select_day(DayOfWeek::Tuesday);
        app.select_block_next();
        app.select_block_next();
        assert_eq!(app.selected_block, 1);
        assert_eq!(app.selected_schedule().map(|s| s.schedule_id.as_str()), Some("a"));

        app.filter.search = "zzz".into();
        app.on_filter_changed();
        assert!(app.selected_schedule().is_none());
    }

    #[test]
    fn step_wraps_through_none() {
        let days = [1, 2, 3];
        assert_eq!(step(&days, None, true), Some(1));
        assert_eq!(step(&days, Some(&3), true), None);
        assert_eq!(step(&days, None, false), Some(3));
        assert_eq!(step::<i32>(&[], None, true), None);
    }
}
