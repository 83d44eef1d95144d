//! Schema-driven add/update form shared by every entity.

use chrono::NaiveTime;
use serde_json::{Map, Value};

use crate::models::EntityKind;

/// Extra check run after the built-in ones; sees the whole form so it can
/// compare fields.
pub type Validator = fn(&str, &Form) -> Result<(), String>;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Email,
    /// Whole number no smaller than `min`.
    Number { min: u32 },
    /// `HH:MM` on input, sent as `HH:MM:SS`.
    Time,
    /// Fixed `(value, label)` options; starts on the first one.
    Choice(Vec<(String, String)>),
    /// Pick another record by id; starts empty.
    Reference(Vec<(String, String)>),
}

impl FieldKind {
    fn options(&self) -> Option<&[(String, String)]> {
        match self {
            FieldKind::Choice(options) | FieldKind::Reference(options) => Some(options),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub validate: Option<Validator>,
}

impl FieldSpec {
    pub fn new(key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            key,
            label,
            kind,
            required: true,
            validate: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn validate(mut self, check: Validator) -> Self {
        self.validate = Some(check);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub spec: FieldSpec,
    pub value: String,
    /// Value the form opened with.
    pub initial: String,
    pub error: Option<String>,
}

impl Field {
    /// Label of the current choice, or the raw value for free-text fields.
    pub fn display(&self) -> String {
        match self.spec.kind.options() {
            Some(options) => options
                .iter()
                .find(|(v, _)| *v == self.value)
                .map(|(_, l)| l.clone())
                .unwrap_or_default(),
            None => self.value.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Update { id: String },
}

#[derive(Debug, Clone)]
pub struct Form {
    pub kind: EntityKind,
    pub mode: FormMode,
    pub fields: Vec<Field>,
    pub focus: usize,
    /// Inline banner for a rejected mutation.
    pub submit_error: Option<String>,
    pub submitting: bool,
}

impl Form {
    /// Build a form from its schema. `seed` pre-fills values by key.
    pub fn new(
        kind: EntityKind,
        mode: FormMode,
        schema: Vec<FieldSpec>,
        seed: &[(&'static str, String)],
    ) -> Self {
        let fields = schema
            .into_iter()
            .map(|spec| {
                let value = seed
                    .iter()
                    .find(|(k, _)| *k == spec.key)
                    .map(|(_, v)| v.clone())
                    .unwrap_or_else(|| default_value(&spec));
                Field {
                    spec,
                    initial: value.clone(),
                    value,
                    error: None,
                }
            })
            .collect();
        Self {
            kind,
            mode,
            fields,
            focus: 0,
            submit_error: None,
            submitting: false,
        }
    }

    pub fn title(&self) -> String {
        match self.mode {
            FormMode::Add => format!(" Add {} ", self.kind.singular()),
            FormMode::Update { .. } => format!(" Update {} ", self.kind.singular()),
        }
    }

    pub fn value(&self, key: &str) -> &str {
        self.fields
            .iter()
            .find(|f| f.spec.key == key)
            .map(|f| f.value.as_str())
            .unwrap_or("")
    }

    #[cfg(test)]
    pub fn set_value(&mut self, key: &str, value: &str) {
        if let Some(field) = self.fields.iter_mut().find(|f| f.spec.key == key) {
            field.value = value.to_string();
            field.error = None;
        }
    }

    #[cfg(test)]
    pub fn error(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.spec.key == key)
            .and_then(|f| f.error.as_deref())
    }

    // ── Editing ─────────────────────────────────────────────────────────

    pub fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    pub fn input_char(&mut self, c: char) {
        if self.submitting {
            return;
        }
        let Some(field) = self.fields.get_mut(self.focus) else {
            return;
        };
        let accepted = match field.spec.kind {
            FieldKind::Choice(_) | FieldKind::Reference(_) => false,
            FieldKind::Number { .. } => c.is_ascii_digit(),
            FieldKind::Time => c.is_ascii_digit() || c == ':',
            FieldKind::Text | FieldKind::Email => !c.is_control(),
        };
        if accepted {
            field.value.push(c);
            field.error = None;
        }
    }

    pub fn backspace(&mut self) {
        if self.submitting {
            return;
        }
        if let Some(field) = self.fields.get_mut(self.focus) {
            if field.spec.kind.options().is_none() {
                field.value.pop();
                field.error = None;
            }
        }
    }

    /// Step a choice field through its options. Free-text fields ignore this.
    pub fn cycle_choice(&mut self, forward: bool) {
        if self.submitting {
            return;
        }
        let Some(field) = self.fields.get_mut(self.focus) else {
            return;
        };
        let Some(options) = field.spec.kind.options() else {
            return;
        };
        if options.is_empty() {
            return;
        }
        let len = options.len();
        let next = match options.iter().position(|(v, _)| *v == field.value) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None if forward => 0,
            None => len - 1,
        };
        field.value = options[next].0.clone();
        field.error = None;
    }

    // ── Validation & submit ─────────────────────────────────────────────

    /// Run every field check; returns `true` when the form may be sent.
    pub fn validate(&mut self) -> bool {
        let errors: Vec<Option<String>> = self
            .fields
            .iter()
            .map(|field| check_field(field, self).err())
            .collect();
        for (field, error) in self.fields.iter_mut().zip(errors) {
            field.error = error;
        }
        if let Some(first) = self.fields.iter().position(|f| f.error.is_some()) {
            self.focus = first;
            false
        } else {
            true
        }
    }

    /// Validate and, if clean, lock the form and hand back the JSON payload.
    /// Returns `None` while a submission is already in flight or when
    /// validation fails.
    pub fn begin_submit(&mut self) -> Option<Value> {
        if self.submitting {
            return None;
        }
        self.submit_error = None;
        if !self.validate() {
            return None;
        }
        self.submitting = true;
        Some(self.payload())
    }

    pub fn fail(&mut self, message: String) {
        self.submitting = false;
        self.submit_error = Some(message);
    }

    /// JSON body keyed by field key. Blank optional fields are left out,
    /// except on update where a field that had a value is sent as `null`
    /// so the backend clears it.
    pub fn payload(&self) -> Value {
        let is_update = matches!(self.mode, FormMode::Update { .. });
        let mut map = Map::new();
        for field in &self.fields {
            let raw = field.value.trim();
            if raw.is_empty() {
                if is_update && !field.initial.trim().is_empty() {
                    map.insert(field.spec.key.to_string(), Value::Null);
                }
                continue;
            }
            let value = match field.spec.kind {
                FieldKind::Number { .. } => match raw.parse::<u32>() {
                    Ok(n) => Value::from(n),
                    Err(_) => Value::from(raw),
                },
                FieldKind::Time => Value::from(normalize_time(raw).unwrap_or_else(|| raw.to_string())),
                _ => Value::from(raw),
            };
            map.insert(field.spec.key.to_string(), value);
        }
        Value::Object(map)
    }
}

fn default_value(spec: &FieldSpec) -> String {
    match &spec.kind {
        FieldKind::Choice(options) if spec.required => {
            options.first().map(|(v, _)| v.clone()).unwrap_or_default()
        }
        _ => String::new(),
    }
}

fn check_field(field: &Field, form: &Form) -> Result<(), String> {
    let raw = field.value.trim();
    let label = field.spec.label;
    if raw.is_empty() {
        if !field.spec.required {
            return Ok(());
        }
        return Err(match field.spec.kind.options() {
            Some([]) => format!("No {} available to choose from", label.to_lowercase()),
            Some(_) => format!("{label} must be selected"),
            None => format!("{label} is required"),
        });
    }
    match &field.spec.kind {
        FieldKind::Text => {}
        FieldKind::Email => {
            if !looks_like_email(raw) {
                return Err("Enter a valid email address".into());
            }
        }
        FieldKind::Number { min } => match raw.parse::<u32>() {
            Ok(n) if n >= *min => {}
            Ok(_) => return Err(format!("{label} must be at least {min}")),
            Err(_) => return Err(format!("{label} must be a whole number")),
        },
        FieldKind::Time => {
            if normalize_time(raw).is_none() {
                return Err("Use 24-hour HH:MM".into());
            }
        }
        FieldKind::Choice(options) | FieldKind::Reference(options) => {
            if !options.iter().any(|(v, _)| v == raw) {
                return Err(format!("{label} is not a valid option"));
            }
        }
    }
    match field.spec.validate {
        Some(check) => check(raw, form),
        None => Ok(()),
    }
}

fn looks_like_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !s.contains(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// `H:MM`, `HH:MM` or `HH:MM:SS` → `HH:MM:SS`.
pub fn normalize_time(raw: &str) -> Option<String> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
        .map(|t| t.format("%H:%M:%S").to_string())
}

/// End time must fall after the start time on the same record.
pub fn end_after_start(end: &str, form: &Form) -> Result<(), String> {
    let start = normalize_time(form.value("startTime").trim());
    let end = normalize_time(end);
    match (start, end) {
        // Zero-padded HH:MM:SS compares chronologically as a string.
        (Some(start), Some(end)) if end <= start => Err("End time must be after start time".into()),
        _ => Ok(()),
    }
}
