//! Lenient field decoders for backend payloads.
//!
//! Ids are opaque strings on our side, but some backends emit them as JSON
//! numbers. Timestamps arrive either as RFC 3339 or as a zone-less local
//! date-time; both are display-only, so anything unparseable becomes `None`.
//! Display strings and closed enums fall back to their default when the
//! backend sends `null` or a value of the wrong shape.

use chrono::{DateTime, NaiveDateTime};
use serde::de::{DeserializeOwned, Error};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match Value::deserialize(d)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a string or numeric id, got {other}"
        ))),
    }
}

pub fn opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a string or numeric id, got {other}"
        ))),
    }
}

/// A display string; `null` and non-scalar values read as empty.
pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

/// Decode `T`, or use its default when the value is `null` or malformed.
pub fn or_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => T::default(),
        Some(value) => serde_json::from_value(value).unwrap_or_default(),
    })
}

pub fn timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDateTime>, D::Error> {
    let raw = Option::<Value>::deserialize(d)?;
    Ok(raw.as_ref().and_then(Value::as_str).and_then(parse_timestamp))
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.naive_utc())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok())
        .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActiveStatus, DayOfWeek};
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Fields {
        #[serde(default, deserialize_with = "text")]
        name: String,
        #[serde(default, deserialize_with = "or_default")]
        day: DayOfWeek,
        #[serde(default, deserialize_with = "or_default")]
        status: ActiveStatus,
    }

    #[test]
    fn nulls_and_wrong_shapes_fall_back_to_defaults() {
        let p: Fields = serde_json::from_value(json!({ "name": null, "day": null, "status": null })).unwrap();
        assert_eq!(p.name, "");
        assert_eq!(p.day, DayOfWeek::Unrecognized);
        assert_eq!(p.status, ActiveStatus::Active);

        let p: Fields = serde_json::from_value(json!({ "name": 101, "day": 3, "status": ["x"] })).unwrap();
        assert_eq!(p.name, "101");
        assert_eq!(p.day, DayOfWeek::Unrecognized);
        assert_eq!(p.status, ActiveStatus::Active);

        let p: Fields = serde_json::from_value(json!({})).unwrap();
        assert_eq!(p.day, DayOfWeek::Unrecognized);

        let p: Fields = serde_json::from_value(json!({ "day": "FRIDAY", "status": "ARCHIVED" })).unwrap();
        assert_eq!(p.day, DayOfWeek::Friday);
        assert_eq!(p.status, ActiveStatus::Unknown);
    }

    #[test]
    fn accepts_rfc3339_and_local_forms() {
        assert!(parse_timestamp("2024-06-01T08:15:00Z").is_some());
        assert!(parse_timestamp("2024-06-01T08:15:00.123").is_some());
        assert!(parse_timestamp("2024-06-01 08:15:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
