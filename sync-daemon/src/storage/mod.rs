//! Storage layer for sync-daemon.
//!
//! One table per resource type, derived from the static descriptors in
//! `sync-types`. This module holds the pure mapping from raw JSON fields
//! to column values; [`SqliteStore`] does the SQL.

mod sqlite;

pub use sqlite::SqliteStore;

use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;
use sync_types::{Field, FieldKind};

/// Storage format of datetime columns.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A typed column value ready to bind.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    /// TEXT column.
    Text(Option<String>),
    /// INTEGER column.
    Integer(Option<i64>),
    /// Boolean stored as INTEGER.
    Boolean(Option<bool>),
}

/// SQL column type of a field kind.
pub fn sql_type(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Text | FieldKind::DateTime => "TEXT",
        FieldKind::Integer | FieldKind::Boolean => "INTEGER",
    }
}

/// Convert a raw field value to its column value.
///
/// The remote API is loose with types (durations arrive as strings, prices
/// as numbers or null), so conversion is lenient: anything that cannot be
/// read as the declared kind becomes NULL, except text, which keeps the
/// JSON rendering.
pub fn column_value(field: &Field, value: Option<&Value>) -> ColumnValue {
    let value = value.filter(|v| !v.is_null());
    match field.kind {
        FieldKind::Text => ColumnValue::Text(value.map(text_of)),
        FieldKind::DateTime => ColumnValue::Text(value.map(|v| normalize_datetime(&text_of(v)))),
        FieldKind::Integer => ColumnValue::Integer(value.and_then(|v| match v {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })),
        FieldKind::Boolean => ColumnValue::Boolean(value.and_then(|v| match v {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => match n.as_i64() {
                Some(1) => Some(true),
                Some(0) => Some(false),
                _ => None,
            },
            Value::String(s) => match s.trim() {
                "1" | "true" => Some(true),
                "0" | "false" => Some(false),
                _ => None,
            },
            _ => None,
        })),
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Normalize a remote timestamp to `YYYY-MM-DD HH:MM:SS`.
///
/// The API sends RFC 2822 dates (`Fri, 17 Jul 2009 01:52:49 +0000`); RFC
/// 3339 and already-normalized values are accepted too. Offsets are kept
/// as given, not converted. Unparseable input is stored unchanged.
pub fn normalize_datetime(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return dt.format(DATETIME_FORMAT).to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format(DATETIME_FORMAT).to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT) {
        return dt.format(DATETIME_FORMAT).to_string();
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sync_types::ResourceType;

    fn field(resource_type: ResourceType, name: &str) -> &'static Field {
        resource_type.descriptor().field(name).unwrap()
    }

    #[test]
    fn rfc2822_dates_are_normalized() {
        assert_eq!(
            normalize_datetime("Fri, 17 Jul 2009 01:52:49 +0000"),
            "2009-07-17 01:52:49"
        );
        assert_eq!(
            normalize_datetime("2009-07-17T01:52:49Z"),
            "2009-07-17 01:52:49"
        );
        assert_eq!(normalize_datetime("2009-07-17 01:52:49"), "2009-07-17 01:52:49");
        assert_eq!(normalize_datetime("yesterday"), "yesterday");
    }

    #[test]
    fn integer_fields_accept_strings() {
        let duration = field(ResourceType::Call, "duration");
        assert_eq!(
            column_value(duration, Some(&json!("42"))),
            ColumnValue::Integer(Some(42))
        );
        assert_eq!(
            column_value(duration, Some(&json!(7))),
            ColumnValue::Integer(Some(7))
        );
        assert_eq!(
            column_value(duration, Some(&json!("n/a"))),
            ColumnValue::Integer(None)
        );
        assert_eq!(column_value(duration, None), ColumnValue::Integer(None));
    }

    #[test]
    fn text_fields_render_non_strings() {
        let price = field(ResourceType::Call, "price");
        assert_eq!(
            column_value(price, Some(&json!(-0.02))),
            ColumnValue::Text(Some("-0.02".to_string()))
        );
        assert_eq!(column_value(price, Some(&json!(null))), ColumnValue::Text(None));
    }

    #[test]
    fn datetime_fields_are_normalized_text() {
        let created = field(ResourceType::Recording, "date_created");
        assert_eq!(
            column_value(created, Some(&json!("Fri, 17 Jul 2009 01:52:49 +0000"))),
            ColumnValue::Text(Some("2009-07-17 01:52:49".to_string()))
        );
    }

    #[test]
    fn boolean_fields_accept_strings() {
        let muted = field(ResourceType::Participant, "muted");
        assert_eq!(
            column_value(muted, Some(&json!("true"))),
            ColumnValue::Boolean(Some(true))
        );
        assert_eq!(
            column_value(muted, Some(&json!(false))),
            ColumnValue::Boolean(Some(false))
        );
        assert_eq!(
            column_value(muted, Some(&json!("0"))),
            ColumnValue::Boolean(Some(false))
        );
        assert_eq!(
            column_value(muted, Some(&json!("1"))),
            ColumnValue::Boolean(Some(true))
        );
        assert_eq!(
            column_value(muted, Some(&json!(1))),
            ColumnValue::Boolean(Some(true))
        );
        assert_eq!(
            column_value(muted, Some(&json!("maybe"))),
            ColumnValue::Boolean(None)
        );
        assert_eq!(sql_type(muted.kind), "INTEGER");
    }
}
