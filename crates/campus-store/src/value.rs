//! Value model shared by every document store backend.
//!
//! A document is a flat map of field names to [`FieldValue`]s.  Values keep
//! the store's native shape (timestamps, geo points, nested maps) so that
//! documents written by older schema versions can be read back untouched
//! and normalized by the caller.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Raw fields of one document.
pub type Fields = BTreeMap<String, FieldValue>;

/// A latitude/longitude pair stored natively by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// One field value as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    Geo(GeoPoint),
    Array(Vec<FieldValue>),
    Map(Fields),
    /// Sentinel replaced by the store's clock when the write is applied.
    ServerTimestamp,
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Orders two values of comparable kinds.  Integers and doubles compare
    /// numerically with each other; mismatched kinds are incomparable.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (Self::Null, Self::Null) => Some(Ordering::Equal),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Integer(a), Self::Double(b)) => (*a as f64).partial_cmp(b),
            (Self::Double(a), Self::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Self::Double(a), Self::Double(b)) => a.partial_cmp(b),
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Timestamp(a), Self::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Replaces every [`FieldValue::ServerTimestamp`] (including nested
    /// ones) with `now`.
    pub fn resolve_server_timestamp(&mut self, now: DateTime<Utc>) {
        match self {
            Self::ServerTimestamp => *self = Self::Timestamp(now),
            Self::Array(items) => items
                .iter_mut()
                .for_each(|item| item.resolve_server_timestamp(now)),
            Self::Map(fields) => fields
                .values_mut()
                .for_each(|value| value.resolve_server_timestamp(now)),
            _ => {}
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<GeoPoint> for FieldValue {
    fn from(value: GeoPoint) -> Self {
        Self::Geo(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        Self::Array(value.into_iter().map(Self::String).collect())
    }
}

/// JSON has no native timestamp or geo type, so JSON input maps onto the
/// plain kinds only.  Legacy encodings such as `{seconds, nanoseconds}`
/// survive as maps and are interpreted by the reader.
impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => n.as_f64().map(Self::Double).unwrap_or(Self::Null),
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

/// Builds a [`Fields`] map from a JSON object.  Non-object input yields an
/// empty map.
pub fn fields_from_json(value: serde_json::Value) -> Fields {
    match FieldValue::from(value) {
        FieldValue::Map(fields) => fields,
        _ => Fields::new(),
    }
}

/// Converts epoch seconds plus nanoseconds into a UTC timestamp.
pub fn timestamp_from_parts(seconds: i64, nanos: u32) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, nanos).single()
}

/// A document as returned by a read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Last path segment.
    pub id: String,
    /// Full `/`-separated path, e.g. `events/e1/comments/c1`.
    pub path: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(path: impl Into<String>, fields: Fields) -> Self {
        let path = path.into();
        let id = path.rsplit('/').next().unwrap_or_default().to_string();
        Self { id, path, fields }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Id of the document owning this document's collection, e.g. the
    /// event id for `events/e1/rsvps/u1`.  Lost in grouped views otherwise.
    pub fn parent_doc_id(&self) -> Option<&str> {
        let segments: Vec<&str> = self.path.split('/').collect();
        if segments.len() >= 4 {
            Some(segments[segments.len() - 3])
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_conversion_keeps_shapes() {
        let fields = fields_from_json(serde_json::json!({
            "title": "Open mic",
            "capacity": 40,
            "lat": 1.5,
            "startAt": { "seconds": 1700000000, "nanoseconds": 0 },
            "tags": ["music"],
        }));

        assert_eq!(fields["title"], FieldValue::from("Open mic"));
        assert_eq!(fields["capacity"], FieldValue::Integer(40));
        assert_eq!(fields["lat"], FieldValue::Double(1.5));
        assert!(matches!(fields["startAt"], FieldValue::Map(_)));
        assert!(matches!(fields["tags"], FieldValue::Array(_)));
    }

    #[test]
    fn test_numeric_compare_across_kinds() {
        assert_eq!(
            FieldValue::Integer(2).compare(&FieldValue::Double(2.5)),
            Some(Ordering::Less)
        );
        assert_eq!(FieldValue::from("a").compare(&FieldValue::Integer(1)), None);
    }

    #[test]
    fn test_resolve_nested_server_timestamp() {
        let now = Utc::now();
        let mut value = FieldValue::Map(Fields::from([(
            "at".to_string(),
            FieldValue::ServerTimestamp,
        )]));
        value.resolve_server_timestamp(now);

        let FieldValue::Map(fields) = value else {
            panic!("expected map");
        };
        assert_eq!(fields["at"], FieldValue::Timestamp(now));
    }

    #[test]
    fn test_parent_doc_id() {
        let doc = Document::new("events/e1/rsvps/u1", Fields::new());
        assert_eq!(doc.id, "u1");
        assert_eq!(doc.parent_doc_id(), Some("e1"));
        assert_eq!(Document::new("events/e1", Fields::new()).parent_doc_id(), None);
    }
}
