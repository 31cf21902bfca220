//! Lenient conversions from stored values to typed fields.
//!
//! Documents may have been written by older schema versions, by hand in a
//! console, or by clients with different ideas about types.  None of these
//! functions fail: anything that cannot be interpreted becomes `None`.

use campus_store::value::timestamp_from_parts;
use campus_store::{FieldValue, GeoPoint};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Strings pass through, numbers and booleans are rendered, everything
/// else is `None`.
pub fn text(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::String(s) => Some(s.clone()),
        FieldValue::Integer(i) => Some(i.to_string()),
        FieldValue::Double(d) if d.is_finite() => Some(d.to_string()),
        FieldValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Finite numbers, including numeric strings.  NaN and infinities are
/// treated as absent.
pub fn number(value: &FieldValue) -> Option<f64> {
    let n = match value {
        FieldValue::Integer(i) => *i as f64,
        FieldValue::Double(d) => *d,
        FieldValue::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// [`number`] truncated toward zero.
pub fn integer(value: &FieldValue) -> Option<i64> {
    match value {
        FieldValue::Integer(i) => Some(*i),
        other => {
            let n = number(other)?.trunc();
            (n >= i64::MIN as f64 && n <= i64::MAX as f64).then_some(n as i64)
        }
    }
}

/// Accepts a native timestamp, an RFC 3339 / ISO-8601 string (date-only
/// strings mean midnight UTC), a `{seconds, nanoseconds}` map, or epoch
/// milliseconds.
pub fn timestamp(value: &FieldValue) -> Option<DateTime<Utc>> {
    match value {
        FieldValue::Timestamp(dt) => Some(*dt),
        FieldValue::String(s) => parse_date_string(s.trim()),
        FieldValue::Map(fields) => {
            let seconds = fields
                .get("seconds")
                .or_else(|| fields.get("_seconds"))
                .and_then(integer)?;
            let nanos = fields
                .get("nanoseconds")
                .or_else(|| fields.get("_nanoseconds"))
                .and_then(integer)
                .unwrap_or(0);
            let nanos = u32::try_from(nanos).ok().filter(|n| *n < 1_000_000_000)?;
            timestamp_from_parts(seconds, nanos)
        }
        FieldValue::Integer(_) | FieldValue::Double(_) => {
            let millis = integer(value)?;
            Utc.timestamp_millis_opt(millis).single()
        }
        _ => None,
    }
}

fn parse_date_string(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Native geo points or `{latitude, longitude}` maps.
pub fn geo(value: &FieldValue) -> Option<GeoPoint> {
    match value {
        FieldValue::Geo(point) => Some(*point),
        FieldValue::Map(fields) => {
            let latitude = fields
                .get("latitude")
                .or_else(|| fields.get("_latitude"))
                .and_then(number)?;
            let longitude = fields
                .get("longitude")
                .or_else(|| fields.get("_longitude"))
                .and_then(number)?;
            Some(GeoPoint {
                latitude,
                longitude,
            })
        }
        _ => None,
    }
}

/// Arrays of strings; non-string items are dropped.
pub fn text_list(value: &FieldValue) -> Vec<String> {
    match value {
        FieldValue::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}
