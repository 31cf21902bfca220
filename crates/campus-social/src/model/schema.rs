//! Declarative per-entity schemas.
//!
//! One [`Schema`] per entity lists its fields in declaration order with
//! their semantic kind, the legacy names accepted on read, and the rules a
//! candidate must satisfy before it is written.  The mappers read through a
//! [`Reader`] bound to the schema and the validators walk the same list, so
//! the two cannot drift apart.

use campus_store::{FieldValue, Fields, GeoPoint};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Result, SocialError};
use crate::model::coerce;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Text,
    Number,
    Timestamp,
    Geo,
    TextList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Present and, for text, not blank.
    Required,
    /// At most this many characters.
    MaxChars(usize),
    /// Null, or a whole number greater than zero.
    PositiveNumber,
    /// Null, or one of the listed strings.
    OneOf(&'static [&'static str]),
    /// Strictly earlier than the named timestamp field when both are set.
    Before(&'static str),
    /// Not equal to the named field; carries the message to report.
    DiffersFrom(&'static str, &'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: Kind,
    /// Legacy names, tried in order when `name` is absent.  A [`Kind::Geo`]
    /// field with two aliases reads them as separate latitude/longitude
    /// fields.
    pub aliases: &'static [&'static str],
    pub rules: &'static [Rule],
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: Kind) -> Self {
        Self {
            name,
            kind,
            aliases: &[],
            rules: &[],
        }
    }

    pub const fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    pub const fn rules(mut self, rules: &'static [Rule]) -> Self {
        self.rules = rules;
        self
    }
}

#[derive(Debug)]
pub struct Schema {
    pub entity: &'static str,
    pub fields: &'static [FieldSpec],
}

/// Outcome of validating a candidate: every violated rule, in field
/// declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl Validation {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    pub fn has_error(&self, message: &str) -> bool {
        self.errors.iter().any(|e| e == message)
    }

    pub fn into_result(self) -> Result<()> {
        if self.valid {
            Ok(())
        } else {
            Err(SocialError::Validation(self.errors))
        }
    }
}

impl Schema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    pub fn reader<'a>(&'a self, raw: &'a Fields) -> Reader<'a> {
        Reader { schema: self, raw }
    }

    /// Checks `candidate` against every rule.  Pure: no store access, no
    /// mutation of the input.
    pub fn validate(&self, candidate: &Fields) -> Validation {
        let reader = self.reader(candidate);
        let mut errors = Vec::new();

        for spec in self.fields {
            let present = reader.is_present(spec);
            for rule in spec.rules {
                if let Some(message) = check_rule(&reader, spec, *rule, present) {
                    errors.push(message);
                }
            }
        }

        Validation::from_errors(errors)
    }
}

fn check_rule(reader: &Reader<'_>, spec: &FieldSpec, rule: Rule, present: bool) -> Option<String> {
    let name = spec.name;
    match rule {
        Rule::Required => (!present).then(|| format!("{name} is required")),
        Rule::MaxChars(max) => {
            let len = reader.opt_text(name)?.chars().count();
            (len > max).then(|| format!("{name} must be {max} characters or less"))
        }
        Rule::PositiveNumber => {
            let value = reader.lookup(spec)?;
            let ok = coerce::number(value).is_some_and(|n| n > 0.0 && n.fract() == 0.0);
            (!ok).then(|| format!("{name} must be a positive number"))
        }
        Rule::OneOf(allowed) => {
            let value = reader.lookup(spec)?;
            let ok = value.as_str().is_some_and(|s| allowed.contains(&s));
            (!ok).then(|| format!("{name} must be one of: {}", allowed.join(", ")))
        }
        Rule::Before(other) => {
            let start = reader.timestamp(name)?;
            let end = reader.timestamp(other)?;
            (start >= end).then(|| format!("{name} must be before {other}"))
        }
        Rule::DiffersFrom(other, message) => {
            let this = reader.opt_text(name)?;
            let that = reader.opt_text(other)?;
            (this == that).then(|| message.to_string())
        }
    }
}

/// Typed, alias-aware view over raw fields.  Every accessor has a
/// type-safe default; nothing here fails.
pub struct Reader<'a> {
    schema: &'a Schema,
    raw: &'a Fields,
}

impl<'a> Reader<'a> {
    /// First non-null value under the canonical name or an alias.
    fn lookup(&self, spec: &FieldSpec) -> Option<&'a FieldValue> {
        std::iter::once(spec.name)
            .chain(spec.aliases.iter().copied())
            .filter_map(|key| self.raw.get(key))
            .find(|value| !value.is_null())
    }

    fn value(&self, name: &str) -> Option<&'a FieldValue> {
        match self.schema.field(name) {
            Some(spec) => self.lookup(spec),
            None => self.raw.get(name).filter(|value| !value.is_null()),
        }
    }

    fn is_present(&self, spec: &FieldSpec) -> bool {
        match spec.kind {
            Kind::Text => self.opt_text(spec.name).is_some(),
            Kind::Number => self.number(spec.name).is_some(),
            Kind::Timestamp => self.timestamp(spec.name).is_some(),
            Kind::Geo => self.geo(spec.name).is_some(),
            Kind::TextList => !self.text_list(spec.name).is_empty(),
        }
    }

    /// Text or the empty string.
    pub fn text(&self, name: &str) -> String {
        self.value(name).and_then(coerce::text).unwrap_or_default()
    }

    /// Text that is not blank.
    pub fn opt_text(&self, name: &str) -> Option<String> {
        self.value(name)
            .and_then(coerce::text)
            .filter(|s| !s.trim().is_empty())
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.value(name).and_then(coerce::number)
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.value(name).and_then(coerce::integer)
    }

    pub fn timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        self.value(name).and_then(coerce::timestamp)
    }

    pub fn geo(&self, name: &str) -> Option<GeoPoint> {
        if let Some(point) = self.raw.get(name).and_then(coerce::geo) {
            return Some(point);
        }
        let aliases = self.schema.field(name).map(|spec| spec.aliases).unwrap_or(&[]);
        match aliases {
            [lat, lng] => Some(GeoPoint {
                latitude: self.raw.get(*lat).and_then(coerce::number)?,
                longitude: self.raw.get(*lng).and_then(coerce::number)?,
            }),
            _ => None,
        }
    }

    pub fn text_list(&self, name: &str) -> Vec<String> {
        self.value(name).map(coerce::text_list).unwrap_or_default()
    }
}

/// Helper for building candidate/write field maps.
pub fn fields<const N: usize>(pairs: [(&str, FieldValue); N]) -> Fields {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    static SAMPLE: Schema = Schema {
        entity: "sample",
        fields: &[
            FieldSpec::new("name", Kind::Text)
                .aliases(&["legacyName"])
                .rules(&[Rule::Required, Rule::MaxChars(3)]),
            FieldSpec::new("size", Kind::Number).rules(&[Rule::PositiveNumber]),
            FieldSpec::new("kind", Kind::Text).rules(&[Rule::OneOf(&["a", "b"])]),
            FieldSpec::new("from", Kind::Timestamp).rules(&[Rule::Before("to")]),
            FieldSpec::new("to", Kind::Timestamp),
            FieldSpec::new("spot", Kind::Geo).aliases(&["lat", "lng"]),
        ],
    };

    #[test]
    fn test_collects_all_errors_in_field_order() {
        let candidate = fields([
            ("name", "toolong".into()),
            ("size", FieldValue::Integer(0)),
            ("kind", "c".into()),
            ("from", Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap().into()),
            ("to", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap().into()),
        ]);

        let result = SAMPLE.validate(&candidate);
        assert!(!result.valid);
        assert_eq!(
            result.errors,
            [
                "name must be 3 characters or less",
                "size must be a positive number",
                "kind must be one of: a, b",
                "from must be before to",
            ]
        );
    }

    #[test]
    fn test_absent_optional_fields_pass() {
        let candidate = fields([("name", "ok".into()), ("size", FieldValue::Null)]);
        assert_eq!(SAMPLE.validate(&candidate), Validation::from_errors(vec![]));
    }

    #[test]
    fn test_blank_required_text() {
        let result = SAMPLE.validate(&fields([("name", "   ".into())]));
        assert_eq!(result.errors, ["name is required"]);
    }

    #[test]
    fn test_validate_does_not_mutate() {
        let candidate = fields([("name", "abcd".into())]);
        let before = candidate.clone();
        let _ = SAMPLE.validate(&candidate);
        assert_eq!(candidate, before);
    }

    #[test]
    fn test_reader_aliases_and_split_geo() {
        let raw = fields([
            ("legacyName", "old".into()),
            ("lat", FieldValue::Double(1.0)),
            ("lng", "2".into()),
        ]);
        let reader = SAMPLE.reader(&raw);
        assert_eq!(reader.text("name"), "old");
        assert_eq!(
            reader.geo("spot"),
            Some(GeoPoint {
                latitude: 1.0,
                longitude: 2.0
            })
        );
        assert_eq!(reader.number("size"), None);
        assert_eq!(reader.text("unknown"), "");
    }

    #[test]
    fn test_canonical_name_wins_over_alias() {
        let raw = fields([("name", "new".into()), ("legacyName", "old".into())]);
        assert_eq!(SAMPLE.reader(&raw).text("name"), "new");

        let raw = fields([("name", FieldValue::Null), ("legacyName", "old".into())]);
        assert_eq!(SAMPLE.reader(&raw).text("name"), "old");
    }
}
