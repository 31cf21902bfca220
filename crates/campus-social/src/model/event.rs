//! Campus events.

use campus_store::{FieldValue, Fields, GeoPoint};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{EVENT_DESCRIPTION_MAX, EVENT_TITLE_MAX};
use crate::model::schema::{fields, FieldSpec, Kind, Reader, Rule, Schema};
use crate::model::{Candidate, StoredEntity};
use crate::types::Visibility;

pub static EVENT_SCHEMA: Schema = Schema {
    entity: "event",
    fields: &[
        FieldSpec::new("title", Kind::Text)
            .rules(&[Rule::Required, Rule::MaxChars(EVENT_TITLE_MAX)]),
        FieldSpec::new("description", Kind::Text)
            .rules(&[Rule::Required, Rule::MaxChars(EVENT_DESCRIPTION_MAX)]),
        FieldSpec::new("locationName", Kind::Text).aliases(&["location"]),
        FieldSpec::new("categoryId", Kind::Text).aliases(&["category"]),
        FieldSpec::new("visibility", Kind::Text).rules(&[Rule::OneOf(Visibility::ALL)]),
        FieldSpec::new("capacity", Kind::Number).rules(&[Rule::PositiveNumber]),
        FieldSpec::new("createdBy", Kind::Text),
        FieldSpec::new("createdByName", Kind::Text),
        FieldSpec::new("createdAt", Kind::Timestamp),
        FieldSpec::new("startTime", Kind::Timestamp)
            .aliases(&["startAt"])
            .rules(&[Rule::Before("endTime")]),
        FieldSpec::new("endTime", Kind::Timestamp).aliases(&["endAt"]),
        FieldSpec::new("locationGeo", Kind::Geo).aliases(&["latitude", "longitude"]),
        FieldSpec::new("titleLower", Kind::Text),
    ],
};

/// Normalized event record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location_name: String,
    pub category_id: String,
    pub visibility: Visibility,
    pub capacity: Option<i64>,
    pub created_by: String,
    pub created_by_name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub location_geo: Option<GeoPoint>,
    /// Lowercased title, denormalized for prefix search.
    pub title_lower: String,
}

impl StoredEntity for Event {
    fn schema() -> &'static Schema {
        &EVENT_SCHEMA
    }

    fn from_fields(id: &str, r: &Reader<'_>) -> Self {
        let title = r.text("title");
        let title_lower = r
            .opt_text("titleLower")
            .unwrap_or_else(|| title.to_lowercase());
        Self {
            id: id.to_string(),
            description: r.text("description"),
            location_name: r.text("locationName"),
            category_id: r.text("categoryId"),
            visibility: r
                .opt_text("visibility")
                .and_then(|v| Visibility::parse(&v))
                .unwrap_or_default(),
            capacity: r.integer("capacity"),
            created_by: r.text("createdBy"),
            created_by_name: r.text("createdByName"),
            created_at: r.timestamp("createdAt"),
            start_time: r.timestamp("startTime"),
            end_time: r.timestamp("endTime"),
            location_geo: r.geo("locationGeo"),
            title,
            title_lower,
        }
    }
}

/// User input for a new event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub location_name: String,
    pub category_id: String,
    pub visibility: Visibility,
    pub capacity: Option<i64>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub location_geo: Option<GeoPoint>,
}

impl EventDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    /// Fields written on creation, stamped with the author.
    pub fn to_create_fields(&self, created_by: &str, created_by_name: &str) -> Fields {
        let mut out = self.to_fields();
        out.insert("titleLower".into(), self.title.trim().to_lowercase().into());
        out.insert("createdBy".into(), created_by.into());
        out.insert("createdByName".into(), created_by_name.into());
        out.insert("createdAt".into(), FieldValue::ServerTimestamp);
        out
    }
}

impl Candidate for EventDraft {
    fn schema() -> &'static Schema {
        &EVENT_SCHEMA
    }

    fn to_fields(&self) -> Fields {
        fields([
            ("title", self.title.trim().into()),
            ("description", self.description.trim().into()),
            ("locationName", self.location_name.trim().into()),
            ("categoryId", self.category_id.as_str().into()),
            ("visibility", self.visibility.as_str().into()),
            ("capacity", self.capacity.into()),
            ("startTime", self.start_time.into()),
            ("endTime", self.end_time.into()),
            ("locationGeo", self.location_geo.into()),
        ])
    }
}
