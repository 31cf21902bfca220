//! Attendance records, one per (event, user).

use campus_store::{Document, FieldValue, Fields};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::schema::{fields, FieldSpec, Kind, Reader, Rule, Schema};
use crate::model::{Candidate, StoredEntity};
use crate::types::RsvpStatus;

pub static RSVP_SCHEMA: Schema = Schema {
    entity: "rsvp",
    fields: &[
        FieldSpec::new("userId", Kind::Text)
            .aliases(&["uid"])
            .rules(&[Rule::Required]),
        FieldSpec::new("status", Kind::Text).rules(&[Rule::Required, Rule::OneOf(RsvpStatus::ALL)]),
        FieldSpec::new("createdAt", Kind::Timestamp),
    ],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rsvp {
    /// Same as `user_id`.
    pub id: String,
    /// Duplicated from the id so grouped queries can filter on it.
    pub user_id: String,
    pub status: RsvpStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl Rsvp {
    /// Id of the event this RSVP belongs to, recovered from the path.
    pub fn event_id(doc: &Document) -> Option<&str> {
        doc.parent_doc_id()
    }
}

impl StoredEntity for Rsvp {
    fn schema() -> &'static Schema {
        &RSVP_SCHEMA
    }

    fn from_fields(id: &str, r: &Reader<'_>) -> Self {
        Self {
            id: id.to_string(),
            user_id: r.opt_text("userId").unwrap_or_else(|| id.to_string()),
            status: r
                .opt_text("status")
                .and_then(|s| RsvpStatus::parse(&s))
                .unwrap_or(RsvpStatus::Going),
            created_at: r.timestamp("createdAt"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsvpDraft {
    pub user_id: String,
    pub status: RsvpStatus,
}

impl Candidate for RsvpDraft {
    fn schema() -> &'static Schema {
        &RSVP_SCHEMA
    }

    fn to_fields(&self) -> Fields {
        fields([
            ("userId", self.user_id.as_str().into()),
            ("status", self.status.as_str().into()),
            ("createdAt", FieldValue::ServerTimestamp),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_store::value::fields_from_json;

    #[test]
    fn test_absent_doc_is_none() {
        assert_eq!(Rsvp::from_stored_doc("u1", None), None);
    }

    #[test]
    fn test_defaults() {
        let rsvp = Rsvp::from_stored_doc(
            "u1",
            Some(&fields_from_json(serde_json::json!({ "status": "interested" }))),
        )
        .unwrap();
        assert_eq!(rsvp.user_id, "u1");
        assert_eq!(rsvp.status, RsvpStatus::Interested);

        let legacy = Rsvp::from_stored_doc("u2", Some(&Fields::new())).unwrap();
        assert_eq!(legacy.status, RsvpStatus::Going);
    }

    #[test]
    fn test_event_id_from_path() {
        let doc = Document::new("events/e9/rsvps/u1", Fields::new());
        assert_eq!(Rsvp::event_id(&doc), Some("e9"));
    }

    #[test]
    fn test_draft_is_valid() {
        let draft = RsvpDraft {
            user_id: "u1".into(),
            status: RsvpStatus::Going,
        };
        assert!(draft.validate().valid);
    }
}
