//! In-app notifications, stored under the target user.

use campus_store::{FieldValue, Fields};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::schema::{fields, FieldSpec, Kind, Reader, Rule, Schema};
use crate::model::{Candidate, StoredEntity};
use crate::types::NotificationType;

pub const SELF_NOTIFICATION_MESSAGE: &str = "actorUid and targetUid must differ";

pub static NOTIFICATION_SCHEMA: Schema = Schema {
    entity: "notification",
    fields: &[
        FieldSpec::new("type", Kind::Text)
            .rules(&[Rule::Required, Rule::OneOf(NotificationType::ALL)]),
        FieldSpec::new("actorUid", Kind::Text).rules(&[Rule::Required]),
        FieldSpec::new("actorName", Kind::Text),
        FieldSpec::new("targetUid", Kind::Text).rules(&[
            Rule::Required,
            Rule::DiffersFrom("actorUid", SELF_NOTIFICATION_MESSAGE),
        ]),
        FieldSpec::new("eventId", Kind::Text),
        FieldSpec::new("commentId", Kind::Text),
        FieldSpec::new("rootCommentId", Kind::Text),
        FieldSpec::new("createdAt", Kind::Timestamp),
        FieldSpec::new("readAt", Kind::Timestamp),
    ],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    /// `None` for documents with an unrecognized type.
    #[serde(rename = "type")]
    pub kind: Option<NotificationType>,
    pub actor_uid: String,
    pub actor_name: String,
    pub target_uid: String,
    pub event_id: Option<String>,
    pub comment_id: Option<String>,
    pub root_comment_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

impl StoredEntity for Notification {
    fn schema() -> &'static Schema {
        &NOTIFICATION_SCHEMA
    }

    fn from_fields(id: &str, r: &Reader<'_>) -> Self {
        Self {
            id: id.to_string(),
            kind: r
                .opt_text("type")
                .and_then(|s| NotificationType::parse(&s)),
            actor_uid: r.text("actorUid"),
            actor_name: r.text("actorName"),
            target_uid: r.text("targetUid"),
            event_id: r.opt_text("eventId"),
            comment_id: r.opt_text("commentId"),
            root_comment_id: r.opt_text("rootCommentId"),
            created_at: r.timestamp("createdAt"),
            read_at: r.timestamp("readAt"),
        }
    }
}

/// Input for [`NotificationService::create_notification`](crate::notifications::NotificationService::create_notification).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDraft {
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub actor_uid: String,
    pub actor_name: String,
    pub target_uid: String,
    pub event_id: Option<String>,
    pub comment_id: Option<String>,
    pub root_comment_id: Option<String>,
}

impl NotificationDraft {
    pub fn new(
        kind: NotificationType,
        actor_uid: impl Into<String>,
        actor_name: impl Into<String>,
        target_uid: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            actor_uid: actor_uid.into(),
            actor_name: actor_name.into(),
            target_uid: target_uid.into(),
            event_id: None,
            comment_id: None,
            root_comment_id: None,
        }
    }

    pub fn event(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    pub fn comment(mut self, comment_id: impl Into<String>, root_comment_id: impl Into<String>) -> Self {
        self.comment_id = Some(comment_id.into());
        self.root_comment_id = Some(root_comment_id.into());
        self
    }

    pub fn is_self_notification(&self) -> bool {
        self.actor_uid == self.target_uid
    }
}

impl Candidate for NotificationDraft {
    fn schema() -> &'static Schema {
        &NOTIFICATION_SCHEMA
    }

    fn to_fields(&self) -> Fields {
        fields([
            ("type", self.kind.as_str().into()),
            ("actorUid", self.actor_uid.as_str().into()),
            ("actorName", self.actor_name.as_str().into()),
            ("targetUid", self.target_uid.as_str().into()),
            ("eventId", self.event_id.clone().into()),
            ("commentId", self.comment_id.clone().into()),
            ("rootCommentId", self.root_comment_id.clone().into()),
            ("createdAt", FieldValue::ServerTimestamp),
            ("readAt", FieldValue::Null),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_store::value::fields_from_json;

    #[test]
    fn test_absent_doc_is_none() {
        assert_eq!(Notification::from_stored_doc("n1", None), None);
    }

    #[test]
    fn test_unknown_type_maps_to_none() {
        let raw = fields_from_json(serde_json::json!({
            "type": "poke",
            "actorUid": "a",
            "targetUid": "b",
            "readAt": "2024-01-01T00:00:00Z",
        }));
        let n = Notification::from_stored_doc("n1", Some(&raw)).unwrap();
        assert_eq!(n.kind, None);
        assert!(n.is_read());
        assert_eq!(n.event_id, None);
    }

    #[test]
    fn test_self_notification_invalid() {
        let draft = NotificationDraft::new(NotificationType::Comment, "x", "X", "x");
        assert!(draft.is_self_notification());
        assert_eq!(draft.validate().errors, [SELF_NOTIFICATION_MESSAGE]);

        let ok = NotificationDraft::new(NotificationType::Reply, "x", "X", "y")
            .event("e1")
            .comment("c2", "c1");
        assert!(ok.validate().valid);
        assert_eq!(ok.to_fields()["rootCommentId"], FieldValue::from("c1"));
    }
}
