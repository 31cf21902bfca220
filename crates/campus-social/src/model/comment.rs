//! Two-level comment threads.

use campus_store::{FieldValue, Fields};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::COMMENT_TEXT_MAX;
use crate::model::schema::{fields, FieldSpec, Kind, Reader, Rule, Schema};
use crate::model::{Candidate, StoredEntity};

pub static COMMENT_SCHEMA: Schema = Schema {
    entity: "comment",
    fields: &[
        FieldSpec::new("text", Kind::Text)
            .aliases(&["body"])
            .rules(&[Rule::Required, Rule::MaxChars(COMMENT_TEXT_MAX)]),
        FieldSpec::new("createdAt", Kind::Timestamp),
        FieldSpec::new("createdBy", Kind::Text).rules(&[Rule::Required]),
        FieldSpec::new("createdByName", Kind::Text),
        FieldSpec::new("parentId", Kind::Text),
        FieldSpec::new("rootId", Kind::Text),
        FieldSpec::new("replyToUid", Kind::Text),
    ],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub text: String,
    pub created_at: Option<DateTime<Utc>>,
    pub created_by: String,
    pub created_by_name: String,
    /// `None` for a root comment.
    pub parent_id: Option<String>,
    /// The comment's own id for a root, the root's id for a reply.
    pub root_id: String,
    pub reply_to_uid: Option<String>,
}

impl Comment {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

impl StoredEntity for Comment {
    fn schema() -> &'static Schema {
        &COMMENT_SCHEMA
    }

    fn from_fields(id: &str, r: &Reader<'_>) -> Self {
        let parent_id = r.opt_text("parentId");
        // Threads are two levels deep, so a reply's parent is its root.
        let root_id = r
            .opt_text("rootId")
            .or_else(|| parent_id.clone())
            .unwrap_or_else(|| id.to_string());
        Self {
            id: id.to_string(),
            text: r.text("text"),
            created_at: r.timestamp("createdAt"),
            created_by: r.text("createdBy"),
            created_by_name: r.text("createdByName"),
            parent_id,
            root_id,
            reply_to_uid: r.opt_text("replyToUid"),
        }
    }
}

/// A comment about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentDraft {
    pub text: String,
    pub created_by: String,
    pub created_by_name: String,
    pub parent_id: Option<String>,
    pub root_id: String,
    pub reply_to_uid: Option<String>,
}

impl Candidate for CommentDraft {
    fn schema() -> &'static Schema {
        &COMMENT_SCHEMA
    }

    fn to_fields(&self) -> Fields {
        fields([
            ("text", self.text.trim().into()),
            ("createdAt", FieldValue::ServerTimestamp),
            ("createdBy", self.created_by.as_str().into()),
            ("createdByName", self.created_by_name.as_str().into()),
            ("parentId", self.parent_id.clone().into()),
            ("rootId", self.root_id.as_str().into()),
            ("replyToUid", self.reply_to_uid.clone().into()),
        ])
    }
}
