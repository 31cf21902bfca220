//! Friend requests and the per-user edge records that materialize a
//! friendship.

use campus_store::{FieldValue, Fields};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::schema::{fields, FieldSpec, Kind, Reader, Rule, Schema};
use crate::model::{Candidate, StoredEntity};
use crate::types::RequestStatus;

pub const SELF_REQUEST_MESSAGE: &str = "cannot send a friend request to yourself";

pub static FRIEND_REQUEST_SCHEMA: Schema = Schema {
    entity: "friend_request",
    fields: &[
        FieldSpec::new("fromUid", Kind::Text).rules(&[Rule::Required]),
        FieldSpec::new("toUid", Kind::Text)
            .rules(&[Rule::Required, Rule::DiffersFrom("fromUid", SELF_REQUEST_MESSAGE)]),
        FieldSpec::new("status", Kind::Text).rules(&[Rule::OneOf(RequestStatus::ALL)]),
        FieldSpec::new("createdAt", Kind::Timestamp),
        FieldSpec::new("respondedAt", Kind::Timestamp),
    ],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    /// `{fromUid}_{toUid}`.
    pub id: String,
    pub from_uid: String,
    pub to_uid: String,
    pub status: RequestStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl StoredEntity for FriendRequest {
    fn schema() -> &'static Schema {
        &FRIEND_REQUEST_SCHEMA
    }

    fn from_fields(id: &str, r: &Reader<'_>) -> Self {
        // Older documents only carry the participants in the id.
        let (id_from, id_to) = id.split_once('_').unwrap_or((id, ""));
        Self {
            id: id.to_string(),
            from_uid: r.opt_text("fromUid").unwrap_or_else(|| id_from.to_string()),
            to_uid: r.opt_text("toUid").unwrap_or_else(|| id_to.to_string()),
            status: r
                .opt_text("status")
                .and_then(|s| RequestStatus::parse(&s))
                .unwrap_or(RequestStatus::Pending),
            created_at: r.timestamp("createdAt"),
            responded_at: r.timestamp("respondedAt"),
        }
    }
}

/// A request about to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDraft {
    pub from_uid: String,
    pub to_uid: String,
}

impl Candidate for RequestDraft {
    fn schema() -> &'static Schema {
        &FRIEND_REQUEST_SCHEMA
    }

    fn to_fields(&self) -> Fields {
        fields([
            ("fromUid", self.from_uid.as_str().into()),
            ("toUid", self.to_uid.as_str().into()),
            ("status", RequestStatus::Pending.as_str().into()),
            ("createdAt", FieldValue::ServerTimestamp),
            ("respondedAt", FieldValue::Null),
        ])
    }
}

pub static FRIEND_EDGE_SCHEMA: Schema = Schema {
    entity: "friend_edge",
    fields: &[
        FieldSpec::new("ownerUid", Kind::Text).rules(&[Rule::Required]),
        FieldSpec::new("friendUid", Kind::Text).rules(&[
            Rule::Required,
            Rule::DiffersFrom("ownerUid", "cannot befriend yourself"),
        ]),
        FieldSpec::new("createdAt", Kind::Timestamp),
    ],
};

/// One side of a friendship, stored under the owner's `friends`
/// collection.  Every edge has a mirror with owner and friend swapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendEdge {
    pub owner_uid: String,
    pub friend_uid: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl FriendEdge {
    pub fn new(owner_uid: impl Into<String>, friend_uid: impl Into<String>) -> Self {
        Self {
            owner_uid: owner_uid.into(),
            friend_uid: friend_uid.into(),
            created_at: None,
        }
    }

    pub fn mirror(&self) -> Self {
        Self {
            owner_uid: self.friend_uid.clone(),
            friend_uid: self.owner_uid.clone(),
            created_at: self.created_at,
        }
    }
}

impl StoredEntity for FriendEdge {
    fn schema() -> &'static Schema {
        &FRIEND_EDGE_SCHEMA
    }

    /// The document id is the friend's uid.
    fn from_fields(id: &str, r: &Reader<'_>) -> Self {
        Self {
            owner_uid: r.text("ownerUid"),
            friend_uid: r.opt_text("friendUid").unwrap_or_else(|| id.to_string()),
            created_at: r.timestamp("createdAt"),
        }
    }
}

impl Candidate for FriendEdge {
    fn schema() -> &'static Schema {
        &FRIEND_EDGE_SCHEMA
    }

    fn to_fields(&self) -> Fields {
        fields([
            ("ownerUid", self.owner_uid.as_str().into()),
            ("friendUid", self.friend_uid.as_str().into()),
            ("createdAt", FieldValue::ServerTimestamp),
        ])
    }
}
