//! User profiles.

use campus_store::{FieldValue, Fields};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{BIO_MAX, DISPLAY_NAME_MAX};
use crate::model::schema::{fields, FieldSpec, Kind, Reader, Rule, Schema};
use crate::model::{Candidate, StoredEntity};

pub static PROFILE_SCHEMA: Schema = Schema {
    entity: "user_profile",
    fields: &[
        FieldSpec::new("uid", Kind::Text),
        FieldSpec::new("displayName", Kind::Text)
            .aliases(&["name"])
            .rules(&[Rule::Required, Rule::MaxChars(DISPLAY_NAME_MAX)]),
        FieldSpec::new("displayNameLower", Kind::Text),
        FieldSpec::new("bio", Kind::Text).rules(&[Rule::MaxChars(BIO_MAX)]),
        FieldSpec::new("program", Kind::Text).aliases(&["major"]),
        FieldSpec::new("year", Kind::Number),
        FieldSpec::new("interests", Kind::TextList),
        FieldSpec::new("createdAt", Kind::Timestamp),
        FieldSpec::new("lastActiveAt", Kind::Timestamp),
    ],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub display_name: String,
    /// Always `display_name.to_lowercase()`; drives name prefix search.
    pub display_name_lower: String,
    pub bio: String,
    pub program: String,
    pub year: Option<i64>,
    pub interests: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub last_active_at: Option<DateTime<Utc>>,
}

impl StoredEntity for UserProfile {
    fn schema() -> &'static Schema {
        &PROFILE_SCHEMA
    }

    fn from_fields(id: &str, r: &Reader<'_>) -> Self {
        let display_name = r.text("displayName");
        Self {
            uid: r.opt_text("uid").unwrap_or_else(|| id.to_string()),
            display_name_lower: r
                .opt_text("displayNameLower")
                .unwrap_or_else(|| display_name.to_lowercase()),
            display_name,
            bio: r.text("bio"),
            program: r.text("program"),
            year: r.integer("year"),
            interests: r.text_list("interests"),
            created_at: r.timestamp("createdAt"),
            last_active_at: r.timestamp("lastActiveAt"),
        }
    }
}

/// Editable profile fields, validated as a whole before every write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDraft {
    pub display_name: String,
    pub bio: String,
    pub program: String,
    pub year: Option<i64>,
    pub interests: Vec<String>,
}

impl ProfileDraft {
    pub fn named(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ..Self::default()
        }
    }

    /// Apply a partial update on top of this draft.
    pub fn merged(mut self, update: &ProfileUpdate) -> Self {
        if let Some(name) = &update.display_name {
            self.display_name = name.clone();
        }
        if let Some(bio) = &update.bio {
            self.bio = bio.clone();
        }
        if let Some(program) = &update.program {
            self.program = program.clone();
        }
        if let Some(year) = update.year {
            self.year = year;
        }
        if let Some(interests) = &update.interests {
            self.interests = interests.clone();
        }
        self
    }
}

impl From<&UserProfile> for ProfileDraft {
    fn from(profile: &UserProfile) -> Self {
        Self {
            display_name: profile.display_name.clone(),
            bio: profile.bio.clone(),
            program: profile.program.clone(),
            year: profile.year,
            interests: profile.interests.clone(),
        }
    }
}

impl Candidate for ProfileDraft {
    fn schema() -> &'static Schema {
        &PROFILE_SCHEMA
    }

    /// Includes the derived lowercase name so every write keeps it in sync.
    fn to_fields(&self) -> Fields {
        let display_name = self.display_name.trim();
        fields([
            ("displayName", display_name.into()),
            ("displayNameLower", display_name.to_lowercase().into()),
            ("bio", self.bio.trim().into()),
            ("program", self.program.trim().into()),
            ("year", self.year.into()),
            ("interests", self.interests.clone().into()),
        ])
    }
}

/// Partial profile change.  `year: Some(None)` clears the year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub program: Option<String>,
    pub year: Option<Option<i64>>,
    pub interests: Option<Vec<String>>,
}

/// Fields for a brand-new profile document.
pub fn new_profile_fields(uid: &str, draft: &ProfileDraft) -> Fields {
    let mut out = draft.to_fields();
    out.insert("uid".into(), uid.into());
    out.insert("createdAt".into(), FieldValue::ServerTimestamp);
    out.insert("lastActiveAt".into(), FieldValue::ServerTimestamp);
    out
}
