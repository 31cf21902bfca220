//! User profiles: lazy creation, owner-only updates, name search.

use std::sync::Arc;

use campus_store::{Direction, DocumentStore, FieldValue, Query};
use tracing::info;

use crate::auth::AuthUser;
use crate::constants::{
    DISPLAY_NAME_MAX, FALLBACK_DISPLAY_NAME, PREFIX_RANGE_END, SEARCH_MIN_CHARS,
};
use crate::error::{Result, SocialError};
use crate::model::profile::{new_profile_fields, ProfileDraft, ProfileUpdate, UserProfile};
use crate::model::schema::fields;
use crate::model::{Candidate, StoredEntity};
use crate::paths;

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn DocumentStore>,
    search_limit: usize,
}

impl ProfileService {
    pub fn new(store: Arc<dyn DocumentStore>, search_limit: usize) -> Self {
        Self {
            store,
            search_limit,
        }
    }

    pub async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>> {
        let doc = self.store.get(&paths::user(uid)).await?;
        Ok(doc.map(|doc| UserProfile::from_document(&doc)))
    }

    /// Email local part cut to the display name limit, or the placeholder.
    fn handle_name(user: &AuthUser) -> String {
        let handle = user.email_handle().trim();
        if handle.is_empty() {
            return FALLBACK_DISPLAY_NAME.to_string();
        }
        handle.chars().take(DISPLAY_NAME_MAX).collect()
    }

    /// Returns the signed-in user's profile, creating it on first session.
    ///
    /// The initial display name is `display_name` when given, else the
    /// local part of the email address cut to the display name limit.
    pub async fn get_or_create_profile(
        &self,
        user: &AuthUser,
        display_name: Option<&str>,
    ) -> Result<UserProfile> {
        if let Some(existing) = self.get_profile(&user.uid).await? {
            return Ok(existing);
        }

        let name = match display_name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => Self::handle_name(user),
        };
        let draft = ProfileDraft::named(&name);
        draft.validate().into_result()?;

        self.store
            .set(&paths::user(&user.uid), new_profile_fields(&user.uid, &draft))
            .await?;
        info!(uid = %user.uid, "profile created");

        self.get_profile(&user.uid)
            .await?
            .ok_or_else(|| SocialError::NotFound(paths::user(&user.uid)))
    }

    /// Owner-only partial update.  The merged profile is validated as a
    /// whole and `displayNameLower` is rewritten with every change.
    pub async fn update_profile(
        &self,
        actor_uid: &str,
        uid: &str,
        update: &ProfileUpdate,
    ) -> Result<UserProfile> {
        if actor_uid != uid {
            return Err(SocialError::Forbidden("profiles are edited by their owner".into()));
        }
        let current = self
            .get_profile(uid)
            .await?
            .ok_or_else(|| SocialError::NotFound(paths::user(uid)))?;

        let draft = ProfileDraft::from(&current).merged(update);
        draft.validate().into_result()?;

        let mut changes = draft.to_fields();
        changes.insert("lastActiveAt".into(), FieldValue::ServerTimestamp);
        self.store.update(&paths::user(uid), changes).await?;
        info!(uid, "profile updated");

        self.get_profile(uid)
            .await?
            .ok_or_else(|| SocialError::NotFound(paths::user(uid)))
    }

    pub async fn touch_last_active(&self, uid: &str) -> Result<()> {
        self.store
            .update(
                &paths::user(uid),
                fields([("lastActiveAt", FieldValue::ServerTimestamp)]),
            )
            .await?;
        Ok(())
    }

    /// Case-insensitive prefix match on display names.  Queries shorter
    /// than two characters return nothing without touching the store.
    pub async fn search_users(&self, text: &str) -> Result<Vec<UserProfile>> {
        let prefix = text.trim().to_lowercase();
        if prefix.chars().count() < SEARCH_MIN_CHARS {
            return Ok(Vec::new());
        }

        let docs = self
            .store
            .query(
                &Query::collection(paths::USERS)
                    .where_gte("displayNameLower", prefix.as_str())
                    .where_lt("displayNameLower", format!("{prefix}{PREFIX_RANGE_END}"))
                    .order_by("displayNameLower", Direction::Ascending)
                    .limit(self.search_limit),
            )
            .await?;
        Ok(docs.iter().map(UserProfile::from_document).collect())
    }
}
