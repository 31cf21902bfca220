//! RSVPs, one document per (event, user) at `events/{eventId}/rsvps/{uid}`.

use std::sync::Arc;

use campus_store::{DocumentStore, Query};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ErrorCategory, Result, SocialError};
use crate::model::rsvp::{Rsvp, RsvpDraft};
use crate::model::{Candidate, StoredEntity};
use crate::paths;
use crate::telemetry;
use crate::types::RsvpStatus;

/// Count and the caller's own status, read together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpSummary {
    pub count: usize,
    pub status: Option<RsvpStatus>,
}

/// Result of [`RsvpService::fetch_user_attending_event_ids`].  On failure
/// `ids` is empty and `error` says why.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendingEventIds {
    pub ids: Vec<String>,
    pub error: Option<ErrorCategory>,
}

#[derive(Clone)]
pub struct RsvpService {
    store: Arc<dyn DocumentStore>,
}

impl RsvpService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Upsert: a new status replaces the previous one in place.
    pub async fn rsvp(&self, event_id: &str, uid: &str, status: RsvpStatus) -> Result<()> {
        let draft = RsvpDraft {
            user_id: uid.to_string(),
            status,
        };
        draft.validate().into_result()?;

        self.store
            .set(&paths::rsvp(event_id, uid), draft.to_fields())
            .await?;
        info!(event_id, uid, status = status.as_str(), "rsvp saved");
        Ok(())
    }

    /// Removing an RSVP that does not exist succeeds.
    pub async fn remove_rsvp(&self, event_id: &str, uid: &str) -> Result<()> {
        self.store.delete(&paths::rsvp(event_id, uid)).await?;
        info!(event_id, uid, "rsvp removed");
        Ok(())
    }

    pub async fn fetch_rsvp_count(&self, event_id: &str) -> Result<usize> {
        let count = self
            .store
            .count(&Query::collection(paths::rsvps(event_id)))
            .await?;
        Ok(count)
    }

    pub async fn fetch_rsvp_status(&self, event_id: &str, uid: &str) -> Result<Option<RsvpStatus>> {
        let doc = self.store.get(&paths::rsvp(event_id, uid)).await?;
        Ok(doc.map(|doc| Rsvp::from_document(&doc).status))
    }

    pub async fn fetch_rsvp_summary(&self, event_id: &str, uid: &str) -> Result<RsvpSummary> {
        let (count, status) = futures::try_join!(
            self.fetch_rsvp_count(event_id),
            self.fetch_rsvp_status(event_id, uid),
        )?;
        Ok(RsvpSummary { count, status })
    }

    /// Ids of every event `uid` has an RSVP on, either status.
    ///
    /// Never fails: a store error is reported and comes back in `error`.
    pub async fn fetch_user_attending_event_ids(&self, uid: &str) -> AttendingEventIds {
        let query = Query::group(paths::RSVPS).where_eq("userId", uid);
        match self.store.query(&query).await {
            Ok(docs) => {
                let mut ids: Vec<String> = docs
                    .iter()
                    .filter_map(Rsvp::event_id)
                    .map(str::to_string)
                    .collect();
                ids.sort();
                ids.dedup();
                AttendingEventIds { ids, error: None }
            }
            Err(err) => {
                let err = SocialError::from(err);
                telemetry::report("fetch_user_attending_event_ids", &err);
                AttendingEventIds {
                    ids: Vec::new(),
                    error: Some(err.category()),
                }
            }
        }
    }
}
