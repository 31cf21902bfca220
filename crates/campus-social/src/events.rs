//! Event creation, lookup and creator-only deletion.

use std::sync::Arc;

use campus_store::{Direction, DocumentStore, Query, WriteBatch};
use tracing::{info, warn};

use crate::auth::AuthUser;
use crate::error::{Result, SocialError};
use crate::model::event::{Event, EventDraft};
use crate::model::friend::FriendEdge;
use crate::model::notification::NotificationDraft;
use crate::model::{Candidate, StoredEntity};
use crate::paths;
use crate::telemetry;
use crate::types::NotificationType;

#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn DocumentStore>,
    notify_friends: bool,
}

impl EventService {
    pub fn new(store: Arc<dyn DocumentStore>, notify_friends: bool) -> Self {
        Self {
            store,
            notify_friends,
        }
    }

    /// Validates and writes a new event authored by `user`.
    ///
    /// Requires a verified email.  When enabled, the author's friends get an
    /// `event_live` notification; that fan-out is best-effort.
    pub async fn create_event(
        &self,
        user: &AuthUser,
        author_name: &str,
        draft: &EventDraft,
    ) -> Result<Event> {
        if !user.email_verified {
            return Err(SocialError::EmailNotVerified);
        }
        draft.validate().into_result()?;

        let id = self.store.new_id();
        let path = paths::event(&id);
        self.store
            .set(&path, draft.to_create_fields(&user.uid, author_name))
            .await?;
        info!(event_id = %id, uid = %user.uid, visibility = draft.visibility.as_str(), "event created");

        if self.notify_friends {
            if let Err(err) = self.fan_out_live(&id, &user.uid, author_name).await {
                telemetry::report("event_live_fan_out", &err);
            }
        }

        self.get_event(&id)
            .await?
            .ok_or_else(|| SocialError::NotFound(path))
    }

    async fn fan_out_live(&self, event_id: &str, author_uid: &str, author_name: &str) -> Result<()> {
        let edges = self
            .store
            .query(&Query::collection(paths::friends(author_uid)))
            .await?;
        if edges.is_empty() {
            return Ok(());
        }

        let mut batch = WriteBatch::new();
        for doc in &edges {
            let edge = FriendEdge::from_document(doc);
            let draft = NotificationDraft::new(
                NotificationType::EventLive,
                author_uid,
                author_name,
                edge.friend_uid.as_str(),
            )
            .event(event_id);
            if draft.is_self_notification() || !draft.validate().valid {
                warn!(owner = author_uid, friend = %edge.friend_uid, "skipping malformed friend edge");
                continue;
            }
            batch.set(
                paths::notification(&edge.friend_uid, &self.store.new_id()),
                draft.to_fields(),
            );
        }
        let count = batch.len();
        self.store.commit(batch).await?;

        info!(event_id, count, "event_live notifications sent");
        Ok(())
    }

    pub async fn get_event(&self, event_id: &str) -> Result<Option<Event>> {
        let doc = self.store.get(&paths::event(event_id)).await?;
        Ok(doc.map(|doc| Event::from_document(&doc)))
    }

    /// Events created by `uid`, newest first.
    pub async fn fetch_user_events(&self, uid: &str, limit: usize) -> Result<Vec<Event>> {
        let docs = self
            .store
            .query(
                &Query::collection(paths::EVENTS)
                    .where_eq("createdBy", uid)
                    .order_by("createdAt", Direction::Descending)
                    .limit(limit),
            )
            .await?;
        Ok(docs.iter().map(Event::from_document).collect())
    }

    /// Creator-only.  The event, its comments and its RSVPs go in one batch.
    pub async fn delete_event(&self, actor_uid: &str, event_id: &str) -> Result<()> {
        let event = self
            .get_event(event_id)
            .await?
            .ok_or_else(|| SocialError::NotFound(paths::event(event_id)))?;
        if event.created_by != actor_uid {
            return Err(SocialError::Forbidden("only the creator can delete an event".into()));
        }

        let comments_query = Query::collection(paths::comments(event_id));
        let rsvps_query = Query::collection(paths::rsvps(event_id));
        let (comments, rsvps) = futures::try_join!(
            self.store.query(&comments_query),
            self.store.query(&rsvps_query),
        )?;

        let mut batch = WriteBatch::new();
        for doc in comments.iter().chain(rsvps.iter()) {
            batch.delete(doc.path.as_str());
        }
        batch.delete(paths::event(event_id));
        self.store.commit(batch).await?;

        info!(event_id, uid = actor_uid, comments = comments.len(), rsvps = rsvps.len(), "event deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Visibility;
    use campus_store::MemoryStore;

    fn service() -> (Arc<MemoryStore>, EventService) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), EventService::new(store, true))
    }

    fn verified(uid: &str) -> AuthUser {
        AuthUser::new(uid, format!("{uid}@campus.edu"), true)
    }

    #[tokio::test]
    async fn test_capacity_zero_rejected_null_accepted() {
        let (_store, events) = service();
        let mut draft = EventDraft::new("Board games", "Bring your favourite");
        draft.capacity = Some(0);

        let err = events
            .create_event(&verified("u1"), "Ada", &draft)
            .await
            .unwrap_err();
        match err {
            SocialError::Validation(errors) => {
                assert!(errors.contains(&"capacity must be a positive number".to_string()))
            }
            other => panic!("unexpected error: {other:?}"),
        }

        draft.capacity = None;
        let event = events
            .create_event(&verified("u1"), "Ada", &draft)
            .await
            .unwrap();
        assert_eq!(event.capacity, None);
        assert_eq!(event.created_by, "u1");
        assert_eq!(event.created_by_name, "Ada");
        assert_eq!(event.title_lower, "board games");
        assert!(event.created_at.is_some());
    }

    #[tokio::test]
    async fn test_unverified_user_rejected() {
        let (store, events) = service();
        let user = AuthUser::new("u1", "u1@campus.edu", false);
        let err = events
            .create_event(&user, "Ada", &EventDraft::new("Hi", "There"))
            .await
            .unwrap_err();
        assert!(err.is_permission_denied());
        assert!(store.paths_under("events/").await.is_empty());
    }

    #[tokio::test]
    async fn test_friends_get_event_live() {
        let (store, events) = service();
        let mut batch = WriteBatch::new();
        batch
            .set(paths::friend_edge("u1", "u2"), FriendEdge::new("u1", "u2").to_fields())
            .set(paths::friend_edge("u1", "u3"), FriendEdge::new("u1", "u3").to_fields());
        store.commit(batch).await.unwrap();

        let mut draft = EventDraft::new("Study group", "CS 225");
        draft.visibility = Visibility::Friends;
        let event = events
            .create_event(&verified("u1"), "Ada", &draft)
            .await
            .unwrap();

        for friend in ["u2", "u3"] {
            let docs = store
                .query(&Query::collection(paths::notifications(friend)))
                .await
                .unwrap();
            assert_eq!(docs.len(), 1);
            let n = crate::model::notification::Notification::from_document(&docs[0]);
            assert_eq!(n.kind, Some(NotificationType::EventLive));
            assert_eq!(n.event_id.as_deref(), Some(event.id.as_str()));
        }
        assert!(store.paths_under("users/u1/notifications").await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_event_creator_only_and_cascades() {
        let (store, events) = service();
        let event = events
            .create_event(&verified("u1"), "Ada", &EventDraft::new("Jam", "Bring guitars"))
            .await
            .unwrap();
        store
            .set(&paths::comment(&event.id, "c1"), Default::default())
            .await
            .unwrap();
        store
            .set(&paths::rsvp(&event.id, "u2"), Default::default())
            .await
            .unwrap();

        let err = events.delete_event("u2", &event.id).await.unwrap_err();
        assert!(matches!(err, SocialError::Forbidden(_)));

        events.delete_event("u1", &event.id).await.unwrap();
        assert!(store.paths_under(&paths::event(&event.id)).await.is_empty());

        let err = events.delete_event("u1", &event.id).await.unwrap_err();
        assert!(matches!(err, SocialError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_fetch_user_events_newest_first() {
        let (_store, events) = service();
        let first = events
            .create_event(&verified("u1"), "Ada", &EventDraft::new("One", "1"))
            .await
            .unwrap();
        let second = events
            .create_event(&verified("u1"), "Ada", &EventDraft::new("Two", "2"))
            .await
            .unwrap();
        events
            .create_event(&verified("u2"), "Bo", &EventDraft::new("Other", "3"))
            .await
            .unwrap();

        let mine = events.fetch_user_events("u1", 10).await.unwrap();
        let ids: Vec<&str> = mine.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, [second.id.as_str(), first.id.as_str()]);
    }
}
