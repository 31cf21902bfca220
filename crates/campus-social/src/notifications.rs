//! Notification store.
//!
//! Notifications live under `users/{targetUid}/notifications` and are
//! created as a side effect of another mutation.  The only later change is
//! setting `readAt`; the owner may delete them.

use std::sync::Arc;

use campus_store::{Direction, DocumentStore, FieldValue, Query, WriteBatch};
use tracing::{debug, info};

use crate::error::{Result, SocialError};
use crate::model::notification::{Notification, NotificationDraft};
use crate::model::schema::fields;
use crate::model::{Candidate, StoredEntity};
use crate::paths;
use crate::telemetry;

#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn DocumentStore>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Append a notification to the target's list with `readAt = null`.
    pub async fn create_notification(&self, draft: &NotificationDraft) -> Result<String> {
        if draft.is_self_notification() {
            return Err(SocialError::SelfNotification);
        }
        draft.validate().into_result()?;

        let id = self.store.new_id();
        self.store
            .set(&paths::notification(&draft.target_uid, &id), draft.to_fields())
            .await?;

        debug!(
            id = %id,
            kind = draft.kind.as_str(),
            actor = %draft.actor_uid,
            target = %draft.target_uid,
            "notification created"
        );
        Ok(id)
    }

    /// Best-effort variant for side effects: failures are reported and
    /// swallowed so the primary mutation still succeeds.
    pub(crate) async fn notify(&self, draft: NotificationDraft) {
        if draft.is_self_notification() {
            return;
        }
        if let Err(err) = self.create_notification(&draft).await {
            telemetry::report("create_notification", &err);
        }
    }

    /// Newest first.
    pub async fn fetch_notifications(&self, uid: &str, limit: usize) -> Result<Vec<Notification>> {
        let docs = self
            .store
            .query(
                &Query::collection(paths::notifications(uid))
                    .order_by("createdAt", Direction::Descending)
                    .limit(limit),
            )
            .await?;
        Ok(docs.iter().map(Notification::from_document).collect())
    }

    pub async fn unread_count(&self, uid: &str) -> Result<usize> {
        let count = self
            .store
            .count(&Query::collection(paths::notifications(uid)).where_eq("readAt", FieldValue::Null))
            .await?;
        Ok(count)
    }

    pub async fn mark_read(&self, uid: &str, notification_id: &str) -> Result<()> {
        self.store
            .update(
                &paths::notification(uid, notification_id),
                fields([("readAt", FieldValue::ServerTimestamp)]),
            )
            .await?;
        Ok(())
    }

    /// Marks every unread notification read in one batch.  Returns how many
    /// changed.
    pub async fn mark_all_read(&self, uid: &str) -> Result<usize> {
        let unread = self
            .store
            .query(&Query::collection(paths::notifications(uid)).where_eq("readAt", FieldValue::Null))
            .await?;
        if unread.is_empty() {
            return Ok(0);
        }

        let mut batch = WriteBatch::new();
        for doc in &unread {
            batch.update(doc.path.as_str(), fields([("readAt", FieldValue::ServerTimestamp)]));
        }
        self.store.commit(batch).await?;

        info!(uid, count = unread.len(), "notifications marked read");
        Ok(unread.len())
    }

    /// Removes the given notifications in one batch.  Ids that no longer
    /// exist are ignored.
    pub async fn delete_notifications(&self, uid: &str, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut batch = WriteBatch::new();
        for id in ids {
            batch.delete(paths::notification(uid, id));
        }
        self.store.commit(batch).await?;

        info!(uid, count = ids.len(), "notifications deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NotificationType;
    use campus_store::MemoryStore;

    fn service() -> (Arc<MemoryStore>, NotificationService) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), NotificationService::new(store))
    }

    #[tokio::test]
    async fn test_self_notification_fails() {
        let (store, notifications) = service();
        let draft = NotificationDraft::new(NotificationType::Comment, "x", "X", "x");

        let err = notifications.create_notification(&draft).await.unwrap_err();
        assert!(matches!(err, SocialError::SelfNotification));
        assert!(store.paths_under("users/").await.is_empty());
    }

    #[tokio::test]
    async fn test_create_fetch_and_read() {
        let (_store, notifications) = service();
        let first = notifications
            .create_notification(&NotificationDraft::new(
                NotificationType::FriendRequest,
                "a",
                "Ada",
                "b",
            ))
            .await
            .unwrap();
        let second = notifications
            .create_notification(
                &NotificationDraft::new(NotificationType::Comment, "c", "Cy", "b").event("e1"),
            )
            .await
            .unwrap();

        let list = notifications.fetch_notifications("b", 10).await.unwrap();
        let ids: Vec<&str> = list.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, [second.as_str(), first.as_str()]);
        assert!(list.iter().all(|n| !n.is_read()));
        assert_eq!(list[0].event_id.as_deref(), Some("e1"));
        assert_eq!(notifications.unread_count("b").await.unwrap(), 2);

        notifications.mark_read("b", &first).await.unwrap();
        assert_eq!(notifications.unread_count("b").await.unwrap(), 1);

        assert_eq!(notifications.mark_all_read("b").await.unwrap(), 1);
        assert_eq!(notifications.unread_count("b").await.unwrap(), 0);
        assert_eq!(notifications.mark_all_read("b").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_read_missing_is_not_found() {
        let (_store, notifications) = service();
        let err = notifications.mark_read("b", "nope").await.unwrap_err();
        assert_eq!(err.category(), crate::error::ErrorCategory::NotFound);
    }

    #[tokio::test]
    async fn test_delete_batch_ignores_absent() {
        let (store, notifications) = service();
        let id = notifications
            .create_notification(&NotificationDraft::new(NotificationType::Reply, "a", "Ada", "b"))
            .await
            .unwrap();

        notifications
            .delete_notifications("b", &[id.clone(), "ghost".to_string()])
            .await
            .unwrap();
        assert!(store.paths_under("users/b/notifications").await.is_empty());

        notifications.delete_notifications("b", &[id]).await.unwrap();
    }
}
