//! Two-level comment threads under `events/{eventId}/comments`.
//!
//! A root has `parentId = null` and `rootId` equal to its own id.  A reply
//! points both `parentId` and `rootId` at its root, so threads never nest
//! deeper than one level.

use std::sync::Arc;

use campus_store::{Direction, DocumentStore, FieldValue, Query, WriteBatch};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, SocialError};
use crate::model::comment::{Comment, CommentDraft};
use crate::model::event::Event;
use crate::model::notification::NotificationDraft;
use crate::model::{Candidate, StoredEntity};
use crate::notifications::NotificationService;
use crate::paths;
use crate::types::NotificationType;

/// The comment being replied to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyTarget {
    /// The root itself, or a reply within its thread.
    pub comment_id: String,
    pub root_id: String,
    /// Author of the comment being answered; receives the notification.
    pub uid: String,
}

/// One page of comments in creation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPage {
    pub comments: Vec<Comment>,
    /// Pass back to fetch the next page; `None` once exhausted.
    pub next_cursor: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn DocumentStore>,
    notifications: NotificationService,
    page_size: usize,
}

impl CommentService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        notifications: NotificationService,
        page_size: usize,
    ) -> Self {
        Self {
            store,
            notifications,
            page_size: page_size.max(1),
        }
    }

    async fn get_comment(&self, event_id: &str, comment_id: &str) -> Result<Option<Comment>> {
        let doc = self.store.get(&paths::comment(event_id, comment_id)).await?;
        Ok(doc.map(|doc| Comment::from_document(&doc)))
    }

    /// Posts a root comment, or a reply when `reply_to` is given.
    ///
    /// A reply may answer the root or another reply in the same thread; it
    /// is stored under the root either way.  A reply notifies the author it
    /// answers; a root comment notifies the event's creator.  Nobody is
    /// notified about their own action.
    pub async fn add_comment(
        &self,
        event_id: &str,
        text: &str,
        author_uid: &str,
        author_name: &str,
        reply_to: Option<&ReplyTarget>,
    ) -> Result<Comment> {
        let id = self.store.new_id();
        let mut draft = CommentDraft {
            text: text.to_string(),
            created_by: author_uid.to_string(),
            created_by_name: author_name.to_string(),
            parent_id: None,
            root_id: id.clone(),
            reply_to_uid: None,
        };
        if let Some(target) = reply_to {
            draft.parent_id = Some(target.root_id.clone());
            draft.root_id = target.root_id.clone();
            draft.reply_to_uid = Some(target.uid.clone());
        }
        draft.validate().into_result()?;

        let notification = match reply_to {
            Some(target) => {
                let root = self
                    .get_comment(event_id, &target.root_id)
                    .await?
                    .ok_or_else(|| SocialError::NotFound(paths::comment(event_id, &target.root_id)))?;
                if !root.is_root() {
                    return Err(SocialError::Validation(vec![
                        "rootId must refer to a top-level comment".to_string(),
                    ]));
                }
                if target.comment_id != target.root_id {
                    let answered = self
                        .get_comment(event_id, &target.comment_id)
                        .await?
                        .ok_or_else(|| SocialError::NotFound(paths::comment(event_id, &target.comment_id)))?;
                    if answered.root_id != target.root_id {
                        return Err(SocialError::Validation(vec![
                            "commentId must belong to the thread of rootId".to_string(),
                        ]));
                    }
                }
                NotificationDraft::new(NotificationType::Reply, author_uid, author_name, target.uid.as_str())
                    .event(event_id)
                    .comment(id.as_str(), target.root_id.as_str())
            }
            None => {
                let event = self
                    .store
                    .get(&paths::event(event_id))
                    .await?
                    .map(|doc| Event::from_document(&doc))
                    .ok_or_else(|| SocialError::NotFound(paths::event(event_id)))?;
                NotificationDraft::new(NotificationType::Comment, author_uid, author_name, event.created_by)
                    .event(event_id)
                    .comment(id.as_str(), id.as_str())
            }
        };

        let path = paths::comment(event_id, &id);
        self.store.set(&path, draft.to_fields()).await?;
        info!(event_id, comment_id = %id, reply = reply_to.is_some(), "comment added");

        if !notification.target_uid.is_empty() {
            self.notifications.notify(notification).await;
        }

        self.get_comment(event_id, &id)
            .await?
            .ok_or_else(|| SocialError::NotFound(path))
    }

    async fn page(&self, query: Query, cursor: Option<DateTime<Utc>>) -> Result<CommentPage> {
        let mut query = query
            .order_by("createdAt", Direction::Ascending)
            .limit(self.page_size);
        if let Some(cursor) = cursor {
            query = query.start_after(cursor);
        }
        let docs = self.store.query(&query).await?;
        let comments: Vec<Comment> = docs.iter().map(Comment::from_document).collect();

        let next_cursor = if comments.len() == self.page_size {
            comments.last().and_then(|c| c.created_at)
        } else {
            None
        };
        Ok(CommentPage {
            comments,
            next_cursor,
        })
    }

    /// Root comments, oldest first.
    pub async fn fetch_top_level_comments(
        &self,
        event_id: &str,
        cursor: Option<DateTime<Utc>>,
    ) -> Result<CommentPage> {
        let query = Query::collection(paths::comments(event_id)).where_eq("parentId", FieldValue::Null);
        self.page(query, cursor).await
    }

    /// Replies of one root, oldest first.  Loaded when a thread is expanded.
    pub async fn fetch_replies(
        &self,
        event_id: &str,
        root_id: &str,
        cursor: Option<DateTime<Utc>>,
    ) -> Result<CommentPage> {
        let query = Query::collection(paths::comments(event_id)).where_eq("parentId", root_id);
        self.page(query, cursor).await
    }

    /// Author-only.  Deleting a root removes its replies in the same batch.
    pub async fn delete_comment(&self, actor_uid: &str, event_id: &str, comment_id: &str) -> Result<()> {
        let comment = self
            .get_comment(event_id, comment_id)
            .await?
            .ok_or_else(|| SocialError::NotFound(paths::comment(event_id, comment_id)))?;
        if comment.created_by != actor_uid {
            return Err(SocialError::Forbidden("only the author can delete a comment".into()));
        }

        let mut batch = WriteBatch::new();
        if comment.is_root() {
            let replies = self
                .store
                .query(&Query::collection(paths::comments(event_id)).where_eq("parentId", comment_id))
                .await?;
            for reply in &replies {
                batch.delete(reply.path.as_str());
            }
        }
        batch.delete(paths::comment(event_id, comment_id));
        let removed = batch.len();
        self.store.commit(batch).await?;

        info!(event_id, comment_id, removed, "comment deleted");
        Ok(())
    }
}
