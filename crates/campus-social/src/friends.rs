//! Friend graph.
//!
//! A request is keyed `{fromUid}_{toUid}` and moves from `pending` to one of
//! the terminal states.  Accepting writes the two mirrored edges together
//! with the status change in a single batch; removing deletes them the same
//! way.

use std::sync::Arc;

use campus_store::{DocumentStore, FieldValue, Fields, Query, WriteBatch};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::constants::FALLBACK_DISPLAY_NAME;
use crate::error::{Result, SocialError};
use crate::model::friend::{FriendEdge, FriendRequest, RequestDraft};
use crate::model::notification::NotificationDraft;
use crate::model::profile::UserProfile;
use crate::model::schema::fields;
use crate::model::{Candidate, StoredEntity};
use crate::notifications::NotificationService;
use crate::paths;
use crate::telemetry;
use crate::types::{FriendshipStatus, NotificationType, RequestStatus};

/// A friend edge joined with the friend's current display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Friend {
    pub uid: String,
    pub display_name: String,
    pub since: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct FriendService {
    store: Arc<dyn DocumentStore>,
    notifications: NotificationService,
}

impl FriendService {
    pub fn new(store: Arc<dyn DocumentStore>, notifications: NotificationService) -> Self {
        Self {
            store,
            notifications,
        }
    }

    /// Whatever occupies the `{from}_{to}` slot, which may belong to
    /// another pair when a uid contains `_`.
    async fn request_slot(&self, from_uid: &str, to_uid: &str) -> Result<Option<FriendRequest>> {
        let id = paths::friend_request_id(from_uid, to_uid);
        let doc = self.store.get(&paths::friend_request(from_uid, to_uid)).await?;
        Ok(FriendRequest::from_stored_doc(&id, doc.as_ref().map(|d| &d.fields)))
    }

    /// The request from `from_uid` to `to_uid`, if that pair sent one.
    async fn read_request(&self, from_uid: &str, to_uid: &str) -> Result<Option<FriendRequest>> {
        Ok(self
            .request_slot(from_uid, to_uid)
            .await?
            .filter(|r| r.from_uid == from_uid && r.to_uid == to_uid))
    }

    async fn has_edge(&self, owner_uid: &str, friend_uid: &str) -> Result<bool> {
        Ok(self
            .store
            .get(&paths::friend_edge(owner_uid, friend_uid))
            .await?
            .is_some())
    }

    /// Sends a request from `from_uid` to `to_uid` and notifies the
    /// recipient.
    ///
    /// Fails if the two are already friends or an open request exists in
    /// either direction, or if another pair's open request holds the same
    /// id.  A rejected or cancelled request is replaced.
    pub async fn send_request(&self, from_uid: &str, from_name: &str, to_uid: &str) -> Result<()> {
        if from_uid == to_uid {
            return Err(SocialError::SelfFriendRequest);
        }
        let draft = RequestDraft {
            from_uid: from_uid.to_string(),
            to_uid: to_uid.to_string(),
        };
        draft.validate().into_result()?;

        let (friends, outgoing, incoming) = futures::try_join!(
            self.has_edge(from_uid, to_uid),
            self.request_slot(from_uid, to_uid),
            self.read_request(to_uid, from_uid),
        )?;
        if friends {
            return Err(SocialError::AlreadyFriends);
        }
        let open = |r: &Option<FriendRequest>| r.as_ref().is_some_and(|r| r.status.is_open());
        if open(&outgoing) || open(&incoming) {
            return Err(SocialError::RequestAlreadyExists);
        }

        self.store
            .set(&paths::friend_request(from_uid, to_uid), draft.to_fields())
            .await?;
        info!(from = from_uid, to = to_uid, "friend request sent");

        self.notifications
            .notify(NotificationDraft::new(
                NotificationType::FriendRequest,
                from_uid,
                from_name,
                to_uid,
            ))
            .await;
        Ok(())
    }

    /// Loads the request and checks it is still pending.
    async fn pending_request(&self, from_uid: &str, to_uid: &str) -> Result<FriendRequest> {
        let request = self
            .read_request(from_uid, to_uid)
            .await?
            .ok_or_else(|| SocialError::RequestNotFound(paths::friend_request_id(from_uid, to_uid)))?;
        if request.status != RequestStatus::Pending {
            return Err(SocialError::RequestNotPending(request.status));
        }
        Ok(request)
    }

    fn respond_fields(status: RequestStatus) -> Fields {
        fields([
            ("status", status.as_str().into()),
            ("respondedAt", FieldValue::ServerTimestamp),
        ])
    }

    /// Only the sender may cancel.
    pub async fn cancel_request(&self, actor_uid: &str, from_uid: &str, to_uid: &str) -> Result<()> {
        if actor_uid != from_uid {
            return Err(SocialError::Forbidden("only the sender can cancel a request".into()));
        }
        self.pending_request(from_uid, to_uid).await?;
        self.store
            .update(
                &paths::friend_request(from_uid, to_uid),
                Self::respond_fields(RequestStatus::Cancelled),
            )
            .await?;
        info!(from = from_uid, to = to_uid, "friend request cancelled");
        Ok(())
    }

    /// Only the recipient may reject.
    pub async fn reject_request(&self, actor_uid: &str, from_uid: &str, to_uid: &str) -> Result<()> {
        if actor_uid != to_uid {
            return Err(SocialError::Forbidden("only the recipient can reject a request".into()));
        }
        self.pending_request(from_uid, to_uid).await?;
        self.store
            .update(
                &paths::friend_request(from_uid, to_uid),
                Self::respond_fields(RequestStatus::Rejected),
            )
            .await?;
        info!(from = from_uid, to = to_uid, "friend request rejected");
        Ok(())
    }

    /// Only the recipient may accept.  The status change and both edges
    /// commit together or not at all.
    pub async fn accept_request(&self, actor_uid: &str, from_uid: &str, to_uid: &str) -> Result<()> {
        if actor_uid != to_uid {
            return Err(SocialError::Forbidden("only the recipient can accept a request".into()));
        }
        self.pending_request(from_uid, to_uid).await?;

        let edge = FriendEdge::new(from_uid, to_uid);
        edge.validate().into_result()?;
        let mirror = edge.mirror();

        let mut batch = WriteBatch::new();
        batch
            .update(
                paths::friend_request(from_uid, to_uid),
                Self::respond_fields(RequestStatus::Accepted),
            )
            .set(paths::friend_edge(&edge.owner_uid, &edge.friend_uid), edge.to_fields())
            .set(paths::friend_edge(&mirror.owner_uid, &mirror.friend_uid), mirror.to_fields());
        self.store.commit(batch).await?;

        info!(from = from_uid, to = to_uid, "friend request accepted");
        Ok(())
    }

    /// Deletes both edges and the pair's request documents in one batch.
    /// Whatever is already absent is skipped, so repeating the call is fine.
    pub async fn remove_friend(&self, uid: &str, friend_uid: &str) -> Result<()> {
        let (sent, received) = futures::try_join!(
            self.read_request(uid, friend_uid),
            self.read_request(friend_uid, uid),
        )?;

        let mut batch = WriteBatch::new();
        batch
            .delete(paths::friend_edge(uid, friend_uid))
            .delete(paths::friend_edge(friend_uid, uid));
        if sent.is_some() {
            batch.delete(paths::friend_request(uid, friend_uid));
        }
        if received.is_some() {
            batch.delete(paths::friend_request(friend_uid, uid));
        }
        self.store.commit(batch).await?;

        info!(uid, friend = friend_uid, "friend removed");
        Ok(())
    }

    /// Relationship as seen by `viewer_uid`.  An edge wins over any stale
    /// pending request.
    pub async fn get_status(&self, viewer_uid: &str, other_uid: &str) -> Result<FriendshipStatus> {
        if viewer_uid == other_uid {
            return Ok(FriendshipStatus::None);
        }
        let (friends, sent, received) = futures::try_join!(
            self.has_edge(viewer_uid, other_uid),
            self.read_request(viewer_uid, other_uid),
            self.read_request(other_uid, viewer_uid),
        )?;

        let pending = |r: &Option<FriendRequest>| {
            r.as_ref().is_some_and(|r| r.status == RequestStatus::Pending)
        };
        let status = if friends {
            FriendshipStatus::Friends
        } else if pending(&sent) {
            FriendshipStatus::PendingSent
        } else if pending(&received) {
            FriendshipStatus::PendingReceived
        } else {
            FriendshipStatus::None
        };
        Ok(status)
    }

    async fn edges(&self, uid: &str) -> Result<Vec<FriendEdge>> {
        let docs = self
            .store
            .query(&Query::collection(paths::friends(uid)))
            .await?;
        Ok(docs.iter().map(FriendEdge::from_document).collect())
    }

    pub async fn friend_uids(&self, uid: &str) -> Result<Vec<String>> {
        Ok(self
            .edges(uid)
            .await?
            .into_iter()
            .map(|edge| edge.friend_uid)
            .collect())
    }

    /// Friends with their display names.  Profiles are read concurrently;
    /// one that is missing or fails to load falls back to a placeholder.
    pub async fn list_friends(&self, uid: &str) -> Result<Vec<Friend>> {
        let edges = self.edges(uid).await?;
        let user_paths: Vec<String> = edges.iter().map(|e| paths::user(&e.friend_uid)).collect();
        let profiles = join_all(user_paths.iter().map(|path| self.store.get(path))).await;

        let friends = edges
            .into_iter()
            .zip(profiles)
            .map(|(edge, profile)| {
                let display_name = match profile {
                    Ok(Some(doc)) => Some(UserProfile::from_document(&doc).display_name),
                    Ok(None) => None,
                    Err(err) => {
                        telemetry::report("list_friends_profile", &SocialError::from(err));
                        None
                    }
                }
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| FALLBACK_DISPLAY_NAME.to_string());
                Friend {
                    uid: edge.friend_uid,
                    display_name,
                    since: edge.created_at,
                }
            })
            .collect();
        Ok(friends)
    }

    async fn requests(&self, field: &str, uid: &str) -> Result<Vec<FriendRequest>> {
        let docs = self
            .store
            .query(
                &Query::collection(paths::FRIEND_REQUESTS)
                    .where_eq(field, uid)
                    .where_eq("status", RequestStatus::Pending.as_str()),
            )
            .await?;
        Ok(docs.iter().map(FriendRequest::from_document).collect())
    }

    /// Pending requests addressed to `uid`.
    pub async fn incoming_requests(&self, uid: &str) -> Result<Vec<FriendRequest>> {
        self.requests("toUid", uid).await
    }

    /// Pending requests sent by `uid`.
    pub async fn outgoing_requests(&self, uid: &str) -> Result<Vec<FriendRequest>> {
        self.requests("fromUid", uid).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_store::{FaultScope, MemoryStore, StoreError};

    fn service() -> (Arc<MemoryStore>, FriendService) {
        let store = Arc::new(MemoryStore::new());
        let notifications = NotificationService::new(store.clone());
        (store.clone(), FriendService::new(store, notifications))
    }

    #[tokio::test]
    async fn test_self_request_rejected() {
        let (store, friends) = service();
        let err = friends.send_request("a", "Ada", "a").await.unwrap_err();
        assert!(matches!(err, SocialError::SelfFriendRequest));
        assert!(store.paths_under(paths::FRIEND_REQUESTS).await.is_empty());
    }

    #[tokio::test]
    async fn test_reverse_request_rejected() {
        let (store, friends) = service();
        friends.send_request("a", "Ada", "b").await.unwrap();

        let err = friends.send_request("b", "Bo", "a").await.unwrap_err();
        assert!(matches!(err, SocialError::RequestAlreadyExists));
        let err = friends.send_request("a", "Ada", "b").await.unwrap_err();
        assert!(matches!(err, SocialError::RequestAlreadyExists));

        assert!(store.contains("friendRequests/a_b").await);
        assert!(!store.contains("friendRequests/b_a").await);
        assert_eq!(store.paths_under("users/b/notifications/").await.len(), 1);
    }

    #[tokio::test]
    async fn test_accept_creates_exactly_two_edges() {
        let (store, friends) = service();
        friends.send_request("a", "Ada", "b").await.unwrap();
        friends.accept_request("b", "a", "b").await.unwrap();

        let mut edges = store.paths_under("users/a/friends/").await;
        edges.extend(store.paths_under("users/b/friends/").await);
        assert_eq!(edges, ["users/a/friends/b", "users/b/friends/a"]);

        let forward = store.get("users/a/friends/b").await.unwrap().unwrap();
        let forward = FriendEdge::from_document(&forward);
        assert_eq!((forward.owner_uid.as_str(), forward.friend_uid.as_str()), ("a", "b"));
        let back = store.get("users/b/friends/a").await.unwrap().unwrap();
        let back = FriendEdge::from_document(&back);
        assert_eq!((back.owner_uid.as_str(), back.friend_uid.as_str()), ("b", "a"));

        let request = friends.read_request("a", "b").await.unwrap().unwrap();
        assert_eq!(request.status, RequestStatus::Accepted);
        assert!(request.responded_at.is_some());

        assert_eq!(friends.get_status("a", "b").await.unwrap(), FriendshipStatus::Friends);
        assert_eq!(friends.get_status("b", "a").await.unwrap(), FriendshipStatus::Friends);
        let err = friends.send_request("b", "Bo", "a").await.unwrap_err();
        assert!(matches!(err, SocialError::AlreadyFriends));
    }

    #[tokio::test]
    async fn test_accept_is_atomic() {
        let (store, friends) = service();
        friends.send_request("a", "Ada", "b").await.unwrap();
        store
            .inject_fault("users/b/friends", FaultScope::Writes, StoreError::PermissionDenied("rules".into()))
            .await;

        let err = friends.accept_request("b", "a", "b").await.unwrap_err();
        assert!(err.is_permission_denied());
        assert!(store.paths_under("users/a/friends/").await.is_empty());
        assert_eq!(
            friends.read_request("a", "b").await.unwrap().unwrap().status,
            RequestStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_transitions_check_actor_and_state() {
        let (_store, friends) = service();
        friends.send_request("a", "Ada", "b").await.unwrap();

        let err = friends.accept_request("a", "a", "b").await.unwrap_err();
        assert!(matches!(err, SocialError::Forbidden(_)));
        let err = friends.cancel_request("b", "a", "b").await.unwrap_err();
        assert!(matches!(err, SocialError::Forbidden(_)));

        assert_eq!(friends.get_status("a", "b").await.unwrap(), FriendshipStatus::PendingSent);
        assert_eq!(friends.get_status("b", "a").await.unwrap(), FriendshipStatus::PendingReceived);

        friends.reject_request("b", "a", "b").await.unwrap();
        let err = friends.accept_request("b", "a", "b").await.unwrap_err();
        assert!(matches!(err, SocialError::RequestNotPending(RequestStatus::Rejected)));
        assert_eq!(friends.get_status("a", "b").await.unwrap(), FriendshipStatus::None);

        // A terminal request no longer blocks a fresh one.
        friends.send_request("b", "Bo", "a").await.unwrap();
        friends.cancel_request("b", "b", "a").await.unwrap();

        let err = friends.cancel_request("c", "c", "a").await.unwrap_err();
        assert!(matches!(err, SocialError::RequestNotFound(ref id) if id == "c_a"));
    }

    #[tokio::test]
    async fn test_edge_wins_over_stale_pending() {
        let (store, friends) = service();
        friends.send_request("a", "Ada", "b").await.unwrap();
        store
            .set("users/a/friends/b", FriendEdge::new("a", "b").to_fields())
            .await
            .unwrap();
        assert_eq!(friends.get_status("a", "b").await.unwrap(), FriendshipStatus::Friends);
    }

    #[tokio::test]
    async fn test_colliding_request_ids_stay_separate() {
        let (store, friends) = service();
        // "a_b" -> "c" and "a" -> "b_c" share the id "a_b_c".
        friends.send_request("a_b", "AB", "c").await.unwrap();

        let err = friends.accept_request("b_c", "a", "b_c").await.unwrap_err();
        assert!(matches!(err, SocialError::RequestNotFound(_)));
        let err = friends.reject_request("b_c", "a", "b_c").await.unwrap_err();
        assert!(matches!(err, SocialError::RequestNotFound(_)));
        assert_eq!(friends.get_status("b_c", "a").await.unwrap(), FriendshipStatus::None);

        // The slot is taken, so the other pair cannot overwrite it.
        let err = friends.send_request("a", "Ada", "b_c").await.unwrap_err();
        assert!(matches!(err, SocialError::RequestAlreadyExists));

        friends.remove_friend("a", "b_c").await.unwrap();
        assert!(store.paths_under("users/a/friends/").await.is_empty());
        let request = friends.read_request("a_b", "c").await.unwrap().unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(friends.get_status("c", "a_b").await.unwrap(), FriendshipStatus::PendingReceived);
    }

    #[tokio::test]
    async fn test_remove_friend_twice_is_fine() {
        let (store, friends) = service();
        friends.send_request("a", "Ada", "b").await.unwrap();
        friends.accept_request("b", "a", "b").await.unwrap();
        // Drift: one side already gone.
        store.delete("users/b/friends/a").await.unwrap();

        friends.remove_friend("a", "b").await.unwrap();
        friends.remove_friend("a", "b").await.unwrap();

        assert!(store.paths_under("users/a/friends/").await.is_empty());
        assert!(store.paths_under(paths::FRIEND_REQUESTS).await.is_empty());
        assert_eq!(friends.get_status("a", "b").await.unwrap(), FriendshipStatus::None);
        friends.send_request("b", "Bo", "a").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_friends_with_names() {
        let (store, friends) = service();
        store
            .set("users/b", campus_store::value::fields_from_json(serde_json::json!({ "displayName": "Bo" })))
            .await
            .unwrap();
        for other in ["b", "c"] {
            friends.send_request("a", "Ada", other).await.unwrap();
            friends.accept_request(other, "a", other).await.unwrap();
        }

        let list = friends.list_friends("a").await.unwrap();
        let names: Vec<(&str, &str)> = list
            .iter()
            .map(|f| (f.uid.as_str(), f.display_name.as_str()))
            .collect();
        assert_eq!(names, [("b", "Bo"), ("c", FALLBACK_DISPLAY_NAME)]);
        assert!(list.iter().all(|f| f.since.is_some()));
        assert_eq!(friends.friend_uids("c").await.unwrap(), ["a"]);
    }

    #[tokio::test]
    async fn test_incoming_and_outgoing() {
        let (_store, friends) = service();
        friends.send_request("a", "Ada", "b").await.unwrap();
        friends.send_request("c", "Cy", "b").await.unwrap();
        friends.cancel_request("c", "c", "b").await.unwrap();

        let incoming = friends.incoming_requests("b").await.unwrap();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].from_uid, "a");

        let outgoing = friends.outgoing_requests("a").await.unwrap();
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].to_uid, "b");
        assert!(friends.outgoing_requests("c").await.unwrap().is_empty());
    }
}
