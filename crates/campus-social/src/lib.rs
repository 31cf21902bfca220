//! # campus-social
//!
//! Data-access layer of a campus social app: user profiles, a friend graph
//! with request state machine and mirrored edges, an event feed merged from
//! several queries, two-level comment threads, RSVPs and in-app
//! notifications.
//!
//! Every service takes an injected `Arc<dyn DocumentStore>`.  Documents are
//! normalized on read by the mappers in [`model`] and validated before any
//! write.  [`CampusSocial`] wires all services to one store with the
//! configured per-call deadline.

pub mod auth;
pub mod comments;
pub mod config;
pub mod constants;
pub mod events;
pub mod feed;
pub mod friends;
pub mod model;
pub mod notifications;
pub mod paths;
pub mod profiles;
pub mod rsvps;
pub mod telemetry;
pub mod types;

mod error;

use std::sync::Arc;

use campus_store::{DocumentStore, TimeoutStore};

pub use auth::{AuthBoundary, AuthUser, StaticAuth};
pub use comments::{CommentPage, CommentService, ReplyTarget};
pub use config::SocialConfig;
pub use error::{ErrorCategory, Result, SocialError};
pub use events::EventService;
pub use feed::{FeedOptions, FeedService};
pub use friends::{Friend, FriendService};
pub use notifications::NotificationService;
pub use profiles::ProfileService;
pub use rsvps::{AttendingEventIds, RsvpService, RsvpSummary};
pub use types::{FriendshipStatus, NotificationType, RequestStatus, RsvpStatus, Visibility};

/// Every service bound to one store.
#[derive(Clone)]
pub struct CampusSocial {
    pub profiles: ProfileService,
    pub events: EventService,
    pub feed: FeedService,
    pub friends: FriendService,
    pub comments: CommentService,
    pub rsvps: RsvpService,
    pub notifications: NotificationService,
}

impl CampusSocial {
    /// Wraps `store` with `config.store_timeout` and builds the services.
    pub fn new(store: Arc<dyn DocumentStore>, config: &SocialConfig) -> Self {
        let store: Arc<dyn DocumentStore> = Arc::new(TimeoutStore::new(store, config.store_timeout));
        let notifications = NotificationService::new(store.clone());

        Self {
            profiles: ProfileService::new(store.clone(), config.search_limit),
            events: EventService::new(store.clone(), config.notify_friends_on_event),
            feed: FeedService::new(
                store.clone(),
                config.feed_page_size,
                config.search_limit,
                config.max_in_values,
            ),
            friends: FriendService::new(store.clone(), notifications.clone()),
            comments: CommentService::new(
                store.clone(),
                notifications.clone(),
                config.comment_page_size,
            ),
            rsvps: RsvpService::new(store),
            notifications,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::event::EventDraft;
    use campus_store::MemoryStore;

    fn app() -> (Arc<MemoryStore>, CampusSocial) {
        let store = Arc::new(MemoryStore::new());
        let social = CampusSocial::new(store.clone(), &SocialConfig::default());
        (store, social)
    }

    #[tokio::test]
    async fn test_friends_see_friends_only_events() {
        let (_store, social) = app();
        let ada = AuthUser::new("ada", "ada@campus.edu", true);
        let bo = AuthUser::new("bo", "bo@campus.edu", true);
        social.profiles.get_or_create_profile(&ada, Some("Ada")).await.unwrap();
        social.profiles.get_or_create_profile(&bo, Some("Bo")).await.unwrap();

        let mut draft = EventDraft::new("Rooftop study", "Bring snacks");
        draft.visibility = Visibility::Friends;
        let hidden = social.events.create_event(&ada, "Ada", &draft).await.unwrap();

        let stranger_view = social
            .feed
            .fetch_feed(&FeedOptions {
                current_uid: Some("bo".into()),
                friend_uids: social.friends.friend_uids("bo").await.unwrap(),
                ..FeedOptions::default()
            })
            .await
            .unwrap();
        assert!(stranger_view.is_empty());

        social.friends.send_request("bo", "Bo", "ada").await.unwrap();
        social.friends.accept_request("ada", "bo", "ada").await.unwrap();

        let friend_view = social
            .feed
            .fetch_feed(&FeedOptions {
                current_uid: Some("bo".into()),
                friend_uids: social.friends.friend_uids("bo").await.unwrap(),
                ..FeedOptions::default()
            })
            .await
            .unwrap();
        assert_eq!(friend_view.len(), 1);
        assert_eq!(friend_view[0].id, hidden.id);

        let ada_inbox = social.notifications.fetch_notifications("ada", 10).await.unwrap();
        assert_eq!(ada_inbox.len(), 1);
        assert_eq!(ada_inbox[0].kind, Some(NotificationType::FriendRequest));
        assert_eq!(ada_inbox[0].actor_name, "Bo");
    }

    #[tokio::test]
    async fn test_comment_and_rsvp_flow() {
        let (_store, social) = app();
        let host = AuthUser::new("host", "host@campus.edu", true);
        let event = social
            .events
            .create_event(&host, "Hal", &EventDraft::new("Trivia", "Teams of four"))
            .await
            .unwrap();

        let root = social
            .comments
            .add_comment(&event.id, "Can I bring a friend?", "guest", "Gil", None)
            .await
            .unwrap();
        assert_eq!(root.root_id, root.id);
        let reply = social
            .comments
            .add_comment(
                &event.id,
                "Sure",
                "host",
                "Hal",
                Some(&ReplyTarget {
                    comment_id: root.id.clone(),
                    root_id: root.root_id.clone(),
                    uid: root.created_by.clone(),
                }),
            )
            .await
            .unwrap();
        assert_eq!(reply.root_id, root.id);

        social.rsvps.rsvp(&event.id, "guest", RsvpStatus::Going).await.unwrap();
        let summary = social.rsvps.fetch_rsvp_summary(&event.id, "guest").await.unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(
            social.rsvps.fetch_user_attending_event_ids("guest").await.ids,
            [event.id.clone()]
        );

        assert_eq!(social.notifications.unread_count("host").await.unwrap(), 1);
        assert_eq!(social.notifications.unread_count("guest").await.unwrap(), 1);

        social.events.delete_event("host", &event.id).await.unwrap();
        assert!(social
            .comments
            .fetch_top_level_comments(&event.id, None)
            .await
            .unwrap()
            .comments
            .is_empty());
        assert_eq!(social.rsvps.fetch_rsvp_count(&event.id).await.unwrap(), 0);
    }
}
