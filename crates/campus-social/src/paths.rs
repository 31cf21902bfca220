//! Document and collection paths.
//!
//! ```text
//! events/{eventId}
//! events/{eventId}/comments/{commentId}
//! events/{eventId}/rsvps/{uid}
//! users/{uid}
//! users/{uid}/friends/{friendUid}
//! users/{uid}/notifications/{notificationId}
//! friendRequests/{fromUid}_{toUid}
//! ```

pub const EVENTS: &str = "events";
pub const USERS: &str = "users";
pub const FRIEND_REQUESTS: &str = "friendRequests";
pub const RSVPS: &str = "rsvps";

pub fn event(event_id: &str) -> String {
    format!("{EVENTS}/{event_id}")
}

pub fn comments(event_id: &str) -> String {
    format!("{EVENTS}/{event_id}/comments")
}

pub fn comment(event_id: &str, comment_id: &str) -> String {
    format!("{}/{comment_id}", comments(event_id))
}

pub fn rsvps(event_id: &str) -> String {
    format!("{EVENTS}/{event_id}/{RSVPS}")
}

pub fn rsvp(event_id: &str, uid: &str) -> String {
    format!("{}/{uid}", rsvps(event_id))
}

pub fn user(uid: &str) -> String {
    format!("{USERS}/{uid}")
}

pub fn friends(uid: &str) -> String {
    format!("{USERS}/{uid}/friends")
}

pub fn friend_edge(owner_uid: &str, friend_uid: &str) -> String {
    format!("{}/{friend_uid}", friends(owner_uid))
}

pub fn notifications(uid: &str) -> String {
    format!("{USERS}/{uid}/notifications")
}

pub fn notification(uid: &str, notification_id: &str) -> String {
    format!("{}/{notification_id}", notifications(uid))
}

/// Deterministic id: at most one request per direction.
pub fn friend_request_id(from_uid: &str, to_uid: &str) -> String {
    format!("{from_uid}_{to_uid}")
}

pub fn friend_request(from_uid: &str, to_uid: &str) -> String {
    format!("{FRIEND_REQUESTS}/{}", friend_request_id(from_uid, to_uid))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(comment("e1", "c1"), "events/e1/comments/c1");
        assert_eq!(rsvp("e1", "u1"), "events/e1/rsvps/u1");
        assert_eq!(friend_edge("a", "b"), "users/a/friends/b");
        assert_eq!(friend_request("a", "b"), "friendRequests/a_b");
        assert_eq!(notification("u", "n"), "users/u/notifications/n");
    }
}
