use serde::{Deserialize, Serialize};

/// Who may see an event in feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Friends,
}

impl Visibility {
    pub const ALL: &'static [&'static str] = &["public", "friends"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Friends => "friends",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "public" => Some(Self::Public),
            "friends" => Some(Self::Friends),
            _ => None,
        }
    }
}

/// Lifecycle of one directed friend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

impl RequestStatus {
    pub const ALL: &'static [&'static str] = &["pending", "accepted", "rejected", "cancelled"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Whether this request still blocks a new one for the same pair.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Accepted)
    }
}

/// Relationship between a viewer and another user, as shown in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendshipStatus {
    None,
    PendingSent,
    PendingReceived,
    Friends,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsvpStatus {
    Going,
    Interested,
}

impl RsvpStatus {
    pub const ALL: &'static [&'static str] = &["going", "interested"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Going => "going",
            Self::Interested => "interested",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "going" => Some(Self::Going),
            "interested" => Some(Self::Interested),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    FriendRequest,
    EventLive,
    Comment,
    Reply,
}

impl NotificationType {
    pub const ALL: &'static [&'static str] = &["friend_request", "event_live", "comment", "reply"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FriendRequest => "friend_request",
            Self::EventLive => "event_live",
            Self::Comment => "comment",
            Self::Reply => "reply",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "friend_request" => Some(Self::FriendRequest),
            "event_live" => Some(Self::EventLive),
            "comment" => Some(Self::Comment),
            "reply" => Some(Self::Reply),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_strings_round_trip() {
        for s in Visibility::ALL {
            assert_eq!(Visibility::parse(s).map(|v| v.as_str()), Some(*s));
        }
        for s in RequestStatus::ALL {
            assert_eq!(RequestStatus::parse(s).map(|v| v.as_str()), Some(*s));
        }
        for s in RsvpStatus::ALL {
            assert_eq!(RsvpStatus::parse(s).map(|v| v.as_str()), Some(*s));
        }
        for s in NotificationType::ALL {
            assert_eq!(NotificationType::parse(s).map(|v| v.as_str()), Some(*s));
        }
        assert_eq!(Visibility::parse("secret"), None);
    }

    #[test]
    fn test_open_requests() {
        assert!(RequestStatus::Pending.is_open());
        assert!(RequestStatus::Accepted.is_open());
        assert!(!RequestStatus::Rejected.is_open());
        assert!(!RequestStatus::Cancelled.is_open());
    }
}
