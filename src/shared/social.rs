//! Friendship Data Structures
//!
//! A friendship row starts as a pending request from `requester_id` to
//! `addressee_id` and moves to accepted, rejected, or blocked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a friendship row
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "ssr", derive(sqlx::Type))]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ssr", sqlx(rename_all = "snake_case"))]
pub enum FriendshipStatus {
    /// Request is pending
    #[default]
    Pending,
    /// Request was accepted
    Accepted,
    /// Request was rejected
    Rejected,
    /// `requester_id` blocked `addressee_id`
    Blocked,
}

impl FriendshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendshipStatus::Pending => "pending",
            FriendshipStatus::Accepted => "accepted",
            FriendshipStatus::Rejected => "rejected",
            FriendshipStatus::Blocked => "blocked",
        }
    }
}

/// A friendship row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ssr", derive(sqlx::FromRow))]
pub struct Friendship {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub addressee_id: Uuid,
    pub status: FriendshipStatus,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl Friendship {
    /// The participant that is not `user_id`
    pub fn other(&self, user_id: Uuid) -> Uuid {
        if self.requester_id == user_id {
            self.addressee_id
        } else {
            self.requester_id
        }
    }
}

/// A pending request together with the other party's name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ssr", derive(sqlx::FromRow))]
pub struct FriendRequestView {
    pub id: Uuid,
    /// The other user (sender for incoming, recipient for sent)
    pub user_id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An accepted friend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ssr", derive(sqlx::FromRow))]
pub struct Friend {
    pub user_id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub since: DateTime<Utc>,
}

/// `POST /api/friends/requests`; either `username` or `user_id` names the target
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendFriendRequest {
    pub username: Option<String>,
    pub user_id: Option<Uuid>,
    pub message: Option<String>,
}

/// `POST /api/friends/respond`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespondFriendRequest {
    pub request_id: Uuid,
    pub accept: bool,
}
