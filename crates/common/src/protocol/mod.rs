// Wire protocol for the HTTP+JSON boundary.
//
// Every mutation endpoint is one variant of `Mutation`, so payload
// construction is checked at compile time instead of assembled ad hoc.
// `#[serde(untagged)]` makes each variant serialize as its bare field map,
// which is exactly the body the server expects; the endpoint path carries
// the discriminant on the wire.

pub mod validate;

use serde::{Deserialize, Serialize};

use crate::types::Frequency;

pub use validate::ValidationError;

/// A state-changing request, one variant per POST endpoint.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Mutation {
    ToggleHabit { id: i64 },
    ToggleTask { id: i64 },
    AddHabit {
        text: String,
        target: u32,
        frequency: Frequency,
        /// Weekday indexes 0..=6, only meaningful for `Frequency::Specific`.
        days: Vec<u8>,
        /// Friend user ids to share the habit with.
        friends: Vec<i64>,
    },
    AddTask {
        text: String,
        /// Days from today the task is scheduled for, 0..=6.
        offset: u8,
    },
    DeleteHabit { id: i64 },
    DeleteTask { id: i64 },
    InviteToHabit { habit_id: i64, friend_id: i64 },
}

impl Mutation {
    /// Endpoint path this mutation is POSTed to.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::ToggleHabit { .. } => "/api/toggle_habit",
            Self::ToggleTask { .. } => "/api/toggle_task",
            Self::AddHabit { .. } => "/api/add_habit",
            Self::AddTask { .. } => "/api/add_task",
            Self::DeleteHabit { .. } => "/api/delete_habit",
            Self::DeleteTask { .. } => "/api/delete_task",
            Self::InviteToHabit { .. } => "/api/invite_to_habit",
        }
    }

    /// Short kind name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ToggleHabit { .. } => "toggle_habit",
            Self::ToggleTask { .. } => "toggle_task",
            Self::AddHabit { .. } => "add_habit",
            Self::AddTask { .. } => "add_task",
            Self::DeleteHabit { .. } => "delete_habit",
            Self::DeleteTask { .. } => "delete_task",
            Self::InviteToHabit { .. } => "invite_to_habit",
        }
    }

    /// New-task mutation; `offset` defaults to 0 ("today") when unspecified.
    pub fn add_task(text: impl Into<String>, offset: Option<u8>) -> Self {
        Self::AddTask { text: text.into(), offset: offset.unwrap_or(0) }
    }
}

/// Uniform `{success}` acknowledgement for all POST endpoints.
///
/// The body is trusted only for success/failure, never for content; the
/// effect of a mutation is always re-read via `GET /api/state`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MutationAck {
    #[serde(default)]
    pub success: bool,
}

/// Friendship management request (not part of the snapshot, so these bypass
/// the optimistic mutation path).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum FriendAction {
    Add { id: i64 },
    Accept { id: i64 },
    Remove { id: i64 },
}

impl FriendAction {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Add { .. } => "/api/add_friend",
            Self::Accept { .. } => "/api/accept_friend",
            Self::Remove { .. } => "/api/remove_friend",
        }
    }
}

/// Body for `POST /api/search_users`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSearch {
    pub query: String,
}
