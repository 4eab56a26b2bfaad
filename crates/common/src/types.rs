// Core domain types shared across all kette crates.
//
// These mirror the JSON shapes the server emits. The client never derives
// any of this itself (streaks, visibility, task age tags are all computed
// server-side); it only parses, displays, and locally pre-applies toggles.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The full client-visible state as returned by `GET /api/state`.
///
/// Replaced wholesale on every accepted poll, never merged field-by-field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    #[serde(default)]
    pub habits: Vec<Habit>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub streak: u32,
}

impl Snapshot {
    pub fn habit(&self, id: i64) -> Option<&Habit> {
        self.habits.iter().find(|h| h.id == id)
    }

    pub fn habit_mut(&mut self, id: i64) -> Option<&mut Habit> {
        self.habits.iter_mut().find(|h| h.id == id)
    }

    pub fn task_mut(&mut self, id: i64) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Habits finished today (used for the hero summary line).
    pub fn completed_habits(&self) -> usize {
        self.habits.iter().filter(|h| h.completed).count()
    }
}

/// A tracked habit as it appears in the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Habit {
    /// Server-assigned, stable across polls.
    pub id: i64,
    pub text: String,
    /// Repetitions needed for completion, at least 1.
    pub target: u32,
    /// Repetitions logged so far, 0..=target.
    #[serde(default)]
    pub current: u32,
    /// `completed == (current >= target)`; maintained locally by the toggle
    /// rule, recomputed authoritatively by the server on the next poll.
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub frequency: Frequency,
    /// Set when the habit is shared with friends.
    #[serde(default)]
    pub shared: bool,
    #[serde(default)]
    pub shared_info: String,
}

/// How often a habit is due.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    #[default]
    Daily,
    /// Due on specific weekdays only.
    Specific,
    /// Target counts toward a weekly total instead of a daily one.
    WeeklyFlex,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Specific => "specific",
            Self::WeeklyFlex => "weekly_flex",
        }
    }
}

/// A one-off task as it appears in the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    /// Server-computed age label ("Gestern", "Vor 2 Tagen"); empty when due
    /// today.
    #[serde(default)]
    pub tag: Option<String>,
}

impl Task {
    /// The age tag, if the server sent a non-empty one.
    pub fn age_tag(&self) -> Option<&str> {
        self.tag.as_deref().filter(|t| !t.is_empty())
    }
}

/// Detail payload from `GET /habit/{id}`.
///
/// The server is free to grow this response; unknown fields are ignored and
/// absent ones default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HabitDetail {
    pub text: String,
    pub target: u32,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub streak: u32,
    /// Daily completion history, oldest first.
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    /// Recent activity lines (shared-habit events etc.).
    #[serde(default)]
    pub recent: Vec<ActivityEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub value: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivityEntry {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub text: String,
}

/// An accepted friend from `GET /api/get_friends`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Friend {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub streak: u32,
}

/// A user search hit from `POST /api/search_users`, with friendship status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FriendMatch {
    pub id: i64,
    pub username: String,
    /// "pending", "accepted", "pending_received", or "msg" (no relation).
    #[serde(default)]
    pub status: String,
}

/// An incoming friend request from `GET /api/get_pending_requests`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingRequest {
    pub id: i64,
    pub username: String,
}
