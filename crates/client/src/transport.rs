// Transport abstraction over the HTTP+JSON boundary.
//
// The backend is an opaque service; the engine only needs these calls.
// In production the transport is `HttpTransport` (reqwest). In tests it is
// a mock that records calls and serves scripted responses.

use thiserror::Error;

use kette_common::protocol::{FriendAction, Mutation};
use kette_common::types::{Friend, FriendMatch, HabitDetail, PendingRequest, Snapshot};

/// The two failure kinds of the boundary. The engine treats both the same
/// way: leave the optimistic edit in place and force a reconciliation poll.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Network unreachable, request failed to complete, or the body did not
    /// decode.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The server answered with a non-2xx status.
    #[error("server returned HTTP {0}")]
    Status(u16),
    /// A 2xx mutation acknowledgement carrying `success: false`.
    #[error("server rejected the request")]
    Rejected,
}

/// Calls the engine and CLI make against the backend.
#[allow(async_fn_in_trait)]
pub trait ApiTransport {
    /// `GET /api/state` — the full snapshot.
    async fn fetch_state(&self) -> Result<Snapshot, ApiError>;

    /// `GET /habit/{id}` — detail view payload for one habit.
    async fn fetch_habit_detail(&self, id: i64) -> Result<HabitDetail, ApiError>;

    /// `GET /api/get_friends` — accepted friends.
    async fn fetch_friends(&self) -> Result<Vec<Friend>, ApiError>;

    /// `GET /api/get_pending_requests` — incoming friend requests.
    async fn fetch_pending_requests(&self) -> Result<Vec<PendingRequest>, ApiError>;

    /// `POST /api/search_users` — username search with friendship status.
    async fn search_users(&self, query: &str) -> Result<Vec<FriendMatch>, ApiError>;

    /// POST a friendship action (add/accept/remove).
    async fn send_friend_action(&self, action: &FriendAction) -> Result<(), ApiError>;

    /// POST a snapshot mutation to its endpoint. `Ok(())` means the server
    /// confirmed success; the resulting state is still only learned via a
    /// subsequent `fetch_state`.
    async fn submit(&self, mutation: &Mutation) -> Result<(), ApiError>;
}
