// kette-client: client-side state synchronization for the kette tracker.
//
// The engine reconciles local optimistic edits against a periodically
// polled server snapshot without losing updates or re-rendering unchanged
// state. The backend (habit storage, streak computation, friends) is an
// opaque HTTP+JSON service behind the `ApiTransport` trait.

pub mod config;
pub mod engine;
pub mod http;
pub mod poller;
pub mod transport;

pub use config::ClientConfig;
pub use engine::{PollOutcome, SyncEngine, View};
pub use http::HttpTransport;
pub use transport::{ApiError, ApiTransport};
