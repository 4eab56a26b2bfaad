// Background polling loop.
//
// Fixed-cadence ticks through `SyncEngine::background_tick`; the in-flight
// suppression lives in the engine so a directly driven tick behaves the
// same as a scheduled one. The loop never returns — drop the future (e.g.
// the other arm of a `select!`) to stop polling.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::trace;

use crate::engine::{SyncEngine, View};
use crate::transport::ApiTransport;

/// Default cadence matching the original client: one poll every 2 seconds.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Drive background polling at the given cadence, forever.
pub async fn run<T: ApiTransport, V: View>(engine: &mut SyncEngine<T, V>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    // A delayed tick should not cause a burst of catch-up polls.
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick of a tokio interval fires immediately; bootstrap has
    // already polled, so skip it.
    interval.tick().await;

    loop {
        interval.tick().await;
        let outcome = engine.background_tick().await;
        trace!(?outcome, "background poll tick");
    }
}
