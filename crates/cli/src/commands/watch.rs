// `kette watch` — live view: bootstrap, then poll in the background and
// re-render on every accepted change until Ctrl-C.

use std::time::Duration;

use anyhow::Result;
use clap::Args;

use kette_client::{poller, ClientConfig, SyncEngine};

use crate::output::TerminalView;

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Poll interval in milliseconds (overrides the config file).
    #[arg(long)]
    interval_ms: Option<u64>,
}

pub async fn run(args: WatchArgs, config: &ClientConfig) -> Result<()> {
    let mut engine = SyncEngine::new(super::transport(config)?, TerminalView::live());

    // A failed first poll is fine here: watching continues and the next
    // successful tick renders.
    engine.bootstrap(None).await;

    let period = args.interval_ms.map(Duration::from_millis).unwrap_or(config.poll_interval());
    tokio::select! {
        _ = poller::run(&mut engine, period) => {}
        _ = tokio::signal::ctrl_c() => {}
    }
    Ok(())
}
