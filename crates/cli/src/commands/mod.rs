// CLI subcommand dispatch.

use anyhow::{bail, Result};
use clap::Subcommand;

use kette_client::{ClientConfig, HttpTransport, PollOutcome, SyncEngine};

use crate::output::QuietView;

pub mod friends;
pub mod habit;
pub mod invite;
pub mod status;
pub mod task;
pub mod watch;

#[derive(Subcommand)]
pub enum Command {
    /// Show the current snapshot once
    Status(status::StatusArgs),
    /// Live view with background polling
    Watch(watch::WatchArgs),
    /// Manage habits
    Habit {
        #[command(subcommand)]
        command: habit::HabitCommand,
    },
    /// Manage one-off tasks
    Task {
        #[command(subcommand)]
        command: task::TaskCommand,
    },
    /// Manage friends
    Friends {
        #[command(subcommand)]
        command: friends::FriendsCommand,
    },
    /// Invite a friend to a shared habit
    Invite(invite::InviteArgs),
}

pub async fn run(command: Command, server: Option<String>) -> Result<()> {
    let mut config = ClientConfig::load();
    if let Some(server) = server {
        config.server_url = server;
    }
    tracing::debug!(server = %config.server_url, "resolved client config");

    match command {
        Command::Status(args) => status::run(args, &config).await,
        Command::Watch(args) => watch::run(args, &config).await,
        Command::Habit { command } => habit::run(command, &config).await,
        Command::Task { command } => task::run(command, &config).await,
        Command::Friends { command } => friends::run(command, &config).await,
        Command::Invite(args) => invite::run(args, &config).await,
    }
}

/// Transport bound to the configured server, with the session cookie when
/// one is configured.
pub(crate) fn transport(config: &ClientConfig) -> Result<HttpTransport> {
    let mut transport = HttpTransport::new(&config.server_url)?;
    if let Some(cookie) = &config.session_cookie {
        transport = transport.with_session_cookie(cookie.clone());
    }
    Ok(transport)
}

/// Engine for one-shot commands: synced once, renders discarded (the
/// command prints the final state itself).
pub(crate) async fn quiet_engine(
    config: &ClientConfig,
) -> Result<SyncEngine<HttpTransport, QuietView>> {
    let mut engine = SyncEngine::new(transport(config)?, QuietView);
    if engine.bootstrap(None).await == PollOutcome::Failed && !engine.is_synced() {
        bail!("could not reach server at {}", config.server_url);
    }
    Ok(engine)
}
