// `kette friends` — friendship management.
//
// Friend data is not part of the snapshot, so these talk to the transport
// directly instead of going through the optimistic mutation path.

use anyhow::Result;
use clap::Subcommand;

use kette_client::{ApiTransport, ClientConfig};
use kette_common::protocol::FriendAction;

use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum FriendsCommand {
    /// List accepted friends
    List {
        /// Force JSON output.
        #[arg(long)]
        json: bool,
    },
    /// List incoming friend requests
    Pending {
        /// Force JSON output.
        #[arg(long)]
        json: bool,
    },
    /// Search users by name
    Search {
        query: String,
        /// Force JSON output.
        #[arg(long)]
        json: bool,
    },
    /// Send a friend request
    Add {
        id: i64,
    },
    /// Accept an incoming request
    Accept {
        id: i64,
    },
    /// Remove a friend (either direction)
    Remove {
        id: i64,
    },
}

pub async fn run(command: FriendsCommand, config: &ClientConfig) -> Result<()> {
    let transport = super::transport(config)?;
    match command {
        FriendsCommand::List { json } => {
            let friends = transport.fetch_friends().await?;
            output::print_output(OutputFormat::detect(json), &friends, |friends| {
                friends
                    .iter()
                    .map(|f| format!("#{:<4} {} · streak {}", f.id, f.username, f.streak))
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
        FriendsCommand::Pending { json } => {
            let pending = transport.fetch_pending_requests().await?;
            output::print_output(OutputFormat::detect(json), &pending, |pending| {
                pending
                    .iter()
                    .map(|p| format!("#{:<4} {}", p.id, p.username))
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
        FriendsCommand::Search { query, json } => {
            let matches = transport.search_users(&query).await?;
            output::print_output(OutputFormat::detect(json), &matches, |matches| {
                matches
                    .iter()
                    .map(|m| format!("#{:<4} {} ({})", m.id, m.username, m.status))
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
        FriendsCommand::Add { id } => {
            transport.send_friend_action(&FriendAction::Add { id }).await?;
            println!("request sent to #{id}");
        }
        FriendsCommand::Accept { id } => {
            transport.send_friend_action(&FriendAction::Accept { id }).await?;
            println!("accepted #{id}");
        }
        FriendsCommand::Remove { id } => {
            transport.send_friend_action(&FriendAction::Remove { id }).await?;
            println!("removed #{id}");
        }
    }
    Ok(())
}
