// `kette invite` — invite a friend to an existing shared habit.

use anyhow::{bail, Result};
use clap::Args;

use kette_client::ClientConfig;
use kette_common::protocol::Mutation;

#[derive(Debug, Args)]
pub struct InviteArgs {
    habit_id: i64,
    friend_id: i64,
}

pub async fn run(args: InviteArgs, config: &ClientConfig) -> Result<()> {
    let mut engine = super::quiet_engine(config).await?;
    let mutation =
        Mutation::InviteToHabit { habit_id: args.habit_id, friend_id: args.friend_id };
    if !engine.mutate(mutation).await? {
        bail!("server rejected the invite");
    }
    println!("invited #{} to habit #{}", args.friend_id, args.habit_id);
    Ok(())
}
