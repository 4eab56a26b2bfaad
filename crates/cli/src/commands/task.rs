// `kette task` — add, toggle, and delete one-off tasks.

use anyhow::{bail, Result};
use clap::Subcommand;
use chrono::{Days, Local};

use kette_client::ClientConfig;
use kette_common::protocol::Mutation;

use crate::output;

#[derive(Subcommand)]
pub enum TaskCommand {
    /// Create a task
    Add {
        text: String,
        /// Days from today the task is due (0 = today, 1 = tomorrow, ...).
        #[arg(long)]
        day: Option<u8>,
    },
    /// Toggle completion
    Toggle {
        id: i64,
    },
    /// Delete a task
    Delete {
        id: i64,
    },
}

pub async fn run(command: TaskCommand, config: &ClientConfig) -> Result<()> {
    match command {
        TaskCommand::Add { text, day } => {
            let mut engine = super::quiet_engine(config).await?;
            let offset = day.unwrap_or(0);
            if !engine.mutate(Mutation::add_task(text, day)).await? {
                bail!("server rejected the new task");
            }
            let due = Local::now().date_naive() + Days::new(u64::from(offset));
            println!("added for {due}");
            println!("{}", output::format_snapshot(engine.snapshot()));
        }
        TaskCommand::Toggle { id } => {
            let mut engine = super::quiet_engine(config).await?;
            engine.mutate(Mutation::ToggleTask { id }).await?;
            println!("{}", output::format_snapshot(engine.snapshot()));
        }
        TaskCommand::Delete { id } => {
            let mut engine = super::quiet_engine(config).await?;
            if !engine.mutate(Mutation::DeleteTask { id }).await? {
                bail!("server rejected the deletion of task {id}");
            }
            println!("{}", output::format_snapshot(engine.snapshot()));
        }
    }
    Ok(())
}
