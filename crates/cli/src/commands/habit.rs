// `kette habit` — add, toggle, delete, and inspect habits.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};

use kette_client::{ApiTransport, ClientConfig};
use kette_common::protocol::Mutation;
use kette_common::types::Frequency;

use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum HabitCommand {
    /// Create a habit
    Add(AddArgs),
    /// Log one repetition for today (resets a completed habit)
    Toggle {
        id: i64,
    },
    /// Delete a habit
    Delete {
        id: i64,
    },
    /// Show habit detail (streak, history)
    Show {
        id: i64,
        /// Force JSON output.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Args)]
pub struct AddArgs {
    text: String,
    /// Repetitions per day (per week for weekly_flex).
    #[arg(long, default_value_t = 1)]
    target: u32,
    /// daily, specific, or weekly_flex.
    #[arg(long, default_value = "daily", value_parser = parse_frequency)]
    frequency: Frequency,
    /// Weekday indexes 0..=6 (0 = Monday), required for `specific`.
    #[arg(long, value_delimiter = ',')]
    days: Vec<u8>,
    /// Friend user ids to share the habit with.
    #[arg(long, value_delimiter = ',')]
    friends: Vec<i64>,
}

pub async fn run(command: HabitCommand, config: &ClientConfig) -> Result<()> {
    match command {
        HabitCommand::Add(args) => {
            let mut engine = super::quiet_engine(config).await?;
            let confirmed = engine
                .mutate(Mutation::AddHabit {
                    text: args.text,
                    target: args.target,
                    frequency: args.frequency,
                    days: args.days,
                    friends: args.friends,
                })
                .await?;
            if !confirmed {
                bail!("server rejected the new habit");
            }
            println!("{}", output::format_snapshot(engine.snapshot()));
        }
        HabitCommand::Toggle { id } => {
            let mut engine = super::quiet_engine(config).await?;
            // A failed toggle has already been discarded by the engine's
            // forced resync; the printed state is the server's.
            engine.mutate(Mutation::ToggleHabit { id }).await?;
            println!("{}", output::format_snapshot(engine.snapshot()));
        }
        HabitCommand::Delete { id } => {
            let mut engine = super::quiet_engine(config).await?;
            if !engine.mutate(Mutation::DeleteHabit { id }).await? {
                bail!("server rejected the deletion of habit {id}");
            }
            println!("{}", output::format_snapshot(engine.snapshot()));
        }
        HabitCommand::Show { id, json } => {
            let format = OutputFormat::detect(json);
            let detail = super::transport(config)?.fetch_habit_detail(id).await?;
            output::print_output(format, &detail, output::format_detail)?;
        }
    }
    Ok(())
}

fn parse_frequency(value: &str) -> Result<Frequency, String> {
    match value {
        "daily" => Ok(Frequency::Daily),
        "specific" => Ok(Frequency::Specific),
        "weekly_flex" | "weekly-flex" => Ok(Frequency::WeeklyFlex),
        other => Err(format!("unknown frequency `{other}` (daily, specific, weekly_flex)")),
    }
}
