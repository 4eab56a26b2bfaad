// kette CLI entry point.

use clap::Parser;

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "kette", about = "Habit & task tracker sync client")]
struct Cli {
    /// Server base URL (overrides the config file).
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: commands::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    commands::run(cli.command, cli.server).await
}
