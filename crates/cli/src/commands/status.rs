// `kette status` — fetch and print the current snapshot once.

use anyhow::Result;
use clap::Args;

use kette_client::ClientConfig;

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

pub async fn run(args: StatusArgs, config: &ClientConfig) -> Result<()> {
    let format = OutputFormat::detect(args.json);
    let engine = super::quiet_engine(config).await?;
    output::print_output(format, engine.snapshot(), output::format_snapshot)?;
    Ok(())
}
