// fmtbridge CLI entry point

use anyhow::Context;
use clap::Parser;
use fmtbridge_cli::{init_logging, Cli, CommandRouter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.verbose).context("failed to set up logging")?;

    CommandRouter::execute(&cli)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))
}
