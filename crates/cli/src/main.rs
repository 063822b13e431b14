//! LedgerLink CLI entry point.
//!
//! Loads the configuration, installs logging, runs one command and prints its
//! JSON result on stdout. Logs go to stderr.

mod args;
mod commands;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use ledgerlink_domain::ClientConfig;
use ledgerlink_infra::config;

use crate::args::Cli;

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let loaded = match &cli.config {
        Some(path) => config::load_from_file(Some(path.clone())),
        None => config::load(),
    };
    loaded.context("failed to load configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    logging::init(cli.verbose.max(config.verbosity), cli.json_logs)?;

    let output = commands::run(cli.command, &config).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }
    Ok(())
}
