mod bootstrap_helpers;
mod cli_args;
mod commands;

use anyhow::Result;
use clap::Parser;

use crate::cli_args::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    bootstrap_helpers::init_tracing(cli.log_filter.as_deref());
    commands::run(cli)
}
