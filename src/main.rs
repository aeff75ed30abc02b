//! `slackline` CLI entry point.
//!
//! Provides `message` and `thread` subcommands for previewing, posting,
//! appending to, and updating Slack messages.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use anyhow::Context;
use clap::Parser;

use slackline::cli::{self, Cli};
use slackline::config::Environment;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    slackline::logging::init_cli(cli.common().verbose);

    let environment = Environment::from_process();
    cli::run(&cli, &environment)
        .await
        .context("slackline failed")
}
