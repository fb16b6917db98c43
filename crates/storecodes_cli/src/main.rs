//! Command-line dispatch surface for the store ledger.
//!
//! One invocation runs exactly one ledger operation against the database
//! named by `--db` and prints the result as JSON.

use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use storecodes_core::db::open_db;
use storecodes_core::{init_logging, ConsistencyManager};

mod cli;
mod commands;

fn main() -> anyhow::Result<ExitCode> {
    let cli = cli::Cli::parse();

    if let Some((level, dir)) = commands::wants_logging(&cli) {
        init_logging(level, dir).context("failed to initialize logging")?;
    }

    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open ledger `{}`", cli.db.display()))?;
    let ledger = ConsistencyManager::try_new(&conn).context("ledger schema check failed")?;

    match commands::dispatch(&ledger, cli.command) {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            log::debug!("event=cli_dispatch module=cli status=error error_kind={}", err.kind());
            eprintln!("{}", serde_json::to_string_pretty(&commands::error_body(&err))?);
            Ok(ExitCode::FAILURE)
        }
    }
}
