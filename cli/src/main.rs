//! pgschema — declarative PostgreSQL schema management: dump, plan, apply.

mod commands;
mod config;
mod error;
mod include;
mod output;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;

use commands::{apply::ApplyArgs, dump::DumpArgs, plan::PlanArgs};
use error::CliError;

#[derive(Parser, Debug)]
#[command(name = "pgschema")]
#[command(author, version, about = "Declarative schema management for PostgreSQL", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dump the live schema as canonical DDL.
    Dump(DumpArgs),
    /// Compute a migration plan from the live schema to a desired-state file.
    Plan(PlanArgs),
    /// Apply a migration plan to the target database.
    Apply(ApplyArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    // `.env` is loaded before argument parsing so `PGHOST`/`PGPORT`/etc. can
    // come from a file, but never overrides a variable already set in the
    // process environment.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "Error:".red().bold());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Dump(args) => commands::dump::run(args).await,
        Command::Plan(args) => commands::plan::run(args).await,
        Command::Apply(args) => commands::apply::run(args).await,
    }
}
