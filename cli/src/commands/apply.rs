//! `pgschema apply`: execute a plan against the target database, prompting
//! for confirmation unless `--auto-approve`, honoring a pre-computed
//! `--plan <path>` or building one fresh from `--file`.

use std::io::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use schemaplan_core::ignore::IgnoreConfig;
use schemaplan_core::options::JobOptions;
use schemaplan_core::plan::Plan;

use crate::commands::plan::{build_plan, load_ignore_config, PlanArgs};
use crate::config::DbArgs;
use crate::error::CliError;
use crate::output;

#[derive(Args, Debug)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub db: DbArgs,

    /// Desired-state SQL file. Required unless `--plan` supplies an
    /// already-computed plan.
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Apply a previously serialized plan (`plan.json`) instead of
    /// recomputing one from `--file`.
    #[arg(long)]
    pub plan: Option<PathBuf>,

    /// Skip the confirmation prompt.
    #[arg(long)]
    pub auto_approve: bool,

    /// Override the default 30s lock timeout.
    #[arg(long)]
    pub lock_timeout: Option<u64>,

    /// Override the default 5 minute statement timeout.
    #[arg(long)]
    pub statement_timeout: Option<u64>,
}

pub async fn run(args: ApplyArgs) -> Result<(), CliError> {
    let plan = match &args.plan {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            Plan::from_json(&text)?
        }
        None => {
            let file = args.file.clone().ok_or_else(|| {
                CliError::UserError("apply requires --file or --plan".into())
            })?;
            let plan_args = PlanArgs {
                db: args.db.clone(),
                file,
                output_sql: None,
                output_human: None,
                output_json: None,
            };
            build_plan(&plan_args).await?
        }
    };

    if plan.is_empty() {
        println!("{}", output::muted("No changes. Nothing to apply."));
        return Ok(());
    }

    println!("{}", output::heading("The following changes will be applied:"));
    print!("{}", plan.render_human());

    if !args.auto_approve && !confirm()? {
        println!("{}", output::muted("Aborted."));
        return Ok(());
    }

    let ignore_cfg: IgnoreConfig = load_ignore_config()?;
    let opts = JobOptions {
        connect: args.db.connect_options(),
        ignore: ignore_cfg,
        lock_timeout: args
            .lock_timeout
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30)),
        statement_timeout: args
            .statement_timeout
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(5 * 60)),
        ..Default::default()
    };

    let (mut client, _connection) = args.db.connect().await?;
    let report = schemaplan_core::apply::apply(&mut client, &plan, &opts).await?;

    println!(
        "{}",
        output::success(&format!(
            "applied {} statement(s) in {:?}",
            report.executed.len(),
            report.total_duration
        ))
    );
    for stmt in &report.executed {
        println!("  {} ({:?})", output::label(&stmt.identity), stmt.duration);
    }

    Ok(())
}

fn confirm() -> Result<bool, CliError> {
    print!("Apply these changes? [y/N] ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    let answer = line.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}
